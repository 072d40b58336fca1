//! Command router: maps a classified request to an inline reply or a
//! generation job.

use crate::replies;
use kondate_core::{
    error::KondateError,
    intent::Intent,
    message::{GenerationJob, VerifiedRequest},
    prompt::PromptTemplate,
    traits::IngredientStore,
};
use tracing::debug;

/// What the responder should do with a request.
#[derive(Debug)]
pub enum RouterAction {
    /// Reply with this text right away. Store mutations are already done.
    ReplyNow(String),
    /// Hand this job to the generator and acknowledge.
    Dispatch(GenerationJob),
}

/// Route a request. Only touches the ingredient store; never calls the
/// generation service.
pub async fn route(
    request: &VerifiedRequest,
    intent: Intent,
    store: &dyn IngredientStore,
) -> Result<RouterAction, KondateError> {
    let user = request.user_id();
    let action = match intent {
        Intent::Help => RouterAction::ReplyNow(replies::help()),
        Intent::StoreList => {
            let set = store.list(user).await?;
            RouterAction::ReplyNow(replies::ingredient_list(&set))
        }
        Intent::StoreClear => {
            store.clear(user).await?;
            RouterAction::ReplyNow(replies::cleared())
        }
        Intent::StoreAdd(items) if items.is_empty() => RouterAction::ReplyNow(replies::add_usage()),
        Intent::StoreAdd(items) => {
            let set = store.add(user, &items).await?;
            RouterAction::ReplyNow(replies::added(&set))
        }
        Intent::GenerateFromIngredients(text) => RouterAction::Dispatch(GenerationJob::new(
            request,
            PromptTemplate::Ingredients,
            text,
        )),
        Intent::GenerateFromMood(text) => {
            RouterAction::Dispatch(GenerationJob::new(request, PromptTemplate::Mood, text))
        }
        Intent::StoreGenerate => {
            let set = store.list(user).await?;
            if set.is_empty() {
                RouterAction::ReplyNow(replies::store_empty())
            } else {
                RouterAction::Dispatch(GenerationJob::new(
                    request,
                    PromptTemplate::Ingredients,
                    set.to_input(),
                ))
            }
        }
    };
    debug!(
        user,
        dispatch = matches!(action, RouterAction::Dispatch(_)),
        "routed request"
    );
    Ok(action)
}

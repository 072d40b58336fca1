//! In-process handoff queue between the responder and the generator.

use kondate_core::{error::KondateError, message::GenerationJob, traits::JobQueue};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Producer half of the handoff queue. Publishing never waits.
#[derive(Clone)]
pub struct ChannelQueue {
    tx: mpsc::Sender<GenerationJob>,
}

/// A bounded queue and its consumer end.
pub fn channel(capacity: usize) -> (ChannelQueue, mpsc::Receiver<GenerationJob>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelQueue { tx }, rx)
}

impl JobQueue for ChannelQueue {
    fn publish(&self, job: GenerationJob) -> Result<(), KondateError> {
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(job) => {
                KondateError::Handoff(format!("queue full, dropped job {}", job.id))
            }
            TrySendError::Closed(job) => {
                KondateError::Handoff(format!("generator stopped, dropped job {}", job.id))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kondate_core::message::{InboundRequest, Platform, ReplyTarget, ReplyVia, VerifiedRequest};
    use kondate_core::prompt::PromptTemplate;
    use kondate_core::signature::authentic_for_tests;

    fn job(input: &str) -> GenerationJob {
        let now = chrono::Utc::now();
        let request = InboundRequest {
            platform: Platform::Slack,
            user_id: "U1".into(),
            text: input.into(),
            reply_target: ReplyTarget::ResponseUrl("https://hooks.slack.test/1".into()),
            reply_via: ReplyVia::HttpBody,
            received_at: now,
        };
        let verified = VerifiedRequest::new(request, &authentic_for_tests(now));
        GenerationJob::new(&verified, PromptTemplate::Ingredients, input.into())
    }

    #[tokio::test]
    async fn test_publish_then_consume_once() {
        let (queue, mut rx) = channel(4);
        let sent = job("キャベツ");
        let id = sent.id;
        queue.publish(sent).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, id);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_queue_is_handoff_error() {
        let (queue, _rx) = channel(1);
        queue.publish(job("一")).unwrap();
        let err = queue.publish(job("二")).unwrap_err();
        assert!(matches!(err, KondateError::Handoff(_)));
        assert!(err.to_string().contains("queue full"));
    }

    #[test]
    fn test_closed_queue_is_handoff_error() {
        let (queue, rx) = channel(1);
        drop(rx);
        let err = queue.publish(job("卵")).unwrap_err();
        assert!(err.to_string().contains("generator stopped"));
    }
}

// --- Default value functions ---

pub(super) fn default_name() -> String {
    "Kondate".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.kondate".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_true() -> bool {
    true
}
pub(super) fn default_server_host() -> String {
    "0.0.0.0".to_string()
}
pub(super) fn default_server_port() -> u16 {
    8000
}
pub(super) fn default_reply_budget_ms() -> u64 {
    2500
}
pub(super) fn default_body_limit() -> usize {
    256 * 1024
}
pub(super) fn default_provider() -> String {
    "anthropic".to_string()
}
pub(super) fn default_anthropic_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}
pub(super) fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}
pub(super) fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
pub(super) fn default_max_tokens() -> u32 {
    1000
}
pub(super) fn default_temperature() -> f32 {
    0.7
}
pub(super) fn default_generation_timeout() -> u64 {
    60
}
pub(super) fn default_queue_capacity() -> usize {
    64
}
pub(super) fn default_freshness_window() -> i64 {
    300
}
pub(super) fn default_db_path() -> String {
    "~/.kondate/data/ingredients.db".to_string()
}

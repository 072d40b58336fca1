//! # kondate-providers
//!
//! Text-generation provider implementations for Kondate.

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

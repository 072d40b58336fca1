//! # kondate-channels
//!
//! Chat platforms Kondate answers on. Each implements
//! [`kondate_core::traits::ChatPlatform`]: webhook verification, inbound
//! parsing, outbound rendering and delivery.

pub mod line;
pub mod slack;
mod text;

pub use line::LineChannel;
pub use slack::SlackChannel;

//! # kondate-core
//!
//! Core types, traits, configuration, signature verification, intent
//! classification, prompt building and recipe parsing for Kondate.

pub mod config;
pub mod error;
pub mod ingredients;
pub mod intent;
pub mod message;
pub mod prompt;
pub mod recipe;
pub mod signature;
pub mod traits;

pub use config::shellexpand;

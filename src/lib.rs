pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::{ImapMailbox, OpenAiClient, SqliteEmailStore};
pub use crate::config::SiftConfig;
pub use crate::core::analyzer::{Analyst, InterestProfile, ModelSelection};
pub use crate::core::engine::TriageEngine;
pub use crate::core::pipeline::TriagePipeline;
pub use crate::utils::error::{Result, SiftError};

pub mod analyzer;
pub mod cleaner;
pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{EmailMessage, StoredEmail, TriageOutcome, TriageReport};
pub use crate::domain::ports::{CompletionClient, EmailStore, Mailbox, Pipeline, TriageSettings};
pub use crate::utils::error::Result;

use crate::domain::model::{ChatReply, ChatRequest, EmailMessage, StoredEmail, TriageReport};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Mailbox operations against the mail server. Implementations own the
/// session; every method except `connect` requires an established one.
#[async_trait]
pub trait Mailbox: Send + Sync {
    async fn connect(&self) -> Result<()>;
    async fn disconnect(&self) -> Result<()>;
    async fn select_inbox(&self) -> Result<()>;
    async fn search_unread(&self) -> Result<Vec<String>>;
    /// Returns the raw RFC 822 bytes; parsing is the caller's concern.
    async fn fetch_message(&self, message_id: &str) -> Result<Vec<u8>>;
    async fn mark_read(&self, message_id: &str) -> Result<()>;
    async fn mark_unread(&self, message_id: &str) -> Result<()>;
    async fn create_draft(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply>;
    fn provider_name(&self) -> &str;
}

pub trait EmailStore: Send + Sync {
    fn init_schema(&self) -> Result<()>;
    fn store_email(&self, record: &StoredEmail) -> Result<()>;
    fn get_email(&self, message_id: &str) -> Result<Option<StoredEmail>>;
    fn recruiter_emails(&self) -> Result<Vec<StoredEmail>>;
}

pub trait TriageSettings: Send + Sync {
    fn fetch_limit(&self) -> usize;
    fn first_message_only(&self) -> bool;
    fn draft_replies(&self) -> bool;
}

/// 三階段處理流程:收信、分析、歸檔
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Pull unread messages from the mailbox without consuming their unread state.
    async fn extract(&self) -> Result<Vec<EmailMessage>>;

    /// Classify each message and generate postings and reply drafts where warranted.
    async fn transform(&self, messages: Vec<EmailMessage>) -> Result<TriageReport>;

    /// Persist the outcomes and file any drafts. Returns a run summary.
    async fn load(&self, report: TriageReport) -> Result<String>;

    /// Release held resources. Called once per run, even after a failure.
    async fn finalize(&self) -> Result<()> {
        Ok(())
    }
}

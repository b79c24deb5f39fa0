//! 信件分流的三階段實作
//!
//! Extract pulls unread mail and puts the unread flags back, transform
//! runs the LLM judgement per message, load archives everything and
//! files decline drafts for first-contact recruiters outside the
//! owner's interests.

use async_trait::async_trait;

use crate::core::analyzer::Analyst;
use crate::core::cleaner::clean_email_content;
use crate::domain::model::{EmailMessage, StoredEmail, TriageOutcome, TriageReport};
use crate::domain::ports::{CompletionClient, EmailStore, Mailbox, Pipeline, TriageSettings};
use crate::utils::error::Result;
use crate::utils::mime::parse_raw_email;

pub struct TriagePipeline<M, C, S, T>
where
    M: Mailbox,
    C: CompletionClient,
    S: EmailStore,
    T: TriageSettings,
{
    mailbox: M,
    analyst: Analyst<C>,
    store: S,
    settings: T,
}

impl<M, C, S, T> TriagePipeline<M, C, S, T>
where
    M: Mailbox,
    C: CompletionClient,
    S: EmailStore,
    T: TriageSettings,
{
    pub fn new(mailbox: M, analyst: Analyst<C>, store: S, settings: T) -> Self {
        Self {
            mailbox,
            analyst,
            store,
            settings,
        }
    }
}

/// Prefix a reply subject without stacking a second `Re:`.
fn reply_subject(original: &str) -> String {
    if original.trim_start().to_ascii_lowercase().starts_with("re:") {
        original.to_string()
    } else {
        format!("Re: {}", original)
    }
}

#[async_trait]
impl<M, C, S, T> Pipeline for TriagePipeline<M, C, S, T>
where
    M: Mailbox,
    C: CompletionClient,
    S: EmailStore,
    T: TriageSettings,
{
    async fn extract(&self) -> Result<Vec<EmailMessage>> {
        self.mailbox.connect().await?;
        self.mailbox.select_inbox().await?;

        let unread = self.mailbox.search_unread().await?;
        tracing::info!("📥 {} unread message(s) in the inbox", unread.len());

        let limit = if self.settings.first_message_only() {
            tracing::info!("🎯 First-message mode: looking at a single message");
            1
        } else {
            self.settings.fetch_limit()
        };

        let mut messages = Vec::with_capacity(unread.len().min(limit));
        for message_id in unread.iter().take(limit) {
            let raw = self.mailbox.fetch_message(message_id).await?;
            let message = parse_raw_email(&raw)?;
            // Fetching sets \Seen on the server. Put the flag back so a
            // triage run leaves the inbox exactly as it found it.
            self.mailbox.mark_unread(message_id).await?;
            tracing::debug!("📨 {} ({})", message.subject, message.sender);
            messages.push(message);
        }
        Ok(messages)
    }

    async fn transform(&self, messages: Vec<EmailMessage>) -> Result<TriageReport> {
        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            let cleaned = clean_email_content(&message.body);
            let analysis = self.analyst.analyze(&message, &cleaned).await?;
            tracing::info!(
                "🔍 {}: recruiter={} followup={} topics={}",
                message.subject,
                analysis.is_recruiter,
                analysis.is_followup,
                analysis.mentions_topics
            );

            let posting = if analysis.is_recruiter {
                Some(self.analyst.extract_posting(&message.subject, &cleaned).await?)
            } else {
                None
            };

            // A draft is only worth writing for a first contact about a role
            // outside the owner's interests. Matching roles deserve a human
            // reply and follow-ups already have a thread.
            let reply = if analysis.is_recruiter && !analysis.is_followup && !analysis.mentions_topics
            {
                let text = self.analyst.draft_reply(&message, &cleaned).await?;
                tracing::info!("✉️ Drafted a decline for: {}", message.subject);
                Some(text)
            } else {
                None
            };

            outcomes.push(TriageOutcome {
                message,
                analysis,
                posting,
                reply,
            });
        }
        Ok(TriageReport { outcomes })
    }

    async fn load(&self, report: TriageReport) -> Result<String> {
        let mut drafted = 0;
        for outcome in &report.outcomes {
            self.store.store_email(&StoredEmail::from_outcome(outcome))?;
            if let Some(reply) = &outcome.reply {
                if self.settings.draft_replies() {
                    let subject = reply_subject(&outcome.message.subject);
                    self.mailbox
                        .create_draft(&outcome.message.sender, &subject, reply)
                        .await?;
                    drafted += 1;
                }
            }
        }
        let summary = format!(
            "{} message(s) archived, {} recruiter(s), {} decline draft(s) filed",
            report.total(),
            report.recruiter_count(),
            drafted
        );
        tracing::info!("💾 {}", summary);
        Ok(summary)
    }

    async fn finalize(&self) -> Result<()> {
        self.mailbox.disconnect().await
    }
}

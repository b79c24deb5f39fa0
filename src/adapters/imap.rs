//! IMAP 信箱存取
//!
//! The `imap` crate is synchronous, so the session lives behind a mutex
//! and every operation hops onto the blocking pool. Message ids handed
//! out by [`search_unread`](crate::domain::ports::Mailbox::search_unread)
//! are server sequence numbers rendered as strings.

use std::net::TcpStream;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use imap::Session;
use native_tls::{TlsConnector, TlsStream};

use crate::domain::ports::Mailbox;
use crate::utils::error::{Result, SiftError};

type ImapSession = Session<TlsStream<TcpStream>>;

/// Where Gmail expects drafts to be appended.
const DRAFTS_MAILBOX: &str = "[Gmail]/Drafts";

pub struct ImapMailbox {
    server: String,
    port: u16,
    email: String,
    password: String,
    session: Arc<Mutex<Option<ImapSession>>>,
}

impl ImapMailbox {
    pub fn new(server: &str, port: u16, email: &str, password: &str) -> Self {
        Self {
            server: server.to_string(),
            port,
            email: email.to_string(),
            password: password.to_string(),
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `job` against the live session on the blocking pool.
    async fn with_session<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ImapSession) -> Result<T> + Send + 'static,
    {
        let slot = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let mut guard = slot.lock().map_err(|_| SiftError::ConnectionError {
                message: "mail session lock poisoned".to_string(),
            })?;
            let session = guard.as_mut().ok_or_else(|| SiftError::ConnectionError {
                message: "not connected to the mail server".to_string(),
            })?;
            job(session)
        })
        .await
        .map_err(|e| SiftError::ProcessingError {
            message: format!("mail task failed: {}", e),
        })?
    }
}

fn draft_message(from: &str, to: &str, subject: &str, date: &str, body: &str) -> String {
    format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
        from, to, subject, date, body
    )
}

#[async_trait]
impl Mailbox for ImapMailbox {
    async fn connect(&self) -> Result<()> {
        let server = self.server.clone();
        let port = self.port;
        let email = self.email.clone();
        let password = self.password.clone();
        let slot = Arc::clone(&self.session);

        tokio::task::spawn_blocking(move || -> Result<()> {
            let tls = TlsConnector::builder().build()?;
            let client = imap::connect((server.as_str(), port), server.as_str(), &tls)?;
            let session = client
                .login(&email, &password)
                .map_err(|(e, _)| SiftError::from(e))?;

            let mut guard = slot.lock().map_err(|_| SiftError::ConnectionError {
                message: "mail session lock poisoned".to_string(),
            })?;
            *guard = Some(session);
            Ok(())
        })
        .await
        .map_err(|e| SiftError::ProcessingError {
            message: format!("mail task failed: {}", e),
        })??;

        tracing::info!("✅ Connected to {} as {}", self.server, self.email);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let slot = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut guard = slot.lock().map_err(|_| SiftError::ConnectionError {
                message: "mail session lock poisoned".to_string(),
            })?;
            if let Some(mut session) = guard.take() {
                // 登出失敗就讓連線自然斷開
                if let Err(e) = session.logout() {
                    tracing::warn!("⚠️ IMAP logout failed: {}", e);
                }
            }
            Ok(())
        })
        .await
        .map_err(|e| SiftError::ProcessingError {
            message: format!("mail task failed: {}", e),
        })??;

        tracing::info!("🧹 Mail session closed");
        Ok(())
    }

    async fn select_inbox(&self) -> Result<()> {
        let inbox = self
            .with_session(|session| Ok(session.select("INBOX")?))
            .await?;
        tracing::debug!("📁 INBOX selected ({} messages)", inbox.exists);
        Ok(())
    }

    async fn search_unread(&self) -> Result<Vec<String>> {
        self.with_session(|session| {
            let ids = session.search("UNSEEN")?;
            let mut ids: Vec<u32> = ids.into_iter().collect();
            // Oldest first, so a capped run drains the backlog in order.
            ids.sort_unstable();
            Ok(ids.into_iter().map(|id| id.to_string()).collect())
        })
        .await
    }

    async fn fetch_message(&self, message_id: &str) -> Result<Vec<u8>> {
        let sequence = message_id.to_string();
        self.with_session(move |session| {
            let messages = session.fetch(&sequence, "RFC822")?;
            let message = messages
                .iter()
                .next()
                .ok_or_else(|| SiftError::ProcessingError {
                    message: format!("message {} disappeared before fetch", sequence),
                })?;
            message
                .body()
                .map(|bytes| bytes.to_vec())
                .ok_or_else(|| SiftError::ProcessingError {
                    message: format!("message {} came back without content", sequence),
                })
        })
        .await
    }

    async fn mark_read(&self, message_id: &str) -> Result<()> {
        let sequence = message_id.to_string();
        self.with_session(move |session| {
            session.store(&sequence, "+FLAGS (\\Seen)")?;
            Ok(())
        })
        .await
    }

    async fn mark_unread(&self, message_id: &str) -> Result<()> {
        let sequence = message_id.to_string();
        self.with_session(move |session| {
            session.store(&sequence, "-FLAGS (\\Seen)")?;
            Ok(())
        })
        .await
    }

    async fn create_draft(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let content = draft_message(&self.email, to, subject, &Utc::now().to_rfc2822(), body);
        let subject = subject.to_string();
        self.with_session(move |session| {
            session.append(DRAFTS_MAILBOX, content.as_bytes())?;
            Ok(())
        })
        .await?;
        tracing::info!("✉️ Draft saved: {}", subject);
        Ok(())
    }
}

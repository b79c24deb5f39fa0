pub mod imap;
pub mod openai;
pub mod sqlite;

pub use self::imap::ImapMailbox;
pub use self::openai::OpenAiClient;
pub use self::sqlite::SqliteEmailStore;

use crate::core::analyzer::{InterestProfile, ModelSelection};
use crate::domain::ports::TriageSettings;
use crate::utils::error::{Result, SiftError};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiftConfig {
    pub mailbox: MailboxConfig,
    pub llm: LlmConfig,
    pub storage: Option<StorageConfig>,
    pub triage: Option<TriageConfig>,
    pub interests: InterestsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    pub server: String,
    pub port: Option<u16>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base: Option<String>,
    pub analyze_model: Option<String>,
    pub respond_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    pub fetch_limit: Option<usize>,
    pub first_message_only: Option<bool>,
    pub draft_replies: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestsConfig {
    pub topics: Vec<String>,
    pub topic_description: Option<String>,
    pub name: Option<String>,
    pub currently_looking: Option<bool>,
}

impl SiftConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SiftError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SiftError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GMAIL_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_non_empty_string(
            "mailbox.server",
            &self.mailbox.server,
        )?;
        crate::utils::validation::validate_non_empty_string("mailbox.email", &self.mailbox.email)?;
        if !self.mailbox.email.contains('@') {
            return Err(SiftError::InvalidConfigValueError {
                field: "mailbox.email".to_string(),
                value: self.mailbox.email.clone(),
                reason: "Expected an email address".to_string(),
            });
        }

        // 未解析的 ${VAR} 佔位符會原樣留下,在這裡攔截
        if self.mailbox.password.starts_with("${") {
            return Err(SiftError::MissingConfigError {
                field: "mailbox.password".to_string(),
            });
        }
        crate::utils::validation::validate_non_empty_string(
            "mailbox.password",
            &self.mailbox.password,
        )?;

        if self.llm.api_key.starts_with("${") {
            return Err(SiftError::MissingConfigError {
                field: "llm.api_key".to_string(),
            });
        }
        crate::utils::validation::validate_non_empty_string("llm.api_key", &self.llm.api_key)?;

        if let Some(api_base) = &self.llm.api_base {
            crate::utils::validation::validate_url("llm.api_base", api_base)?;
        }

        if let Some(port) = self.mailbox.port {
            crate::utils::validation::validate_positive_number("mailbox.port", port as usize, 1)?;
        }

        if let Some(triage) = &self.triage {
            if let Some(limit) = triage.fetch_limit {
                crate::utils::validation::validate_positive_number("triage.fetch_limit", limit, 1)?;
            }
        }

        if let Some(storage) = &self.storage {
            if let Some(db_path) = &storage.db_path {
                crate::utils::validation::validate_path("storage.db_path", db_path)?;
            }
        }

        if self.interests.topics.is_empty() {
            return Err(SiftError::ConfigValidationError {
                field: "interests.topics".to_string(),
                message: "At least one topic is required".to_string(),
            });
        }

        Ok(())
    }

    /// 取得 IMAP 伺服器埠號
    pub fn port(&self) -> u16 {
        self.mailbox.port.unwrap_or(993)
    }

    /// 取得 API 端點
    pub fn api_base(&self) -> &str {
        self.llm
            .api_base
            .as_deref()
            .unwrap_or("https://api.openai.com/v1")
    }

    pub fn analyze_model(&self) -> &str {
        self.llm.analyze_model.as_deref().unwrap_or("gpt-4o-mini")
    }

    pub fn respond_model(&self) -> &str {
        self.llm.respond_model.as_deref().unwrap_or("gpt-4o")
    }

    /// 取得資料庫路徑
    pub fn db_path(&self) -> &str {
        self.storage
            .as_ref()
            .and_then(|s| s.db_path.as_deref())
            .unwrap_or("mail-sift.db")
    }

    pub fn profile(&self) -> InterestProfile {
        InterestProfile {
            topics: self.interests.topics.clone(),
            topic_description: self
                .interests
                .topic_description
                .clone()
                .unwrap_or_else(|| self.interests.topics.join(", ")),
            name: self.interests.name.clone().unwrap_or_default(),
            currently_looking: self.interests.currently_looking.unwrap_or(false),
        }
    }

    pub fn models(&self) -> ModelSelection {
        ModelSelection {
            analyze: self.analyze_model().to_string(),
            respond: self.respond_model().to_string(),
        }
    }
}

impl TriageSettings for SiftConfig {
    fn fetch_limit(&self) -> usize {
        self.triage
            .as_ref()
            .and_then(|t| t.fetch_limit)
            .unwrap_or(10)
    }

    fn first_message_only(&self) -> bool {
        self.triage
            .as_ref()
            .and_then(|t| t.first_message_only)
            .unwrap_or(false)
    }

    fn draft_replies(&self) -> bool {
        self.triage
            .as_ref()
            .and_then(|t| t.draft_replies)
            .unwrap_or(true)
    }
}

impl Validate for SiftConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn minimal_config() -> &'static str {
        r#"
[mailbox]
server = "imap.gmail.com"
email = "me@example.com"
password = "app-password"

[llm]
api_key = "sk-test"

[interests]
topics = ["climate tech", "carbon removal"]
"#
    }

    #[test]
    fn test_parse_minimal_config_applies_defaults() {
        let config = SiftConfig::from_toml_str(minimal_config()).unwrap();

        assert_eq!(config.mailbox.server, "imap.gmail.com");
        assert_eq!(config.port(), 993);
        assert_eq!(config.api_base(), "https://api.openai.com/v1");
        assert_eq!(config.analyze_model(), "gpt-4o-mini");
        assert_eq!(config.respond_model(), "gpt-4o");
        assert_eq!(config.db_path(), "mail-sift.db");
        assert_eq!(config.fetch_limit(), 10);
        assert!(!config.first_message_only());
        assert!(config.draft_replies());
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let toml_content = r#"
[mailbox]
server = "mail.example.com"
port = 1993
email = "me@example.com"
password = "secret"

[llm]
api_key = "sk-test"
api_base = "https://llm.internal.example/v1"
analyze_model = "gpt-4.1-mini"
respond_model = "gpt-4.1"

[storage]
db_path = "archive/jobs.db"

[triage]
fetch_limit = 3
first_message_only = true
draft_replies = false

[interests]
topics = ["distributed systems"]
topic_description = "distributed systems work"
name = "Alex Chen"
currently_looking = true
"#;

        let config = SiftConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.port(), 1993);
        assert_eq!(config.api_base(), "https://llm.internal.example/v1");
        assert_eq!(config.analyze_model(), "gpt-4.1-mini");
        assert_eq!(config.respond_model(), "gpt-4.1");
        assert_eq!(config.db_path(), "archive/jobs.db");
        assert_eq!(config.fetch_limit(), 3);
        assert!(config.first_message_only());
        assert!(!config.draft_replies());

        let profile = config.profile();
        assert_eq!(profile.name, "Alex Chen");
        assert!(profile.currently_looking);
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MAIL_SIFT_TEST_PASSWORD", "from-the-env");

        let toml_content = r#"
[mailbox]
server = "imap.gmail.com"
email = "me@example.com"
password = "${MAIL_SIFT_TEST_PASSWORD}"

[llm]
api_key = "sk-test"

[interests]
topics = ["climate tech"]
"#;

        let config = SiftConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.mailbox.password, "from-the-env");

        std::env::remove_var("MAIL_SIFT_TEST_PASSWORD");
    }

    #[test]
    fn test_unresolved_placeholder_fails_validation() {
        let toml_content = r#"
[mailbox]
server = "imap.gmail.com"
email = "me@example.com"
password = "${MAIL_SIFT_TEST_NEVER_SET}"

[llm]
api_key = "sk-test"

[interests]
topics = ["climate tech"]
"#;

        let config = SiftConfig::from_toml_str(toml_content).unwrap();
        let err = config.validate_config().unwrap_err();
        match err {
            SiftError::MissingConfigError { field } => assert_eq!(field, "mailbox.password"),
            other => panic!("expected missing config error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_api_base_fails_validation() {
        let toml_content = r#"
[mailbox]
server = "imap.gmail.com"
email = "me@example.com"
password = "secret"

[llm]
api_key = "sk-test"
api_base = "not-a-url"

[interests]
topics = ["climate tech"]
"#;

        let config = SiftConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_email_must_look_like_an_address() {
        let toml_content = r#"
[mailbox]
server = "imap.gmail.com"
email = "nobody"
password = "secret"

[llm]
api_key = "sk-test"

[interests]
topics = ["climate tech"]
"#;

        let config = SiftConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_empty_topics_fail_validation() {
        let toml_content = r#"
[mailbox]
server = "imap.gmail.com"
email = "me@example.com"
password = "secret"

[llm]
api_key = "sk-test"

[interests]
topics = []
"#;

        let config = SiftConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_profile_description_falls_back_to_topics() {
        let config = SiftConfig::from_toml_str(minimal_config()).unwrap();
        let profile = config.profile();

        assert_eq!(profile.topic_description, "climate tech, carbon removal");
        assert_eq!(profile.name, "");
        assert!(!profile.currently_looking);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(minimal_config().as_bytes()).unwrap();

        let config = SiftConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.mailbox.email, "me@example.com");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 收件匣裡的一封信，已解析成內部格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub sender: String,
    pub body: String,
    pub date: DateTime<Utc>,
    pub message_id: String,
}

/// LLM 對單封信的判定結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailAnalysis {
    pub is_recruiter: bool,
    pub is_followup: bool,
    pub mentions_topics: bool,
    pub recruiter_explanation: String,
    pub topic_explanation: String,
}

/// 從招募信中抽出的職缺細節，缺少的欄位為 null
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub company_name: Option<String>,
    pub role_title: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub required_experience: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub recruiter_name: Option<String>,
    pub application_deadline: Option<String>,
}

/// 存進資料庫的一筆信件記錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEmail {
    pub message_id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub received_date: DateTime<Utc>,
    pub posting: Option<JobPosting>,
    pub is_recruiter: bool,
    pub is_followup: bool,
    pub mentions_topics: bool,
    pub draft_reply: Option<String>,
}

impl StoredEmail {
    pub fn from_outcome(outcome: &TriageOutcome) -> Self {
        Self {
            message_id: outcome.message.message_id.clone(),
            sender: outcome.message.sender.clone(),
            subject: outcome.message.subject.clone(),
            body: outcome.message.body.clone(),
            received_date: outcome.message.date,
            posting: outcome.posting.clone(),
            is_recruiter: outcome.analysis.is_recruiter,
            is_followup: outcome.analysis.is_followup,
            mentions_topics: outcome.analysis.mentions_topics,
            draft_reply: outcome.reply.clone(),
        }
    }
}

/// 單封信走完分析後的完整結果
#[derive(Debug, Clone)]
pub struct TriageOutcome {
    pub message: EmailMessage,
    pub analysis: EmailAnalysis,
    pub posting: Option<JobPosting>,
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TriageReport {
    pub outcomes: Vec<TriageOutcome>,
}

impl TriageReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn recruiter_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.analysis.is_recruiter)
            .count()
    }

    pub fn drafted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.reply.is_some()).count()
    }
}

/// 一次 chat completion 呼叫的參數
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub json_output: bool,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub model: String,
    pub provider: String,
}

use crate::domain::model::EmailMessage;
use crate::utils::error::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use mailparse::{MailHeaderMap, ParsedMail};

// Offset-bearing fallbacks tried when the standard RFC 2822 parser gives up.
const DATE_FALLBACK_FORMATS: [&str; 3] = [
    "%a, %d %b %Y %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
];

/// 將原始 RFC 822 位元組解析成內部的 EmailMessage
pub fn parse_raw_email(raw: &[u8]) -> Result<EmailMessage> {
    let parsed = mailparse::parse_mail(raw)?;

    let subject = parsed
        .headers
        .get_first_value("Subject")
        .unwrap_or_default();
    let sender = parsed.headers.get_first_value("From").unwrap_or_default();
    let message_id = parsed
        .headers
        .get_first_value("Message-ID")
        .unwrap_or_default();
    let date = parse_message_date(parsed.headers.get_first_value("Date"));
    let body = extract_plain_body(&parsed)?;

    Ok(EmailMessage {
        subject,
        sender,
        body,
        date,
        message_id,
    })
}

fn parse_message_date(raw: Option<String>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return Utc::now();
    };

    if let Ok(timestamp) = mailparse::dateparse(&raw) {
        if let Some(date) = DateTime::from_timestamp(timestamp, 0) {
            return date;
        }
    }

    for format in DATE_FALLBACK_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(&raw, format) {
            return date.with_timezone(&Utc);
        }
    }

    // Literal "GMT" suffix carries no parseable offset; treat it as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, "%a, %d %b %Y %H:%M:%S GMT") {
        return naive.and_utc();
    }

    Utc::now()
}

/// 多部件訊息取第一個 text/plain 部件，單一部件直接取內文
fn extract_plain_body(parsed: &ParsedMail) -> Result<String> {
    if parsed.subparts.is_empty() {
        return Ok(parsed.get_body()?);
    }

    match first_plain_part(parsed) {
        Some(part) => Ok(part.get_body()?),
        None => Ok(String::new()),
    }
}

fn first_plain_part<'a, 'b>(parsed: &'b ParsedMail<'a>) -> Option<&'b ParsedMail<'a>> {
    for part in &parsed.subparts {
        if part.subparts.is_empty() {
            if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
                return Some(part);
            }
        } else if let Some(found) = first_plain_part(part) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_single_part_message() {
        let raw = b"From: recruiter@techcorp.com\r\n\
            To: me@example.com\r\n\
            Subject: Exciting Software Engineering Opportunity at TechCorp\r\n\
            Date: Thu, 14 Mar 2024 10:00:00 +0000\r\n\
            Message-ID: <test1@example.com>\r\n\
            \r\n\
            Hi there, I came across your profile.\r\n";

        let message = parse_raw_email(raw).unwrap();
        assert_eq!(
            message.subject,
            "Exciting Software Engineering Opportunity at TechCorp"
        );
        assert_eq!(message.sender, "recruiter@techcorp.com");
        assert_eq!(message.message_id, "<test1@example.com>");
        assert_eq!(
            message.date,
            Utc.with_ymd_and_hms(2024, 3, 14, 10, 0, 0).unwrap()
        );
        assert_eq!(message.body.trim(), "Hi there, I came across your profile.");
    }

    #[test]
    fn test_parse_multipart_prefers_plain_text() {
        let raw = b"From: talent@climatecorp.com\r\n\
            Subject: Multi\r\n\
            Date: Thu, 14 Mar 2024 10:00:00 +0000\r\n\
            Message-ID: <multi@example.com>\r\n\
            MIME-Version: 1.0\r\n\
            Content-Type: multipart/alternative; boundary=\"sep\"\r\n\
            \r\n\
            --sep\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            <p>HTML body</p>\r\n\
            --sep\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            Plain body\r\n\
            --sep--\r\n";

        let message = parse_raw_email(raw).unwrap();
        assert_eq!(message.body.trim(), "Plain body");
    }

    #[test]
    fn test_parse_decodes_encoded_word_subject() {
        let raw = b"From: a@b.c\r\n\
            Subject: =?UTF-8?Q?Caf=C3=A9_role?=\r\n\
            Date: Thu, 14 Mar 2024 10:00:00 +0000\r\n\
            \r\n\
            body\r\n";

        let message = parse_raw_email(raw).unwrap();
        assert_eq!(message.subject, "Caf\u{e9} role");
    }

    #[test]
    fn test_parse_date_fallback_format() {
        let raw = b"From: a@b.c\r\n\
            Subject: Odd date\r\n\
            Date: 2024-03-14 10:00:00 +0000\r\n\
            \r\n\
            body\r\n";

        let message = parse_raw_email(raw).unwrap();
        assert_eq!(
            message.date,
            Utc.with_ymd_and_hms(2024, 3, 14, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_missing_headers_default_to_empty() {
        let raw = b"\r\njust a body\r\n";

        let message = parse_raw_email(raw).unwrap();
        assert_eq!(message.subject, "");
        assert_eq!(message.sender, "");
        assert_eq!(message.message_id, "");
        assert_eq!(message.body.trim(), "just a body");
    }
}

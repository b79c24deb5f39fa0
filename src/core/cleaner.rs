//! 郵件內文清理
//!
//! Strips the noise recruiters' mail clients pile on (URLs, HTML tags,
//! legal banners, quoted history) so the analyzer sees only the text a
//! human would actually read. The steps run in a fixed order; the banner
//! and quote patterns truncate to the end of the content, so they must
//! run after tag stripping but before whitespace collapsing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n").unwrap();
    static ref URLS: Regex = Regex::new(
        r"http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\\(\\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+"
    )
    .unwrap();
    static ref HTML_TAGS: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref CONFIDENTIAL_BANNER: Regex = Regex::new(r"(?i)CONFIDENTIAL[^\n]*\n[\s\S]*$").unwrap();
    static ref DISCLAIMER_BANNER: Regex = Regex::new(r"(?i)DISCLAIMER[^\n]*\n[\s\S]*$").unwrap();
    static ref PRIVILEGED_BANNER: Regex =
        Regex::new(r"(?i)Privileged/Confidential Information[^\n]*\n[\s\S]*$").unwrap();
    static ref QUOTED_REPLY: Regex = Regex::new(r"On.*wrote:[\s\S]*$").unwrap();
    static ref FORWARDED_HEADER: Regex =
        Regex::new(r"From:.*Sent:.*To:.*Subject:[\s\S]*$").unwrap();
    static ref WHITESPACE_RUNS: Regex = Regex::new(r"\s+").unwrap();
    static ref LINE_EDGES: Regex = Regex::new(r"(?m)^\s+|\s+$").unwrap();
}

/// Reduce an email body to its meaningful text.
///
/// Order matters: tags come out before the quote patterns so that an
/// address like `<john@example.com>` inside an "On ... wrote:" line does
/// not block the match, and banners truncate before whitespace collapsing
/// flattens the newlines they key on.
pub fn clean_email_content(content: &str) -> String {
    let content = BLANK_LINES.replace_all(content, "\n");
    let content = URLS.replace_all(&content, "");
    let content = HTML_TAGS.replace_all(&content, "");
    let content = CONFIDENTIAL_BANNER.replace_all(&content, "");
    let content = DISCLAIMER_BANNER.replace_all(&content, "");
    let content = PRIVILEGED_BANNER.replace_all(&content, "");
    let content = QUOTED_REPLY.replace_all(&content, "");
    let content = FORWARDED_HEADER.replace_all(&content, "");
    let content = WHITESPACE_RUNS.replace_all(&content, " ");
    let content = LINE_EDGES.replace_all(&content, "");
    content.trim().to_string()
}

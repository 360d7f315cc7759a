//! Last-minute cleanup of stored content before it is posted.
//!
//! The legacy editor hard-wrapped running text; the destination renders
//! every `\r\n` as a line break.  These rules fold the wraps back into
//! spaces and drop spacer markup.

use regex::Regex;
use std::sync::LazyLock;

const NBSP: char = '\u{a0}';
const NBSP_ENTITY: &str = "&nbsp;";

static BREAK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n<br\s*/?>\r\n").unwrap());
static EMPTY_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<p>\s*</p>").unwrap());
static WRAPPED_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\r\n<a(.*)</a>\r\n(\w+)").unwrap());
static ANCHOR_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</a>\r\n([.:,])").unwrap());
// The word after the wrap must not start with a digit.
static WRAPPED_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\s+)([,.:\w\-()]+)\s*\r\n((?:[.,:\-()]|[\w&&\D])[.,:\w\-()]*)(\s)").unwrap()
});
static WRAPPED_WORD_INDENTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\s+)([,.:\w\-()]+)\r\n\s*((?:[.,:\-()]|[\w&&\D])[.,:\w\-()]*)(\s)").unwrap()
});
static WRAPPED_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s+)-\r\n(\s+)([.,\w\-()]+)").unwrap());

/// Apply every rule once, in order.
pub fn rework(content: &str) -> String {
    let content = BREAK_LINE.replace_all(content, "\r\n");
    let content = EMPTY_PARAGRAPH.replace_all(&content, "");
    let content = content.replace(NBSP, "").replace(NBSP_ENTITY, "");
    let content = WRAPPED_ANCHOR.replace_all(&content, "${1} <a${2}</a> ${3}");
    let content = ANCHOR_PUNCTUATION.replace_all(&content, "</a>${1}");
    let content = WRAPPED_WORD.replace_all(&content, "${1}${2} ${3}${4}");
    let content = WRAPPED_WORD_INDENTED.replace_all(&content, "${1}${2} ${3}${4}");
    let content = WRAPPED_DASH.replace_all(&content, "${1}-${2}${3}");
    content.into_owned()
}

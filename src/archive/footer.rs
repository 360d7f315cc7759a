use super::{Site, FOOTER_TIME_FORMAT};
use crate::error::ArchiveError;
use crate::parser::{NodeExt, NodeRef};
use chrono::NaiveTime;

const CATEGORIES_TOKEN: &str = "in";
const TIME_TOKEN: &str = "um";
const COMMENTS_TOKEN: &str = "|";
const CATEGORY_SEPARATOR: &str = ",";
/// Link text of an entry without comments.
pub const NO_COMMENTS: &str = "Kommentare (0)";

/// What an entry footer says about its entry.
///
/// A footer reads like
/// `Geschrieben von <a>Author</a> in <a>Cat</a>, <a>Cat</a> um <a>20:15</a> | <a>Kommentare (3)</a>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub author: String,
    /// Parsed out of the author link, `-1` when the link has none.
    pub author_id: i64,
    pub categories: Vec<String>,
    pub time: NaiveTime,
    /// Resolved link to the comments, absent when there are none.
    pub comments_url: Option<String>,
}

/// A direct child of the footer with its trimmed text.
struct Token {
    node: NodeRef,
    text: String,
}

fn tokens(footer: &NodeRef) -> Vec<Token> {
    footer
        .children()
        .map(|node| Token {
            text: node.text_contents().trim().to_string(),
            node,
        })
        .filter(|t| !t.text.is_empty())
        .collect()
}

fn position_of(tokens: &[Token], marker: &str) -> Option<usize> {
    tokens.iter().position(|t| t.text == marker)
}

/// The numeric prefix of `{prefix}{id}-First-Last`.
fn author_id(href: &str, prefix: &str) -> Option<i64> {
    let rest = href.strip_prefix(prefix)?;
    rest.split('-').next()?.parse().ok()
}

/// Read author, categories, time and the comment link out of an entry
/// footer.  `title` is only used in diagnostics.
pub fn parse_footer(footer: &NodeRef, site: &Site, title: &str) -> Result<Footer, ArchiveError> {
    let tokens = tokens(footer);
    let malformed = |token: &'static str| ArchiveError::MalformedFooter {
        title: title.to_string(),
        token,
    };

    let categories_at = position_of(&tokens, CATEGORIES_TOKEN).ok_or_else(|| malformed(CATEGORIES_TOKEN))?;
    let time_at = position_of(&tokens, TIME_TOKEN).ok_or_else(|| malformed(TIME_TOKEN))?;

    let categories = tokens
        .get(categories_at + 1..time_at)
        .unwrap_or_default()
        .iter()
        .filter(|t| t.text != CATEGORY_SEPARATOR)
        .map(|t| t.text.clone())
        .collect();

    let time_text = tokens
        .get(time_at + 1)
        .map(|t| t.text.as_str())
        .ok_or_else(|| malformed(TIME_TOKEN))?;
    let time = NaiveTime::parse_from_str(time_text, FOOTER_TIME_FORMAT).map_err(|source| {
        ArchiveError::InvalidDate {
            what: "entry time",
            value: time_text.to_string(),
            source,
        }
    })?;

    let author_link = footer.children().find(|c| c.element_name() == Some("a"));
    let author = author_link
        .as_ref()
        .map(|a| a.text_contents().trim().to_string())
        .unwrap_or_default();
    let author_id = author_link
        .and_then(|a| a.attr_value("href"))
        .and_then(|href| author_id(&site.resolve(&href), &site.author_prefix()))
        .unwrap_or_else(|| {
            tracing::warn!(author = %author, title, "author without id");
            -1
        });

    let comments_url = position_of(&tokens, COMMENTS_TOKEN)
        .and_then(|at| tokens.get(at + 1))
        .filter(|t| t.text != NO_COMMENTS)
        .and_then(|t| t.node.attr_value("href"))
        .map(|href| site.resolve(&href));

    Ok(Footer {
        author,
        author_id,
        categories,
        time,
        comments_url,
    })
}

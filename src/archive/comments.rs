use super::COMMENT_DATE_FORMAT;
use crate::error::ArchiveError;
use crate::models::{CommentRecord, CommentThread, MediaReference, Ruleset};
use crate::normalizer::normalize;
use crate::parser::parse_html;
use crate::timezone::localize;
use crate::utils::{select_descendants, select_first_descendant, stripped_strings};
use chrono::NaiveDateTime;

const COMMENTS_FRAGMENT: &str = "#comments";
const LINEAR_COMMENTS_FRAGMENT: &str = "&serendipity[cview]=linear#comments";

/// A parsed comment page: the thread plus any media its bodies referenced.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedComments {
    pub thread: CommentThread,
    pub media: Vec<MediaReference>,
}

/// Ask for the flat comment view, which is easier to read than the
/// threaded one.
pub fn linear_comments_url(url: &str) -> String {
    url.replace(COMMENTS_FRAGMENT, LINEAR_COMMENTS_FRAGMENT)
}

/// Read every comment of a (linear) comment page.
pub fn parse_comment_page(
    html: &str,
    url: &str,
    rules: &Ruleset,
) -> Result<ParsedComments, ArchiveError> {
    let missing = |what: &'static str| ArchiveError::MissingElement {
        what,
        url: url.to_string(),
    };
    let document = parse_html(html);
    let area = select_first_descendant(&document, "div.serendipity_section_comments")
        .ok_or_else(|| missing("div.serendipity_section_comments"))?;

    let mut thread = CommentThread {
        url: url.to_string(),
        entries: vec![],
    };
    let mut media = vec![];

    for comment in select_descendants(&area, "div.serendipity_comment") {
        let body = select_first_descendant(&comment, "div.serendipity_commentBody")
            .ok_or_else(|| missing("div.serendipity_commentBody"))?;
        let source = select_first_descendant(&comment, "div.serendipity_comment_source")
            .ok_or_else(|| missing("div.serendipity_comment_source"))?;

        let author = select_first_descendant(&source, "span.comment_source_author")
            .and_then(|span| stripped_strings(&span).into_iter().next())
            .ok_or_else(|| missing("span.comment_source_author"))?;
        let date_text = select_first_descendant(&source, "span.comment_source_date")
            .map(|span| span.text_contents().trim().to_string())
            .ok_or_else(|| missing("span.comment_source_date"))?;
        let local = NaiveDateTime::parse_from_str(&date_text, COMMENT_DATE_FORMAT).map_err(
            |source| ArchiveError::InvalidDate {
                what: "comment date",
                value: date_text.clone(),
                source,
            },
        )?;

        let normalized = normalize(&body, rules);
        media.extend(normalized.media.iter().cloned());
        thread.entries.push(CommentRecord {
            date: localize(local)?,
            author_name: author,
            content: normalized.render(),
        });
    }

    Ok(ParsedComments { thread, media })
}

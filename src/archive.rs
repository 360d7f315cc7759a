//! Readers for the pages of the legacy Serendipity archive.
//!
//! All functions here are pure over HTML strings; fetching is done by
//! [`crate::collect`].

mod comments;
mod footer;

pub use comments::{linear_comments_url, parse_comment_page, ParsedComments};
pub use footer::{parse_footer, Footer};

use crate::error::ArchiveError;
use crate::parser::{parse_html, NodeExt, NodeRef};
use crate::utils::{child_elements_with_class, resolve_site_url, select_descendants, select_first_descendant};
use chrono::NaiveDate;

/// `%A, %d. %B %Y`, e.g. `Monday, 15. March 2010`.
pub const DAY_HEADING_FORMAT: &str = "%A, %d. %B %Y";
pub const FOOTER_TIME_FORMAT: &str = "%H:%M";
pub const COMMENT_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";
const EXTENDED_SUFFIX: &str = "#extended";

/// URL layout of one Serendipity installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    root: String,
}

impl Site {
    pub fn new(root: &str) -> Site {
        Site {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// `{root}/index.php?/archives/P{page}.html`
    pub fn archive_page_url(&self, page: u32) -> String {
        format!("{}/index.php?/archives/P{}.html", self.root, page)
    }

    /// Prefix of author links; the author id follows it.
    pub fn author_prefix(&self) -> String {
        format!("{}/index.php?/authors/", self.root)
    }

    /// Resolve a site-relative link against the root.
    pub fn resolve(&self, href: &str) -> String {
        resolve_site_url(&self.root, href)
    }
}

/// One entry of an archive page, before normalization.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub title: String,
    /// Permalink, resolved against the site root.
    pub url: String,
    /// The day heading the entry was listed under.
    pub day: NaiveDate,
    /// The `serendipity_entry_body` element of the page.
    pub body: NodeRef,
    pub footer: NodeRef,
    /// Resolved target of the "continue reading" link, if any.
    pub extended_url: Option<String>,
}

fn missing(what: &'static str, url: &str) -> ArchiveError {
    ArchiveError::MissingElement {
        what,
        url: url.to_string(),
    }
}

/// Parse a day heading such as `Monday, 15. March 2010`.
pub fn parse_day_heading(text: &str) -> Result<NaiveDate, ArchiveError> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, DAY_HEADING_FORMAT).map_err(|source| {
        ArchiveError::InvalidDate {
            what: "day heading",
            value: text.to_string(),
            source,
        }
    })
}

/// Every entry of one archive page, in page order.
///
/// The page holds `div.serendipity_Entry_Date` groups directly below
/// `td#content`; each group has a day heading and one title per
/// `div.serendipity_entry`.
pub fn parse_archive_page(
    html: &str,
    page_url: &str,
    site: &Site,
) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let document = parse_html(html);
    let content =
        select_first_descendant(&document, "td#content").ok_or_else(|| missing("td#content", page_url))?;

    let mut entries = vec![];
    for group in child_elements_with_class(&content, "div", "serendipity_Entry_Date") {
        let heading = select_first_descendant(&group, "h3.serendipity_date")
            .ok_or_else(|| missing("h3.serendipity_date", page_url))?;
        let day = parse_day_heading(&heading.text_contents())?;

        let bodies = select_descendants(&group, "div.serendipity_entry");
        for (ix, title) in select_descendants(&group, "h4.serendipity_title")
            .iter()
            .enumerate()
        {
            let link = select_first_descendant(title, "a")
                .ok_or_else(|| missing("h4.serendipity_title a", page_url))?;
            let contents = bodies
                .get(ix)
                .ok_or_else(|| missing("div.serendipity_entry", page_url))?;
            let body = select_first_descendant(contents, "div.serendipity_entry_body")
                .ok_or_else(|| missing("div.serendipity_entry_body", page_url))?;
            let footer = select_first_descendant(contents, "div.serendipity_entryFooter")
                .ok_or_else(|| missing("div.serendipity_entryFooter", page_url))?;
            let extended_url = select_descendants(contents, "a")
                .iter()
                .filter_map(|a| a.attr_value("href"))
                .find(|href| href.ends_with(EXTENDED_SUFFIX))
                .map(|href| site.resolve(&href));

            entries.push(ArchiveEntry {
                title: link.text_contents().trim().to_string(),
                url: site.resolve(&link.attr_value("href").unwrap_or_default()),
                day,
                body,
                footer,
                extended_url,
            });
        }
    }
    Ok(entries)
}

/// The children of the extended part of an entry page, without the
/// `a#extended` anchor.
pub fn parse_extended_fragment(html: &str, url: &str) -> Result<Vec<NodeRef>, ArchiveError> {
    let document = parse_html(html);
    let entry = select_first_descendant(&document, "div.serendipity_entry")
        .ok_or_else(|| missing("div.serendipity_entry", url))?;
    let extended = select_first_descendant(&entry, "div.serendipity_entry_extended")
        .ok_or_else(|| missing("div.serendipity_entry_extended", url))?;
    Ok(extended
        .children()
        .filter(|c| !(c.element_name() == Some("a") && c.attr_value("id").as_deref() == Some("extended")))
        .collect())
}

/// Move `fragment` to the end of `body`.
pub fn splice_extended(body: &NodeRef, fragment: Vec<NodeRef>) {
    for node in fragment {
        body.append(node);
    }
}

//! Migrates a Serendipity ("s9y") blog into WordPress through a directory of
//! normalized YAML records.
//!
//! ## Quick start
//!
//! ```rust
//! use s9y_migrate::parser::parse_fragment;
//! use s9y_migrate::{normalize, Ruleset};
//!
//! let html = r#"<div class="serendipity_entry_body"><span>Hello</span> <p class="x">world</p></div>"#;
//! let root = parse_fragment(html);
//! let body = root.select_first("div").unwrap();
//! let out = normalize(body.as_node(), &Ruleset::for_posts());
//! assert_eq!(out.render(), "Hello\r\n<p>world</p>");
//! ```
//!
//! ## Module layout
//!
//! * [`normalize`] / [`Ruleset`] – the content normalizer that rewrites legacy
//!   markup into canonical HTML and lists the inline media.
//! * [`oauth`] – OAuth 1.0a request signing and the three-legged handshake.
//! * [`archive`] / [`collect`] – reading the legacy archive pages and writing
//!   records; [`store`] reads and writes the record directory.
//! * [`report`] – per-month counts over a record directory.
//! * [`replay`] – the transfer of records to the WordPress REST API.
//! * [`http`] – the blocking HTTP seam shared by collection and transfer.
//! * [`parser`] / [`shared_utils`] – thin DOM wrappers.

#[macro_use]
mod logging;

pub mod archive;
pub mod collect;
pub mod config;
pub mod error;
pub mod http;
mod models;
mod node_utils;
mod normalizer;
pub mod oauth;
pub mod replay;
pub mod report;
pub mod store;
pub mod timezone;
mod utils;

pub use error::{
    ArchiveError, CollectError, ConfigError, HttpError, NormalizeError, OAuthError, ReplayError,
    StoreError, TimezoneError,
};
pub use logging::logger::{Listener, PerfListener, PerfLogger, SpanCategories};
pub use logging::TracingListener;
pub use models::{
    AuthorEntry, AuthorIndex, CommentRecord, CommentThread, MediaReference, PostRecord, Ruleset,
};
pub use node_utils::{new_html_element, NodeExt};
pub use normalizer::{
    canonical_style, is_bold_style, normalize, parse_index_marker, render_content, Normalized,
    BOLD_DECLARATION, ZERO_MARGIN_STYLE,
};

/// Convenience re-exports of small helpers used across the pipeline.
pub mod shared_utils {
    pub use crate::utils::{basename, resolve_site_url, stripped_strings};
}

/// Thin wrappers around the underlying HTML parser.
///
/// [`NodeRef`] is the reference-counted DOM node type used throughout the crate.
pub mod parser {
    pub use crate::node_utils::{new_html_element, NodeExt};
    use kuchikiki::traits::TendrilSink;
    pub use kuchikiki::{Attributes, NodeRef};

    /// Parse an HTML string into a [`NodeRef`] document tree.
    ///
    /// The parser follows the HTML5 specification; an implicit `<html>`, `<head>`,
    /// and `<body>` are synthesised when missing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use s9y_migrate::parser::parse_html;
    ///
    /// let doc = parse_html("<div><p>hello</p></div>");
    /// assert!(doc.select_first("p").is_ok());
    /// ```
    pub fn parse_html(html: &str) -> NodeRef {
        kuchikiki::parse_html().one(html)
    }

    /// Parse a fragment of markup and return the synthesised `<body>` that
    /// holds it (the whole document if there is no body).
    pub fn parse_fragment(html: &str) -> NodeRef {
        let document = parse_html(html);
        let body = document
            .select_first("body")
            .map(|b| b.as_node().clone())
            .ok();
        body.unwrap_or(document)
    }
}

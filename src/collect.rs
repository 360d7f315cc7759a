//! Collection: walk the archive pages, normalize every entry and write the
//! record directory.

use crate::archive::{
    linear_comments_url, parse_archive_page, parse_comment_page, parse_extended_fragment,
    parse_footer, splice_extended, ArchiveEntry, Site,
};
use crate::error::{ArchiveError, CollectError, StoreError};
use crate::http::{HttpClient, HttpRequest};
use crate::logging::logger::PerfLogger;
use crate::logging::logging_defs::*;
use crate::models::{AuthorEntry, AuthorIndex, MediaReference, PostRecord, Ruleset};
use crate::normalizer::normalize;
use crate::store;
use crate::timezone::localize;
use std::fs;
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Format of the default output directory name.
pub const DIRECTORY_FORMAT: &str = "%Y%m%dT%H%M%S";

/// What to collect and where to put it.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub site: Site,
    pub pages: RangeInclusive<u32>,
    pub directory: PathBuf,
    pub download_media: bool,
}

impl CollectOptions {
    /// All pages of `site` into a directory named after the current time.
    pub fn new(site: Site, last_page: u32) -> CollectOptions {
        CollectOptions {
            site,
            pages: 1..=last_page,
            directory: PathBuf::from(chrono::Local::now().format(DIRECTORY_FORMAT).to_string()),
            download_media: true,
        }
    }
}

/// Totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub posts: usize,
    pub comments: usize,
    pub media: usize,
    pub authors: usize,
}

pub struct Collector<'a, C: HttpClient> {
    client: C,
    logger: &'a PerfLogger,
    post_rules: Ruleset,
    comment_rules: Ruleset,
}

impl<'a, C: HttpClient> Collector<'a, C> {
    pub fn new(client: C, logger: &'a PerfLogger) -> Collector<'a, C> {
        Collector {
            client,
            logger,
            post_rules: Ruleset::for_posts(),
            comment_rules: Ruleset::for_comments(),
        }
    }

    pub fn with_rules(mut self, post_rules: Ruleset, comment_rules: Ruleset) -> Collector<'a, C> {
        self.post_rules = post_rules;
        self.comment_rules = comment_rules;
        self
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, ArchiveError> {
        let response = self.client.execute(&HttpRequest::get(url))?;
        if response.status != 200 {
            return Err(ArchiveError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body)
    }

    fn fetch_text(&self, url: &str) -> Result<String, ArchiveError> {
        self.fetch(url)
            .map(|body| String::from_utf8_lossy(&body).into_owned())
    }

    /// Run the collection and write records plus `authors.yml`.
    pub fn collect(&self, options: &CollectOptions) -> Result<CollectSummary, CollectError> {
        let logger = self.logger;
        start_span!(logger, COLLECT);
        store::ensure_dir(&options.directory)?;

        let mut authors = AuthorIndex::new();
        let mut summary = CollectSummary::default();

        for page in options.pages.clone() {
            let url = options.site.archive_page_url(page);
            tracing::info!(page, url = %url, "reading archive page");
            start_span!(logger, ARCHIVE_PAGE);
            let html = self.fetch_text(&url)?;
            let entries = parse_archive_page(&html, &url, &options.site)?;
            add_point_to_span!(logger, ARCHIVE_PAGE, format!("{} entries", entries.len()));

            for entry in entries {
                let record = self.collect_entry(entry, options, &mut authors)?;
                if options.download_media {
                    self.download_media(&record.media, options)?;
                }
                summary.media += record.media.len();
                summary.comments += record.comment_entries().len();
                store::write_record(&options.directory, summary.posts, &record)?;
                summary.posts += 1;
            }
            end_span!(logger, ARCHIVE_PAGE);
        }

        store::write_authors(&options.directory, &authors)?;
        summary.authors = authors.len();
        annotate_span!(logger, COLLECT, format!("{:?}", summary));
        end_span!(logger, COLLECT);
        Ok(summary)
    }

    fn collect_entry(
        &self,
        entry: ArchiveEntry,
        options: &CollectOptions,
        authors: &mut AuthorIndex,
    ) -> Result<PostRecord, ArchiveError> {
        let logger = self.logger;
        let site = &options.site;

        if let Some(extended_url) = entry.extended_url.as_deref() {
            if self.post_rules.follow_extended_link {
                start_span!(logger, EXTENDED_ENTRY);
                let html = self.fetch_text(extended_url)?;
                splice_extended(&entry.body, parse_extended_fragment(&html, extended_url)?);
                end_span!(logger, EXTENDED_ENTRY);
            }
        }

        let footer = parse_footer(&entry.footer, site, &entry.title)?;
        let date = localize(entry.day.and_time(footer.time))?;
        register_author(authors, footer.author_id, &footer.author);

        let comments = match footer.comments_url.as_deref() {
            Some(url) => {
                start_span!(logger, COMMENT_PAGE);
                let url = linear_comments_url(url);
                let html = self.fetch_text(&url)?;
                let parsed = parse_comment_page(&html, &url, &self.comment_rules)?;
                if !parsed.media.is_empty() {
                    tracing::error!(url = %url, count = parsed.media.len(), "comment media unsupported");
                }
                end_span!(logger, COMMENT_PAGE);
                Some(parsed.thread)
            }
            None => None,
        };

        start_span!(logger, NORMALIZE_BODY);
        let normalized = normalize(&entry.body, &self.post_rules);
        end_span!(logger, NORMALIZE_BODY);

        Ok(PostRecord {
            date,
            author: footer.author,
            author_id: footer.author_id,
            categories: footer.categories,
            title: entry.title,
            content: normalized.render(),
            comments,
            url: entry.url,
            media: normalized.media,
        })
    }

    fn download_media(
        &self,
        media: &[MediaReference],
        options: &CollectOptions,
    ) -> Result<(), CollectError> {
        let logger = self.logger;
        for reference in media {
            start_span!(logger, MEDIA_DOWNLOAD);
            tracing::info!(file = %reference.filename, "collecting media file");
            let body = self.fetch(&options.site.resolve(&reference.url))?;
            let path = options.directory.join(&reference.filename);
            fs::write(&path, body).map_err(|source| StoreError::Io { path, source })?;
            end_span!(logger, MEDIA_DOWNLOAD);
        }
        Ok(())
    }
}

/// Count a post for `author_id`; the first name seen for an id wins.
pub fn register_author(authors: &mut AuthorIndex, author_id: i64, name: &str) {
    let entry = authors.entry(author_id).or_insert_with(|| AuthorEntry {
        name: name.to_string(),
        posts: 0,
        slug: None,
    });
    entry.posts += 1;
    if entry.name != name {
        tracing::warn!(
            author_id,
            name,
            previous = %entry.name,
            "author name changed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authors_are_counted_and_keep_their_first_name() {
        let mut authors = AuthorIndex::new();
        register_author(&mut authors, 2, "Jo Doe");
        register_author(&mut authors, 2, "Jo D.");
        register_author(&mut authors, -1, "Guest");
        assert_eq!(authors[&2].posts, 2);
        assert_eq!(authors[&2].name, "Jo Doe");
        assert_eq!(authors[&-1].posts, 1);
    }
}

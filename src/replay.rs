//! Transfer of a record directory to the WordPress REST API.
//!
//! Every request is signed with OAuth 1.0a.  The run is strictly
//! sequential and stops at the first unexpected answer.

pub mod content;

use crate::error::ReplayError;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::logging::logger::PerfLogger;
use crate::logging::logging_defs::*;
use crate::models::{AuthorIndex, CommentRecord, PostRecord};
use crate::oauth::{OAuthEnvironment, Signer};
use crate::store;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

pub const POSTS_ENDPOINT: &str = "/wp/v2/posts";
pub const CATEGORIES_ENDPOINT: &str = "/wp/v2/categories";
pub const COMMENTS_ENDPOINT: &str = "/wp/v2/comments";
pub const USERS_ENDPOINT: &str = "/wp/v2/users";
const PAGE_SIZE: &str = "100";
const PASSWORD_LENGTH: usize = 16;
const CREATED: u16 = 201;
const OK: u16 = 200;

/// What to transfer and how.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub directory: PathBuf,
    /// Create blog users for unmapped author slugs instead of failing.
    pub create_users: bool,
    pub comment_email: String,
}

/// Totals of a finished transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub posts: usize,
    pub comments: usize,
    pub created_categories: usize,
    pub created_users: usize,
}

#[derive(Debug, Deserialize)]
struct Category {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct User {
    id: u64,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: u64,
}

#[derive(Debug, Serialize)]
struct NewCategory<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct NewUser<'a> {
    name: &'a str,
    slug: &'a str,
    username: &'a str,
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct PostPayload {
    pub date_gmt: String,
    pub status: &'static str,
    pub title: String,
    pub content: String,
    pub author: u64,
    pub comment_status: &'static str,
    pub ping_status: &'static str,
    pub format: &'static str,
    pub categories: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct CommentPayload {
    pub date_gmt: String,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub post: u64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
struct CommentStatus {
    comment_status: &'static str,
}

/// The post as the API expects it.  `author` and `categories` are already
/// translated to blog ids.
pub fn post_payload(record: &PostRecord, author: u64, categories: Vec<u64>) -> PostPayload {
    PostPayload {
        date_gmt: record.date.with_timezone(&Utc).to_rfc3339(),
        status: "publish",
        title: record.title.clone(),
        content: content::rework(&record.content),
        author,
        comment_status: if record.comment_entries().is_empty() {
            "closed"
        } else {
            "open"
        },
        ping_status: "closed",
        format: "standard",
        categories,
    }
}

pub fn comment_payload(comment: &CommentRecord, post: u64, email: &str) -> CommentPayload {
    CommentPayload {
        date_gmt: comment.date.with_timezone(&Utc).to_rfc3339(),
        author_name: comment.author_name.clone(),
        author_email: email.to_string(),
        content: comment.content.clone(),
        post,
        status: "approve",
    }
}

/// Restrict the author index to the ids `records` use.  Every used id must
/// be present and carry a slug.
pub fn used_authors(records: &[PostRecord], authors: &AuthorIndex) -> Result<AuthorIndex, ReplayError> {
    let mut used = AuthorIndex::new();
    for record in records {
        let entry = authors
            .get(&record.author_id)
            .ok_or(ReplayError::UnmappedAuthor(record.author_id))?;
        if entry.slug.is_none() {
            return Err(ReplayError::MissingSlug(record.author_id));
        }
        used.insert(record.author_id, entry.clone());
    }
    Ok(used)
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

pub struct Replayer<'a, C: HttpClient, E: OAuthEnvironment> {
    client: C,
    signer: Signer<E>,
    api_root: String,
    logger: &'a PerfLogger,
}

impl<'a, C: HttpClient, E: OAuthEnvironment> Replayer<'a, C, E> {
    /// `site` is the blog root; the REST API is expected below `/wp-json`.
    pub fn new(client: C, signer: Signer<E>, site: &str, logger: &'a PerfLogger) -> Replayer<'a, C, E> {
        Replayer {
            client,
            signer,
            api_root: format!("{}/wp-json", site.trim_end_matches('/')),
            logger,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ReplayError> {
        let authorization =
            self.signer
                .authorization(request.method.as_str(), &request.url, &request.query, &[]);
        let request = request.header("Authorization", &authorization);
        Ok(self.client.execute(&request)?)
    }

    /// Send, insist on `expected` and decode the JSON answer.
    fn call<T: DeserializeOwned>(
        &self,
        action: String,
        request: HttpRequest,
        expected: u16,
    ) -> Result<T, ReplayError> {
        let response = self.send(request)?;
        if response.status != expected {
            return Err(ReplayError::UnexpectedStatus {
                action,
                status: response.status,
                body: response.text(),
            });
        }
        serde_json::from_slice(&response.body).map_err(|source| ReplayError::Json { action, source })
    }

    fn post_json<P: Serialize, T: DeserializeOwned>(
        &self,
        action: String,
        url: String,
        payload: &P,
        expected: u16,
    ) -> Result<T, ReplayError> {
        let body = serde_json::to_value(payload).map_err(|source| ReplayError::Json {
            action: action.clone(),
            source,
        })?;
        self.call(action, HttpRequest::post(url).json(&body), expected)
    }

    /// Blog category ids by name; missing ones are created.
    fn ensure_categories(
        &self,
        names: &BTreeSet<String>,
        summary: &mut ReplaySummary,
    ) -> Result<BTreeMap<String, u64>, ReplayError> {
        let url = self.endpoint(CATEGORIES_ENDPOINT);
        let existing: Vec<Category> = self.call(
            String::from("listing categories"),
            HttpRequest::get(url.as_str()).query("per_page", PAGE_SIZE),
            OK,
        )?;
        let existing: HashMap<String, u64> = existing.into_iter().map(|c| (c.name, c.id)).collect();

        let mut ids = BTreeMap::new();
        for name in names {
            let id = match existing.get(name) {
                Some(id) => *id,
                None => {
                    tracing::info!(category = %name, "creating category");
                    let created: Created = self.post_json(
                        format!("creating category {}", name),
                        url.clone(),
                        &NewCategory { name },
                        CREATED,
                    )?;
                    summary.created_categories += 1;
                    created.id
                }
            };
            tracing::info!(category = %name, id, "category mapped");
            ids.insert(name.clone(), id);
        }
        Ok(ids)
    }

    /// Blog user ids by legacy author id.
    fn ensure_users(
        &self,
        authors: &AuthorIndex,
        create_users: bool,
        summary: &mut ReplaySummary,
    ) -> Result<HashMap<i64, u64>, ReplayError> {
        let url = self.endpoint(USERS_ENDPOINT);
        let existing: Vec<User> = self.call(
            String::from("listing users"),
            HttpRequest::get(url.as_str()).query("per_page", PAGE_SIZE),
            OK,
        )?;
        let mut by_slug: HashMap<String, u64> = existing.into_iter().map(|u| (u.slug, u.id)).collect();

        let slug_of = |id: &i64| {
            authors
                .get(id)
                .and_then(|a| a.slug.clone())
                .ok_or(ReplayError::MissingSlug(*id))
        };

        if !create_users {
            let mut unknown = vec![];
            for id in authors.keys() {
                let slug = slug_of(id)?;
                if !by_slug.contains_key(&slug) {
                    unknown.push(slug);
                }
            }
            if !unknown.is_empty() {
                return Err(ReplayError::UnknownUsers(unknown));
            }
        }

        let mut ids = HashMap::new();
        for (id, author) in authors {
            let slug = slug_of(id)?;
            if !by_slug.contains_key(&slug) {
                tracing::info!(slug = %slug, "creating user");
                let created: User = self.post_json(
                    format!("creating user {}", slug),
                    url.clone(),
                    &NewUser {
                        name: &author.name,
                        slug: &slug,
                        username: &slug,
                        email: format!("{}@example.com", slug),
                        password: generate_password(),
                    },
                    CREATED,
                )?;
                summary.created_users += 1;
                by_slug.insert(created.slug, created.id);
            }
            let user_id = by_slug
                .get(&slug)
                .copied()
                .ok_or_else(|| ReplayError::UnknownUsers(vec![slug.clone()]))?;
            tracing::info!(slug = %slug, id = user_id, "user mapped");
            ids.insert(*id, user_id);
        }
        Ok(ids)
    }

    fn transfer_post(
        &self,
        record: &PostRecord,
        categories: &BTreeMap<String, u64>,
        users: &HashMap<i64, u64>,
        comment_email: &str,
    ) -> Result<usize, ReplayError> {
        let logger = self.logger;
        start_span!(logger, REPLAY_POST);
        let comments = record.comment_entries();
        tracing::info!(title = %record.title, comments = comments.len(), "processing post");

        let author = users
            .get(&record.author_id)
            .copied()
            .ok_or(ReplayError::UnmappedAuthor(record.author_id))?;
        let category_ids = record
            .categories
            .iter()
            .filter_map(|c| categories.get(c).copied())
            .collect();

        let created: Created = self.post_json(
            format!("creating post {:?}", record.title),
            self.endpoint(POSTS_ENDPOINT),
            &post_payload(record, author, category_ids),
            CREATED,
        )?;
        add_point_to_span!(logger, REPLAY_POST, format!("post {}", created.id));
        tracing::info!(id = created.id, "created post");

        if !comments.is_empty() {
            for (ix, comment) in comments.iter().enumerate() {
                let _: serde_json::Value = self.post_json(
                    format!("creating comment {} of post {}", ix, created.id),
                    self.endpoint(COMMENTS_ENDPOINT),
                    &comment_payload(comment, created.id, comment_email),
                    CREATED,
                )?;
            }
            add_point_to_span_str!(logger, REPLAY_POST, "comments_done");

            let _: serde_json::Value = self.post_json(
                format!("closing comments of post {:?}", record.title),
                format!("{}/{}", self.endpoint(POSTS_ENDPOINT), created.id),
                &CommentStatus {
                    comment_status: "closed",
                },
                OK,
            )?;
        }
        end_span!(logger, REPLAY_POST);
        Ok(comments.len())
    }

    /// Transfer the whole directory.
    pub fn run(&self, options: &ReplayOptions) -> Result<ReplaySummary, ReplayError> {
        let logger = self.logger;
        start_span!(logger, REPLAY);

        tracing::info!(directory = %options.directory.display(), "loading posts");
        let records = store::load_records(&options.directory)?;
        let authors = store::read_authors(&options.directory)?;
        let authors = used_authors(&records, &authors)?;
        let category_names: BTreeSet<String> = records
            .iter()
            .flat_map(|r| r.categories.iter().cloned())
            .collect();
        add_point_to_span!(logger, REPLAY, format!("{} records", records.len()));

        let mut summary = ReplaySummary::default();
        start_span!(logger, REPLAY_TAXONOMY);
        let categories = self.ensure_categories(&category_names, &mut summary)?;
        let users = self.ensure_users(&authors, options.create_users, &mut summary)?;
        end_span!(logger, REPLAY_TAXONOMY);

        for record in &records {
            summary.comments +=
                self.transfer_post(record, &categories, &users, &options.comment_email)?;
            summary.posts += 1;
        }

        annotate_span!(logger, REPLAY, format!("{:?}", summary));
        end_span!(logger, REPLAY);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorEntry, CommentThread};
    use chrono::DateTime;

    fn record(author_id: i64, comments: Vec<CommentRecord>) -> PostRecord {
        PostRecord {
            date: DateTime::parse_from_rfc3339("2010-03-28T20:15:00+02:00").unwrap(),
            author: "Jo".into(),
            author_id,
            categories: vec!["News".into()],
            title: "T".into(),
            content: "a\r\n<br/>\r\nb".into(),
            comments: Some(CommentThread {
                url: "u".into(),
                entries: comments,
            }),
            url: "u".into(),
            media: vec![],
        }
    }

    #[test]
    fn post_payload_fields() {
        let payload = serde_json::to_value(post_payload(&record(2, vec![]), 5, vec![3, 4])).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "date_gmt": "2010-03-28T18:15:00+00:00",
                "status": "publish",
                "title": "T",
                "content": "a\r\nb",
                "author": 5,
                "comment_status": "closed",
                "ping_status": "closed",
                "format": "standard",
                "categories": [3, 4],
            })
        );
    }

    #[test]
    fn comment_payload_fields() {
        let comment = CommentRecord {
            date: DateTime::parse_from_rfc3339("2010-01-02T10:00:00+01:00").unwrap(),
            author_name: "Anna".into(),
            content: "Nice".into(),
        };
        let payload = serde_json::to_value(comment_payload(&comment, 9, "c@example.org")).unwrap();
        assert_eq!(payload["date_gmt"], "2010-01-02T09:00:00+00:00");
        assert_eq!(payload["post"], 9);
        assert_eq!(payload["status"], "approve");
        assert_eq!(payload["author_email"], "c@example.org");
    }

    #[test]
    fn used_authors_need_an_entry_and_a_slug() {
        let mut authors = AuthorIndex::new();
        authors.insert(
            1,
            AuthorEntry {
                name: "A".into(),
                posts: 1,
                slug: Some("a".into()),
            },
        );
        authors.insert(
            2,
            AuthorEntry {
                name: "B".into(),
                posts: 1,
                slug: None,
            },
        );
        authors.insert(
            3,
            AuthorEntry {
                name: "C".into(),
                posts: 0,
                slug: Some("c".into()),
            },
        );

        let used = used_authors(&[record(1, vec![])], &authors).unwrap();
        assert_eq!(used.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert!(matches!(
            used_authors(&[record(2, vec![])], &authors),
            Err(ReplayError::MissingSlug(2))
        ));
        assert!(matches!(
            used_authors(&[record(7, vec![])], &authors),
            Err(ReplayError::UnmappedAuthor(7))
        ));
    }

    #[test]
    fn passwords_are_alphanumeric() {
        let password = generate_password();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

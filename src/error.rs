use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single extraction step inside the normalizer.  These never
/// abort a document; the normalizer logs them and carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("malformed media index marker {marker:?}")]
    ParseError { marker: String },
}

/// Errors from the daylight-saving lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimezoneError {
    #[error("no daylight-saving dates known for {0}")]
    UnknownYear(i32),
}

/// Errors raised by an [`crate::http::HttpClient`].
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: &'static str,
        url: String,
        message: String,
    },
    #[error("reading response body of {url}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while reading the legacy archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("GET {url} answered with status {status}")]
    UnexpectedStatus { url: String, status: u16 },
    #[error("{what} not found in {url}")]
    MissingElement { what: &'static str, url: String },
    #[error("cannot parse {what} from {value:?}")]
    InvalidDate {
        what: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("entry footer of {title:?} lacks the {token:?} marker")]
    MalformedFooter { title: String, token: &'static str },
    #[error(transparent)]
    Timezone(#[from] TimezoneError),
}

/// Errors reading or writing the record directory.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors of a collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors loading `config.yml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration {} is not valid YAML", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("configuration is missing `{0}`")]
    Missing(&'static str),
}

/// Errors of the OAuth 1.0a handshake.  Signing itself cannot fail.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("oauthCallback must be \"oob\"")]
    CallbackNotOob,
    #[error("{url} answered with status {status}")]
    UnexpectedStatus { url: String, status: u16 },
    #[error("response did not contain oauth_token and oauth_token_secret")]
    MissingToken,
    #[error("authorization aborted")]
    Aborted,
    #[error("reading the verifier")]
    Prompt(#[source] std::io::Error),
}

/// Errors of the transfer to the destination blog.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{action} answered with status {status}: {body}")]
    UnexpectedStatus {
        action: String,
        status: u16,
        body: String,
    },
    #[error("unexpected response to {action}")]
    Json {
        action: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("author id {0} is not in authors.yml")]
    UnmappedAuthor(i64),
    #[error("author id {0} has no slug in authors.yml")]
    MissingSlug(i64),
    #[error("users do not exist on the blog: {}", .0.join(", "))]
    UnknownUsers(Vec<String>),
}

//! The record directory: one `NNN.yml` per post plus `authors.yml`.

use crate::error::StoreError;
use crate::models::{AuthorIndex, PostRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const AUTHORS_FILE: &str = "authors.yml";
/// Reserved for a category map; never loaded as a record.
pub const CATEGORIES_FILE: &str = "categories.yml";
const RECORD_EXTENSION: &str = "yml";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_yaml::to_string(value).map_err(|source| StoreError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(io_error(path))
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    serde_yaml::from_str(&text).map_err(|source| StoreError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Create the directory (and parents) if needed.
pub fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(io_error(dir))
}

/// `{dir}/{index:03}.yml`
pub fn record_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{:03}.{}", index, RECORD_EXTENSION))
}

pub fn write_record(dir: &Path, index: usize, record: &PostRecord) -> Result<PathBuf, StoreError> {
    let path = record_path(dir, index);
    write_yaml(&path, record)?;
    Ok(path)
}

pub fn read_record(path: &Path) -> Result<PostRecord, StoreError> {
    read_yaml(path)
}

pub fn write_authors(dir: &Path, authors: &AuthorIndex) -> Result<(), StoreError> {
    write_yaml(&dir.join(AUTHORS_FILE), authors)
}

pub fn read_authors(dir: &Path) -> Result<AuthorIndex, StoreError> {
    read_yaml(&dir.join(AUTHORS_FILE))
}

fn is_record_file(path: &Path) -> bool {
    let reserved = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == AUTHORS_FILE || n == CATEGORIES_FILE)
        .unwrap_or(true);
    !reserved
        && path.is_file()
        && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
}

/// Every record of `dir`, ordered by file name.
pub fn load_records(dir: &Path) -> Result<Vec<PostRecord>, StoreError> {
    let mut paths = fs::read_dir(dir)
        .map_err(io_error(dir))?
        .map(|entry| entry.map(|e| e.path()).map_err(io_error(dir)))
        .collect::<Result<Vec<_>, _>>()?;
    paths.retain(|p| is_record_file(p));
    paths.sort();
    paths.iter().map(|p| read_record(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorEntry, CommentRecord, CommentThread, MediaReference};
    use chrono::DateTime;

    fn record(title: &str) -> PostRecord {
        PostRecord {
            date: DateTime::parse_from_rfc3339("2010-03-28T20:15:00+02:00").unwrap(),
            author: "Jo Doe".into(),
            author_id: 2,
            categories: vec!["News".into()],
            title: title.into(),
            content: "Hello\r\n<p>world</p>".into(),
            comments: Some(CommentThread {
                url: "http://b/c".into(),
                entries: vec![CommentRecord {
                    date: DateTime::parse_from_rfc3339("2010-03-29T08:00:00+02:00").unwrap(),
                    author_name: "Anna".into(),
                    content: "Nice".into(),
                }],
            }),
            url: "http://b/p".into(),
            media: vec![MediaReference {
                url: "/uploads/x.jpg".into(),
                source_index: 3,
                filename: "x.jpg".into(),
            }],
        }
    }

    #[test]
    fn records_survive_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(dir.path(), 7, &record("Seven")).unwrap();
        assert_eq!(path.file_name().unwrap(), "007.yml");
        assert_eq!(read_record(&path).unwrap(), record("Seven"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("authorName: Anna"));
        assert!(text.contains("sourceIndex: 3"));
        assert!(text.contains("author_id: 2"));
    }

    #[test]
    fn load_skips_reserved_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), 1, &record("One")).unwrap();
        write_record(dir.path(), 0, &record("Zero")).unwrap();
        let mut authors = AuthorIndex::new();
        authors.insert(
            2,
            AuthorEntry {
                name: "Jo Doe".into(),
                posts: 2,
                slug: None,
            },
        );
        write_authors(dir.path(), &authors).unwrap();
        fs::write(dir.path().join(CATEGORIES_FILE), "News: 3\n").unwrap();
        fs::write(dir.path().join("x.jpg"), [0u8, 1, 2]).unwrap();

        let titles: Vec<String> = load_records(dir.path())
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Zero", "One"]);
        assert_eq!(read_authors(dir.path()).unwrap(), authors);
    }

    #[test]
    fn records_without_comments_or_media() {
        let yaml = "date: 2011-01-02T03:04:00+01:00\nauthor: Jo\nauthor_id: -1\ntitle: T\ncontent: ''\nurl: u\n";
        let parsed: PostRecord = serde_yaml::from_str(yaml).unwrap();
        assert!(parsed.comment_entries().is_empty());
        assert!(parsed.media.is_empty());
        assert!(parsed.categories.is_empty());
    }

    #[test]
    fn unreadable_record_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("000.yml"), "date: [").unwrap();
        match load_records(dir.path()) {
            Err(StoreError::Yaml { path, .. }) => assert!(path.ends_with("000.yml")),
            other => panic!("unexpected {:?}", other.map(|r| r.len())),
        }
    }
}

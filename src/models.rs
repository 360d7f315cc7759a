use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// An inline photo found in a body, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaReference {
    /// The `href` of the image-link wrapper, as found in the page.
    pub url: String,
    /// The media-database index from the marker comment preceding the image,
    /// or `-1` when there is none.
    pub source_index: i64,
    /// The last path segment of `url`.
    pub filename: String,
}

/// Rules that drive [`crate::normalize`].
///
/// The defaults describe no rewriting at all apart from the fixed policy
/// (comments dropped, image links extracted, bold spans promoted); use
/// [`Ruleset::for_posts`] or [`Ruleset::for_comments`] for the legacy
/// engine's markup.
///
/// # Examples
///
/// ```rust
/// use s9y_migrate::Ruleset;
///
/// let mut rules = Ruleset::for_comments();
/// rules.unwrap.insert("blockquote".into(), vec![]); // flatten quotes too
/// assert!(!rules.follow_extended_link);
/// ```
#[derive(Debug, Clone)]
pub struct Ruleset {
    /// Tag name → classes.  An element of that tag carrying any of the
    /// classes is dropped together with its subtree.
    pub exclude: HashMap<String, Vec<String>>,
    /// Tag name → attribute names removed from the emitted copy.
    pub strip_attributes: HashMap<String, Vec<String>>,
    /// Tag name → classes.  Matching elements are replaced by their
    /// children; an empty list unwraps every element of that tag.
    pub unwrap: HashMap<String, Vec<String>>,
    /// Whether the collector splices the "continue reading" fragment into
    /// the body before normalizing it.
    pub follow_extended_link: bool,
    /// Class marking an anchor as an image-link wrapper.
    pub image_link_class: String,
    /// Class prefix of the image inside an image-link wrapper.
    pub image_class_prefix: String,
    /// Prefix of the comment that carries the media-database index.
    pub index_marker: String,
}

impl Default for Ruleset {
    fn default() -> Ruleset {
        Ruleset {
            exclude: HashMap::new(),
            strip_attributes: HashMap::new(),
            unwrap: HashMap::new(),
            follow_extended_link: false,
            image_link_class: String::from("serendipity_image_link"),
            image_class_prefix: String::from("serendipity_image"),
            index_marker: String::from("s9ymdb:"),
        }
    }
}

fn rule_map(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(tag, values)| {
            (
                tag.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}

const POST_EXCLUDES: &[(&str, &[&str])] = &[("div", &["serendipity_authorpic"])];
const COMMENT_EXCLUDES: &[(&str, &[&str])] = &[("div", &["serendipity_commentcount"])];
const STRIPPED_ATTRIBUTES: &[(&str, &[&str])] =
    &[("p", &["style", "class"]), ("a", &["style", "class"])];
const UNWRAPPED_TAGS: &[(&str, &[&str])] = &[
    ("address", &[]),
    ("br", &[]),
    ("font", &[]),
    ("pre", &[]),
    ("span", &[]),
    ("div", &[]),
];

impl Ruleset {
    /// Rules for entry bodies: the author picture is dropped and the
    /// extended entry is followed.
    pub fn for_posts() -> Ruleset {
        Ruleset {
            exclude: rule_map(POST_EXCLUDES),
            strip_attributes: rule_map(STRIPPED_ATTRIBUTES),
            unwrap: rule_map(UNWRAPPED_TAGS),
            follow_extended_link: true,
            ..Ruleset::default()
        }
    }

    /// Rules for comment bodies: the per-comment counter is dropped.
    pub fn for_comments() -> Ruleset {
        Ruleset {
            exclude: rule_map(COMMENT_EXCLUDES),
            strip_attributes: rule_map(STRIPPED_ATTRIBUTES),
            unwrap: rule_map(UNWRAPPED_TAGS),
            follow_extended_link: false,
            ..Ruleset::default()
        }
    }
}

/// One comment below a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub date: DateTime<FixedOffset>,
    pub author_name: String,
    pub content: String,
}

/// The comments of a post together with the page they were read from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommentThread {
    pub url: String,
    #[serde(default)]
    pub entries: Vec<CommentRecord>,
}

/// A collected post, as stored in `NNN.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub date: DateTime<FixedOffset>,
    pub author: String,
    pub author_id: i64,
    #[serde(default)]
    pub categories: Vec<String>,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<CommentThread>,
    pub url: String,
    #[serde(default)]
    pub media: Vec<MediaReference>,
}

impl PostRecord {
    /// The comment entries, empty when the post had none.
    pub fn comment_entries(&self) -> &[CommentRecord] {
        self.comments
            .as_ref()
            .map(|c| c.entries.as_slice())
            .unwrap_or(&[])
    }
}

/// An author seen while collecting.  `slug` is filled in by hand before the
/// transfer; it names the destination user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorEntry {
    pub name: String,
    pub posts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// The author index, keyed by legacy author id.
pub type AuthorIndex = BTreeMap<i64, AuthorEntry>;

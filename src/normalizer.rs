//! Rewrites a legacy entry or comment body into canonical markup.
//!
//! [`normalize`] walks the children of an element and builds a fresh output
//! tree; the input is never touched.  Per child, in order of precedence:
//!
//! 1. text is copied with surrounding `\r`/`\n` trimmed;
//! 2. comments are dropped;
//! 3. elements matching [`Ruleset::exclude`] are dropped with their subtree;
//! 4. image-link wrappers are consumed into a [`MediaReference`];
//! 5. any other element is normalized recursively, then bold spans are
//!    promoted to `<b>`, attributes are stripped, zero-margin paragraphs
//!    become line breaks and configured wrappers are unwrapped;
//! 6. anything else (doctype, processing instruction, ...) is reported and
//!    skipped.
//!
//! Adjacent text nodes produced by unwrapping are left unmerged.

use crate::error::NormalizeError;
use crate::models::{MediaReference, Ruleset};
use crate::parser::{new_html_element, NodeExt, NodeRef};
use crate::utils::basename;
use kuchikiki::NodeData;
use regex::Regex;
use std::sync::LazyLock;

/// `style` value the legacy editor used for spacer paragraphs.
pub const ZERO_MARGIN_STYLE: &str = "margin: 0cm 0cm 0pt;";

/// Canonical declaration that promotes a `span` to bold.
pub const BOLD_DECLARATION: &str = "font-weight:bold";

static STYLE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// The output of [`normalize`]: a detached copy of the input element holding
/// the cleaned children, plus the media references found beneath it.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub node: NodeRef,
    pub media: Vec<MediaReference>,
}

impl Normalized {
    /// Serialise the cleaned children: each top-level fragment is trimmed,
    /// blank fragments are dropped and the rest joined with `\r\n`.
    pub fn render(&self) -> String {
        render_content(&self.node)
    }
}

/// Normalize the children of `node` according to `rules`.
///
/// The returned node has the same tag and attributes as `node`; media
/// references are listed in document order, nested ones included.
///
/// # Examples
///
/// ```rust
/// use s9y_migrate::parser::parse_fragment;
/// use s9y_migrate::{normalize, Ruleset};
///
/// let body = parse_fragment(r#"<div><span style="font-weight : bold ;">Hi</span><!-- x --></div>"#);
/// let div = body.select_first("div").unwrap();
/// let out = normalize(div.as_node(), &Ruleset::default());
/// assert_eq!(out.render(), "<b><span style=\"font-weight : bold ;\">Hi</span></b>");
/// ```
pub fn normalize(node: &NodeRef, rules: &Ruleset) -> Normalized {
    let result = node
        .shallow_clone_element()
        .unwrap_or_else(|| NodeRef::new(NodeData::DocumentFragment));
    let mut media = vec![];

    for child in node.children() {
        match child.data() {
            NodeData::Text(text) => {
                let trimmed = text.borrow().trim_matches(['\r', '\n']).to_string();
                result.append(NodeRef::new_text(trimmed));
            }
            NodeData::Comment(_) => {}
            NodeData::Element(_) => {
                if is_excluded(&child, rules) {
                    continue;
                }
                if is_image_link(&child, rules) {
                    media.extend(extract_media(&child, rules));
                    continue;
                }
                media.extend(normalize_element(&child, &result, rules));
            }
            _ => {
                tracing::warn!(node = %child.to_string(), "skipping node of unexpected type");
            }
        }
    }

    Normalized {
        node: result,
        media,
    }
}

/// Normalize one element child and place its copy into `parent`.  Returns
/// the media found beneath it.
fn normalize_element(child: &NodeRef, parent: &NodeRef, rules: &Ruleset) -> Vec<MediaReference> {
    let Normalized { node: copy, media } = normalize(child, rules);
    let tag = child.element_name().unwrap_or_default();

    match child.attr_value("style") {
        Some(style) if tag == "span" && is_bold_style(&style) => {
            let b = new_html_element("b");
            b.append(copy.clone());
            parent.append(b);
        }
        _ => parent.append(copy.clone()),
    }

    if let Some(attributes) = rules.strip_attributes.get(tag) {
        for attribute in attributes {
            copy.remove_attr(attribute);
        }
    }

    if tag == "p" && child.attr_value("style").as_deref() == Some(ZERO_MARGIN_STYLE) {
        copy.unwrap_in_place();
        parent.append(new_html_element("br"));
    }

    if let Some(classes) = rules.unwrap.get(tag) {
        if classes.is_empty() || child.has_any_class(classes.as_slice()) {
            copy.unwrap_in_place();
        }
    }

    media
}

fn is_excluded(node: &NodeRef, rules: &Ruleset) -> bool {
    node.element_name()
        .and_then(|tag| rules.exclude.get(tag))
        .map(|classes| node.has_any_class(classes.as_slice()))
        .unwrap_or(false)
}

fn is_image_link(node: &NodeRef, rules: &Ruleset) -> bool {
    node.element_name() == Some("a") && node.has_any_class(&[rules.image_link_class.as_str()])
}

/// Split a `style` attribute into whitespace-free declarations.
///
/// `"font-weight : bold ; color: red"` becomes
/// `["font-weight:bold", "color:red"]`.
pub fn canonical_style(style: &str) -> Vec<String> {
    STYLE_WHITESPACE
        .replace_all(style, "")
        .split(';')
        .map(String::from)
        .collect()
}

pub fn is_bold_style(style: &str) -> bool {
    canonical_style(style).iter().any(|d| d == BOLD_DECLARATION)
}

/// Read the media-database index out of a marker comment.
///
/// Returns `Ok(None)` when the (trimmed) comment does not start with
/// `marker`, and [`NormalizeError::ParseError`] when it does but the rest is
/// not an integer.
pub fn parse_index_marker(comment: &str, marker: &str) -> Result<Option<i64>, NormalizeError> {
    let comment = comment.trim();
    match comment.strip_prefix(marker) {
        None => Ok(None),
        Some(rest) => rest
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| NormalizeError::ParseError {
                marker: comment.to_string(),
            }),
    }
}

fn find_wrapped_image(anchor: &NodeRef, rules: &Ruleset) -> Option<NodeRef> {
    anchor.descendants().find(|n| {
        n.element_name() == Some("img")
            && n
                .class_list()
                .iter()
                .any(|c| c.starts_with(rules.image_class_prefix.as_str()))
    })
}

fn source_index_of(image: &NodeRef, rules: &Ruleset) -> i64 {
    let Some(previous) = image.previous_sibling() else {
        return -1;
    };
    let Some(comment) = previous.as_comment() else {
        return -1;
    };
    let text = comment.borrow().as_str().to_string();
    match parse_index_marker(&text, rules.index_marker.as_str()) {
        Ok(index) => index.unwrap_or(-1),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring media index");
            -1
        }
    }
}

fn extract_media(anchor: &NodeRef, rules: &Ruleset) -> Option<MediaReference> {
    let Some(url) = anchor.attr_value("href") else {
        tracing::warn!(node = %anchor.to_string(), "image link without href");
        return None;
    };
    let source_index = match find_wrapped_image(anchor, rules) {
        Some(image) => source_index_of(&image, rules),
        None => {
            tracing::warn!(url = %url, "image link without image");
            -1
        }
    };
    Some(MediaReference {
        filename: basename(&url).to_string(),
        url,
        source_index,
    })
}

/// Serialise the children of `node` the way records store content: each
/// fragment trimmed, blank fragments dropped, joined with `\r\n`.
pub fn render_content(node: &NodeRef) -> String {
    node.children()
        .map(|child| child.to_string())
        .map(|html| html.trim().to_string())
        .filter(|html| !html.is_empty())
        .collect::<Vec<_>>()
        .join("\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_fragment;
    use std::collections::HashMap;

    fn first(html: &str, selector: &str) -> NodeRef {
        parse_fragment(html)
            .select_first(selector)
            .unwrap()
            .as_node()
            .clone()
    }

    fn rules_with_unwrap(unwrap: &[(&str, &[&str])]) -> Ruleset {
        Ruleset {
            unwrap: unwrap
                .iter()
                .map(|(t, c)| (t.to_string(), c.iter().map(|s| s.to_string()).collect()))
                .collect::<HashMap<_, _>>(),
            ..Ruleset::default()
        }
    }

    #[test]
    fn text_is_trimmed_of_line_breaks_only() {
        let div = first("<div>\r\n  hello \r\n</div>", "div");
        let out = normalize(&div, &Ruleset::default());
        let text = out.node.first_child().unwrap();
        assert_eq!(text.as_text().unwrap().borrow().as_str(), "  hello ");
    }

    #[test]
    fn comments_are_dropped() {
        let div = first("<div>a<!-- gone -->b</div>", "div");
        let out = normalize(&div, &Ruleset::default());
        assert!(out.node.children().all(|c| c.as_comment().is_none()));
        assert_eq!(out.node.inner_html(), "ab");
    }

    #[test]
    fn input_is_left_untouched() {
        let html = r#"<div><p style="margin: 0cm 0cm 0pt;" class="x">a</p><span>b</span></div>"#;
        let div = first(html, "div");
        let before = div.to_string();
        let mut rules = Ruleset::for_posts();
        rules.unwrap.insert("p".into(), vec![]);
        let _ = normalize(&div, &rules);
        assert_eq!(div.to_string(), before);
    }

    #[test]
    fn excluded_elements_disappear_with_their_subtree() {
        let div = first(
            r#"<div><div class="serendipity_authorpic"><img src="me.png"></div><p>text</p></div>"#,
            "div",
        );
        let out = normalize(&div, &Ruleset::for_posts());
        assert_eq!(out.render(), "<p>text</p>");
    }

    #[test]
    fn exclusion_needs_a_matching_class() {
        let div = first(r#"<div><div class="other">kept</div></div>"#, "div");
        let mut rules = Ruleset::default();
        rules
            .exclude
            .insert("div".into(), vec!["serendipity_authorpic".into()]);
        let out = normalize(&div, &rules);
        assert_eq!(out.render(), r#"<div class="other">kept</div>"#);
    }

    #[test]
    fn bold_span_is_wrapped_and_plain_span_is_not() {
        let div = first(
            r#"<div><span style="font-weight :  bold;">B</span><span style="color: red">R</span></div>"#,
            "div",
        );
        let out = normalize(&div, &rules_with_unwrap(&[("span", &[])]));
        assert_eq!(out.node.inner_html(), "<b>B</b>R");
    }

    #[test]
    fn zero_margin_paragraph_becomes_line_break() {
        let div = first(r#"<div><p style="margin: 0cm 0cm 0pt;">line</p>next</div>"#, "div");
        let out = normalize(&div, &Ruleset::for_posts());
        assert_eq!(out.node.inner_html(), "line<br>next");
    }

    #[test]
    fn stripped_attributes_only_affect_listed_tags() {
        let div = first(
            r#"<div><p class="a" style="b" id="c">x</p><em class="k">y</em></div>"#,
            "div",
        );
        let out = normalize(&div, &Ruleset::for_posts());
        assert_eq!(
            out.node.inner_html(),
            r#"<p id="c">x</p><em class="k">y</em>"#
        );
    }

    #[test]
    fn conditional_unwrap_checks_original_classes() {
        let div = first(
            r#"<div><blockquote class="quote">a</blockquote><blockquote class="other">b</blockquote></div>"#,
            "div",
        );
        let out = normalize(&div, &rules_with_unwrap(&[("blockquote", &["quote"])]));
        assert_eq!(
            out.node.inner_html(),
            r#"a<blockquote class="other">b</blockquote>"#
        );
    }

    #[test]
    fn nested_unwraps_splice_recursively() {
        let div = first("<div><div><font>deep</font> text</div></div>", "div");
        let out = normalize(&div, &Ruleset::for_posts());
        assert_eq!(out.node.inner_html(), "deep text");
    }

    #[test]
    fn structure_is_kept_without_rules() {
        let div = first(
            "<div><section><p class=\"a\">one <em>two</em></p>\r\n<ul><li>x</li><li><a href=\"/y\">y</a></li></ul></section>tail</div>",
            "div",
        );
        let out = normalize(&div, &Ruleset::default());
        assert_eq!(
            out.node.inner_html(),
            r#"<section><p class="a">one <em>two</em></p><ul><li>x</li><li><a href="/y">y</a></li></ul></section>tail"#
        );
        assert!(out.media.is_empty());
    }

    #[test]
    fn media_index_is_read_from_the_marker_before_the_image() {
        let div = first(
            r#"<div><p><a class="serendipity_image_link" href="/u/a.jpg"><!-- s9ymdb:41 --><img class="serendipity_image_left"></a></p><a class="serendipity_image_link" href="/u/b.jpg"><!-- s9ymdb:zz --><img class="serendipity_image_left"></a></div>"#,
            "div",
        );
        let out = normalize(&div, &Ruleset::for_posts());
        let indexes = out
            .media
            .iter()
            .map(|m| (m.filename.as_str(), m.source_index))
            .collect::<Vec<_>>();
        assert_eq!(indexes, vec![("a.jpg", 41), ("b.jpg", -1)]);
        assert_eq!(out.render(), "<p></p>");
    }

    #[test]
    fn index_marker_parsing() {
        assert_eq!(parse_index_marker(" s9ymdb:12 ", "s9ymdb:"), Ok(Some(12)));
        assert_eq!(parse_index_marker("index:7", "index:"), Ok(Some(7)));
        assert_eq!(parse_index_marker("something else", "index:"), Ok(None));
        assert_eq!(
            parse_index_marker("index:seven", "index:"),
            Err(NormalizeError::ParseError {
                marker: String::from("index:seven")
            })
        );
    }

    #[test]
    fn canonical_style_removes_all_whitespace() {
        assert_eq!(
            canonical_style(" font-weight : bold ;  color:\tred "),
            vec!["font-weight:bold", "color:red"]
        );
        assert!(is_bold_style("font-weight: bold"));
        assert!(!is_bold_style("font-weight: bolder;"));
    }
}

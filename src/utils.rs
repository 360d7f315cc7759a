use crate::parser::{NodeExt, NodeRef};
use kuchikiki::traits::NodeIterator;

/// The last `/`-separated segment of a URL or path.
///
/// ```rust
/// use s9y_migrate::shared_utils::basename;
///
/// assert_eq!(basename("/uploads/2010/photo.jpg"), "photo.jpg");
/// assert_eq!(basename("photo.jpg"), "photo.jpg");
/// ```
pub fn basename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Resolve a site-relative link (one starting with `/`) against `site`.
/// Anything else is returned unchanged.
pub fn resolve_site_url(site: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", site.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

/// Return all descendants of `node` that match `selector`, excluding `node`
/// itself.  An invalid selector returns an empty `Vec` rather than panicking.
pub fn select_descendants(node: &NodeRef, selector: &str) -> Vec<NodeRef> {
    match node.select(selector) {
        Ok(iter) => iter
            .filter_map(|e| {
                let n = e.as_node();
                if n == node { None } else { Some(n.clone()) }
            })
            .collect(),
        Err(_) => vec![],
    }
}

/// The first descendant of `node` matching `selector`.
pub fn select_first_descendant(node: &NodeRef, selector: &str) -> Option<NodeRef> {
    select_descendants(node, selector).into_iter().next()
}

/// Direct element children of `node` with tag `tag` carrying class `class`.
pub fn child_elements_with_class(node: &NodeRef, tag: &str, class: &str) -> Vec<NodeRef> {
    node.children()
        .filter(|c| c.element_name() == Some(tag) && c.has_any_class(&[class]))
        .collect()
}

/// The text nodes beneath `node`, trimmed, with blank ones skipped.
pub fn stripped_strings(node: &NodeRef) -> Vec<String> {
    node.descendants()
        .text_nodes()
        .map(|t| t.borrow().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_fragment;

    #[test]
    fn resolves_only_site_relative_links() {
        assert_eq!(
            resolve_site_url("http://blog.example.org/", "/index.php?/archives/1.html"),
            "http://blog.example.org/index.php?/archives/1.html"
        );
        assert_eq!(
            resolve_site_url("http://blog.example.org", "http://elsewhere/x"),
            "http://elsewhere/x"
        );
    }

    #[test]
    fn stripped_strings_skip_blank_text() {
        let root = parse_fragment("<div> a <b>\n</b><i> b </i></div>");
        let div = select_first_descendant(&root, "div").unwrap();
        assert_eq!(stripped_strings(&div), vec!["a", "b"]);
    }

    #[test]
    fn direct_children_by_class() {
        let root = parse_fragment(
            r#"<div id="c"><div class="e">1</div><section><div class="e">2</div></section></div>"#,
        );
        let c = select_first_descendant(&root, "#c").unwrap();
        assert_eq!(child_elements_with_class(&c, "div", "e").len(), 1);
    }
}

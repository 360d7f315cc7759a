use crate::parser::NodeRef;
use html5ever::{LocalName, Namespace, QualName};
use kuchikiki::{Attributes, ElementData, NodeData};
use std::cell::RefCell;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// DOM-navigation and element-manipulation helpers implemented on [`NodeRef`].
///
/// This trait is automatically in scope when you import from
/// [`crate::parser`].
pub trait NodeExt {
    /// Return the local tag name of this node if it is an element (e.g.
    /// `"div"`, `"p"`), or `None` for text / comment / document nodes.
    fn element_name(&self) -> Option<&str>;

    /// Look up an attribute by name and return its value, or `None` if the
    /// attribute is absent or this is not an element node.
    fn attr_value(&self, name: &str) -> Option<String>;

    /// Whether the element carries the attribute at all.
    fn has_attr(&self, name: &str) -> bool;

    /// The whitespace-separated tokens of the `class` attribute.  Empty for
    /// non-elements and elements without a class.
    fn class_list(&self) -> Vec<String>;

    /// Whether any token of the `class` attribute appears in `classes`.
    fn has_any_class<S: AsRef<str>>(&self, classes: &[S]) -> bool;

    /// Remove the named attribute from an element.  No-op otherwise.
    fn remove_attr(&self, name: &str);

    /// Serialise the *children* of this node to an HTML string (the node's
    /// own open/close tags are **not** included).
    fn inner_html(&self) -> String;

    /// Build a detached element with the same name and attributes as `self`
    /// but no children.  Non-element nodes yield `None`.
    fn shallow_clone_element(&self) -> Option<NodeRef>;

    /// Replace this node with its children, keeping their order, and detach
    /// it.  A detached node simply loses its children.
    fn unwrap_in_place(&self);
}

/// Create a new, detached HTML element node with the given tag name and no
/// attributes or children.
///
/// # Examples
///
/// ```rust
/// use s9y_migrate::{new_html_element, NodeExt};
///
/// let b = new_html_element("b");
/// assert_eq!(b.element_name(), Some("b"));
/// ```
pub fn new_html_element(tag_name: &str) -> NodeRef {
    let name = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag_name));
    let attributes = Attributes {
        map: Default::default(),
    };
    NodeRef::new(NodeData::Element(ElementData {
        name,
        attributes: RefCell::new(attributes),
        template_contents: None,
    }))
}

impl NodeExt for NodeRef {
    fn element_name(&self) -> Option<&str> {
        self.as_element().map(|e| e.name.local.as_ref())
    }

    fn attr_value(&self, name: &str) -> Option<String> {
        self.as_element()
            .and_then(|e| e.attributes.borrow().get(name).map(|v| v.to_string()))
    }

    fn has_attr(&self, name: &str) -> bool {
        self.as_element()
            .map(|e| e.attributes.borrow().contains(name))
            .unwrap_or(false)
    }

    fn class_list(&self) -> Vec<String> {
        self.attr_value("class")
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    fn has_any_class<S: AsRef<str>>(&self, classes: &[S]) -> bool {
        self.class_list()
            .iter()
            .any(|token| classes.iter().any(|c| c.as_ref() == token))
    }

    fn remove_attr(&self, name: &str) {
        if let Some(e) = self.as_element() {
            e.attributes.borrow_mut().remove(name);
        }
    }

    fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            out.push_str(&child.to_string());
        }
        out
    }

    fn shallow_clone_element(&self) -> Option<NodeRef> {
        let e = self.as_element()?;
        Some(NodeRef::new(NodeData::Element(ElementData {
            name: e.name.clone(),
            attributes: RefCell::new(Attributes {
                map: e.attributes.borrow().map.clone(),
            }),
            template_contents: None,
        })))
    }

    fn unwrap_in_place(&self) {
        while let Some(child) = self.first_child() {
            if self.parent().is_some() {
                self.insert_before(child);
            } else {
                child.detach();
            }
        }
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_fragment;

    #[test]
    fn unwrap_in_place_keeps_children_in_order() {
        let root = parse_fragment("<div><span>a<i>b</i>c</span>d</div>");
        let span = root.select_first("span").unwrap().as_node().clone();
        span.unwrap_in_place();
        let div = root.select_first("div").unwrap();
        assert_eq!(div.as_node().inner_html(), "a<i>b</i>cd");
    }

    #[test]
    fn shallow_clone_copies_attributes_only() {
        let root = parse_fragment(r#"<p class="x y" style="color: red">text</p>"#);
        let p = root.select_first("p").unwrap().as_node().clone();
        let copy = p.shallow_clone_element().unwrap();
        assert_eq!(copy.element_name(), Some("p"));
        assert_eq!(copy.class_list(), vec!["x", "y"]);
        assert!(copy.first_child().is_none());

        copy.remove_attr("style");
        assert!(!copy.has_attr("style"));
        assert!(p.has_attr("style"));
    }

    #[test]
    fn new_elements_match_parsed_ones() {
        let root = parse_fragment("<b>x</b>");
        let parsed = root.select_first("b").unwrap();
        let created = new_html_element("b");
        assert_eq!(created.as_element().unwrap().name, parsed.name);
    }

    #[test]
    fn class_intersection() {
        let root = parse_fragment(r#"<div class="serendipity_authorpic left"></div>"#);
        let div = root.select_first("div").unwrap().as_node().clone();
        assert!(div.has_any_class(&["serendipity_authorpic"]));
        assert!(!div.has_any_class(&["serendipity"]));
        assert!(!div.has_any_class::<&str>(&[]));
    }
}

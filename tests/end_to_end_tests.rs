#[cfg(test)]
mod tests {
    use s9y_migrate::parser::*;

    use rstest::rstest;
    use s9y_migrate::*;

    use std::fs::File;
    use std::io::Read;
    use std::path::Path;

    const FIXTURE_DIR: &str = "./tests/fixtures/";

    fn collapse_whitespace(input: &str) -> String {
        return regex::Regex::new(r"\s+")
            .unwrap()
            .replace_all(input, " ")
            .trim()
            .to_string();
    }

    fn equal_trees(expected: &NodeRef, actual: &NodeRef) -> bool {
        let mut stack: Vec<(NodeRef, NodeRef, String)> =
            vec![(expected.clone(), actual.clone(), "root".to_string())];

        let summarize = |n: &NodeRef| {
            if let Some(name) = n.element_name() {
                name.to_string()
            } else if n.as_text().is_some() {
                let t = n.text_contents();
                let t = t.trim().chars().take(30).collect::<String>();
                format!("text:{}", t)
            } else {
                "node".to_string()
            }
        };

        while let Some((expected_node, actual_node, path)) = stack.pop() {
            if expected_node.element_name() != actual_node.element_name() {
                println!(
                    "Failed: element names don't match at {}: {:#?}\n\n{:#?}",
                    path,
                    expected_node.element_name(),
                    actual_node.element_name()
                );
                return false;
            }

            match (expected_node.as_element(), actual_node.as_element()) {
                (Some(l), Some(r)) => {
                    if l.attributes.borrow().map != r.attributes.borrow().map {
                        println!(
                            "Failed: attributes don't match at {}: Expected: {:#?}\n\nActual:{:#?}",
                            path,
                            l.attributes.borrow().map,
                            r.attributes.borrow().map
                        );
                        return false;
                    }
                }
                (Some(_), None) | (None, Some(_)) => {
                    println!(
                        "Failed: node types don't match at {}: {:#?}\n\nActual:{:#?}",
                        path, expected_node, actual_node
                    );
                    return false;
                }
                (None, None) => (),
            }

            match (expected_node.as_text(), actual_node.as_text()) {
                (Some(_), Some(_)) => {
                    let expected_text = collapse_whitespace(&expected_node.text_contents());
                    let actual_text = collapse_whitespace(&actual_node.text_contents());
                    if expected_text != actual_text {
                        println!(
                            "Failed: text nodes don't match at {}: Expected: {} \n\n Actual: {}",
                            path, expected_text, actual_text
                        );
                        return false;
                    }
                    continue;
                }
                (Some(_), None) | (None, Some(_)) => {
                    println!(
                        "Failed: node types don't match at {}: {:#?}\n\nActual:{:#?}",
                        path, expected_node, actual_node
                    );
                    return false;
                }
                (None, None) => (),
            }

            let expected_children = expected_node
                .children()
                .filter(|n| !n.text_contents().trim().is_empty())
                .collect::<Vec<_>>();
            let actual_children = actual_node
                .children()
                .filter(|n| !n.text_contents().trim().is_empty())
                .collect::<Vec<_>>();
            if expected_children.len() != actual_children.len() {
                let expected_names = expected_children
                    .iter()
                    .map(|n| summarize(n))
                    .collect::<Vec<_>>();
                let actual_names = actual_children
                    .iter()
                    .map(|n| summarize(n))
                    .collect::<Vec<_>>();
                println!(
                    "Failed: child counts don't match at {}: {:#?} vs {:#?}\nExpected: {:?}\nActual: {:?}",
                    path,
                    expected_children.len(),
                    actual_children.len(),
                    expected_names,
                    actual_names
                );
                return false;
            }

            for (i, expected_child_node) in expected_children.iter().enumerate() {
                let actual_child_node = actual_children.get(i).unwrap();
                let child_path = format!("{}/{}", path, i);
                stack.push((
                    expected_child_node.clone(),
                    actual_child_node.clone(),
                    child_path,
                ));
            }
        }

        true
    }

    fn body_of(html: &str) -> NodeRef {
        parse_html(html)
            .select_first("body")
            .unwrap()
            .as_node()
            .clone()
    }

    pub fn html_contents_are_equal(expected: &str, actual: &str) -> bool {
        equal_trees(&body_of(expected), &body_of(actual))
    }

    fn get_file_content(file_path: &str) -> String {
        let path = Path::new(file_path);
        let mut content = String::new();
        let mut file = File::open(path).unwrap();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn get_source_from_dir(dir: &str) -> String {
        get_file_content(&format!("{}{}/source.html", FIXTURE_DIR, dir))
    }

    fn get_expected_from_dir(dir: &str) -> String {
        get_file_content(&format!("{}{}/expected.html", FIXTURE_DIR, dir))
    }

    fn get_expected_media_from_dir(dir: &str) -> Vec<MediaReference> {
        let json = get_file_content(&format!("{}{}/expected-media.json", FIXTURE_DIR, dir));
        serde_json::from_str(json.as_str()).unwrap()
    }

    /// The first element below `<body>` is the legacy body to normalize.
    fn legacy_body(source: &str) -> NodeRef {
        body_of(source)
            .children()
            .find(|c| c.element_name().is_some())
            .unwrap()
    }

    #[rstest]
    #[case("entry_with_media", Ruleset::for_posts())]
    #[case("wrapped_markup", Ruleset::for_posts())]
    #[case("comment_body", Ruleset::for_comments())]
    fn run(#[case] resource: &str, #[case] rules: Ruleset) {
        let source = get_source_from_dir(resource);
        let body = legacy_body(&source);
        let before = body.inner_html();

        let result = normalize(&body, &rules);
        let content = result.render();

        let expected = get_expected_from_dir(resource);
        assert!(html_contents_are_equal(
            expected.as_str(),
            &format!("<html><body>{}</body></html>", content)
        ));
        assert_eq!(result.media, get_expected_media_from_dir(resource));
        assert_eq!(body.inner_html(), before);
        assert!(!content.contains("<!--"));
    }

    #[test]
    fn rendered_fragments_are_joined_with_crlf() {
        let source = get_source_from_dir("comment_body");
        let result = normalize(&legacy_body(&source), &Ruleset::for_comments());
        assert_eq!(
            result.render(),
            "Toller Bericht!\r\nWeiter so.\r\n<b>Gruß</b>\r\nAnna"
        );
    }

    #[test]
    fn debug_this() {
        let resource = match std::env::var("NORMALIZE_DEBUG_RESOURCE") {
            Ok(value) => value,
            Err(_) => return,
        };
        let source = get_source_from_dir(resource.as_str());
        let actual = normalize(&legacy_body(&source), &Ruleset::for_posts()).render();
        let path = std::env::temp_dir().join("normalize-actual.html");
        std::fs::write(&path, actual.as_bytes()).unwrap();
        println!("Wrote {}", path.display());
    }
}

//! Markup lint rules.

use super::lexer::{Attribute, Node, NodeKind, VOID_ELEMENTS};
use crate::config::MarkupConfig;
use crate::diagnostic::{Diagnostic, Severity};
use std::collections::HashMap;
use std::path::Path;

/// Elements whose `src` (or `href`/`data`) must not be empty.
const SOURCE_ATTRIBUTES: &[(&str, &str)] = &[
    ("img", "src"),
    ("script", "src"),
    ("input", "src"),
    ("iframe", "src"),
    ("embed", "src"),
    ("audio", "src"),
    ("video", "src"),
    ("source", "src"),
    ("link", "href"),
    ("object", "data"),
];

struct Rules {
    doctype_first: Option<Severity>,
    tag_pair: Option<Severity>,
    tagname_lowercase: Option<Severity>,
    attr_lowercase: Option<Severity>,
    attr_value_double_quotes: Option<Severity>,
    id_unique: Option<Severity>,
    src_not_empty: Option<Severity>,
    attr_no_duplication: Option<Severity>,
}

impl Rules {
    fn from_config(config: &MarkupConfig, document: bool) -> Self {
        Self {
            doctype_first: if document { Severity::from_level(config.doctype_first) } else { None },
            tag_pair: Severity::from_level(config.tag_pair),
            tagname_lowercase: Severity::from_level(config.tagname_lowercase),
            attr_lowercase: Severity::from_level(config.attr_lowercase),
            attr_value_double_quotes: Severity::from_level(config.attr_value_double_quotes),
            id_unique: Severity::from_level(config.id_unique),
            src_not_empty: Severity::from_level(config.src_not_empty),
            attr_no_duplication: Severity::from_level(config.attr_no_duplication),
        }
    }
}

/// Lint a tokenized document. `document` enables the doctype rule, which
/// only applies to full pages and never to partials.
pub fn lint(file: &Path, nodes: &[Node], config: &MarkupConfig, document: bool) -> Vec<Diagnostic> {
    let rules = Rules::from_config(config, document);
    let mut diagnostics = Vec::new();

    if let Some(severity) = rules.doctype_first {
        let first = nodes.iter().find(|n| match n.kind {
            NodeKind::Text => !n.raw.trim().is_empty(),
            NodeKind::Comment => false,
            _ => true,
        });
        if let Some(node) = first {
            if node.kind != NodeKind::Doctype {
                diagnostics.push(
                    Diagnostic::new(file, "doctype-first", severity, "doctype must be declared first")
                        .at(node.line, node.column),
                );
            }
        }
    }

    let mut open: Vec<&Node> = Vec::new();
    let mut ids: HashMap<String, (usize, usize)> = HashMap::new();

    for node in nodes {
        match &node.kind {
            NodeKind::StartTag { name, attributes, self_closing } => {
                let lower = name.to_ascii_lowercase();

                if let Some(severity) = rules.tagname_lowercase {
                    if *name != lower {
                        diagnostics.push(
                            Diagnostic::new(
                                file,
                                "tagname-lowercase",
                                severity,
                                format!("tag name '{}' must be lowercase", name),
                            )
                            .at(node.line, node.column),
                        );
                    }
                }

                check_attributes(file, &lower, attributes, &rules, &mut ids, &mut diagnostics);

                if !self_closing && !VOID_ELEMENTS.contains(&lower.as_str()) {
                    open.push(node);
                }
            }
            NodeKind::EndTag { name } => {
                if let Some(severity) = rules.tagname_lowercase {
                    if *name != name.to_ascii_lowercase() {
                        diagnostics.push(
                            Diagnostic::new(
                                file,
                                "tagname-lowercase",
                                severity,
                                format!("tag name '{}' must be lowercase", name),
                            )
                            .at(node.line, node.column),
                        );
                    }
                }

                let position = open.iter().rposition(|n| {
                    n.tag_name().is_some_and(|open_name| open_name.eq_ignore_ascii_case(name))
                });
                match position {
                    Some(index) => {
                        // Everything opened after the match is left unclosed.
                        for unclosed in open.drain(index + 1..) {
                            if let Some(severity) = rules.tag_pair {
                                diagnostics.push(unclosed_tag(file, unclosed, severity));
                            }
                        }
                        open.pop();
                    }
                    None => {
                        if let Some(severity) = rules.tag_pair {
                            diagnostics.push(
                                Diagnostic::new(
                                    file,
                                    "tag-pair",
                                    severity,
                                    format!("end tag </{}> has no matching start tag", name),
                                )
                                .at(node.line, node.column),
                            );
                        }
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(severity) = rules.tag_pair {
        for unclosed in open {
            diagnostics.push(unclosed_tag(file, unclosed, severity));
        }
    }

    diagnostics.sort_by_key(|d| (d.line, d.column));
    diagnostics
}

fn unclosed_tag(file: &Path, node: &Node, severity: Severity) -> Diagnostic {
    Diagnostic::new(
        file,
        "tag-pair",
        severity,
        format!("tag <{}> must be paired", node.tag_name().unwrap_or_default()),
    )
    .at(node.line, node.column)
}

fn check_attributes(
    file: &Path,
    tag: &str,
    attributes: &[Attribute],
    rules: &Rules,
    ids: &mut HashMap<String, (usize, usize)>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut seen: Vec<String> = Vec::new();

    for attr in attributes {
        let lower = attr.name.to_ascii_lowercase();

        if let Some(severity) = rules.attr_lowercase {
            if attr.name != lower {
                diagnostics.push(
                    Diagnostic::new(
                        file,
                        "attr-lowercase",
                        severity,
                        format!("attribute name '{}' must be lowercase", attr.name),
                    )
                    .at(attr.line, attr.column),
                );
            }
        }

        if let Some(severity) = rules.attr_value_double_quotes {
            if attr.value.is_some() && attr.quote != Some('"') {
                diagnostics.push(
                    Diagnostic::new(
                        file,
                        "attr-value-double-quotes",
                        severity,
                        format!("value of attribute '{}' must be in double quotes", attr.name),
                    )
                    .at(attr.line, attr.column),
                );
            }
        }

        if let Some(severity) = rules.attr_no_duplication {
            if seen.contains(&lower) {
                diagnostics.push(
                    Diagnostic::new(
                        file,
                        "attr-no-duplication",
                        severity,
                        format!("duplicate attribute '{}'", attr.name),
                    )
                    .at(attr.line, attr.column),
                );
            }
        }
        seen.push(lower.clone());

        if let Some(severity) = rules.id_unique {
            if lower == "id" {
                if let Some(value) = attr.value.as_deref().filter(|v| !v.is_empty()) {
                    if let Some((line, _)) = ids.get(value) {
                        diagnostics.push(
                            Diagnostic::new(
                                file,
                                "id-unique",
                                severity,
                                format!("id '{}' is already used on line {}", value, line),
                            )
                            .at(attr.line, attr.column),
                        );
                    } else {
                        ids.insert(value.to_string(), (attr.line, attr.column));
                    }
                }
            }
        }

        if let Some(severity) = rules.src_not_empty {
            let applies = SOURCE_ATTRIBUTES.iter().any(|(t, a)| *t == tag && *a == lower);
            if applies && attr.value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                diagnostics.push(
                    Diagnostic::new(
                        file,
                        "src-not-empty",
                        severity,
                        format!("attribute '{}' of <{}> must have a value", attr.name, tag),
                    )
                    .at(attr.line, attr.column),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationLevel;
    use crate::markup::lexer::tokenize;

    fn run(source: &str, document: bool) -> Vec<Diagnostic> {
        let nodes = tokenize(source).unwrap();
        lint(Path::new("app/view.html"), &nodes, &MarkupConfig::default(), document)
    }

    fn rules(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.rule.as_str()).collect()
    }

    #[test]
    fn test_clean_document() {
        let source = "<!DOCTYPE html>\n<html><head><link rel=\"stylesheet\" href=\"a.css\"></head>\n<body><img src=\"a.png\"><br></body></html>\n";
        assert!(run(source, true).is_empty());
    }

    #[test]
    fn test_doctype_only_for_documents() {
        let source = "<!-- partial -->\n<div class=\"x\"></div>";
        assert_eq!(rules(&run(source, true)), vec!["doctype-first"]);
        assert!(run(source, false).is_empty());
    }

    #[test]
    fn test_unclosed_tag() {
        let diagnostics = run("<div>\n  <span>text\n</div>", false);
        assert_eq!(rules(&diagnostics), vec!["tag-pair"]);
        assert_eq!(diagnostics[0].line, Some(2));
        assert!(diagnostics[0].is_error());
    }

    #[test]
    fn test_stray_end_tag() {
        let diagnostics = run("<p>text</p></div>", false);
        assert_eq!(rules(&diagnostics), vec!["tag-pair"]);
        assert!(diagnostics[0].message.contains("</div>"));
    }

    #[test]
    fn test_case_rules() {
        let diagnostics = run("<DIV ngClick=\"x\"></DIV>", false);
        assert_eq!(rules(&diagnostics), vec!["tagname-lowercase", "attr-lowercase", "tagname-lowercase"]);
        assert!(diagnostics.iter().all(|d| !d.is_error()));
    }

    #[test]
    fn test_single_quoted_value() {
        assert_eq!(rules(&run("<a href='x'>y</a>", false)), vec!["attr-value-double-quotes"]);
    }

    #[test]
    fn test_duplicate_id() {
        let diagnostics = run("<div id=\"main\"></div>\n<p id=\"main\"></p>", false);
        assert_eq!(rules(&diagnostics), vec!["id-unique"]);
        assert!(diagnostics[0].message.contains("line 1"));
    }

    #[test]
    fn test_empty_src() {
        let diagnostics = run("<img src=\"\"><script src></script>", false);
        assert_eq!(rules(&diagnostics), vec!["src-not-empty", "src-not-empty"]);
    }

    #[test]
    fn test_duplicate_attribute() {
        assert_eq!(rules(&run("<div class=\"a\" CLASS=\"b\"></div>", false)), vec![
            "attr-lowercase",
            "attr-no-duplication"
        ]);
    }

    #[test]
    fn test_ignored_rules() {
        let config = MarkupConfig { tag_pair: ValidationLevel::Ignore, ..Default::default() };
        let nodes = tokenize("<div>").unwrap();
        assert!(lint(Path::new("a.html"), &nodes, &config, false).is_empty());
    }
}

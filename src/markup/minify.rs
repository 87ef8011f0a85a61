//! Markup minification: comments removed, whitespace collapsed.

use super::lexer::{tokenize, MarkupError, Node, NodeKind};

/// Elements around which whitespace is significant.
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "button", "cite", "code", "em", "i", "img", "input", "kbd",
    "label", "mark", "q", "s", "select", "small", "span", "strong", "sub", "sup", "time", "u",
    "var",
];

fn is_inline(node: Option<&Node>) -> bool {
    match node {
        Some(node) => match &node.kind {
            NodeKind::Text => true,
            _ => node.tag_name().is_some_and(|n| INLINE_ELEMENTS.contains(&n.to_ascii_lowercase().as_str())),
        },
        None => false,
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match &node.kind {
        NodeKind::StartTag { name, attributes, self_closing } => {
            out.push('<');
            out.push_str(name);
            for attr in attributes {
                out.push(' ');
                out.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    out.push('=');
                    match attr.quote {
                        Some(q) => {
                            out.push(q);
                            out.push_str(value);
                            out.push(q);
                        }
                        None => out.push_str(value),
                    }
                }
            }
            out.push_str(if *self_closing { "/>" } else { ">" });
        }
        NodeKind::EndTag { name } => {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Doctype => out.push_str(&collapse_whitespace(&node.raw)),
        NodeKind::RawText => out.push_str(&node.raw),
        NodeKind::Text | NodeKind::Comment => {}
    }
}

/// Minify a markup document or fragment.
pub fn minify(source: &str) -> Result<String, MarkupError> {
    let nodes: Vec<Node> = tokenize(source)?.into_iter().filter(|n| n.kind != NodeKind::Comment).collect();
    let mut out = String::with_capacity(source.len());

    for (i, node) in nodes.iter().enumerate() {
        if node.kind != NodeKind::Text {
            write_node(&mut out, node);
            continue;
        }

        let prev = i.checked_sub(1).and_then(|p| nodes.get(p));
        let next = nodes.get(i + 1);
        let collapsed = collapse_whitespace(&node.raw);

        if collapsed.trim().is_empty() {
            // Whitespace between two inline neighbours still renders as a space.
            if is_inline(prev) && is_inline(next) {
                out.push(' ');
            }
            continue;
        }

        let mut text = collapsed.as_str();
        if !is_inline(prev) {
            text = text.trim_start();
        }
        if !is_inline(next) {
            text = text.trim_end();
        }
        out.push_str(text);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_block_whitespace() {
        let source = "<div class=\"panel\">\n  <!-- heading -->\n  <h1>  Title  </h1>\n</div>\n";
        assert_eq!(minify(source).unwrap(), "<div class=\"panel\"><h1>Title</h1></div>");
    }

    #[test]
    fn test_inline_spacing_kept() {
        let source = "<p>Hello   <b>big</b>\n <i>world</i></p>";
        assert_eq!(minify(source).unwrap(), "<p>Hello <b>big</b> <i>world</i></p>");
    }

    #[test]
    fn test_raw_text_preserved() {
        let source = "<pre>\n  keep   this\n</pre>\n<script>\n  var a  =  1;\n</script>";
        assert_eq!(minify(source).unwrap(), "<pre>\n  keep   this\n</pre><script>\n  var a  =  1;\n</script>");
    }

    #[test]
    fn test_attributes_normalised() {
        let source = "<input\n   type=\"text\"\n   ng-model='name'\n   required >";
        assert_eq!(minify(source).unwrap(), "<input type=\"text\" ng-model='name' required>");
    }

    #[test]
    fn test_doctype_kept() {
        let source = "<!DOCTYPE  html>\n<html></html>";
        assert_eq!(minify(source).unwrap(), "<!DOCTYPE html><html></html>");
    }

    #[test]
    fn test_malformed_input_is_error() {
        assert!(minify("<div><!-- open").is_err());
    }
}

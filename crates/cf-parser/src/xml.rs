use std::collections::BTreeMap;

use cf_core::{FlowError, FlowResult, SourceLocation, SourceSpan};
use roxmltree::{Document, Node, NodeType};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElementNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElementNode),
    Text(XmlTextNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElementNode {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlNode>,
    pub location: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlTextNode {
    pub value: String,
    pub location: SourceSpan,
}

impl XmlElementNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElementNode> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated direct text children, untrimmed.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.value.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Text that is not whitespace, if any.
    pub fn stray_text(&self) -> Option<&XmlTextNode> {
        self.children.iter().find_map(|child| match child {
            XmlNode::Text(text) if !text.value.trim().is_empty() => Some(text),
            _ => None,
        })
    }

    pub fn error(&self, code: &str, message: impl Into<String>) -> FlowError {
        FlowError::with_span(code, message, self.location.clone())
    }
}

pub fn parse_xml_document(source: &str) -> FlowResult<XmlDocument> {
    let document = Document::parse(source)
        .map_err(|error| FlowError::new("XML_PARSE_ERROR", error.to_string()))?;

    let Some(root) = document.root().children().find(|node| node.is_element()) else {
        return Err(FlowError::new(
            "XML_PARSE_ERROR",
            "XML document must contain a root element.",
        ));
    };

    let root = parse_element(&document, root);
    trace!(root = %root.name, children = root.children.len(), "parsed xml document");
    Ok(XmlDocument { root })
}

fn parse_element(document: &Document<'_>, node: Node<'_, '_>) -> XmlElementNode {
    let attributes = node
        .attributes()
        .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
        .collect();

    let mut children = Vec::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => children.push(XmlNode::Element(parse_element(document, child))),
            NodeType::Text => {
                let value = child.text().unwrap_or_default();
                if value.is_empty() {
                    continue;
                }
                children.push(XmlNode::Text(XmlTextNode {
                    value: value.to_string(),
                    location: node_span(document, child.range().start, child.range().end),
                }));
            }
            _ => {}
        }
    }

    XmlElementNode {
        name: node.tag_name().name().to_string(),
        attributes,
        children,
        location: node_span(document, node.range().start, node.range().end),
    }
}

fn node_span(document: &Document<'_>, start: usize, end: usize) -> SourceSpan {
    let start_pos = document.text_pos_at(start);
    let end_pos = document.text_pos_at(end);
    SourceSpan {
        start: SourceLocation {
            line: start_pos.row as usize,
            column: start_pos.col as usize,
        },
        end: SourceLocation {
            line: end_pos.row as usize,
            column: end_pos.col as usize,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_xml_document_builds_block_tree() {
        let source = r#"<flow><block path="start"><message>Hello</message><path>next</path></block></flow>"#;
        let document = parse_xml_document(source).expect("xml should parse");
        assert_eq!(document.root.name, "flow");

        let blocks = document.root.child_elements().collect::<Vec<_>>();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].attr("path"), Some("start"));

        let attributes = blocks[0].child_elements().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(attributes, vec!["message", "path"]);

        let message = blocks[0].child_elements().next().expect("message should exist");
        assert_eq!(message.text(), "Hello");
        assert!(message.location.start.line >= 1);
    }

    #[test]
    fn text_keeps_whitespace_and_merges_cdata() {
        let source = "<message>  Hi <![CDATA[<there>]]></message>";
        let document = parse_xml_document(source).expect("xml should parse");
        assert_eq!(document.root.text(), "  Hi <there>");
    }

    #[test]
    fn stray_text_ignores_indentation() {
        let source = "<block path=\"a\">\n  <message>x</message>\n</block>";
        let document = parse_xml_document(source).expect("xml should parse");
        assert!(document.root.stray_text().is_none());

        let document = parse_xml_document("<block>oops<path>a</path></block>")
            .expect("xml should parse");
        assert_eq!(
            document.root.stray_text().map(|text| text.value.as_str()),
            Some("oops")
        );
    }

    #[test]
    fn element_error_carries_location() {
        let document = parse_xml_document("<flow>\n<bogus/></flow>").expect("xml should parse");
        let bogus = document.root.child_elements().next().expect("child should exist");
        let error = bogus.error("FLOW_UNKNOWN_ELEMENT", "unknown");
        assert_eq!(error.code, "FLOW_UNKNOWN_ELEMENT");
        assert_eq!(error.span.map(|span| span.start.line), Some(2));
    }

    #[test]
    fn parse_xml_document_returns_parse_error_for_invalid_xml() {
        let error = parse_xml_document("<flow>").expect_err("invalid xml should fail");
        assert_eq!(error.code, "XML_PARSE_ERROR");
    }

    #[test]
    fn parse_xml_document_returns_parse_error_when_root_element_is_missing() {
        let error = parse_xml_document("<?xml version=\"1.0\"?><!---->")
            .expect_err("missing root element should fail");
        assert_eq!(error.code, "XML_PARSE_ERROR");
    }
}

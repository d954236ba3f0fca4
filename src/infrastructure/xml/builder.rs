use crate::domain::ports::{BuilderFactory, DocumentBuilder, DocumentBuilderBox};
use crate::domain::release::SchemaRelease;
use quick_xml::escape::escape;

const INDENT: &str = "  ";

struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    content: Vec<Content>,
}

impl Node {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            content: Vec::new(),
        }
    }
}

enum Content {
    Element(usize),
    Text(String),
}

/// [`DocumentBuilder`] producing indented XML text.
///
/// Elements are kept in an arena and rendered on [`serialize`]. The root
/// element is created up front, already carrying the release's namespace and
/// `fpmlVersion`, and stays open until the document is serialized.
///
/// [`serialize`]: DocumentBuilder::serialize
pub struct XmlBuilder {
    nodes: Vec<Node>,
    open: Vec<usize>,
}

impl XmlBuilder {
    pub fn new(release: &SchemaRelease, root: &str) -> Self {
        let mut builder = Self {
            nodes: vec![Node::new(root)],
            open: vec![0],
        };
        builder.set_attribute("xmlns", &release.namespace());
        builder.set_attribute("fpmlVersion", release.version());
        builder
    }

    /// A [`BuilderFactory`] creating an `XmlBuilder` per reply.
    pub fn factory() -> BuilderFactory {
        Box::new(|release: &SchemaRelease, root: &str| {
            Box::new(XmlBuilder::new(release, root)) as DocumentBuilderBox
        })
    }

    fn current(&mut self) -> Option<&mut Node> {
        let index = *self.open.last()?;
        self.nodes.get_mut(index)
    }

    fn write_node(&self, index: usize, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        let indent = INDENT.repeat(depth);

        out.push_str(&indent);
        out.push('<');
        out.push_str(&node.name);
        for (name, value) in &node.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }

        if node.content.is_empty() {
            out.push_str("/>\n");
            return;
        }
        out.push('>');

        let text_only = node
            .content
            .iter()
            .all(|content| matches!(content, Content::Text(_)));
        if text_only {
            for content in &node.content {
                if let Content::Text(text) = content {
                    out.push_str(&escape(text.as_str()));
                }
            }
        } else {
            out.push('\n');
            for content in &node.content {
                match content {
                    Content::Element(child) => self.write_node(*child, depth + 1, out),
                    Content::Text(text) => {
                        out.push_str(&indent);
                        out.push_str(INDENT);
                        out.push_str(&escape(text.as_str()));
                        out.push('\n');
                    }
                }
            }
            out.push_str(&indent);
        }

        out.push_str("</");
        out.push_str(&node.name);
        out.push_str(">\n");
    }
}

impl DocumentBuilder for XmlBuilder {
    fn append_element(&mut self, name: &str) {
        let index = self.nodes.len();
        self.nodes.push(Node::new(name));
        if let Some(parent) = self.current() {
            parent.content.push(Content::Element(index));
        }
        self.open.push(index);
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        let Some(node) = self.current() else {
            return;
        };
        match node.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(existing) => existing.1 = value.to_string(),
            None => node.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn append_text(&mut self, text: &str) {
        if let Some(node) = self.current() {
            node.content.push(Content::Text(text.to_string()));
        }
    }

    fn close_element(&mut self) {
        // The root stays open.
        if self.open.len() > 1 {
            self.open.pop();
        }
    }

    fn serialize(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write_node(0, 0, &mut out);
        out
    }
}

//! Preview extraction: truncate a rendered document at the `<!--more-->` marker.
//!
//! The HTML is parsed into a node tree and truncated structurally, so the
//! result is always balanced no matter how deeply the marker is nested.
//! Start tags, text and entity references are kept verbatim; serializing a
//! truncated tree yields exactly the source text before the marker followed
//! by the end tags of the marker's ancestors.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Comment text (trimmed) that marks the end of the preview
pub const MORE_MARKER: &str = "more";

/// Deepest element nesting accepted by [`parse_html`]
pub const MAX_DEPTH: usize = 256;

/// Elements that never have content or end tags in HTML
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("HTML parse error: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("HTML encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    #[error("Unexpected </{found}> at byte {offset}, expected </{expected}>")]
    MismatchedTag {
        expected: String,
        found: String,
        offset: u64,
    },

    #[error("Closing tag </{found}> at byte {offset} has no matching opening tag")]
    UnmatchedEnd { found: String, offset: u64 },

    #[error("Element <{0}> is never closed")]
    Unclosed(String),

    #[error("Elements nested deeper than {limit} levels at byte {offset}")]
    TooDeep { limit: usize, offset: u64 },
}

/// How an element was written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closing {
    /// `<p>...</p>`
    EndTag,
    /// `<br />`
    SelfClosed,
    /// `<br>`
    Void,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name as written
    pub name: String,
    /// Everything between `<` and `>` (or `/>`), attributes included
    pub start_tag: String,
    pub closing: Closing,
    pub children: Vec<Node>,
}

impl Element {
    fn is_void(name: &str) -> bool {
        VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
    }

    fn with_children(&self, children: Vec<Node>) -> Self {
        Self {
            name: self.name.clone(),
            start_tag: self.start_tag.clone(),
            closing: self.closing,
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Text exactly as it appears in the source (still escaped)
    Text(String),
    /// Comment body without `<!--` / `-->`
    Comment(String),
    /// CDATA sections and doctypes, verbatim
    Raw(String),
}

impl Node {
    /// Whether this node is the preview marker
    pub fn is_marker(&self) -> bool {
        matches!(self, Node::Comment(text) if text.trim() == MORE_MARKER)
    }
}

/// A parsed HTML body: the children of an implicit container
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    /// Serialize back to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            write_node(node, &mut out);
        }
        out
    }
}

/// Parse an HTML fragment into a [`Document`].
///
/// The fragment must be well-formed apart from HTML void elements, which may
/// be left unclosed.
pub fn parse_html(html: &str) -> Result<Document, PreviewError> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.trim_text(false);
    // Balance is checked below so void elements can stay unclosed.
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut root: Vec<Node> = Vec::new();
    let mut open: Vec<Element> = Vec::new();

    loop {
        let event = reader.read_event()?;
        let node = match event {
            Event::Start(e) => {
                let name = reader.decoder().decode(e.name().as_ref())?.into_owned();
                let start_tag = reader.decoder().decode(&e)?.into_owned();
                if Element::is_void(&name) {
                    Node::Element(Element {
                        name,
                        start_tag,
                        closing: Closing::Void,
                        children: Vec::new(),
                    })
                } else {
                    if open.len() >= MAX_DEPTH {
                        return Err(PreviewError::TooDeep {
                            limit: MAX_DEPTH,
                            offset: reader.buffer_position(),
                        });
                    }
                    open.push(Element {
                        name,
                        start_tag,
                        closing: Closing::EndTag,
                        children: Vec::new(),
                    });
                    continue;
                }
            }
            Event::Empty(e) => Node::Element(Element {
                name: reader.decoder().decode(e.name().as_ref())?.into_owned(),
                start_tag: reader.decoder().decode(&e)?.into_owned(),
                closing: Closing::SelfClosed,
                children: Vec::new(),
            }),
            Event::End(e) => {
                let found = reader.decoder().decode(e.name().as_ref())?.into_owned();
                if Element::is_void(&found) {
                    continue;
                }
                let Some(element) = open.pop() else {
                    return Err(PreviewError::UnmatchedEnd {
                        found,
                        offset: reader.buffer_position(),
                    });
                };
                if !element.name.eq_ignore_ascii_case(&found) {
                    return Err(PreviewError::MismatchedTag {
                        expected: element.name,
                        found,
                        offset: reader.buffer_position(),
                    });
                }
                Node::Element(element)
            }
            Event::Text(e) => Node::Text(reader.decoder().decode(&e)?.into_owned()),
            Event::GeneralRef(e) => {
                Node::Text(format!("&{};", reader.decoder().decode(&e)?))
            }
            Event::Comment(e) => Node::Comment(reader.decoder().decode(&e)?.into_owned()),
            Event::CData(e) => {
                Node::Raw(format!("<![CDATA[{}]]>", reader.decoder().decode(&e)?))
            }
            Event::DocType(e) => {
                Node::Raw(format!("<!DOCTYPE {}>", reader.decoder().decode(&e)?))
            }
            Event::Eof => break,
            // Processing instructions and XML declarations never appear in rendered bodies
            _ => continue,
        };

        let siblings = match open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut root,
        };
        push_node(siblings, node);
    }

    if let Some(element) = open.pop() {
        return Err(PreviewError::Unclosed(element.name));
    }

    Ok(Document { children: root })
}

/// Append a node, merging adjacent text so entity references stay inside
/// the surrounding text node
fn push_node(siblings: &mut Vec<Node>, node: Node) {
    if let (Some(Node::Text(last)), Node::Text(text)) = (siblings.last_mut(), &node) {
        last.push_str(text);
        return;
    }
    siblings.push(node);
}

/// Truncate `document` at the preview marker.
///
/// Returns `None` when the document has no marker. Otherwise the result holds
/// every node before the marker at each nesting level, with the marker's
/// ancestors kept (and therefore closed) around them.
pub fn extract_preview(document: &Document) -> Option<Document> {
    truncate(&document.children).map(|children| Document { children })
}

fn truncate(nodes: &[Node]) -> Option<Vec<Node>> {
    for (i, node) in nodes.iter().enumerate() {
        if node.is_marker() {
            return Some(nodes[..i].to_vec());
        }
        if let Node::Element(element) = node {
            if let Some(kept) = truncate(&element.children) {
                let mut out = nodes[..i].to_vec();
                out.push(Node::Element(element.with_children(kept)));
                return Some(out);
            }
        }
    }
    None
}

/// Parse `html` and return the serialized preview, if it has a marker
pub fn preview_html(html: &str) -> Result<Option<String>, PreviewError> {
    let document = parse_html(html)?;
    Ok(extract_preview(&document).map(|preview| preview.to_html()))
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.start_tag);
            match element.closing {
                Closing::SelfClosed => out.push_str("/>"),
                Closing::Void => out.push('>'),
                Closing::EndTag => {
                    out.push('>');
                    for child in &element.children {
                        write_node(child, out);
                    }
                    out.push_str("</");
                    out.push_str(&element.name);
                    out.push('>');
                }
            }
        }
        Node::Text(text) => out.push_str(text),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Raw(raw) => out.push_str(raw),
    }
}

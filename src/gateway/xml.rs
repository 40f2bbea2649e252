//! # Generic XML tree
//!
//! The admin API answers every call with XML. Responses are first read into
//! an untyped element tree, then narrowed by `responses` into typed records.
//!
//! The wire format has no array marker: a collection with one entry looks
//! exactly like a single nested object, and an empty collection is an empty
//! element (or no body at all). [`XmlNode::items`] is the one place that quirk
//! is resolved, always yielding zero or more elements.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },
    #[error("closing tag </{0}> without matching opening tag")]
    Unbalanced(String),
    #[error("document ended inside <{0}>")]
    Unterminated(String),
    #[error("document has no root element")]
    Empty,
}

/// One element with its text content and child elements
///
/// Attributes are not kept; the admin API carries every field we read as a child element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a document into its root element
    ///
    /// # Errors
    /// Returns an error on malformed XML or a document without a root element
    pub fn parse(document: &str) -> Result<Self, XmlError> {
        Self::parse_optional(document)?.ok_or(XmlError::Empty)
    }

    /// Parse a document that may legitimately be blank
    ///
    /// # Errors
    /// Returns an error on malformed XML
    pub fn parse_optional(document: &str) -> Result<Option<Self>, XmlError> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        // Open elements, innermost last
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            let event = reader.read_event().map_err(|e| XmlError::Syntax {
                position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
                message: e.to_string(),
            })?;

            match event {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    stack.push(XmlNode::new(name));
                }
                Event::Empty(empty) => {
                    let node = XmlNode::new(String::from_utf8_lossy(empty.name().as_ref()));
                    attach(&mut stack, &mut root, node);
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    let node = stack.pop().ok_or_else(|| XmlError::Unbalanced(name.clone()))?;
                    if node.name != name {
                        return Err(XmlError::Unbalanced(name));
                    }
                    attach(&mut stack, &mut root, node);
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(|e| XmlError::Syntax {
                        position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
                        message: e.to_string(),
                    })?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&value);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unterminated(open.name));
        }
        Ok(root)
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Trimmed text of a direct child, `None` when absent or blank
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// Owned variant of [`child_text`](Self::child_text)
    pub fn child_string(&self, name: &str) -> Option<String> {
        self.child_text(name).map(str::to_string)
    }

    /// All direct children named `item`, in document order
    ///
    /// Zero, one and many entries all come back as a list.
    pub fn items<'a>(&'a self, item: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == item)
    }
}

/// Normalize an optional collection wrapper into a list of its `item` children
///
/// A missing wrapper (blank response body) is an empty collection.
pub fn collection<'a>(wrapper: Option<&'a XmlNode>, item: &'a str) -> Vec<&'a XmlNode> {
    wrapper.map(|w| w.items(item).collect()).unwrap_or_default()
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        // Keep the first top-level element; trailing siblings are not valid XML anyway
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

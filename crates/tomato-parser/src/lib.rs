//! Tomato Parser
//!
//! Turns template markup into a read-only node tree.
//! The tree is arena-backed: nodes live in one `Vec` and refer to each other
//! by [`NodeId`], so consumers can walk it with an explicit stack.
//!
//! Parsing itself is a capability behind the [`MarkupParser`] trait. The
//! default implementation, [`Html5Parser`], runs the WHATWG HTML algorithm,
//! which means the result is always a full document (`html`, `head`, `body`).
//!
//! # Example
//!
//! ```
//! use tomato_parser::{Html5Parser, MarkupParser};
//!
//! let doc = Html5Parser.parse("<div class=\"card\"></div>").unwrap();
//! let body = doc.find_element("body").unwrap();
//! let div = doc.first_element_child(body).unwrap();
//! assert_eq!(doc.element(div).unwrap().attr("class"), Some("card"));
//! ```

pub mod html;
pub mod tree;

pub use html::Html5Parser;
pub use tree::{Attribute, Document, Element, Node, NodeId, NodeKind};

/// Markup parse failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Something that can turn markup text into a [`Document`].
///
/// The returned tree is owned by the caller and never shared between parses.
pub trait MarkupParser {
    fn parse(&self, source: &str) -> Result<Document, ParseError>;
}

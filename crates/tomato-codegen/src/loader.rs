//! Template loading.
//!
//! Reads a template, cuts off its trailing `<style>` block, parses the rest
//! and narrows the parsed document down to the one element the view is
//! generated from.

use std::fs;
use std::path::Path;

use tomato_parser::{Document, MarkupParser, NodeId};

use crate::attrs::STRIP_ME_ATTR;
use crate::LoadError;

const STYLE_OPEN: &str = "<style>";
const STYLE_CLOSE: &str = "</style>";

/// A parsed template ready for the visitor.
#[derive(Debug)]
pub struct LoadedTemplate {
    pub document: Document,
    /// Element the view is generated from.
    pub root: NodeId,
    /// Stylesheet text, empty if the template has none.
    pub style: String,
}

/// Read and parse the template at `path`.
pub fn load(path: &Path, parser: &impl MarkupParser) -> Result<LoadedTemplate, LoadError> {
    let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_source(path, &source, parser)
}

/// Parse template text. `path` is only used for error messages.
pub fn load_source(
    path: &Path,
    source: &str,
    parser: &impl MarkupParser,
) -> Result<LoadedTemplate, LoadError> {
    let (markup, style) = split_style(source);

    let document = parser.parse(markup).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let root = find_root(&document)
        .and_then(|root| unwrap_root(&document, root))
        .ok_or_else(|| LoadError::EmptyTemplate {
            path: path.to_path_buf(),
        })?;

    Ok(LoadedTemplate {
        document,
        root,
        style: style.unwrap_or_default().to_string(),
    })
}

/// Split `source` at its last `<style>`...`</style>` pair.
///
/// Purely textual: a literal `</style>` elsewhere in the template confuses
/// it. Everything from the opening tag onwards is removed from the markup.
pub fn split_style(source: &str) -> (&str, Option<&str>) {
    match (source.rfind(STYLE_OPEN), source.rfind(STYLE_CLOSE)) {
        (Some(start), Some(end)) if end >= start + STYLE_OPEN.len() => {
            (&source[..start], Some(&source[start + STYLE_OPEN.len()..end]))
        }
        _ => (source, None),
    }
}

/// First element inside `<body>`.
fn find_root(doc: &Document) -> Option<NodeId> {
    let body = doc.find_element("body")?;
    doc.first_element_child(body)
}

/// Resolve the `_stripme` hack.
///
/// A `<tr>` cannot be a document root, so authors wrap it in
/// `<table _stripme>`. The parser then inserts a `<tbody>`, which is skipped
/// as well. A marked wrapper with no element inside counts as empty.
pub fn unwrap_root(doc: &Document, root: NodeId) -> Option<NodeId> {
    let marked = doc
        .element(root)
        .is_some_and(|el| el.has_attr(STRIP_ME_ATTR));
    if !marked {
        return Some(root);
    }

    let child = doc.first_element_child(root)?;
    let is_tbody = doc
        .element(child)
        .is_some_and(|el| el.name.eq_ignore_ascii_case("tbody"));
    let unwrapped = if is_tbody {
        doc.first_element_child(child).unwrap_or(child)
    } else {
        child
    };

    tracing::debug!(
        from = %doc.element(root).map(|el| el.name.as_str()).unwrap_or_default(),
        to = %doc.element(unwrapped).map(|el| el.name.as_str()).unwrap_or_default(),
        "unwrapped template root"
    );
    Some(unwrapped)
}

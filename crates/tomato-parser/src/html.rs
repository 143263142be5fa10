//! HTML5 parser adapter.
//!
//! Runs `html5ever` into an `RcDom`, then copies the result into the arena
//! [`Document`]. The `RcDom` is dropped before returning.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::tree::{Attribute, Document, Element, NodeId, NodeKind};
use crate::{MarkupParser, ParseError};

/// [`MarkupParser`] backed by `html5ever`.
///
/// HTML parsing never rejects input: malformed markup is repaired the way a
/// browser would repair it. Doctypes and processing instructions are dropped;
/// `<template>` content is kept as ordinary children.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html5Parser;

impl MarkupParser for Html5Parser {
    fn parse(&self, source: &str) -> Result<Document, ParseError> {
        let dom = parse_document(RcDom::default(), Default::default()).one(source);
        let doc = convert(&dom.document);
        tracing::trace!(nodes = doc.node_count(), "parsed markup");
        Ok(doc)
    }
}

fn convert(document: &Handle) -> Document {
    let mut doc = Document::new();
    let root = doc.root();

    // Children are pushed in reverse so they pop, and get appended, in order.
    let mut stack: Vec<(Handle, NodeId)> = document
        .children
        .borrow()
        .iter()
        .rev()
        .map(|child| (child.clone(), root))
        .collect();

    while let Some((handle, parent)) = stack.pop() {
        let kind = match &handle.data {
            NodeData::Element { name, attrs, .. } => NodeKind::Element(Element {
                name: name.local.to_string(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|attr| Attribute {
                        namespace: attr.name.prefix.as_ref().map(|p| p.to_string()),
                        key: attr.name.local.to_string(),
                        value: attr.value.to_string(),
                    })
                    .collect(),
            }),
            NodeData::Text { contents } => NodeKind::Text(contents.borrow().to_string()),
            NodeData::Comment { contents } => NodeKind::Comment(contents.to_string()),
            NodeData::Document
            | NodeData::Doctype { .. }
            | NodeData::ProcessingInstruction { .. } => continue,
        };

        let id = doc.append(parent, kind);

        // `<template>` keeps its content in a separate fragment; treat that
        // content as ordinary children.
        let mut children: Vec<Handle> = handle.children.borrow().clone();
        if let NodeData::Element {
            template_contents, ..
        } = &handle.data
        {
            if let Some(fragment) = template_contents.borrow().as_ref() {
                children.extend(fragment.children.borrow().iter().cloned());
            }
        }
        stack.extend(children.into_iter().rev().map(|child| (child, id)));
    }

    doc
}

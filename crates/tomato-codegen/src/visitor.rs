//! Depth-first visitor that emits TypeScript DOM construction code.
//!
//! [`walk`] drives the traversal with an explicit stack of enter/exit steps,
//! so template depth never turns into call-stack depth. [`Visitor`] reacts to
//! each step by growing the construction chain held in [`TraversalState`].
//!
//! For a template like
//!
//! ```text
//! <div class="card"><span _ref="title">Hi</span></div>
//! ```
//!
//! the chain reads
//!
//! ```text
//! super(doc.createElement('div'));
//! this.setAttr('class', 'card')
//!   .append(this.title = q('span', doc).appendText('Hi'))
//! ```

use std::path::Path;

use tomato_parser::{Document, Element, NodeId, NodeKind};

use crate::attrs::{
    escape_text, DEBUG_ID_ATTR, FIELD_REF_ATTR, NESTED_TEMPLATE_TAG, POLICY, SOURCE_ATTR,
};
use crate::{CompileError, GeneratorOptions, TEMPLATE_EXTENSION};

const VIEW_SUFFIX: &str = "View";
const NBSP: char = '\u{a0}';

/// A field the generated class declares, e.g. `title: View`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub name: String,
    pub ty: String,
}

/// Mutable state for compiling one template. Never shared between files.
#[derive(Debug, Default)]
pub struct TraversalState {
    /// The finished class text, filled in by `view::assemble`.
    pub output: String,
    /// The construction chain built during the walk.
    pub construction: String,
    /// Set while inside a nested template; nothing below it is emitted.
    pub suppressed: bool,
    /// Elements whose `.append(` call is still open, innermost last.
    pub append_stack: Vec<NodeId>,
    /// Field declarations in first-encountered order.
    pub fields: Vec<FieldRef>,
}

/// Callbacks for [`walk`].
pub trait TreeVisitor {
    fn enter(&mut self, doc: &Document, id: NodeId, depth: usize) -> Result<(), CompileError>;
    fn exit(&mut self, doc: &Document, id: NodeId, depth: usize);
}

enum Step {
    Enter(NodeId, usize),
    Exit(NodeId, usize),
}

/// Visit `root` and everything below it, depth first.
///
/// `enter` runs before a node's children and `exit` after them. The first
/// error from `enter` stops the walk.
pub fn walk(
    doc: &Document,
    root: NodeId,
    visitor: &mut impl TreeVisitor,
) -> Result<(), CompileError> {
    let mut stack = vec![Step::Enter(root, 0)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id, depth) => {
                visitor.enter(doc, id, depth)?;
                stack.push(Step::Exit(id, depth));
                stack.extend(
                    doc.children(id)
                        .iter()
                        .rev()
                        .map(|&child| Step::Enter(child, depth + 1)),
                );
            }
            Step::Exit(id, depth) => visitor.exit(doc, id, depth),
        }
    }

    Ok(())
}

/// Emits the TypeScript construction chain for one view.
pub struct Visitor<'a> {
    options: &'a GeneratorOptions,
    path: &'a Path,
    view_name: &'a str,
    force_debug_ids: bool,
    state: TraversalState,
}

impl<'a> Visitor<'a> {
    pub fn new(
        options: &'a GeneratorOptions,
        path: &'a Path,
        view_name: &'a str,
        force_debug_ids: bool,
    ) -> Self {
        Self {
            options,
            path,
            view_name,
            force_debug_ids,
            state: TraversalState::default(),
        }
    }

    pub fn into_state(self) -> TraversalState {
        self.state
    }

    fn enter_element(&mut self, id: NodeId, el: &Element, depth: usize) -> Result<(), CompileError> {
        let tag = el.name.to_lowercase();
        let chain = &mut self.state.construction;
        chain.push_str(&indent(depth));

        if depth == 0 {
            // The view's own element, handed to the base class constructor.
            chain.push_str(&format!("super(doc.createElement('{tag}'));\n"));
            chain.push_str(&indent(depth));
            chain.push_str("this");

            if self.force_debug_ids && non_empty_attr(el, DEBUG_ID_ATTR).is_none() {
                emit_attr(chain, DEBUG_ID_ATTR, debug_id(self.view_name));
            }
        } else {
            self.state.append_stack.push(id);
            chain.push_str(".append(");

            let field = non_empty_attr(el, FIELD_REF_ATTR);
            if let Some(field) = field {
                chain.push_str(&format!("this.{field} = "));
            }

            let ty = if tag == NESTED_TEMPLATE_TAG {
                // Nested views are leaves, whatever the parser hung below them.
                self.state.suppressed = true;

                let src = non_empty_attr(el, SOURCE_ATTR).ok_or_else(|| {
                    CompileError::MissingSource {
                        path: self.path.to_path_buf(),
                    }
                })?;
                let name = view_name(src);
                chain.push_str(&format!("<{name}>new {name}(doc)"));
                name
            } else {
                chain.push_str(&format!("{}('{tag}', doc)", self.options.view_factory));
                self.options.view_base_class.clone()
            };

            if let Some(field) = field {
                self.state.fields.push(FieldRef {
                    name: field.to_string(),
                    ty,
                });
            }
        }

        for (key, value) in POLICY.transfer(el) {
            emit_attr(&mut self.state.construction, &key, &value);
        }

        Ok(())
    }

    fn enter_text(&mut self, text: &str) {
        // Whitespace between tags is dropped; a non-breaking space is content.
        if text.chars().all(|c| c != NBSP && c.is_whitespace()) {
            return;
        }
        let literal = escape_text(&text.replace('\n', ""));
        self.state
            .construction
            .push_str(&format!(".appendText('{literal}')"));
    }
}

impl TreeVisitor for Visitor<'_> {
    fn enter(&mut self, doc: &Document, id: NodeId, depth: usize) -> Result<(), CompileError> {
        if self.state.suppressed {
            return Ok(());
        }

        match doc.kind(id) {
            NodeKind::Element(el) => self.enter_element(id, el, depth),
            NodeKind::Text(text) => {
                self.enter_text(text);
                Ok(())
            }
            NodeKind::Document | NodeKind::Comment(_) => Ok(()),
        }
    }

    fn exit(&mut self, _doc: &Document, id: NodeId, _depth: usize) {
        if self.state.append_stack.last() == Some(&id) {
            self.state.append_stack.pop();
            self.state.construction.push(')');
            self.state.suppressed = false;
        }
    }
}

/// Class name for the template at `path`: `views/user_card.htmto` becomes
/// `User_cardView`.
pub fn view_name(path: &str) -> String {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = file_name
        .strip_suffix(TEMPLATE_EXTENSION)
        .unwrap_or(file_name);

    let mut chars = stem.chars();
    let mut name: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    name.push_str(VIEW_SUFFIX);
    name
}

/// Debug id injected for a view: its class name without the `View` suffix.
pub fn debug_id(view_name: &str) -> &str {
    view_name.strip_suffix(VIEW_SUFFIX).unwrap_or(view_name)
}

fn non_empty_attr<'e>(el: &'e Element, key: &str) -> Option<&'e str> {
    el.attr(key).filter(|value| !value.is_empty())
}

fn emit_attr(chain: &mut String, key: &str, value: &str) {
    chain.push_str(&format!(".setAttr('{key}', '{}')", escape_text(value)));
}

fn indent(depth: usize) -> String {
    format!("\n{}", "  ".repeat(depth + 2))
}

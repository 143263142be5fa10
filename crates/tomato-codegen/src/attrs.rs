//! Attribute transfer.
//!
//! Decides which template attributes become `.setAttr(...)` calls in the
//! generated view and under which name.

use tomato_parser::Element;

/// Exposes the element as a typed field on the generated view.
pub const FIELD_REF_ATTR: &str = "_ref";
/// Marks mock content in a template. Never forwarded.
pub const IGNORE_CONTENT_ATTR: &str = "_ignorecontent";
/// Stands in for `id` where the markup parser would reject a literal `id`.
pub const TUNNELLED_ID_ATTR: &str = "_id";
pub const ID_ATTR: &str = "id";
pub const DEBUG_ID_ATTR: &str = "debug-id";
/// Root wrapper that the loader removes (see `loader::unwrap_root`).
pub const STRIP_ME_ATTR: &str = "_stripme";

/// Tag that instantiates another compiled view.
pub const NESTED_TEMPLATE_TAG: &str = "tomato";
/// Names the template a `<tomato>` element instantiates.
pub const SOURCE_ATTR: &str = "src";

/// Which attributes are forwarded and which one is renamed.
///
/// Blocking is checked before renaming.
#[derive(Debug, Clone, Copy)]
pub struct AttributePolicy {
    pub blocked: &'static [&'static str],
    /// `(from, to)`
    pub rename: (&'static str, &'static str),
}

pub const POLICY: AttributePolicy = AttributePolicy {
    blocked: &[FIELD_REF_ATTR, IGNORE_CONTENT_ATTR],
    rename: (TUNNELLED_ID_ATTR, ID_ATTR),
};

impl AttributePolicy {
    pub fn is_blocked(&self, key: &str) -> bool {
        self.blocked.iter().any(|blocked| *blocked == key)
    }

    /// The `(key, value)` pairs to emit for `el`, in source order.
    /// Namespaced keys come out as `namespace:key`. Values are not escaped.
    pub fn transfer(&self, el: &Element) -> Vec<(String, String)> {
        let is_nested_template = el.name.eq_ignore_ascii_case(NESTED_TEMPLATE_TAG);

        el.attrs
            .iter()
            .filter(|attr| !self.is_blocked(&attr.key))
            .filter(|attr| !(is_nested_template && attr.key == SOURCE_ATTR))
            .map(|attr| {
                let key = if attr.key == self.rename.0 {
                    self.rename.1
                } else {
                    attr.key.as_str()
                };
                let key = match &attr.namespace {
                    Some(ns) if !ns.is_empty() => format!("{ns}:{key}"),
                    _ => key.to_string(),
                };
                (key, attr.value.clone())
            })
            .collect()
    }
}

/// Escape text for a single-quoted TypeScript string literal.
pub fn escape_text(text: &str) -> String {
    text.replace('\'', "\\'")
}

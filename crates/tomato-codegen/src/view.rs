//! View assembly.
//!
//! Wraps the construction chain from the visitor into a complete TypeScript
//! class, and provides the shared import that heads the combined file.

use crate::visitor::TraversalState;
use crate::{GeneratedUnit, GeneratorOptions};

/// Build the class for one template.
pub fn assemble(
    view_name: &str,
    options: &GeneratorOptions,
    mut state: TraversalState,
    style_code: String,
) -> GeneratedUnit {
    let out = &mut state.output;

    // Preamble
    out.push_str(&format!(
        "\nexport class {view_name} extends {} {{",
        options.view_base_class
    ));

    // Field references
    for field in &state.fields {
        out.push_str(&format!("\n  {}: {};", field.name, field.ty));
    }
    if !state.fields.is_empty() {
        out.push('\n');
    }

    // Constructor
    out.push_str("\n  constructor(doc: Document = document) {");
    out.push_str(&state.construction);
    out.push_str(";\n  }");

    // Postamble
    out.push_str("\n}\n");

    GeneratedUnit {
        view_code: state.output,
        style_code,
    }
}

/// Import statement at the top of the combined file.
pub fn preamble(options: &GeneratorOptions) -> String {
    format!(
        "import {{ {}, {} }} from '{}';",
        options.view_base_class, options.view_factory, options.import_location
    )
}

/// Text at the end of the combined file. TypeScript needs none.
pub fn postamble(_options: &GeneratorOptions) -> String {
    String::new()
}

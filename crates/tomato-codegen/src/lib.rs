//! Tomato Code Generator
//!
//! Compiles `.htmto` view templates into TypeScript view classes plus one
//! extracted stylesheet. Every template is compiled on its own; the results
//! are only ordered and concatenated at the end of a run.
//!
//! ```text
//! file → loader::load() → visitor::walk() → view::assemble() → GeneratedUnit
//! all units → output::aggregate() → output::write_outputs()
//! ```

pub mod attrs;
pub mod loader;
pub mod output;
pub mod view;
pub mod visitor;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tomato_parser::{Html5Parser, MarkupParser, ParseError};
use walkdir::WalkDir;

use crate::output::WriteOutcome;
use crate::visitor::Visitor;

/// File extension of template files.
pub const TEMPLATE_EXTENSION: &str = ".htmto";

/// Names the generated code links against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Runtime base class every generated view extends.
    pub view_base_class: String,
    /// Runtime function that creates a generic element view.
    pub view_factory: String,
    /// Module path both names are imported from.
    pub import_location: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            view_base_class: "View".into(),
            view_factory: "q".into(),
            import_location: "../ts/util/q".into(),
        }
    }
}

/// Target language of the generated views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    TypeScript,
}

impl FromStr for Language {
    type Err = CompileError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "ts" | "typescript" => Ok(Language::TypeScript),
            _ => Err(CompileError::UnsupportedLanguage {
                name: name.to_string(),
            }),
        }
    }
}

/// The compiled output of one template file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedUnit {
    pub view_code: String,
    pub style_code: String,
}

/// Failure to turn a template file into a tree.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("template cannot be empty: {}", path.display())]
    EmptyTemplate { path: PathBuf },
}

/// Any error that aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A `<tomato>` element without a `src` attribute.
    #[error("tomato element with no 'src' attribute in {}", path.display())]
    MissingSource { path: PathBuf },

    #[error("language not supported: {name}")]
    UnsupportedLanguage { name: String },

    #[error("cannot walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Compiles template files for one target language.
pub struct Generator<P = Html5Parser> {
    language: Language,
    options: GeneratorOptions,
    parser: P,
}

impl Generator {
    pub fn new(language: Language, options: GeneratorOptions) -> Self {
        Self::with_parser(language, options, Html5Parser)
    }
}

impl<P: MarkupParser> Generator<P> {
    /// Create a generator that uses a custom markup parser.
    pub fn with_parser(language: Language, options: GeneratorOptions, parser: P) -> Self {
        Self {
            language,
            options,
            parser,
        }
    }

    /// Compile every file. The first failure aborts and nothing is returned.
    pub fn generate_views(
        &self,
        files: &[PathBuf],
        force_debug_ids: bool,
    ) -> Result<HashMap<PathBuf, GeneratedUnit>, CompileError> {
        let mut views = HashMap::with_capacity(files.len());
        for file in files {
            let unit = self.generate_view(file, force_debug_ids)?;
            views.insert(file.clone(), unit);
        }
        Ok(views)
    }

    /// Compile a single template file.
    pub fn generate_view(
        &self,
        path: &Path,
        force_debug_ids: bool,
    ) -> Result<GeneratedUnit, CompileError> {
        let template = loader::load(path, &self.parser)?;
        self.compile_template(path, template, force_debug_ids)
    }

    /// Compile template text that did not come from disk. `path` only names
    /// the view and labels errors.
    pub fn generate_view_from_source(
        &self,
        path: &Path,
        source: &str,
        force_debug_ids: bool,
    ) -> Result<GeneratedUnit, CompileError> {
        let template = loader::load_source(path, source, &self.parser)?;
        self.compile_template(path, template, force_debug_ids)
    }

    fn compile_template(
        &self,
        path: &Path,
        template: loader::LoadedTemplate,
        force_debug_ids: bool,
    ) -> Result<GeneratedUnit, CompileError> {
        match self.language {
            Language::TypeScript => {
                let view_name = visitor::view_name(&path.to_string_lossy());
                tracing::debug!(path = %path.display(), view = %view_name, "compiling template");

                let mut visitor = Visitor::new(&self.options, path, &view_name, force_debug_ids);
                visitor::walk(&template.document, template.root, &mut visitor)?;

                Ok(view::assemble(
                    &view_name,
                    &self.options,
                    visitor.into_state(),
                    template.style,
                ))
            }
        }
    }
}

/// Everything one run of the compiler needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_file: PathBuf,
    pub language: Language,
    pub options: GeneratorOptions,
    pub force_debug_ids: bool,
}

/// What a run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub views: usize,
    pub outcome: WriteOutcome,
}

/// Compile every template under `config.input_dir` and write the combined
/// view and stylesheet files. Nothing is written unless every file compiles.
pub fn generate_tomatoes(config: &RunConfig) -> Result<Report, CompileError> {
    let files = collect_template_files(&config.input_dir)?;
    let generator = Generator::new(config.language, config.options.clone());
    let views = generator.generate_views(&files, config.force_debug_ids)?;

    let (code, style) = output::aggregate(&views, &config.options);
    let outcome = output::write_outputs(&config.output_file, &code, &style)?;

    Ok(Report {
        views: views.len(),
        outcome,
    })
}

/// Compile every template under `config.input_dir` without writing anything.
/// Returns the number of templates compiled.
pub fn check_tomatoes(config: &RunConfig) -> Result<usize, CompileError> {
    let files = collect_template_files(&config.input_dir)?;
    let generator = Generator::new(config.language, config.options.clone());
    let views = generator.generate_views(&files, config.force_debug_ids)?;
    Ok(views.len())
}

/// Recursively list every template file under `root`.
pub fn collect_template_files(root: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| CompileError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir()
            && entry
                .file_name()
                .to_string_lossy()
                .ends_with(TEMPLATE_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    fn config(input: &Path, output: &Path) -> RunConfig {
        RunConfig {
            input_dir: input.to_path_buf(),
            output_file: output.to_path_buf(),
            language: Language::TypeScript,
            options: GeneratorOptions::default(),
            force_debug_ids: false,
        }
    }

    // =========================================================================
    // Language selection
    // =========================================================================

    #[test]
    fn test_language_from_str() {
        assert_eq!("ts".parse::<Language>().unwrap(), Language::TypeScript);
        assert_eq!(
            "TypeScript".parse::<Language>().unwrap(),
            Language::TypeScript
        );
    }

    #[test]
    fn test_unsupported_language() {
        let err = "dart".parse::<Language>().unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedLanguage { ref name } if name == "dart"));
        assert_eq!(err.to_string(), "language not supported: dart");
    }

    // =========================================================================
    // File collection
    // =========================================================================

    #[test]
    fn test_collect_template_files_recurses_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.htmto", "<div></div>");
        write(dir.path(), "nested/deep/b.htmto", "<div></div>");
        write(dir.path(), "notes.txt", "nope");
        write(dir.path(), "c.htmto.bak", "nope");

        let mut files = collect_template_files(dir.path()).unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![
                dir.path().join("a.htmto"),
                dir.path().join("nested/deep/b.htmto"),
            ]
        );
    }

    #[test]
    fn test_collect_missing_root_is_walk_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_template_files(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, CompileError::Walk { .. }));
    }

    // =========================================================================
    // Generator
    // =========================================================================

    #[test]
    fn test_generate_view_from_source() {
        let generator = Generator::new(Language::TypeScript, GeneratorOptions::default());
        let unit = generator
            .generate_view_from_source(
                Path::new("views/card.htmto"),
                "<div class=\"card\">Hi</div><style>.card { color: red; }</style>",
                false,
            )
            .unwrap();
        assert!(unit.view_code.contains("export class CardView extends View {"));
        assert!(unit.view_code.contains(".setAttr('class', 'card')"));
        assert_eq!(unit.style_code, ".card { color: red; }");
    }

    #[test]
    fn test_full_view_with_field_and_nested_template() {
        let generator = Generator::new(Language::TypeScript, GeneratorOptions::default());
        let unit = generator
            .generate_view_from_source(
                Path::new("views/profile.htmto"),
                "<div class=\"profile\">\n  <h1 _ref=\"name\">Name</h1>\n  <tomato src=\"avatar.htmto\" _ref=\"avatar\"></tomato>\n</div>\n",
                false,
            )
            .unwrap();
        assert_eq!(
            unit.view_code,
            "\nexport class ProfileView extends View {\
             \n  name: View;\
             \n  avatar: AvatarView;\
             \n\
             \n  constructor(doc: Document = document) {\
             \n    super(doc.createElement('div'));\
             \n\
             \n    this.setAttr('class', 'profile')\
             \n      .append(this.name = q('h1', doc).appendText('Name'))\
             \n      .append(this.avatar = <AvatarView>new AvatarView(doc));\
             \n  }\
             \n}\n"
        );
    }

    #[test]
    fn test_stripme_row_compiles_like_row_root() {
        let generator = Generator::new(Language::TypeScript, GeneratorOptions::default());
        let unit = generator
            .generate_view_from_source(
                Path::new("row.htmto"),
                "<table _stripme>\n  <tr _id=\"r\"><td>x</td></tr>\n</table>",
                false,
            )
            .unwrap();
        assert_eq!(
            unit.view_code,
            "\nexport class RowView extends View {\
             \n  constructor(doc: Document = document) {\
             \n    super(doc.createElement('tr'));\
             \n\
             \n    this.setAttr('id', 'r')\
             \n      .append(q('td', doc).appendText('x'));\
             \n  }\
             \n}\n"
        );
    }

    #[test]
    fn test_generate_views_aborts_on_first_error() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.htmto", "<div></div>");
        let bad = write(dir.path(), "bad.htmto", "<div><tomato></tomato></div>");

        let generator = Generator::new(Language::TypeScript, GeneratorOptions::default());
        let err = generator.generate_views(&[good, bad], false).unwrap_err();
        assert!(matches!(err, CompileError::MissingSource { .. }));
    }

    #[test]
    fn test_custom_parser_errors_become_load_errors() {
        struct Failing;
        impl MarkupParser for Failing {
            fn parse(&self, _source: &str) -> Result<tomato_parser::Document, ParseError> {
                Err(ParseError::new("unbalanced"))
            }
        }

        let generator = Generator::with_parser(
            Language::TypeScript,
            GeneratorOptions::default(),
            Failing,
        );
        let err = generator
            .generate_view_from_source(Path::new("x.htmto"), "<div>", false)
            .unwrap_err();
        assert!(matches!(err, CompileError::Load(LoadError::Parse { .. })));
        assert_eq!(err.to_string(), "cannot parse x.htmto: Parse error: unbalanced");
    }

    // =========================================================================
    // End to end
    // =========================================================================

    #[test]
    fn test_generate_tomatoes_writes_sorted_output() {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("views");
        write(&views, "b.htmto", "<span>b</span><style>.b {}</style>");
        write(&views, "a.htmto", "<span>a</span><style>.a {}</style>");
        let out = dir.path().join("gen/views.ts");

        let report = generate_tomatoes(&config(&views, &out)).unwrap();
        assert_eq!(report.views, 2);
        assert_eq!(report.outcome, WriteOutcome::Written);

        let code = fs::read_to_string(&out).unwrap();
        assert!(code.starts_with("import { View, q } from '../ts/util/q';"));
        let a = code.find("class AView").unwrap();
        let b = code.find("class BView").unwrap();
        assert!(a < b);

        let style = fs::read_to_string(dir.path().join("gen/views.scss")).unwrap();
        assert_eq!(style, ".a {}\n\n.b {}\n\n");
    }

    #[test]
    fn test_second_run_leaves_outputs_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("views");
        let template = write(&views, "card.htmto", "<div>one</div>");
        let out = dir.path().join("views.ts");
        let cfg = config(&views, &out);

        assert_eq!(generate_tomatoes(&cfg).unwrap().outcome, WriteOutcome::Written);
        assert_eq!(generate_tomatoes(&cfg).unwrap().outcome, WriteOutcome::Unchanged);

        fs::write(&template, "<div>two</div>").unwrap();
        assert_eq!(generate_tomatoes(&cfg).unwrap().outcome, WriteOutcome::Written);
        assert!(fs::read_to_string(&out).unwrap().contains("appendText('two')"));
    }

    #[test]
    fn test_failed_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("views");
        write(&views, "a.htmto", "<div></div>");
        write(&views, "b.htmto", "");
        let out = dir.path().join("gen/views.ts");

        let err = generate_tomatoes(&config(&views, &out)).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Load(LoadError::EmptyTemplate { .. })
        ));
        assert!(!out.exists());
        assert!(!dir.path().join("gen/views.scss").exists());
    }

    #[test]
    fn test_check_tomatoes_counts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("views");
        write(&views, "a.htmto", "<div></div>");
        write(&views, "b.htmto", "<p></p>");
        let out = dir.path().join("views.ts");

        assert_eq!(check_tomatoes(&config(&views, &out)).unwrap(), 2);
        assert!(!out.exists());
    }
}

//! Output aggregation.
//!
//! Joins every generated unit into one code file and one stylesheet, ordered
//! by source path, and writes them only when their bytes change.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::view;
use crate::{CompileError, GeneratedUnit, GeneratorOptions};

/// Extension of the stylesheet written next to the code file.
pub const STYLE_EXTENSION: &str = "scss";

/// Whether a write actually touched the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Combine all units into `(code, style)`.
///
/// Units are ordered by the bytes of their source path, so the result does
/// not depend on the order files were found or compiled in.
pub fn aggregate(
    units: &HashMap<PathBuf, GeneratedUnit>,
    options: &GeneratorOptions,
) -> (String, String) {
    let mut paths: Vec<&PathBuf> = units.keys().collect();
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

    let mut code = view::preamble(options);
    let mut style = String::new();

    for path in paths {
        let unit = &units[path];
        code.push_str(&unit.view_code);
        code.push_str("\n\n");

        if !unit.style_code.is_empty() {
            style.push_str(&unit.style_code);
            style.push_str("\n\n");
        }
    }

    code.push_str(&view::postamble(options));
    (code, style)
}

/// Stylesheet path for a code file: `gen/views.ts` becomes `gen/views.scss`.
pub fn style_path(code_path: &Path) -> PathBuf {
    code_path.with_extension(STYLE_EXTENSION)
}

/// Write the code file and its stylesheet.
///
/// The two files are treated as a pair: if either one differs from what is
/// on disk, both are rewritten; otherwise neither is touched.
pub fn write_outputs(
    code_path: &Path,
    code: &str,
    style: &str,
) -> Result<WriteOutcome, CompileError> {
    let style_path = style_path(code_path);

    let stale = needs_write(code_path, code.as_bytes())
        .map_err(|source| write_error(code_path, source))?
        || needs_write(&style_path, style.as_bytes())
            .map_err(|source| write_error(&style_path, source))?;

    if !stale {
        tracing::info!(path = %code_path.display(), "generated views unchanged");
        return Ok(WriteOutcome::Unchanged);
    }

    if let Some(dir) = code_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| write_error(dir, source))?;
    }

    fs::write(&style_path, style).map_err(|source| write_error(&style_path, source))?;
    fs::write(code_path, code).map_err(|source| write_error(code_path, source))?;

    tracing::info!(
        code = %code_path.display(),
        style = %style_path.display(),
        bytes = code.len() + style.len(),
        "wrote generated views"
    );
    Ok(WriteOutcome::Written)
}

/// Compare sizes first, then bytes. A missing file always needs writing.
fn needs_write(path: &Path, contents: &[u8]) -> io::Result<bool> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e),
    };
    if metadata.len() != contents.len() as u64 {
        return Ok(true);
    }
    Ok(fs::read(path)? != contents)
}

fn write_error(path: &Path, source: io::Error) -> CompileError {
    CompileError::Write {
        path: path.to_path_buf(),
        source,
    }
}

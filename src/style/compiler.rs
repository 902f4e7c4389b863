use std::{
    fs::{self, Permissions},
    path::Path,
    process::Command,
};

use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use super::{CompileResult, StyleError, StyleSource};

/// Turns a stylesheet source tree into a single CSS file.
///
/// Implementations block the calling thread until the output is written.
/// A failed compile must leave `output_path` exactly as it was.
pub trait StyleCompiler: Send + Sync {
    /// Compiles `source.entry` into `source.output_path`.
    ///
    /// # Errors
    /// Returns `StyleError::Compile` if the compiler cannot be started or
    /// reports a failure.
    fn compile(&self, source: &StyleSource) -> CompileResult;
}

/// Runs an external SCSS compiler as `<program> [args..] <input> <output>`.
#[derive(Debug, Clone)]
pub struct SasscCompiler {
    program: String,
    args: Vec<String>,
}

impl SasscCompiler {
    /// Creates a compiler invoking `program` with `args` before the input and output paths.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The executable this compiler spawns.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for SasscCompiler {
    fn default() -> Self {
        Self::new("sassc", Vec::new())
    }
}

impl StyleCompiler for SasscCompiler {
    /// Compiles into a temporary sibling of the output and renames it into
    /// place once the compiler exits with status 0.
    #[instrument(skip(self), fields(program = %self.program))]
    fn compile(&self, source: &StyleSource) -> CompileResult {
        let compile_error = |details: String| StyleError::Compile {
            entry: source.entry.clone(),
            details,
        };

        if !source.entry.is_file() {
            return Err(compile_error("entry file does not exist".to_string()));
        }

        let out_dir = source
            .output_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let staged = NamedTempFile::new_in(out_dir)
            .map_err(|e| compile_error(format!("cannot stage output in {}: {e}", out_dir.display())))?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&source.entry)
            .arg(staged.path())
            .output()
            .map_err(|e| compile_error(format!("failed to run '{}': {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostics = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };

            return Err(compile_error(format!("{} ({diagnostics})", output.status)));
        }

        if let Some(permissions) = output_permissions(&source.output_path) {
            fs::set_permissions(staged.path(), permissions)
                .map_err(|e| compile_error(format!("cannot set permissions on staged output: {e}")))?;
        }

        staged
            .persist(&source.output_path)
            .map_err(|e| compile_error(format!("cannot write {}: {}", source.output_path.display(), e.error)))?;

        debug!("Wrote {}", source.output_path.display());
        Ok(())
    }
}

/// Permissions for a freshly compiled stylesheet.
///
/// Staged files are created owner-only; the output keeps the mode of the
/// stylesheet it replaces, or 0644 when there is none yet.
fn output_permissions(output_path: &Path) -> Option<Permissions> {
    fs::metadata(output_path)
        .ok()
        .map(|metadata| metadata.permissions())
        .or_else(default_permissions)
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

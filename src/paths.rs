use crate::errors::{FileOperation, IoError};
use miette::Diagnostic;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("empty path given")]
    #[diagnostic(
        code(zipctl::paths::empty),
        help("Provide a file or directory path, e.g. './archive.zip'")
    )]
    Empty,

    #[error("I/O error within paths domain")]
    #[diagnostic(code(zipctl::paths::io))]
    Io(#[from] IoError),
}

/// Resolves a possibly relative path to an absolute, lexically normalized one.
///
/// Relative inputs are joined against the current directory. `.` segments are
/// dropped and `..` segments pop their parent. Nothing on the path has to
/// exist and symlinks are left alone, so this also works for a pull
/// destination that is about to be created.
///
/// # Errors
///
/// Returns a [`PathError`] if the input is empty or the current directory
/// cannot be determined.
pub fn canonicalize(input: &str) -> Result<PathBuf, PathError> {
    if input.trim().is_empty() {
        return Err(PathError::Empty);
    }

    let path = Path::new(input);

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir()
            .map_err(|error| IoError::new(FileOperation::Read, PathBuf::from("."), error))?;

        cwd.join(path)
    };

    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut new_path = PathBuf::new();

    for component in path.components() {
        match component {
            // Skip the current-dir marker "."
            Component::CurDir => {}

            // For "..", pop the last component if possible
            Component::ParentDir => {
                new_path.pop();
            }

            // For normal components, push them
            other => new_path.push(other.as_os_str()),
        }
    }

    new_path
}

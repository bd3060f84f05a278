use crate::{
    connection::{ConnectionError, ConnectionString},
    errors::{FileOperation, IoError},
};
use colored::Colorize;
use miette::Diagnostic;
use std::{fs, path::Path, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum StorageError {
    #[error("I/O error within storage domain")]
    #[diagnostic(code(zipctl::storage::io))]
    Io(#[from] IoError),

    #[error("invalid connection string")]
    #[diagnostic(code(zipctl::storage::connection))]
    Connection(#[from] ConnectionError),

    #[error("'{path}' is not a regular file")]
    #[diagnostic(
        code(zipctl::storage::not_a_file),
        help("Only single regular files can be pushed; zip a directory first")
    )]
    NotAFile { path: PathBuf },

    #[error("no connection string given")]
    #[diagnostic(
        code(zipctl::storage::missing_connection_string),
        help("Pass it as the second argument or set [storage] connection_string in zipctl.toml")
    )]
    MissingConnectionString,
}

/// Stages `file` for upload to the blob-storage account described by
/// `connection_string`.
///
/// The file is checked to be a regular file and the connection string is
/// parsed and validated, but no bytes are transferred; the blob URL the file
/// would land at is printed instead.
///
/// # Errors
///
/// Returns a [`StorageError`] if the file cannot be read, is not a regular
/// file, or the connection string fails to parse.
pub fn push(file: &Path, connection_string: &str) -> Result<(), StorageError> {
    let metadata = fs::metadata(file)
        .map_err(|error| IoError::new(FileOperation::Read, file.to_path_buf(), error))?;

    if !metadata.is_file() {
        return Err(StorageError::NotAFile {
            path: file.to_path_buf(),
        });
    }

    let account = ConnectionString::parse(connection_string)?;

    // Blob name defaults to the file name.
    let blob_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "blob".to_string());

    log::debug!(
        "resolved account '{}' with blob endpoint {}",
        account.account_name,
        account.blob_endpoint()
    );

    let msg = format!(
        "{} {} ({} bytes) -> {}",
        "push".green(),
        file.display(),
        metadata.len(),
        account.blob_url(&blob_name)
    );

    println!("{}", &msg);

    // TODO: wire in an actual blob client; push stops after validating the
    // file and the connection string.
    log::warn!("no storage backend configured, skipping transfer");

    Ok(())
}

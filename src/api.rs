use crate::{archive, config, config::Config, paths, storage};

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ZipctlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] paths::PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Archive(#[from] archive::ArchiveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] storage::StorageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] config::ConfigError),
}

/// Pushes a local file to the blob-storage account described by the
/// connection string.
///
/// When no connection string is given on the command line, the fallback from
/// `zipctl.toml` is used. No bytes leave the machine yet; the operation
/// validates the file and the account and prints the blob URL the file would
/// be uploaded to.
///
/// # Errors
///
/// Returns a [`ZipctlError`] if:
///
/// - The file path cannot be canonicalized.
/// - No connection string is given and none is configured.
/// - The file is missing or not a regular file.
/// - The connection string fails to parse.
pub fn push_file(file: &str, connection_string: Option<&str>) -> Result<(), ZipctlError> {
    let file = paths::canonicalize(file)?;

    log::debug!("pushing from canonical path {}", file.display());

    let connection_string = match connection_string {
        Some(given) => given.to_string(),
        None => Config::load()?
            .connection_string()
            .ok_or(storage::StorageError::MissingConnectionString)?
            .to_string(),
    };

    println!("Pushing {} to blob storage:", file.display());

    storage::push(&file, &connection_string)?;

    Ok(())
}

/// Extracts the zip archive at `source` into the `destination` directory.
///
/// An existing destination fails the operation unless `replace` is set, in
/// which case the directory is recursively deleted first.
///
/// # Errors
///
/// Returns a [`ZipctlError`] if:
///
/// - Either path cannot be canonicalized.
/// - The destination exists and `replace` is false.
/// - The source is missing or not a valid zip archive.
/// - Extraction fails partway through (created entries are rolled back).
pub fn pull_file(source: &str, destination: &str, replace: bool) -> Result<(), ZipctlError> {
    let source = paths::canonicalize(source)?;
    let destination = paths::canonicalize(destination)?;

    log::debug!(
        "pulling {} into {}",
        source.display(),
        destination.display()
    );

    println!("Unzipping {}:", source.display());

    archive::extract(&source, &destination, replace)?;

    println!(" - {} created successfully", destination.display());

    Ok(())
}

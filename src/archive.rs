use crate::{
    errors::{FileOperation, IoError},
    transactions::{Active, RollbackOperation, Transaction},
};
use colored::Colorize;
use miette::Diagnostic;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use zip::result::ZipError;

#[derive(Debug, Error, Diagnostic)]
pub enum ArchiveError {
    #[error("I/O error within archive domain")]
    #[diagnostic(code(zipctl::archive::io))]
    Io(#[from] IoError),

    #[error("destination '{path}' already exists")]
    #[diagnostic(
        code(zipctl::archive::destination_exists),
        help("Pass --replace to delete the existing directory first")
    )]
    DestinationExists { path: PathBuf },

    #[error("archive entry '{name}' escapes the destination directory")]
    #[diagnostic(
        code(zipctl::archive::unsafe_entry_name),
        help("The archive is malformed or malicious; nothing was extracted")
    )]
    UnsafeEntryName { name: String },

    #[error("unable to read zip archive at '{path}'")]
    #[diagnostic(
        code(zipctl::archive::zip),
        help("Make sure the source is a valid zip file")
    )]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
}

/// Extracts the zip archive at `source` into `destination`.
///
/// An existing destination directory fails the operation unless `replace` is
/// set, in which case it is recursively deleted first. Entries whose names
/// would land outside the destination are rejected. If extraction fails
/// partway through, everything created so far is rolled back.
///
/// # Errors
///
/// Returns an [`ArchiveError`] if:
///
/// - The destination exists and `replace` is false, or deleting it fails.
/// - The source cannot be opened or is not a valid zip archive.
/// - An entry name escapes the destination.
/// - A directory or file cannot be created or written to.
pub fn extract(source: &Path, destination: &Path, replace: bool) -> Result<(), ArchiveError> {
    if destination.is_dir() {
        if !replace {
            return Err(ArchiveError::DestinationExists {
                path: destination.to_path_buf(),
            });
        }

        log::debug!("removing existing destination {}", destination.display());

        fs::remove_dir_all(destination).map_err(|error| {
            IoError::new(FileOperation::RemoveDir, destination.to_path_buf(), error)
        })?;
    }

    let file = fs::File::open(source)
        .map_err(|error| IoError::new(FileOperation::Open, source.to_path_buf(), error))?;

    let mut archive = zip::ZipArchive::new(file).map_err(|error| ArchiveError::Zip {
        path: source.to_path_buf(),
        source: error,
    })?;

    log::debug!(
        "extracting {} entries into {}",
        archive.len(),
        destination.display()
    );

    let mut trx = Transaction::<Active>::new();

    create_directory(&mut trx, destination)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|error| ArchiveError::Zip {
            path: source.to_path_buf(),
            source: error,
        })?;

        // Reject zip-slip names before touching the filesystem.
        let Some(relative) = entry.enclosed_name() else {
            return Err(ArchiveError::UnsafeEntryName {
                name: entry.name().to_string(),
            });
        };

        let entry_path = destination.join(relative);

        if entry.is_dir() {
            create_directory(&mut trx, &entry_path)?;
        } else {
            if let Some(parent) = entry_path.parent() {
                create_directory(&mut trx, parent)?;
            }

            let mode = entry.unix_mode();

            write_entry(&mut trx, &mut entry, mode, &entry_path)?;
        }
    }

    trx.commit();

    Ok(())
}

/// Creates all directories in the specified path if they do not exist and
/// registers a [`RollbackOperation::RemoveDir`] on the transaction.
fn create_directory(trx: &mut Transaction<Active>, path: &Path) -> Result<(), ArchiveError> {
    fs::create_dir_all(path)
        .map_err(|error| IoError::new(FileOperation::Mkdir, path.to_path_buf(), error))?;

    trx.add_operation(RollbackOperation::RemoveDir(path.to_path_buf()));

    Ok(())
}

/// Streams a single archive entry to disk, registers a
/// [`RollbackOperation::RemoveFile`] for it, and prints a progress line.
fn write_entry(
    trx: &mut Transaction<Active>,
    entry: &mut impl io::Read,
    mode: Option<u32>,
    path: &Path,
) -> Result<(), ArchiveError> {
    let mut out = fs::File::create(path)
        .map_err(|error| IoError::new(FileOperation::Write, path.to_path_buf(), error))?;

    io::copy(entry, &mut out)
        .map_err(|error| IoError::new(FileOperation::Write, path.to_path_buf(), error))?;

    trx.add_operation(RollbackOperation::RemoveFile(path.to_path_buf()));

    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|error| IoError::new(FileOperation::Write, path.to_path_buf(), error))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    let msg = format!("{} {}", "extract".green(), path.display());

    println!("{}", &msg);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn make_archive(dir: &Path, entries: &[(&str, Option<&str>)]) -> PathBuf {
        let path = dir.join("fixture.zip");
        let file = fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        for (name, contents) in entries {
            match contents {
                Some(contents) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(contents.as_bytes()).unwrap();
                }
                None => {
                    writer.add_directory(*name, options).unwrap();
                }
            }
        }

        writer.finish().unwrap();

        path
    }

    #[test]
    fn extracts_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let archive = make_archive(
            dir.path(),
            &[
                ("readme.txt", Some("hello")),
                ("docs/", None),
                ("docs/guide.txt", Some("nested")),
            ],
        );
        let destination = dir.path().join("out");

        extract(&archive, &destination, false).unwrap();

        assert_eq!(
            fs::read_to_string(destination.join("readme.txt")).unwrap(),
            "hello"
        );
        assert_eq!(
            fs::read_to_string(destination.join("docs/guide.txt")).unwrap(),
            "nested"
        );
    }

    #[test]
    fn existing_destination_fails_without_replace() {
        let dir = tempfile::tempdir().unwrap();
        let archive = make_archive(dir.path(), &[("readme.txt", Some("hello"))]);
        let destination = dir.path().join("out");
        fs::create_dir(&destination).unwrap();

        let result = extract(&archive, &destination, false);

        assert!(matches!(
            result,
            Err(ArchiveError::DestinationExists { .. })
        ));
    }

    #[test]
    fn replace_deletes_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let archive = make_archive(dir.path(), &[("readme.txt", Some("hello"))]);
        let destination = dir.path().join("out");
        fs::create_dir(&destination).unwrap();
        fs::write(destination.join("stale.txt"), "old").unwrap();

        extract(&archive, &destination, true).unwrap();

        assert!(!destination.join("stale.txt").exists());
        assert!(destination.join("readme.txt").exists());
    }

    #[test]
    fn zip_slip_entry_is_rejected_and_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let archive = make_archive(
            dir.path(),
            &[
                ("ok.txt", Some("fine")),
                ("../evil.txt", Some("escape attempt")),
            ],
        );
        let destination = dir.path().join("out");

        let result = extract(&archive, &destination, false);

        assert!(matches!(result, Err(ArchiveError::UnsafeEntryName { .. })));
        // rollback removed the partially extracted tree
        assert!(!destination.exists());
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn garbage_source_is_a_zip_error() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not-a-zip.zip");
        fs::write(&bogus, "plain text").unwrap();

        let result = extract(&bogus, &dir.path().join("out"), false);

        assert!(matches!(result, Err(ArchiveError::Zip { .. })));
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = extract(
            &dir.path().join("absent.zip"),
            &dir.path().join("out"),
            false,
        );

        assert!(matches!(result, Err(ArchiveError::Io(_))));
    }
}

pub mod command;
pub mod native;

use crate::backup::archive::command::TarCommandArchiver;
use crate::backup::archive::native::TarNativeArchiver;
use crate::backup::file_ext::FileExtProvider;
use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddFunctionName;
use chrono::{DateTime, TimeZone};
use derive_more::From;
use function_name::named;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

/// Seconds resolution; two runs within the same second collide.
static TIME_FORMAT: &str = "%Y%m%d_%H%M%S";
static FALLBACK_BASE_NAME: &str = "backup";

/// Capability that packs a directory tree into a single archive file.
pub trait Archiver {
    /// Writes the archive of `src_dir` to `dst`.
    ///
    /// Entries are rooted at the directory's own name, so unpacking
    /// `~/.ssh` yields `.ssh/...` rather than absolute paths.
    fn archive(&self, src_dir: &Path, dst: &Path) -> Result<()>;
}

/// Selects how the archive is produced.
#[derive(Clone, From, Serialize, Deserialize, Debug)]
#[serde(tag = "archiver_type")]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum ArchiverConfig {
    /// Shells out to `tar -czf`.
    TarCommand(TarCommandArchiver),
    /// Builds the tarball in-process.
    TarNative(TarNativeArchiver),
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        TarCommandArchiver::default().into()
    }
}

impl Validate for ArchiverConfig {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        match self {
            ArchiverConfig::TarCommand(inner) => inner.validate(),
            ArchiverConfig::TarNative(inner) => inner.validate(),
        }
    }
}

impl Archiver for ArchiverConfig {
    #[named]
    fn archive(&self, src_dir: &Path, dst: &Path) -> Result<()> {
        match self {
            ArchiverConfig::TarCommand(inner) => inner.archive(src_dir, dst),
            ArchiverConfig::TarNative(inner) => inner.archive(src_dir, dst),
        }
        .add_fn_name(function_path!())
    }
}

impl FileExtProvider for ArchiverConfig {
    fn file_ext(&self) -> Option<Arc<str>> {
        match self {
            ArchiverConfig::TarCommand(inner) => inner.file_ext(),
            ArchiverConfig::TarNative(inner) => inner.file_ext(),
        }
    }
}

/// Resolves where the archive of `src_dir` goes inside `tmp_dir`.
///
/// Fails with [`Error::NotFound`] when `src_dir` is not an existing
/// directory; nothing is created on disk.
pub fn archive_path<A, T>(
    archiver: &A,
    src_dir: &Path,
    tmp_dir: &Path,
    now: DateTime<T>,
) -> Result<PathBuf>
where
    A: FileExtProvider + ?Sized,
    T: TimeZone,
    T::Offset: Display,
{
    if !src_dir.is_dir() {
        return Err(Error::not_found(src_dir));
    }

    let (_, dir_name) = split_dir(src_dir)?;
    let base_name = dir_name.to_string_lossy();
    let base_name = base_name.trim_start_matches('.');
    let base_name = if base_name.is_empty() {
        FALLBACK_BASE_NAME.into()
    } else {
        sanitize_filename::sanitize(base_name)
    };

    let mut file_name = format!("{}_backup_{}", base_name, now.format(TIME_FORMAT));
    if let Some(ext) = archiver.file_ext() {
        file_name.push('.');
        file_name.push_str(ext.as_ref());
    }

    Ok(tmp_dir.join(file_name))
}

/// Splits a source directory into its parent and its own name.
///
/// The path is canonicalized first so `.` or a trailing slash still yield a name.
pub(crate) fn split_dir(src_dir: &Path) -> Result<(PathBuf, OsString)> {
    let canonical = src_dir
        .canonicalize()
        .map_err(|e| Error::archive(format!("cannot resolve {:?}: {}", src_dir, e)))?;
    let name = canonical
        .file_name()
        .map(OsString::from)
        .ok_or_else(|| Error::archive(format!("cannot archive root directory {:?}", src_dir)))?;
    let parent = canonical
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));
    Ok((parent, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate, Utc};
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_archive_path_embeds_timestamp_and_ext() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join(".ssh");
        std::fs::create_dir(&src).unwrap();

        let path = archive_path(
            &ArchiverConfig::default(),
            &src,
            Path::new("/var/tmp"),
            fixed_time(),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/var/tmp/ssh_backup_20260102_030405.tar.gz"));
    }

    #[test]
    fn test_archive_path_native_ext() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("keys");
        std::fs::create_dir(&src).unwrap();

        let config = ArchiverConfig::TarNative(TarNativeArchiver::default());
        let path = archive_path(&config, &src, temp_dir.path(), fixed_time()).unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "keys_backup_20260102_030405.tar.xz"
        );
    }

    #[test]
    fn test_archive_path_missing_dir_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let err = archive_path(&ArchiverConfig::default(), &missing, temp_dir.path(), Local::now())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(p) if p == missing));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_archive_path_rejects_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();

        let err = archive_path(&ArchiverConfig::default(), &file, temp_dir.path(), Local::now())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_split_dir_handles_trailing_slash() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("dir");
        std::fs::create_dir(&src).unwrap();

        let (parent, name) = split_dir(&temp_dir.path().join("dir/")).unwrap();
        assert_eq!(name, "dir");
        assert_eq!(parent, temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_archiver_config_deserialization() {
        let config: ArchiverConfig = serde_yml::from_str("archiver_type: tar_command\n").unwrap();
        assert!(matches!(config, ArchiverConfig::TarCommand(_)));

        let config: ArchiverConfig = serde_yml::from_str(
            "archiver_type: tar_native\ncompressor:\n  compressor_type: none\n",
        )
        .unwrap();
        assert_eq!(config.file_ext().as_deref(), Some("tar"));
    }
}

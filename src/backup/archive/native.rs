use crate::backup::archive::{split_dir, Archiver};
use crate::backup::compress::{CompressorBuilder, CompressorConfig};
use crate::backup::file_ext::FileExtProvider;
use crate::backup::finish::Finish;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddMsg;
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, IntoInnerError};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use validator::Validate;

/// Tarball built in-process, optionally xz-compressed.
///
/// Written to a sibling temp file and renamed onto `dst` once complete,
/// so `dst` never holds a truncated archive.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct TarNativeArchiver {
    #[validate(nested)]
    #[serde(default)]
    #[builder(default, into)]
    compressor: CompressorConfig,
}

impl Archiver for TarNativeArchiver {
    fn archive(&self, src_dir: &Path, dst: &Path) -> Result<()> {
        tracing::info!("Archiving {:?} into {:?}", src_dir, dst);
        self.write_archive(src_dir, dst)
            .map_err(|e| e.classify_as(|cause| Error::archive(cause)))
    }
}

impl TarNativeArchiver {
    fn write_archive(&self, src_dir: &Path, dst: &Path) -> Result<()> {
        let (_, name) = split_dir(src_dir)
            .add_msg(format!("Cannot resolve source directory {:?}", src_dir))?;
        let out_dir = dst.parent().unwrap_or(Path::new("."));

        let tmp = NamedTempFile::new_in(out_dir)
            .map_err(Error::from)
            .add_msg(format!("Cannot create temporary archive in {:?}", out_dir))?;
        let mut builder = self
            .compressor
            .build_compressor(BufWriter::new(tmp))
            .map(tar::Builder::new)?;
        builder.follow_symlinks(false);
        builder
            .append_dir_all(&name, src_dir)
            .map_err(Error::from)
            .add_msg(format!("Failed to add {:?} to archive", src_dir))?;

        let tmp = builder
            .into_inner()?
            .finish()?
            .into_inner()
            .map_err(IntoInnerError::into_error)?;
        tmp.persist(dst)
            .map_err(|e| Error::from(e.error))
            .add_msg(format!("Cannot move archive onto {:?}", dst))?;
        Ok(())
    }
}

impl FileExtProvider for TarNativeArchiver {
    fn file_ext(&self) -> Option<Arc<str>> {
        Some(match self.compressor.file_ext() {
            Some(ext) => format!("tar.{}", ext).into(),
            None => "tar".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::compress::xz::XzConfig;
    use liblzma::read::XzDecoder;
    use std::collections::BTreeMap;
    use std::fs::File;
    use std::io::Read;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn read_entries<R: Read>(reader: R) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut archive = tar::Archive::new(reader);
        archive
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.header().entry_type().is_file())
            .map(|mut entry| {
                let path = entry.path().unwrap().into_owned();
                let mut content = Vec::new();
                entry.read_to_end(&mut content).unwrap();
                (path, content)
            })
            .collect()
    }

    fn sample_dir(temp_dir: &TempDir) -> PathBuf {
        let src = temp_dir.path().join(".ssh");
        std::fs::create_dir_all(src.join("config.d")).unwrap();
        std::fs::write(src.join("id_rsa"), vec![b'k'; 600]).unwrap();
        std::fs::write(src.join("id_rsa.pub"), vec![b'p'; 150]).unwrap();
        std::fs::write(src.join("config.d/work"), b"Host work\n").unwrap();
        src
    }

    #[test]
    fn test_xz_archive_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let src = sample_dir(&temp_dir);
        let dst = temp_dir.path().join("out.tar.xz");
        let archiver = TarNativeArchiver::builder()
            .compressor(XzConfig::builder().thread(1).build())
            .build();

        archiver.archive(&src, &dst).unwrap();

        let entries = read_entries(XzDecoder::new(File::open(&dst).unwrap()));
        assert_eq!(
            entries,
            BTreeMap::from([
                (PathBuf::from(".ssh/config.d/work"), b"Host work\n".to_vec()),
                (PathBuf::from(".ssh/id_rsa"), vec![b'k'; 600]),
                (PathBuf::from(".ssh/id_rsa.pub"), vec![b'p'; 150]),
            ])
        );
    }

    #[test]
    fn test_uncompressed_archive_and_ext() {
        let temp_dir = TempDir::new().unwrap();
        let src = sample_dir(&temp_dir);
        let dst = temp_dir.path().join("out.tar");
        let archiver = TarNativeArchiver::builder()
            .compressor(CompressorConfig::None)
            .build();
        assert_eq!(archiver.file_ext().as_deref(), Some("tar"));

        archiver.archive(&src, &dst).unwrap();
        assert_eq!(read_entries(File::open(&dst).unwrap()).len(), 3);
    }

    #[test]
    fn test_overwrites_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        let src = sample_dir(&temp_dir);
        let dst = temp_dir.path().join("out.tar.xz");
        std::fs::write(&dst, b"stale").unwrap();

        TarNativeArchiver::default().archive(&src, &dst).unwrap();
        assert_eq!(read_entries(XzDecoder::new(File::open(&dst).unwrap())).len(), 3);
    }

    #[test]
    fn test_missing_source_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let dst = temp_dir.path().join("out.tar.xz");

        let err = TarNativeArchiver::default()
            .archive(&temp_dir.path().join("missing"), &dst)
            .unwrap_err();
        assert!(matches!(err.root(), Error::Archive(_)));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unwritable_destination_is_archive_error() {
        let temp_dir = TempDir::new().unwrap();
        let src = sample_dir(&temp_dir);
        let dst = temp_dir.path().join("nodir").join("out.tar.xz");

        let err = TarNativeArchiver::default().archive(&src, &dst).unwrap_err();
        assert!(matches!(err.root(), Error::Archive(_)));
        assert!(err.to_string().contains("Cannot create temporary archive"));
        assert!(!dst.exists());
    }
}

pub mod xz;

use crate::backup::file_ext::FileExtProvider;
use crate::backup::finish::Finish;
use crate::backup::function_path;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddFunctionName;
use derive_more::From;
use function_name::named;
use io_enum::Write;
use liblzma::write::XzEncoder;
use serde::{Deserialize, Serialize};
use std::io;
use std::io::Write;
use std::result;
use std::sync::{Arc, OnceLock};
use validator::{Validate, ValidationErrors};

#[derive(Write, From)]
pub enum Compressor<W: Write> {
    None(W),
    XzEncoder(XzEncoder<W>),
}

/// Compression applied to the tar stream by the in-process archiver.
#[derive(Clone, From, Serialize, Deserialize, Debug)]
#[serde(tag = "compressor_type")]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum CompressorConfig {
    None,
    Xz(xz::XzConfig),
}

impl Default for CompressorConfig {
    fn default() -> Self {
        CompressorConfig::Xz(xz::XzConfig::default())
    }
}

impl Validate for CompressorConfig {
    fn validate(&self) -> result::Result<(), ValidationErrors> {
        match self {
            CompressorConfig::None => Ok(()),
            CompressorConfig::Xz(xz) => xz.validate(),
        }
    }
}

pub trait CompressorBuilder<W: Write> {
    fn build_compressor(&self, writer: W) -> Result<Compressor<W>>;
}

impl<W: Write> Finish<W> for Compressor<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            Compressor::None(w) => Ok(w),
            Compressor::XzEncoder(w) => w.finish(),
        }
    }
}

impl<W: Write> CompressorBuilder<W> for CompressorConfig {
    #[named]
    fn build_compressor(&self, writer: W) -> Result<Compressor<W>> {
        match self {
            CompressorConfig::None => Ok(Compressor::None(writer)),
            CompressorConfig::Xz(xz) => xz.build_compressor(writer),
        }
        .add_fn_name(function_path!())
    }
}

static XZ_FILE_EXT: OnceLock<Arc<str>> = OnceLock::new();
impl FileExtProvider for CompressorConfig {
    fn file_ext(&self) -> Option<Arc<str>> {
        match self {
            CompressorConfig::None => None,
            CompressorConfig::Xz(_) => Some(XZ_FILE_EXT.get_or_init(|| "xz".into()).clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_compressor_config_default_is_xz() {
        let config = CompressorConfig::default();
        assert!(matches!(config, CompressorConfig::Xz(_)));
        assert_eq!(config.file_ext().as_deref(), Some("xz"));
    }

    #[test]
    fn test_compressor_none_passes_bytes_through() {
        let config = CompressorConfig::None;
        assert!(config.file_ext().is_none());

        let mut compressor = config.build_compressor(Cursor::new(Vec::new())).unwrap();
        compressor.write_all(b"plain").unwrap();
        let cursor = compressor.finish().unwrap();
        assert_eq!(cursor.into_inner(), b"plain");
    }

    #[test]
    fn test_compressor_config_deserialization() {
        let config: CompressorConfig =
            serde_yml::from_str("compressor_type: xz\nlevel: 6\nthread: 1\n").unwrap();
        assert!(matches!(config, CompressorConfig::Xz(_)));
        assert!(config.validate().is_ok());

        let config: CompressorConfig = serde_yml::from_str("compressor_type: none\n").unwrap();
        assert!(matches!(config, CompressorConfig::None));
    }
}

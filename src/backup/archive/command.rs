use crate::backup::archive::{split_dir, Archiver};
use crate::backup::file_ext::FileExtProvider;
use crate::backup::process::run_tool;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::validate::validate_not_blank_path;
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use validator::Validate;

/// Gzip tarball produced by the system `tar` binary.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct TarCommandArchiver {
    #[validate(custom(function = validate_not_blank_path))]
    #[serde(default = "default_program")]
    #[builder(default = default_program(), into)]
    program: PathBuf,
}

fn default_program() -> PathBuf {
    PathBuf::from("tar")
}

impl Default for TarCommandArchiver {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Archiver for TarCommandArchiver {
    fn archive(&self, src_dir: &Path, dst: &Path) -> Result<()> {
        let (parent, name) = split_dir(src_dir)?;
        tracing::info!("Archiving {:?} into {:?} with {:?}", src_dir, dst, self.program);

        let outcome = run_tool(
            Command::new(&self.program)
                .arg("-czf")
                .arg(dst)
                .arg("-C")
                .arg(&parent)
                .arg(&name),
            None,
        )
        .map_err(|e| Error::archive(format!("cannot run {:?}: {}", self.program, e)))?;

        if !outcome.success() {
            return Err(Error::archive(format!(
                "{:?} failed with {}",
                self.program,
                outcome.describe()
            )));
        }
        Ok(())
    }
}

impl FileExtProvider for TarCommandArchiver {
    fn file_ext(&self) -> Option<Arc<str>> {
        Some("tar.gz".into())
    }
}

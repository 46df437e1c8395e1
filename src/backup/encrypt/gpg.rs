use crate::backup::encrypt::Encryptor;
use crate::backup::file_ext::FileExtProvider;
use crate::backup::process::run_tool;
use crate::backup::redacted::RedactedString;
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

/// Symmetric encryption through the `gpg` binary.
///
/// The passphrase goes through stdin (`--passphrase-fd 0`) so it never shows
/// up in the process list.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct GpgEncryptor {
    #[validate(custom(function = validate_not_blank_path))]
    #[serde(default = "default_program")]
    #[builder(default = default_program(), into)]
    program: PathBuf,
}

fn default_program() -> PathBuf {
    PathBuf::from("gpg")
}

impl Default for GpgEncryptor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Encryptor for GpgEncryptor {
    fn encrypt(&self, input: &Path, passphrase: &RedactedString, output: &Path) -> Result<()> {
        tracing::info!("Encrypting {:?} into {:?} with {:?}", input, output, self.program);

        let mut stdin = passphrase.inner().as_bytes().to_vec();
        stdin.push(b'\n');
        let outcome = run_tool(
            Command::new(&self.program)
                .args(["--batch", "--yes", "--quiet"])
                .args(["--pinentry-mode", "loopback", "--passphrase-fd", "0"])
                .arg("--symmetric")
                .arg("--output")
                .arg(output)
                .arg(input),
            Some(stdin.as_slice()),
        );
        zeroize::Zeroize::zeroize(&mut stdin);

        let outcome = outcome
            .map_err(|e| Error::encryption(format!("cannot run {:?}: {}", self.program, e)))?;
        if !outcome.success() {
            return Err(Error::encryption(format!(
                "{:?} failed with {}",
                self.program,
                outcome.describe()
            )));
        }
        Ok(())
    }
}

impl FileExtProvider for GpgEncryptor {
    fn file_ext(&self) -> Option<Arc<str>> {
        Some("gpg".into())
    }
}

pub mod age;
pub mod gpg;

use crate::backup::encrypt::age::AgeEncryptor;
use crate::backup::encrypt::gpg::GpgEncryptor;
use crate::backup::file_ext::FileExtProvider;
use crate::backup::function_path;
use crate::backup::redacted::RedactedString;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddFunctionName;
use derive_more::From;
use function_name::named;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::result;
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

/// Capability that produces a passphrase-encrypted copy of a file.
///
/// Implementations never prompt, overwrite `output` if it exists and leave
/// `input` in place.
pub trait Encryptor {
    fn encrypt(&self, input: &Path, passphrase: &RedactedString, output: &Path) -> Result<()>;
}

#[derive(Clone, From, Serialize, Deserialize, Debug)]
#[serde(tag = "encryptor_type")]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum EncryptorConfig {
    Gpg(GpgEncryptor),
    Age(AgeEncryptor),
}

impl Default for EncryptorConfig {
    fn default() -> Self {
        GpgEncryptor::default().into()
    }
}

impl Validate for EncryptorConfig {
    fn validate(&self) -> result::Result<(), ValidationErrors> {
        match self {
            EncryptorConfig::Gpg(inner) => inner.validate(),
            EncryptorConfig::Age(_) => Ok(()),
        }
    }
}

impl Encryptor for EncryptorConfig {
    #[named]
    fn encrypt(&self, input: &Path, passphrase: &RedactedString, output: &Path) -> Result<()> {
        match self {
            EncryptorConfig::Gpg(inner) => inner.encrypt(input, passphrase, output),
            EncryptorConfig::Age(inner) => inner.encrypt(input, passphrase, output),
        }
        .add_fn_name(function_path!())
    }
}

impl FileExtProvider for EncryptorConfig {
    fn file_ext(&self) -> Option<Arc<str>> {
        match self {
            EncryptorConfig::Gpg(inner) => inner.file_ext(),
            EncryptorConfig::Age(inner) => inner.file_ext(),
        }
    }
}

/// Output path for `input`: same directory, same name plus the encryptor suffix.
pub fn encrypted_path<E: FileExtProvider + ?Sized>(encryptor: &E, input: &Path) -> PathBuf {
    let mut file_name = input
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    if let Some(ext) = encryptor.file_ext() {
        file_name.push(".");
        file_name.push(ext.as_ref());
    }
    input.with_file_name(file_name)
}

use crate::backup::encrypt::Encryptor;
use crate::backup::file_ext::FileExtProvider;
use crate::backup::redacted::RedactedString;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddMsg;
use ::age::secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, IntoInnerError, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// In-process passphrase encryption (scrypt recipient) in the age format.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgeEncryptor;

impl Encryptor for AgeEncryptor {
    fn encrypt(&self, input: &Path, passphrase: &RedactedString, output: &Path) -> Result<()> {
        tracing::info!("Encrypting {:?} into {:?} with age", input, output);
        encrypt_file(input, passphrase, output)
            .map_err(|e| e.classify_as(|cause| Error::encryption(cause)))
    }
}

fn encrypt_file(input: &Path, passphrase: &RedactedString, output: &Path) -> Result<()> {
    let mut reader = File::open(input)
        .map(BufReader::new)
        .map_err(Error::from)
        .add_msg(format!("Cannot open archive {:?}", input))?;

    // File::create truncates, which gives overwrite-without-prompt
    let writer = File::create(output)
        .map(BufWriter::new)
        .map_err(Error::from)
        .add_msg(format!("Cannot create {:?}", output))?;
    let mut writer = ::age::Encryptor::with_user_passphrase(passphrase.inner().as_str().into())
        .wrap_output(writer)?;
    std::io::copy(&mut reader, &mut writer)?;
    writer
        .finish()?
        .into_inner()
        .map_err(IntoInnerError::into_error)?
        .sync_all()?;
    Ok(())
}

impl FileExtProvider for AgeEncryptor {
    fn file_ext(&self) -> Option<Arc<str>> {
        Some("age".into())
    }
}

/// Decrypts an age stream produced by [`AgeEncryptor`], returning the bytes copied.
pub fn decrypt<R: Read, W: Write>(
    reader: R,
    passphrase: &RedactedString,
    writer: &mut W,
) -> Result<u64> {
    let decryptor = ::age::Decryptor::new(reader)?;
    let identity =
        ::age::scrypt::Identity::new(SecretString::from(passphrase.inner().to_owned()));
    let mut stream = decryptor.decrypt(std::iter::once(&identity as &dyn ::age::Identity))?;
    Ok(std::io::copy(&mut stream, writer)?)
}

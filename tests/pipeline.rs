use liblzma::read::XzDecoder;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tg_backup::backup::archive::native::TarNativeArchiver;
use tg_backup::backup::archive::ArchiverConfig;
use tg_backup::backup::deliver::{resolve_hostname, Channel};
use tg_backup::backup::encrypt::age::{decrypt, AgeEncryptor};
use tg_backup::backup::encrypt::EncryptorConfig;
use tg_backup::backup::pipeline::{Pipeline, PipelineState};
use tg_backup::backup::redacted::RedactedString;
use tg_backup::backup::result_error::result::Result;

#[derive(Default)]
struct CapturingChannel {
    uploads: RefCell<Vec<(String, Vec<u8>)>>,
    messages: RefCell<Vec<String>>,
}

impl Channel for CapturingChannel {
    fn upload_document(&self, name: &str, file: &Path) -> Result<()> {
        self.uploads
            .borrow_mut()
            .push((name.to_owned(), std::fs::read(file)?));
        Ok(())
    }

    fn send_message(&self, text: &str) -> Result<()> {
        assert_eq!(self.uploads.borrow().len(), 1, "summary before upload");
        self.messages.borrow_mut().push(text.to_owned());
        Ok(())
    }
}

fn unpack(archive: &[u8]) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut tar = tar::Archive::new(XzDecoder::new(archive));
    tar.entries()
        .unwrap()
        .map(|e| e.unwrap())
        .filter(|e| e.header().entry_type().is_file())
        .map(|mut e| {
            let path = e.path().unwrap().into_owned();
            let mut content = Vec::new();
            e.read_to_end(&mut content).unwrap();
            (path, content)
        })
        .collect()
}

#[test]
fn ssh_directory_is_archived_encrypted_and_delivered() {
    let home = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();
    let ssh = home.path().join(".ssh");
    std::fs::create_dir(&ssh).unwrap();
    let private_key: Vec<u8> = (0..600u32).map(|i| (i % 251) as u8).collect();
    let public_key = vec![b'p'; 150];
    std::fs::write(ssh.join("id_rsa"), &private_key).unwrap();
    std::fs::write(ssh.join("id_rsa.pub"), &public_key).unwrap();

    let pipeline = Pipeline::builder()
        .archiver(ArchiverConfig::TarNative(TarNativeArchiver::default()))
        .encryptor(EncryptorConfig::Age(AgeEncryptor))
        .channel(CapturingChannel::default())
        .source_dir(ssh.clone())
        .tmp_dir(tmp.path())
        .passphrase("correct horse battery staple")
        .build();

    let receipt = pipeline.run().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Done);

    // nothing left in temporary storage, source untouched
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    assert_eq!(std::fs::read(ssh.join("id_rsa")).unwrap(), private_key);

    let uploads = pipeline.channel().uploads.borrow();
    let (name, encrypted) = &uploads[0];
    assert!(name.starts_with("ssh_backup_"));
    assert!(name.ends_with(".tar.xz.age"));

    let messages = pipeline.channel().messages.borrow();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Backup created and sent successfully!\n\nHostname: "));
    assert!(messages[0].contains(&format!("Hostname: {}\n", resolve_hostname())));
    assert!(messages[0].ends_with(&format!("\nBackup Size: {} bytes", encrypted.len())));
    assert_eq!(*receipt.size(), encrypted.len() as u64);

    let mut archive = Vec::new();
    decrypt(
        encrypted.as_slice(),
        &RedactedString::from("correct horse battery staple"),
        &mut archive,
    )
    .unwrap();
    assert_eq!(
        unpack(&archive),
        BTreeMap::from([
            (PathBuf::from(".ssh/id_rsa"), private_key),
            (PathBuf::from(".ssh/id_rsa.pub"), public_key),
        ])
    );
}

#[test]
fn missing_source_directory_leaves_tmp_empty() {
    let tmp = TempDir::new().unwrap();
    let pipeline = Pipeline::builder()
        .archiver(ArchiverConfig::TarNative(TarNativeArchiver::default()))
        .encryptor(EncryptorConfig::Age(AgeEncryptor))
        .channel(CapturingChannel::default())
        .source_dir(tmp.path().join("no-such-dir"))
        .tmp_dir(tmp.path())
        .passphrase("pass")
        .build();

    let err = pipeline.run().unwrap_err();

    assert!(err.to_string().starts_with("archive stage failed:"));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    assert!(pipeline.channel().uploads.borrow().is_empty());
}

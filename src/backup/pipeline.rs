//! Archive → encrypt → deliver, with every temporary file removed on exit.

use crate::backup::archive::{archive_path, Archiver, ArchiverConfig};
use crate::backup::cleanup::TempArtifacts;
use crate::backup::config::PipelineConfig;
use crate::backup::deliver::telegram::TelegramChannel;
use crate::backup::deliver::{Channel, Deliverer, DeliveryReceipt};
use crate::backup::encrypt::{encrypted_path, Encryptor, EncryptorConfig};
use crate::backup::file_ext::FileExtProvider;
use crate::backup::redacted::RedactedString;
use crate::backup::result_error::result::Result;
use bon::Builder;
use chrono::Local;
use derive_more::Display;
use std::cell::Cell;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[display("archive")]
    Archive,
    #[display("encrypt")]
    Encrypt,
    #[display("deliver")]
    Deliver,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum PipelineState {
    #[default]
    Init,
    Archived,
    Encrypted,
    Delivered,
    Done,
    #[display("Failed({_0})")]
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

/// One backup run over pluggable capabilities.
#[derive(Debug, Builder)]
pub struct Pipeline<A, E, C> {
    archiver: A,
    encryptor: E,
    channel: C,
    #[builder(into)]
    source_dir: PathBuf,
    #[builder(into)]
    tmp_dir: PathBuf,
    #[builder(into)]
    passphrase: RedactedString,
    #[builder(skip)]
    state: Cell<PipelineState>,
}

impl Pipeline<ArchiverConfig, EncryptorConfig, TelegramChannel> {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let channel = TelegramChannel::new(
            config.api_base_url().as_str(),
            config.bot_token().clone(),
            *config.group_id(),
        )?;
        Ok(Pipeline::builder()
            .archiver(config.archiver().clone())
            .encryptor(config.encryptor().clone())
            .channel(channel)
            .source_dir(config.source_dir().clone())
            .tmp_dir(config.tmp_dir().clone())
            .passphrase(config.passphrase().clone())
            .build())
    }
}

impl<A, E, C> Pipeline<A, E, C>
where
    A: Archiver + FileExtProvider,
    E: Encryptor + FileExtProvider,
    C: Channel,
{
    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Runs all stages once.
    ///
    /// The first failing stage stops the run; the error is annotated with
    /// that stage. Temporary files are gone when this returns, whatever the
    /// outcome, and also if a stage panics.
    pub fn run(&self) -> Result<DeliveryReceipt> {
        self.state.set(PipelineState::Init);
        let mut artifacts = TempArtifacts::new();
        let result = self.run_stages(&mut artifacts);
        artifacts.remove_all();

        match &result {
            Ok(_) => self.transition(PipelineState::Done),
            Err(_) => tracing::info!("Pipeline stopped in state {}", self.state()),
        }
        result
    }

    fn run_stages(&self, artifacts: &mut TempArtifacts) -> Result<DeliveryReceipt> {
        let archive = self.stage(Stage::Archive, || {
            let path = archive_path(&self.archiver, &self.source_dir, &self.tmp_dir, Local::now())?;
            // registered before the archiver runs so a partial file is cleaned too
            let path = artifacts.register(path).to_path_buf();
            self.archiver.archive(&self.source_dir, &path)?;
            Ok(path)
        })?;
        self.transition(PipelineState::Archived);

        let encrypted = self.stage(Stage::Encrypt, || {
            let path = artifacts.register(encrypted_path(&self.encryptor, &archive)).to_path_buf();
            self.encryptor.encrypt(&archive, &self.passphrase, &path)?;
            artifacts.remove(&archive);
            Ok(path)
        })?;
        self.transition(PipelineState::Encrypted);

        let receipt = self.stage(Stage::Deliver, || {
            Deliverer::new(&self.channel).deliver(&encrypted)
        })?;
        self.transition(PipelineState::Delivered);

        Ok(receipt)
    }

    fn stage<T>(&self, stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        tracing::info!("Starting {} stage", stage);
        f().map_err(|e| {
            self.transition(PipelineState::Failed(stage));
            e.with_stage(stage)
        })
    }

    fn transition(&self, next: PipelineState) {
        tracing::info!("Pipeline state {} -> {}", self.state(), next);
        self.state.set(next);
    }
}

//! # tg-backup
//!
//! Single-shot backup of a sensitive directory (by default `~/.ssh`) to a
//! Telegram group.
//!
//! One run archives the directory, encrypts the archive with a passphrase,
//! uploads the encrypted file and posts a short summary. Every temporary file
//! is removed before the run returns, whether it succeeded or not.
//!
//! - **Archive**: system `tar` (`.tar.gz`) or in-process tar + xz
//! - **Encrypt**: system `gpg` (symmetric, batch) or in-process age
//! - **Deliver**: Telegram Bot API `sendDocument` then `sendMessage`
//!
//! ## Quick Start
//!
//! ```no_run
//! use tg_backup::backup::config::{ConfigSource, PipelineConfig};
//! use tg_backup::backup::pipeline::Pipeline;
//!
//! let source = ConfigSource::builder()
//!     .bot_token("123456:token".to_owned())
//!     .group_id("-1001234567890".to_owned())
//!     .passphrase("correct horse battery staple".to_owned())
//!     .source_dir(std::path::PathBuf::from("/home/alice/.ssh"))
//!     .build();
//! let config = PipelineConfig::resolve(source)?;
//! let receipt = Pipeline::from_config(&config)?.run()?;
//! println!("{receipt}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;

pub mod telegram;

use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use bon::Builder;
use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use function_name::named;
use getset::Getters;
use std::fmt::{Display, Formatter};
use std::path::Path;

static UNKNOWN_HOSTNAME: &str = "unknown";

/// Remote destination able to take a file and a text message.
///
/// Both calls block until the remote acknowledged or rejected the request.
pub trait Channel {
    fn upload_document(&self, name: &str, file: &Path) -> Result<()>;

    fn send_message(&self, text: &str) -> Result<()>;
}

impl<C: Channel + ?Sized> Channel for &C {
    fn upload_document(&self, name: &str, file: &Path) -> Result<()> {
        (**self).upload_document(name, file)
    }

    fn send_message(&self, text: &str) -> Result<()> {
        (**self).send_message(text)
    }
}

/// Confirmation of a completed delivery; its `Display` is the summary message.
#[derive(Clone, Debug, PartialEq, Eq, Builder, Getters)]
#[getset(get = "pub")]
pub struct DeliveryReceipt {
    #[builder(into)]
    file_name: String,
    size: u64,
    #[builder(into)]
    hostname: String,
    #[builder(into)]
    time: DateTime<FixedOffset>,
}

impl Display for DeliveryReceipt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Backup created and sent successfully!\n\nHostname: {}\nTime: {}\nBackup Size: {} bytes",
            self.hostname,
            self.time.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.size
        )
    }
}

/// Host name for the summary, `"unknown"` when it cannot be resolved.
pub fn resolve_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|e| {
            tracing::warn!("Cannot resolve hostname: {e}");
            UNKNOWN_HOSTNAME.to_owned()
        })
}

/// Sends the encrypted artifact, then the summary, over a [`Channel`].
#[derive(Debug)]
pub struct Deliverer<C> {
    channel: C,
}

impl<C: Channel> Deliverer<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Uploads `file`, and only once the upload is acknowledged posts the summary.
    ///
    /// Every failure surfaces with [`Error::Delivery`] as its root cause.
    pub fn deliver(&self, file: &Path) -> Result<DeliveryReceipt> {
        self.upload_and_announce(file)
            .map_err(|e| e.classify_as(|cause| Error::delivery(cause)))
    }

    #[named]
    fn upload_and_announce(&self, file: &Path) -> Result<DeliveryReceipt> {
        let size = std::fs::metadata(file)
            .map_err(Error::from)
            .add_msg(format!("Cannot stat encrypted backup {:?}", file))
            .add_fn_name(function_path!())?
            .len();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::delivery(format!("{:?} has no file name", file)))?;

        tracing::info!("Uploading {} ({} bytes)", file_name, size);
        self.channel
            .upload_document(&file_name, file)
            .add_msg("Failed to send file to channel")
            .add_fn_name(function_path!())?;

        let receipt = DeliveryReceipt::builder()
            .file_name(file_name)
            .size(size)
            .hostname(resolve_hostname())
            .time(Local::now().fixed_offset())
            .build();

        tracing::info!("Posting summary message");
        self.channel
            .send_message(&receipt.to_string())
            .add_msg("Failed to send summary message to channel")
            .add_fn_name(function_path!())?;

        Ok(receipt)
    }
}

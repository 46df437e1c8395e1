use crate::backup::compress::{Compressor, CompressorBuilder};
use crate::backup::result_error::result::Result;
use bon::Builder;
use liblzma::stream::{Check, MtStreamBuilder};
use liblzma::write::XzEncoder;
use serde::{Deserialize, Serialize};
use std::io;
use std::io::Write;
use std::num::NonZero;
use validator::Validate;

static DEFAULT_COMPRESSION_LEVEL: u32 = 6;
static DEFAULT_MAX_PARALLELIZATION: usize = 8;

/// XZ settings for the in-process archiver.
///
/// Key directories are small, so the defaults favour ratio over speed and
/// keep the thread count modest.
#[derive(Clone, Default, Validate, Serialize, Deserialize, Debug, Builder)]
#[serde(deny_unknown_fields)]
pub struct XzConfig {
    /// Preset level, 0 (fastest) to 9 (smallest).
    #[validate(range(min = 0, max = 9))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<u32>,

    /// Encoder threads; unset means half the cores, capped.
    #[validate(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thread: Option<u32>,
}

impl XzConfig {
    fn thread_count(&self) -> u32 {
        self.thread.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZero::get)
                .map(|core| (core / 2).clamp(1, DEFAULT_MAX_PARALLELIZATION) as u32)
                .unwrap_or(1)
        })
    }
}

impl<W: Write> CompressorBuilder<W> for XzConfig {
    fn build_compressor(&self, writer: W) -> Result<Compressor<W>> {
        let level = self.level.unwrap_or(DEFAULT_COMPRESSION_LEVEL);
        let thread = self.thread_count();
        tracing::debug!("Creating XZ compressor with level={}, threads={}", level, thread);

        if thread == 1 {
            return Ok(XzEncoder::new(writer, level).into());
        }

        let stream = MtStreamBuilder::new()
            .preset(level)
            .check(Check::Crc64)
            .threads(thread)
            .encoder()
            .map_err(io::Error::from)?;
        Ok(XzEncoder::new_stream(writer, stream).into())
    }
}

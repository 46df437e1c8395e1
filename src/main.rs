use clap::Parser;
use std::path::PathBuf;
use std::process::exit;
use tg_backup::backup::config::{ConfigSource, PipelineConfig};
use tg_backup::backup::pipeline::Pipeline;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Archive, encrypt and send a directory to a Telegram group, once
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Target group/channel id
    #[arg(long, env = "TELEGRAM_GROUP_ID", allow_hyphen_values = true)]
    group_id: Option<String>,

    /// Encryption passphrase
    #[arg(long, env = "ENCRYPTION_PASS", hide_env_values = true)]
    passphrase: Option<String>,

    /// Directory to back up [default: $HOME/.ssh]
    #[arg(short, long, env = "BACKUP_SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// Where intermediate files are written [default: system temp dir]
    #[arg(long, env = "BACKUP_TMP_DIR")]
    tmp_dir: Option<PathBuf>,

    /// YAML file with archiver/encryptor/api settings
    #[arg(short, long, env = "BACKUP_CONFIG")]
    config: Option<PathBuf>,
}

impl From<Args> for ConfigSource {
    fn from(args: Args) -> Self {
        ConfigSource {
            bot_token: args.bot_token,
            group_id: args.group_id,
            passphrase: args.passphrase,
            source_dir: args.source_dir,
            tmp_dir: args.tmp_dir,
            settings_file: args.config,
            home_dir: std::env::var_os("HOME").map(PathBuf::from),
        }
    }
}

fn main() {
    // before parsing so clap's env lookups see the .env values
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dotenv {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => info!("No .env file, using process environment"),
        Err(e) => warn!("Ignoring unreadable .env file: {e}"),
    }

    let args = Args::parse();
    let res = PipelineConfig::resolve(args.into())
        .and_then(|config| Pipeline::from_config(&config))
        .and_then(|pipeline| pipeline.run());

    match res {
        Ok(receipt) => info!(
            "Backup {} ({} bytes) delivered",
            receipt.file_name(),
            receipt.size()
        ),
        Err(e) => {
            match e.failed_stage() {
                Some(stage) => error!("Backup pipeline failed at {stage} stage: {e}"),
                None => error!("Backup pipeline did not start: {e}"),
            }
            exit(1);
        }
    }
}

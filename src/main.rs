use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use r2store::{cli, config, r2};

#[derive(Parser)]
#[command(name = "r2store")]
#[command(version, about = "Cloudflare R2 storage client with AWS SigV4 signing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file
    Put {
        /// Local file to upload
        file: PathBuf,

        /// Object key to store it under
        key: String,

        /// MIME type sent as Content-Type
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },

    /// Remove an object
    Rm {
        /// Object key to delete
        key: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // One-shot operations; a current-thread runtime is plenty.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = config::load_from_env()?;
    let client = r2::R2Client::new(&config);

    match cli.command {
        Commands::Put {
            file,
            key,
            content_type,
        } => {
            cli::commands::cmd_put(&client, &file, &key, &content_type).await?;
        }
        Commands::Rm { key } => {
            cli::commands::cmd_rm(&client, &key).await?;
        }
    }

    Ok(())
}

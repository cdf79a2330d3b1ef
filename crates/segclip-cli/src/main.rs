//! segclip binary.

mod args;
mod commands;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Command};
use segclip_ledger::VideoLedger;

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON when requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("segclip=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ledger = VideoLedger::open(&cli.db).await?;

    match cli.command {
        Command::Upload {
            video_path,
            name,
            description,
            force,
        } => commands::upload(&ledger, &video_path, name, description, force).await,

        Command::List { verbose, skip_check } => {
            commands::list(&ledger, verbose, skip_check).await
        }

        Command::Show { id, skip_check } => commands::show(&ledger, id, skip_check).await,

        Command::Update {
            id,
            name,
            description,
        } => commands::update(&ledger, id, name, description).await,

        Command::Delete { id, delete_remote } => {
            commands::delete(&ledger, id, delete_remote).await
        }

        Command::Cleanup { skip_check, yes } => commands::cleanup(&ledger, skip_check, yes).await,

        Command::Analyze {
            id,
            prompts,
            output_dir,
            extract,
            gifs,
            fps,
            padding,
        } => {
            commands::analyze(&ledger, id, prompts, &output_dir, extract, gifs, fps, padding).await
        }

        Command::Extract {
            results,
            video,
            output_dir,
            gifs,
            padding,
        } => commands::extract(&results, video, &output_dir, gifs, padding).await,

        Command::Prompts => {
            commands::list_prompts();
            Ok(())
        }
    }
}

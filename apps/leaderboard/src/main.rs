use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::load_settings_from,
    load_settings,
    view::{render_rank, render_top_table, render_view},
    HttpLeaderboardClient, LeaderboardApi, LeaderboardController,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "leaderboard", about = "Submit scores and follow a game leaderboard")]
struct Cli {
    /// Leaderboard service address, e.g. http://localhost:8000
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Settings file to read instead of ./leaderboard.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a score to a player's total and show the refreshed top list.
    Submit {
        user_id: String,
        #[arg(allow_hyphen_values = true)]
        score: String,
    },
    /// Print the current top list.
    Top,
    /// Look up one player's rank.
    Rank { user_id: String },
    /// Keep the top list on screen, refreshing on a timer, until Ctrl-C.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path, |key| std::env::var(key).ok()),
        None => load_settings(),
    };
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }

    let client = Arc::new(
        HttpLeaderboardClient::new(&settings).context("failed to configure leaderboard client")?,
    );
    let mut controller = LeaderboardController::new(client.clone(), settings.refresh_interval);

    match cli.command {
        Command::Submit { user_id, score } => {
            let submitted = controller.submit_score(&user_id, &score).await;
            print!("{}", render_view(&controller.view()));
            submitted.context("Failed to submit score.")?;
        }
        Command::Top => {
            let top = client
                .fetch_top()
                .await
                .context("failed to fetch leaderboard")?;
            print!("{}", render_top_table(&top));
        }
        Command::Rank { user_id } => match controller.search_rank(&user_id).await {
            Ok(result) => print!("{}", render_rank(&result)),
            Err(err) => {
                let notice = controller
                    .view()
                    .last_error
                    .map(|notice| notice.message)
                    .unwrap_or_else(|| err.to_string());
                return Err(anyhow!(err).context(notice));
            }
        },
        Command::Watch => {
            info!(base_url = %client.base_url(), "watching leaderboard");
            let mut updates = controller.subscribe();
            controller.start();
            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let view = updates.borrow_and_update().clone();
                        print!("\x1B[2J\x1B[H{}", render_view(&view));
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            controller.stop();
        }
    }

    Ok(())
}

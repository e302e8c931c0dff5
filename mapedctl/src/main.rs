//! This is a command-line tool to view and edit the locations of a map via [libmapedit]
use crate::{cli::*, commands::Sink, config::*};
use anyhow::{Result, anyhow};
use clap::Parser;
use libmapedit::{
    Editor,
    marker::MemoryLayer,
    source::{FeedSource, FileFeed, HttpFeed},
};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod output;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("MAPEDIT_LOG"))
        .with_writer(std::io::stderr)
        .init();
    let args = Cli::parse();
    let config_file = match args.config {
        Some(path) => path,
        None => config_file()?,
    };
    let cfg = Config::load_from_file(&config_file)
        .await
        .unwrap_or_else(|e| {
            debug!(?e, "Unable to load config, using defaults");
            Config::default()
        })
        .with_overrides(args.feed_url, args.endpoint_url);

    if let Commands::Config = args.command {
        cfg.save_to_file(&config_file).await?;
        println!("Saved configuration to {}", config_file.display());
        return Ok(());
    }

    let source: Arc<dyn FeedSource> = match (args.feed_file, &cfg.feed_url) {
        (Some(path), _) => Arc::new(FileFeed::new(path)),
        (None, Some(url)) => Arc::new(HttpFeed::new(url.clone())),
        (None, None) => {
            return Err(anyhow!(
                "No feed specified. Use --feed-url or --feed-file, \
                 or save a feed url with 'mapedctl config'"
            ));
        }
    };
    let sink = Sink::new(cfg.endpoint_url.clone(), args.dry_run);
    let mut editor = Editor::new(MemoryLayer::new(), sink);

    let res = match args.command {
        Commands::Session => {
            commands::session::run(&mut editor, source, cfg.refresh_period()).await
        }
        command => {
            commands::locations::handle_command(command, &mut editor, source.as_ref()).await
        }
    };
    editor.sink().flush().await;
    res
}

mod cli;

use anyhow::bail;
use clap::Parser;
use cli::Cli;
use colored::*;
use draft_downloader::config::PipelineConfig;
use draft_downloader::pipeline;
use draft_downloader::progress::PERCENT_ERROR;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("Starting draft downloader");

    let cli = Cli::parse();
    info!(
        "CLI arguments parsed: draft_id={}, variant={:?}, parallelism={}",
        cli.draft_id, cli.variant, cli.parallelism
    );

    let mut config = PipelineConfig::new(
        cli.api_host,
        cli.api_key,
        cli.output_dir,
        cli.template_dir,
        cli.variant,
    );
    config.concurrency = cli.parallelism;
    config.max_retries = cli.max_retries;
    config.timeout = Duration::from_secs(cli.timeout_secs);

    let (handle, mut events) = pipeline::spawn_save_draft(config, cli.draft_id.clone());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut soft_errors: Vec<String> = Vec::new();
    while let Some(event) = events.recv().await {
        if event.percent == PERCENT_ERROR {
            error!("{}", event.message);
            pb.println(format!("{} {}", "!".yellow().bold(), event.message.yellow()));
            soft_errors.push(event.message);
        } else {
            pb.set_position(event.percent as u64);
            pb.set_message(event.message);
        }
    }
    pb.finish_and_clear();

    let result = handle.await?;

    if result.success {
        println!("{}", result.message.green().bold());
        if !soft_errors.is_empty() {
            println!(
                "{}",
                format!("{} file(s) could not be processed:", soft_errors.len())
                    .yellow()
                    .bold()
            );
            for msg in &soft_errors {
                println!("  {} {}", "!".yellow(), msg);
            }
        }
        Ok(())
    } else {
        eprintln!("{}", result.message.red().bold());
        if let Some(err) = &result.error {
            eprintln!("  {}", err.red());
        }
        bail!("saving draft {} failed", cli.draft_id)
    }
}

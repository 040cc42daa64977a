use clap::Parser;
use draft_downloader::config;
use draft_downloader::types::EditorVariant;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Draft id to materialize
    #[arg(short, long)]
    pub draft_id: String,

    /// Folder that will contain the project directory
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Directory holding the template skeletons
    #[arg(short, long)]
    pub template_dir: PathBuf,

    /// Editor variant the project targets
    #[arg(long, value_enum, default_value_t = EditorVariant::Capcut)]
    pub variant: EditorVariant,

    /// Bearer credential for the script-query service
    #[arg(long)]
    pub api_key: String,

    /// Base URL of the script-query service
    #[arg(long, default_value = config::DEFAULT_API_HOST)]
    pub api_host: String,

    /// Number of concurrent downloads
    #[arg(short, long, default_value_t = config::DEFAULT_CONCURRENCY)]
    pub parallelism: usize,

    /// Maximum attempts per download
    #[arg(long, default_value_t = config::DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Per-download response timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

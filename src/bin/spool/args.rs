use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about, long_about = None, version)]
pub(crate) struct Args {
    /// YAML file with queue settings. Flags below override its values.
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,
    /// Maximum number of waiting jobs.
    #[arg(short = 'n', long)]
    pub(crate) capacity: Option<usize>,
    /// Time units a job may wait before it is evicted.
    #[arg(short, long)]
    pub(crate) expiry: Option<u64>,
    /// Time units of waiting per priority promotion.
    #[arg(short, long)]
    pub(crate) aging_interval: Option<u64>,
    /// Command script to run. Reads stdin when absent.
    #[arg(short, long)]
    pub(crate) script: Option<PathBuf>,
    /// Enables human-friendly logging.
    #[arg(short, long, default_value_t)]
    pub(crate) debug: bool,
}

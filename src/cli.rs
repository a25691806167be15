use std::path::PathBuf;

use clap::Parser;
use segnet::Variant;

#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Stage layout: plain, bayes-encoder, bayes-center, bayes-decoder or bayes-full
    #[arg(long, default_value_t = Variant::BayesCenter)]
    pub variant: Variant,

    /// Input image channels
    #[arg(long, default_value_t = 3)]
    pub in_channels: usize,

    /// Number of classes
    #[arg(long, default_value_t = 10)]
    pub out_channels: usize,

    /// JSON config to build from, overrides the flags above
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective config to this path
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// Side of a random square input to run through the network
    #[arg(long)]
    pub probe: Option<usize>,

    /// Monte Carlo samples drawn for the probe input
    #[arg(long, default_value_t = 0)]
    pub samples: usize,
}

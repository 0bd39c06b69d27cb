use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "diarisk")]
#[command(version = "0.1.0")]
#[command(about = "Diabetes risk model trainer and prediction API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the dataset, fit the model, write the artifact
    Train {
        /// Dataset CSV URL (defaults to the configured Pima dataset)
        #[arg(long)]
        url: Option<String>,
        /// Where to write the model artifact
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of training epochs
        #[arg(long)]
        epochs: Option<usize>,
    },
    /// Load the artifact and serve the prediction API
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Model artifact to load
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

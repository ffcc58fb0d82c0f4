use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "avmux",
    about = "avmux — merge a remote video and audio stream over HTTP",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the merge server
    Serve(ServeArgs),
    /// Verify the media tool can be run
    Check(CheckArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,
    #[arg(long)]
    pub bind: Option<IpAddr>,
    /// Media tool executable
    #[arg(long, env = "FFMPEG_PATH")]
    pub ffmpeg: Option<PathBuf>,
    /// Limit on merges running at once
    #[arg(long)]
    pub max_concurrent: Option<usize>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long, env = "FFMPEG_PATH")]
    pub ffmpeg: Option<PathBuf>,
}

use std::net::SocketAddr;
use std::path::Path;

use colored::Colorize;

use avmux_media::{FfmpegTool, MediaTool};
use avmux_server::{AvmuxServer, ServerConfig};

use crate::cli::{CheckArgs, Cli, Command, ServeArgs};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Check(args) => cmd_check(args).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => Ok(ServerConfig::load(path)?),
        None => Ok(ServerConfig::default()),
    }
}

fn apply_overrides(config: &mut ServerConfig, args: &ServeArgs) {
    if let Some(port) = args.port {
        config.bind_addr.set_port(port);
    }
    if let Some(ip) = args.bind {
        config.bind_addr = SocketAddr::new(ip, config.bind_addr.port());
    }
    if let Some(ffmpeg) = &args.ffmpeg {
        config.merge.tool_path = ffmpeg.clone();
    }
    if let Some(n) = args.max_concurrent {
        config.merge.max_concurrent_merges = Some(n);
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    tracing::debug!(
        tool = %config.merge.tool_path.display(),
        max_concurrent = ?config.merge.max_concurrent_merges,
        "starting server"
    );
    println!("{} avmux on {}", "▶".green().bold(), config.bind_addr.to_string().bold());
    AvmuxServer::new(config).serve().await?;
    Ok(())
}

async fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(ffmpeg) = args.ffmpeg {
        config.merge.tool_path = ffmpeg;
    }
    let tool = FfmpegTool::new(config.merge.tool_path.clone());
    match tool.probe().await {
        Ok(version) => {
            tracing::info!(tool = %tool.program().display(), "media tool available");
            println!("{} {}", "✓".green().bold(), version);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(tool = %tool.program().display(), "media tool probe failed: {}", e.summary());
            println!("{} {}: {}", "✗".red().bold(), tool.program().display(), e.details());
            anyhow::bail!("media tool unavailable")
        }
    }
}

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxpick::cli::Cli;
use voxpick::config::Config;
use voxpick::listener::VoiceListener;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()),
    }
    .with_env_overrides();

    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(window_ms) = cli.debounce {
        config.debounce.window_ms = window_ms;
    }
    if let Some(grace_ms) = cli.grace {
        config.mute.default_grace_ms = grace_ms;
    }

    info!("voxpick {}", voxpick::version_string());

    let listener = VoiceListener::new(config);
    listener.start().await?;

    let mut events = listener.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("{}\t{}", event.kind, event.text);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl-C, shutting down");

    listener.stop().await;
    printer.abort();
    Ok(())
}

fn init_tracing(quiet: bool, verbosity: u8) {
    let default_level = if quiet {
        "error"
    } else {
        match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("voxpick={}", default_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

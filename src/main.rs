use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, Level};
use transcribe_bridge::channel::{AUDIO_PATH_ARG, TRANSCRIBE_AUDIO};
use transcribe_bridge::{
    create_router, AppState, Config, MethodCall, MethodReply, NatsClient, NatsHost,
    TranscriptionBridge, TranscriptionChannel,
};

#[derive(Parser)]
#[command(name = "transcribe-bridge")]
#[command(about = "Transcribe recorded audio through a speech recognition service")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/transcribe-bridge")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the transcription method channel over HTTP
    Serve,

    /// Transcribe a single file and print the reply
    Transcribe {
        /// Path to the WAV recording
        audio_path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let client = Arc::new(NatsClient::connect(&cfg.nats.url).await?);
    let host = NatsHost::new(
        client,
        cfg.playback.clone(),
        cfg.recognition.speech_timeout(),
    );
    let bridge = Arc::new(TranscriptionBridge::new(
        Arc::new(host),
        cfg.recognition.recognition_config(),
    ));
    let channel = TranscriptionChannel::new(bridge);

    match args.command {
        Command::Serve => {
            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            info!("Method channel listening on http://{}", addr);

            axum::serve(listener, create_router(AppState::new(channel)))
                .await
                .context("HTTP server failed")?;
        }
        Command::Transcribe { audio_path } => {
            let call = MethodCall::new(
                TRANSCRIBE_AUDIO,
                serde_json::json!({ AUDIO_PATH_ARG: audio_path }),
            );

            match channel.handle(call).await {
                MethodReply::Success { result } => println!("{}", result),
                reply => {
                    println!("{}", serde_json::to_string_pretty(&reply)?);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

//! HTTP service that turns uploaded decks and documents into slide text and
//! rewrites individual slides on request.

mod api;
mod multipart;
mod server;

use anyhow::Result;
use api::App;
use clap::Parser;
use pitch_core::{Enhancer, MemoryStore};
use pitch_openai::OpenAiClient;
use std::sync::Arc;

/// Upload presentations and enhance their slides.
#[derive(Parser, Debug)]
#[command(name = "pitch-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "PITCH_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "PITCH_MAX_UPLOAD_BYTES", default_value = "52428800")]
    max_upload_bytes: usize,

    /// Base URL of the chat-completions API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = pitch_openai::DEFAULT_BASE_URL)]
    openai_base_url: String,

    /// OpenAI organization sent with every completion request
    #[arg(long, env = "OPENAI_ORG")]
    openai_organization: Option<String>,

    /// OpenAI project sent with every completion request
    #[arg(long, env = "OPENAI_PROJECT")]
    openai_project: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let model = OpenAiClient::with_base_url(&args.openai_base_url)
        .with_organization(args.openai_organization.clone())
        .with_project(args.openai_project.clone());
    let app = Arc::new(App::new(
        Arc::new(MemoryStore::new()),
        Enhancer::new(Arc::new(model)),
    ));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = server::bind(&addr)?;
    log::info!(
        "Listening on http://{} (uploads up to {} bytes, model API at {})",
        addr,
        args.max_upload_bytes,
        args.openai_base_url
    );

    let serving = tokio::spawn(server::run(
        Arc::clone(&listener),
        app,
        args.max_upload_bytes,
    ));

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    listener.unblock();

    serving.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["pitch-server"]).unwrap();
        assert!(!args.verbose);
        assert!(args.openai_base_url.starts_with("http"));
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "pitch-server",
            "--host",
            "127.0.0.1",
            "-p",
            "9000",
            "--openai-base-url",
            "http://localhost:11434/v1",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 9000);
        assert_eq!(args.openai_base_url, "http://localhost:11434/v1");
        assert!(args.verbose);
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}

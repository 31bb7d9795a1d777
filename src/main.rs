use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use voxgate_core::config::{Config, ConfigError, ProviderKind};
use voxgate_gateway::{GatewayServer, UploadLimits};
use voxgate_stt::http::default_client;
use voxgate_stt::openai::OpenAiAdapter;
use voxgate_stt::refine::OpenAiRefiner;
use voxgate_stt::watson::WatsonAdapter;
use voxgate_stt::{ResponseDetail, SpeechToText, TranscriptRefiner};

#[derive(Parser)]
#[command(name = "voxgate", version, about = "Audio transcription gateway")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "voxgate.toml")]
    config: PathBuf,
    /// Override the bind address from the config file.
    #[arg(long)]
    bind: Option<String>,
    /// Override the port from the config file.
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_adapter(
    config: &Config,
    client: &reqwest::Client,
) -> Result<Arc<dyn SpeechToText>, ConfigError> {
    match config.transcription.provider {
        ProviderKind::Openai => {
            let api_key = config.resolve_openai_key()?;
            Ok(Arc::new(OpenAiAdapter::new(
                client.clone(),
                api_key,
                config.openai.base_url.clone(),
                config.openai.model.clone(),
            )))
        }
        ProviderKind::Watson => {
            let (api_key, service_url) = config.resolve_watson()?;
            Ok(Arc::new(
                WatsonAdapter::new(
                    client.clone(),
                    api_key,
                    service_url,
                    config.watson.model.clone(),
                )
                .with_background_audio_suppression(config.watson.background_audio_suppression)
                .with_max_alternatives(config.watson.max_alternatives),
            ))
        }
    }
}

fn build_refiner(config: &Config, client: &reqwest::Client) -> Option<Arc<dyn TranscriptRefiner>> {
    let refine = config.refine.as_ref()?;
    match config.resolve_openai_key() {
        Ok(api_key) => Some(Arc::new(OpenAiRefiner::new(
            client.clone(),
            api_key,
            refine.base_url.clone(),
            refine.model.clone(),
        ))),
        Err(e) => {
            tracing::warn!(error = %e, "refinement configured but no credential resolved, stage disabled");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(&cli.config).context("failed to load configuration")?;

    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = cli.port.unwrap_or(config.server.port);

    let client = default_client();
    // A missing credential does not abort startup: the gateway serves with an
    // unconfigured provider slot and every request answers with the same
    // configuration fault until the deployment is fixed.
    let adapter = match build_adapter(&config, &client) {
        Ok(adapter) => {
            tracing::info!(
                provider = %config.transcription.provider,
                language = %config.transcription.language,
                "speech-to-text provider ready"
            );
            Some(adapter)
        }
        Err(e) => {
            tracing::error!(error = %e, "provider configuration incomplete");
            None
        }
    };
    let refiner = build_refiner(&config, &client);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let detail = if config.transcription.verbose {
        ResponseDetail::Verbose
    } else {
        ResponseDetail::Text
    };
    let mut server = GatewayServer::new(&bind, port, shutdown_rx)
        .with_language(config.transcription.language.clone())
        .with_detail(detail)
        .with_upload_limits(UploadLimits {
            max_bytes: config.transcription.max_upload_bytes,
            min_bytes: config.transcription.min_upload_bytes,
        })
        .with_request_timeout(Duration::from_secs(config.transcription.request_timeout_secs));
    if let Some(adapter) = adapter {
        server = server.with_adapter(adapter);
    }
    if let Some(refiner) = refiner {
        server = server.with_refiner(refiner);
    }

    server.serve().await.context("gateway server failed")?;
    Ok(())
}

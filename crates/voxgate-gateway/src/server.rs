use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use voxgate_stt::{ResponseDetail, SpeechToText, TranscriptRefiner};

use crate::error::GatewayError;
use crate::receive::UploadLimits;
use crate::router::build_router;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) adapter: Option<Arc<dyn SpeechToText>>,
    pub(crate) refiner: Option<Arc<dyn TranscriptRefiner>>,
    pub(crate) language: String,
    pub(crate) detail: ResponseDetail,
    pub(crate) limits: UploadLimits,
    pub(crate) request_timeout: Duration,
    pub(crate) started_at: Instant,
}

pub struct GatewayServer {
    addr: SocketAddr,
    adapter: Option<Arc<dyn SpeechToText>>,
    refiner: Option<Arc<dyn TranscriptRefiner>>,
    language: String,
    detail: ResponseDetail,
    limits: UploadLimits,
    request_timeout: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(bind: &str, port: u16, shutdown_rx: watch::Receiver<bool>) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0, ensure this is intended for production");
        }

        Self {
            addr,
            adapter: None,
            refiner: None,
            language: "fr".into(),
            detail: ResponseDetail::Text,
            limits: UploadLimits::default(),
            request_timeout: Duration::from_secs(60),
            shutdown_rx,
        }
    }

    /// Select the one speech-to-text backend this process dispatches to.
    /// Without one, every request answers with a configuration fault.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn SpeechToText>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    #[must_use]
    pub fn with_refiner(mut self, refiner: Arc<dyn TranscriptRefiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: ResponseDetail) -> Self {
        self.detail = detail;
        self
    }

    #[must_use]
    pub fn with_upload_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Start the HTTP gateway server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal
    /// I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        if self.adapter.is_none() {
            tracing::error!(
                "no speech-to-text provider configured; requests will fail until credentials are supplied"
            );
        }

        let state = AppState {
            adapter: self.adapter,
            refiner: self.refiner,
            language: self.language,
            detail: self.detail,
            limits: self.limits,
            request_timeout: self.request_timeout,
            started_at: Instant::now(),
        };
        let router = build_router(state);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

//! Upload transports.
//!
//! Transport selection is an ordered chain: the primary transport performs a
//! signed client-style upload, the fallback holds the private key directly.
//! A failed attempt falls through to the next transport; only the last error
//! surfaces to the orchestrator.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use vidkit_core::{PluginError, PluginResult};
use vidkit_vendor::auth::{fetch_auth_params, generate_auth_params};
use vidkit_vendor::{ImageKitClient, UploadRequest, UploadResponse};

/// Coarse progress checkpoints (0..=100) reported during an attempt.
pub type ProgressSender = mpsc::Sender<u8>;

/// One way of getting a configured upload to the vendor.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn upload(
        &self,
        request: &UploadRequest,
        progress: &ProgressSender,
        cancel: &CancellationToken,
    ) -> PluginResult<UploadResponse>;
}

/// Best-effort remote file deletion used for cancellation cleanup.
#[async_trait]
pub trait VendorCleanup: Send + Sync {
    async fn delete_file(&self, file_id: &str) -> PluginResult<()>;
}

#[async_trait]
impl VendorCleanup for ImageKitClient {
    async fn delete_file(&self, file_id: &str) -> PluginResult<()> {
        ImageKitClient::delete_file(self, file_id).await
    }
}

/// Signed client-style upload. Signature parameters come from the trusted
/// auth endpoint when one is configured, else are generated locally from the
/// private key.
pub struct DirectTransport {
    client: Arc<ImageKitClient>,
    auth_endpoint: Option<String>,
}

impl DirectTransport {
    pub fn new(client: Arc<ImageKitClient>, auth_endpoint: Option<String>) -> Self {
        Self {
            client,
            auth_endpoint,
        }
    }
}

#[async_trait]
impl UploadTransport for DirectTransport {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn upload(
        &self,
        request: &UploadRequest,
        progress: &ProgressSender,
        cancel: &CancellationToken,
    ) -> PluginResult<UploadResponse> {
        let auth = match &self.auth_endpoint {
            Some(endpoint) => fetch_auth_params(self.client.http(), endpoint).await?,
            None => {
                let secrets = self.client.secrets();
                generate_auth_params(&secrets.public_key, &secrets.private_key)
            }
        };
        let _ = progress.try_send(5);

        tokio::select! {
            _ = cancel.cancelled() => Err(PluginError::UploadFailed("Upload cancelled".to_string())),
            result = self.client.upload_signed(request, &auth) => result,
        }
    }
}

/// Server-style upload holding the private key directly.
pub struct FallbackTransport {
    client: Arc<ImageKitClient>,
}

impl FallbackTransport {
    pub fn new(client: Arc<ImageKitClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UploadTransport for FallbackTransport {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn upload(
        &self,
        request: &UploadRequest,
        progress: &ProgressSender,
        cancel: &CancellationToken,
    ) -> PluginResult<UploadResponse> {
        let _ = progress.try_send(5);

        tokio::select! {
            _ = cancel.cancelled() => Err(PluginError::UploadFailed("Upload cancelled".to_string())),
            result = self.client.upload(request) => result,
        }
    }
}

/// Ordered list of transport attempts.
pub struct TransportChain {
    transports: Vec<Arc<dyn UploadTransport>>,
}

impl TransportChain {
    pub fn new(transports: Vec<Arc<dyn UploadTransport>>) -> Self {
        Self { transports }
    }

    /// The standard two-stage chain: signed direct upload, then the
    /// private-key fallback.
    pub fn standard(client: Arc<ImageKitClient>, auth_endpoint: Option<String>) -> Self {
        Self::new(vec![
            Arc::new(DirectTransport::new(client.clone(), auth_endpoint)),
            Arc::new(FallbackTransport::new(client)),
        ])
    }
}

#[async_trait]
impl UploadTransport for TransportChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn upload(
        &self,
        request: &UploadRequest,
        progress: &ProgressSender,
        cancel: &CancellationToken,
    ) -> PluginResult<UploadResponse> {
        let mut last_error = PluginError::UploadFailed("No upload transport configured".to_string());

        for transport in &self.transports {
            if cancel.is_cancelled() {
                return Err(PluginError::UploadFailed("Upload cancelled".to_string()));
            }
            match transport.upload(request, progress, cancel).await {
                Ok(response) => {
                    tracing::debug!(transport = transport.name(), "Upload transport succeeded");
                    return Ok(response);
                }
                Err(err) => {
                    tracing::warn!(
                        transport = transport.name(),
                        error = %err,
                        "Upload transport attempt failed"
                    );
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedTransport {
        outcome: Result<UploadResponse, PluginError>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn succeeding() -> Self {
            Self {
                outcome: Ok(canned_response()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(err: PluginError) -> Self {
            Self {
                outcome: Err(err),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn canned_response() -> UploadResponse {
        serde_json::from_value(serde_json::json!({
            "fileId": "f1",
            "name": "clip.mp4",
            "url": "https://x/clip.mp4",
        }))
        .unwrap()
    }

    #[async_trait]
    impl UploadTransport for ScriptedTransport {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn upload(
            &self,
            _request: &UploadRequest,
            _progress: &ProgressSender,
            _cancel: &CancellationToken,
        ) -> PluginResult<UploadResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(response) => Ok(response.clone()),
                Err(err) => Err(PluginError::UploadFailed(err.to_string())),
            }
        }
    }

    fn request() -> UploadRequest {
        UploadRequest {
            filename: "clip.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            bytes: Bytes::from_static(b"data"),
            folder: "/".to_string(),
            is_private: false,
            tags: Vec::new(),
            use_unique_filename: true,
            custom_metadata: None,
        }
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_success() {
        let first = Arc::new(ScriptedTransport::succeeding());
        let second = Arc::new(ScriptedTransport::succeeding());
        let chain = TransportChain::new(vec![first.clone(), second.clone()]);

        let (progress_tx, _progress_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        chain
            .upload(&request(), &progress_tx, &cancel)
            .await
            .unwrap();

        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_chain_falls_through_and_surfaces_last_error() {
        let first = Arc::new(ScriptedTransport::failing(PluginError::UploadFailed(
            "primary broke".to_string(),
        )));
        let second = Arc::new(ScriptedTransport::failing(PluginError::UploadFailed(
            "fallback broke".to_string(),
        )));
        let chain = TransportChain::new(vec![first.clone(), second.clone()]);

        let (progress_tx, _progress_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let err = chain
            .upload(&request(), &progress_tx, &cancel)
            .await
            .unwrap_err();

        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert!(err.to_string().contains("fallback broke"));
    }

    #[tokio::test]
    async fn test_chain_primary_failure_recovers() {
        let first = Arc::new(ScriptedTransport::failing(PluginError::UploadFailed(
            "primary broke".to_string(),
        )));
        let second = Arc::new(ScriptedTransport::succeeding());
        let chain = TransportChain::new(vec![first, second.clone()]);

        let (progress_tx, _progress_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let response = chain
            .upload(&request(), &progress_tx, &cancel)
            .await
            .unwrap();

        assert_eq!(second.calls(), 1);
        assert_eq!(response.file_id, "f1");
    }

    #[tokio::test]
    async fn test_cancelled_chain_does_not_attempt_transports() {
        let first = Arc::new(ScriptedTransport::succeeding());
        let chain = TransportChain::new(vec![first.clone()]);

        let (progress_tx, _progress_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = chain
            .upload(&request(), &progress_tx, &cancel)
            .await
            .unwrap_err();

        assert_eq!(first.calls(), 0);
        assert!(matches!(err, PluginError::UploadFailed(_)));
    }
}

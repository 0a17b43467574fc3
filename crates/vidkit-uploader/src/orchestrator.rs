//! Upload orchestrator.
//!
//! Drives a single in-flight upload through an explicit state machine:
//!
//! `Idle -> Staged -> Uploading(progress) -> Success | Errored`, with `Idle`
//! reachable from any state via `reset`.
//!
//! At most one session is active per orchestrator; `stage` and `commit`
//! requests while an upload is in flight are ignored, not queued. Events are
//! delivered over an unbounded channel returned by `commit`: one source
//! descriptor, zero or more monotonically non-decreasing progress updates,
//! then exactly one terminal `Success` or `Error`. A cancelled session closes
//! the channel without a terminal event.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use vidkit_core::models::{
    StagedFile, StagedUpload, UploadEvent, UploadSettings, VideoAssetDocument,
};
use vidkit_core::{PluginError, PluginResult};
use vidkit_store::DocumentStore;
use vidkit_vendor::UploadRequest;

use crate::asset_writer::AssetWriter;
use crate::secrets::SecretsProvider;
use crate::transport::{UploadTransport, VendorCleanup};

const URL_FETCH_PROGRESS: u8 = 25;

/// Orchestrator state, observable between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Staged,
    Uploading { progress: u8 },
    Success,
    Errored,
}

/// Owning document and field to receive the weak asset reference on success.
#[derive(Debug, Clone)]
pub struct OwnerLink {
    pub document_id: String,
    pub field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionKind {
    File,
    Url,
}

struct Session {
    id: String,
    kind: SessionKind,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    vendor_file_id: Arc<Mutex<Option<String>>>,
}

struct Inner {
    state: UploadState,
    staged: Option<StagedUpload>,
    session: Option<Session>,
}

pub struct UploadOrchestrator {
    transport: Arc<dyn UploadTransport>,
    writer: AssetWriter,
    secrets: SecretsProvider,
    cleanup: Option<Arc<dyn VendorCleanup>>,
    http: reqwest::Client,
    inner: Arc<Mutex<Inner>>,
}

impl UploadOrchestrator {
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        store: Arc<dyn DocumentStore>,
        cleanup: Option<Arc<dyn VendorCleanup>>,
    ) -> PluginResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| PluginError::Internal(format!("HTTP client: {}", err)))?;

        Ok(Self {
            transport,
            writer: AssetWriter::new(store.clone()),
            secrets: SecretsProvider::new(store),
            cleanup,
            http,
            inner: Arc::new(Mutex::new(Inner {
                state: UploadState::Idle,
                staged: None,
                session: None,
            })),
        })
    }

    pub fn state(&self) -> UploadState {
        self.inner.lock().unwrap().state.clone()
    }

    /// Id of the active session, if any.
    pub fn session_id(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .session
            .as_ref()
            .map(|session| session.id.clone())
    }

    /// Stage a file for upload. Returns `Ok(false)` when ignored because an
    /// upload is already in flight.
    pub fn stage_file(&self, file: StagedFile) -> PluginResult<bool> {
        if file.is_empty() {
            return Err(PluginError::UploadFailed("Invalid file provided".to_string()));
        }

        let mut inner = self.inner.lock().unwrap();
        if matches!(inner.state, UploadState::Uploading { .. }) {
            tracing::debug!("Ignoring stage request while an upload is active");
            return Ok(false);
        }
        inner.staged = Some(StagedUpload::File(file));
        inner.state = UploadState::Staged;
        Ok(true)
    }

    /// Stage a remote URL for upload. The URL is validated at commit.
    pub fn stage_url(&self, url: impl Into<String>) -> PluginResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        if matches!(inner.state, UploadState::Uploading { .. }) {
            tracing::debug!("Ignoring stage request while an upload is active");
            return Ok(false);
        }
        inner.staged = Some(StagedUpload::Url { url: url.into() });
        inner.state = UploadState::Staged;
        Ok(true)
    }

    /// Commit the staged upload with the given settings, starting transport.
    ///
    /// Returns the session's event stream, or `Ok(None)` when there is
    /// nothing staged or an upload is already in flight (the active session
    /// is untouched). Validation failures (`InvalidUrl`,
    /// `CredentialsMissing`) are raised before any vendor call and leave the
    /// staged upload in place.
    pub async fn commit(
        &self,
        settings: UploadSettings,
        link: Option<OwnerLink>,
    ) -> PluginResult<Option<mpsc::UnboundedReceiver<UploadEvent>>> {
        let staged = {
            let inner = self.inner.lock().unwrap();
            if matches!(inner.state, UploadState::Uploading { .. }) {
                tracing::debug!("Ignoring commit while an upload is active");
                return Ok(None);
            }
            match inner.staged.clone() {
                Some(staged) => staged,
                None => return Ok(None),
            }
        };

        if let StagedUpload::Url { url } = &staged {
            validate_upload_url(url)?;
        }

        // Credentials must be present before transport selection begins.
        self.secrets.load_configured().await?;

        let session_id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let vendor_file_id = Arc::new(Mutex::new(None));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let kind = match &staged {
            StagedUpload::File(_) => SessionKind::File,
            StagedUpload::Url { .. } => SessionKind::Url,
        };

        {
            let mut inner = self.inner.lock().unwrap();
            // Re-check under the lock: a racing commit may have won.
            if matches!(inner.state, UploadState::Uploading { .. }) || inner.staged.is_none() {
                return Ok(None);
            }
            inner.staged = None;
            inner.state = UploadState::Uploading { progress: 0 };
            inner.session = Some(Session {
                id: session_id.clone(),
                kind,
                cancel: cancel.clone(),
                task: None,
                vendor_file_id: vendor_file_id.clone(),
            });
        }

        // Source descriptor goes out before any transport work.
        let descriptor = match &staged {
            StagedUpload::File(file) => UploadEvent::File {
                filename: file.filename.clone(),
                assigned_id: session_id.clone(),
            },
            StagedUpload::Url { url } => UploadEvent::Url { url: url.clone() },
        };
        let _ = event_tx.send(descriptor);

        let context = SessionContext {
            session_id: session_id.clone(),
            staged,
            settings,
            link,
            transport: self.transport.clone(),
            writer: self.writer.clone(),
            cleanup: self.cleanup.clone(),
            http: self.http.clone(),
            cancel,
            vendor_file_id,
            event_tx,
            inner: self.inner.clone(),
        };
        let task = tokio::spawn(run_session(context));

        let mut inner = self.inner.lock().unwrap();
        if let Some(session) = inner.session.as_mut() {
            if session.id == session_id {
                session.task = Some(task);
            }
        }

        Ok(Some(event_rx))
    }

    /// Abort the in-flight file upload, delete any vendor file already
    /// assigned (best-effort), and return to `Idle`. URL sessions and
    /// non-uploading states are a no-op returning `Ok(false)`.
    pub async fn cancel(&self) -> PluginResult<bool> {
        let (token, task) = {
            let mut inner = self.inner.lock().unwrap();
            let uploading = matches!(inner.state, UploadState::Uploading { .. });
            let is_file = inner
                .session
                .as_ref()
                .is_some_and(|session| session.kind == SessionKind::File);
            if !uploading || !is_file {
                return Ok(false);
            }

            let Some(mut session) = inner.session.take() else {
                return Ok(false);
            };
            inner.state = UploadState::Idle;
            inner.staged = None;
            (session.cancel.clone(), session.task.take())
        };

        token.cancel();
        if let Some(task) = task {
            let _ = task.await;
        }
        tracing::info!("Upload cancelled");
        Ok(true)
    }

    /// Discard all session state and return to `Idle` from any state.
    pub async fn reset(&self) {
        let (token, task) = {
            let mut inner = self.inner.lock().unwrap();
            inner.staged = None;
            inner.state = UploadState::Idle;
            match inner.session.take() {
                Some(mut session) => (Some(session.cancel.clone()), session.task.take()),
                None => (None, None),
            }
        };

        if let Some(token) = token {
            token.cancel();
        }
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

fn validate_upload_url(url: &str) -> PluginResult<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|_| PluginError::InvalidUrl("Invalid URL".to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(PluginError::InvalidUrl(
            "URL must begin with http:// or https://".to_string(),
        ));
    }
    Ok(())
}

struct SessionContext {
    session_id: String,
    staged: StagedUpload,
    settings: UploadSettings,
    link: Option<OwnerLink>,
    transport: Arc<dyn UploadTransport>,
    writer: AssetWriter,
    cleanup: Option<Arc<dyn VendorCleanup>>,
    http: reqwest::Client,
    cancel: CancellationToken,
    vendor_file_id: Arc<Mutex<Option<String>>>,
    event_tx: mpsc::UnboundedSender<UploadEvent>,
    inner: Arc<Mutex<Inner>>,
}

enum Outcome {
    Success(VideoAssetDocument),
    Error(PluginError),
    Cancelled,
}

async fn run_session(ctx: SessionContext) {
    match drive_upload(&ctx).await {
        Outcome::Success(asset) => {
            if finish(&ctx, UploadState::Success) {
                let _ = ctx.event_tx.send(UploadEvent::Success {
                    asset: Box::new(asset),
                });
            }
        }
        Outcome::Error(err) => {
            tracing::error!(
                session = %ctx.session_id,
                error = %err,
                code = err.error_code(),
                "Upload session failed"
            );
            if finish(&ctx, UploadState::Errored) {
                let _ = ctx.event_tx.send(UploadEvent::Error {
                    message: err.client_message(),
                });
            }
        }
        // Cancellation acknowledged: channel closes without a terminal event.
        Outcome::Cancelled => {}
    }
}

async fn drive_upload(ctx: &SessionContext) -> Outcome {
    let file = match &ctx.staged {
        StagedUpload::File(file) => file.clone(),
        StagedUpload::Url { url } => {
            let fetched = tokio::select! {
                _ = ctx.cancel.cancelled() => return Outcome::Cancelled,
                fetched = fetch_url_as_file(&ctx.http, url) => fetched,
            };
            match fetched {
                Ok(file) => {
                    emit_progress(ctx, URL_FETCH_PROGRESS);
                    file
                }
                Err(err) => return Outcome::Error(err),
            }
        }
    };

    let request = UploadRequest::new(file, &ctx.settings);
    let (progress_tx, mut progress_rx) = mpsc::channel::<u8>(16);

    let transport = ctx.transport.clone();
    let cancel = ctx.cancel.clone();
    let upload_future = async move { transport.upload(&request, &progress_tx, &cancel).await };
    tokio::pin!(upload_future);

    let result = loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                cleanup_after_cancel(ctx).await;
                return Outcome::Cancelled;
            }
            Some(percent) = progress_rx.recv() => {
                emit_progress(ctx, percent);
            }
            result = &mut upload_future => break result,
        }
    };

    match result {
        Ok(upload) => {
            *ctx.vendor_file_id.lock().unwrap() = Some(upload.file_id.clone());
            if ctx.cancel.is_cancelled() {
                cleanup_after_cancel(ctx).await;
                return Outcome::Cancelled;
            }

            emit_progress(ctx, 100);
            let asset = ctx.writer.materialize(&ctx.session_id, &upload);
            let persisted = match &ctx.link {
                Some(link) => {
                    ctx.writer
                        .persist_and_link(&asset, &link.document_id, &link.field)
                        .await
                }
                None => ctx.writer.persist(&asset).await,
            };
            match persisted {
                Ok(asset) => Outcome::Success(asset),
                Err(err) => Outcome::Error(err),
            }
        }
        Err(err) => Outcome::Error(err),
    }
}

/// Apply a terminal state if this session is still the active one. Returns
/// false when the session was cancelled or superseded in the meantime, in
/// which case no terminal event may be emitted.
fn finish(ctx: &SessionContext, state: UploadState) -> bool {
    let mut inner = ctx.inner.lock().unwrap();
    let is_current = inner
        .session
        .as_ref()
        .is_some_and(|session| session.id == ctx.session_id);
    if is_current {
        inner.session = None;
        inner.state = state;
    }
    is_current
}

/// Progress is clamped to 100 and kept monotonically non-decreasing; stale
/// sessions emit nothing.
fn emit_progress(ctx: &SessionContext, percent: u8) {
    let percent = percent.min(100);
    {
        let mut inner = ctx.inner.lock().unwrap();
        let current = match (&inner.state, inner.session.as_ref()) {
            (UploadState::Uploading { progress }, Some(session))
                if session.id == ctx.session_id =>
            {
                *progress
            }
            _ => return,
        };
        if percent < current {
            return;
        }
        inner.state = UploadState::Uploading { progress: percent };
    }
    let _ = ctx.event_tx.send(UploadEvent::Progress { percent });
}

/// Best-effort vendor cleanup after cancellation. A missing file counts as
/// already deleted; other failures are logged and swallowed.
async fn cleanup_after_cancel(ctx: &SessionContext) {
    let file_id = ctx.vendor_file_id.lock().unwrap().take();
    let (Some(file_id), Some(cleanup)) = (file_id, ctx.cleanup.as_ref()) else {
        return;
    };

    match cleanup.delete_file(&file_id).await {
        Ok(()) => {
            tracing::debug!(file_id = %file_id, "Deleted vendor file after cancellation");
        }
        Err(PluginError::NotFound(_)) => {}
        Err(err) => {
            tracing::warn!(file_id = %file_id, error = %err, "Vendor cleanup after cancellation failed");
        }
    }
}

async fn fetch_url_as_file(http: &reqwest::Client, url: &str) -> PluginResult<StagedFile> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|err| PluginError::UploadFailed(format!("Failed to fetch URL: {}", err)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PluginError::UploadFailed(format!(
            "Failed to fetch URL: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("video/mp4")
        .to_string();
    let filename = filename_from_url(url);

    let bytes = response
        .bytes()
        .await
        .map_err(|err| PluginError::UploadFailed(format!("Failed to fetch URL: {}", err)))?;

    Ok(StagedFile {
        filename,
        content_type,
        bytes,
    })
}

fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| "video.mp4".to_string())
}

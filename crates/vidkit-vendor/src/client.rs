//! ImageKit REST client.
//!
//! Management calls (list, details, delete, folders) authenticate with Basic
//! auth from the private key. Uploads go to the upload API either with the
//! private key directly (server-style) or with signed parameters
//! (client-style), both as multipart forms with a base64 payload.

use base64::Engine;
use reqwest::multipart::Form;
use reqwest::Client;
use std::time::Duration;

use vidkit_core::models::ConfiguredSecrets;
use vidkit_core::{PluginConfig, PluginError, PluginResult};

use crate::auth::AuthParams;
use crate::types::{FileDetails, Folder, UploadRequest, UploadResponse};

/// Client for the vendor media API.
#[derive(Clone, Debug)]
pub struct ImageKitClient {
    http: Client,
    api_base_url: String,
    upload_base_url: String,
    secrets: ConfiguredSecrets,
    list_page_size: u32,
}

impl ImageKitClient {
    pub fn new(config: &PluginConfig, secrets: ConfiguredSecrets) -> PluginResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| PluginError::Internal(format!("HTTP client: {}", err)))?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            upload_base_url: config.upload_base_url.trim_end_matches('/').to_string(),
            secrets,
            list_page_size: config.list_page_size,
        })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn secrets(&self) -> &ConfiguredSecrets {
        &self.secrets
    }

    fn upload_form(request: &UploadRequest) -> Form {
        let payload = base64::engine::general_purpose::STANDARD.encode(&request.bytes);
        let mut form = Form::new()
            .text("file", payload)
            .text("fileName", request.filename.clone())
            .text("folder", request.folder.clone())
            .text("isPrivateFile", request.is_private.to_string())
            .text("useUniqueFileName", request.use_unique_filename.to_string());
        if !request.tags.is_empty() {
            form = form.text("tags", request.tags.join(","));
        }
        if let Some(metadata) = &request.custom_metadata {
            form = form.text("customMetadata", metadata.clone());
        }
        form
    }

    async fn error_from_response(response: reqwest::Response) -> PluginError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        PluginError::from_status(status, body)
    }

    /// Upload holding the private key directly (server-style).
    #[tracing::instrument(skip(self, request), fields(upload.filename = %request.filename))]
    pub async fn upload(&self, request: &UploadRequest) -> PluginResult<UploadResponse> {
        let response = self
            .http
            .post(format!("{}/files/upload", self.upload_base_url))
            .basic_auth(&self.secrets.private_key, Some(""))
            .multipart(Self::upload_form(request))
            .send()
            .await
            .map_err(|err| PluginError::UploadFailed(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|err| PluginError::UploadFailed(format!("Malformed response: {}", err)))?;
        Ok(uploaded.normalize())
    }

    /// Upload with short-lived signed parameters (client-style); the private
    /// key never appears in the request.
    #[tracing::instrument(skip(self, request, auth), fields(upload.filename = %request.filename))]
    pub async fn upload_signed(
        &self,
        request: &UploadRequest,
        auth: &AuthParams,
    ) -> PluginResult<UploadResponse> {
        let public_key = auth
            .public_key
            .clone()
            .unwrap_or_else(|| self.secrets.public_key.clone());

        let form = Self::upload_form(request)
            .text("publicKey", public_key)
            .text("token", auth.token.clone())
            .text("expire", auth.expire.to_string())
            .text("signature", auth.signature.clone());

        let response = self
            .http
            .post(format!("{}/files/upload", self.upload_base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|err| PluginError::UploadFailed(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|err| PluginError::UploadFailed(format!("Malformed response: {}", err)))?;
        Ok(uploaded.normalize())
    }

    /// List files, newest first, up to the configured page size.
    #[tracing::instrument(skip(self))]
    pub async fn list_files(&self, query: &[(&str, String)]) -> PluginResult<Vec<FileDetails>> {
        let mut request = self
            .http
            .get(format!("{}/files", self.api_base_url))
            .basic_auth(&self.secrets.private_key, Some(""))
            .query(&[("limit", self.list_page_size.to_string())]);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|err| PluginError::UploadFailed(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let files: Vec<FileDetails> = response
            .json()
            .await
            .map_err(|err| PluginError::UploadFailed(format!("Malformed response: {}", err)))?;
        Ok(files.into_iter().map(FileDetails::normalize).collect())
    }

    /// Fetch details for a single file.
    #[tracing::instrument(skip(self))]
    pub async fn get_file(&self, file_id: &str) -> PluginResult<FileDetails> {
        let response = self
            .http
            .get(format!("{}/files/{}/details", self.api_base_url, file_id))
            .basic_auth(&self.secrets.private_key, Some(""))
            .send()
            .await
            .map_err(|err| PluginError::UploadFailed(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let details: FileDetails = response
            .json()
            .await
            .map_err(|err| PluginError::UploadFailed(format!("Malformed response: {}", err)))?;
        Ok(details.normalize())
    }

    /// Delete a file. A missing file surfaces as `NotFound`; callers decide
    /// whether that counts as success.
    #[tracing::instrument(skip(self))]
    pub async fn delete_file(&self, file_id: &str) -> PluginResult<()> {
        let response = self
            .http
            .delete(format!("{}/files/{}", self.api_base_url, file_id))
            .basic_auth(&self.secrets.private_key, Some(""))
            .send()
            .await
            .map_err(|err| PluginError::VendorDeleteFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 404 {
                return Err(PluginError::NotFound(file_id.to_string()));
            }
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PluginError::VendorDeleteFailed(format!(
                "{}: {}",
                status, body
            )));
        }
        Ok(())
    }

    /// List folder paths.
    #[tracing::instrument(skip(self))]
    pub async fn list_folders(&self) -> PluginResult<Vec<Folder>> {
        let response = self
            .http
            .get(format!("{}/folder", self.api_base_url))
            .basic_auth(&self.secrets.private_key, Some(""))
            .send()
            .await
            .map_err(|err| PluginError::UploadFailed(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|err| PluginError::UploadFailed(format!("Malformed response: {}", err)))
    }
}

//! Secrets provider.
//!
//! Loads and saves the singleton vendor credentials record. Loading never
//! fails outward: a missing or unreadable record reads as invalid secrets.
//! Saving overwrites the record wholesale and immediately re-validates by
//! reloading, catching stores that silently drop a field.

use std::sync::Arc;

use vidkit_core::constants::SECRETS_DOCUMENT_ID;
use vidkit_core::models::{ConfiguredSecrets, Secrets};
use vidkit_core::{PluginError, PluginResult};
use vidkit_store::DocumentStore;

#[derive(Clone)]
pub struct SecretsProvider {
    store: Arc<dyn DocumentStore>,
}

impl SecretsProvider {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Read the secrets record. Missing record or store failure yields
    /// default (invalid) secrets rather than an error.
    pub async fn load(&self) -> Secrets {
        match self.store.fetch(SECRETS_DOCUMENT_ID).await {
            Ok(Some(document)) => serde_json::from_value(document).unwrap_or_default(),
            Ok(None) => Secrets::default(),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read secrets record");
                Secrets::default()
            }
        }
    }

    /// Read and validate, failing with `CredentialsMissing` when incomplete.
    pub async fn load_configured(&self) -> PluginResult<ConfiguredSecrets> {
        self.load()
            .await
            .configured()
            .ok_or(PluginError::CredentialsMissing)
    }

    /// Overwrite the secrets record and re-validate by reloading.
    ///
    /// Fails with `CredentialsInvalid` when all three keys were supplied but
    /// the reloaded record does not confirm them.
    #[tracing::instrument(skip(self, secrets))]
    pub async fn save(&self, secrets: Secrets) -> PluginResult<Secrets> {
        self.store
            .create_or_replace(secrets.to_document())
            .await
            .map_err(PluginError::from)?;

        let reloaded = self.load().await;
        if secrets.is_valid() && !reloaded.is_valid() {
            return Err(PluginError::CredentialsInvalid);
        }

        tracing::info!(valid = reloaded.is_valid(), "Saved secrets record");
        Ok(reloaded)
    }
}

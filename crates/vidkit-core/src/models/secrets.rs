use serde::{Deserialize, Serialize};

use crate::constants::{SECRETS_DOCUMENT_ID, SECRETS_DOCUMENT_TYPE};

/// The singleton vendor credentials record.
///
/// One per project/dataset, stored under a fixed identifier and overwritten
/// wholesale on save. A missing record deserializes to all-`None` fields and
/// simply reads as invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secrets {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub url_endpoint: Option<String>,
    #[serde(default)]
    pub enable_private_images: bool,
}

impl Secrets {
    /// All three keys present and non-empty.
    pub fn is_valid(&self) -> bool {
        [&self.public_key, &self.private_key, &self.url_endpoint]
            .iter()
            .all(|field| field.as_deref().is_some_and(|value| !value.is_empty()))
    }

    /// Whether signed private-media URLs can be produced with these secrets.
    pub fn is_signable(&self) -> bool {
        self.private_key.as_deref().is_some_and(|key| !key.is_empty())
            && self.enable_private_images
    }

    /// The validated form, or `None` when any key is missing.
    pub fn configured(&self) -> Option<ConfiguredSecrets> {
        if !self.is_valid() {
            return None;
        }
        Some(ConfiguredSecrets {
            public_key: self.public_key.clone().unwrap_or_default(),
            private_key: self.private_key.clone().unwrap_or_default(),
            url_endpoint: self.url_endpoint.clone().unwrap_or_default(),
            enable_private_images: self.enable_private_images,
        })
    }

    /// The persisted document form, with the fixed identity fields attached.
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "_id": SECRETS_DOCUMENT_ID,
            "_type": SECRETS_DOCUMENT_TYPE,
            "publicKey": self.public_key,
            "privateKey": self.private_key,
            "urlEndpoint": self.url_endpoint,
            "enablePrivateImages": self.enable_private_images,
        })
    }
}

/// Secrets that passed validation. Fields are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredSecrets {
    pub public_key: String,
    pub private_key: String,
    pub url_endpoint: String,
    pub enable_private_images: bool,
}

// Startup loading of the base dataset and the shared override document.

use std::path::PathBuf;

use porra_core::model::Dataset;
use porra_core::overrides::OverrideSet;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Source;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("request to {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{location} is not a valid dataset: {source}")]
    InvalidDataset {
        location: String,
        source: serde_json::Error,
    },
}

impl LoadError {
    fn is_not_found(&self) -> bool {
        match self {
            LoadError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            LoadError::Status { status, .. } => *status == reqwest::StatusCode::NOT_FOUND,
            _ => false,
        }
    }
}

/// Shared override layer plus whether a document was actually found.
#[derive(Debug, Clone, Default)]
pub struct SharedOverrides {
    pub set: OverrideSet,
    pub loaded: bool,
}

/// Fetch the raw text behind `source`, bypassing HTTP caches.
pub async fn fetch_text(client: &reqwest::Client, source: &Source) -> Result<String, LoadError> {
    match source {
        Source::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LoadError::Io {
                path: path.clone(),
                source: e,
            }),
        Source::Url(url) => {
            let response = client
                .get(url)
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .send()
                .await
                .map_err(|e| LoadError::Http {
                    url: url.clone(),
                    source: e,
                })?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status {
                    url: url.clone(),
                    status,
                });
            }
            response.text().await.map_err(|e| LoadError::Http {
                url: url.clone(),
                source: e,
            })
        }
    }
}

/// Load the base dataset. Any failure here is fatal for startup.
pub async fn load_dataset(client: &reqwest::Client, source: &Source) -> Result<Dataset, LoadError> {
    let text = fetch_text(client, source).await?;
    let dataset: Dataset =
        serde_json::from_str(&text).map_err(|e| LoadError::InvalidDataset {
            location: source.to_string(),
            source: e,
        })?;
    info!(
        "Dataset loaded from {}: {} participants, {} matches",
        source,
        dataset.participants.len(),
        dataset.matches.len()
    );
    Ok(dataset)
}

/// Load the shared override layer.
///
/// Never fails: a missing document, a transport error or a malformed body
/// all yield an empty layer with `loaded == false`.
pub async fn load_shared_overrides(
    client: &reqwest::Client,
    source: Option<&Source>,
) -> SharedOverrides {
    let Some(source) = source else {
        info!("No shared overrides configured");
        return SharedOverrides::default();
    };

    let text = match fetch_text(client, source).await {
        Ok(text) => text,
        Err(e) if e.is_not_found() => {
            info!("No shared overrides at {}", source);
            return SharedOverrides::default();
        }
        Err(e) => {
            warn!("Shared overrides unavailable: {}", e);
            return SharedOverrides::default();
        }
    };

    match OverrideSet::from_json_str(&text) {
        Ok(set) => {
            info!("Shared overrides loaded from {}: {} entries", source, set.len());
            SharedOverrides { set, loaded: true }
        }
        Err(e) => {
            warn!("Ignoring shared overrides at {}: {}", source, e);
            SharedOverrides::default()
        }
    }
}

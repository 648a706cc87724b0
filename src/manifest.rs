//! Repository manifest: the JSON list of registry repositories to archive.
//!
//! ```json
//! { "repositories": ["https://hub.docker.com/r/balenalib/repo-name", "..."] }
//! ```

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Raw manifest file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub repositories: Vec<String>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

/// One repository, as named by its public hub URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRef {
    /// Namespace in the public URL (organisation or user).
    pub namespace: String,
    /// Repository name.
    pub name: String,
    /// The URL as written in the manifest.
    pub source_url: String,
}

impl RepositoryRef {
    /// Parse `https://hub.docker.com/r/<namespace>/<name>[/...]`.
    pub fn from_url(raw: &str) -> Result<Self, String> {
        let url = url::Url::parse(raw.trim()).map_err(|e| e.to_string())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("unsupported scheme '{}'", url.scheme()));
        }
        let mut segments = url
            .path_segments()
            .ok_or_else(|| "URL has no path".to_string())?
            .filter(|s| !s.is_empty())
            .skip_while(|s| *s != "r");
        if segments.next().is_none() {
            return Err("path has no '/r/' segment".to_string());
        }
        let namespace = segments
            .next()
            .ok_or_else(|| "missing namespace after '/r/'".to_string())?;
        let name = segments
            .next()
            .ok_or_else(|| "missing repository name after namespace".to_string())?;
        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            source_url: raw.trim().to_string(),
        })
    }

    /// Settings page of this repository under `account`, where the archive
    /// action lives.
    pub fn settings_url(&self, hub_url: &str, account: &str) -> String {
        format!(
            "{}/repository/docker/{}/{}/settings",
            hub_url.trim_end_matches('/'),
            account,
            self.name
        )
    }
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: Manifest =
            serde_json::from_str(&content).map_err(|source| AppError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.source = Some(path.to_path_buf());
        log::debug!(
            "Loaded {} repository URLs from {}",
            manifest.repositories.len(),
            path.display()
        );
        Ok(manifest)
    }

    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repositories: urls.into_iter().map(Into::into).collect(),
            source: None,
        }
    }

    /// File this manifest was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Parse every URL, in order. Fails on the first malformed entry;
    /// later duplicates of a repository name are dropped.
    pub fn repositories(&self) -> AppResult<Vec<RepositoryRef>> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.repositories.len());
        for (index, raw) in self.repositories.iter().enumerate() {
            let repo = RepositoryRef::from_url(raw).map_err(|reason| {
                AppError::InvalidRepositoryUrl {
                    index,
                    url: raw.clone(),
                    reason,
                }
            })?;
            if !seen.insert(repo.name.clone()) {
                log::warn!("Skipping duplicate repository '{}' ({})", repo.name, raw);
                continue;
            }
            out.push(repo);
        }
        Ok(out)
    }
}

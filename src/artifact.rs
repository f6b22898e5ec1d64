use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::http_cache::{HttpCache, write_atomic};
use crate::http_client::http_client;
use crate::schema::{self, OddsRecord, SCHEMA_VERSION, SchemaError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub schema_version: u32,
    pub columns: Vec<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    pub rows: Vec<OddsRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    File(PathBuf),
    Url(String),
}

impl ArtifactSource {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ArtifactSource::Url(trimmed.to_string())
        } else {
            ArtifactSource::File(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactSource::File(path) => write!(f, "{}", path.display()),
            ArtifactSource::Url(url) => f.write_str(url),
        }
    }
}

impl Artifact {
    pub fn build(rows: Vec<OddsRecord>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            columns: schema::column_names(),
            generated_at: Some(Utc::now().to_rfc3339()),
            rows,
        }
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        schema::validate_header(self.schema_version, &self.columns)?;
        schema::validate_rows(&self.rows)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let artifact: Artifact = serde_json::from_str(raw).context("parse artifact json")?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let json = serde_json::to_string(self).context("serialize artifact")?;
        write_atomic(path, &json)
    }

    pub fn load(source: &ArtifactSource, cache: Option<&HttpCache>) -> Result<Self> {
        let raw = match source {
            ArtifactSource::File(path) => fs::read_to_string(path)
                .with_context(|| format!("read artifact {}", path.display()))?,
            ArtifactSource::Url(url) => {
                let client = http_client()?;
                match cache {
                    Some(cache) => cache.fetch_text(client, url)?,
                    None => client
                        .get(url)
                        .send()
                        .and_then(|resp| resp.error_for_status())
                        .and_then(|resp| resp.text())
                        .with_context(|| format!("fetch artifact {url}"))?,
                }
            }
        };
        let artifact =
            Self::from_json(&raw).with_context(|| format!("load artifact from {source}"))?;
        tracing::info!(
            source = %source,
            rows = artifact.rows.len(),
            generated_at = artifact.generated_at.as_deref().unwrap_or("unknown"),
            "artifact loaded"
        );
        Ok(artifact)
    }
}

//! Configuration for corpus synchronization and the query pipeline
//!
//! Configuration is environment-driven: the well-known variables below are
//! read from the process environment, optionally seeded from a `.env`-style
//! file (process environment wins). The sync driver writes the resolved
//! corpus reference back into that file so the query pipeline picks it up.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable naming the GCP project.
pub const ENV_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
/// Environment variable naming the GCP location (e.g. "us-central1").
pub const ENV_LOCATION: &str = "GOOGLE_CLOUD_LOCATION";
/// Environment variable holding the resolved corpus resource name.
pub const ENV_CORPUS: &str = "RAG_CORPUS";
/// Environment variable pointing at the service-account key file.
pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// GCP project and endpoint settings
    pub gcp: GcpSettings,
    /// Corpus naming and embedding settings
    pub corpus: CorpusSettings,
    /// Pipeline / generation settings
    pub pipeline: PipelineSettings,
}

/// Google Cloud settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpSettings {
    /// GCP project ID
    pub project_id: String,
    /// GCP region (e.g., "us-central1")
    pub location: String,
    /// Path to service account JSON key file
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

impl Default for GcpSettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: String::new(),
            credentials_path: None,
        }
    }
}

/// Corpus naming and embedding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusSettings {
    /// Corpus display name used for resolution
    #[serde(default = "default_corpus_display_name")]
    pub display_name: String,
    /// Corpus description used on creation
    #[serde(default = "default_corpus_description")]
    pub description: String,
    /// Resolved corpus resource name (set by the sync driver)
    #[serde(default)]
    pub reference: Option<String>,
    /// Embedding model applied to newly created corpora
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Display name attached to every uploaded file
    #[serde(default = "default_file_display_name")]
    pub file_display_name: String,
    /// Description attached to every uploaded file
    #[serde(default = "default_file_description")]
    pub file_description: String,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            display_name: default_corpus_display_name(),
            description: default_corpus_description(),
            reference: None,
            embedding_model: default_embedding_model(),
            file_display_name: default_file_display_name(),
            file_description: default_file_description(),
        }
    }
}

/// Pipeline / generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Generation model for both stages (default: "gemini-2.5-flash")
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    /// Per-request timeout in seconds for remote calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            generation_model: default_generation_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl PipelineSettings {
    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_corpus_display_name() -> String {
    "refdesk-library".to_string()
}

fn default_corpus_description() -> String {
    "Reference documents for grounded question answering".to_string()
}

fn default_embedding_model() -> String {
    "publishers/google/models/text-embedding-004".to_string()
}

fn default_file_display_name() -> String {
    "reference-document".to_string()
}

fn default_file_description() -> String {
    "Reference document ingested by refdesk-sync".to_string()
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Config {
    /// Load configuration from the process environment, optionally seeded
    /// from a `.env`-style file. Process environment takes precedence over
    /// the file; unset keys fall back to defaults.
    ///
    /// Missing project or location is fatal.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        let file_vars = match env_file {
            Some(path) => read_env_file(path)?,
            None => HashMap::new(),
        };
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_vars.get(key).cloned())
        })
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Split out from [`Config::load`] so tests can drive it without
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = lookup(ENV_PROJECT)
            .ok_or_else(|| Error::config(format!("{} is not set", ENV_PROJECT)))?;
        let location = lookup(ENV_LOCATION)
            .ok_or_else(|| Error::config(format!("{} is not set", ENV_LOCATION)))?;

        Ok(Config {
            gcp: GcpSettings {
                project_id,
                location,
                credentials_path: lookup(ENV_CREDENTIALS).map(PathBuf::from),
            },
            corpus: CorpusSettings {
                reference: lookup(ENV_CORPUS),
                ..CorpusSettings::default()
            },
            pipeline: PipelineSettings::default(),
        })
    }
}

/// Read a `.env`-style file into a map.
///
/// Lines are `KEY=VALUE`; blank lines and `#` comments are ignored; values
/// may be wrapped in single or double quotes. A missing file yields an
/// empty map.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        tracing::debug!("Env file {} not found, skipping", path.display());
        return Ok(HashMap::new());
    }
    let contents = fs::read_to_string(path)?;
    let mut vars = HashMap::new();
    for line in contents.lines() {
        if let Some((key, value)) = parse_env_line(line) {
            vars.insert(key, value);
        }
    }
    Ok(vars)
}

/// Write `RAG_CORPUS=<reference>` into the env file, replacing an existing
/// assignment in place or appending one. All other lines are preserved.
pub fn persist_corpus_reference(path: &Path, reference: &str) -> Result<()> {
    let existing = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let prefix = format!("{}=", ENV_CORPUS);
    let assignment = format!("{}={}", ENV_CORPUS, reference);
    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;
    for line in existing.lines() {
        if !replaced && line.trim_start().starts_with(&prefix) {
            lines.push(assignment.clone());
            replaced = true;
        } else {
            lines.push(line.to_string());
        }
    }
    if !replaced {
        lines.push(assignment);
    }

    let mut output = lines.join("\n");
    output.push('\n');
    fs::write(path, output)?;
    tracing::info!(
        "Persisted corpus reference to {}: {}",
        path.display(),
        reference
    );
    Ok(())
}

fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim().trim_start_matches("export ").trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Some((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_from_lookup_requires_project_and_location() {
        let err = Config::from_lookup(lookup_from(&[("GOOGLE_CLOUD_LOCATION", "us-central1")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("GOOGLE_CLOUD_PROJECT"));

        let err =
            Config::from_lookup(lookup_from(&[("GOOGLE_CLOUD_PROJECT", "demo")])).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_CLOUD_LOCATION"));
    }

    #[test]
    fn test_from_lookup_populates_settings() {
        let config = Config::from_lookup(lookup_from(&[
            ("GOOGLE_CLOUD_PROJECT", "demo-project"),
            ("GOOGLE_CLOUD_LOCATION", "us-central1"),
            (
                "RAG_CORPUS",
                "projects/demo-project/locations/us-central1/ragCorpora/42",
            ),
        ]))
        .unwrap();

        assert_eq!(config.gcp.project_id, "demo-project");
        assert_eq!(config.gcp.location, "us-central1");
        assert_eq!(
            config.corpus.reference.as_deref(),
            Some("projects/demo-project/locations/us-central1/ragCorpora/42")
        );
        // Defaults fill the rest
        assert_eq!(config.corpus.display_name, "refdesk-library");
        assert_eq!(config.pipeline.generation_model, "gemini-2.5-flash");
    }

    #[test]
    fn test_parse_env_line() {
        assert_eq!(
            parse_env_line("KEY=value"),
            Some(("KEY".to_string(), "value".to_string()))
        );
        assert_eq!(
            parse_env_line("  export KEY = \"quoted value\"  "),
            Some(("KEY".to_string(), "quoted value".to_string()))
        );
        assert_eq!(parse_env_line("# comment"), None);
        assert_eq!(parse_env_line(""), None);
        assert_eq!(parse_env_line("no_equals_sign"), None);
    }

    #[test]
    fn test_read_env_file_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let vars = read_env_file(&dir.path().join("absent.env")).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn test_persist_corpus_reference_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "GOOGLE_CLOUD_PROJECT=demo\nRAG_CORPUS=old-reference\n# trailing comment\n",
        )
        .unwrap();

        persist_corpus_reference(&path, "projects/demo/locations/us/ragCorpora/7").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "GOOGLE_CLOUD_PROJECT=demo\nRAG_CORPUS=projects/demo/locations/us/ragCorpora/7\n# trailing comment\n"
        );
    }

    #[test]
    fn test_persist_corpus_reference_appends_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "GOOGLE_CLOUD_PROJECT=demo\n").unwrap();

        persist_corpus_reference(&path, "projects/demo/locations/us/ragCorpora/7").unwrap();

        let vars = read_env_file(&path).unwrap();
        assert_eq!(
            vars.get("RAG_CORPUS").map(String::as_str),
            Some("projects/demo/locations/us/ragCorpora/7")
        );
        assert_eq!(vars.get("GOOGLE_CLOUD_PROJECT").map(String::as_str), Some("demo"));
    }

    #[test]
    fn test_persist_corpus_reference_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        persist_corpus_reference(&path, "projects/demo/locations/us/ragCorpora/7").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "RAG_CORPUS=projects/demo/locations/us/ragCorpora/7\n");
    }
}

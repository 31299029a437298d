use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::Cli;

const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Client configuration: environment first, then command-line overrides.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub models_dir: PathBuf,
    /// External face-expression classifier, e.g. `python3 detect_faces.py`.
    pub classifier_cmd: Option<String>,
    pub report_dir: PathBuf,
    pub rust_log: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_url = std::env::var("AVNI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        check_url("AVNI_API_URL", &api_url)?;

        Ok(ClientConfig {
            api_url,
            models_dir: env_path("AVNI_MODELS_DIR", "models"),
            classifier_cmd: std::env::var("AVNI_CLASSIFIER_CMD")
                .ok()
                .filter(|c| !c.trim().is_empty()),
            report_dir: env_path("AVNI_REPORT_DIR", "."),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
        })
    }

    pub fn with_overrides(mut self, cli: &Cli) -> Result<Self> {
        if let Some(url) = &cli.api_url {
            check_url("--api-url", url)?;
            self.api_url = url.clone();
        }
        if let Some(dir) = &cli.models_dir {
            self.models_dir = dir.clone();
        }
        if let Some(dir) = &cli.report_dir {
            self.report_dir = dir.clone();
        }
        if cli.verbose {
            self.rust_log = "debug".to_string();
        }
        Ok(self)
    }
}

fn check_url(source: &str, url: &str) -> Result<()> {
    reqwest::Url::parse(url)
        .with_context(|| format!("{source} is not a valid URL: '{url}'"))?;
    Ok(())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

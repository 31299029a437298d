//! Where face detection actually runs.
//!
//! The classifier shells out to an external program that loads the weights
//! from the models directory and prints one JSON document on stdout:
//!
//! ```json
//! { "detection": null }
//! { "detection": { "box": {"x":0,"y":0,"width":1,"height":1},
//!                  "landmarks": [{"x":0,"y":0}],
//!                  "expressions": {"happy": 0.9, "neutral": 0.1} } }
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::{ClassifierError, FaceDetection};

#[async_trait]
pub trait ExpressionBackend: Send + Sync {
    /// Finds the single most prominent face. `None` when there is no face.
    async fn detect(
        &self,
        models_dir: &Path,
        image: &Path,
    ) -> Result<Option<FaceDetection>, ClassifierError>;
}

#[derive(Debug, Deserialize)]
struct BackendOutput {
    detection: Option<FaceDetection>,
}

pub fn parse_backend_output(stdout: &[u8]) -> Result<Option<FaceDetection>, ClassifierError> {
    let output: BackendOutput = serde_json::from_slice(stdout)?;
    Ok(output.detection)
}

/// Runs `<program> [args..] --models <dir> <image>`.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    /// `command_line` is split on whitespace; the first word is the program.
    pub fn new(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(String::from);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }
}

#[async_trait]
impl ExpressionBackend for CommandBackend {
    async fn detect(
        &self,
        models_dir: &Path,
        image: &Path,
    ) -> Result<Option<FaceDetection>, ClassifierError> {
        debug!("Running classifier: {} {:?}", self.program, self.args);
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--models")
            .arg(models_dir)
            .arg(image)
            .output()
            .await
            .map_err(|e| ClassifierError::Backend(format!("cannot run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClassifierError::Backend(format!(
                "{} failed (code {:?}): {}",
                self.program,
                output.status.code(),
                stderr.trim()
            )));
        }

        parse_backend_output(&output.stdout)
    }
}

/// Used when no classifier command is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

#[async_trait]
impl ExpressionBackend for UnavailableBackend {
    async fn detect(
        &self,
        _models_dir: &Path,
        _image: &Path,
    ) -> Result<Option<FaceDetection>, ClassifierError> {
        Err(ClassifierError::Backend(
            "no classifier command configured (set AVNI_CLASSIFIER_CMD)".to_string(),
        ))
    }
}

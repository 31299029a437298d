//! Facial-expression classification for an uploaded photo.
//!
//! The classifier is an explicit value with two states. It starts `Unloaded`,
//! becomes `Ready` once every model artifact is present, and refuses to detect
//! until then. Detection is delegated to an [`ExpressionBackend`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod backend;
pub mod overlay;

pub use backend::{CommandBackend, ExpressionBackend, UnavailableBackend};

/// Weight manifests that must be present before detection is allowed.
pub const MODEL_ARTIFACTS: [&str; 3] = [
    "tiny_face_detector_model-weights_manifest.json",
    "face_landmark_68_model-weights_manifest.json",
    "face_expression_model-weights_manifest.json",
];

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Models are still loading")]
    NotReady,

    #[error("Model artifact missing: {path}")]
    MissingArtifact { path: PathBuf },

    #[error("Cannot read image {path}: {source}")]
    ImageUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Classifier backend failed: {0}")]
    Backend(String),

    #[error("Classifier output is not valid JSON: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// The seven expression categories, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Disgusted,
        Emotion::Surprised,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Disgusted => "disgusted",
            Emotion::Surprised => "surprised",
        }
    }

    /// Label with a leading capital, for headings.
    pub fn title(self) -> String {
        let label = self.label();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

/// The single face found in an image, with its raw expression probabilities.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaceDetection {
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    pub expressions: BTreeMap<Emotion, f64>,
}

impl FaceDetection {
    /// Every category with its probability, highest first. Categories the
    /// backend omitted count as 0; ties keep category order.
    pub fn ranked_expressions(&self) -> Vec<(Emotion, f64)> {
        let mut ranked: Vec<(Emotion, f64)> = Emotion::ALL
            .iter()
            .map(|e| {
                let p = self.expressions.get(e).copied().unwrap_or(0.0);
                (*e, if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 })
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionScore {
    pub emotion: Emotion,
    /// Percentage, two decimal places.
    pub confidence: f64,
}

/// Result of analysing one photo, attached to a report session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionObservation {
    pub dominant_emotion: Emotion,
    pub confidence: f64,
    pub all_emotions: Vec<EmotionScore>,
    pub source_image: PathBuf,
    /// Copy of the photo with box and landmarks drawn on, when it could be written.
    pub annotated_image: Option<PathBuf>,
}

impl EmotionObservation {
    pub fn from_detection(detection: &FaceDetection, source_image: &Path) -> Self {
        let all_emotions: Vec<EmotionScore> = detection
            .ranked_expressions()
            .into_iter()
            .map(|(emotion, p)| EmotionScore {
                emotion,
                confidence: to_percent(p),
            })
            .collect();
        // ranked_expressions always yields all seven categories
        let (dominant_emotion, confidence) = all_emotions
            .first()
            .map(|s| (s.emotion, s.confidence))
            .unwrap_or((Emotion::Neutral, 0.0));

        Self {
            dominant_emotion,
            confidence,
            all_emotions,
            source_image: source_image.to_path_buf(),
            annotated_image: None,
        }
    }

    pub fn with_annotated_image(self, path: PathBuf) -> Self {
        Self {
            annotated_image: Some(path),
            ..self
        }
    }

    /// The image to show: the annotated copy if there is one.
    pub fn display_image(&self) -> &Path {
        self.annotated_image.as_deref().unwrap_or(&self.source_image)
    }
}

fn to_percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierState {
    Unloaded,
    Ready { models_dir: PathBuf },
}

pub struct EmotionClassifier {
    state: ClassifierState,
    backend: Arc<dyn ExpressionBackend>,
}

impl EmotionClassifier {
    pub fn new(backend: Arc<dyn ExpressionBackend>) -> Self {
        Self {
            state: ClassifierState::Unloaded,
            backend,
        }
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ClassifierState::Ready { .. })
    }

    /// Checks all three artifacts concurrently. Any missing one leaves the
    /// classifier `Unloaded`.
    pub async fn load(&mut self, models_dir: &Path) -> Result<(), ClassifierError> {
        let [detector, landmarks, expressions] = MODEL_ARTIFACTS.map(|name| models_dir.join(name));
        tokio::try_join!(
            require_artifact(&detector),
            require_artifact(&landmarks),
            require_artifact(&expressions),
        )?;

        info!("Emotion models ready in {}", models_dir.display());
        self.state = ClassifierState::Ready {
            models_dir: models_dir.to_path_buf(),
        };
        Ok(())
    }

    /// Runs detection on one image. `Ok(None)` means no face was found.
    pub async fn detect(&self, image: &Path) -> Result<Option<FaceDetection>, ClassifierError> {
        let ClassifierState::Ready { models_dir } = &self.state else {
            return Err(ClassifierError::NotReady);
        };

        let meta = tokio::fs::metadata(image)
            .await
            .map_err(|source| ClassifierError::ImageUnreadable {
                path: image.to_path_buf(),
                source,
            })?;
        if !meta.is_file() {
            return Err(ClassifierError::ImageUnreadable {
                path: image.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
            });
        }

        debug!("Detecting faces in {}", image.display());
        let detection = self.backend.detect(models_dir, image).await?;
        if detection.is_none() {
            warn!("No face detected in {}", image.display());
        }
        Ok(detection)
    }
}

async fn require_artifact(path: &Path) -> Result<(), ClassifierError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(ClassifierError::MissingArtifact {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn happy_face() -> FaceDetection {
        FaceDetection {
            bounding_box: BoundingBox {
                x: 4.0,
                y: 6.0,
                width: 20.0,
                height: 24.0,
            },
            landmarks: vec![Landmark { x: 10.0, y: 12.0 }, Landmark { x: 18.0, y: 12.0 }],
            expressions: BTreeMap::from([
                (Emotion::Neutral, 0.05),
                (Emotion::Happy, 0.923_14),
                (Emotion::Sad, 0.01),
                (Emotion::Angry, 0.005),
                (Emotion::Fearful, 0.004),
                (Emotion::Disgusted, 0.003),
                (Emotion::Surprised, 0.004_86),
            ]),
        }
    }

    struct CountingBackend {
        calls: AtomicUsize,
        reply: Option<FaceDetection>,
    }

    #[async_trait]
    impl ExpressionBackend for CountingBackend {
        async fn detect(
            &self,
            _models_dir: &Path,
            _image: &Path,
        ) -> Result<Option<FaceDetection>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn write_artifacts(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), "{}").unwrap();
        }
    }

    // ──────────────────────────────────────────────
    // Observation building
    // ──────────────────────────────────────────────

    #[test]
    fn test_observation_picks_dominant_and_rounds_percentages() {
        let obs = EmotionObservation::from_detection(&happy_face(), Path::new("kid.png"));
        assert_eq!(obs.dominant_emotion, Emotion::Happy);
        assert_eq!(obs.confidence, 92.31);
        assert_eq!(obs.all_emotions.len(), 7);
        assert_eq!(obs.all_emotions[1].emotion, Emotion::Neutral);
        assert_eq!(obs.all_emotions[1].confidence, 5.0);
        assert!(obs
            .all_emotions
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_missing_categories_rank_last_as_zero() {
        let detection = FaceDetection {
            expressions: BTreeMap::from([(Emotion::Sad, 0.7), (Emotion::Angry, 0.3)]),
            ..happy_face()
        };
        let ranked = detection.ranked_expressions();
        assert_eq!(ranked[0], (Emotion::Sad, 0.7));
        assert_eq!(ranked[1], (Emotion::Angry, 0.3));
        assert_eq!(ranked[2], (Emotion::Neutral, 0.0));
        assert_eq!(ranked.len(), 7);
    }

    #[test]
    fn test_display_image_prefers_annotated_copy() {
        let obs = EmotionObservation::from_detection(&happy_face(), Path::new("kid.png"));
        assert_eq!(obs.display_image(), Path::new("kid.png"));
        let obs = obs.with_annotated_image(PathBuf::from("kid_annotated.png"));
        assert_eq!(obs.display_image(), Path::new("kid_annotated.png"));
    }

    #[test]
    fn test_emotion_title_case() {
        assert_eq!(Emotion::Surprised.title(), "Surprised");
    }

    // ──────────────────────────────────────────────
    // Lifecycle
    // ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_detect_before_load_fails_fast_without_backend_call() {
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            reply: Some(happy_face()),
        });
        let classifier = EmotionClassifier::new(backend.clone());

        let err = classifier.detect(Path::new("kid.png")).await.unwrap_err();

        assert!(matches!(err, ClassifierError::NotReady));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_requires_all_three_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &MODEL_ARTIFACTS[..2]);
        let mut classifier = EmotionClassifier::new(Arc::new(UnavailableBackend));

        let err = classifier.load(dir.path()).await.unwrap_err();

        assert!(matches!(err, ClassifierError::MissingArtifact { ref path }
            if path.ends_with("face_expression_model-weights_manifest.json")));
        assert_eq!(classifier.state(), &ClassifierState::Unloaded);
    }

    #[tokio::test]
    async fn test_load_then_detect_reaches_backend() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &MODEL_ARTIFACTS);
        let photo = dir.path().join("kid.png");
        std::fs::write(&photo, b"not really a png").unwrap();
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            reply: Some(happy_face()),
        });
        let mut classifier = EmotionClassifier::new(backend.clone());

        classifier.load(dir.path()).await.unwrap();
        assert!(classifier.is_ready());
        let detection = classifier.detect(&photo).await.unwrap();

        assert_eq!(detection, Some(happy_face()));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detect_on_missing_image_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &MODEL_ARTIFACTS);
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            reply: None,
        });
        let mut classifier = EmotionClassifier::new(backend.clone());
        classifier.load(dir.path()).await.unwrap();

        let err = classifier
            .detect(&dir.path().join("nope.jpg"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClassifierError::ImageUnreadable { .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}

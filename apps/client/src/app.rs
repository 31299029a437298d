//! Interactive flow: form, results, report, and emotion detection.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::api::AnalysisClient;
use crate::config::ClientConfig;
use crate::emotion::{
    overlay, ClassifierError, CommandBackend, EmotionClassifier, EmotionObservation,
    ExpressionBackend, UnavailableBackend,
};
use crate::export::ReportExporter;
use crate::form::{prompt_fields, submit, FormState};
use crate::render::{render_emotion, render_results};
use crate::session::{SessionStore, View};

pub const NO_FACE_MESSAGE: &str = "No face detected in the image. Please try another photo.";

pub fn build_backend(config: &ClientConfig) -> Arc<dyn ExpressionBackend> {
    match config.classifier_cmd.as_deref().and_then(CommandBackend::new) {
        Some(backend) => Arc::new(backend),
        None => Arc::new(UnavailableBackend),
    }
}

/// Starts loading the models in the background. Missing artifacts only
/// disable emotion detection.
pub fn spawn_classifier(
    backend: Arc<dyn ExpressionBackend>,
    models_dir: PathBuf,
) -> JoinHandle<EmotionClassifier> {
    tokio::spawn(async move {
        let mut classifier = EmotionClassifier::new(backend);
        if let Err(e) = classifier.load(&models_dir).await {
            warn!("Emotion detection unavailable: {e}");
        }
        classifier
    })
}

/// Detects, draws the overlay preview into `out_dir`, and builds the
/// observation. `Ok(None)` when there is no face.
pub async fn observe(
    classifier: &EmotionClassifier,
    image: &Path,
    out_dir: &Path,
) -> Result<Option<EmotionObservation>, ClassifierError> {
    let Some(detection) = classifier.detect(image).await? else {
        return Ok(None);
    };
    let observation = EmotionObservation::from_detection(&detection, image);

    // The preview is optional; the observation stands without it.
    let (image, out_dir) = (image.to_path_buf(), out_dir.to_path_buf());
    let drawn =
        tokio::task::spawn_blocking(move || overlay::save_annotated(&image, &detection, &out_dir))
            .await;
    Ok(Some(match drawn {
        Ok(Ok(path)) => observation.with_annotated_image(path),
        Ok(Err(e)) => {
            warn!("Could not draw detection overlay: {e}");
            observation
        }
        Err(e) => {
            warn!("Overlay task failed: {e}");
            observation
        }
    }))
}

enum ClassifierSlot {
    Loading(JoinHandle<EmotionClassifier>),
    Loaded(EmotionClassifier),
}

pub struct App {
    client: AnalysisClient,
    exporter: Arc<ReportExporter>,
    sessions: SessionStore,
    form: FormState,
    classifier: ClassifierSlot,
    output_dir: PathBuf,
    theme: ColorfulTheme,
}

impl App {
    /// Must be called inside the runtime; model loading starts immediately.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: AnalysisClient::new(&config.api_url),
            exporter: Arc::new(ReportExporter::new(&config.report_dir)),
            sessions: SessionStore::default(),
            form: FormState::default(),
            classifier: ClassifierSlot::Loading(spawn_classifier(
                build_backend(config),
                config.models_dir.clone(),
            )),
            output_dir: config.report_dir.clone(),
            theme: ColorfulTheme::default(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut view = View::Form;
        loop {
            debug!("View: {view:?}");
            view = match view {
                View::Form => self.form_view().await?,
                View::Results(id) => self.results_view(id).await?,
                View::Report(id) => self.report_view(id).await?,
                View::Exit => return Ok(()),
            };
        }
    }

    async fn form_view(&mut self) -> Result<View> {
        println!("\nAutism Screening Form");
        if let Some(message) = self.form.error() {
            println!("{message}");
        }

        let fields = prompt_fields(&self.form.fields)?;
        let state = std::mem::take(&mut self.form).with_fields(fields);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Analyzing...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        let outcome = submit(state, &self.client).await;
        spinner.finish_and_clear();

        match outcome {
            Ok((submission, result)) => {
                let id = self.sessions.open(submission, result);
                debug!("Opened session {id} ({} total)", self.sessions.len());
                Ok(View::Results(Some(id)))
            }
            Err(failed) => {
                self.form = failed;
                let retry = Confirm::with_theme(&self.theme)
                    .with_prompt(self.form.error().unwrap_or("Submission failed. Try again?"))
                    .default(true)
                    .interact()?;
                Ok(if retry { View::Form } else { View::Exit })
            }
        }
    }

    async fn results_view(&mut self, id: Option<Uuid>) -> Result<View> {
        let session = id.and_then(|id| self.sessions.get(id));
        println!("\n{}", render_results(session));

        let Some(id) = session.map(|s| s.id) else {
            let choice = Select::with_theme(&self.theme)
                .items(&["Go to the form", "Quit"])
                .default(0)
                .interact()?;
            return Ok(if choice == 0 { View::Form } else { View::Exit });
        };

        let choice = Select::with_theme(&self.theme)
            .items(&[
                "Detect emotion from a photo",
                "Download report as PDF",
                "Check again",
                "Quit",
            ])
            .default(1)
            .interact()?;
        match choice {
            0 => {
                self.emotion_view(id).await?;
                Ok(View::Results(Some(id)))
            }
            1 => Ok(View::Report(Some(id))),
            2 => {
                self.form = FormState::default();
                Ok(View::Form)
            }
            _ => Ok(View::Exit),
        }
    }

    async fn report_view(&mut self, id: Option<Uuid>) -> Result<View> {
        let Some(session) = id.and_then(|id| self.sessions.get(id)).cloned() else {
            println!("No data found. Please fill out the form first.");
            return Ok(View::Form);
        };

        let exporter = self.exporter.clone();
        // PDF assembly is CPU-bound
        let exported = tokio::task::spawn_blocking(move || exporter.export(&session)).await?;
        match exported {
            Ok(path) => println!("Report saved to {}", path.display()),
            Err(e) => {
                Confirm::with_theme(&self.theme)
                    .with_prompt(format!("Failed to generate PDF: {e}"))
                    .default(true)
                    .show_default(false)
                    .interact()?;
            }
        }
        Ok(View::Results(id))
    }

    async fn emotion_view(&mut self, id: Uuid) -> Result<()> {
        if !self.poll_classifier().await {
            println!("Loading emotion detection models... try again in a moment.");
            return Ok(());
        }
        let ClassifierSlot::Loaded(classifier) = &self.classifier else {
            return Ok(());
        };
        if !classifier.is_ready() {
            println!("Emotion detection is unavailable: model files are missing.");
            return Ok(());
        }

        let input: String = Input::with_theme(&self.theme)
            .with_prompt("Photo path")
            .interact_text()?;
        let image = PathBuf::from(input.trim());

        match observe(classifier, &image, &self.output_dir).await {
            Ok(Some(observation)) => {
                println!("\n{}", render_emotion(&observation));
                self.sessions.attach_emotion(id, observation);
            }
            Ok(None) => println!("{NO_FACE_MESSAGE}"),
            Err(e) => {
                error!("Error detecting emotion: {e}");
                println!("Error detecting emotion: {e}");
            }
        }
        Ok(())
    }

    /// Takes the loaded classifier if the background load has finished.
    /// Never waits for an unfinished load.
    async fn poll_classifier(&mut self) -> bool {
        if let ClassifierSlot::Loading(handle) = &mut self.classifier {
            if !handle.is_finished() {
                return false;
            }
            let classifier = match handle.await {
                Ok(classifier) => classifier,
                Err(e) => {
                    error!("Model loading task failed: {e}");
                    EmotionClassifier::new(Arc::new(UnavailableBackend))
                }
            };
            debug!("Classifier state: {:?}", classifier.state());
            self.classifier = ClassifierSlot::Loaded(classifier);
        }
        true
    }
}

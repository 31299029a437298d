mod api;
mod app;
mod cli;
mod config;
mod emotion;
mod error;
mod export;
mod form;
mod render;
mod session;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::AnalysisClient;
use crate::app::{build_backend, observe, App, NO_FACE_MESSAGE};
use crate::cli::{Cli, Commands};
use crate::config::ClientConfig;
use crate::emotion::EmotionClassifier;
use crate::error::ANALYSIS_FAILED_MESSAGE;
use crate::export::ReportExporter;
use crate::form::{submit, FormFields, FormState};
use crate::render::{render_emotion, render_results};
use crate::session::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::from_env()?.with_overrides(&cli)?;

    // Logs go to stderr so they never interleave with prompts and reports.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("avni v{} (api: {})", env!("CARGO_PKG_VERSION"), config.api_url);

    match cli.command.unwrap_or(Commands::Screen) {
        Commands::Screen => App::new(&config).run().await,

        Commands::Analyze {
            child_name,
            guardian_name,
            age,
            eye_contact,
            speech_level,
            social_response,
            sensory_reactions,
            photo,
            export,
        } => {
            let fields = FormFields {
                child_name,
                guardian_name,
                age,
                eye_contact: Some(eye_contact),
                speech_level: Some(speech_level),
                social_response: Some(social_response),
                sensory_reaction: Some(sensory_reactions),
            };
            let client = AnalysisClient::new(&config.api_url);
            let (submission, result) = submit(FormState::new(fields), &client)
                .await
                .map_err(|state| anyhow!(state.error().unwrap_or(ANALYSIS_FAILED_MESSAGE).to_string()))?;

            let mut sessions = SessionStore::default();
            let id = sessions.open(submission, result);

            if let Some(photo) = photo {
                let mut classifier = EmotionClassifier::new(build_backend(&config));
                classifier.load(&config.models_dir).await?;
                match observe(&classifier, &photo, &config.report_dir).await? {
                    Some(observation) => {
                        sessions.attach_emotion(id, observation);
                    }
                    None => println!("{NO_FACE_MESSAGE}"),
                }
            }

            let session = sessions.get(id).cloned();
            println!("{}", render_results(session.as_ref()));

            if let (true, Some(session)) = (export, session) {
                let exporter = ReportExporter::new(&config.report_dir);
                let path = tokio::task::spawn_blocking(move || exporter.export(&session))
                    .await?
                    .context("Failed to generate PDF")?;
                println!("Report saved to {}", path.display());
            }
            Ok(())
        }

        Commands::Emotion { image } => {
            let mut classifier = EmotionClassifier::new(build_backend(&config));
            classifier
                .load(&config.models_dir)
                .await
                .with_context(|| format!("Loading models from {}", config.models_dir.display()))?;
            match observe(&classifier, &image, &config.report_dir).await? {
                Some(observation) => println!("{}", render_emotion(&observation)),
                None => println!("{NO_FACE_MESSAGE}"),
            }
            Ok(())
        }
    }
}

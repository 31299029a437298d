//! Single-page PDF report for a session.
//!
//! The whole document is built in memory and only then written, through a
//! temporary file in the target directory that is renamed into place. A
//! failure at any step leaves no file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use image::{codecs::png::PngEncoder, imageops::FilterType, ImageEncoder};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info};

use crate::emotion::overlay::RENDER_SCALE;
use crate::session::ReportSession;

pub mod layout;
pub mod metrics;
pub mod pdf;

use layout::{image_display_size, layout_report};
use pdf::{render_pdf, EmbeddedImage};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot prepare report image: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("Cannot write report: {0}")]
    Io(#[from] std::io::Error),
}

/// `AutismReport_<name>.pdf`, each whitespace run in the trimmed name becoming
/// one underscore. Path separators are replaced too.
///
/// Leading and trailing whitespace is dropped rather than turned into `_`;
/// submitted names are already trimmed, so the trim only affects direct callers.
pub fn report_filename(child_name: &str) -> String {
    let name = child_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['/', '\\', '\0'], "_");
    if name.is_empty() {
        "AutismReport_Report.pdf".to_string()
    } else {
        format!("AutismReport_{name}.pdf")
    }
}

pub struct ReportExporter {
    out_dir: PathBuf,
}

impl ReportExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// CPU-bound; call from `spawn_blocking` in async code.
    pub fn export(&self, session: &ReportSession) -> Result<PathBuf, ExportError> {
        self.export_dated(session, Local::now().date_naive())
    }

    pub fn export_dated(
        &self,
        session: &ReportSession,
        generated_on: NaiveDate,
    ) -> Result<PathBuf, ExportError> {
        match self.build_and_write(session, generated_on) {
            Ok(path) => {
                info!("PDF written: {}", path.display());
                Ok(path)
            }
            Err(e) => {
                error!("Error generating PDF: {e}");
                Err(e)
            }
        }
    }

    fn build_and_write(
        &self,
        session: &ReportSession,
        generated_on: NaiveDate,
    ) -> Result<PathBuf, ExportError> {
        let image = match &session.emotion {
            Some(obs) => Some(prepare_image(obs.display_image())?),
            None => None,
        };
        let layout = layout_report(
            session,
            generated_on,
            image.as_ref().map(|i| (i.source_width, i.source_height)),
        );
        let title = format!("Child Assessment Report - {}", session.submission.child_name);
        let bytes = render_pdf(&layout, image.as_ref(), &title)?;

        let path = self
            .out_dir
            .join(report_filename(&session.submission.child_name));
        write_atomically(&self.out_dir, &path, &bytes)?;
        Ok(path)
    }
}

/// Resamples the photo to twice its display size and encodes it as PNG.
fn prepare_image(path: &Path) -> Result<EmbeddedImage, ExportError> {
    let photo = image::open(path)?;
    let (source_width, source_height) = (photo.width(), photo.height());
    let (w_pt, h_pt) = image_display_size(source_width, source_height);
    let scale = RENDER_SCALE as f32;
    let raster = photo
        .resize_exact(
            ((w_pt * scale).round() as u32).max(1),
            ((h_pt * scale).round() as u32).max(1),
            FilterType::Lanczos3,
        )
        .to_rgb8();

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        raster.as_raw(),
        raster.width(),
        raster.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(EmbeddedImage {
        png,
        source_width,
        source_height,
    })
}

fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ExportError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{BoundingBox, Emotion, EmotionObservation, FaceDetection};
    use avni_common::{
        AnalysisResult, EyeContact, SensoryReaction, SocialResponse, SpeechLevel, Submission,
    };
    use image::{Rgba, RgbaImage};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn session(name: &str) -> ReportSession {
        ReportSession {
            id: Uuid::new_v4(),
            submission: Submission {
                child_name: name.to_string(),
                guardian_name: "Ravi Kumar".to_string(),
                age: 5,
                eye_contact: EyeContact::Poor,
                speech_level: SpeechLevel::NonVerbal,
                social_response: SocialResponse::Withdrawn,
                sensory_reactions: SensoryReaction::Extreme,
            },
            result: AnalysisResult::parse_failure(),
            emotion: None,
        }
    }

    fn observation(image: &Path) -> EmotionObservation {
        let detection = FaceDetection {
            bounding_box: BoundingBox {
                x: 2.0,
                y: 2.0,
                width: 10.0,
                height: 10.0,
            },
            landmarks: vec![],
            expressions: BTreeMap::from([(Emotion::Happy, 0.8), (Emotion::Neutral, 0.2)]),
        };
        EmotionObservation::from_detection(&detection, image)
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    // ──────────────────────────────────────────────
    // Filenames
    // ──────────────────────────────────────────────

    #[test]
    fn test_filename_joins_whitespace_runs() {
        assert_eq!(report_filename("Aarav Kumar"), "AutismReport_Aarav_Kumar.pdf");
        assert_eq!(report_filename("  Mira \t  S  Rao "), "AutismReport_Mira_S_Rao.pdf");
    }

    #[test]
    fn test_blank_name_uses_default_filename() {
        assert_eq!(report_filename(""), "AutismReport_Report.pdf");
        assert_eq!(report_filename("   "), "AutismReport_Report.pdf");
    }

    #[test]
    fn test_filename_cannot_escape_directory() {
        assert_eq!(report_filename("../etc/x"), "AutismReport_.._etc_x.pdf");
    }

    // ──────────────────────────────────────────────
    // Export
    // ──────────────────────────────────────────────

    #[test]
    fn test_export_writes_single_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ReportExporter::new(dir.path());

        let path = exporter.export(&session("Aarav Kumar")).unwrap();

        assert_eq!(path, dir.path().join("AutismReport_Aarav_Kumar.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(dir_entries(dir.path()), vec!["AutismReport_Aarav_Kumar.pdf"]);
    }

    #[test]
    fn test_export_with_emotion_image() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("kid.png");
        RgbaImage::from_pixel(64, 48, Rgba([200, 180, 160, 255]))
            .save(&photo)
            .unwrap();
        let mut s = session("Mira");
        s.emotion = Some(observation(&photo));

        let path = ReportExporter::new(dir.path()).export(&s).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_prepared_image_is_twice_display_size() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("kid.png");
        RgbaImage::from_pixel(640, 480, Rgba([0, 0, 0, 255]))
            .save(&photo)
            .unwrap();

        let prepared = prepare_image(&photo).unwrap();

        assert_eq!((prepared.source_width, prepared.source_height), (640, 480));
        let decoded = image::load_from_memory(&prepared.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (360, 270));
    }

    #[test]
    fn test_unreadable_emotion_image_fails_without_leaving_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("kid.png");
        std::fs::write(&photo, b"definitely not a png").unwrap();
        let mut s = session("Mira");
        s.emotion = Some(observation(&photo));

        let err = ReportExporter::new(dir.path()).export(&s).unwrap_err();

        assert!(matches!(err, ExportError::Image(_)));
        assert_eq!(dir_entries(dir.path()), vec!["kid.png"]);
    }

    #[test]
    fn test_missing_output_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ReportExporter::new(dir.path().join("missing"));

        let err = exporter.export(&session("Aarav")).unwrap_err();

        assert!(matches!(err, ExportError::Io(_)));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_existing_report_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("AutismReport_Aarav.pdf");
        std::fs::write(&target, b"old").unwrap();

        ReportExporter::new(dir.path()).export(&session("Aarav")).unwrap();

        assert!(std::fs::read(&target).unwrap().starts_with(b"%PDF"));
        assert_eq!(dir_entries(dir.path()).len(), 1);
    }
}

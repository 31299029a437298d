//! Report layout in natural points, then fitted onto one A4 page.
//!
//! Coordinates inside a [`ReportLayout`] grow downward from the top-left of
//! the report block. [`fit_to_page`] maps them onto the page.

use avni_common::Submission;
use chrono::NaiveDate;

use super::metrics::{get_metrics, pdf_text, Face};
use crate::emotion::EmotionObservation;
use crate::session::ReportSession;

// ============================================
// Page geometry
// ============================================

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;

/// mm → pt (1mm = 72/25.4 pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

pub const PAGE_WIDTH_PT: f32 = A4_WIDTH_MM * MM_TO_PT;
pub const PAGE_HEIGHT_PT: f32 = A4_HEIGHT_MM * MM_TO_PT;
pub const MARGIN_PT: f32 = MARGIN_MM * MM_TO_PT;
pub const CONTENT_WIDTH_PT: f32 = PAGE_WIDTH_PT - MARGIN_PT * 2.0;
pub const CONTENT_HEIGHT_PT: f32 = PAGE_HEIGHT_PT - MARGIN_PT * 2.0;

/// Block padding, matching the on-screen card.
const PADDING: f32 = 24.0;
const LINE_HEIGHT: f32 = 1.4;
const ASCENT: f32 = 0.75;
const COLUMN_GAP: f32 = 20.0;
const CARD_PADDING: f32 = 10.0;
/// Longest side of the emotion image, in points.
pub const EMOTION_IMAGE_MAX: f32 = 180.0;

// ============================================
// Palette
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Tint {
    const fn hex(rgb: u32) -> Self {
        Self {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        }
    }

    /// Components in 0.0..=1.0.
    pub fn unit(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

pub const INK: Tint = Tint::hex(0x1f2937);
pub const BODY: Tint = Tint::hex(0x374151);
pub const MUTED: Tint = Tint::hex(0x6b7280);
pub const ACCENT: Tint = Tint::hex(0x3b82f6);
const CARD_FILL: Tint = Tint::hex(0xf9fafb);
const CARD_BORDER: Tint = Tint::hex(0xe5e7eb);
const CARD_TEXT: Tint = Tint::hex(0x4b5563);

/// Heading colour and underline colour per section.
const INFO_HEADING: (Tint, Tint) = (Tint::hex(0x1d4ed8), Tint::hex(0xbfdbfe));
const GOALS_HEADING: (Tint, Tint) = (Tint::hex(0x7c3aed), Tint::hex(0xddd6fe));
const ACTIVITIES_HEADING: (Tint, Tint) = (Tint::hex(0x0f766e), Tint::hex(0x99f6e4));
const EMOTION_HEADING: (Tint, Tint) = (Tint::hex(0xdb2777), Tint::hex(0xfbcfe8));

// ============================================
// Layout model
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        face: Face,
        tint: Tint,
        text: String,
    },
    Rule {
        x: f32,
        y: f32,
        width: f32,
        thickness: f32,
        tint: Tint,
    },
    Panel {
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        fill: Tint,
        stroke: Tint,
    },
    Image {
        x: f32,
        top: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub width: f32,
    pub height: f32,
    pub elements: Vec<Element>,
}

/// Where the layout lands on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    /// Page x of the block's left edge.
    pub left: f32,
    /// Distance from the page top to the block's top edge.
    pub top: f32,
}

impl Placement {
    pub fn page_x(&self, x: f32) -> f32 {
        self.left + x * self.scale
    }

    /// PDF y axis points up from the page bottom.
    pub fn page_y(&self, y: f32) -> f32 {
        PAGE_HEIGHT_PT - (self.top + y * self.scale)
    }

    pub fn length(&self, v: f32) -> f32 {
        v * self.scale
    }
}

/// Display size in points of an image with the given pixel size.
pub fn image_display_size(width_px: u32, height_px: u32) -> (f32, f32) {
    let (w, h) = (width_px.max(1) as f32, height_px.max(1) as f32);
    let scale = (EMOTION_IMAGE_MAX / w).min(EMOTION_IMAGE_MAX / h);
    (w * scale, h * scale)
}

/// Shrinks the block to fit inside the margins (never enlarges it) and
/// centers it horizontally, top-aligned at the margin.
pub fn fit_to_page(layout: &ReportLayout) -> Placement {
    let scale = (CONTENT_WIDTH_PT / layout.width)
        .min(CONTENT_HEIGHT_PT / layout.height)
        .min(1.0);
    let scaled_width = layout.width * scale;
    Placement {
        scale,
        left: MARGIN_PT + (CONTENT_WIDTH_PT - scaled_width) / 2.0,
        top: MARGIN_PT,
    }
}

// ============================================
// Builder
// ============================================

struct Cursor {
    width: f32,
    y: f32,
    elements: Vec<Element>,
}

impl Cursor {
    fn gap(&mut self, pt: f32) {
        self.y += pt;
    }

    fn line(&mut self, x: f32, text: &str, size: f32, face: Face, tint: Tint) {
        self.elements.push(Element::Text {
            x,
            baseline: self.y + size * ASCENT,
            size,
            face,
            tint,
            text: text.to_string(),
        });
        self.y += size * LINE_HEIGHT;
    }

    fn centered(&mut self, text: &str, size: f32, face: Face, tint: Tint) {
        let text = pdf_text(text);
        let w = get_metrics(face).width_pt(&text, size);
        self.line(((self.width - w) / 2.0).max(0.0), &text, size, face, tint);
    }

    /// Word-wrapped text whose continuation lines align with `x`.
    fn paragraph(&mut self, x: f32, max_width: f32, text: &str, size: f32, face: Face, tint: Tint) {
        for line in get_metrics(face).wrap(&pdf_text(text), size, max_width) {
            self.line(x, &line, size, face, tint);
        }
    }

    /// `lead` in bold, then `text` wrapped in the remaining width with a
    /// hanging indent.
    fn labelled(&mut self, x: f32, max_width: f32, lead: &str, text: &str, size: f32, tint: Tint) {
        let lead = pdf_text(lead);
        let lead_w = get_metrics(Face::Bold).width_pt(&format!("{lead} "), size);
        let baseline = self.y + size * ASCENT;
        self.elements.push(Element::Text {
            x,
            baseline,
            size,
            face: Face::Bold,
            tint,
            text: lead,
        });
        let start = self.y;
        self.paragraph(x + lead_w, (max_width - lead_w).max(1.0), text, size, Face::Regular, tint);
        if self.y == start {
            self.y += size * LINE_HEIGHT;
        }
    }

    fn heading(&mut self, text: &str, (color, underline): (Tint, Tint)) {
        self.line(0.0, text, 16.0, Face::Bold, color);
        self.elements.push(Element::Rule {
            x: 0.0,
            y: self.y,
            width: self.width,
            thickness: 2.0,
            tint: underline,
        });
        self.gap(12.0);
    }
}

/// `generated_on` is printed as M/D/YYYY. `image_px` is the pixel size of the
/// emotion image, when one will be embedded.
pub fn layout_report(
    session: &ReportSession,
    generated_on: NaiveDate,
    image_px: Option<(u32, u32)>,
) -> ReportLayout {
    let width = CONTENT_WIDTH_PT;
    let inner = width - PADDING * 2.0;
    let mut c = Cursor {
        width: inner,
        y: 0.0,
        elements: Vec::new(),
    };

    c.centered("Child Assessment Report", 26.0, Face::Bold, INK);
    c.gap(4.0);
    c.centered(
        &format!("Generated on: {}", generated_on.format("%-m/%-d/%Y")),
        11.0,
        Face::Regular,
        MUTED,
    );
    c.gap(8.0);
    c.elements.push(Element::Rule {
        x: (inner - 120.0) / 2.0,
        y: c.y,
        width: 120.0,
        thickness: 3.0,
        tint: ACCENT,
    });
    c.gap(28.0);

    c.heading("Child's Information", INFO_HEADING);
    layout_info(&mut c, &session.submission);
    c.gap(22.0);

    c.heading("Therapy Goals", GOALS_HEADING);
    for (i, goal) in session.result.therapy_goals.iter().enumerate() {
        c.labelled(0.0, inner, &format!("{}.", i + 1), goal, 11.0, BODY);
        c.gap(4.0);
    }
    c.gap(18.0);

    c.heading("Recommended Activities", ACTIVITIES_HEADING);
    for activity in &session.result.activities {
        layout_activity(&mut c, &activity.title, &activity.description);
        c.gap(10.0);
    }

    if let Some(emotion) = &session.emotion {
        c.gap(12.0);
        c.heading("Emotion Analysis", EMOTION_HEADING);
        layout_emotion(&mut c, emotion, image_px);
    }

    // Everything so far is relative to the padded interior.
    let elements = c
        .elements
        .into_iter()
        .map(|e| offset(e, PADDING, PADDING))
        .collect();
    ReportLayout {
        width,
        height: c.y + PADDING * 2.0,
        elements,
    }
}

fn layout_info(c: &mut Cursor, s: &Submission) {
    let age = format!("{} years", s.age);
    let items = [
        ("Child's Name:", s.child_name.as_str()),
        ("Parent/Guardian:", s.guardian_name.as_str()),
        ("Age:", age.as_str()),
        ("Eye Contact:", s.eye_contact.label()),
        ("Speech Level:", s.speech_level.label()),
        ("Social Response:", s.social_response.label()),
        ("Sensory Reactions:", s.sensory_reactions.label()),
    ];
    let column = (c.width - COLUMN_GAP) / 2.0;

    for row in items.chunks(2) {
        let top = c.y;
        let mut bottom = top;
        for (i, (label, value)) in row.iter().enumerate() {
            c.y = top;
            c.labelled(i as f32 * (column + COLUMN_GAP), column, label, value, 11.0, BODY);
            bottom = bottom.max(c.y);
        }
        c.y = bottom + 8.0;
    }
}

fn layout_activity(c: &mut Cursor, title: &str, description: &str) {
    let top = c.y;
    // The panel is drawn beneath the text, so it goes in first and gets its
    // height once the text is laid out.
    let panel_index = c.elements.len();
    c.elements.push(Element::Panel {
        x: 0.0,
        top,
        width: c.width,
        height: 0.0,
        fill: CARD_FILL,
        stroke: CARD_BORDER,
    });

    let text_width = c.width - CARD_PADDING * 2.0;
    c.gap(CARD_PADDING);
    c.paragraph(CARD_PADDING, text_width, title, 12.0, Face::Bold, INK);
    c.gap(2.0);
    c.paragraph(CARD_PADDING, text_width, description, 11.0, Face::Regular, CARD_TEXT);
    c.gap(CARD_PADDING);

    if let Some(Element::Panel { height, .. }) = c.elements.get_mut(panel_index) {
        *height = c.y - top;
    }
}

fn layout_emotion(c: &mut Cursor, emotion: &EmotionObservation, image_px: Option<(u32, u32)>) {
    let top = c.y;
    let mut text_x = 0.0;
    let mut image_bottom = top;

    if let Some((w, h)) = image_px.filter(|(w, h)| *w > 0 && *h > 0) {
        let (width, height) = image_display_size(w, h);
        c.elements.push(Element::Image {
            x: 0.0,
            top,
            width,
            height,
        });
        text_x = width + COLUMN_GAP;
        image_bottom = top + height;
    }

    let text_width = c.width - text_x;
    c.paragraph(text_x, text_width, "Dominant Emotion:", 12.0, Face::Bold, INK);
    c.paragraph(
        text_x,
        text_width,
        &format!("{} ({:.2}%)", emotion.dominant_emotion.title(), emotion.confidence),
        18.0,
        Face::Bold,
        EMOTION_HEADING.0,
    );
    c.gap(6.0);
    c.paragraph(text_x, text_width, "All Detected Emotions:", 11.0, Face::Bold, INK);
    for score in &emotion.all_emotions {
        c.labelled(
            text_x,
            text_width,
            &format!("{}:", score.emotion.title()),
            &format!("{:.2}%", score.confidence),
            10.0,
            BODY,
        );
    }
    c.y = c.y.max(image_bottom);
}

fn offset(e: Element, dx: f32, dy: f32) -> Element {
    match e {
        Element::Text {
            x,
            baseline,
            size,
            face,
            tint,
            text,
        } => Element::Text {
            x: x + dx,
            baseline: baseline + dy,
            size,
            face,
            tint,
            text,
        },
        Element::Rule {
            x,
            y,
            width,
            thickness,
            tint,
        } => Element::Rule {
            x: x + dx,
            y: y + dy,
            width,
            thickness,
            tint,
        },
        Element::Panel {
            x,
            top,
            width,
            height,
            fill,
            stroke,
        } => Element::Panel {
            x: x + dx,
            top: top + dy,
            width,
            height,
            fill,
            stroke,
        },
        Element::Image {
            x,
            top,
            width,
            height,
        } => Element::Image {
            x: x + dx,
            top: top + dy,
            width,
            height,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{BoundingBox, Emotion, FaceDetection};
    use avni_common::{Activity, AnalysisResult, EyeContact, SensoryReaction, SocialResponse, SpeechLevel};
    use std::collections::BTreeMap;
    use std::path::Path;
    use uuid::Uuid;

    fn session(goals: usize, description: &str) -> ReportSession {
        ReportSession {
            id: Uuid::new_v4(),
            submission: Submission {
                child_name: "Aarav Kumar".to_string(),
                guardian_name: "Ravi Kumar".to_string(),
                age: 5,
                eye_contact: EyeContact::Poor,
                speech_level: SpeechLevel::NonVerbal,
                social_response: SocialResponse::Withdrawn,
                sensory_reactions: SensoryReaction::Extreme,
            },
            result: AnalysisResult {
                therapy_goals: (1..=goals).map(|i| format!("Goal number {i}")).collect(),
                activities: vec![
                    Activity::new("Bubble Chase", description),
                    Activity::new("Quiet Corner", "Set up a low-stimulus retreat."),
                ],
            },
            emotion: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn texts(layout: &ReportLayout) -> Vec<&str> {
        layout
            .elements
            .iter()
            .filter_map(|e| match e {
                Element::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    // ──────────────────────────────────────────────
    // Content
    // ──────────────────────────────────────────────

    #[test]
    fn test_sections_appear_in_order() {
        let layout = layout_report(&session(3, "Blow bubbles."), date(), None);
        let t = texts(&layout);
        let pos = |needle: &str| t.iter().position(|s| *s == needle).unwrap();

        assert!(pos("Child Assessment Report") < pos("Generated on: 10/19/2026"));
        assert!(pos("Generated on: 10/19/2026") < pos("Child's Information"));
        assert!(pos("Child's Information") < pos("Therapy Goals"));
        assert!(pos("Therapy Goals") < pos("Recommended Activities"));
        assert!(!t.contains(&"Emotion Analysis"));
    }

    #[test]
    fn test_info_shows_all_seven_fields_and_age_in_years() {
        let layout = layout_report(&session(1, "x"), date(), None);
        let t = texts(&layout);
        for label in [
            "Child's Name:",
            "Parent/Guardian:",
            "Age:",
            "Eye Contact:",
            "Speech Level:",
            "Social Response:",
            "Sensory Reactions:",
        ] {
            assert!(t.contains(&label), "missing {label}");
        }
        assert!(t.contains(&"5 years"));
        assert!(t.contains(&"Non-verbal"));
    }

    #[test]
    fn test_goals_are_numbered() {
        let layout = layout_report(&session(3, "x"), date(), None);
        let t = texts(&layout);
        assert!(t.contains(&"1.") && t.contains(&"2.") && t.contains(&"3."));
        assert!(t.contains(&"Goal number 3"));
    }

    #[test]
    fn test_activity_panels_enclose_their_text() {
        let layout = layout_report(&session(1, &"long words here ".repeat(40)), date(), None);
        let panels: Vec<(f32, f32)> = layout
            .elements
            .iter()
            .filter_map(|e| match e {
                Element::Panel { top, height, .. } => Some((*top, *height)),
                _ => None,
            })
            .collect();
        assert_eq!(panels.len(), 2);
        assert!(panels[0].1 > panels[1].1, "wrapped description should grow its card");
        assert!(panels[0].0 + panels[0].1 <= panels[1].0);
    }

    #[test]
    fn test_emotion_section_with_image() {
        let detection = FaceDetection {
            bounding_box: BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            },
            landmarks: vec![],
            expressions: BTreeMap::from([(Emotion::Happy, 0.9), (Emotion::Sad, 0.1)]),
        };
        let mut s = session(3, "x");
        s.emotion = Some(EmotionObservation::from_detection(&detection, Path::new("kid.png")));

        let layout = layout_report(&s, date(), Some((640, 480)));

        let t = texts(&layout);
        assert!(t.contains(&"Emotion Analysis"));
        assert!(t.contains(&"Happy (90.00%)"));
        let image = layout
            .elements
            .iter()
            .find_map(|e| match e {
                Element::Image { width, height, .. } => Some((*width, *height)),
                _ => None,
            })
            .unwrap();
        assert!((image.0 - EMOTION_IMAGE_MAX).abs() < 1e-3);
        assert!((image.1 - 135.0).abs() < 1e-3);
    }

    // ──────────────────────────────────────────────
    // Fitting
    // ──────────────────────────────────────────────

    #[test]
    fn test_short_report_is_not_enlarged() {
        let layout = layout_report(&session(3, "Blow bubbles."), date(), None);
        let placement = fit_to_page(&layout);
        assert_eq!(placement.scale, 1.0);
        assert!((placement.left - MARGIN_PT).abs() < 1e-3);
        assert!((placement.top - MARGIN_PT).abs() < 1e-3);
    }

    #[test]
    fn test_tall_report_shrinks_and_stays_centered_within_margins() {
        let layout = layout_report(&session(60, &"many words ".repeat(200)), date(), None);
        assert!(layout.height > CONTENT_HEIGHT_PT);

        let p = fit_to_page(&layout);

        assert!(p.scale < 1.0);
        assert!((layout.height * p.scale - CONTENT_HEIGHT_PT).abs() < 1e-2);
        let right_gap = PAGE_WIDTH_PT - (p.left + layout.width * p.scale);
        assert!((p.left - right_gap).abs() < 1e-2);
        assert!(p.left >= MARGIN_PT);
        assert!(p.page_y(layout.height) >= MARGIN_PT - 1e-2);
    }

    #[test]
    fn test_every_element_lies_inside_the_block() {
        let layout = layout_report(&session(3, &"text ".repeat(100)), date(), None);
        for e in &layout.elements {
            if let Element::Text { x, size, face, text, .. } = e {
                let right = x + get_metrics(*face).width_pt(text, *size);
                assert!(right <= layout.width + 1e-2, "{text:?} overflows");
            }
        }
    }
}

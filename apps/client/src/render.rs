//! Plain-text result view.

use std::fmt::Write;

use crate::emotion::EmotionObservation;
use crate::session::ReportSession;

pub const NO_RESULTS: &str = "No results found";
const WRAP_COLUMNS: usize = 76;
const BAR_WIDTH: usize = 20;

pub fn render_results(session: Option<&ReportSession>) -> String {
    let Some(session) = session else {
        return format!("{NO_RESULTS}\nPlease fill out the screening form first.\n");
    };

    let mut out = String::new();
    let _ = writeln!(out, "Screening Results & Recommendations");
    let _ = writeln!(
        out,
        "Personalized therapy goals and activities for {}'s growth",
        session.submission.child_name
    );

    let _ = writeln!(out, "\nTherapy Goals");
    for (i, goal) in session.result.therapy_goals.iter().enumerate() {
        let marker = format!("  {}. ", i + 1);
        push_wrapped(&mut out, &marker, goal);
    }

    let _ = writeln!(out, "\nRecommended Activities");
    for activity in &session.result.activities {
        let _ = writeln!(out, "  * {}", activity.title);
        push_wrapped(&mut out, "    ", &activity.description);
    }

    if let Some(emotion) = &session.emotion {
        out.push('\n');
        out.push_str(&render_emotion(emotion));
    }
    out
}

pub fn render_emotion(obs: &EmotionObservation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Facial Emotion Analysis");
    let _ = writeln!(
        out,
        "  Dominant emotion: {} ({:.2}%)",
        obs.dominant_emotion.title(),
        obs.confidence
    );
    let _ = writeln!(out, "  Image: {}", obs.display_image().display());
    let _ = writeln!(out, "  All detected emotions:");
    for score in &obs.all_emotions {
        let filled = ((score.confidence / 100.0) * BAR_WIDTH as f64).round() as usize;
        let _ = writeln!(
            out,
            "    {:<10} {:>6.2}%  {}",
            score.emotion.label(),
            score.confidence,
            "#".repeat(filled.min(BAR_WIDTH))
        );
    }
    out
}

/// Greedy word wrap; the first line carries `marker`, continuation lines are
/// indented to match it.
fn push_wrapped(out: &mut String, marker: &str, text: &str) {
    let indent = " ".repeat(marker.chars().count());
    let width = WRAP_COLUMNS.saturating_sub(indent.len()).max(1);
    let mut line = String::new();
    let mut first = true;

    let flush = |out: &mut String, line: &str, first: &mut bool| {
        out.push_str(if *first { marker } else { &indent });
        out.push_str(line);
        out.push('\n');
        *first = false;
    };

    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            flush(out, &line, &mut first);
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() || first {
        flush(out, &line, &mut first);
    }
}

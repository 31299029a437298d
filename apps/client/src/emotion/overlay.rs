//! Draws the detection box and landmarks onto a double-resolution copy of
//! the photo.

use std::path::{Path, PathBuf};

use image::{imageops::FilterType, Rgba, RgbaImage};

use super::{ClassifierError, FaceDetection};

/// Overlays are drawn on an upscaled copy so thin lines stay crisp.
pub const RENDER_SCALE: u32 = 2;

const BOX_COLOR: Rgba<u8> = Rgba([37, 99, 235, 255]);
const LANDMARK_COLOR: Rgba<u8> = Rgba([236, 72, 153, 255]);
const BOX_THICKNESS: u32 = 2 * RENDER_SCALE;
const LANDMARK_RADIUS: i64 = RENDER_SCALE as i64;

pub fn draw_overlay(photo: &RgbaImage, detection: &FaceDetection) -> RgbaImage {
    let (w, h) = photo.dimensions();
    let mut canvas = image::imageops::resize(
        photo,
        w * RENDER_SCALE,
        h * RENDER_SCALE,
        FilterType::Triangle,
    );
    let s = RENDER_SCALE as f64;

    let b = detection.bounding_box;
    if let Some(rect) = Rect::scaled(b.x, b.y, b.x + b.width, b.y + b.height, s) {
        draw_box(&mut canvas, rect);
    }

    let r = LANDMARK_RADIUS as f64;
    for point in &detection.landmarks {
        let (cx, cy) = (point.x * s, point.y * s);
        if let Some(rect) = Rect::scaled(cx - r, cy - r, cx + r, cy + r, 1.0) {
            let clipped = rect.clip(&canvas);
            fill(&mut canvas, clipped, LANDMARK_COLOR);
        }
    }

    canvas
}

/// Inclusive pixel rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl Rect {
    /// `None` for non-finite or inverted input.
    fn scaled(x0: f64, y0: f64, x1: f64, y1: f64, s: f64) -> Option<Rect> {
        let coords = [x0 * s, y0 * s, x1 * s, y1 * s];
        if !coords.iter().all(|c| c.is_finite()) {
            return None;
        }
        // `as` saturates, so a huge coordinate stays ordered.
        let [left, top, right, bottom] = coords.map(|c| c.round() as i64);
        (left <= right && top <= bottom).then_some(Rect {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Intersection with the canvas, `None` when nothing is visible.
    fn clip(self, canvas: &RgbaImage) -> Option<Rect> {
        let max_x = canvas.width() as i64 - 1;
        let max_y = canvas.height() as i64 - 1;
        let clipped = Rect {
            left: self.left.max(0),
            top: self.top.max(0),
            right: self.right.min(max_x),
            bottom: self.bottom.min(max_y),
        };
        (clipped.left <= clipped.right && clipped.top <= clipped.bottom).then_some(clipped)
    }
}

/// Four bands of `BOX_THICKNESS` along the edges, each clipped to the canvas.
fn draw_box(canvas: &mut RgbaImage, r: Rect) {
    let t = BOX_THICKNESS as i64 - 1;
    let bands = [
        Rect { bottom: r.top.saturating_add(t), ..r },
        Rect { top: r.bottom.saturating_sub(t), ..r },
        Rect { right: r.left.saturating_add(t), ..r },
        Rect { left: r.right.saturating_sub(t), ..r },
    ];
    for band in bands {
        fill(canvas, band.clip(canvas), BOX_COLOR);
    }
}

fn fill(canvas: &mut RgbaImage, rect: Option<Rect>, color: Rgba<u8>) {
    let Some(r) = rect else { return };
    for y in r.top..=r.bottom {
        for x in r.left..=r.right {
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Writes `<stem>_annotated.png` into `out_dir` and returns its path.
pub fn save_annotated(
    photo_path: &Path,
    detection: &FaceDetection,
    out_dir: &Path,
) -> Result<PathBuf, ClassifierError> {
    let photo = image::open(photo_path)?.to_rgba8();
    let annotated = draw_overlay(&photo, detection);

    let stem = photo_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    let out_path = out_dir.join(format!("{stem}_annotated.png"));
    annotated.save(&out_path)?;
    Ok(out_path)
}

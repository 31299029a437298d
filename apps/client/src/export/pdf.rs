//! Turns a [`ReportLayout`] into PDF bytes.

use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Mm, Op, PaintMode, PdfDocument, PdfPage,
    PdfSaveOptions, Point, Polygon, PolygonRing, Pt, RawImage, Rgb, TextItem, WindingOrder,
    XObjectTransform,
};
use tracing::debug;

use super::layout::{fit_to_page, Element, Placement, ReportLayout, Tint, A4_HEIGHT_MM, A4_WIDTH_MM};
use super::metrics::Face;
use super::ExportError;

/// PNG bytes of the emotion image, already resampled for embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub png: Vec<u8>,
    /// Pixel size of the photo before resampling; drives the layout aspect.
    pub source_width: u32,
    pub source_height: u32,
}

pub fn render_pdf(
    layout: &ReportLayout,
    image: Option<&EmbeddedImage>,
    title: &str,
) -> Result<Vec<u8>, ExportError> {
    let mut doc = PdfDocument::new(title);
    let mut warnings = Vec::new();
    let placement = fit_to_page(layout);
    debug!("Fitting report at scale {:.3}", placement.scale);

    let xobject = match image {
        Some(img) => {
            let raw = RawImage::decode_from_bytes(&img.png, &mut warnings).map_err(ExportError::Pdf)?;
            let size = (raw.width as f32, raw.height as f32);
            Some((doc.add_image(&raw), size))
        }
        None => None,
    };

    let mut ops = Vec::new();
    for element in &layout.elements {
        match element {
            Element::Text {
                x,
                baseline,
                size,
                face,
                tint,
                text,
            } => {
                let font = builtin(*face);
                ops.extend([
                    Op::StartTextSection,
                    Op::SetFillColor { col: color(*tint) },
                    Op::SetFontSizeBuiltinFont {
                        size: Pt(placement.length(*size)),
                        font,
                    },
                    Op::SetTextCursor {
                        pos: point(&placement, *x, *baseline),
                    },
                    Op::WriteTextBuiltinFont {
                        items: vec![TextItem::Text(text.clone())],
                        font,
                    },
                    Op::EndTextSection,
                ]);
            }
            Element::Rule {
                x,
                y,
                width,
                thickness,
                tint,
            } => {
                ops.extend([
                    Op::SetOutlineColor { col: color(*tint) },
                    Op::SetOutlineThickness {
                        pt: Pt(placement.length(*thickness)),
                    },
                    Op::DrawLine {
                        line: Line {
                            points: vec![
                                corner(&placement, *x, *y),
                                corner(&placement, x + width, *y),
                            ],
                            is_closed: false,
                        },
                    },
                ]);
            }
            Element::Panel {
                x,
                top,
                width,
                height,
                fill,
                stroke,
            } => {
                let (l, t, r, b) = (*x, *top, x + width, top + height);
                ops.extend([
                    Op::SetFillColor { col: color(*fill) },
                    Op::SetOutlineColor { col: color(*stroke) },
                    Op::SetOutlineThickness {
                        pt: Pt(placement.length(1.0)),
                    },
                    Op::DrawPolygon {
                        polygon: Polygon {
                            rings: vec![PolygonRing {
                                points: vec![
                                    corner(&placement, l, t),
                                    corner(&placement, r, t),
                                    corner(&placement, r, b),
                                    corner(&placement, l, b),
                                ],
                            }],
                            mode: PaintMode::FillStroke,
                            winding_order: WindingOrder::NonZero,
                        },
                    },
                ]);
            }
            Element::Image {
                x,
                top,
                width,
                height,
            } => {
                let Some((id, (w_px, h_px))) = &xobject else {
                    continue;
                };
                // At 72 dpi one pixel is one point, so the scale is target/pixels.
                ops.push(Op::UseXobject {
                    id: id.clone(),
                    transform: XObjectTransform {
                        translate_x: Some(Pt(placement.page_x(*x))),
                        translate_y: Some(Pt(placement.page_y(top + height))),
                        scale_x: Some(placement.length(*width) / w_px),
                        scale_y: Some(placement.length(*height) / h_px),
                        dpi: Some(72.0),
                        ..Default::default()
                    },
                });
            }
        }
    }

    let page = PdfPage::new(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), ops);
    let bytes = doc
        .with_pages(vec![page])
        .save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        debug!("PDF assembled with {} warnings", warnings.len());
    }
    Ok(bytes)
}

fn builtin(face: Face) -> BuiltinFont {
    match face {
        Face::Regular => BuiltinFont::Helvetica,
        Face::Bold => BuiltinFont::HelveticaBold,
    }
}

fn color(tint: Tint) -> Color {
    let (r, g, b) = tint.unit();
    Color::Rgb(Rgb {
        r,
        g,
        b,
        icc_profile: None,
    })
}

fn point(placement: &Placement, x: f32, y: f32) -> Point {
    Point {
        x: Pt(placement.page_x(x)),
        y: Pt(placement.page_y(y)),
    }
}

fn corner(placement: &Placement, x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: point(placement, x, y),
        bezier: false,
    }
}

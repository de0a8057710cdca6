//! UFO export
//!
//! Writes a merged font spec as a UFO source so it can be opened and edited
//! in a font editor. Outlines keep whatever curve type they were built from.

use crate::build::assembler::{name_id, MergedFontSpec};
use crate::merge::glyph_set::GlyphRecord;
use anyhow::{Context, Result};
use kurbo::{BezPath, PathEl, Point};
use norad::{Contour, ContourPoint, Font, PointType};
use std::path::Path;

/// Save `spec` as a UFO directory at `path`
pub fn write_ufo(spec: &MergedFontSpec, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let font = to_norad_font(spec);
    font.save(path)
        .with_context(|| format!("Failed to save UFO {}", path.display()))?;
    tracing::info!("Exported {} glyphs to {}", spec.glyph_count(), path.display());
    Ok(())
}

/// Convert a spec to a norad font
pub fn to_norad_font(spec: &MergedFontSpec) -> Font {
    let mut font = Font::new();

    let info = &mut font.font_info;
    info.family_name = Some(spec.family_name.clone());
    info.style_name = Some(spec.style_name.clone());
    info.postscript_font_name = Some(spec.postscript_name.clone());
    if let Some(units_per_em) =
        norad::fontinfo::NonNegativeIntegerOrFloat::new(f64::from(spec.units_per_em))
    {
        info.units_per_em = Some(units_per_em);
    }
    info.ascender = Some(spec.ascender);
    info.descender = Some(spec.descender);
    info.x_height = spec.x_height;
    info.cap_height = spec.cap_height;
    info.postscript_is_fixed_pitch = Some(spec.fixed_pitch);
    info.copyright = spec.naming.get(name_id::COPYRIGHT).map(str::to_string);
    info.open_type_name_unique_id = spec.naming.get(name_id::UNIQUE_ID).map(str::to_string);
    info.open_type_name_manufacturer = spec.naming.get(name_id::MANUFACTURER).map(str::to_string);
    info.open_type_name_description = spec.naming.get(name_id::DESCRIPTION).map(str::to_string);
    info.open_type_name_license = spec.naming.get(name_id::LICENSE).map(str::to_string);

    let layer = font.default_layer_mut();
    for record in &spec.glyphs {
        layer.insert_glyph(to_norad_glyph(record));
    }
    font
}

fn to_norad_glyph(record: &GlyphRecord) -> norad::Glyph {
    let mut glyph = norad::Glyph::new(&record.name);
    glyph.width = record.advance_width;
    if let Some(ch) = record.codepoint.and_then(char::from_u32) {
        glyph.codepoints.insert(ch);
    }
    glyph.contours = to_norad_contours(&record.outline);
    glyph
}

/// Split a path into UFO contours
///
/// A closed contour starts at its first on-curve point, typed by the segment
/// that closes back onto it.
pub fn to_norad_contours(path: &BezPath) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mut points: Vec<ContourPoint> = Vec::new();
    let mut start = Point::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                if !points.is_empty() {
                    contours.push(open_contour(std::mem::take(&mut points)));
                }
                start = p;
                points.push(point(p, PointType::Move));
            }
            PathEl::LineTo(p) => points.push(point(p, PointType::Line)),
            PathEl::QuadTo(c, p) => {
                points.push(point(c, PointType::OffCurve));
                points.push(point(p, PointType::QCurve));
            }
            PathEl::CurveTo(c1, c2, p) => {
                points.push(point(c1, PointType::OffCurve));
                points.push(point(c2, PointType::OffCurve));
                points.push(point(p, PointType::Curve));
            }
            PathEl::ClosePath => {
                if !points.is_empty() {
                    contours.push(closed_contour(std::mem::take(&mut points), start));
                }
            }
        }
    }
    if !points.is_empty() {
        contours.push(open_contour(points));
    }
    contours
}

fn point(p: Point, typ: PointType) -> ContourPoint {
    ContourPoint::new(p.x, p.y, typ, false, None, None)
}

fn open_contour(points: Vec<ContourPoint>) -> Contour {
    Contour::new(points, None)
}

fn closed_contour(mut points: Vec<ContourPoint>, start: Point) -> Contour {
    let ends_at_start = points.len() > 1
        && points
            .last()
            .map(|last| last.typ != PointType::OffCurve && last.x == start.x && last.y == start.y)
            .unwrap_or(false);

    let closing = if ends_at_start {
        points.pop().map(|last| last.typ).unwrap_or(PointType::Line)
    } else {
        PointType::Line
    };
    if let Some(first) = points.first_mut() {
        first.typ = closing;
    }
    Contour::new(points, None)
}

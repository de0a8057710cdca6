//! Glyph outline utilities
//!
//! Outlines travel through the merge pipeline as kurbo `BezPath`s. This module
//! collects them from parsed fonts, rescales them between em sizes, and turns
//! cubic curves into the quadratic segments a `glyf` table can hold.

use kurbo::{Affine, BezPath, CubicBez, PathEl, Point, Rect, Shape};

/// Maximum deviation (in font units) allowed when approximating cubics
pub const QUADRATIC_ACCURACY: f64 = 1.0;

/// Pen that records a skrifa outline into a kurbo path
#[derive(Default)]
pub struct BezPathPen {
    path: BezPath,
}

impl BezPathPen {
    pub fn into_path(self) -> BezPath {
        self.path
    }
}

impl skrifa::outline::OutlinePen for BezPathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to(point(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to(point(x, y));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.path.quad_to(point(cx0, cy0), point(x, y));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path
            .curve_to(point(cx0, cy0), point(cx1, cy1), point(x, y));
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}

fn point(x: f32, y: f32) -> Point {
    Point::new(f64::from(x), f64::from(y))
}

/// Uniformly scale an outline around the origin
pub fn scale_path(path: &BezPath, factor: f64) -> BezPath {
    if factor == 1.0 {
        return path.clone();
    }
    let mut scaled = path.clone();
    scaled.apply_affine(Affine::scale(factor));
    scaled
}

/// Whether the outline draws nothing
pub fn is_empty(path: &BezPath) -> bool {
    !path
        .elements()
        .iter()
        .any(|el| !matches!(el, PathEl::MoveTo(_) | PathEl::ClosePath))
}

/// Bounding box of a non-empty outline
pub fn bounds(path: &BezPath) -> Option<Rect> {
    if is_empty(path) {
        None
    } else {
        Some(path.bounding_box())
    }
}

/// Replace every cubic segment with a run of quadratic segments
pub fn to_quadratic(path: &BezPath, accuracy: f64) -> BezPath {
    let mut out = BezPath::new();
    let mut current = Point::ZERO;
    let mut start = Point::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                out.move_to(p);
                current = p;
                start = p;
            }
            PathEl::LineTo(p) => {
                out.line_to(p);
                current = p;
            }
            PathEl::QuadTo(c, p) => {
                out.quad_to(c, p);
                current = p;
            }
            PathEl::CurveTo(c1, c2, p) => {
                for (_, _, quad) in CubicBez::new(current, c1, c2, p).to_quads(accuracy) {
                    out.quad_to(quad.p1, quad.p2);
                }
                current = p;
            }
            PathEl::ClosePath => {
                out.close_path();
                current = start;
            }
        }
    }
    out
}

/// Copy an outline into the kurbo types the `glyf` encoder takes
pub fn to_glyf_path(path: &BezPath) -> glyf_kurbo::BezPath {
    fn pt(p: Point) -> glyf_kurbo::Point {
        glyf_kurbo::Point::new(p.x, p.y)
    }

    let mut out = glyf_kurbo::BezPath::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(c, p) => out.quad_to(pt(c), pt(p)),
            PathEl::CurveTo(c1, c2, p) => out.curve_to(pt(c1), pt(c2), pt(p)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Upper bound on (contours, points) for a quadratic outline
pub fn contour_stats(path: &BezPath) -> (usize, usize) {
    path.elements()
        .iter()
        .fold((0, 0), |(contours, points), el| match el {
            PathEl::MoveTo(_) => (contours + 1, points + 1),
            PathEl::LineTo(_) => (contours, points + 1),
            PathEl::QuadTo(..) => (contours, points + 2),
            PathEl::CurveTo(..) => (contours, points + 3),
            PathEl::ClosePath => (contours, points),
        })
}

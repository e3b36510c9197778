//! Fit and align helpers
//!
//! Compute the transform that scales an item and places it inside a
//! destination rectangle.

use lumen_core::{Affine2D, Point, Rect, Size};

use crate::align::Alignment;
use crate::text::Text;

/// Iteration cap for the wrap width search
const MAX_WRAP_ITERATIONS: u32 = 128;

/// Wrap width search stops once the interval is this narrow
const WRAP_TOLERANCE: f32 = 0.5;

/// How an item is scaled into its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizeFit {
    /// Scale down if too big, never up
    #[default]
    ShrinkToFit,
    /// Scale each constrained axis independently to match the destination
    StretchToFit,
    /// Uniformly scale down if too big, or up if too small
    AutoFit,
}

/// Which destination axes constrain the scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DimensionFit {
    X,
    Y,
    #[default]
    Uniform,
}

/// Per-axis scale factors for fitting `item` into `dst`
pub fn fit_scale(size_fit: SizeFit, dim_fit: DimensionFit, item: Size, dst: Size) -> Point {
    let ratio = |d: f32, i: f32| if i > 0.0 { d / i } else { 1.0 };
    let rx = ratio(dst.width, item.width);
    let ry = ratio(dst.height, item.height);

    if size_fit == SizeFit::StretchToFit {
        return match dim_fit {
            DimensionFit::X => Point::new(rx, 1.0),
            DimensionFit::Y => Point::new(1.0, ry),
            DimensionFit::Uniform => Point::new(rx, ry),
        };
    }

    let s = match dim_fit {
        DimensionFit::X => rx,
        DimensionFit::Y => ry,
        DimensionFit::Uniform => rx.min(ry),
    };
    let s = match size_fit {
        SizeFit::ShrinkToFit => s.min(1.0),
        _ => s,
    };
    Point::splat(s)
}

/// Transform placing an item occupying `item` (in its own space) into `dst`
pub fn align_and_fit_rect(
    align: Alignment,
    item: Rect,
    dst: &Rect,
    size_fit: SizeFit,
    dim_fit: DimensionFit,
) -> Affine2D {
    let s = fit_scale(size_fit, dim_fit, item.size, dst.size);
    let scaled = Size::new(item.width() * s.x, item.height() * s.y);
    let fx = align.horizontal.fraction();
    let fy = align.vertical.box_fraction();
    let x = dst.x() + (dst.width() - scaled.width) * fx;
    let y = dst.y() + (dst.height() - scaled.height) * fy;

    Affine2D::translation(x, y)
        .then(&Affine2D::scale(s.x, s.y))
        .then(&Affine2D::translation(-item.x(), -item.y()))
}

/// Transform placing an item of `size` with its top-left at the origin
pub fn align_and_fit_item(
    align: Alignment,
    size: Size,
    dst: &Rect,
    size_fit: SizeFit,
    dim_fit: DimensionFit,
) -> Affine2D {
    align_and_fit_rect(align, size.to_rect(), dst, size_fit, dim_fit)
}

/// Transform placing laid out text into `dst` using the text's own alignment
pub fn align_and_fit_text(
    text: &mut Text,
    dst: &Rect,
    size_fit: SizeFit,
    dim_fit: DimensionFit,
) -> Affine2D {
    let bounds = text.bounds();
    align_and_fit_rect(text.alignment(), bounds, dst, size_fit, dim_fit)
}

/// Like [`align_and_fit_text`], but first searches for the wrap width whose
/// fitted result is as wide as `dst`
///
/// Narrower wrapping adds lines, which lowers the scale allowed by the
/// destination height, which in turn changes the rendered width, so the
/// width is found by bisection. Leaves the text wrapped at the chosen width.
pub fn align_wrap_and_fit_text(
    text: &mut Text,
    dst: &Rect,
    size_fit: SizeFit,
    dim_fit: DimensionFit,
) -> Affine2D {
    text.set_max_width(0.0);
    let natural = text.width();
    if natural <= 0.0 || dst.width() <= 0.0 {
        return align_and_fit_text(text, dst, size_fit, dim_fit);
    }

    // `hi` always wraps wide enough for the fit to be width bound
    let (mut lo, mut hi) = (0.0f32, natural);
    let mut iterations = 0;
    while iterations < MAX_WRAP_ITERATIONS && hi - lo > WRAP_TOLERANCE {
        iterations += 1;
        let mid = (lo + hi) * 0.5;
        text.set_max_width(mid);
        let bounds = text.bounds();
        let s = fit_scale(size_fit, dim_fit, bounds.size, dst.size);
        let fitted = bounds.width() * s.x;
        if fitted + WRAP_TOLERANCE < dst.width() {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    text.set_max_width(if hi >= natural { 0.0 } else { hi });
    tracing::debug!(iterations, wrap_width = hi, "wrap width search finished");
    align_and_fit_text(text, dst, size_fit, dim_fit)
}

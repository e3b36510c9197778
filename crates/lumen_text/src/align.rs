//! Text and item alignment anchors

use lumen_core::{Point, Rect};

/// Horizontal anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchor
///
/// The first three reference the layout box, the rest reference typographic
/// lines of the laid out text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
    /// Baseline of the first line
    FirstBaseline,
    /// Baseline of the last line
    LastBaseline,
    /// Cap height of the first line
    CapHeight,
    /// x-height of the first line
    XHeight,
    /// Halfway between the first and last line medians
    Median,
}

impl VAlign {
    /// Fraction of a box's height used when no typographic lines exist
    pub fn box_fraction(&self) -> f32 {
        match self {
            VAlign::Top | VAlign::FirstBaseline | VAlign::CapHeight | VAlign::XHeight => 0.0,
            VAlign::Middle | VAlign::Median => 0.5,
            VAlign::Bottom | VAlign::LastBaseline => 1.0,
        }
    }
}

impl HAlign {
    pub fn fraction(&self) -> f32 {
        match self {
            HAlign::Left => 0.0,
            HAlign::Center => 0.5,
            HAlign::Right => 1.0,
        }
    }
}

/// Horizontal and vertical anchor pair
///
/// Laying out text with an alignment moves the anchor point to the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

impl Alignment {
    pub const TOP_LEFT: Alignment = Alignment::new(HAlign::Left, VAlign::Top);
    pub const TOP_CENTER: Alignment = Alignment::new(HAlign::Center, VAlign::Top);
    pub const TOP_RIGHT: Alignment = Alignment::new(HAlign::Right, VAlign::Top);
    pub const CENTER_LEFT: Alignment = Alignment::new(HAlign::Left, VAlign::Middle);
    pub const CENTER: Alignment = Alignment::new(HAlign::Center, VAlign::Middle);
    pub const CENTER_RIGHT: Alignment = Alignment::new(HAlign::Right, VAlign::Middle);
    pub const BOTTOM_LEFT: Alignment = Alignment::new(HAlign::Left, VAlign::Bottom);
    pub const BOTTOM_CENTER: Alignment = Alignment::new(HAlign::Center, VAlign::Bottom);
    pub const BOTTOM_RIGHT: Alignment = Alignment::new(HAlign::Right, VAlign::Bottom);
    pub const BASELINE_LEFT: Alignment = Alignment::new(HAlign::Left, VAlign::FirstBaseline);

    pub const fn new(horizontal: HAlign, vertical: VAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Anchor point on a plain box
    pub fn anchor_in(&self, rect: &Rect) -> Point {
        Point::new(
            rect.x() + rect.width() * self.horizontal.fraction(),
            rect.y() + rect.height() * self.vertical.box_fraction(),
        )
    }
}

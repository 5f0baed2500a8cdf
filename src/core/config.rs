use serde::{Deserialize, Serialize};
use std::fmt;

/// CSS reference resolution used by the canvas lookup table.
pub const CANVAS_DPI: f32 = 96.0;

const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    A5,
    A3,
    B4,
}

impl PaperSize {
    /// Paper dimensions in millimetres, portrait (width, height).
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::B4 => (250.0, 353.0),
        }
    }

    /// Canvas size in CSS pixels for a landscape sheet (width, height).
    fn landscape_px(&self) -> (u32, u32) {
        match self {
            PaperSize::A4 => (1123, 794),
            PaperSize::A5 => (794, 559),
            PaperSize::A3 => (1587, 1123),
            PaperSize::B4 => (1334, 945),
        }
    }

    pub fn canvas_px(&self, orientation: Orientation) -> (u32, u32) {
        let (w, h) = self.landscape_px();
        match orientation {
            Orientation::Landscape => (w, h),
            Orientation::Portrait => (h, w),
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
            PaperSize::A3 => "A3",
            PaperSize::B4 => "B4",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

impl Orientation {
    /// Orientation implied by a bitmap or page size.
    pub fn from_size(width: u32, height: u32) -> Self {
        if width >= height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::Landscape => write!(f, "landscape"),
        }
    }
}

/// Converts a pixel length rendered at `pixel_ratio` device pixels per CSS pixel
/// into millimetres on the printed page.
pub fn px_to_mm(px: u32, pixel_ratio: f32) -> f32 {
    px as f32 / pixel_ratio / CANVAS_DPI * MM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_landscape_is_the_base_canvas() {
        assert_eq!(PaperSize::A4.canvas_px(Orientation::Landscape), (1123, 794));
    }

    #[test]
    fn portrait_swaps_the_canvas() {
        assert_eq!(PaperSize::A4.canvas_px(Orientation::Portrait), (794, 1123));
        assert_eq!(PaperSize::B4.canvas_px(Orientation::Portrait), (945, 1334));
    }

    #[test]
    fn a4_width_maps_back_to_millimetres() {
        let mm = px_to_mm(2246, 2.0);
        assert!((mm - 297.1).abs() < 0.2, "got {}", mm);
    }

    #[test]
    fn orientation_follows_the_longer_side() {
        assert_eq!(Orientation::from_size(300, 200), Orientation::Landscape);
        assert_eq!(Orientation::from_size(200, 300), Orientation::Portrait);
    }
}

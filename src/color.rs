use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

use crate::group::Group;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
///
/// The hue wheel starts at 20° so the two-colour case is orange vs. blue
/// rather than red vs. cyan.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = 20.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.5);
            let rgb: Srgb = hsl.into_color();
            RGBColor(
                (rgb.red * 255.0).round() as u8,
                (rgb.green * 255.0).round() as u8,
                (rgb.blue * 255.0).round() as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Group colours
// ---------------------------------------------------------------------------

/// Colour per sample group, used for both points and legend.
#[derive(Debug, Clone, Copy)]
pub struct GroupColors {
    high: RGBColor,
    low: RGBColor,
}

impl Default for GroupColors {
    fn default() -> Self {
        let palette = generate_palette(Group::ALL.len());
        Self {
            high: palette[0],
            low: palette[1],
        }
    }
}

impl GroupColors {
    pub fn color_for(&self, group: Group) -> RGBColor {
        match group {
            Group::High => self.high,
            Group::Low => self.low,
        }
    }

    /// Legend entries (label → colour) in plot order.
    pub fn legend_entries(&self) -> Vec<(&'static str, RGBColor)> {
        Group::ALL
            .iter()
            .map(|g| (g.as_str(), self.color_for(*g)))
            .collect()
    }
}

use crate::config::LayoutConfig;
use crate::text_metrics::{FontStyle, FontWeight, TextMeasurer};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextBox {
    pub width: f32,
    pub height: f32,
}

/// Padded bounding box of a block of text lines. Empty input still reserves
/// one padding unit of height.
pub fn measure_lines(
    lines: &[String],
    weight: FontWeight,
    measurer: &mut dyn TextMeasurer,
    config: &LayoutConfig,
) -> TextBox {
    if lines.is_empty() {
        return TextBox {
            width: 0.0,
            height: config.padding,
        };
    }
    measurer.set_font(config, weight, FontStyle::Normal);
    let widest = lines
        .iter()
        .map(|line| measurer.text_width(line))
        .fold(0.0, f32::max);
    TextBox {
        width: (widest + 2.0 * config.padding).round(),
        height: (measurer.text_height() * lines.len() as f32 + 2.0 * config.padding).round(),
    }
}

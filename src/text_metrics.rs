use crate::config::LayoutConfig;
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use std::collections::HashMap;
use ttf_parser::Face;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Normal,
    Italic,
}

/// Reports rendered text extents for the currently selected font.
pub trait TextMeasurer {
    fn set_font(&mut self, config: &LayoutConfig, weight: FontWeight, style: FontStyle);
    fn text_width(&mut self, line: &str) -> f32;
    fn text_height(&self) -> f32;
}

/// Deterministic measurer: every character advances by `font_size * factor`.
#[derive(Debug, Clone)]
pub struct FixedWidthMeasurer {
    factor: f32,
    font_size: f32,
    leading: f32,
    bold: bool,
}

impl FixedWidthMeasurer {
    const BOLD_SCALE: f32 = 1.1;

    pub fn new(factor: f32) -> Self {
        let defaults = LayoutConfig::default();
        Self {
            factor,
            font_size: defaults.font_size,
            leading: defaults.leading,
            bold: false,
        }
    }
}

impl Default for FixedWidthMeasurer {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl TextMeasurer for FixedWidthMeasurer {
    fn set_font(&mut self, config: &LayoutConfig, weight: FontWeight, _style: FontStyle) {
        self.font_size = config.font_size;
        self.leading = config.leading;
        self.bold = weight == FontWeight::Bold;
    }

    fn text_width(&mut self, line: &str) -> f32 {
        let scale = if self.bold { Self::BOLD_SCALE } else { 1.0 };
        line.chars().count() as f32 * self.font_size * self.factor * scale
    }

    fn text_height(&self) -> f32 {
        self.leading * self.font_size
    }
}

type FaceKey = (String, FontWeight, FontStyle);

/// Measures with real font metrics resolved through the system font database.
pub struct FontMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<FaceKey, Option<FontFace>>,
    current: FaceKey,
    font_size: f32,
    leading: f32,
}

impl FontMeasurer {
    pub fn new() -> Self {
        let defaults = LayoutConfig::default();
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
            current: (defaults.font.clone(), FontWeight::Normal, FontStyle::Normal),
            font_size: defaults.font_size,
            leading: defaults.leading,
        }
    }

    /// Uses an explicit font database instead of the system fonts.
    pub fn with_database(db: Database) -> Self {
        Self {
            db,
            loaded_system_fonts: true,
            ..Self::new()
        }
    }

    fn load_face(&mut self, key: &FaceKey) -> Option<FontFace> {
        let (family_list, weight, style) = key;
        let names: Vec<String> = family_list
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|name| !name.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" => Family::SansSerif,
                "monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(name.as_str()),
            })
            .collect();
        families.push(Family::SansSerif);

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: match weight {
                FontWeight::Normal => Weight::NORMAL,
                FontWeight::Bold => Weight::BOLD,
            },
            stretch: Stretch::Normal,
            style: match style {
                FontStyle::Normal => Style::Normal,
                FontStyle::Italic => Style::Italic,
            },
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

impl Default for FontMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasurer for FontMeasurer {
    fn set_font(&mut self, config: &LayoutConfig, weight: FontWeight, style: FontStyle) {
        self.current = (config.font.clone(), weight, style);
        self.font_size = config.font_size;
        self.leading = config.leading;
    }

    fn text_width(&mut self, line: &str) -> f32 {
        if line.is_empty() || self.font_size <= 0.0 {
            return 0.0;
        }
        let key = self.current.clone();
        if !self.faces.contains_key(&key) {
            let face = self.load_face(&key);
            if face.is_none() {
                log::debug!(family = key.0.as_str(); "no font face found, using estimated widths");
            }
            self.faces.insert(key.clone(), face);
        }
        let font_size = self.font_size;
        let bold = key.1 == FontWeight::Bold;
        match self.faces.get_mut(&key).and_then(Option::as_mut) {
            Some(face) => face.measure_width(line, font_size),
            None => estimate_width(line, font_size, bold),
        }
    }

    fn text_height(&self) -> f32 {
        self.leading * self.font_size
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    advances: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1);
        Some(Self {
            data,
            index,
            units_per_em,
            advances: HashMap::new(),
        })
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * 0.56;
        let missing: Vec<char> = text
            .chars()
            .filter(|ch| !self.advances.contains_key(ch))
            .collect();
        if !missing.is_empty() {
            let face = Face::parse(&self.data, self.index).ok();
            for ch in missing {
                let advance = face.as_ref().and_then(|face| {
                    face.glyph_index(ch)
                        .and_then(|glyph| face.glyph_hor_advance(glyph))
                });
                self.advances.insert(ch, advance);
            }
        }
        let width: f32 = text
            .chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| match self.advances.get(&ch).copied().flatten() {
                Some(advance) if advance > 0 => advance as f32 * scale,
                _ => fallback,
            })
            .sum();
        width.max(0.0)
    }
}

fn estimate_width(text: &str, font_size: f32, bold: bool) -> f32 {
    let scale = if bold { 1.08 } else { 1.0 };
    text.chars().map(char_width_factor).sum::<f32>() * font_size * scale
}

fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.28,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '|' | '!' | '\'' => 0.26,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '{' | '}' | '-' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.9,
        'A'..='Z' => 0.68,
        '0'..='9' => 0.56,
        _ if ch.is_ascii() => 0.52,
        _ => 1.0,
    }
}

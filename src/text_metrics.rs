use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Advance width of `text` in the first installed family of `font_family`
/// (a CSS-style, comma separated list). `None` when no font resolves.
pub fn measure_text_width(
    text: &str,
    font_size: f32,
    font_family: &str,
    font_weight: u16,
) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family, font_weight)
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<(String, u16), Option<FontFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(
        &mut self,
        text: &str,
        font_size: f32,
        font_family: &str,
        font_weight: u16,
    ) -> Option<f32> {
        let key = (normalize_family_key(font_family), font_weight);
        if !self.cache.contains_key(&key) {
            let face = self.load_face(font_family, font_weight);
            tracing::trace!(
                family = %key.0,
                weight = font_weight,
                found = face.is_some(),
                "resolved font face"
            );
            self.cache.insert(key.clone(), face);
        }
        let face = self.cache.get_mut(&key)?.as_mut()?;
        face.measure_width(text, font_size)
    }

    fn load_face(&mut self, font_family: &str, font_weight: u16) -> Option<FontFace> {
        #[derive(Clone, Copy)]
        enum FamilyToken {
            Generic(Family<'static>),
            Name(usize),
        }

        let mut names: Vec<String> = Vec::new();
        let mut order: Vec<FamilyToken> = Vec::new();
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            let token = match raw.to_ascii_lowercase().as_str() {
                "serif" => FamilyToken::Generic(Family::Serif),
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    FamilyToken::Generic(Family::SansSerif)
                }
                "monospace" | "ui-monospace" => FamilyToken::Generic(Family::Monospace),
                "cursive" => FamilyToken::Generic(Family::Cursive),
                "fantasy" => FamilyToken::Generic(Family::Fantasy),
                _ => {
                    names.push(raw.to_string());
                    FamilyToken::Name(names.len() - 1)
                }
            };
            order.push(token);
        }
        if order.is_empty() {
            order.push(FamilyToken::Generic(Family::SansSerif));
        }
        let families: Vec<Family<'_>> = order
            .iter()
            .map(|token| match *token {
                FamilyToken::Generic(family) => family,
                FamilyToken::Name(idx) => Family::Name(names[idx].as_str()),
            })
            .collect();

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight(font_weight),
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        let mut loaded: Option<FontFace> = None;
        self.db.with_face_data(id, |data, index| {
            loaded = FontFace::new(data.to_vec(), index);
        });
        loaded
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascii_advances: [u16; 128],
    char_cache: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        Some(Self {
            data,
            index,
            units_per_em,
            ascii_advances,
            char_cache: HashMap::new(),
        })
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * 0.56;
        let advance_width = |advance: u16| {
            if advance == 0 {
                fallback
            } else {
                advance as f32 * scale
            }
        };

        if text.is_ascii() {
            let width: f32 = text
                .bytes()
                .filter(|b| *b != b'\n')
                .map(|b| advance_width(self.ascii_advances[b as usize]))
                .sum();
            return Some(width.max(0.0));
        }

        let missing: Vec<char> = text
            .chars()
            .filter(|ch| !ch.is_ascii() && !self.char_cache.contains_key(ch))
            .collect();
        if !missing.is_empty() {
            let face = Face::parse(&self.data, self.index).ok()?;
            for ch in missing {
                let advance = face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph));
                self.char_cache.insert(ch, advance);
            }
        }

        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = if ch.is_ascii() {
                Some(self.ascii_advances[ch as usize])
            } else {
                self.char_cache.get(&ch).copied().flatten()
            };
            width += match advance {
                Some(advance) => advance_width(advance),
                None => fallback,
            };
        }
        Some(width.max(0.0))
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_measures_zero() {
        assert_eq!(measure_text_width("", 12.0, "sans-serif", 400), Some(0.0));
        assert_eq!(measure_text_width("abc", 0.0, "sans-serif", 400), Some(0.0));
    }

    #[test]
    fn family_key_defaults_to_sans() {
        assert_eq!(normalize_family_key("  "), "sans-serif");
        assert_eq!(normalize_family_key(" Inter "), "Inter");
    }

    #[test]
    fn wider_text_measures_wider_when_fonts_exist() {
        let short = measure_text_width("ab", 12.0, "sans-serif", 400);
        let long = measure_text_width("abcdef", 12.0, "sans-serif", 400);
        if let (Some(short), Some(long)) = (short, long) {
            assert!(long > short);
        }
    }
}

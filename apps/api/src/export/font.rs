//! Metrics for the bundled DejaVu Sans, read straight from its TrueType tables.
//!
//! Only what the PDF writer needs: the Unicode character map, horizontal
//! advances, and the `head`/`hhea` values that go into the font descriptor.
//! Widths are in font units; callers scale by `units_per_em`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use thiserror::Error;

/// PostScript name used for `BaseFont` / `FontName`.
pub const FONT_NAME: &str = "DejaVuSans";

/// Drawn in place of characters the font has no glyph for.
pub const REPLACEMENT_CHAR: char = '?';

static FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static BUNDLED: Lazy<Result<TrueTypeFont, FontError>> =
    Lazy::new(|| TrueTypeFont::parse(FONT_BYTES));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontError {
    #[error("font table '{0}' is missing")]
    MissingTable(&'static str),

    #[error("font data is truncated")]
    Truncated,

    #[error("font has no Unicode character map")]
    NoUnicodeCmap,
}

#[derive(Debug)]
pub struct TrueTypeFont {
    data: &'static [u8],
    units_per_em: u16,
    /// xMin, yMin, xMax, yMax
    bbox: [i16; 4],
    ascender: i16,
    descender: i16,
    advances: Vec<u16>,
    glyphs: HashMap<char, u16>,
}

impl TrueTypeFont {
    /// The embedded DejaVu Sans, parsed once per process.
    pub fn bundled() -> Result<&'static TrueTypeFont, FontError> {
        BUNDLED.as_ref().map_err(Clone::clone)
    }

    fn parse(data: &'static [u8]) -> Result<Self, FontError> {
        let head = find_table(data, "head")?;
        let hhea = find_table(data, "hhea")?;
        let hmtx = find_table(data, "hmtx")?;
        let cmap = find_table(data, "cmap")?;

        let metric_count = read_u16(hhea, 34)? as usize;
        let advances = (0..metric_count)
            .map(|i| read_u16(hmtx, i * 4))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            data,
            units_per_em: read_u16(head, 18)?,
            bbox: [
                read_i16(head, 36)?,
                read_i16(head, 38)?,
                read_i16(head, 40)?,
                read_i16(head, 42)?,
            ],
            ascender: read_i16(hhea, 4)?,
            descender: read_i16(hhea, 6)?,
            advances,
            glyphs: read_cmap(cmap)?,
        })
    }

    /// The raw font program, embedded as `FontFile2`.
    pub fn data(&self) -> &'static [u8] {
        self.data
    }

    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.glyphs.get(&c).copied()
    }

    /// Glyph for `c`, or for `REPLACEMENT_CHAR` when the font lacks one.
    /// Returns the character actually drawn alongside the glyph id.
    pub fn glyph_or_replacement(&self, c: char) -> (u16, char) {
        match self.glyph_id(c) {
            Some(glyph) => (glyph, c),
            None => (
                self.glyph_id(REPLACEMENT_CHAR).unwrap_or(0),
                REPLACEMENT_CHAR,
            ),
        }
    }

    /// Advance width in font units. Glyphs past the last long metric share its advance.
    pub fn advance(&self, glyph: u16) -> u16 {
        self.advances
            .get(glyph as usize)
            .or_else(|| self.advances.last())
            .copied()
            .unwrap_or(0)
    }

    /// Rendered width of `text` in points at `size_pt`.
    pub fn text_width(&self, text: &str, size_pt: f64) -> f64 {
        let units: u64 = text
            .chars()
            .map(|c| u64::from(self.advance(self.glyph_or_replacement(c).0)))
            .sum();
        units as f64 * size_pt / f64::from(self.units_per_em)
    }

    /// Font units scaled to the 1/1000 em glyph space PDF font dictionaries use.
    pub fn to_glyph_space(&self, units: i32) -> i64 {
        (f64::from(units) * 1000.0 / f64::from(self.units_per_em)).round() as i64
    }

    pub fn glyph_width(&self, glyph: u16) -> i64 {
        self.to_glyph_space(i32::from(self.advance(glyph)))
    }

    pub fn bbox(&self) -> [i64; 4] {
        self.bbox.map(|v| self.to_glyph_space(i32::from(v)))
    }

    pub fn ascent(&self) -> i64 {
        self.to_glyph_space(i32::from(self.ascender))
    }

    pub fn descent(&self) -> i64 {
        self.to_glyph_space(i32::from(self.descender))
    }
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, FontError> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(FontError::Truncated)
}

fn read_i16(data: &[u8], offset: usize) -> Result<i16, FontError> {
    read_u16(data, offset).map(|v| v as i16)
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, FontError> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(FontError::Truncated)
}

fn find_table(data: &'static [u8], tag: &'static str) -> Result<&'static [u8], FontError> {
    let count = read_u16(data, 4)? as usize;
    for i in 0..count {
        let record = 12 + i * 16;
        let entry = data.get(record..record + 16).ok_or(FontError::Truncated)?;
        if &entry[..4] == tag.as_bytes() {
            let offset = read_u32(data, record + 8)? as usize;
            let length = read_u32(data, record + 12)? as usize;
            return data
                .get(offset..offset + length)
                .ok_or(FontError::Truncated);
        }
    }
    Err(FontError::MissingTable(tag))
}

/// Unicode → glyph id, preferring the full-range format 12 subtable over the
/// BMP-only format 4.
fn read_cmap(cmap: &[u8]) -> Result<HashMap<char, u16>, FontError> {
    let mut segmented = None;
    let mut grouped = None;

    let count = read_u16(cmap, 2)? as usize;
    for i in 0..count {
        let record = 4 + i * 8;
        let platform = read_u16(cmap, record)?;
        let encoding = read_u16(cmap, record + 2)?;
        let is_unicode = platform == 0 || (platform == 3 && matches!(encoding, 1 | 10));
        if !is_unicode {
            continue;
        }

        let offset = read_u32(cmap, record + 4)? as usize;
        let subtable = cmap.get(offset..).ok_or(FontError::Truncated)?;
        match read_u16(subtable, 0)? {
            4 => segmented = segmented.or(Some(subtable)),
            12 => grouped = grouped.or(Some(subtable)),
            _ => {}
        }
    }

    match (grouped, segmented) {
        (Some(table), _) => read_cmap_groups(table),
        (None, Some(table)) => read_cmap_segments(table),
        (None, None) => Err(FontError::NoUnicodeCmap),
    }
}

fn read_cmap_segments(table: &[u8]) -> Result<HashMap<char, u16>, FontError> {
    let seg_count = read_u16(table, 6)? as usize / 2;
    let ends = 14;
    // skip reservedPad
    let starts = ends + seg_count * 2 + 2;
    let deltas = starts + seg_count * 2;
    let range_offsets = deltas + seg_count * 2;

    let mut glyphs = HashMap::new();
    for seg in 0..seg_count {
        let end = read_u16(table, ends + seg * 2)?;
        let start = read_u16(table, starts + seg * 2)?;
        let delta = read_u16(table, deltas + seg * 2)?;
        let range_offset_at = range_offsets + seg * 2;
        let range_offset = read_u16(table, range_offset_at)? as usize;

        for code in start..=end {
            if code == 0xFFFF {
                continue;
            }
            let glyph = if range_offset == 0 {
                code.wrapping_add(delta)
            } else {
                let index_at = range_offset_at + range_offset + usize::from(code - start) * 2;
                match read_u16(table, index_at)? {
                    0 => 0,
                    glyph => glyph.wrapping_add(delta),
                }
            };
            if glyph == 0 {
                continue;
            }
            if let Some(c) = char::from_u32(u32::from(code)) {
                glyphs.entry(c).or_insert(glyph);
            }
        }
    }
    Ok(glyphs)
}

fn read_cmap_groups(table: &[u8]) -> Result<HashMap<char, u16>, FontError> {
    let group_count = read_u32(table, 12)? as usize;

    let mut glyphs = HashMap::new();
    for group in 0..group_count {
        let record = 16 + group * 12;
        let start = read_u32(table, record)?;
        let end = read_u32(table, record + 4)?;
        let first_glyph = read_u32(table, record + 8)?;

        for code in start..=end {
            let Some(c) = char::from_u32(code) else {
                continue;
            };
            match u16::try_from(first_glyph + (code - start)) {
                Ok(glyph) if glyph != 0 => {
                    glyphs.entry(c).or_insert(glyph);
                }
                _ => {}
            }
        }
    }
    Ok(glyphs)
}

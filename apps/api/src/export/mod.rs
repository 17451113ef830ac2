//! PDF Renderer: turns generated plain text into a downloadable, ATS-friendly PDF.
//!
//! DejaVu Sans 11pt on A4 with 1" margins, wrapped by measured glyph width,
//! paginated. The font is embedded as a Type0/Identity-H font with a ToUnicode
//! map, so any script the font covers prints and stays extractable. Presentation
//! only; nothing in the generation pipeline depends on it.

pub mod font;
pub mod handlers;

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;
use textwrap::WordSeparator;
use thiserror::Error;

use self::font::{FontError, TrueTypeFont, FONT_NAME};

const PAGE_WIDTH_PT: i64 = 595;
const PAGE_HEIGHT_PT: i64 = 842;
const MARGIN_PT: i64 = 72;
const FONT_SIZE_PT: i64 = 11;
const LEADING_PT: i64 = 14;
const TAB_WIDTH: usize = 4;

const TEXT_WIDTH_PT: f64 = (PAGE_WIDTH_PT - 2 * MARGIN_PT) as f64;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT_PT - 2 * MARGIN_PT) / LEADING_PT) as usize;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to encode page content: {0}")]
    Encode(#[from] lopdf::Error),

    #[error("failed to load font: {0}")]
    Font(#[from] FontError),

    #[error("failed to write PDF: {0}")]
    Write(String),
}

/// Renders `text` into PDF bytes. `title` goes into the document info dictionary.
/// Empty text still yields a valid single blank page.
pub fn render_pdf(text: &str, title: &str) -> Result<Vec<u8>, PdfError> {
    let font = TrueTypeFont::bundled()?;
    let lines = layout_lines(font, text);
    let mut glyphs = GlyphEncoder::new(font);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids: Vec<Object> = Vec::new();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![&lines[..]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };
    for chunk in chunks {
        let page_id = add_page(&mut doc, pages_id, chunk, &mut glyphs)?;
        page_ids.push(page_id.into());
    }

    embed_font(&mut doc, font_id, &glyphs);

    let page_count = page_ids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            PAGE_WIDTH_PT.into(),
            PAGE_HEIGHT_PT.into(),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => lopdf::text_string(title),
        "Producer" => Object::string_literal("tailor-api"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(buffer)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    lines: &[String],
    glyphs: &mut GlyphEncoder,
) -> Result<ObjectId, PdfError> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE_PT.into()]),
        Operation::new("TL", vec![LEADING_PT.into()]),
        Operation::new(
            "Td",
            vec![MARGIN_PT.into(), (PAGE_HEIGHT_PT - MARGIN_PT).into()],
        ),
    ];
    for line in lines {
        if !line.is_empty() {
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(glyphs.encode(line), StringFormat::Hexadecimal)],
            ));
        }
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Writes the Type0 font, its CID descendant, descriptor, font file and
/// ToUnicode map. Widths are listed only for glyphs the pages use.
fn embed_font(doc: &mut Document, font_id: ObjectId, glyphs: &GlyphEncoder) {
    let font = glyphs.font;

    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => font.data().len() as i64 },
        font.data().to_vec(),
    ));
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => FONT_NAME,
        // nonsymbolic
        "Flags" => 32,
        "FontBBox" => font.bbox().into_iter().map(Object::Integer).collect::<Vec<_>>(),
        "ItalicAngle" => 0,
        "Ascent" => font.ascent(),
        "Descent" => font.descent(),
        "CapHeight" => font.ascent(),
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    let widths: Vec<Object> = glyphs
        .used
        .keys()
        .flat_map(|&glyph| {
            [
                Object::Integer(i64::from(glyph)),
                Object::Array(vec![Object::Integer(font.glyph_width(glyph))]),
            ]
        })
        .collect();
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => FONT_NAME,
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(Stream::new(
        dictionary! {},
        to_unicode_cmap(&glyphs.used).into_bytes(),
    ));
    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => FONT_NAME,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        }),
    );
}

/// Turns text into 2-byte glyph ids (Identity-H), remembering which character
/// each glyph stands for.
struct GlyphEncoder {
    font: &'static TrueTypeFont,
    used: BTreeMap<u16, char>,
}

impl GlyphEncoder {
    fn new(font: &'static TrueTypeFont) -> Self {
        Self {
            font,
            used: BTreeMap::new(),
        }
    }

    fn encode(&mut self, text: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let (glyph, drawn) = self.font.glyph_or_replacement(c);
            self.used.entry(glyph).or_insert(drawn);
            bytes.extend_from_slice(&glyph.to_be_bytes());
        }
        bytes
    }
}

fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let entries: Vec<(&u16, &char)> = used.iter().collect();
    // bfchar blocks hold at most 100 entries
    for block in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", block.len()));
        for (glyph, c) in block {
            let utf16: String = c
                .encode_utf16(&mut [0; 2])
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            cmap.push_str(&format!("<{glyph:04X}> <{utf16}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

/// A word measured in points, for first-fit wrapping.
#[derive(Debug)]
struct MeasuredWord<'a> {
    text: &'a str,
    whitespace: &'a str,
    width: f64,
    whitespace_width: f64,
}

impl Fragment for MeasuredWord<'_> {
    fn width(&self) -> f64 {
        self.width
    }

    fn whitespace_width(&self) -> f64 {
        self.whitespace_width
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

/// Splits text into printable lines: tabs expanded, long lines wrapped to the
/// text width by measured glyph advances, blank lines kept. Trailing blank
/// lines are dropped.
fn layout_lines(font: &TrueTypeFont, text: &str) -> Vec<String> {
    let size = FONT_SIZE_PT as f64;
    let mut lines = Vec::new();

    for line in text.lines() {
        let expanded = line.replace('\t', &" ".repeat(TAB_WIDTH));
        let expanded = expanded.trim_end();
        if expanded.is_empty() {
            lines.push(String::new());
            continue;
        }

        let words: Vec<MeasuredWord> = WordSeparator::AsciiSpace
            .find_words(expanded)
            .flat_map(|word| {
                let pieces = split_to_width(font, word.word);
                let last = pieces.len() - 1;
                pieces.into_iter().enumerate().map(move |(i, piece)| {
                    // only the final piece of a split word is followed by whitespace
                    let whitespace = if i == last { word.whitespace } else { "" };
                    MeasuredWord {
                        text: piece,
                        whitespace,
                        width: font.text_width(piece, size),
                        whitespace_width: font.text_width(whitespace, size),
                    }
                })
            })
            .collect();

        for wrapped in wrap_first_fit(&words, &[TEXT_WIDTH_PT]) {
            let mut joined = String::new();
            for (i, word) in wrapped.iter().enumerate() {
                joined.push_str(word.text);
                if i + 1 < wrapped.len() {
                    joined.push_str(word.whitespace);
                }
            }
            lines.push(joined);
        }
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// Breaks a word wider than the text width into pieces that fit.
fn split_to_width<'a>(font: &TrueTypeFont, word: &'a str) -> Vec<&'a str> {
    let size = FONT_SIZE_PT as f64;
    if font.text_width(word, size) <= TEXT_WIDTH_PT {
        return vec![word];
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    let mut width = 0.0;
    for (at, c) in word.char_indices() {
        let advance = font.text_width(c.encode_utf8(&mut [0; 4]), size);
        if width + advance > TEXT_WIDTH_PT && at > start {
            pieces.push(&word[start..at]);
            start = at;
            width = 0.0;
        }
        width += advance;
    }
    pieces.push(&word[start..]);
    pieces
}

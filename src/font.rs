use crate::{
    refs::{ObjectReferences, RefType},
    PdfError, Pt,
};
use id_arena::Id;
use owned_ttf_parser::{AsFaceRef, OwnedFace};
use pdf_writer::{
    types::{CidFontType, FontFlags, SystemInfo},
    Filter, Finish, Name, Pdf, Ref, Str,
};
use std::collections::BTreeMap;

/// The shared base font of a document.
///
/// By default this is the standard PDF Helvetica font, which every viewer ships and
/// which therefore doesn't need embedding. Text drawn with it is encoded using
/// WinAnsiEncoding, so characters outside of that set are replaced with `?`.
///
/// Alternatively a TrueType font can be loaded and embedded in its entirety, which
/// lifts the character set restriction at the cost of file size.
pub struct Font {
    kind: FontKind,
}

enum FontKind {
    Helvetica,
    TrueType(OwnedFace),
}

// Helvetica AFM metrics, in 1/1000 em
const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// Widths of WinAnsi codes 0x20..=0x7E
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];

/// Widths of WinAnsi codes 0xA0..=0xFF, which coincide with Latin-1
const HELVETICA_LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xF0
];

/// Map a character onto its WinAnsiEncoding byte, if it has one
fn win_ansi_byte(ch: char) -> Option<u8> {
    match ch {
        ' '..='~' | '\u{A0}'..='\u{FF}' => Some(ch as u32 as u8),
        '€' => Some(0x80),
        '…' => Some(0x85),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '™' => Some(0x99),
        _ => None,
    }
}

fn helvetica_width(code: u8) -> u16 {
    match code {
        0x20..=0x7E => HELVETICA_ASCII_WIDTHS[(code - 0x20) as usize],
        0xA0..=0xFF => HELVETICA_LATIN1_WIDTHS[(code - 0xA0) as usize],
        0x85 | 0x97 | 0x99 => 1000,
        0x91 | 0x92 => 222,
        0x93 | 0x94 => 333,
        0x95 => 350,
        _ => HELVETICA_DEFAULT_WIDTH,
    }
}

/// Text drawn on a single line never carries control characters
fn single_line(ch: char) -> char {
    if ch.is_control() {
        ' '
    } else {
        ch
    }
}

impl Font {
    /// The standard Helvetica font
    pub fn helvetica() -> Font {
        Font {
            kind: FontKind::Helvetica,
        }
    }

    /// Load a TrueType / OpenType font from raw bytes, returning an error if the font
    /// could not be parsed or has no unicode character map
    pub fn load(bytes: Vec<u8>) -> Result<Font, PdfError> {
        let face = OwnedFace::from_vec(bytes, 0)?;
        let has_unicode_cmap = face
            .as_face_ref()
            .tables()
            .cmap
            .map(|cmap| cmap.subtables.into_iter().any(|table| table.is_unicode()))
            .unwrap_or(false);
        if !has_unicode_cmap {
            return Err(PdfError::UnusableFont("unicode cmap"));
        }

        Ok(Font {
            kind: FontKind::TrueType(face),
        })
    }

    fn scaling(&self, size: Pt) -> Pt {
        match &self.kind {
            FontKind::Helvetica => size / 1000.0,
            FontKind::TrueType(face) => size / face.as_face_ref().units_per_em() as f32,
        }
    }

    /// Calculate the width of a single line of text at the given font size
    pub fn width_of_text(&self, text: &str, size: Pt) -> Pt {
        let scaling = self.scaling(size);
        match &self.kind {
            FontKind::Helvetica => text
                .chars()
                .map(|ch| win_ansi_byte(single_line(ch)).unwrap_or(b'?'))
                .map(|code| scaling * helvetica_width(code) as f32)
                .sum(),
            FontKind::TrueType(face) => text
                .chars()
                .map(|ch| self.glyph_id(single_line(ch)))
                .map(|gid| {
                    scaling
                        * face
                            .as_face_ref()
                            .glyph_hor_advance(owned_ttf_parser::GlyphId(gid))
                            .unwrap_or_default() as f32
                })
                .sum(),
        }
    }

    /// Encode a single line of text into the bytes a `Tj` operator expects for this font
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match &self.kind {
            FontKind::Helvetica => text
                .chars()
                .map(|ch| win_ansi_byte(single_line(ch)).unwrap_or(b'?'))
                .collect(),
            FontKind::TrueType(_) => text
                .chars()
                .flat_map(|ch| self.glyph_id(single_line(ch)).to_be_bytes())
                .collect(),
        }
    }

    /// Glyph used to draw `ch`, falling back to the replacement character, then `?`,
    /// then the `.notdef` glyph
    fn glyph_id(&self, ch: char) -> u16 {
        let FontKind::TrueType(face) = &self.kind else {
            return 0;
        };
        let face = face.as_face_ref();
        face.glyph_index(ch)
            .or_else(|| face.glyph_index('\u{FFFD}'))
            .or_else(|| face.glyph_index('?'))
            .map(|gid| gid.0)
            .unwrap_or(0)
    }

    pub(crate) fn write(
        &self,
        refs: &mut ObjectReferences,
        id: Id<Font>,
        writer: &mut Pdf,
    ) -> Result<(), PdfError> {
        let font_index = id.index();
        let font_id = refs.gen(RefType::Font(font_index));

        match &self.kind {
            FontKind::Helvetica => {
                writer
                    .type1_font(font_id)
                    .base_font(Name(b"Helvetica"))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
            FontKind::TrueType(face) => {
                let cid_font_id = write_cid(face, refs, font_index, writer)?;
                let to_unicode_id = write_to_unicode(face, refs, font_index, writer)?;

                let mut font = writer.type0_font(font_id);
                font.base_font(Name(format!("F{font_index}").as_bytes()));
                font.encoding_predefined(Name(b"Identity-H"));
                font.descendant_font(cid_font_id);
                font.to_unicode(to_unicode_id);
            }
        }

        Ok(())
    }
}

/// Every (glyph id -> char) pair reachable through the font's unicode cmaps
fn glyph_chars(face: &OwnedFace) -> Result<BTreeMap<u16, char>, PdfError> {
    let cmap = face
        .as_face_ref()
        .tables()
        .cmap
        .ok_or(PdfError::UnusableFont("cmap"))?;

    let mut map: BTreeMap<u16, char> = BTreeMap::new();
    for subtable in cmap.subtables.into_iter().filter(|table| table.is_unicode()) {
        subtable.codepoints(|codepoint: u32| {
            if let Ok(ch) = char::try_from(codepoint) {
                if let Some(index) = subtable.glyph_index(codepoint).filter(|index| index.0 > 0) {
                    map.entry(index.0).or_insert(ch);
                }
            }
        });
    }

    Ok(map)
}

fn write_cid(
    face: &OwnedFace,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Result<Ref, PdfError> {
    let font_descriptor_id = write_descriptor(face, refs, font_index, writer);
    let id = refs.gen(RefType::CidFont(font_index));

    let face_ref = face.as_face_ref();
    let scaling = 1000.0 / face_ref.units_per_em() as f32;
    let widths: Vec<(u16, f32)> = glyph_chars(face)?
        .keys()
        .map(|&gid| {
            let advance = face_ref
                .glyph_hor_advance(owned_ttf_parser::GlyphId(gid))
                .unwrap_or_default();
            (gid, advance as f32 * scaling)
        })
        .collect();

    let mut cid_font = writer.cid_font(id);
    cid_font.subtype(CidFontType::Type2);
    cid_font.base_font(Name(format!("F{font_index}").as_bytes()));
    cid_font.system_info(SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    });
    cid_font.font_descriptor(font_descriptor_id);
    cid_font.default_width(1000.0);

    // glyph ids are sorted, so split them into runs of consecutive ids
    let mut cid_widths = cid_font.widths();
    let mut run_start: Option<u16> = None;
    let mut run: Vec<f32> = Vec::new();
    for (gid, width) in widths {
        match run_start {
            Some(start) if start as usize + run.len() == gid as usize => run.push(width),
            _ => {
                if let Some(start) = run_start {
                    cid_widths.consecutive(start, run.drain(..));
                }
                run_start = Some(gid);
                run.push(width);
            }
        }
    }
    if let Some(start) = run_start {
        cid_widths.consecutive(start, run.drain(..));
    }
    cid_widths.finish();

    cid_font.cid_to_gid_map_predefined(Name(b"Identity"));
    Ok(id)
}

fn write_descriptor(
    face: &OwnedFace,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Ref {
    let data_id = refs.gen(RefType::FontData(font_index));
    let data = face.as_slice();
    writer
        .stream(data_id, data)
        .pair(Name(b"Length1"), data.len() as i32);

    let face_ref = face.as_face_ref();
    let scaling = 1000.0 / face_ref.units_per_em() as f32;
    let bbox = face_ref.global_bounding_box();

    let id = refs.gen(RefType::FontDescriptor(font_index));
    let mut descriptor = writer.font_descriptor(id);
    descriptor.name(Name(format!("F{font_index}").as_bytes()));

    let mut flags = FontFlags::NON_SYMBOLIC;
    if face_ref.is_monospaced() {
        flags.set(FontFlags::FIXED_PITCH, true);
    }
    if face_ref.is_italic() {
        flags.set(FontFlags::ITALIC, true);
    }
    descriptor.flags(flags);
    descriptor.bbox(pdf_writer::Rect {
        x1: bbox.x_min as f32 * scaling,
        y1: bbox.y_min as f32 * scaling,
        x2: bbox.x_max as f32 * scaling,
        y2: bbox.y_max as f32 * scaling,
    });
    descriptor.italic_angle(if face_ref.is_italic() { -12.0 } else { 0.0 });
    descriptor.ascent(face_ref.ascender() as f32 * scaling);
    descriptor.descent(face_ref.descender() as f32 * scaling);
    descriptor.cap_height(
        face_ref
            .capital_height()
            .map(|h| h as f32 * scaling)
            .unwrap_or(700.0),
    );
    // TODO: derive the stem width from the OS/2 weight class instead of a fixed guess
    descriptor.stem_v(80.0);
    descriptor.font_file2(data_id);

    id
}

fn write_to_unicode(
    face: &OwnedFace,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Result<Ref, PdfError> {
    let id = refs.gen(RefType::ToUnicode(font_index));

    let mut map = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo\n\
         << /Registry (Adobe)\n\
         /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    // bfchar blocks are limited to 100 entries each
    let ids: Vec<(u16, char)> = glyph_chars(face)?.into_iter().collect();
    for block in ids.chunks(100) {
        map.push_str(&format!("{} beginbfchar\n", block.len()));
        for &(gid, ch) in block {
            let mut utf16 = [0u16; 2];
            let units: String = ch
                .encode_utf16(&mut utf16)
                .iter()
                .map(|unit| format!("{unit:04x}"))
                .collect();
            map.push_str(&format!("<{gid:04x}> <{units}>\n"));
        }
        map.push_str("endbfchar\n");
    }
    map.push_str("endcmap CMapName currentdict /CMap defineresource pop end end\n");

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(
        map.as_bytes(),
        miniz_oxide::deflate::CompressionLevel::DefaultLevel as u8,
    );
    writer
        .stream(id, compressed.as_slice())
        .filter(Filter::FlateDecode);

    Ok(id)
}

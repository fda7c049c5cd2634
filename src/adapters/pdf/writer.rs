//! Minimal PDF 1.4 object writer.
//!
//! Produces single-page documents with the standard Helvetica fonts and
//! optional JPEG images. Content streams are left uncompressed and no
//! timestamps or ids are written, so output is byte-for-byte reproducible.
//!
//! The standard fonts only carry WinAnsi glyphs. Text outside that set is
//! drawn transliterated and wrapped in an `/ActualText` span holding the
//! original string, so extraction and search still see the exact text.

use std::fmt::Write as _;

/// Width and height of an A4 page in points.
pub const A4: (f32, f32) = (595.0, 842.0);

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);

    pub fn gray(level: f32) -> Self {
        Rgb(level, level, level)
    }
}

/// Standard fonts registered on every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    /// Approximate advance width of `text` at `size`, in points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| glyph_width(c, *self)).sum();
        units as f32 * size / 1000.0
    }
}

/// Helvetica advance widths (1/1000 em) for the characters invoices use.
fn glyph_width(c: char, font: Font) -> u32 {
    let bold = font == Font::Bold;
    match c {
        '0'..='9' => 556,
        ' ' | ',' | '.' | ':' => 278,
        '-' => 333,
        '@' => if bold { 975 } else { 1015 },
        'I' | 'i' | 'l' | 'j' => if bold { 278 } else { 222 },
        'm' | 'M' | 'W' => 833,
        'w' => if bold { 778 } else { 722 },
        'f' | 't' | 'r' => 333,
        'A'..='Z' => if bold { 722 } else { 667 },
        'a'..='z' => if bold { 611 } else { 556 },
        _ => 556,
    }
}

/// Dimensions and colour model of a baseline or progressive JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u16,
    pub height: u16,
    pub components: u8,
}

impl JpegInfo {
    /// Reads the first start-of-frame segment. Returns `None` for anything
    /// that is not a JPEG this writer can embed.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
            return None;
        }
        let mut i = 2;
        while i + 9 < bytes.len() {
            if bytes[i] != 0xFF {
                return None;
            }
            let marker = bytes[i + 1];
            if marker == 0xFF {
                i += 1;
                continue;
            }
            let len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
            let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
            if is_sof {
                let height = u16::from_be_bytes([bytes[i + 5], bytes[i + 6]]);
                let width = u16::from_be_bytes([bytes[i + 7], bytes[i + 8]]);
                let components = bytes[i + 9];
                if width == 0 || height == 0 || !matches!(components, 1 | 3 | 4) {
                    return None;
                }
                return Some(Self {
                    width,
                    height,
                    components,
                });
            }
            if len < 2 {
                return None;
            }
            i += 2 + len;
        }
        None
    }

    fn color_space(&self) -> &'static str {
        match self.components {
            1 => "/DeviceGray",
            4 => "/DeviceCMYK",
            _ => "/DeviceRGB",
        }
    }
}

/// Page content stream builder.
#[derive(Debug, Default)]
pub struct Content {
    ops: String,
}

impl Content {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `text` with its baseline starting at (`x`, `y`).
    pub fn text(&mut self, font: Font, size: f32, x: f32, y: f32, color: Rgb, text: &str) {
        let encoded = encode(text);
        if !encoded.exact {
            tracing::warn!(
                original = %text,
                drawn = %encoded.shown,
                "Text outside WinAnsi drawn transliterated"
            );
            let _ = write!(self.ops, "/Span << /ActualText <{}> >> BDC ", utf16_hex(text));
        }
        let _ = write!(
            self.ops,
            "BT {} {} {} rg /{} {} Tf {} {} Td ({}) Tj ET",
            num(color.0),
            num(color.1),
            num(color.2),
            font.resource_name(),
            num(size),
            num(x),
            num(y),
            encoded.literal
        );
        if !encoded.exact {
            self.ops.push_str(" EMC");
        }
        self.ops.push('\n');
    }

    /// Draws `text` so that it ends at `right`.
    pub fn text_right(&mut self, font: Font, size: f32, right: f32, y: f32, color: Rgb, text: &str) {
        let x = right - font.text_width(text, size);
        self.text(font, size, x, y, color, text);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let _ = writeln!(
            self.ops,
            "{} {} {} rg {} {} {} {} re f",
            num(color.0),
            num(color.1),
            num(color.2),
            num(x),
            num(y),
            num(w),
            num(h)
        );
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgb) {
        let _ = writeln!(
            self.ops,
            "{} {} {} RG {} w {} {} m {} {} l S",
            num(color.0),
            num(color.1),
            num(color.2),
            num(width),
            num(x1),
            num(y1),
            num(x2),
            num(y2)
        );
    }

    /// Paints the page image `/Im1` into the given box.
    pub fn image(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let _ = writeln!(
            self.ops,
            "q {} 0 0 {} {} {} cm /Im1 Do Q",
            num(w),
            num(h),
            num(x),
            num(y)
        );
    }

    fn into_bytes(self) -> Vec<u8> {
        self.ops.into_bytes()
    }
}

/// A JPEG to place on the page.
pub struct PageImage<'a> {
    pub info: JpegInfo,
    pub data: &'a [u8],
}

/// Assembles a complete single-page document.
pub fn single_page(content: Content, image: Option<PageImage<'_>>) -> Vec<u8> {
    let mut objects: Vec<Vec<u8>> = Vec::new();

    // 1 catalog, 2 pages, 3 page, 4 regular font, 5 bold font, 6 contents, 7 image
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    objects.push(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec());

    let xobject = if image.is_some() {
        " /XObject << /Im1 7 0 R >>"
    } else {
        ""
    };
    objects.push(
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 4 0 R /F2 5 0 R >>{} >> /Contents 6 0 R >>",
            num(A4.0),
            num(A4.1),
            xobject
        )
        .into_bytes(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );
    objects.push(stream(String::new(), &content.into_bytes()));

    if let Some(image) = image {
        let dict = format!(
            " /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} \
             /BitsPerComponent 8 /Filter /DCTDecode",
            image.info.width,
            image.info.height,
            image.info.color_space()
        );
        objects.push(stream(dict, image.data));
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_at = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(xref, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    );
    out.extend_from_slice(xref.as_bytes());
    out
}

fn stream(extra_dict: String, data: &[u8]) -> Vec<u8> {
    let mut body = format!("<<{} /Length {} >>\nstream\n", extra_dict, data.len()).into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(b"\nendstream");
    body
}

/// Formats a coordinate with at most two decimals and no trailing zeros.
fn num(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// A string prepared for a WinAnsi literal.
struct Encoded {
    /// Escaped literal body.
    literal: String,
    /// What a reader sees, before escaping.
    shown: String,
    /// False when any character had to be substituted.
    exact: bool,
}

/// Base letters for U+0100..=U+017F (Latin Extended-A), in code point order.
const LATIN_EXTENDED_A: &str = "AaAaAaCcCcCcCcDdDdEeEeEeEeEeGgGgGgGgHhHhIiIiIiIiIiIiJjKkk\
LlLlLlLlLlNnNnNnnNnOoOoOoOoRrRrRrSsSsSsSsTtTtTtUuUuUuUuUuUuWwYyYZzZzZzs";

/// WinAnsi code for characters outside Latin-1 that the encoding still has.
fn win_ansi_extra(c: char) -> Option<u8> {
    Some(match c {
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017d}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203a}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017e}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    })
}

/// Nearest drawable character for one that WinAnsi lacks.
fn transliterate(c: char) -> char {
    match c as u32 {
        0x100..=0x17F => LATIN_EXTENDED_A
            .chars()
            .nth(c as usize - 0x100)
            .unwrap_or('?'),
        0x2010..=0x2012 | 0x2212 => '-',
        0x2000..=0x200A | 0x202F => ' ',
        _ => '?',
    }
}

/// Encodes `text` for a PDF literal in WinAnsi encoding.
fn encode(text: &str) -> Encoded {
    let mut literal = String::with_capacity(text.len());
    let mut shown = String::with_capacity(text.len());
    let mut exact = true;
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                literal.push('\\');
                literal.push(c);
                shown.push(c);
            }
            ' '..='~' => {
                literal.push(c);
                shown.push(c);
            }
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(literal, "\\{:03o}", c as u32);
                shown.push(c);
            }
            _ => match win_ansi_extra(c) {
                Some(code) => {
                    let _ = write!(literal, "\\{:03o}", code);
                    shown.push(c);
                }
                None => {
                    let base = transliterate(c);
                    literal.push(base);
                    shown.push(base);
                    exact = false;
                }
            },
        }
    }
    Encoded {
        literal,
        shown,
        exact,
    }
}

/// UTF-16BE with byte order mark, as a PDF hex string body.
fn utf16_hex(text: &str) -> String {
    let mut out = String::from("FEFF");
    for unit in text.encode_utf16() {
        let _ = write!(out, "{:04X}", unit);
    }
    out
}

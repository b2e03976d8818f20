/*!
 * Font decoding for text extraction.
 *
 * Character codes are mapped to Unicode through the font's ToUnicode CMap
 * when it has one, else through `/Differences` glyph names and the WinAnsi
 * encoding. Glyph widths drive the text position between show operators.
 */

use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;

use super::{deref, dict_get, name_of, number};

// @const: Width in glyph units used when a font gives none
const FALLBACK_WIDTH: f64 = 500.0;

// @const: WinAnsi code points of bytes 0x80..=0x9F (0 = undefined)
const WIN_ANSI_80: [u16; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0, 0x017D, 0,
    0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E,
    0x0178,
];

/// Character of a byte in the WinAnsi encoding
pub fn win_ansi_char(b: u8) -> Option<char> {
    match b {
        0x80..=0x9F => match WIN_ANSI_80[(b - 0x80) as usize] {
            0 => None,
            cp => char::from_u32(cp as u32),
        },
        _ => Some(b as char),
    }
}

/// Unicode text of a glyph name from an encoding's `/Differences`
pub fn glyph_name_text(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32).map(String::from);
        }
    }
    if name.chars().count() == 1 {
        return Some(name.to_string());
    }
    let text = match name {
        "space" => " ",
        "hyphen" | "minus" => "-",
        "period" => ".",
        "comma" => ",",
        "colon" => ":",
        "semicolon" => ";",
        "quoteright" => "\u{2019}",
        "quoteleft" => "\u{2018}",
        "quotedblleft" => "\u{201C}",
        "quotedblright" => "\u{201D}",
        "quotesingle" => "'",
        "endash" => "\u{2013}",
        "emdash" => "\u{2014}",
        "bullet" => "\u{2022}",
        "ellipsis" => "\u{2026}",
        "fi" => "fi",
        "fl" => "fl",
        "ff" => "ff",
        "ffi" => "ffi",
        "ffl" => "ffl",
        "parenleft" => "(",
        "parenright" => ")",
        "slash" => "/",
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        _ => return None,
    };
    Some(text.to_string())
}

fn utf16be(bytes: &[u8]) -> String {
    let units = bytes.chunks(2).map(|c| match c {
        [hi, lo] => u16::from_be_bytes([*hi, *lo]),
        [b] => *b as u16,
        _ => 0,
    });
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'<' if data.get(i + 1) != Some(&b'<') => {
                let end = data[i..].iter().position(|&b| b == b'>').map(|p| i + p).unwrap_or(data.len());
                let digits: Vec<u8> = data[i + 1..end].iter().copied().filter(u8::is_ascii_hexdigit).collect();
                let bytes = digits
                    .chunks(2)
                    .map(|pair| {
                        let s = std::str::from_utf8(pair).unwrap_or("0");
                        let v = u8::from_str_radix(s, 16).unwrap_or(0);
                        if pair.len() == 1 { v << 4 } else { v }
                    })
                    .collect();
                tokens.push(Token::Hex(bytes));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len() && !data[i].is_ascii_whitespace() && !matches!(data[i], b'<' | b'[' | b']' | b'%') {
                    i += 1;
                }
                if i == start {
                    i += 1;
                    continue;
                }
                tokens.push(Token::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
            }
        }
    }
    tokens
}

/// A parsed ToUnicode CMap
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicode {
    /// Bytes per character code, from the first code space range
    pub code_len: Option<usize>,
    map: HashMap<u32, String>,
}

impl ToUnicode {
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut cmap = ToUnicode::default();
        let mut i = 0;

        while i < tokens.len() {
            let Token::Word(word) = &tokens[i] else {
                i += 1;
                continue;
            };
            i += 1;
            match word.as_str() {
                "begincodespacerange" => {
                    if let Some(Token::Hex(lo)) = tokens.get(i) {
                        cmap.code_len.get_or_insert(lo.len().max(1));
                    }
                }
                "beginbfchar" => {
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) = (tokens.get(i), tokens.get(i + 1)) {
                        cmap.map.insert(code_of(src), utf16be(dst));
                        i += 2;
                    }
                }
                "beginbfrange" => loop {
                    let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) = (tokens.get(i), tokens.get(i + 1)) else {
                        break;
                    };
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    i += 2;
                    match tokens.get(i) {
                        Some(Token::Hex(dst)) => {
                            let base = dst.clone();
                            for (offset, code) in (lo..=hi.min(lo.saturating_add(0xFFFF))).enumerate() {
                                let mut bytes = base.clone();
                                if let Some(last) = bytes.len().checked_sub(2) {
                                    let unit = u16::from_be_bytes([bytes[last], bytes[last + 1]]).wrapping_add(offset as u16);
                                    bytes[last..].copy_from_slice(&unit.to_be_bytes());
                                }
                                cmap.map.insert(code, utf16be(&bytes));
                            }
                            i += 1;
                        }
                        Some(Token::ArrayStart) => {
                            i += 1;
                            let mut code = lo;
                            while let Some(Token::Hex(dst)) = tokens.get(i) {
                                if code <= hi {
                                    cmap.map.insert(code, utf16be(dst));
                                }
                                code += 1;
                                i += 1;
                            }
                            if tokens.get(i) == Some(&Token::ArrayEnd) {
                                i += 1;
                            }
                        }
                        _ => break,
                    }
                },
                _ => {}
            }
        }
        cmap
    }

    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Widths {
    Simple { first: u32, widths: Vec<f64>, missing: f64 },
    Cid { default: f64, map: HashMap<u32, f64> },
}

/// One decoded character code
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    /// Advance in glyph units (1/1000 em)
    pub width: f64,
    /// Single-byte code 32, which takes word spacing
    pub is_space: bool,
}

/// What text extraction needs from a font resource
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    to_unicode: Option<ToUnicode>,
    composite: bool,
    differences: HashMap<u32, String>,
    widths: Widths,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            to_unicode: None,
            composite: false,
            differences: HashMap::new(),
            widths: Widths::Simple {
                first: 0,
                widths: Vec::new(),
                missing: FALLBACK_WIDTH,
            },
        }
    }
}

fn numbers(doc: &Document, obj: Option<&Object>) -> Vec<f64> {
    match obj.map(|o| deref(doc, o)) {
        Some(Object::Array(items)) => items.iter().map(|o| number(deref(doc, o)).unwrap_or(0.0)).collect(),
        _ => Vec::new(),
    }
}

fn cid_widths(doc: &Document, w: Option<&Object>) -> HashMap<u32, f64> {
    let mut map = HashMap::new();
    let Some(Object::Array(items)) = w.map(|o| deref(doc, o)) else {
        return map;
    };
    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(deref(doc, &items[i])) else {
            break;
        };
        match items.get(i + 1).map(|o| deref(doc, o)) {
            Some(Object::Array(ws)) => {
                for (k, w) in ws.iter().enumerate() {
                    if let Some(w) = number(deref(doc, w)) {
                        map.insert(first as u32 + k as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (number(last), items.get(i + 2).and_then(|o| number(deref(doc, o)))) else {
                    break;
                };
                for code in first as u32..=last as u32 {
                    map.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    map
}

impl FontInfo {
    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let composite = dict_get(doc, font, b"Subtype").and_then(name_of) == Some("Type0");

        let to_unicode = match dict_get(doc, font, b"ToUnicode") {
            Some(Object::Stream(stream)) => {
                let data = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
                Some(ToUnicode::parse(&data))
            }
            _ => None,
        };

        let mut differences = HashMap::new();
        if let Some(Object::Dictionary(enc)) = dict_get(doc, font, b"Encoding") {
            if let Some(Object::Array(items)) = dict_get(doc, enc, b"Differences") {
                let mut code = 0u32;
                for item in items {
                    match deref(doc, item) {
                        Object::Name(name) => {
                            if let Some(text) = glyph_name_text(&String::from_utf8_lossy(name)) {
                                differences.insert(code, text);
                            }
                            code += 1;
                        }
                        other => {
                            if let Some(n) = number(other) {
                                code = n as u32;
                            }
                        }
                    }
                }
            }
        }

        let widths = if composite {
            let descendant = match dict_get(doc, font, b"DescendantFonts") {
                Some(Object::Array(items)) => items.first().map(|o| deref(doc, o)),
                _ => None,
            };
            match descendant {
                Some(Object::Dictionary(cid)) => Widths::Cid {
                    default: dict_get(doc, cid, b"DW").and_then(number).unwrap_or(1000.0),
                    map: cid_widths(doc, cid.get(b"W").ok()),
                },
                _ => Widths::Cid {
                    default: 1000.0,
                    map: HashMap::new(),
                },
            }
        } else {
            let base = dict_get(doc, font, b"BaseFont").and_then(name_of).unwrap_or("");
            let missing = match dict_get(doc, font, b"FontDescriptor") {
                Some(Object::Dictionary(fd)) => dict_get(doc, fd, b"MissingWidth").and_then(number),
                _ => None,
            };
            let fallback = if base.starts_with("Courier") { 600.0 } else { FALLBACK_WIDTH };
            Widths::Simple {
                first: dict_get(doc, font, b"FirstChar").and_then(number).unwrap_or(0.0) as u32,
                widths: numbers(doc, font.get(b"Widths").ok()),
                missing: missing.filter(|m| *m > 0.0).unwrap_or(fallback),
            }
        };

        Self {
            to_unicode,
            composite,
            differences,
            widths,
        }
    }

    fn code_len(&self) -> usize {
        match (&self.to_unicode, self.composite) {
            (Some(cmap), true) => cmap.code_len.unwrap_or(2),
            (_, true) => 2,
            _ => 1,
        }
    }

    fn width(&self, code: u32) -> f64 {
        match &self.widths {
            Widths::Simple { first, widths, missing } => code
                .checked_sub(*first)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .filter(|w| *w > 0.0)
                .unwrap_or(*missing),
            Widths::Cid { default, map } => map.get(&code).copied().unwrap_or(*default),
        }
    }

    fn text(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|c| c.get(code)) {
            return text.to_string();
        }
        if self.composite {
            return char::from_u32(code).filter(|c| !c.is_control()).map(String::from).unwrap_or_default();
        }
        if let Some(text) = self.differences.get(&code) {
            return text.clone();
        }
        win_ansi_char(code as u8).filter(|c| !c.is_control()).map(String::from).unwrap_or_default()
    }

    /// Split a shown string into glyphs
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        let len = self.code_len();
        bytes
            .chunks(len)
            .map(|chunk| {
                let code = code_of(chunk);
                Glyph {
                    text: self.text(code),
                    width: self.width(code),
                    is_space: len == 1 && code == 32,
                }
            })
            .collect()
    }
}

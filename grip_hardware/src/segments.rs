//! Seven-segment glyph encoding for the four-digit status display.
//!
//! Bit layout is the usual `a..g` = bits 0..6, decimal point = bit 7.

pub const DIGITS: usize = 4;

const BLANK: u8 = 0x00;

/// Segment pattern for one character; unknown characters render blank.
pub fn glyph(c: char) -> u8 {
    match c.to_ascii_uppercase() {
        '0' | 'O' => 0x3F,
        '1' => 0x06,
        '2' => 0x5B,
        '3' => 0x4F,
        '4' => 0x66,
        '5' | 'S' => 0x6D,
        '6' => 0x7D,
        '7' => 0x07,
        '8' => 0x7F,
        '9' => 0x6F,
        'A' => 0x77,
        'B' => 0x7C,
        'C' => 0x39,
        'D' => 0x5E,
        'E' => 0x79,
        'F' => 0x71,
        'H' => 0x76,
        'L' => 0x38,
        'N' => 0x54,
        'P' => 0x73,
        'R' => 0x50,
        'U' => 0x3E,
        '-' => 0x40,
        '_' => 0x08,
        _ => BLANK,
    }
}

/// Left-aligned encoding of `text`, truncated or blank-padded to four digits.
pub fn encode(text: &str) -> [u8; DIGITS] {
    let mut out = [BLANK; DIGITS];
    for (slot, c) in out.iter_mut().zip(text.chars()) {
        *slot = glyph(c);
    }
    out
}

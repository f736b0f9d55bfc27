//! Text frames rendered with a built-in 5×7 bitmap font.
//!
//! Used for short status messages ("BEEMO", "READY!", "VIBRATION
//! DETECTED!").  Lowercase letters render as uppercase; characters without
//! a glyph render as blanks.

use super::Frame;

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
/// Horizontal advance per character (glyph + 1px gap).
const ADVANCE: u32 = GLYPH_W + 1;
/// Vertical advance per line.
const LINE_HEIGHT: u32 = 10;

/// Column-major glyph data, bit 0 = top row.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        'A' => [0x7E, 0x11, 0x11, 0x11, 0x7E],
        'B' => [0x7F, 0x49, 0x49, 0x49, 0x36],
        'C' => [0x3E, 0x41, 0x41, 0x41, 0x22],
        'D' => [0x7F, 0x41, 0x41, 0x22, 0x1C],
        'E' => [0x7F, 0x49, 0x49, 0x49, 0x41],
        'F' => [0x7F, 0x09, 0x09, 0x09, 0x01],
        'G' => [0x3E, 0x41, 0x49, 0x49, 0x7A],
        'H' => [0x7F, 0x08, 0x08, 0x08, 0x7F],
        'I' => [0x00, 0x41, 0x7F, 0x41, 0x00],
        'J' => [0x20, 0x40, 0x41, 0x3F, 0x01],
        'K' => [0x7F, 0x08, 0x14, 0x22, 0x41],
        'L' => [0x7F, 0x40, 0x40, 0x40, 0x40],
        'M' => [0x7F, 0x02, 0x0C, 0x02, 0x7F],
        'N' => [0x7F, 0x04, 0x08, 0x10, 0x7F],
        'O' => [0x3E, 0x41, 0x41, 0x41, 0x3E],
        'P' => [0x7F, 0x09, 0x09, 0x09, 0x06],
        'Q' => [0x3E, 0x41, 0x51, 0x21, 0x5E],
        'R' => [0x7F, 0x09, 0x19, 0x29, 0x46],
        'S' => [0x46, 0x49, 0x49, 0x49, 0x31],
        'T' => [0x01, 0x01, 0x7F, 0x01, 0x01],
        'U' => [0x3F, 0x40, 0x40, 0x40, 0x3F],
        'V' => [0x1F, 0x20, 0x40, 0x20, 0x1F],
        'W' => [0x3F, 0x40, 0x38, 0x40, 0x3F],
        'X' => [0x63, 0x14, 0x08, 0x14, 0x63],
        'Y' => [0x07, 0x08, 0x70, 0x08, 0x07],
        'Z' => [0x61, 0x51, 0x49, 0x45, 0x43],
        '0' => [0x3E, 0x51, 0x49, 0x45, 0x3E],
        '1' => [0x00, 0x42, 0x7F, 0x40, 0x00],
        '2' => [0x42, 0x61, 0x51, 0x49, 0x46],
        '3' => [0x21, 0x41, 0x45, 0x4B, 0x31],
        '4' => [0x18, 0x14, 0x12, 0x7F, 0x10],
        '5' => [0x27, 0x45, 0x45, 0x45, 0x39],
        '6' => [0x3C, 0x4A, 0x49, 0x49, 0x30],
        '7' => [0x01, 0x71, 0x09, 0x05, 0x03],
        '8' => [0x36, 0x49, 0x49, 0x49, 0x36],
        '9' => [0x06, 0x49, 0x49, 0x29, 0x1E],
        '!' => [0x00, 0x00, 0x5F, 0x00, 0x00],
        '?' => [0x02, 0x01, 0x51, 0x09, 0x06],
        '.' => [0x00, 0x60, 0x60, 0x00, 0x00],
        ',' => [0x00, 0x50, 0x30, 0x00, 0x00],
        ':' => [0x00, 0x36, 0x36, 0x00, 0x00],
        '-' => [0x08, 0x08, 0x08, 0x08, 0x08],
        '\'' => [0x00, 0x05, 0x03, 0x00, 0x00],
        _ => [0x00; 5],
    }
}

/// Pixel width of one rendered line.
pub fn line_width(line: &str) -> u32 {
    let chars = line.chars().count() as u32;
    if chars == 0 {
        0
    } else {
        chars * ADVANCE - 1
    }
}

/// Render `message` centred on a `width × height` frame.
/// Lines are split on `\n`; text past the panel edge is clipped.
pub fn render(message: &str, width: u32, height: u32) -> Frame {
    let mut frame = Frame::blank(0, width, height);
    let lines: Vec<&str> = message.split('\n').collect();
    let block_h = (lines.len() as u32 - 1) * LINE_HEIGHT + GLYPH_H;
    let top = height.saturating_sub(block_h) / 2;

    for (row, line) in lines.iter().enumerate() {
        let left = width.saturating_sub(line_width(line)) / 2;
        let y0 = top + row as u32 * LINE_HEIGHT;
        for (col, c) in line.chars().enumerate() {
            let x0 = left + col as u32 * ADVANCE;
            for (dx, bits) in glyph(c).iter().enumerate() {
                for dy in 0..GLYPH_H {
                    if bits & (1 << dy) != 0 {
                        frame.set_pixel(x0 + dx as u32, y0 + dy, true);
                    }
                }
            }
        }
    }
    frame
}

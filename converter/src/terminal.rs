use pixelsheet_core::Rgb;

use crate::halfblock::TermCell;

const LOWER_HALF: &str = "▄";
const RESET: &[u8] = b"\x1b[0m";

/// Render half-block cells as inline 24-bit ANSI art, one line per cell row.
/// Colour escapes are only emitted when the colour changes.
pub fn render_cells(cells: &[TermCell], cols: usize, buf: &mut Vec<u8>) {
    buf.clear();
    if cols == 0 {
        return;
    }

    for line in cells.chunks(cols) {
        let mut prev: Option<TermCell> = None;
        for cell in line {
            if prev.map_or(true, |p| p.top != cell.top) {
                write_color(buf, b"48", cell.top);
            }
            if prev.map_or(true, |p| p.bottom != cell.bottom) {
                write_color(buf, b"38", cell.bottom);
            }
            prev = Some(*cell);
            buf.extend_from_slice(LOWER_HALF.as_bytes());
        }
        // Reset before the newline so the background does not bleed.
        buf.extend_from_slice(RESET);
        buf.push(b'\n');
    }
}

/// `ESC [ <layer> ; 2 ; r ; g ; b m`
fn write_color(buf: &mut Vec<u8>, layer: &[u8], rgb: Rgb) {
    buf.extend_from_slice(b"\x1b[");
    buf.extend_from_slice(layer);
    buf.extend_from_slice(b";2");
    for channel in [rgb.r, rgb.g, rgb.b] {
        buf.push(b';');
        write_u8(buf, channel);
    }
    buf.push(b'm');
}

/// Decimal digits of `v` without going through `fmt`.
fn write_u8(buf: &mut Vec<u8>, v: u8) {
    if v >= 100 {
        buf.push(b'0' + v / 100);
    }
    if v >= 10 {
        buf.push(b'0' + (v / 10) % 10);
    }
    buf.push(b'0' + v % 10);
}

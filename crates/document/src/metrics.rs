//! Glyph advance widths for the standard Helvetica faces.
//!
//! Widths are in 1/1000 em for printable ASCII (32..=126), taken from the
//! Adobe font metrics. Characters outside that range use the width of a
//! digit.

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// The two faces used in documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

impl Face {
    fn table(self) -> &'static [u16; 95] {
        match self {
            Self::Regular => &HELVETICA,
            Self::Bold => &HELVETICA_BOLD,
        }
    }

    /// Advance width of one character in 1/1000 em.
    pub fn char_width(self, c: char) -> u16 {
        let code = c as u32;
        if (32..=126).contains(&code) {
            self.table()[(code - 32) as usize]
        } else {
            FALLBACK_WIDTH
        }
    }

    /// Rendered width of `text` at `size_pt`, in millimetres.
    pub fn text_width_mm(self, text: &str, size_pt: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * size_pt / 1000.0 / PT_PER_MM
    }
}

/// Convert a font size in points to millimetres.
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / PT_PER_MM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_glyph_widths() {
        assert_eq!(Face::Regular.char_width(' '), 278);
        assert_eq!(Face::Regular.char_width('W'), 944);
        assert_eq!(Face::Regular.char_width('i'), 222);
        assert_eq!(Face::Regular.char_width('~'), 584);
        assert_eq!(Face::Bold.char_width('i'), 278);
        assert_eq!(Face::Bold.char_width('é'), 556);
    }

    #[test]
    fn width_scales_with_size() {
        // "0" is 556 units; 1000 of them at 1pt is 556pt.
        let text = "0".repeat(1000);
        let mm = Face::Regular.text_width_mm(&text, 1.0);
        assert!((mm - 556.0 / PT_PER_MM).abs() < 0.01);
        let doubled = Face::Regular.text_width_mm(&text, 2.0);
        assert!((doubled - 2.0 * mm).abs() < 0.01);
    }
}

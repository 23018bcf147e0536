//! Page geometry for the artifact document.
//!
//! All positions are millimetres measured from the top-left corner of an A4
//! page. Text positions are cell tops; the renderer converts them to PDF
//! baselines. Page 1 carries the title cell, the optional image, and the
//! body starting at a fixed offset whether or not an image is present.
//! Body lines that would cross the bottom margin continue on further pages.

use crate::metrics::{pt_to_mm, Face};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
/// Cells may not extend below this line.
pub const PAGE_BREAK_MM: f32 = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
/// Horizontal padding inside a text cell.
pub const CELL_PADDING_MM: f32 = 1.0;

pub const TITLE_SIZE_PT: f32 = 16.0;
pub const TITLE_CELL_WIDTH_MM: f32 = 200.0;
pub const TITLE_CELL_HEIGHT_MM: f32 = 10.0;

pub const IMAGE_TOP_MM: f32 = 20.0;
pub const IMAGE_WIDTH_MM: f32 = 100.0;

pub const BODY_SIZE_PT: f32 = 12.0;
pub const BODY_LINE_HEIGHT_MM: f32 = 10.0;
/// Gap between the bottom of the title cell and the first body line.
pub const BODY_GAP_MM: f32 = 85.0;
pub const BODY_TOP_MM: f32 = MARGIN_MM + TITLE_CELL_HEIGHT_MM + BODY_GAP_MM;
/// Width available to body text inside its cells.
pub const BODY_TEXT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM - 2.0 * CELL_PADDING_MM;

/// One line of text and the top-left corner of its cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// Zero-based page index.
    pub page: usize,
    pub text: String,
    /// Left edge of the glyphs.
    pub x_mm: f32,
    pub top_mm: f32,
    /// Cell height; the baseline sits in its vertical middle.
    pub height_mm: f32,
    pub size_pt: f32,
}

impl PlacedLine {
    /// Baseline distance from the top edge, centring the text in its cell.
    pub fn baseline_mm(&self) -> f32 {
        self.top_mm + self.height_mm / 2.0 + 0.3 * pt_to_mm(self.size_pt)
    }
}

/// Where the image lands on page 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x_mm: f32,
    pub top_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl ImagePlacement {
    /// Fixed-width placement keeping the pixel aspect ratio.
    pub fn for_pixels(width_px: u32, height_px: u32) -> Self {
        let height_mm = if width_px == 0 {
            0.0
        } else {
            IMAGE_WIDTH_MM * height_px as f32 / width_px as f32
        };
        Self {
            x_mm: MARGIN_MM,
            top_mm: IMAGE_TOP_MM,
            width_mm: IMAGE_WIDTH_MM,
            height_mm,
        }
    }
}

/// Title and body positions for a whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub title: PlacedLine,
    pub body: Vec<PlacedLine>,
    pub page_count: usize,
}

/// Lay out a title and body.
pub fn plan_layout(title: &str, body: &str) -> PageLayout {
    let title_width = Face::Bold.text_width_mm(title, TITLE_SIZE_PT);
    let title_x = (MARGIN_MM + (TITLE_CELL_WIDTH_MM - title_width) / 2.0).max(MARGIN_MM);

    let title = PlacedLine {
        page: 0,
        text: title.to_string(),
        x_mm: title_x,
        top_mm: MARGIN_MM,
        height_mm: TITLE_CELL_HEIGHT_MM,
        size_pt: TITLE_SIZE_PT,
    };

    let mut page = 0;
    let mut top = BODY_TOP_MM;
    let mut lines = Vec::new();
    for text in wrap_text(body, Face::Regular, BODY_SIZE_PT, BODY_TEXT_WIDTH_MM) {
        if top + BODY_LINE_HEIGHT_MM > PAGE_BREAK_MM {
            page += 1;
            top = MARGIN_MM;
        }
        lines.push(PlacedLine {
            page,
            text,
            x_mm: MARGIN_MM + CELL_PADDING_MM,
            top_mm: top,
            height_mm: BODY_LINE_HEIGHT_MM,
            size_pt: BODY_SIZE_PT,
        });
        top += BODY_LINE_HEIGHT_MM;
    }

    PageLayout {
        title,
        body: lines,
        page_count: page + 1,
    }
}

/// Greedy word wrap.
///
/// Explicit newlines always break. A line that overflows breaks at its last
/// space, which is dropped; a single word wider than the line is split
/// between characters. Carriage returns are ignored. An empty body yields no
/// lines.
pub fn wrap_text(text: &str, face: Face, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    let text = text.replace('\r', "");
    let text = text.strip_suffix('\n').unwrap_or(&text);
    if text.is_empty() {
        return Vec::new();
    }

    let max_units = max_width_mm * crate::metrics::PT_PER_MM * 1000.0 / size_pt;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let chars: Vec<char> = paragraph.chars().collect();
        let mut start = 0;
        let mut last_space: Option<usize> = None;
        let mut width = 0.0f32;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == ' ' {
                last_space = Some(i);
            }
            width += f32::from(face.char_width(c));
            if width > max_units {
                match last_space {
                    Some(space) => {
                        lines.push(chars[start..space].iter().collect());
                        i = space + 1;
                    }
                    None => {
                        let end = if i == start { i + 1 } else { i };
                        lines.push(chars[start..end].iter().collect());
                        i = end;
                    }
                }
                start = i;
                last_space = None;
                width = 0.0;
                continue;
            }
            i += 1;
        }
        lines.push(chars[start..].iter().collect());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width(text: &str) -> f32 {
        Face::Regular.text_width_mm(text, BODY_SIZE_PT)
    }

    #[test]
    fn body_starts_at_fixed_offset() {
        let layout = plan_layout("Title", "First line");
        assert_eq!(BODY_TOP_MM, 105.0);
        assert_eq!(layout.body[0].top_mm, 105.0);
        assert_eq!(layout.body[0].x_mm, 11.0);
        assert_eq!(layout.page_count, 1);
    }

    #[test]
    fn title_is_centred_in_its_cell() {
        let layout = plan_layout("The Lost Key", "");
        let w = Face::Bold.text_width_mm("The Lost Key", TITLE_SIZE_PT);
        let left = layout.title.x_mm - MARGIN_MM;
        let right = MARGIN_MM + TITLE_CELL_WIDTH_MM - (layout.title.x_mm + w);
        assert!((left - right).abs() < 0.001);
        assert_eq!(layout.title.top_mm, 10.0);
        assert!(layout.body.is_empty());
    }

    #[test]
    fn explicit_newlines_break_lines() {
        let layout = plan_layout("t", "one\ntwo\n\nfour\n");
        let texts: Vec<_> = layout.body.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "", "four"]);
        assert_eq!(layout.body[1].top_mm, 115.0);
        assert_eq!(layout.body[3].top_mm, 135.0);
    }

    #[test]
    fn long_paragraph_wraps_at_spaces_within_width() {
        let body = "the fox walked along the quiet river bank ".repeat(20);
        let lines = wrap_text(&body, Face::Regular, BODY_SIZE_PT, BODY_TEXT_WIDTH_MM);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(width(line) <= BODY_TEXT_WIDTH_MM + 0.001, "{line:?} too wide");
            assert!(!line.starts_with(' '));
        }
        let rejoined = lines.join(" ");
        assert_eq!(rejoined.trim_end(), body.trim_end());
    }

    #[test]
    fn unbroken_word_is_split_between_characters() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, Face::Regular, BODY_SIZE_PT, BODY_TEXT_WIDTH_MM);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        assert!(lines.iter().all(|l| width(l) <= BODY_TEXT_WIDTH_MM + 0.001));
    }

    #[test]
    fn overflow_continues_on_next_page_from_top_margin() {
        let body = (0..30).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let layout = plan_layout("t", &body);

        // 105 + 17 * 10 = 275; the 18th line would end at 285 > 277.
        let first_page: Vec<_> = layout.body.iter().filter(|l| l.page == 0).collect();
        assert_eq!(first_page.len(), 17);
        let continued = &layout.body[17];
        assert_eq!(continued.page, 1);
        assert_eq!(continued.top_mm, MARGIN_MM);
        assert_eq!(layout.page_count, 2);
    }

    #[test]
    fn image_keeps_aspect_ratio() {
        let square = ImagePlacement::for_pixels(256, 256);
        assert_eq!(square.width_mm, 100.0);
        assert_eq!(square.height_mm, 100.0);
        assert_eq!((square.x_mm, square.top_mm), (10.0, 20.0));

        let wide = ImagePlacement::for_pixels(512, 256);
        assert_eq!(wide.height_mm, 50.0);
    }

    #[test]
    fn baseline_is_centred_in_cell() {
        let layout = plan_layout("t", "a");
        let line = &layout.body[0];
        let expected = 105.0 + 5.0 + 0.3 * pt_to_mm(12.0);
        assert!((line.baseline_mm() - expected).abs() < 0.001);
    }
}

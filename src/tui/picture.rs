// Terminal rendering of a still: each cell shows two stacked pixels using
// the upper half block, foreground for the top pixel and background for the
// bottom one.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

const UPPER_HALF: &str = "▀";

fn cell_color(px: &image::Rgba<u8>) -> Color {
    let [r, g, b, _] = px.0;
    Color::Rgb(r, g, b)
}

/// Largest square that fits in `cols`×`rows` cells, as rendered lines.
pub fn halfblock_lines(bitmap: &RgbaImage, cols: u16, rows: u16) -> Vec<Line<'static>> {
    let side = u32::from(cols).min(u32::from(rows) * 2) & !1;
    if side == 0 {
        return Vec::new();
    }
    let scaled = imageops::resize(bitmap, side, side, FilterType::Triangle);

    (0..side)
        .step_by(2)
        .map(|y| {
            let spans = (0..side)
                .map(|x| {
                    let top = scaled.get_pixel(x, y);
                    let bottom = scaled.get_pixel(x, y + 1);
                    Span::styled(
                        UPPER_HALF,
                        Style::default().fg(cell_color(top)).bg(cell_color(bottom)),
                    )
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect()
}

/// Rendered lines for one still at one pane size.
#[derive(Debug, Clone)]
pub struct PictureCache {
    key: (String, u16, u16),
    pub lines: Vec<Line<'static>>,
}

impl PictureCache {
    pub fn matches(&self, source_url: &str, cols: u16, rows: u16) -> bool {
        self.key.0 == source_url && self.key.1 == cols && self.key.2 == rows
    }

    pub fn build(source_url: &str, bitmap: &RgbaImage, cols: u16, rows: u16) -> Self {
        Self {
            key: (source_url.to_string(), cols, rows),
            lines: halfblock_lines(bitmap, cols, rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_image() -> RgbaImage {
        // Top half red, bottom half blue.
        RgbaImage::from_fn(8, 8, |_, y| {
            if y < 4 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn fits_largest_square_in_pane() {
        let lines = halfblock_lines(&split_image(), 40, 4);
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.spans.len() == 8));

        let lines = halfblock_lines(&split_image(), 6, 20);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.spans.len() == 6));
    }

    #[test]
    fn cells_carry_top_and_bottom_colors() {
        let lines = halfblock_lines(&split_image(), 8, 4);
        let first = lines[0].spans[0].style;
        assert_eq!(first.fg, Some(Color::Rgb(255, 0, 0)));
        assert_eq!(first.bg, Some(Color::Rgb(255, 0, 0)));
        let last = lines[3].spans[0].style;
        assert_eq!(last.fg, Some(Color::Rgb(0, 0, 255)));
    }

    #[test]
    fn tiny_panes_render_nothing() {
        assert!(halfblock_lines(&split_image(), 1, 0).is_empty());
        assert!(halfblock_lines(&split_image(), 1, 5).is_empty());
    }

    #[test]
    fn cache_key_tracks_source_and_size() {
        let cache = PictureCache::build("https://img.test/0.png", &split_image(), 8, 4);
        assert!(cache.matches("https://img.test/0.png", 8, 4));
        assert!(!cache.matches("https://img.test/1.png", 8, 4));
        assert!(!cache.matches("https://img.test/0.png", 10, 4));
    }
}

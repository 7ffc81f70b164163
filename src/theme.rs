//! The default look of a rendered book.

use genpdf::style::{Color, Style};

use crate::blocks::BlockKind;

const NAVY: Color = Color::Rgb(0x1e, 0x3a, 0x5f);
const SLATE: Color = Color::Rgb(0x4a, 0x55, 0x68);
const BLUE: Color = Color::Rgb(0x2c, 0x52, 0x82);
const CHARCOAL: Color = Color::Rgb(0x2d, 0x37, 0x48);
const INK: Color = Color::Rgb(0x1a, 0x1a, 0x1a);
const GREY: Color = Color::Rgb(0x66, 0x66, 0x66);

/// Styles and vertical spacing used by the renderer.
///
/// Spacing values are in multiples of the current line height, as taken by
/// [`genpdf::elements::Break`].
#[derive(Clone, Debug)]
pub struct Theme {
    pub body_font_size: u8,
    pub line_spacing: f64,
    pub book_title: Style,
    pub kicker: Style,
    pub subtitle: Style,
    pub part_title: Style,
    pub chapter_title: Style,
    pub section: Style,
    pub subsection: Style,
    pub body: Style,
    pub code: Style,
    pub publisher_info: Style,
    pub copyright: Style,
    pub header: Style,
    pub footer: Style,
    pub section_spacing: f64,
    pub subsection_spacing: f64,
    pub minor_spacing: f64,
    pub paragraph_spacing: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            body_font_size: 11,
            line_spacing: 1.25,
            book_title: Style::new().bold().with_font_size(28).with_color(NAVY),
            kicker: Style::new().with_font_size(14).with_color(SLATE),
            subtitle: Style::new().italic().with_font_size(13).with_color(SLATE),
            part_title: Style::new().bold().with_font_size(26).with_color(NAVY),
            chapter_title: Style::new().bold().with_font_size(20).with_color(NAVY),
            section: Style::new().bold().with_font_size(15).with_color(BLUE),
            subsection: Style::new().bold().with_font_size(13).with_color(CHARCOAL),
            body: Style::new().with_font_size(11).with_color(INK),
            code: Style::new().with_font_size(9).with_color(INK),
            publisher_info: Style::new().with_font_size(11).with_color(SLATE),
            copyright: Style::new().with_font_size(9).with_color(GREY),
            header: Style::new().with_font_size(8).with_color(NAVY),
            footer: Style::new().with_font_size(8).with_color(GREY),
            section_spacing: 1.2,
            subsection_spacing: 0.9,
            minor_spacing: 0.6,
            paragraph_spacing: 0.5,
        }
    }
}

impl Theme {
    /// Style applied to a block of the given kind.
    pub fn style_for(&self, kind: BlockKind) -> Style {
        match kind {
            BlockKind::Heading1 => self.chapter_title,
            BlockKind::Heading2 => self.section,
            BlockKind::Heading3 => self.subsection,
            BlockKind::Heading4 | BlockKind::Bold => self.body.bold(),
            BlockKind::Code => self.code,
            BlockKind::List | BlockKind::Paragraph => self.body,
        }
    }

    /// Blank space inserted before a block of the given kind.
    pub fn spacing_before(&self, kind: BlockKind) -> f64 {
        match kind {
            BlockKind::Heading1 | BlockKind::Heading2 => self.section_spacing,
            BlockKind::Heading3 => self.subsection_spacing,
            BlockKind::Heading4 | BlockKind::Code => self.minor_spacing,
            BlockKind::Bold | BlockKind::Paragraph => self.paragraph_spacing,
            BlockKind::List => 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_lines_and_minor_headings_share_bold_body_style() {
        let theme = Theme::default();
        let bold = theme.style_for(BlockKind::Bold);
        assert!(bold.is_bold());
        assert!(theme.style_for(BlockKind::Heading4).is_bold());
        assert_eq!(bold.font_size(), theme.body.font_size());
        assert!(!theme.style_for(BlockKind::Paragraph).is_bold());
    }

    #[test]
    fn headings_get_more_space_than_paragraphs() {
        let theme = Theme::default();
        assert!(
            theme.spacing_before(BlockKind::Heading2) > theme.spacing_before(BlockKind::Paragraph)
        );
    }
}

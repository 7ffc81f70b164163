//! Element implementations and constructors built on top of `genpdf` primitives.
//!
//! This module maps [`ContentBlock`]s to layout elements and adds the pieces the upstream crate
//! does not ship with: page markers that record where a chapter starts, framed code listings
//! that keep indentation, and the table layouts used on the title and contents pages.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use genpdf::elements::{
    Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout, UnorderedList,
};
use genpdf::error::Error;
use genpdf::fonts::{Font, FontFamily};
use genpdf::style::{Style, StyledString};
use genpdf::{render, Alignment, Element, Margins, Mm, Position, RenderResult};

use crate::blocks::ContentBlock;
use crate::richtext::{parse_inline, spans_to_styled_strings};
use crate::theme::Theme;

const TAB_WIDTH: usize = 4;

/// Converts millimetres given as `f64` into a `genpdf` length.
pub fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Page number shared between the page decorator and the elements of one render pass.
#[derive(Clone, Debug, Default)]
pub struct PageCounter(Rc<Cell<usize>>);

impl PageCounter {
    /// Returns the 1-based number of the page currently being laid out, `0` before the first.
    pub fn current(&self) -> usize {
        self.0.get()
    }

    /// Moves to the next page and returns its number.
    pub fn advance(&self) -> usize {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }
}

/// First page of every chapter, filled in while a document renders.
#[derive(Clone, Debug, Default)]
pub struct ChapterPages(Rc<RefCell<Vec<Option<usize>>>>);

impl ChapterPages {
    /// Creates empty slots for `chapters` chapters.
    pub fn new(chapters: usize) -> Self {
        Self(Rc::new(RefCell::new(vec![None; chapters])))
    }

    fn record(&self, index: usize, page: usize) {
        if let Some(slot) = self.0.borrow_mut().get_mut(index) {
            slot.get_or_insert(page);
        }
    }

    /// Returns a copy of the recorded pages.
    pub fn snapshot(&self) -> Vec<Option<usize>> {
        self.0.borrow().clone()
    }
}

/// Zero-sized element that records the page it lands on.
pub struct PageMarker {
    counter: PageCounter,
    pages: ChapterPages,
    index: usize,
}

impl PageMarker {
    /// Creates a marker that stores the current page of `counter` in slot `index` of `pages`.
    pub fn new(counter: PageCounter, pages: ChapterPages, index: usize) -> Self {
        Self {
            counter,
            pages,
            index,
        }
    }
}

impl Element for PageMarker {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        _area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        self.pages.record(self.index, self.counter.current());
        Ok(RenderResult::default())
    }
}

/// Builds a paragraph from text with inline markup, layering span styles over `style`.
pub fn rich_paragraph(text: &str, style: Style, monospace: Option<FontFamily<Font>>) -> Paragraph {
    let mut paragraph = Paragraph::default();
    for mut string in spans_to_styled_strings(&parse_inline(text), monospace) {
        string.style = style.and(string.style);
        paragraph.push(string);
    }
    paragraph
}

/// Builds a bulleted list with one rich-text paragraph per item.
pub fn bullet_list(
    items: &[String],
    style: Style,
    monospace: Option<FontFamily<Font>>,
) -> UnorderedList {
    let mut list = UnorderedList::with_bullet("•");
    for item in items {
        list.push(rich_paragraph(item, style, monospace));
    }
    list
}

/// One line of a code listing.
///
/// The line is printed verbatim, so leading whitespace survives.  When it is wider than the
/// area it is broken into rows; continuation rows repeat the line's indentation.
pub struct CodeLine {
    text: String,
    style: Style,
    rows: Option<Vec<String>>,
    next_row: usize,
}

impl CodeLine {
    /// Creates a code line; tabs expand to four spaces.
    pub fn new(text: &str, style: Style) -> Self {
        let text = text.replace('\t', &" ".repeat(TAB_WIDTH));
        Self {
            text,
            style,
            rows: None,
            next_row: 0,
        }
    }
}

impl Element for CodeLine {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let style = style.and(self.style);
        let font_cache = &context.font_cache;
        let text = &self.text;
        let rows = self.rows.get_or_insert_with(|| {
            wrap_code_line(text, area.size().width, |s| style.str_width(font_cache, s))
        });

        let line_height = style.line_height(font_cache);
        let mut result = RenderResult::default();
        while let Some(row) = rows.get(self.next_row) {
            if line_height > area.size().height {
                result.has_more = true;
                break;
            }
            area.print_str(font_cache, Position::default(), style, row)?;
            area.add_offset(Position::new(0, line_height));

            let width = style.str_width(font_cache, row);
            if width > result.size.width {
                result.size.width = width;
            }
            result.size.height = result.size.height + line_height;
            self.next_row += 1;
        }
        Ok(result)
    }
}

/// Splits `line` into rows no wider than `max_width` as measured by `width_of`.
///
/// Every row holds at least one character beyond its indentation, so a row may still overflow
/// when a single character does not fit.
fn wrap_code_line(line: &str, max_width: Mm, width_of: impl Fn(&str) -> Mm) -> Vec<String> {
    if line.trim().is_empty() {
        return vec![" ".to_owned()];
    }
    if width_of(line) <= max_width {
        return vec![line.to_owned()];
    }

    let indent_len = line.len() - line.trim_start().len();
    let indent = &line[..indent_len];
    let continuation = if width_of(indent) + width_of(indent) < max_width {
        indent
    } else {
        ""
    };

    let mut rows = Vec::new();
    let mut current = indent.to_owned();
    let mut prefix_len = indent_len;
    for ch in line[indent_len..].chars() {
        current.push(ch);
        if current.len() - ch.len_utf8() > prefix_len && width_of(&current) > max_width {
            current.pop();
            rows.push(std::mem::replace(&mut current, continuation.to_owned()));
            prefix_len = continuation.len();
            current.push(ch);
        }
    }
    rows.push(current);
    rows
}

/// Builds a framed listing with one [`CodeLine`] per source line.
pub fn code_listing(code: &str, style: Style) -> impl Element {
    let mut lines = LinearLayout::vertical();
    for line in code.split('\n') {
        lines.push(CodeLine::new(line, style));
    }
    lines.padded(Margins::trbl(2, 3, 2, 3)).framed()
}

/// Builds a two-column framed table of `label: value` rows.
pub fn info_table(
    rows: &[(&str, &str)],
    label_style: Style,
    value_style: Style,
) -> Result<TableLayout, Error> {
    let mut table = TableLayout::new(vec![1, 3]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    for (label, value) in rows {
        table
            .row()
            .element(
                Paragraph::new(StyledString::new(format!("{}:", label), label_style))
                    .padded(Margins::all(1)),
            )
            .element(
                Paragraph::new(StyledString::new(*value, value_style)).padded(Margins::all(1)),
            )
            .push()?;
    }
    Ok(table)
}

/// One line of the table of contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentsEntry {
    pub title: String,
    pub page: Option<usize>,
    pub is_part: bool,
}

/// Builds the table of contents: titles on the left, page numbers right-aligned.
///
/// Part entries are bold, flush left and carry no page number.
pub fn contents_table(entries: &[ContentsEntry], style: Style) -> Result<TableLayout, Error> {
    let mut table = TableLayout::new(vec![9, 1]);
    for entry in entries {
        let (title_style, indent, page) = if entry.is_part {
            (style.bold(), 0, String::new())
        } else {
            let page = entry.page.map(|page| page.to_string()).unwrap_or_default();
            (style, 4, page)
        };

        table
            .row()
            .element(
                Paragraph::new(StyledString::new(entry.title.clone(), title_style))
                    .padded(Margins::trbl(1, 0, 1, indent)),
            )
            .element(
                Paragraph::new(StyledString::new(page, style))
                    .aligned(Alignment::Right)
                    .padded(Margins::trbl(1, 0, 1, 0)),
            )
            .push()?;
    }
    Ok(table)
}

/// Maps content blocks to themed elements.
pub struct BlockRenderer<'a> {
    theme: &'a Theme,
    monospace: Option<FontFamily<Font>>,
}

impl<'a> BlockRenderer<'a> {
    /// Creates a renderer; `monospace` is used for code when present.
    pub fn new(theme: &'a Theme, monospace: Option<FontFamily<Font>>) -> Self {
        Self { theme, monospace }
    }

    /// Returns the leading space and content of `block` as one vertical layout.
    pub fn render(&self, block: &ContentBlock) -> LinearLayout {
        let kind = block.kind();
        let style = self.theme.style_for(kind);

        let mut layout = LinearLayout::vertical();
        layout.push(Break::new(self.theme.spacing_before(kind)));
        match block {
            ContentBlock::Heading(_, text)
            | ContentBlock::Bold(text)
            | ContentBlock::Paragraph(text) => {
                layout.push(rich_paragraph(text, style, self.monospace));
            }
            ContentBlock::List(items) => {
                layout.push(bullet_list(items, style, self.monospace));
            }
            ContentBlock::Code(code) => {
                let mut style = style;
                if let Some(family) = self.monospace {
                    style.set_font_family(family);
                }
                layout.push(code_listing(code, style));
            }
        }
        layout
    }
}

//! Document construction helpers for the bookpress crate.
//!
//! [`DocumentBuilder`] configures a bare `genpdf::Document` (paper, margins, running header and
//! footer).  [`BookBuilder`] lays a whole book out on top of it: title page, generated front
//! matter, table of contents, chapters and the publisher page.
//!
//! Rendering runs twice when a table of contents is requested.  The first pass records the page
//! every chapter starts on; the second pass prints those numbers.  Contents rows have the same
//! height in both passes, so the recorded pages stay valid.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use genpdf::elements::{Break, LinearLayout, PageBreak, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{Font, FontData, FontFamily};
use genpdf::style::{self, StyledString};
use genpdf::{self, Alignment, Element, Margins, Mm, PageDecorator, Position, Size};
use log::{debug, info, warn};
use thiserror::Error;

use crate::blocks::split_blocks;
use crate::config::{BookConfig, ConfigError};
use crate::elements::{
    contents_table, info_table, mm_from_f64, rich_paragraph, BlockRenderer, ChapterPages,
    ContentsEntry, PageCounter, PageMarker,
};
use crate::fonts;
use crate::model::{AssemblyRules, Book, Division};
use crate::theme::Theme;

/// Format of the header timestamp, e.g. `March 02, 2026 - 04:15 PM`.
pub const TIMESTAMP_FORMAT: &str = "%B %d, %Y - %I:%M %p";

const FOOTER_HEIGHT_MM: f64 = 8.0;

/// Errors produced while building a book.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to load fonts: {0}")]
    FontLoad(#[source] Error),

    #[error("Failed to render PDF: {0}")]
    Render(#[source] Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Manuscript file not found at {}", .0.display())]
    MissingManuscript(PathBuf),

    #[error("Failed to read manuscript at {}: {source}", path.display())]
    ReadManuscript { path: PathBuf, source: io::Error },

    #[error("Failed to embed bookmarks: {0}")]
    Bookmarks(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Reads a manuscript, failing with [`BuildError::MissingManuscript`] if the file does not exist.
pub fn load_manuscript(path: impl AsRef<Path>) -> Result<String, BuildError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(BuildError::MissingManuscript(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| BuildError::ReadManuscript {
        path: path.to_path_buf(),
        source,
    })
}

type ElementFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Builder for `genpdf::Document` instances pre-configured with the crate defaults.
#[derive(Default)]
pub struct DocumentBuilder {
    paper_size: Option<Size>,
    margins: Option<Margins>,
    header: Option<Box<ElementFactory>>,
    footer: Option<FooterSpec>,
    counter: PageCounter,
    #[cfg(feature = "hyphenation")]
    hyphenator: Option<hyphenation::Standard>,
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size used for newly created documents.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Configures a header callback that is invoked for every page.
    pub fn with_header<F, E>(mut self, header: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.header = Some(Box::new(move |page| {
            Box::new(header(page)) as Box<dyn Element>
        }));
        self
    }

    /// Configures a footer callback with a fixed height that is invoked for every page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    /// Shares `counter` with the page decorator so elements can read the current page.
    pub fn with_page_counter(mut self, counter: PageCounter) -> Self {
        self.counter = counter;
        self
    }

    /// Enables hyphenation using the provided hyphenation dictionary.
    #[cfg(feature = "hyphenation")]
    pub fn with_hyphenator(mut self, hyphenator: hyphenation::Standard) -> Self {
        self.hyphenator = Some(hyphenator);
        self
    }

    /// Builds a `genpdf::Document` using `font_family` as the default family.
    pub fn build(self, font_family: FontFamily<FontData>) -> genpdf::Document {
        let mut document = genpdf::Document::new(font_family);

        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }

        let decorator =
            ConfiguredPageDecorator::new(self.counter, self.margins, self.header, self.footer);
        document.set_page_decorator(decorator);

        #[cfg(feature = "hyphenation")]
        if let Some(hyphenator) = self.hyphenator {
            document.set_hyphenator(hyphenator);
        }

        document
    }
}

/// Definition of a footer rendered through the page decorator.
pub struct FooterSpec {
    height: Mm,
    factory: Box<ElementFactory>,
}

impl FooterSpec {
    /// Creates a footer of fixed `height` built by `factory` for every page.
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

struct ConfiguredPageDecorator {
    counter: PageCounter,
    margins: Option<Margins>,
    header: Option<Box<ElementFactory>>,
    footer: Option<FooterSpec>,
}

impl ConfiguredPageDecorator {
    fn new(
        counter: PageCounter,
        margins: Option<Margins>,
        header: Option<Box<ElementFactory>>,
        footer: Option<FooterSpec>,
    ) -> Self {
        Self {
            counter,
            margins,
            header,
            footer,
        }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        let page = self.counter.advance();

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(header_cb) = &self.header {
            let mut element = header_cb(page);
            let result = element.render(context, area.clone(), style)?;
            area.add_offset(Position::new(0, result.size.height));
        }

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}

/// Output of a successful render.
#[derive(Clone, Debug)]
pub struct RenderedBook {
    /// The serialized PDF document.
    pub bytes: Vec<u8>,
    /// First page of every chapter, in [`Book::chapters`] order.
    pub chapter_pages: Vec<Option<usize>>,
}

/// Lays out a complete book from a [`BookConfig`] and a [`Book`].
pub struct BookBuilder {
    config: BookConfig,
    book: Book,
    theme: Theme,
    generated_at: Option<String>,
    #[cfg(feature = "hyphenation")]
    hyphenator: Option<hyphenation::Standard>,
}

impl BookBuilder {
    /// Creates a builder with an empty manuscript.
    pub fn new(config: BookConfig) -> Self {
        Self {
            config,
            book: Book::default(),
            theme: Theme::default(),
            generated_at: None,
            #[cfg(feature = "hyphenation")]
            hyphenator: None,
        }
    }

    /// Loads the configuration and manuscript from disk.
    pub fn from_paths(
        config_path: impl AsRef<Path>,
        manuscript_path: impl AsRef<Path>,
    ) -> Result<Self, BuildError> {
        let config = BookConfig::load_from_path(config_path)?;
        let manuscript = load_manuscript(manuscript_path)?;
        Ok(Self::new(config).with_manuscript(&manuscript))
    }

    /// Splits `markdown` and assembles it using the configured front-matter rules.
    pub fn with_manuscript(mut self, markdown: &str) -> Self {
        let mut blocks = split_blocks(markdown);
        let rules = AssemblyRules::from(&self.config.front_matter);
        self.book = Book::assemble(&rules, blocks.by_ref());
        if let Some(line) = blocks.unterminated_fence() {
            warn!(
                "Code fence opened on line {} is never closed; it runs to the end of the manuscript",
                line
            );
        }
        debug!(
            "Assembled {} chapters and {} preamble blocks",
            self.book.chapters().len(),
            self.book.preamble().len()
        );
        self
    }

    /// Replaces the manuscript body with an already assembled book.
    pub fn with_book(mut self, book: Book) -> Self {
        self.book = book;
        self
    }

    /// Replaces the default theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Fixes the header timestamp instead of using the local time at render.
    pub fn with_generated_at(mut self, generated_at: impl Into<String>) -> Self {
        self.generated_at = Some(generated_at.into());
        self
    }

    /// Enables hyphenation using the provided hyphenation dictionary.
    #[cfg(feature = "hyphenation")]
    pub fn with_hyphenator(mut self, hyphenator: hyphenation::Standard) -> Self {
        self.hyphenator = Some(hyphenator);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Returns the assembled manuscript body.
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// Renders the book to PDF bytes.
    pub fn render(&self) -> Result<RenderedBook, BuildError> {
        let body_fonts = fonts::default_font_family().map_err(BuildError::FontLoad)?;
        let monospace = fonts::monospace_font_family();
        let generated_at = self
            .generated_at
            .clone()
            .unwrap_or_else(|| Local::now().format(TIMESTAMP_FORMAT).to_string());

        let toc_pages = if self.wants_contents() {
            info!("Laying out table of contents");
            let draft = self.render_pass(&body_fonts, monospace.clone(), &generated_at, None)?;
            Some(draft.chapter_pages)
        } else {
            None
        };

        let rendered = self.render_pass(
            &body_fonts,
            monospace,
            &generated_at,
            toc_pages.as_deref(),
        )?;
        info!("Rendered book ({} bytes)", rendered.bytes.len());
        Ok(rendered)
    }

    /// Renders the book and embeds a part/chapter outline.
    #[cfg(feature = "bookmarks")]
    pub fn render_with_bookmarks(&self) -> Result<RenderedBook, BuildError> {
        let rendered = self.render()?;
        info!("Embedding chapter bookmarks");
        let bytes = crate::bookmarks::apply_chapter_bookmarks(
            &rendered.bytes,
            self.book.chapters(),
            &rendered.chapter_pages,
        )
        .map_err(|err| BuildError::Bookmarks(Box::new(err)))?;
        Ok(RenderedBook {
            bytes,
            chapter_pages: rendered.chapter_pages,
        })
    }

    fn wants_contents(&self) -> bool {
        self.config.front_matter.table_of_contents && !self.book.chapters().is_empty()
    }

    fn document_builder(&self, generated_at: &str, counter: PageCounter) -> DocumentBuilder {
        let page = &self.config.page;
        let header_title = self.config.header_title();
        let stamp = page.timestamp.then(|| format!("Generated: {}", generated_at));
        let header_style = self.theme.header;
        let footer_style = self.theme.footer;

        let builder = DocumentBuilder::new()
            .with_paper_size(page.paper)
            .with_margins(Margins::all(mm_from_f64(page.margins_mm)))
            .with_page_counter(counter)
            .with_header(move |_page| {
                let mut header = LinearLayout::vertical();
                header.push(Paragraph::new(StyledString::new(
                    header_title.clone(),
                    header_style,
                )));
                if let Some(stamp) = &stamp {
                    header.push(
                        Paragraph::new(StyledString::new(stamp.clone(), header_style))
                            .aligned(Alignment::Right),
                    );
                }
                header.push(Break::new(1.0));
                header
            })
            .with_footer(mm_from_f64(FOOTER_HEIGHT_MM), move |page| {
                Paragraph::new(StyledString::new(format!("Page {}", page), footer_style))
                    .aligned(Alignment::Center)
            });

        #[cfg(feature = "hyphenation")]
        let builder = match &self.hyphenator {
            Some(hyphenator) => builder.with_hyphenator(hyphenator.clone()),
            None => builder,
        };

        builder
    }

    fn render_pass(
        &self,
        body_fonts: &FontFamily<FontData>,
        monospace: Option<FontFamily<FontData>>,
        generated_at: &str,
        toc_pages: Option<&[Option<usize>]>,
    ) -> Result<RenderedBook, BuildError> {
        let counter = PageCounter::default();
        let pages = ChapterPages::new(self.book.chapters().len());

        let mut document = self
            .document_builder(generated_at, counter.clone())
            .build(body_fonts.clone());
        document.set_title(self.config.book.title.clone());
        document.set_font_size(self.theme.body_font_size);
        document.set_line_spacing(self.theme.line_spacing);
        let monospace = monospace.map(|family| document.add_font_family(family));

        let mut flow = PageFlow::new(&mut document);
        let composer = Composer {
            config: &self.config,
            theme: &self.theme,
            monospace,
        };

        info!("Building title page");
        composer.title_page(&mut flow)?;
        composer.dedication(&mut flow);
        composer.preface(&mut flow);
        if self.wants_contents() {
            info!("Building table of contents");
            composer.contents(&mut flow, &self.book, toc_pages)?;
        }

        info!("Building main content");
        composer.preamble(&mut flow, &self.book);
        for (index, chapter) in self.book.chapters().iter().enumerate() {
            flow.start_page();
            flow.push(PageMarker::new(counter.clone(), pages.clone(), index));
            composer.chapter(&mut flow, chapter.title(), chapter.division());
            let renderer = BlockRenderer::new(&self.theme, monospace);
            for block in chapter.blocks() {
                flow.push(renderer.render(block));
            }
        }

        info!("Building publisher page");
        composer.publisher_page(&mut flow);

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(BuildError::Render)?;
        let chapter_pages = pages.snapshot();
        debug!(
            "Render pass produced {} pages, chapter starts {:?}",
            counter.current(),
            chapter_pages
        );

        Ok(RenderedBook {
            bytes,
            chapter_pages,
        })
    }
}

/// Pushes elements and inserts a page break only when a new page is actually started.
struct PageFlow<'d> {
    document: &'d mut genpdf::Document,
    started: bool,
}

impl<'d> PageFlow<'d> {
    fn new(document: &'d mut genpdf::Document) -> Self {
        Self {
            document,
            started: false,
        }
    }

    fn start_page(&mut self) {
        if self.started {
            self.document.push(PageBreak::new());
        }
    }

    fn push<E: Element + 'static>(&mut self, element: E) {
        self.started = true;
        self.document.push(element);
    }
}

struct Composer<'a> {
    config: &'a BookConfig,
    theme: &'a Theme,
    monospace: Option<FontFamily<Font>>,
}

impl Composer<'_> {
    fn centered(&self, text: &str, style: style::Style) -> Paragraph {
        Paragraph::new(StyledString::new(text, style)).aligned(Alignment::Center)
    }

    fn body(&self, text: &str) -> Paragraph {
        rich_paragraph(text, self.theme.body, self.monospace)
    }

    fn title_page(&self, flow: &mut PageFlow<'_>) -> Result<(), BuildError> {
        let book = &self.config.book;
        let publisher = &self.config.publisher;
        let theme = self.theme;

        flow.start_page();
        flow.push(Break::new(4.0));
        if let Some(kicker) = &book.kicker {
            flow.push(self.centered(kicker, theme.kicker));
        }
        flow.push(self.centered(&book.title, theme.book_title));
        flow.push(Break::new(1.5));
        for subtitle in &book.subtitles {
            flow.push(self.centered(subtitle, theme.subtitle));
        }

        if let Some(name) = &publisher.name {
            flow.push(Break::new(3.0));
            flow.push(self.centered("Published by:", theme.publisher_info));
            flow.push(self.centered(name, theme.chapter_title));
        }

        let rows = publisher.contact_rows();
        if !rows.is_empty() {
            flow.push(Break::new(1.5));
            let table = info_table(&rows, theme.publisher_info.bold(), theme.publisher_info)
                .map_err(BuildError::Render)?;
            flow.push(table.padded(Margins::trbl(0, 20, 0, 20)));
        }

        flow.push(Break::new(2.0));
        if let Some(copyright) = &book.copyright {
            flow.push(self.centered(copyright, theme.copyright));
            flow.push(self.centered("All Rights Reserved", theme.copyright));
        }
        if let Some(edition) = &book.edition {
            flow.push(self.centered(edition, theme.copyright));
        }
        Ok(())
    }

    fn dedication(&self, flow: &mut PageFlow<'_>) {
        let Some(dedication) = &self.config.front_matter.dedication else {
            return;
        };
        info!("Building dedication page");
        flow.start_page();
        flow.push(Break::new(6.0));
        flow.push(self.centered("DEDICATION", self.theme.section));
        flow.push(Break::new(1.5));
        flow.push(
            rich_paragraph(dedication, self.theme.body.italic(), self.monospace)
                .aligned(Alignment::Center),
        );
    }

    fn preface(&self, flow: &mut PageFlow<'_>) {
        let preface = &self.config.front_matter.preface;
        if preface.is_empty() {
            return;
        }
        info!("Building preface");
        flow.start_page();
        flow.push(Paragraph::new(StyledString::new(
            "PREFACE",
            self.theme.chapter_title,
        )));
        for paragraph in preface {
            flow.push(Break::new(self.theme.paragraph_spacing));
            flow.push(self.body(paragraph));
        }
    }

    fn contents(
        &self,
        flow: &mut PageFlow<'_>,
        book: &Book,
        toc_pages: Option<&[Option<usize>]>,
    ) -> Result<(), BuildError> {
        let entries: Vec<_> = book
            .chapters()
            .iter()
            .enumerate()
            .map(|(index, chapter)| ContentsEntry {
                title: chapter.title().to_owned(),
                page: toc_pages.and_then(|pages| pages.get(index).copied().flatten()),
                is_part: chapter.division() == Division::Part,
            })
            .collect();

        flow.start_page();
        flow.push(Paragraph::new(StyledString::new(
            "TABLE OF CONTENTS",
            self.theme.chapter_title,
        )));
        flow.push(Break::new(1.0));
        flow.push(contents_table(&entries, self.theme.body).map_err(BuildError::Render)?);
        Ok(())
    }

    fn preamble(&self, flow: &mut PageFlow<'_>, book: &Book) {
        if book.preamble().is_empty() {
            return;
        }
        flow.start_page();
        let renderer = BlockRenderer::new(self.theme, self.monospace);
        for block in book.preamble() {
            flow.push(renderer.render(block));
        }
    }

    fn chapter(&self, flow: &mut PageFlow<'_>, title: &str, division: Division) {
        match division {
            Division::Part => {
                flow.push(Break::new(8.0));
                flow.push(self.centered(title, self.theme.part_title));
            }
            Division::Chapter => {
                flow.push(Paragraph::new(StyledString::new(
                    title,
                    self.theme.chapter_title,
                )));
            }
        }
        flow.push(Break::new(0.5));
    }

    fn publisher_page(&self, flow: &mut PageFlow<'_>) {
        let publisher = &self.config.publisher;
        if publisher.name.is_none() && publisher.about.is_none() {
            return;
        }

        flow.start_page();
        flow.push(Paragraph::new(StyledString::new(
            "ABOUT THE PUBLISHER",
            self.theme.chapter_title,
        )));
        if let Some(about) = &publisher.about {
            flow.push(Break::new(1.0));
            flow.push(self.body(about));
        }

        let rows = publisher.contact_rows();
        if !rows.is_empty() {
            flow.push(Break::new(1.5));
            flow.push(Paragraph::new(StyledString::new(
                "Contact Information:",
                self.theme.section,
            )));
            for (label, value) in rows {
                flow.push(Paragraph::new(StyledString::new(
                    format!("{}: {}", label, value),
                    self.theme.publisher_info,
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manuscript_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AI_Comprehensive_Guide.md");

        let err = load_manuscript(&path).unwrap_err();
        assert!(matches!(&err, BuildError::MissingManuscript(missing) if missing == &path));
        assert!(err.to_string().contains("AI_Comprehensive_Guide.md"));
    }

    #[test]
    fn with_manuscript_uses_configured_part_prefix() {
        let mut config = BookConfig::default();
        config.front_matter.part_prefix = "UNIT".to_owned();

        let builder = BookBuilder::new(config).with_manuscript("# UNIT 1\n# Lesson");
        let divisions: Vec<_> = builder
            .book()
            .chapters()
            .iter()
            .map(|chapter| chapter.division())
            .collect();
        assert_eq!(divisions, vec![Division::Part, Division::Chapter]);
    }

    #[test]
    fn contents_are_skipped_without_chapters() {
        let builder = BookBuilder::new(BookConfig::default()).with_manuscript("Only a preamble.");
        assert!(!builder.wants_contents());
    }
}

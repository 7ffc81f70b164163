//! Logical structure of a book assembled from content blocks.
//!
//! The splitter produces a flat block stream; [`Book::assemble`] groups it into parts and
//! chapters at every level-1 heading.  Manuscripts commonly carry their own title page, table of
//! contents, dedication and preface.  The book regenerates those pages from
//! [`BookConfig`](crate::config::BookConfig), so the manuscript copies are filtered out here
//! according to [`AssemblyRules`].

use crate::blocks::{split_blocks, ContentBlock, HeadingLevel};
use crate::config::FrontMatter;
use crate::richtext::strip_markup;

/// Whether a level-1 heading opens a part or an ordinary chapter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Division {
    /// Groups the chapters that follow it.
    Part,
    #[default]
    Chapter,
}

/// A level-1 heading and the blocks up to the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chapter {
    title: String,
    division: Division,
    blocks: Vec<ContentBlock>,
}

impl Chapter {
    /// Creates an empty chapter with the provided title.
    pub fn new(title: impl Into<String>, division: Division) -> Self {
        Self {
            title: title.into(),
            division,
            blocks: Vec::new(),
        }
    }

    /// Returns the chapter title without inline markup.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns whether this is a part or a chapter.
    pub fn division(&self) -> Division {
        self.division
    }

    /// Returns the body blocks of the chapter.
    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    /// Appends a block and returns the updated chapter.
    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.blocks.push(block);
        self
    }
}

/// Controls which manuscript headings are dropped and which open parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyRules {
    skip_headings: Vec<String>,
    part_prefix: String,
}

impl AssemblyRules {
    /// Creates rules from explicit skip markers and part prefix.
    pub fn new<I, S>(skip_headings: I, part_prefix: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skip_headings: skip_headings.into_iter().map(Into::into).collect(),
            part_prefix: part_prefix.into(),
        }
    }

    fn is_skipped(&self, level: HeadingLevel, text: &str) -> bool {
        level <= HeadingLevel::H2
            && self
                .skip_headings
                .iter()
                .any(|marker| !marker.is_empty() && text.contains(marker.as_str()))
    }

    fn division_of(&self, text: &str) -> Division {
        if !self.part_prefix.is_empty() && text.starts_with(self.part_prefix.as_str()) {
            Division::Part
        } else {
            Division::Chapter
        }
    }
}

impl Default for AssemblyRules {
    fn default() -> Self {
        Self::from(&FrontMatter::default())
    }
}

impl From<&FrontMatter> for AssemblyRules {
    fn from(front_matter: &FrontMatter) -> Self {
        Self::new(
            front_matter.skip_headings.iter().cloned(),
            front_matter.part_prefix.clone(),
        )
    }
}

/// The manuscript body of a book.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Book {
    preamble: Vec<ContentBlock>,
    chapters: Vec<Chapter>,
}

impl Book {
    /// Groups `blocks` into chapters following `rules`.
    ///
    /// A skipped heading drops itself and everything up to the next heading of the same or higher
    /// rank that is not skipped as well.
    pub fn assemble<I>(rules: &AssemblyRules, blocks: I) -> Self
    where
        I: IntoIterator<Item = ContentBlock>,
    {
        let mut book = Book::default();
        let mut skipping: Option<HeadingLevel> = None;

        for block in blocks {
            match block.heading() {
                Some((level, text)) => {
                    if rules.is_skipped(level, text) {
                        skipping = Some(skipping.map_or(level, |open| open.min(level)));
                        continue;
                    }
                    match skipping {
                        Some(open) if level <= open => skipping = None,
                        Some(_) => continue,
                        None => {}
                    }
                    if level == HeadingLevel::H1 {
                        book.chapters
                            .push(Chapter::new(strip_markup(text), rules.division_of(text)));
                        continue;
                    }
                }
                None if skipping.is_some() => continue,
                None => {}
            }

            match book.chapters.last_mut() {
                Some(chapter) => chapter.blocks.push(block),
                None => book.preamble.push(block),
            }
        }

        book
    }

    /// Splits `markdown` and assembles the resulting blocks.
    pub fn from_markdown(rules: &AssemblyRules, markdown: &str) -> Self {
        Self::assemble(rules, split_blocks(markdown))
    }

    /// Blocks that precede the first level-1 heading.
    pub fn preamble(&self) -> &[ContentBlock] {
        &self.preamble
    }

    /// Parts and chapters in manuscript order.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Appends a chapter and returns the updated book.
    pub fn with_chapter(mut self, chapter: Chapter) -> Self {
        self.chapters.push(chapter);
        self
    }
}

//! Splits markdown manuscripts into typed content blocks.
//!
//! Only a small, line-oriented subset of markdown is recognised: ATX headings up to level four,
//! whole-line bold emphasis, `- ` bullet lists, fenced code and plain paragraphs.  Every line is
//! trimmed and classified on its own, so the splitter never backtracks and never fails; anything
//! it does not recognise degrades into paragraph text.
//!
//! ```
//! use bookpress::blocks::{split_blocks, ContentBlock, HeadingLevel};
//!
//! let blocks: Vec<_> = split_blocks("# Intro\n\nHello\nWorld").collect();
//! assert_eq!(
//!     blocks,
//!     vec![
//!         ContentBlock::Heading(HeadingLevel::H1, "Intro".to_string()),
//!         ContentBlock::Paragraph("Hello World".to_string()),
//!     ]
//! );
//! ```

use std::iter::{Enumerate, FusedIterator, Peekable};
use std::str::Lines;

use thiserror::Error;

/// Marker that opens and closes a fenced code block.
pub const CODE_FENCE: &str = "```";

/// Depth of a heading block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadingLevel {
    /// `# ` headings.
    H1 = 1,
    /// `## ` headings.
    H2 = 2,
    /// `### ` headings.
    H3 = 3,
    /// `#### ` headings.
    H4 = 4,
}

impl HeadingLevel {
    /// Maps the number of leading `#` characters to a level.
    pub fn from_marker_len(len: usize) -> Option<Self> {
        match len {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            4 => Some(Self::H4),
            _ => None,
        }
    }
}

/// Tag distinguishing how a [`ContentBlock`] should be rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Bold,
    List,
    Code,
    Paragraph,
}

/// Borrowed view of the data carried by a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Heading, bold, code or paragraph text.
    Text(&'a str),
    /// List items in source order.
    Items(&'a [String]),
}

/// A single classified unit of source text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContentBlock {
    Heading(HeadingLevel, String),
    Bold(String),
    List(Vec<String>),
    Code(String),
    Paragraph(String),
}

impl ContentBlock {
    /// Returns the kind tag of the block.
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Heading(HeadingLevel::H1, _) => BlockKind::Heading1,
            Self::Heading(HeadingLevel::H2, _) => BlockKind::Heading2,
            Self::Heading(HeadingLevel::H3, _) => BlockKind::Heading3,
            Self::Heading(HeadingLevel::H4, _) => BlockKind::Heading4,
            Self::Bold(_) => BlockKind::Bold,
            Self::List(_) => BlockKind::List,
            Self::Code(_) => BlockKind::Code,
            Self::Paragraph(_) => BlockKind::Paragraph,
        }
    }

    /// Returns the payload of the block.
    pub fn payload(&self) -> Payload<'_> {
        match self {
            Self::Heading(_, text)
            | Self::Bold(text)
            | Self::Code(text)
            | Self::Paragraph(text) => Payload::Text(text),
            Self::List(items) => Payload::Items(items),
        }
    }

    /// Returns the level and text when the block is a heading.
    pub fn heading(&self) -> Option<(HeadingLevel, &str)> {
        match self {
            Self::Heading(level, text) => Some((*level, text)),
            _ => None,
        }
    }
}

/// A block together with the source lines it was read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpannedBlock {
    /// The classified block.
    pub block: ContentBlock,
    /// 1-based line of the first consumed line, including an opening fence.
    pub first_line: usize,
    /// 1-based line of the last consumed line, including a closing fence.
    pub last_line: usize,
    /// Number of non-blank lines consumed, fence lines excluded.
    pub source_lines: usize,
}

impl SpannedBlock {
    fn single(block: ContentBlock, line: usize) -> Self {
        Self {
            block,
            first_line: line,
            last_line: line,
            source_lines: 1,
        }
    }
}

/// Error returned by [`split_blocks_strict`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SplitError {
    /// A code fence was opened but input ended before the closing fence.
    #[error("code fence opened on line {line} is never closed")]
    UnterminatedFence {
        /// 1-based line of the opening fence.
        line: usize,
    },
}

enum Line<'a> {
    Blank,
    Heading(HeadingLevel, &'a str),
    Bold(&'a str),
    ListItem(&'a str),
    Fence,
    Text(&'a str),
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if line.starts_with(CODE_FENCE) {
        return Line::Fence;
    }
    if let Some(item) = line.strip_prefix("- ") {
        return Line::ListItem(item.trim());
    }
    if let Some((level, text)) = heading(line) {
        return Line::Heading(level, text);
    }
    if let Some(text) = bold_line(line) {
        return Line::Bold(text);
    }
    Line::Text(line)
}

fn heading(line: &str) -> Option<(HeadingLevel, &str)> {
    let marker_len = line.bytes().take_while(|&byte| byte == b'#').count();
    let level = HeadingLevel::from_marker_len(marker_len)?;
    let rest = &line[marker_len..];
    if !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some((level, text))
}

fn bold_line(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("**")?.strip_suffix("**")?.trim();
    (!inner.is_empty() && !inner.contains("**")).then_some(inner)
}

/// Lazily splits `input` into content blocks in source order.
///
/// The returned iterator borrows the input and holds no state beyond its line cursor; calling
/// `split_blocks` again on the same text yields an equal sequence.
pub fn split_blocks(input: &str) -> Blocks<'_> {
    Blocks {
        lines: input.lines().enumerate().peekable(),
        unterminated_fence: None,
    }
}

/// Splits `input` and fails if a code fence is left open at end of input.
pub fn split_blocks_strict(input: &str) -> Result<Vec<ContentBlock>, SplitError> {
    let mut blocks = split_blocks(input);
    let collected: Vec<_> = blocks.by_ref().collect();
    match blocks.unterminated_fence() {
        Some(line) => Err(SplitError::UnterminatedFence { line }),
        None => Ok(collected),
    }
}

/// Iterator over the [`ContentBlock`]s of a manuscript. Created by [`split_blocks`].
#[derive(Clone, Debug)]
pub struct Blocks<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
    unterminated_fence: Option<usize>,
}

impl<'a> Blocks<'a> {
    /// Switches to yielding [`SpannedBlock`]s with source line information.
    pub fn spanned(self) -> SpannedBlocks<'a> {
        SpannedBlocks(self)
    }

    /// Line of a code fence that ran to end of input, once the splitter has reached it.
    pub fn unterminated_fence(&self) -> Option<usize> {
        self.unterminated_fence
    }

    fn next_spanned(&mut self) -> Option<SpannedBlock> {
        loop {
            let (index, raw) = self.lines.next()?;
            let line = index + 1;
            let spanned = match classify(raw) {
                Line::Blank => continue,
                Line::Heading(level, text) => {
                    SpannedBlock::single(ContentBlock::Heading(level, text.to_owned()), line)
                }
                Line::Bold(text) => SpannedBlock::single(ContentBlock::Bold(text.to_owned()), line),
                Line::ListItem(item) => self.list(line, item),
                Line::Fence => self.code(line),
                Line::Text(text) => self.paragraph(line, text),
            };
            return Some(spanned);
        }
    }

    fn list(&mut self, first_line: usize, first_item: &str) -> SpannedBlock {
        let mut items = vec![first_item.to_owned()];
        let mut last_line = first_line;
        while let Some(&(index, raw)) = self.lines.peek() {
            let Line::ListItem(item) = classify(raw) else {
                break;
            };
            items.push(item.to_owned());
            last_line = index + 1;
            self.lines.next();
        }

        let source_lines = items.len();
        SpannedBlock {
            block: ContentBlock::List(items),
            first_line,
            last_line,
            source_lines,
        }
    }

    fn code(&mut self, first_line: usize) -> SpannedBlock {
        let mut body = Vec::new();
        let mut last_line = first_line;
        let mut closed = false;
        for (index, raw) in self.lines.by_ref() {
            last_line = index + 1;
            if raw.trim_start().starts_with(CODE_FENCE) {
                closed = true;
                break;
            }
            body.push(raw);
        }

        if !closed {
            self.unterminated_fence = Some(first_line);
        }

        let source_lines = body.iter().filter(|line| !line.trim().is_empty()).count();
        SpannedBlock {
            block: ContentBlock::Code(body.join("\n")),
            first_line,
            last_line,
            source_lines,
        }
    }

    fn paragraph(&mut self, first_line: usize, first: &str) -> SpannedBlock {
        let mut text = first.to_owned();
        let mut last_line = first_line;
        while let Some(&(index, raw)) = self.lines.peek() {
            let Line::Text(more) = classify(raw) else {
                break;
            };
            text.push(' ');
            text.push_str(more);
            last_line = index + 1;
            self.lines.next();
        }

        SpannedBlock {
            block: ContentBlock::Paragraph(text),
            first_line,
            last_line,
            source_lines: last_line - first_line + 1,
        }
    }
}

impl Iterator for Blocks<'_> {
    type Item = ContentBlock;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_spanned().map(|spanned| spanned.block)
    }
}

impl FusedIterator for Blocks<'_> {}

/// Iterator over [`SpannedBlock`]s. Created by [`Blocks::spanned`].
#[derive(Clone, Debug)]
pub struct SpannedBlocks<'a>(Blocks<'a>);

impl SpannedBlocks<'_> {
    /// See [`Blocks::unterminated_fence`].
    pub fn unterminated_fence(&self) -> Option<usize> {
        self.0.unterminated_fence()
    }
}

impl Iterator for SpannedBlocks<'_> {
    type Item = SpannedBlock;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_spanned()
    }
}

impl FusedIterator for SpannedBlocks<'_> {}

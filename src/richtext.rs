//! Inline emphasis inside paragraph, bold-line and list text.
//!
//! The types in this module provide a light-weight representation of text "spans" that carry the
//! inline styling the manuscript format supports.  They sit between the block splitter and the
//! [`genpdf::elements`] primitives used to render the final PDF document.
//!
//! Parsing is lenient: an opening marker without a matching closer is kept as literal text, so
//! every input produces a span list.

use genpdf::fonts::{Font, FontFamily};
use genpdf::style::{Style, StyledString};

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    code: bool,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether the span should be rendered in bold.
    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Returns whether the span should be rendered in italic.
    pub fn is_italic(&self) -> bool {
        self.italic
    }

    /// Returns whether the span is inline code.
    pub fn is_code(&self) -> bool {
        self.code
    }

    /// Convenience shorthand that marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Convenience shorthand that marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Convenience shorthand that marks the span as inline code.
    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }

    /// Builds the [`Style`] for the span.  Code spans switch to `monospace` when one is loaded.
    pub fn to_style(&self, monospace: Option<FontFamily<Font>>) -> Style {
        let mut style = Style::new();
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        if self.code {
            if let Some(family) = monospace {
                style.set_font_family(family);
            }
        }
        style
    }

    /// Converts the span to a [`StyledString`].
    pub fn to_styled_string(&self, monospace: Option<FontFamily<Font>>) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style(monospace))
    }
}

/// Converts a sequence of [`Span`] values into styled strings.
pub fn spans_to_styled_strings<'a, I>(
    spans: I,
    monospace: Option<FontFamily<Font>>,
) -> Vec<StyledString>
where
    I: IntoIterator<Item = &'a Span>,
{
    spans
        .into_iter()
        .map(|span| span.to_styled_string(monospace))
        .collect()
}

#[derive(Clone, Copy, Debug, Default)]
struct StyleState {
    bold: bool,
    italic: bool,
}

impl StyleState {
    fn to_span(self, text: impl Into<String>) -> Span {
        Span {
            text: text.into(),
            bold: self.bold,
            italic: self.italic,
            code: false,
        }
    }
}

/// Parses `**bold**`, `*italic*` and `` `code` `` markers into a list of [`Span`]s.
///
/// Emphasis must hug its content (`* not italic *` stays literal) and code spans are never
/// parsed further.  Nesting of bold and italic is supported when the markers do not touch.
pub fn parse_inline(input: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    parse_into(input, StyleState::default(), &mut spans);
    spans
}

/// Returns `input` with all recognised inline markers removed.
pub fn strip_markup(input: &str) -> String {
    parse_inline(input)
        .iter()
        .map(Span::text)
        .collect::<Vec<_>>()
        .concat()
}

fn parse_into(input: &str, state: StyleState, spans: &mut Vec<Span>) {
    let mut buffer = String::new();
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix('`') {
            if let Some(end) = closing(after, "`", false) {
                flush_buffer(&mut buffer, spans, state);
                spans.push(state.to_span(&after[..end]).code());
                rest = &after[end + 1..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = closing(after, "**", true) {
                flush_buffer(&mut buffer, spans, state);
                let nested = StyleState {
                    bold: true,
                    ..state
                };
                parse_into(&after[..end], nested, spans);
                rest = &after[end + 2..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix('*') {
            if let Some(end) = closing(after, "*", true) {
                flush_buffer(&mut buffer, spans, state);
                let nested = StyleState {
                    italic: true,
                    ..state
                };
                parse_into(&after[..end], nested, spans);
                rest = &after[end + 1..];
                continue;
            }
        }

        buffer.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    flush_buffer(&mut buffer, spans, state);
}

/// Finds the byte offset of the closing `marker` in `after`, requiring non-empty content.
fn closing(after: &str, marker: &str, hugging: bool) -> Option<usize> {
    let end = after.find(marker)?;
    let inner = &after[..end];
    if inner.is_empty() {
        return None;
    }
    if hugging && (inner.starts_with(char::is_whitespace) || inner.ends_with(char::is_whitespace))
    {
        return None;
    }
    Some(end)
}

fn flush_buffer(buffer: &mut String, spans: &mut Vec<Span>, state: StyleState) {
    if buffer.is_empty() {
        return;
    }
    spans.push(state.to_span(std::mem::take(buffer)));
}

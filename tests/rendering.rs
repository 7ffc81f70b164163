use std::cell::Cell;
use std::rc::Rc;

use bookpress::blocks::ContentBlock;
use bookpress::builder::{BookBuilder, DocumentBuilder, RenderedBook};
use bookpress::config::BookConfig;
use bookpress::elements::{code_listing, mm_from_f64};
use bookpress::fonts;
use bookpress::model::{Book, Chapter, Division};
use bookpress::theme::Theme;
use genpdf::style::Style;
use genpdf::{Element, Margins, Mm, RenderResult};
use sha2::{Digest, Sha256};

const CONFIG: &str = r#"
[book]
title = "FIELD NOTES"
kicker = "A SHORT GUIDE TO"
subtitles = ["Rendering checks"]
copyright = "Copyright 2026 Example Press"

[publisher]
name = "Example Press"
email = "press@example.com"
about = "Example Press publishes **small** books."

[front_matter]
dedication = "For the reviewers."
preface = ["Why this book exists."]
"#;

const MANUSCRIPT: &str = "\
# Title Page
FIELD NOTES

# TABLE OF CONTENTS
- Chapter 1

# PART I: BASICS

# Chapter 1: Getting Started
## 1.1 Setup
Install the *toolchain* and run `build`.

- first step
- second step

```
fn main() {
    println!(\"hello\");
}
```

# Chapter 2: Next Steps
**Remember:**
Keep going.
";

fn render_sample_book() -> Option<RenderedBook> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let config = BookConfig::from_toml_str(CONFIG).expect("parse sample config");
    let rendered = BookBuilder::new(config)
        .with_manuscript(MANUSCRIPT)
        .with_generated_at("January 01, 2026 - 09:00 AM")
        .render()
        .expect("render sample book");

    Some(rendered)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

const SKIP_HINT: &str =
    "bundled fonts missing. Set BOOKPRESS_FONTS_DIR or copy assets/fonts next to the binary.";

#[test]
fn renders_non_empty_output() {
    let Some(rendered) = render_sample_book() else {
        eprintln!("Skipping renders_non_empty_output: {SKIP_HINT}");
        return;
    };
    assert!(
        rendered.bytes.starts_with(b"%PDF"),
        "rendered output should be a PDF document"
    );
}

#[test]
fn chapter_pages_are_recorded_in_order() {
    let Some(rendered) = render_sample_book() else {
        eprintln!("Skipping chapter_pages_are_recorded_in_order: {SKIP_HINT}");
        return;
    };

    let pages: Vec<usize> = rendered
        .chapter_pages
        .iter()
        .map(|page| page.expect("every chapter records its first page"))
        .collect();
    assert_eq!(pages.len(), 3, "part plus two chapters");
    // Title, dedication, preface and contents come first.
    assert!(pages[0] >= 5, "part starts after front matter: {pages:?}");
    assert!(
        pages.windows(2).all(|pair| pair[0] < pair[1]),
        "each chapter starts on its own page: {pages:?}"
    );
}

#[test]
fn rendering_is_deterministic() {
    let Some(first) = render_sample_book() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_HINT}");
        return;
    };
    let Some(second) = render_sample_book() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_HINT}");
        return;
    };

    assert_eq!(first.bytes.len(), second.bytes.len(), "PDF sizes should match");
    assert_eq!(first.chapter_pages, second.chapter_pages);

    assert_eq!(
        normalized_hash(&first.bytes),
        normalized_hash(&second.bytes),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[cfg(feature = "bookmarks")]
#[test]
fn bookmarks_add_an_outline() {
    let Some(_) = render_sample_book() else {
        eprintln!("Skipping bookmarks_add_an_outline: {SKIP_HINT}");
        return;
    };

    let config = BookConfig::from_toml_str(CONFIG).expect("parse sample config");
    let rendered = BookBuilder::new(config)
        .with_manuscript(MANUSCRIPT)
        .with_generated_at("January 01, 2026 - 09:00 AM")
        .render_with_bookmarks()
        .expect("render with bookmarks");

    let document = lopdf::Document::load_mem(&rendered.bytes).expect("reload bookmarked PDF");
    let catalog = document.catalog().expect("catalog present");
    assert!(catalog.has(b"Outlines"));
}

const LONG_CODE_LINE: &str = "    predictions = model.predict(preprocess(load_dataset(\"validation\", shuffle=True, seed=42), normalize=True, augment=False), batch_size=256)";

/// Remembers the width offered to an element and the width it actually used.
struct WidthRecorder<E> {
    inner: E,
    widths: Rc<Cell<Option<(Mm, Mm)>>>,
}

impl<E: Element> Element for WidthRecorder<E> {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: genpdf::render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, genpdf::error::Error> {
        let available = area.size().width;
        let result = self.inner.render(context, area, style)?;
        self.widths.set(Some((available, result.size.width)));
        Ok(result)
    }
}

#[test]
fn long_code_lines_stay_inside_the_text_area() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping long_code_lines_stay_inside_the_text_area: {SKIP_HINT}");
        return;
    }

    let family = fonts::default_font_family().expect("load body font");
    let mut document = DocumentBuilder::new()
        .with_margins(Margins::all(mm_from_f64(25.0)))
        .build(family);
    let widths = Rc::new(Cell::new(None));
    document.push(WidthRecorder {
        inner: code_listing(LONG_CODE_LINE, Style::new().with_font_size(9)),
        widths: widths.clone(),
    });

    let mut bytes = Vec::new();
    document.render(&mut bytes).expect("render listing");

    let (available, used) = widths.get().expect("listing was rendered");
    assert!(
        used <= available,
        "listing width {used:?} exceeds available width {available:?}"
    );
}

#[test]
fn assembled_book_with_custom_theme_renders() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping assembled_book_with_custom_theme_renders: {SKIP_HINT}");
        return;
    }

    let chapter = Chapter::new("Listings", Division::Chapter)
        .with_block(ContentBlock::Paragraph("A long line follows.".into()))
        .with_block(ContentBlock::Code(LONG_CODE_LINE.into()));
    let mut theme = Theme::default();
    theme.code = theme.code.with_font_size(10);

    let rendered = BookBuilder::new(BookConfig::default())
        .with_book(Book::default().with_chapter(chapter))
        .with_theme(theme)
        .with_generated_at("January 01, 2026 - 09:00 AM")
        .render()
        .expect("render assembled book");

    // Title page, then contents, then the chapter.
    assert_eq!(rendered.chapter_pages, vec![Some(3)]);
}

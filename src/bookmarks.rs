//! Bookmark management utilities built on top of `lopdf`.
//!
//! Parts become top-level outline entries with their chapters nested below them.  Chapters that
//! precede the first part sit at the top level.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use thiserror::Error;

use crate::model::{Chapter, Division};

/// Errors that can occur while embedding bookmarks into a rendered PDF document.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("Failed to parse PDF bytes: {0}")]
    Parse(#[from] lopdf::Error),

    #[error("Failed to write PDF bytes: {0}")]
    Write(#[from] std::io::Error),

    #[error("PDF catalog entry is missing")]
    MissingCatalog,

    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,

    #[error("Chapter {chapter_index} refers to missing page {page_number} for bookmark destination")]
    MissingPage {
        chapter_index: usize,
        page_number: usize,
    },
}

/// Adds an outline pointing every chapter at the first page recorded for it.
///
/// Chapters without a recorded page are left out.  When nothing is left to bookmark the input
/// bytes are returned unchanged.
pub fn apply_chapter_bookmarks(
    pdf_bytes: &[u8],
    chapters: &[Chapter],
    chapter_pages: &[Option<usize>],
) -> Result<Vec<u8>, BookmarkError> {
    let mut document = Document::load_mem(pdf_bytes)?;

    let pages = document.get_pages();
    let items = collect_outline(&mut document, chapters, chapter_pages, &pages)?;
    if items.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let outlines_id = document.new_object_id();
    let count = write_level(&mut document, outlines_id, &items);
    insert_outlines_root(outlines_id, &mut document, &items, count)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

#[derive(Debug)]
struct OutlineItem {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
    children: Vec<OutlineItem>,
}

fn collect_outline(
    document: &mut Document,
    chapters: &[Chapter],
    chapter_pages: &[Option<usize>],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineItem>, BookmarkError> {
    let mut roots: Vec<OutlineItem> = Vec::new();
    let mut open_part: Option<usize> = None;

    for (index, (chapter, page)) in chapters.iter().zip(chapter_pages).enumerate() {
        let is_part = chapter.division() == Division::Part;
        let Some(page_number) = *page else {
            if is_part {
                open_part = None;
            }
            continue;
        };

        let page_ref = u32::try_from(page_number)
            .ok()
            .and_then(|number| pages.get(&number).copied())
            .ok_or(BookmarkError::MissingPage {
                chapter_index: index,
                page_number,
            })?;

        let item = OutlineItem {
            object_id: document.new_object_id(),
            page_ref,
            title: chapter.title().to_owned(),
            children: Vec::new(),
        };

        match open_part {
            _ if is_part => {
                roots.push(item);
                open_part = Some(roots.len() - 1);
            }
            Some(part) => roots[part].children.push(item),
            None => roots.push(item),
        }
    }

    Ok(roots)
}

/// Writes `items` as siblings under `parent_id` and returns the number of visible descendants.
fn write_level(document: &mut Document, parent_id: ObjectId, items: &[OutlineItem]) -> i64 {
    let mut visible = 0;

    for (index, item) in items.iter().enumerate() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", Object::string_literal(item.title.as_str()));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(item.page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(parent_id));

        if index > 0 {
            dictionary.set("Prev", Object::Reference(items[index - 1].object_id));
        }
        if let Some(next) = items.get(index + 1) {
            dictionary.set("Next", Object::Reference(next.object_id));
        }

        if let (Some(first), Some(last)) = (item.children.first(), item.children.last()) {
            let children = write_level(document, item.object_id, &item.children);
            dictionary.set("First", Object::Reference(first.object_id));
            dictionary.set("Last", Object::Reference(last.object_id));
            dictionary.set("Count", Object::Integer(children));
            visible += children;
        }

        document
            .objects
            .insert(item.object_id, Object::Dictionary(dictionary));
        visible += 1;
    }

    visible
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    items: &[OutlineItem],
    count: i64,
) -> Result<(), BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(count));
    if let Some(first) = items.first() {
        dictionary.set("First", Object::Reference(first.object_id));
    }
    if let Some(last) = items.last() {
        dictionary.set("Last", Object::Reference(last.object_id));
    }

    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));

    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", Object::Name("UseOutlines".into()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_pages(count: u32) -> BTreeMap<u32, ObjectId> {
        (1..=count).map(|page| (page, (100 + page, 0))).collect()
    }

    fn titles(items: &[OutlineItem]) -> Vec<(&str, Vec<&str>)> {
        items
            .iter()
            .map(|item| {
                let children = item.children.iter().map(|c| c.title.as_str()).collect();
                (item.title.as_str(), children)
            })
            .collect()
    }

    #[test]
    fn chapters_nest_under_preceding_part() {
        let chapters = vec![
            Chapter::new("Introduction", Division::Chapter),
            Chapter::new("PART I: FOUNDATIONS", Division::Part),
            Chapter::new("Chapter 1", Division::Chapter),
            Chapter::new("Chapter 2", Division::Chapter),
            Chapter::new("PART II: PRACTICE", Division::Part),
            Chapter::new("Chapter 3", Division::Chapter),
        ];
        let pages = [Some(4), Some(5), Some(6), Some(8), Some(10), Some(11)];
        let mut document = Document::with_version("1.5");

        let items = collect_outline(&mut document, &chapters, &pages, &fake_pages(12)).unwrap();

        assert_eq!(
            titles(&items),
            vec![
                ("Introduction", vec![]),
                ("PART I: FOUNDATIONS", vec!["Chapter 1", "Chapter 2"]),
                ("PART II: PRACTICE", vec!["Chapter 3"]),
            ]
        );
        assert_eq!(items[1].children[1].page_ref, (108, 0));

        let outlines_id = document.new_object_id();
        assert_eq!(write_level(&mut document, outlines_id, &items), 6);
    }

    #[test]
    fn unrecorded_part_does_not_adopt_chapters() {
        let chapters = vec![
            Chapter::new("PART I", Division::Part),
            Chapter::new("Chapter 1", Division::Chapter),
        ];
        let mut document = Document::with_version("1.5");

        let items =
            collect_outline(&mut document, &chapters, &[None, Some(3)], &fake_pages(3)).unwrap();
        assert_eq!(titles(&items), vec![("Chapter 1", vec![])]);
    }

    #[test]
    fn page_beyond_document_is_an_error() {
        let chapters = vec![Chapter::new("Chapter 1", Division::Chapter)];
        let mut document = Document::with_version("1.5");

        let err =
            collect_outline(&mut document, &chapters, &[Some(9)], &fake_pages(2)).unwrap_err();
        assert!(matches!(
            err,
            BookmarkError::MissingPage {
                chapter_index: 0,
                page_number: 9
            }
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = apply_chapter_bookmarks(b"not a pdf", &[], &[]).unwrap_err();
        assert!(matches!(err, BookmarkError::Parse(_)));
    }
}

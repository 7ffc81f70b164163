//! Turns a Markdown manuscript into a typeset PDF book.
//!
//! The pipeline runs in three stages:
//!
//! 1. [`blocks::split_blocks`] cuts the manuscript into headings, bold lines, lists, code
//!    listings and paragraphs.
//! 2. [`model::Book::assemble`] groups those blocks into parts and chapters, dropping the
//!    front-matter sections the book regenerates itself.
//! 3. [`builder::BookBuilder`] lays out the title page, front matter, table of contents, chapters
//!    and publisher page with `genpdf`, using [`config::BookConfig`] for the book metadata.
//!
//! ```no_run
//! use bookpress::builder::BookBuilder;
//!
//! let rendered = BookBuilder::from_paths("book.toml", "manuscript.md")?.render()?;
//! std::fs::write("book.pdf", rendered.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod blocks;
pub mod builder;
pub mod config;
pub mod elements;
pub mod fonts;
pub mod model;
pub mod richtext;
pub mod theme;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

//! Book description loaded from TOML.
//!
//! Everything that used to be a hardcoded constant in a book generator (titles, publisher
//! contacts, dedication and preface text, page setup) lives in a [`BookConfig`].  Every section
//! and field has a default, so partial files are accepted.

use std::path::{Path, PathBuf};

use genpdf::{PaperSize, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a [`BookConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Complete description of a book apart from its manuscript.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    pub book: BookInfo,
    pub publisher: PublisherInfo,
    pub front_matter: FrontMatter,
    pub page: PageSetup,
}

/// Title page text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookInfo {
    pub title: String,
    /// Small line printed above the title.
    pub kicker: Option<String>,
    pub subtitles: Vec<String>,
    pub edition: Option<String>,
    pub copyright: Option<String>,
}

impl Default for BookInfo {
    fn default() -> Self {
        Self {
            title: "Untitled Book".to_owned(),
            kicker: None,
            subtitles: Vec::new(),
            edition: None,
            copyright: None,
        }
    }
}

/// Publisher details shown on the title page, in the header and on the closing page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherInfo {
    pub name: Option<String>,
    pub owner: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub github: Option<String>,
    /// Paragraph for the "About the publisher" page.
    pub about: Option<String>,
}

impl PublisherInfo {
    /// Labelled contact rows in display order, skipping unset fields.
    pub fn contact_rows(&self) -> Vec<(&'static str, &str)> {
        [
            ("Owner", &self.owner),
            ("Email", &self.email),
            ("Contact", &self.phone),
            ("Address", &self.address),
            ("GitHub", &self.github),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|value| (label, value)))
        .collect()
    }
}

/// Generated front matter and the manuscript headings it replaces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub dedication: Option<String>,
    pub preface: Vec<String>,
    pub table_of_contents: bool,
    /// Manuscript headings containing any of these are dropped together with their content.
    pub skip_headings: Vec<String>,
    /// Level-1 headings starting with this prefix open a part instead of a chapter.
    pub part_prefix: String,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            dedication: None,
            preface: Vec::new(),
            table_of_contents: true,
            skip_headings: ["Title Page", "TABLE OF CONTENTS", "DEDICATION", "PREFACE"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            part_prefix: "PART".to_owned(),
        }
    }
}

/// Paper sizes accepted in the `[page]` section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paper {
    #[default]
    A4,
    Letter,
    Legal,
}

impl From<Paper> for Size {
    fn from(paper: Paper) -> Self {
        match paper {
            Paper::A4 => PaperSize::A4.into(),
            Paper::Letter => PaperSize::Letter.into(),
            Paper::Legal => PaperSize::Legal.into(),
        }
    }
}

/// Page geometry and decoration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSetup {
    pub paper: Paper,
    pub margins_mm: f64,
    /// Print a "Generated: ..." timestamp in the page header.
    pub timestamp: bool,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            paper: Paper::A4,
            margins_mm: 25.0,
            timestamp: true,
        }
    }
}

impl BookConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads the configuration stored at `config_path`.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        let content =
            std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            config_path: config_path.to_path_buf(),
            source,
        })
    }

    /// Text for the running page header, `"{publisher} | {title}"` when a publisher is set.
    pub fn header_title(&self) -> String {
        match &self.publisher.name {
            Some(name) => format!("{} | {}", name, self.book.title),
            None => self.book.title.clone(),
        }
    }
}

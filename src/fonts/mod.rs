//! Font loading utilities for the `bookpress` crate.
//!
//! The body family is searched in this order: the directory named by `BOOKPRESS_FONTS_DIR`, an
//! `assets/fonts` directory next to the executable, the crate's own `assets/fonts`, and finally
//! well-known system families (Liberation Sans, DejaVu Sans, Windows Arial).  Code listings use a
//! monospace family resolved the same way; when none is found they fall back to the body family.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Name of the optional bundled monospace family.
pub const MONOSPACE_FONT_FAMILY_NAME: &str = "RobotoMono";

/// File names of the four faces of one family.
#[derive(Clone, Copy, Debug)]
struct FontFiles {
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

impl FontFiles {
    fn all(&self) -> [&'static str; 4] {
        [self.regular, self.bold, self.italic, self.bold_italic]
    }
}

/// A family together with the directories it is usually installed in.
struct KnownFamily {
    name: &'static str,
    files: FontFiles,
    directories: fn() -> Vec<PathBuf>,
}

const BUNDLED: FontFiles = FontFiles {
    regular: "Roboto-Regular.ttf",
    bold: "Roboto-Bold.ttf",
    italic: "Roboto-Italic.ttf",
    bold_italic: "Roboto-BoldItalic.ttf",
};

const BUNDLED_MONO: FontFiles = FontFiles {
    regular: "RobotoMono-Regular.ttf",
    bold: "RobotoMono-Bold.ttf",
    italic: "RobotoMono-Italic.ttf",
    bold_italic: "RobotoMono-BoldItalic.ttf",
};

const SYSTEM_FAMILIES: &[KnownFamily] = &[
    KnownFamily {
        name: "Liberation Sans",
        files: FontFiles {
            regular: "LiberationSans-Regular.ttf",
            bold: "LiberationSans-Bold.ttf",
            italic: "LiberationSans-Italic.ttf",
            bold_italic: "LiberationSans-BoldItalic.ttf",
        },
        directories: liberation_directories,
    },
    KnownFamily {
        name: "DejaVu Sans",
        files: FontFiles {
            regular: "DejaVuSans.ttf",
            bold: "DejaVuSans-Bold.ttf",
            italic: "DejaVuSans-Oblique.ttf",
            bold_italic: "DejaVuSans-BoldOblique.ttf",
        },
        directories: dejavu_directories,
    },
    KnownFamily {
        name: "Arial",
        files: FontFiles {
            regular: "arial.ttf",
            bold: "arialbd.ttf",
            italic: "ariali.ttf",
            bold_italic: "arialbi.ttf",
        },
        directories: windows_directories,
    },
];

const SYSTEM_MONO_FAMILIES: &[KnownFamily] = &[
    KnownFamily {
        name: "Liberation Mono",
        files: FontFiles {
            regular: "LiberationMono-Regular.ttf",
            bold: "LiberationMono-Bold.ttf",
            italic: "LiberationMono-Italic.ttf",
            bold_italic: "LiberationMono-BoldItalic.ttf",
        },
        directories: liberation_directories,
    },
    KnownFamily {
        name: "DejaVu Sans Mono",
        files: FontFiles {
            regular: "DejaVuSansMono.ttf",
            bold: "DejaVuSansMono-Bold.ttf",
            italic: "DejaVuSansMono-Oblique.ttf",
            bold_italic: "DejaVuSansMono-BoldOblique.ttf",
        },
        directories: dejavu_directories,
    },
    KnownFamily {
        name: "Courier New",
        files: FontFiles {
            regular: "cour.ttf",
            bold: "courbd.ttf",
            italic: "couri.ttf",
            bold_italic: "courbi.ttf",
        },
        directories: windows_directories,
    },
];

fn liberation_directories() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/liberation",
        "/usr/share/fonts/truetype/liberation2",
        "/usr/share/fonts/liberation-sans",
        "/usr/share/fonts/liberation-mono",
        "/usr/share/fonts/TTF",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

fn dejavu_directories() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/dejavu-sans-fonts",
        "/usr/share/fonts/dejavu-sans-mono-fonts",
        "/usr/share/fonts/TTF",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn windows_directories() -> Vec<PathBuf> {
    if let Some(path) = env_path("BOOKPRESS_WINDOWS_FONTS_DIR") {
        return vec![path];
    }

    ["WINDIR", "SystemRoot"]
        .into_iter()
        .filter_map(env_path)
        .map(|root| root.join("Fonts"))
        .collect()
}

/// Returns the `assets/fonts` directory shipped with the crate sources.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path("BOOKPRESS_FONTS_DIR") {
        candidates.push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = bundled_fonts_source_dir();
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn missing_font_files(path: &Path, files: FontFiles) -> Vec<&'static str> {
    files
        .all()
        .into_iter()
        .filter(|name| !path.join(name).is_file())
        .collect()
}

fn load_face(directory: &Path, file: &str, family: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load {} face {} from {}: {}",
                family,
                file,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn load_family(
    directory: &Path,
    family: &str,
    files: FontFiles,
) -> Result<FontFamily<FontData>, Error> {
    Ok(FontFamily {
        regular: load_face(directory, files.regular, family)?,
        bold: load_face(directory, files.bold, family)?,
        italic: load_face(directory, files.italic, family)?,
        bold_italic: load_face(directory, files.bold_italic, family)?,
    })
}

/// Walks `candidates` and returns the first directory holding every face in `files`.
///
/// The error lists every directory that was checked and why it was rejected.
fn resolve_directory(candidates: &[PathBuf], files: FontFiles) -> Result<PathBuf, Vec<String>> {
    let mut attempts = Vec::new();

    for candidate in candidates {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_font_files(candidate, files);
        if missing.is_empty() {
            return Ok(candidate.clone());
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(attempts)
}

fn find_system_family(families: &[KnownFamily]) -> Option<(&'static str, FontFiles, PathBuf)> {
    families.iter().find_map(|family| {
        resolve_directory(&(family.directories)(), family.files)
            .ok()
            .map(|directory| (family.name, family.files, directory))
    })
}

fn not_found(message: String) -> Error {
    Error::new(
        message,
        io::Error::new(io::ErrorKind::NotFound, "default fonts are not available"),
    )
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the bundled Roboto family, falling back to a system family when it is missing.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let candidates = font_directory_candidates();
    let attempts = match resolve_directory(&candidates, BUNDLED) {
        Ok(directory) => {
            debug!("Loading {} from {}", DEFAULT_FONT_FAMILY_NAME, directory.display());
            return load_family(&directory, DEFAULT_FONT_FAMILY_NAME, BUNDLED);
        }
        Err(attempts) => attempts,
    };

    let bundled_error = not_found(format!(
        "Unable to locate bundled font directory. Checked: {}. See assets/fonts/README.md or set BOOKPRESS_FONTS_DIR.",
        if attempts.is_empty() {
            "no search paths were available".to_owned()
        } else {
            attempts.join(", ")
        }
    ));

    match find_system_family(SYSTEM_FAMILIES) {
        Some((name, files, directory)) => {
            warn!(
                "Bundled fonts unavailable ({}); falling back to system '{}' family in {}.",
                bundled_error,
                name,
                directory.display()
            );
            load_family(&directory, name, files)
        }
        None => {
            warn!("Bundled fonts unavailable and no system fallback family was found.");
            Err(bundled_error)
        }
    }
}

/// Returns a monospace family for code listings, if one can be found.
pub fn monospace_font_family() -> Option<FontFamily<FontData>> {
    let candidates = font_directory_candidates();
    let located = match resolve_directory(&candidates, BUNDLED_MONO) {
        Ok(directory) => Some((MONOSPACE_FONT_FAMILY_NAME, BUNDLED_MONO, directory)),
        Err(_) => find_system_family(SYSTEM_MONO_FAMILIES),
    };

    let Some((name, files, directory)) = located else {
        debug!("No monospace family found; code listings use the body font.");
        return None;
    };

    match load_family(&directory, name, files) {
        Ok(family) => {
            debug!("Loaded monospace family '{}' from {}", name, directory.display());
            Some(family)
        }
        Err(err) => {
            warn!("Ignoring monospace family '{}': {}", name, err);
            None
        }
    }
}

/// Indicates whether any usable body font family can be found.
pub fn default_fonts_available() -> bool {
    match default_font_family() {
        Ok(_) => true,
        Err(err) => {
            if !fonts_missing(&err) {
                warn!("Font family present but failed to load: {}", err);
            }
            false
        }
    }
}

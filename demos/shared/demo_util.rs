use std::error::Error;
use std::path::{Path, PathBuf};

use bookpress::builder::BookBuilder;

/// Directory holding the sample manuscript and its book configuration.
fn content_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join("content")
}

/// Initialises logging and loads the sample AI guide.
pub fn build_ai_guide_builder() -> Result<BookBuilder, Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let content = content_dir();
    let builder =
        BookBuilder::from_paths(content.join("ai_guide.toml"), content.join("ai_guide.md"))?;
    Ok(builder)
}

/// Writes `bytes` below `target/demos` and returns the written path.
pub fn write_output(file_name: &str, bytes: &[u8]) -> Result<PathBuf, Box<dyn Error>> {
    let directory = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("demos");
    std::fs::create_dir_all(&directory)?;
    let path = directory.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

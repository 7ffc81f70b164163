#[path = "shared/demo_util.rs"]
#[cfg_attr(not(feature = "bookmarks"), allow(dead_code))]
mod demo_util;

#[cfg(feature = "bookmarks")]
use std::error::Error;

#[cfg(feature = "bookmarks")]
fn main() -> Result<(), Box<dyn Error>> {
    let builder = demo_util::build_ai_guide_builder()?;
    let book = builder.render_with_bookmarks()?;
    let path = demo_util::write_output("AI_Comprehensive_Guide_bookmarks.pdf", &book.bytes)?;
    println!(
        "Generated {} ({} bytes) with part and chapter bookmarks",
        path.display(),
        book.bytes.len()
    );
    Ok(())
}

#[cfg(not(feature = "bookmarks"))]
fn main() {
    eprintln!(
        "Enable the `bookmarks` feature to run this example: \
         cargo run --example ai_guide_bookmarks --features bookmarks"
    );
}

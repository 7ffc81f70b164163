#[path = "shared/demo_util.rs"]
mod demo_util;

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let builder = demo_util::build_ai_guide_builder()?;
    let book = builder.render()?;
    let path = demo_util::write_output("AI_Comprehensive_Guide.pdf", &book.bytes)?;
    println!(
        "Generated {} ({} bytes, {} chapters)",
        path.display(),
        book.bytes.len(),
        book.chapter_pages.len()
    );
    Ok(())
}

use bookpress::blocks::{split_blocks, split_blocks_strict, ContentBlock, HeadingLevel, SplitError};
use pretty_assertions::assert_eq;

const CHAPTER: &str = "\
# Chapter 3: Machine Learning

## 3.1 Supervised Learning
Supervised learning trains a model
on labelled examples.

**Key algorithms:**
- Linear regression
- Decision trees
- Support vector machines

### Example
```python
from sklearn.linear_model import LinearRegression

model = LinearRegression()
model.fit(X, y)
```

#### Notes
The *fit* step learns `coef_`.
";

fn blocks(input: &str) -> Vec<ContentBlock> {
    split_blocks(input).collect()
}

fn paragraph(text: &str) -> ContentBlock {
    ContentBlock::Paragraph(text.to_owned())
}

#[test]
fn blank_input_has_no_blocks() {
    assert_eq!(blocks(""), Vec::new());
    assert_eq!(blocks("\n   \n\t\n"), Vec::new());
}

#[test]
fn heading_levels_map_to_marker_count() {
    assert_eq!(
        blocks("# Title\n## Section\n### Subsection\n#### Minor"),
        vec![
            ContentBlock::Heading(HeadingLevel::H1, "Title".into()),
            ContentBlock::Heading(HeadingLevel::H2, "Section".into()),
            ContentBlock::Heading(HeadingLevel::H3, "Subsection".into()),
            ContentBlock::Heading(HeadingLevel::H4, "Minor".into()),
        ]
    );
}

#[test]
fn consecutive_items_form_one_list() {
    assert_eq!(
        blocks("- a\n- b\n- c"),
        vec![ContentBlock::List(vec!["a".into(), "b".into(), "c".into()])]
    );
}

#[test]
fn blank_line_splits_lists() {
    assert_eq!(
        blocks("- a\n\n- b"),
        vec![
            ContentBlock::List(vec!["a".into()]),
            ContentBlock::List(vec!["b".into()]),
        ]
    );
}

#[test]
fn fenced_block_excludes_fences() {
    assert_eq!(
        blocks("```\nline one\n\nline three\n```"),
        vec![ContentBlock::Code("line one\n\nline three".into())]
    );
}

#[test]
fn fence_contents_are_not_classified() {
    assert_eq!(
        blocks("```\n# not a heading\n- not an item\n```"),
        vec![ContentBlock::Code("# not a heading\n- not an item".into())]
    );
}

#[test]
fn adjacent_lines_merge_into_one_paragraph() {
    assert_eq!(blocks("Hello\nWorld"), vec![paragraph("Hello World")]);
    assert_eq!(
        blocks("Hello\n\nWorld"),
        vec![paragraph("Hello"), paragraph("World")]
    );
}

#[test]
fn paragraph_stops_at_heading_and_bold_line() {
    assert_eq!(
        blocks("Some text\n## Next\nMore\n**Bold**"),
        vec![
            paragraph("Some text"),
            ContentBlock::Heading(HeadingLevel::H2, "Next".into()),
            paragraph("More"),
            ContentBlock::Bold("Bold".into()),
        ]
    );
}

#[test]
fn full_chapter_splits_in_order() {
    assert_eq!(
        blocks(CHAPTER),
        vec![
            ContentBlock::Heading(HeadingLevel::H1, "Chapter 3: Machine Learning".into()),
            ContentBlock::Heading(HeadingLevel::H2, "3.1 Supervised Learning".into()),
            paragraph("Supervised learning trains a model on labelled examples."),
            ContentBlock::Bold("Key algorithms:".into()),
            ContentBlock::List(vec![
                "Linear regression".into(),
                "Decision trees".into(),
                "Support vector machines".into(),
            ]),
            ContentBlock::Heading(HeadingLevel::H3, "Example".into()),
            ContentBlock::Code(
                "from sklearn.linear_model import LinearRegression\n\nmodel = LinearRegression()\nmodel.fit(X, y)"
                    .into()
            ),
            ContentBlock::Heading(HeadingLevel::H4, "Notes".into()),
            paragraph("The *fit* step learns `coef_`."),
        ]
    );
}

#[test]
fn splitting_is_repeatable() {
    assert_eq!(blocks(CHAPTER), blocks(CHAPTER));
}

#[test]
fn every_content_line_is_accounted_for() {
    let expected = CHAPTER
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .count();
    let consumed: usize = split_blocks(CHAPTER)
        .spanned()
        .map(|spanned| spanned.source_lines)
        .sum();
    assert_eq!(consumed, expected);
}

#[test]
fn spans_are_ordered_and_disjoint() {
    let spans: Vec<_> = split_blocks(CHAPTER).spanned().collect();
    for pair in spans.windows(2) {
        assert!(pair[0].last_line < pair[1].first_line);
    }
    assert_eq!(spans[0].first_line, 1);
}

#[test]
fn unterminated_fence_runs_to_end_in_lenient_mode() {
    let input = "Intro\n```\nlet x = 1;\n\nlet y = 2;";
    let mut iter = split_blocks(input);
    let collected: Vec<_> = iter.by_ref().collect();

    assert_eq!(
        collected,
        vec![
            paragraph("Intro"),
            ContentBlock::Code("let x = 1;\n\nlet y = 2;".into()),
        ]
    );
    assert_eq!(iter.unterminated_fence(), Some(2));
}

#[test]
fn unterminated_fence_is_an_error_in_strict_mode() {
    assert_eq!(
        split_blocks_strict("Intro\n```\nlet x = 1;"),
        Err(SplitError::UnterminatedFence { line: 2 })
    );
    assert_eq!(
        split_blocks_strict("```\nok\n```"),
        Ok(vec![ContentBlock::Code("ok".into())])
    );
}

#[test]
fn stray_markers_always_make_progress() {
    let input = "#\n**\n##### five\n#tag\n- \n```";
    let blocks: Vec<_> = split_blocks(input).take(100).collect();
    assert!(blocks.len() < 100);
    assert!(matches!(blocks.last(), Some(ContentBlock::Code(code)) if code.is_empty()));
}

//! Markdown → typed block sequence
//!
//! Recovers headings (levels 1-3) and paragraphs from rendered Markdown.
//! Inline markup survives as literal text; anything unrecognized becomes
//! paragraph text, so segmentation never fails.

use serde::Serialize;

/// Heading depth supported by the block destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeadingLevel {
    One,
    Two,
    Three,
}

impl HeadingLevel {
    /// Destination block type name
    pub fn block_type(&self) -> &'static str {
        match self {
            HeadingLevel::One => "heading_1",
            HeadingLevel::Two => "heading_2",
            HeadingLevel::Three => "heading_3",
        }
    }
}

/// One unit of structured output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading { level: HeadingLevel, text: String },
    /// Fragments concatenate to the final text; every fragment after the
    /// first starts with a line break.
    Paragraph { fragments: Vec<String> },
}

impl Block {
    pub fn heading(level: HeadingLevel, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    /// Single-fragment paragraph
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            fragments: vec![text.into()],
        }
    }

    /// Destination block type name
    pub fn block_type(&self) -> &'static str {
        match self {
            Block::Heading { level, .. } => level.block_type(),
            Block::Paragraph { .. } => "paragraph",
        }
    }

    /// Plain text carried by the block
    pub fn text(&self) -> String {
        match self {
            Block::Heading { text, .. } => text.clone(),
            Block::Paragraph { fragments } => fragments.concat(),
        }
    }
}

const HEADING_PREFIXES: [(&str, HeadingLevel); 3] = [
    ("# ", HeadingLevel::One),
    ("## ", HeadingLevel::Two),
    ("### ", HeadingLevel::Three),
];

fn heading_of(line: &str) -> Option<(HeadingLevel, &str)> {
    HEADING_PREFIXES
        .iter()
        .find_map(|(prefix, level)| line.strip_prefix(prefix).map(|rest| (*level, rest)))
}

/// Split Markdown into heading and paragraph blocks.
///
/// Lines are compared trimmed. A blank line ends the open paragraph only
/// when the next line has content; runs of blank lines never produce empty
/// blocks.
pub fn segment_markdown(markdown: &str) -> Vec<Block> {
    let lines: Vec<&str> = markdown.split('\n').map(str::trim).collect();
    let mut blocks = Vec::new();
    let mut open: Vec<String> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if let Some((level, text)) = heading_of(line) {
            flush(&mut open, &mut blocks);
            blocks.push(Block::heading(level, text));
        } else if line.is_empty() {
            let next_has_content = lines.get(i + 1).is_some_and(|next| !next.is_empty());
            if !open.is_empty() && next_has_content {
                flush(&mut open, &mut blocks);
            }
        } else if open.is_empty() {
            open.push(line.to_string());
        } else {
            open.push(format!("\n{line}"));
        }
    }

    flush(&mut open, &mut blocks);
    blocks
}

fn flush(open: &mut Vec<String>, blocks: &mut Vec<Block>) {
    if !open.is_empty() {
        blocks.push(Block::Paragraph {
            fragments: std::mem::take(open),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_paragraph_yields_one_block() {
        let blocks = segment_markdown("just some text\nspanning lines\nwith no headings");
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].text(),
            "just some text\nspanning lines\nwith no headings"
        );
        assert_eq!(blocks[0].block_type(), "paragraph");
    }

    #[test]
    fn test_headings_by_level() {
        let blocks = segment_markdown("# One\n## Two\n### Three\n#### Four");
        assert_eq!(
            blocks,
            vec![
                Block::heading(HeadingLevel::One, "One"),
                Block::heading(HeadingLevel::Two, "Two"),
                Block::heading(HeadingLevel::Three, "Three"),
                Block::paragraph("#### Four"),
            ]
        );
    }

    #[test]
    fn test_heading_closes_open_paragraph() {
        let blocks = segment_markdown("intro line\n## Section\nbody");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::paragraph("intro line"));
        assert_eq!(blocks[1], Block::heading(HeadingLevel::Two, "Section"));
        assert_eq!(blocks[2], Block::paragraph("body"));
    }

    #[test]
    fn test_single_blank_line_separates_paragraphs() {
        let blocks = segment_markdown("first\n\nsecond");
        assert_eq!(blocks, vec![Block::paragraph("first"), Block::paragraph("second")]);
    }

    #[test]
    fn test_blank_runs_are_absorbed() {
        let blocks = segment_markdown("first\n\n\n\nsecond\n\n\n");
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| !b.text().is_empty()));
    }

    #[test]
    fn test_multi_line_fragments_carry_breaks() {
        let blocks = segment_markdown("a\nb\nc");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                fragments: vec!["a".to_string(), "\nb".to_string(), "\nc".to_string()]
            }]
        );
    }

    #[test]
    fn test_lines_are_trimmed() {
        let blocks = segment_markdown("   ### Human  \n   indented text   ");
        assert_eq!(blocks[0], Block::heading(HeadingLevel::Three, "Human"));
        assert_eq!(blocks[1], Block::paragraph("indented text"));
    }

    #[test]
    fn test_markup_survives_as_text() {
        let blocks = segment_markdown("**bold** and [1](https://a)");
        assert_eq!(blocks[0].text(), "**bold** and [1](https://a)");
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_markdown("").is_empty());
        assert!(segment_markdown("\n\n  \n").is_empty());
    }

    #[test]
    fn test_rendered_transcript_shape() {
        let md = "# DeepSeek - T (Total Tokens: 5)\n\n### Human\n*2024-01-01T00:00:00.000Z*\n\nhello\n\n### Assistant\n*2024-01-01T00:00:01.000Z*\n\nhi\n";
        let kinds: Vec<_> = segment_markdown(md).iter().map(|b| b.block_type()).collect();
        assert_eq!(
            kinds,
            vec![
                "heading_1",
                "heading_3",
                "paragraph",
                "paragraph",
                "heading_3",
                "paragraph",
                "paragraph"
            ]
        );
    }
}

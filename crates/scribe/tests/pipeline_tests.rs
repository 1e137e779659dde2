//! End-to-end tests for the capture → Markdown → blocks pipeline
//!
//! Drives raw chat-history bodies through the transcript builder, the
//! renderer and the block segmenter/capper without any network.

use scribe::blocks::{Block, BlockCapper, HeadingLevel, markdown_to_blocks, segment_markdown};
use scribe::render::{RenderedDocument, render_markdown};
use scribe::testing::CaptureBuilder;
use scribe::transcript::{UNTITLED_CHAT, build_transcript};

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_two_turn_conversation_renders_expected_markdown() {
    let raw = CaptureBuilder::new("Rust questions")
        .human("What is ownership?", 12)
        .assistant("Every value has one owner.", 30)
        .build();

    let transcript = build_transcript(&raw).unwrap();
    let markdown = render_markdown(&transcript, "DeepSeek");

    assert_eq!(
        markdown,
        "# DeepSeek - Rust questions (Total Tokens: 42)\n\n\
         ### Human\n*2023-11-14T22:13:20.000Z*\n\nWhat is ownership?\n\n\
         ### Assistant\n*2023-11-14T22:14:20.000Z*\n\nEvery value has one owner.\n"
    );
}

#[test]
fn test_untitled_session_uses_placeholder() {
    let raw = CaptureBuilder::untitled().human("hi", 1).build();
    let document =
        RenderedDocument::from_transcript(&build_transcript(&raw).unwrap(), "DeepSeek");

    assert_eq!(document.title, UNTITLED_CHAT);
    assert!(document.markdown.starts_with("# DeepSeek - Untitled Chat (Total Tokens: 1)"));
}

#[test]
fn test_citations_reasoning_and_math_in_one_turn() {
    let raw = CaptureBuilder::new("Physics")
        .assistant_with(
            "Energy is $$E =\nmc^2$$ [citation:1] .",
            5,
            &[(1, "https://physics.example")],
            Some(("recall relativity", 3.0)),
        )
        .build();

    let transcript = build_transcript(&raw).unwrap();
    let body = &transcript.turns()[0].body;

    assert!(body.contains("[1](https://physics.example)."));
    assert!(body.contains("\n$$\nE =\nmc^2\n$$\n"));
    assert!(body.ends_with("**Thinking Process (3s):**\nrecall relativity"));
}

// =============================================================================
// Blocks
// =============================================================================

#[test]
fn test_rendered_document_segments_into_headings_and_paragraphs() {
    let raw = CaptureBuilder::new("Plans")
        .human("line one\nline two", 1)
        .assistant("reply", 1)
        .build();
    let markdown = render_markdown(&build_transcript(&raw).unwrap(), "DeepSeek");

    let blocks = segment_markdown(&markdown);
    let kinds: Vec<&str> = blocks.iter().map(Block::block_type).collect();
    assert_eq!(
        kinds,
        vec![
            "heading_1",
            "heading_3",
            "paragraph",
            "paragraph",
            "heading_3",
            "paragraph",
            "paragraph",
        ]
    );
    assert_eq!(
        blocks[0],
        Block::heading(HeadingLevel::One, "DeepSeek - Plans (Total Tokens: 2)")
    );
    assert_eq!(blocks[3].text(), "line one\nline two");
}

#[test]
fn test_long_conversation_is_capped_with_advisory() {
    let raw = CaptureBuilder::new("Marathon").turns(150).build();
    let markdown = render_markdown(&build_transcript(&raw).unwrap(), "DeepSeek");

    let capped = markdown_to_blocks(&markdown, &BlockCapper::default());

    // Title + 3 segments per turn
    assert_eq!(capped.segment_count, 1 + 150 * 3);
    assert!(capped.truncated);
    assert_eq!(capped.blocks.len(), 95);
    assert_eq!(capped.emitted_segments, 93);
    assert!(capped.blocks[94].text().starts_with("⚠️"));
}

#[test]
fn test_short_conversation_is_not_capped() {
    let raw = CaptureBuilder::new("Short").turns(4).build();
    let markdown = render_markdown(&build_transcript(&raw).unwrap(), "DeepSeek");

    let capped = markdown_to_blocks(&markdown, &BlockCapper::default());
    assert!(!capped.truncated);
    assert_eq!(capped.blocks.len(), capped.segment_count + 1);
    assert_eq!(capped.dropped(), 0);
}

#[test]
fn test_malformed_capture_never_reaches_rendering() {
    assert!(build_transcript("{\"data\": {}}").is_err());
    assert!(build_transcript("").is_err());
}

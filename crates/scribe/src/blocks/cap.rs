//! Bounding a block sequence to a destination's per-request ceiling
//!
//! The emitted sequence is: one introductory block, then as many segments
//! as fit, then (only if something was dropped) one advisory block. Both the
//! intro and the advisory count against the ceiling, so the output length is
//! always `<= ceiling`.

use serde::Serialize;

use super::segment::Block;

/// Default number of blocks sent per page request
pub const DEFAULT_BLOCK_CEILING: usize = 95;

/// Hard limit of children per request imposed by the destination API
pub const DESTINATION_BLOCK_LIMIT: usize = 100;

const DEFAULT_INTRO: &str = "Content exported by Scribe";
const DEFAULT_ADVISORY: &str = "⚠️ Due to Notion API limits only part of this conversation is shown. \
Export it as a Markdown file to read the full content.";

/// Result of capping a segmented document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CappedBlocks {
    /// Intro, kept segments and (if truncated) the advisory
    pub blocks: Vec<Block>,
    /// Number of segments before capping
    pub segment_count: usize,
    /// Number of segments that made it into `blocks`
    pub emitted_segments: usize,
    pub truncated: bool,
}

impl CappedBlocks {
    /// Segments left out
    pub fn dropped(&self) -> usize {
        self.segment_count - self.emitted_segments
    }
}

/// Caps segmented blocks at a fixed ceiling
#[derive(Debug, Clone)]
pub struct BlockCapper {
    ceiling: usize,
    intro: String,
    advisory: String,
}

impl Default for BlockCapper {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_CEILING)
    }
}

impl BlockCapper {
    /// Create a capper; the ceiling is clamped to `2..=DESTINATION_BLOCK_LIMIT`
    /// so there is always room for the intro and the advisory.
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling: ceiling.clamp(2, DESTINATION_BLOCK_LIMIT),
            intro: DEFAULT_INTRO.to_string(),
            advisory: DEFAULT_ADVISORY.to_string(),
        }
    }

    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = intro.into();
        self
    }

    pub fn with_advisory(mut self, advisory: impl Into<String>) -> Self {
        self.advisory = advisory.into();
        self
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Bound `segments` to the ceiling.
    pub fn cap(&self, segments: Vec<Block>) -> CappedBlocks {
        let segment_count = segments.len();
        // One slot is always taken by the intro
        let budget = self.ceiling - 1;
        let truncated = segment_count > budget;
        // The advisory takes one more slot from the same budget
        let keep = if truncated { budget - 1 } else { segment_count };

        let mut blocks = Vec::with_capacity(keep + 2);
        blocks.push(Block::paragraph(self.intro.clone()));
        blocks.extend(segments.into_iter().take(keep));
        if truncated {
            blocks.push(Block::paragraph(self.advisory.clone()));
            tracing::debug!(
                "Capped {} segments to {} (ceiling {})",
                segment_count,
                keep,
                self.ceiling
            );
        }

        CappedBlocks {
            blocks,
            segment_count,
            emitted_segments: keep,
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(n: usize) -> Vec<Block> {
        (0..n).map(|i| Block::paragraph(format!("p{i}"))).collect()
    }

    #[test]
    fn test_small_document_is_not_truncated() {
        let capped = BlockCapper::default().cap(paragraphs(3));
        assert!(!capped.truncated);
        assert_eq!(capped.blocks.len(), 4);
        assert_eq!(capped.blocks[0].text(), DEFAULT_INTRO);
        assert_eq!(capped.blocks[3].text(), "p2");
        assert_eq!(capped.dropped(), 0);
    }

    #[test]
    fn test_two_hundred_paragraphs_capped_at_ceiling() {
        let capped = BlockCapper::new(95).cap(paragraphs(200));
        assert!(capped.truncated);
        assert_eq!(capped.blocks.len(), 95);
        assert_eq!(capped.emitted_segments, 93);
        assert_eq!(capped.dropped(), 107);
        assert_eq!(capped.blocks[0].text(), DEFAULT_INTRO);
        assert_eq!(capped.blocks[93].text(), "p92");
        assert_eq!(capped.blocks[94].text(), DEFAULT_ADVISORY);
    }

    #[test]
    fn test_exact_fit_has_no_advisory() {
        let capped = BlockCapper::new(95).cap(paragraphs(94));
        assert!(!capped.truncated);
        assert_eq!(capped.blocks.len(), 95);
        assert_eq!(capped.blocks[94].text(), "p93");
    }

    #[test]
    fn test_one_over_triggers_advisory() {
        let capped = BlockCapper::new(95).cap(paragraphs(95));
        assert!(capped.truncated);
        assert_eq!(capped.blocks.len(), 95);
        assert_eq!(capped.emitted_segments, 93);
    }

    #[test]
    fn test_never_exceeds_ceiling() {
        for ceiling in [2, 3, 10, 95, 100] {
            let capper = BlockCapper::new(ceiling);
            for n in [0, 1, ceiling - 1, ceiling, ceiling + 1, 500] {
                let capped = capper.cap(paragraphs(n));
                assert!(
                    capped.blocks.len() <= ceiling,
                    "ceiling {ceiling}, {n} segments -> {}",
                    capped.blocks.len()
                );
            }
        }
    }

    #[test]
    fn test_ceiling_is_clamped() {
        assert_eq!(BlockCapper::new(500).ceiling(), DESTINATION_BLOCK_LIMIT);
        assert_eq!(BlockCapper::new(0).ceiling(), 2);
    }

    #[test]
    fn test_minimal_ceiling_keeps_intro_and_advisory() {
        let capped = BlockCapper::new(2).cap(paragraphs(5));
        assert_eq!(capped.blocks.len(), 2);
        assert_eq!(capped.emitted_segments, 0);
        assert!(capped.truncated);
    }

    #[test]
    fn test_custom_texts() {
        let capped = BlockCapper::new(3)
            .with_intro("hello")
            .with_advisory("cut")
            .cap(paragraphs(4));
        assert_eq!(capped.blocks.first().unwrap().text(), "hello");
        assert_eq!(capped.blocks.last().unwrap().text(), "cut");
    }
}

//! Block segmenter and capper
//!
//! Derives the block representation sent to the remote document sink from
//! a rendered Markdown document. Blocks are recomputed on every export.

mod cap;
mod segment;

pub use cap::{BlockCapper, CappedBlocks, DEFAULT_BLOCK_CEILING, DESTINATION_BLOCK_LIMIT};
pub use segment::{Block, HeadingLevel, segment_markdown};

/// Segment `markdown` and cap the result in one step
pub fn markdown_to_blocks(markdown: &str, capper: &BlockCapper) -> CappedBlocks {
    capper.cap(segment_markdown(markdown))
}

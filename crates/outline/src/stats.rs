use serde::{Deserialize, Serialize};

use crate::types::Block;

/// Font sizes at or below this are treated as extraction noise (superscripts,
/// footnote markers, hidden text) and left out of the median.
pub const NOISE_FONT_SIZE: f32 = 6.0;

/// Median used when no block has a usable font size.
pub const DEFAULT_MEDIAN_FONT: f32 = 12.0;

/// Document-wide reference values, computed once before any block is judged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatistics {
    /// Normalisation basis for every relative-size threshold.
    pub median_font: f32,
}

impl DocumentStatistics {
    pub fn from_blocks(blocks: &[Block]) -> Self {
        DocumentStatistics {
            median_font: compute_median_font(blocks),
        }
    }

    /// Statistics with an explicitly chosen median, for callers that already
    /// know the body size.
    pub fn with_median(median_font: f32) -> Self {
        DocumentStatistics { median_font }
    }
}

impl Default for DocumentStatistics {
    fn default() -> Self {
        DocumentStatistics::with_median(DEFAULT_MEDIAN_FONT)
    }
}

/// Median font size over blocks larger than [`NOISE_FONT_SIZE`].
///
/// Even-sized samples average the two middle values. Returns
/// [`DEFAULT_MEDIAN_FONT`] when nothing qualifies.
pub fn compute_median_font(blocks: &[Block]) -> f32 {
    let mut sizes: Vec<f32> = blocks
        .iter()
        .map(|b| b.font_size)
        .filter(|&size| size > NOISE_FONT_SIZE)
        .collect();

    if sizes.is_empty() {
        return DEFAULT_MEDIAN_FONT;
    }

    sizes.sort_by(|a, b| a.total_cmp(b));

    let mid = sizes.len() / 2;
    if sizes.len() % 2 == 0 {
        (sizes[mid - 1] + sizes[mid]) / 2.0
    } else {
        sizes[mid]
    }
}

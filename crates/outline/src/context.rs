use serde::{Deserialize, Serialize};

use crate::types::{Block, Label};

/// The most recently confirmed heading or title in reading order.
///
/// Threaded through the per-block loop by value: each step returns the next
/// context instead of mutating shared state. First-pass classifiers receive
/// it to judge "distance since the last heading" and "last heading level".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingContext {
    /// Index of the last heading block; `None` before the first one.
    pub index: Option<usize>,
    /// 0 for a title, `n` for `Hn`.
    pub level: u8,
    pub font_size: f32,
}

impl HeadingContext {
    /// Context before the first block: no heading seen, body-size font.
    pub fn start(median_font: f32) -> Self {
        HeadingContext {
            index: None,
            level: 0,
            font_size: median_font,
        }
    }

    /// Context after `block` (at `index`) received `label`.
    pub fn advance(self, index: usize, block: &Block, label: Label, median_font: f32) -> Self {
        let level = match label {
            Label::Title => 0,
            Label::Heading(level) => level.as_u8(),
            Label::None => return self,
        };

        let font_size = if block.font_size > 0.0 {
            block.font_size
        } else {
            median_font
        };

        HeadingContext {
            index: Some(index),
            level,
            font_size,
        }
    }

    /// Blocks between the last heading and `index`, or `None` if no heading
    /// has been seen yet.
    pub fn distance_from(&self, index: usize) -> Option<usize> {
        self.index.map(|last| index.saturating_sub(last))
    }
}

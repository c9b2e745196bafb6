use serde::{Deserialize, Serialize};

use crate::context::HeadingContext;
use crate::stats::DocumentStatistics;
use crate::types::{Block, Label};

/// Sizes strictly above `median + HEADING_SIZE_MARGIN` count as heading sizes.
const HEADING_SIZE_MARGIN: f32 = 1.5;

/// Longer blocks are never ranked as headings by the font-rank baseline.
const MAX_HEADING_CHARS: usize = 200;

/// Quantisation bucket width for font sizes (points).
const FONT_SIZE_BUCKET: f32 = 0.5;

/// At most this many distinct heading sizes are mapped to levels.
const MAX_HEADING_LEVELS: usize = 6;

/// Source of first-pass labels, called once per block in reading order.
///
/// `context` describes the last heading confirmed *before* this block, so an
/// implementation can use distance-since-heading and the last level as
/// features.
pub trait FirstPassClassifier {
    fn classify(
        &self,
        block: &Block,
        index: usize,
        stats: &DocumentStatistics,
        context: &HeadingContext,
    ) -> Label;
}

impl<F> FirstPassClassifier for F
where
    F: Fn(&Block, usize, &DocumentStatistics, &HeadingContext) -> Label,
{
    fn classify(
        &self,
        block: &Block,
        index: usize,
        stats: &DocumentStatistics,
        context: &HeadingContext,
    ) -> Label {
        self(block, index, stats, context)
    }
}

/// Labels every block `NONE`; headings must earn promotion from the rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlabeled;

impl FirstPassClassifier for Unlabeled {
    fn classify(&self, _: &Block, _: usize, _: &DocumentStatistics, _: &HeadingContext) -> Label {
        Label::None
    }
}

/// Uses the label an external classifier stored on the block, deferring to
/// `fallback` for blocks that carry none.
#[derive(Debug, Clone, Default)]
pub struct PresetLabels<F> {
    fallback: F,
}

impl<F> PresetLabels<F> {
    pub fn new(fallback: F) -> Self {
        PresetLabels { fallback }
    }
}

impl<F: FirstPassClassifier> FirstPassClassifier for PresetLabels<F> {
    fn classify(
        &self,
        block: &Block,
        index: usize,
        stats: &DocumentStatistics,
        context: &HeadingContext,
    ) -> Label {
        block
            .predicted_label
            .unwrap_or_else(|| self.fallback.classify(block, index, stats, context))
    }
}

/// Baseline classifier ranking the document's distinct large font sizes.
///
/// Sizes above `median + 1.5` on short blocks are bucketed to 0.5pt and
/// sorted descending; the largest maps to `H1`, down to `H6`. A page-1
/// block at the page's largest size is the `TITLE` as long as no heading
/// has been seen yet.
#[derive(Debug, Clone, Default)]
pub struct FontRankClassifier {
    heading_sizes: Vec<f32>,
    title_size: Option<f32>,
}

impl FontRankClassifier {
    pub fn from_blocks(blocks: &[Block], stats: &DocumentStatistics) -> Self {
        let threshold = heading_threshold(stats);

        let mut heading_sizes: Vec<f32> = Vec::new();
        for block in blocks.iter().filter(|b| is_heading_sized(b, threshold)) {
            let b = bucket(block.font_size);
            if !heading_sizes
                .iter()
                .any(|&s| (s - b).abs() < FONT_SIZE_BUCKET)
            {
                heading_sizes.push(b);
            }
        }
        heading_sizes.sort_by(|a, b| b.total_cmp(a));
        heading_sizes.truncate(MAX_HEADING_LEVELS);

        let title_size = blocks
            .iter()
            .filter(|b| b.page_number == 1 && !b.trimmed_text().is_empty())
            .map(|b| b.font_size)
            .max_by(|a, b| a.total_cmp(b))
            .filter(|&size| size > stats.median_font);

        FontRankClassifier {
            heading_sizes,
            title_size,
        }
    }

    /// Heading sizes in level order, largest first.
    pub fn heading_sizes(&self) -> &[f32] {
        &self.heading_sizes
    }
}

impl FirstPassClassifier for FontRankClassifier {
    fn classify(
        &self,
        block: &Block,
        _index: usize,
        stats: &DocumentStatistics,
        context: &HeadingContext,
    ) -> Label {
        if block.trimmed_text().is_empty() {
            return Label::None;
        }

        let is_title_candidate = block.page_number == 1
            && context.index.is_none()
            && self.title_size == Some(block.font_size);
        if is_title_candidate {
            return Label::Title;
        }

        if !is_heading_sized(block, heading_threshold(stats)) {
            return Label::None;
        }

        let b = bucket(block.font_size);
        self.heading_sizes
            .iter()
            .position(|&s| (s - b).abs() < FONT_SIZE_BUCKET)
            .and_then(|pos| Label::heading(pos as u8 + 1))
            .unwrap_or(Label::None)
    }
}

/// Which first-pass classifier a document run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    /// Stored labels where present, font ranking elsewhere.
    #[default]
    Auto,
    /// Stored labels only; unlabelled blocks start as `NONE`.
    Preset,
    /// Font ranking only, ignoring stored labels.
    FontRank,
    /// Every block starts as `NONE`.
    Unlabeled,
}

impl ClassifierKind {
    /// Build the classifier for one document.
    pub fn build(
        self,
        blocks: &[Block],
        stats: &DocumentStatistics,
    ) -> Box<dyn FirstPassClassifier + Send + Sync> {
        match self {
            ClassifierKind::Auto => Box::new(PresetLabels::new(FontRankClassifier::from_blocks(
                blocks, stats,
            ))),
            ClassifierKind::Preset => Box::new(PresetLabels::new(Unlabeled)),
            ClassifierKind::FontRank => Box::new(FontRankClassifier::from_blocks(blocks, stats)),
            ClassifierKind::Unlabeled => Box::new(Unlabeled),
        }
    }
}

fn heading_threshold(stats: &DocumentStatistics) -> f32 {
    stats.median_font + HEADING_SIZE_MARGIN
}

fn is_heading_sized(block: &Block, threshold: f32) -> bool {
    block.font_size > threshold && block.trimmed_text().chars().count() <= MAX_HEADING_CHARS
}

fn bucket(size: f32) -> f32 {
    (size / FONT_SIZE_BUCKET).round() * FONT_SIZE_BUCKET
}

//! Heading refinement and outline assembly for extracted document blocks.
//!
//! The input is a reading-ordered sequence of [`Block`]s from an external
//! extractor, each optionally carrying a first-pass label from an external
//! classifier. The pipeline is:
//!
//! ```text
//! blocks -> DocumentStatistics (once)
//!        -> per block, in order: classify -> refine_label -> HeadingContext::advance
//!        -> build_outline -> { title, outline }
//! ```
//!
//! Nothing in this crate performs I/O. Malformed input is absorbed by
//! defaults, so any block sequence yields a structurally valid outline.

use thiserror::Error;

pub mod classify;
pub mod context;
pub mod render;
pub mod rules;
pub mod stats;
pub mod structure;
pub mod types;

pub use classify::{ClassifierKind, FirstPassClassifier, FontRankClassifier, PresetLabels, Unlabeled};
pub use context::HeadingContext;
pub use rules::{refine_label, RuleConfig};
pub use stats::{compute_median_font, DocumentStatistics};
pub use structure::{build_outline, StructureConfig, TitleMergeOrder};
pub use types::*;

use serde::{Deserialize, Serialize};

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("Block parsing error: {0}")]
    Parse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<InvalidLabel> for OutlineError {
    fn from(e: InvalidLabel) -> Self {
        OutlineError::Parse(e.to_string())
    }
}

impl From<InvalidHeadingLevel> for OutlineError {
    fn from(e: InvalidHeadingLevel) -> Self {
        OutlineError::Parse(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything that tunes a run, loadable from a config file. Missing
/// sections and fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    pub classifier: ClassifierKind,
    pub rules: RuleConfig,
    pub structure: StructureConfig,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A processed document: labelled blocks plus the structured result.
#[derive(Debug, Clone)]
pub struct LabeledDocument {
    /// Input blocks in reading order, with `predicted_label` and
    /// `final_label` filled in.
    pub blocks: Vec<Block>,
    pub stats: DocumentStatistics,
    /// Context after the last block.
    pub context: HeadingContext,
    pub outline: DocumentOutline,
}

/// Runs the refinement pipeline with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Outliner {
    config: OutlineConfig,
}

impl Outliner {
    pub fn new(config: OutlineConfig) -> Self {
        Outliner { config }
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// Process a document with the classifier named in the configuration.
    pub fn process(&self, blocks: Vec<Block>) -> LabeledDocument {
        let stats = DocumentStatistics::from_blocks(&blocks);
        let classifier = self.config.classifier.build(&blocks, &stats);
        self.process_with_stats(blocks, classifier.as_ref(), stats)
    }

    /// Process a document with an explicit first-pass classifier.
    pub fn process_with<C>(&self, blocks: Vec<Block>, classifier: &C) -> LabeledDocument
    where
        C: FirstPassClassifier + ?Sized,
    {
        let stats = DocumentStatistics::from_blocks(&blocks);
        self.process_with_stats(blocks, classifier, stats)
    }

    /// Process a document against precomputed statistics.
    pub fn process_with_stats<C>(
        &self,
        blocks: Vec<Block>,
        classifier: &C,
        stats: DocumentStatistics,
    ) -> LabeledDocument
    where
        C: FirstPassClassifier + ?Sized,
    {
        if blocks.is_empty() {
            log::warn!("No text blocks were found");
        }
        log::debug!(
            "processing {} blocks, median font {:.2}",
            blocks.len(),
            stats.median_font
        );

        let (blocks, context) = label_blocks(blocks, classifier, &stats, &self.config.rules);
        let outline = build_outline(&blocks, &self.config.structure);

        LabeledDocument {
            blocks,
            stats,
            context,
            outline,
        }
    }
}

/// Label every block in reading order.
///
/// Each block is classified with the context left by its predecessors, then
/// refined; the context advances immediately so the next classification
/// sees it. Returns the labelled blocks and the final context.
pub fn label_blocks<C>(
    mut blocks: Vec<Block>,
    classifier: &C,
    stats: &DocumentStatistics,
    rules: &RuleConfig,
) -> (Vec<Block>, HeadingContext)
where
    C: FirstPassClassifier + ?Sized,
{
    let median_font = stats.median_font;
    let mut context = HeadingContext::start(median_font);

    for (index, block) in blocks.iter_mut().enumerate() {
        let predicted = classifier.classify(block, index, stats, &context);
        let label = refine_label(block, predicted, median_font, rules);
        context = context.advance(index, block, label, median_font);
        block.predicted_label = Some(predicted);
        block.final_label = Some(label);
    }

    (blocks, context)
}

/// Outline for `blocks` with the default configuration.
pub fn extract_outline(blocks: Vec<Block>) -> DocumentOutline {
    Outliner::default().process(blocks).outline
}

/// Parse a JSON array of blocks as written by the block extractor.
pub fn parse_blocks(json: &str) -> Result<Vec<Block>, OutlineError> {
    Ok(serde_json::from_str(json)?)
}

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{Block, DocumentOutline, OutlineEntry, PLACEHOLDER_TITLE};

/// Which page-1 blocks are considered as continuation lines of the title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleMergeOrder {
    /// Blocks after the title start in reading order, so only lines that
    /// actually follow it on the page can join.
    #[default]
    ReadingOrder,
    /// Blocks after the title start in font-rank order.
    RankOrder,
}

/// Tuning knobs for title detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Largest font-size difference between consecutive title lines.
    pub font_tolerance: f32,
    /// Page-1 blocks shorter than this rank last as title candidates.
    pub min_title_chars: usize,
    pub merge_order: TitleMergeOrder,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            font_tolerance: 1.0,
            min_title_chars: 4,
            merge_order: TitleMergeOrder::default(),
        }
    }
}

/// The title text and the reading-order indices of the blocks it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleSelection {
    pub text: String,
    pub indices: Vec<usize>,
}

/// Build the final title and outline from blocks carrying final labels.
///
/// Blocks consumed by the title never appear in the outline. Entries keep
/// reading order; only `H<n>` labels produce entries.
pub fn build_outline(blocks: &[Block], config: &StructureConfig) -> DocumentOutline {
    let (title, consumed) = match detect_title(blocks, config) {
        Some(selection) => (selection.text, selection.indices),
        None => (PLACEHOLDER_TITLE.to_string(), Vec::new()),
    };
    let consumed: HashSet<usize> = consumed.into_iter().collect();

    let outline = blocks
        .iter()
        .enumerate()
        .filter(|(index, _)| !consumed.contains(index))
        .filter_map(|(_, block)| {
            let level = block.final_label?.heading_level()?;
            Some(OutlineEntry {
                level,
                text: block.text.clone(),
                page: block.page_number,
            })
        })
        .collect();

    DocumentOutline { title, outline }
}

/// Pick the title from page-1 blocks and merge its continuation lines.
///
/// Candidates are ranked by font size, largest first, with filler (numbers
/// and punctuation only, very short text, "copyright") ranked last. Ties
/// keep reading order. Following lines join while their font size stays
/// within `font_tolerance` and they start less than one font-height below
/// the previous title line.
///
/// Returns `None` when there are no page-1 blocks.
pub fn detect_title(blocks: &[Block], config: &StructureConfig) -> Option<TitleSelection> {
    let first_page: Vec<(usize, &Block)> = blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| block.page_number == 1)
        .collect();

    let mut ranked = first_page.clone();
    ranked.sort_by(|a, b| title_rank(b.1, config).total_cmp(&title_rank(a.1, config)));

    let &(start_index, start_block) = ranked.first()?;

    let followers: Vec<(usize, &Block)> = match config.merge_order {
        TitleMergeOrder::ReadingOrder => first_page
            .into_iter()
            .filter(|(index, _)| *index > start_index)
            .collect(),
        TitleMergeOrder::RankOrder => ranked.into_iter().skip(1).collect(),
    };

    let mut parts = vec![start_block.text.as_str()];
    let mut indices = vec![start_index];
    let mut last = start_block;

    for (index, next) in followers {
        if !continues_title(last, next, config) {
            break;
        }
        parts.push(next.text.as_str());
        indices.push(index);
        last = next;
    }

    log::debug!("title uses blocks {indices:?}");

    Some(TitleSelection {
        text: parts.join(" ").trim().to_string(),
        indices,
    })
}

fn continues_title(last: &Block, next: &Block, config: &StructureConfig) -> bool {
    let similar_font = (next.font_size - last.font_size).abs() <= config.font_tolerance;
    let vertically_close = next.bbox.y0 - last.bbox.y1 < last.font_size;
    similar_font && vertically_close
}

fn title_rank(block: &Block, config: &StructureConfig) -> f32 {
    if is_filler(block.trimmed_text(), config.min_title_chars) {
        0.0
    } else {
        block.font_size
    }
}

/// Text that cannot be a title: too short, no letters at all, or a bare
/// "copyright".
fn is_filler(text: &str, min_chars: usize) -> bool {
    text.chars().count() < min_chars
        || text.chars().all(|c| !c.is_alphabetic() && c != '_')
        || text.eq_ignore_ascii_case("copyright")
}

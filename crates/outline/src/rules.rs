//! Heading refinement: negative filters, typography scoring, and the
//! decision that blends the score with the first-pass label.
//!
//! Every function here is pure. A block is judged only against itself and
//! the document median, so the same inputs always produce the same label.
//!
//! # Order of evaluation
//!
//! ```text
//! empty -> table of contents -> trailing page number -> header/footer zone
//!       -> table header -> title-page metadata -> score -> decision
//! ```
//!
//! The first filter that matches short-circuits to [`Label::None`].

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{Block, Label, DEFAULT_PAGE_HEIGHT};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the refinement heuristics.
///
/// The defaults are the empirically tuned values; every field can be
/// overridden from a config file without touching the rules themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// The trailing-page-number and table-header filters only look at text
    /// with strictly more words than this.
    pub min_words: usize,
    /// Fraction of the page height at the top and bottom treated as the
    /// running header/footer zone.
    pub margin_fraction: f32,
    /// Title-cased word runs below `median * ratio` are read as table headers.
    pub table_header_font_ratio: f32,
    /// Used when a block reports no usable page height.
    pub default_page_height: f32,
    /// `font_size / median` above this earns the strong size bonus.
    pub strong_size_ratio: f32,
    /// `font_size / median` above this earns the mild size bonus.
    pub mild_size_ratio: f32,
    /// Gap above the block, as a multiple of its font size, that earns the
    /// spacing bonus.
    pub space_before_ratio: f32,
    /// Text longer than this many characters is penalised as a paragraph.
    pub long_text_chars: usize,
    /// A predicted heading scoring below this is downgraded to `NONE`.
    pub min_heading_score: i32,
    /// An unlabelled block scoring at least this is promoted to a heading.
    pub promotion_score: i32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_words: 2,
            margin_fraction: 0.1,
            table_header_font_ratio: 1.1,
            default_page_height: DEFAULT_PAGE_HEIGHT,
            strong_size_ratio: 1.25,
            mild_size_ratio: 1.15,
            space_before_ratio: 1.5,
            long_text_chars: 150,
            min_heading_score: 1,
            promotion_score: 4,
        }
    }
}

const BOLD_BONUS: i32 = 2;
const STRONG_SIZE_BONUS: i32 = 3;
const MILD_SIZE_BONUS: i32 = 2;
const SPACING_BONUS: i32 = 2;
const LONG_TEXT_PENALTY: i32 = 3;
const SENTENCE_PUNCTUATION_PENALTY: i32 = 2;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

fn toc_entry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{3,}\s*\d+\s*$").unwrap())
}

fn trailing_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+\d+\s*$").unwrap())
}

fn numbered_heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\s+").unwrap())
}

fn numbered_subheading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\s+").unwrap())
}

fn title_page_metadata_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:Version\s?[\d.]+|[\d\w\s,]+20\d{2})$").unwrap())
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Why a block was excluded before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    EmptyText,
    TableOfContents,
    TrailingPageNumber,
    HeaderFooter,
    TableHeader,
    TitlePageMetadata,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rejection::EmptyText => "empty text",
            Rejection::TableOfContents => "table of contents entry",
            Rejection::TrailingPageNumber => "trailing page number",
            Rejection::HeaderFooter => "header/footer zone",
            Rejection::TableHeader => "table header",
            Rejection::TitlePageMetadata => "title-page metadata",
        };
        write!(f, "{name}")
    }
}

/// Outcome of judging a block before the first-pass label is considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    Rejected(Rejection),
    Scored(i32),
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assessment::Rejected(reason) => write!(f, "rejected: {reason}"),
            Assessment::Scored(score) => write!(f, "score {score}"),
        }
    }
}

/// Return the first negative filter that excludes `block`, if any.
pub fn rejection(block: &Block, median_font: f32, config: &RuleConfig) -> Option<Rejection> {
    let text = block.trimmed_text();
    if text.is_empty() {
        return Some(Rejection::EmptyText);
    }

    if toc_entry_regex().is_match(text) {
        return Some(Rejection::TableOfContents);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let wordy = words.len() > config.min_words;

    if wordy && trailing_number_regex().is_match(text) && !numbered_heading_regex().is_match(text)
    {
        return Some(Rejection::TrailingPageNumber);
    }

    if in_margin_zone(block, config) && block.font_size <= median_font {
        return Some(Rejection::HeaderFooter);
    }

    if wordy
        && words.iter().all(|w| is_title_word(w) || is_upper_word(w))
        && block.font_size < median_font * config.table_header_font_ratio
    {
        return Some(Rejection::TableHeader);
    }

    if block.page_number == 1 && title_page_metadata_regex().is_match(text) {
        return Some(Rejection::TitlePageMetadata);
    }

    None
}

/// Whether the block's bottom edge sits in the top or bottom margin band.
fn in_margin_zone(block: &Block, config: &RuleConfig) -> bool {
    let page_height = block.page_height_or(config.default_page_height);
    let y = block.bbox.y1 / page_height;
    y > 1.0 - config.margin_fraction || y < config.margin_fraction
}

/// All cased characters are upper case and there is at least one.
fn is_upper_word(word: &str) -> bool {
    let mut cased = false;
    for c in word.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Upper case only directly after uncased characters, lower case only after
/// cased ones, and at least one cased character ("Date", "Q&A", "Co-Op").
fn is_title_word(word: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for c in word.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Typographic evidence that `block` is a heading. Unbounded, typically
/// between -5 and 7.
pub fn heading_score(block: &Block, median_font: f32, config: &RuleConfig) -> i32 {
    let text = block.trimmed_text();
    let mut score = 0;

    if block.is_bold {
        score += BOLD_BONUS;
    }

    let relative_size = if median_font > 0.0 {
        block.font_size / median_font
    } else {
        1.0
    };
    if relative_size > config.strong_size_ratio {
        score += STRONG_SIZE_BONUS;
    } else if relative_size > config.mild_size_ratio {
        score += MILD_SIZE_BONUS;
    }

    if block.vertical_space_before > block.font_size * config.space_before_ratio {
        score += SPACING_BONUS;
    }

    if text.chars().count() > config.long_text_chars {
        score -= LONG_TEXT_PENALTY;
    }

    if text.ends_with(['.', ':', ';']) {
        score -= SENTENCE_PUNCTUATION_PENALTY;
    }

    score
}

/// Run the filters and, if none fires, the scorer.
pub fn assess(block: &Block, median_font: f32, config: &RuleConfig) -> Assessment {
    match rejection(block, median_font, config) {
        Some(reason) => Assessment::Rejected(reason),
        None => Assessment::Scored(heading_score(block, median_font, config)),
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Decide the final label for `block` given the classifier's `predicted`
/// label and the document median.
pub fn refine_label(block: &Block, predicted: Label, median_font: f32, config: &RuleConfig) -> Label {
    let score = match assess(block, median_font, config) {
        Assessment::Rejected(reason) => {
            if predicted != Label::None {
                log::debug!(
                    "{predicted} -> NONE ({reason}) on page {}: {:?}",
                    block.page_number,
                    block.trimmed_text()
                );
            }
            return Label::None;
        }
        Assessment::Scored(score) => score,
    };

    let label = decide(block, predicted, score, config);
    if label != predicted {
        log::debug!(
            "{predicted} -> {label} (score {score}) on page {}: {:?}",
            block.page_number,
            block.trimmed_text()
        );
    }
    label
}

fn decide(block: &Block, predicted: Label, score: i32, config: &RuleConfig) -> Label {
    match predicted {
        Label::Heading(_) if score < config.min_heading_score => Label::None,
        Label::None if score >= config.promotion_score => promoted_level(block.trimmed_text()),
        Label::Title if block.page_number != 1 => Label::H1,
        other => other,
    }
}

/// Level for a block the classifier missed: "1.2. Scope" is a second-level
/// heading, anything else starts at the top level.
fn promoted_level(text: &str) -> Label {
    if numbered_subheading_regex().is_match(text) {
        Label::H2
    } else {
        Label::H1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BBox;

    const MEDIAN: f32 = 11.0;

    /// A mid-page body block on page 2, clear of every positional filter.
    fn block(text: &str, font_size: f32) -> Block {
        Block::new(text, font_size, 2).with_bbox(BBox::vertical(300.0, 315.0))
    }

    fn refine(block: &Block, predicted: Label) -> Label {
        refine_label(block, predicted, MEDIAN, &RuleConfig::default())
    }

    // --- negative filters ---

    #[test]
    fn test_empty_and_whitespace_text_is_none() {
        for text in ["", "   ", "\n\t "] {
            let b = block(text, 30.0).bold().with_space_before(80.0);
            assert_eq!(refine(&b, Label::H1), Label::None);
            assert_eq!(refine(&b, Label::Title), Label::None);
        }
    }

    #[test]
    fn test_toc_entries_are_none() {
        for text in [
            "Introduction ........ 4",
            "2.1 Scope...12  ",
            "Appendix A.....  103",
        ] {
            let b = block(text, 24.0).bold().with_space_before(60.0);
            assert_eq!(
                rejection(&b, MEDIAN, &RuleConfig::default()),
                Some(Rejection::TableOfContents),
                "{text}"
            );
            assert_eq!(refine(&b, Label::H1), Label::None);
        }
    }

    #[test]
    fn test_trailing_page_number_is_none() {
        let b = block("Results and Discussion 17", 16.0).bold();
        assert_eq!(
            rejection(&b, MEDIAN, &RuleConfig::default()),
            Some(Rejection::TrailingPageNumber)
        );
    }

    #[test]
    fn test_trailing_number_kept_for_numbered_heading() {
        let b = block("3. Phase 2", 16.0).bold();
        assert_eq!(rejection(&b, MEDIAN, &RuleConfig::default()), None);
    }

    #[test]
    fn test_trailing_number_needs_more_than_two_words() {
        let b = block("Chapter 3", 16.0).bold();
        assert_eq!(rejection(&b, MEDIAN, &RuleConfig::default()), None);
    }

    #[test]
    fn test_header_footer_zone() {
        let config = RuleConfig::default();
        let top = Block::new("Confidential draft", 10.0, 3).with_bbox(BBox::vertical(20.0, 30.0));
        let bottom =
            Block::new("Acme Corp internal", 11.0, 3).with_bbox(BBox::vertical(760.0, 775.0));
        assert_eq!(rejection(&top, MEDIAN, &config), Some(Rejection::HeaderFooter));
        assert_eq!(rejection(&bottom, MEDIAN, &config), Some(Rejection::HeaderFooter));
    }

    #[test]
    fn test_large_font_survives_margin_zone() {
        let b = Block::new("Overview", 18.0, 3).with_bbox(BBox::vertical(20.0, 40.0));
        assert_eq!(rejection(&b, MEDIAN, &RuleConfig::default()), None);
    }

    #[test]
    fn test_missing_page_height_uses_default() {
        let mut b = Block::new("running footer", 9.0, 3).with_bbox(BBox::vertical(740.0, 750.0));
        b.page_height = 0.0;
        assert_eq!(
            rejection(&b, MEDIAN, &RuleConfig::default()),
            Some(Rejection::HeaderFooter)
        );
    }

    #[test]
    fn test_table_header_filter() {
        let b = block("Version Date Remarks", 11.0).bold();
        assert_eq!(
            rejection(&b, MEDIAN, &RuleConfig::default()),
            Some(Rejection::TableHeader)
        );

        let upper = block("ID NAME Owner", 11.5);
        assert_eq!(
            rejection(&upper, MEDIAN, &RuleConfig::default()),
            Some(Rejection::TableHeader)
        );
    }

    #[test]
    fn test_table_header_filter_spares_larger_fonts_and_sentences() {
        let config = RuleConfig::default();
        let large = block("Summary Of Findings", 16.0);
        assert_eq!(rejection(&large, MEDIAN, &config), None);

        let sentence = block("Roles and responsibilities", 11.0);
        assert_eq!(rejection(&sentence, MEDIAN, &config), None);
    }

    #[test]
    fn test_title_page_metadata() {
        let config = RuleConfig::default();
        for text in ["Version 1.0", "version2.3.1", "March 2024", "Rev2023"] {
            let b = Block::new(text, 14.0, 1).with_bbox(BBox::vertical(300.0, 315.0));
            assert_eq!(
                rejection(&b, MEDIAN, &config),
                Some(Rejection::TitlePageMetadata),
                "{text}"
            );
        }

        // Only the first page carries title metadata.
        let later = block("March 2024", 14.0);
        assert_eq!(rejection(&later, MEDIAN, &config), None);
    }

    #[test]
    fn test_word_case_helpers() {
        assert!(is_title_word("Remarks"));
        assert!(is_title_word("Date:"));
        assert!(is_title_word("Q&A"));
        assert!(!is_title_word("iPhone"));
        assert!(!is_title_word("2024"));
        assert!(is_upper_word("NAME"));
        assert!(is_upper_word("R&D"));
        assert!(!is_upper_word("Name"));
        assert!(!is_upper_word("42"));
    }

    // --- scoring ---

    #[test]
    fn test_score_components() {
        let config = RuleConfig::default();
        assert_eq!(heading_score(&block("Scope", 11.0), MEDIAN, &config), 0);
        assert_eq!(heading_score(&block("Scope", 11.0).bold(), MEDIAN, &config), 2);
        // 13 / 11 = 1.18 -> mild bonus.
        assert_eq!(heading_score(&block("Scope", 13.0), MEDIAN, &config), 2);
        // 14 / 11 = 1.27 -> strong bonus.
        assert_eq!(heading_score(&block("Scope", 14.0), MEDIAN, &config), 3);
        assert_eq!(
            heading_score(&block("Scope", 11.0).with_space_before(17.0), MEDIAN, &config),
            2
        );
        assert_eq!(heading_score(&block("Scope:", 11.0), MEDIAN, &config), -2);
        assert_eq!(heading_score(&block(&"word ".repeat(40), 11.0), MEDIAN, &config), -3);
    }

    #[test]
    fn test_score_with_zero_median_uses_unit_ratio() {
        let b = block("Scope", 40.0).bold();
        assert_eq!(heading_score(&b, 0.0, &RuleConfig::default()), 2);
    }

    // --- decision ---

    #[test]
    fn test_strong_block_promoted_from_none() {
        let b = block("Introduction", 16.0).bold().with_space_before(30.0);
        assert_eq!(heading_score(&b, MEDIAN, &RuleConfig::default()), 7);
        assert_eq!(refine(&b, Label::None), Label::H1);
    }

    #[test]
    fn test_promotion_uses_numbering_depth() {
        let sub = block("1.2. Data Sources", 16.0).bold().with_space_before(30.0);
        assert_eq!(refine(&sub, Label::None), Label::H2);

        let top = block("4. Results", 16.0).bold().with_space_before(30.0);
        assert_eq!(refine(&top, Label::None), Label::H1);
    }

    #[test]
    fn test_promotion_needs_threshold_score() {
        // bold + mild size = 4 -> promoted; bold alone = 2 -> stays NONE.
        let enough = block("Background", 13.0).bold();
        assert_eq!(refine(&enough, Label::None), Label::H1);

        let weak = block("Background", 11.0).bold();
        assert_eq!(refine(&weak, Label::None), Label::None);
    }

    #[test]
    fn test_weak_predicted_heading_downgraded() {
        let b = block("some body words", 11.0);
        assert_eq!(refine(&b, Label::heading(3).unwrap()), Label::None);
        assert_eq!(refine(&b, Label::H1), Label::None);
    }

    #[test]
    fn test_supported_predicted_heading_kept() {
        let b = block("Methodology", 11.0).bold();
        let h3 = Label::heading(3).unwrap();
        assert_eq!(refine(&b, h3), h3);
    }

    #[test]
    fn test_title_off_first_page_becomes_h1() {
        let b = block("Project Charter", 24.0).bold();
        assert_eq!(refine(&b, Label::Title), Label::H1);
    }

    #[test]
    fn test_title_on_first_page_kept() {
        let b = Block::new("Project Charter", 24.0, 1)
            .bold()
            .with_bbox(BBox::vertical(100.0, 130.0));
        assert_eq!(refine(&b, Label::Title), Label::Title);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = RuleConfig {
            promotion_score: 2,
            ..RuleConfig::default()
        };
        let b = block("Background", 11.0).bold();
        assert_eq!(refine_label(&b, Label::None, MEDIAN, &config), Label::H1);
    }

    #[test]
    fn test_config_from_partial_toml() {
        let config: RuleConfig = toml::from_str("min_words = 3\nmargin_fraction = 0.05").unwrap();
        assert_eq!(config.min_words, 3);
        assert_eq!(config.margin_fraction, 0.05);
        assert_eq!(config.promotion_score, 4);
    }

    #[test]
    fn test_assessment_display() {
        assert_eq!(
            Assessment::Rejected(Rejection::TableHeader).to_string(),
            "rejected: table header"
        );
        assert_eq!(Assessment::Scored(5).to_string(), "score 5");
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Page height assumed when the extractor does not report one (US Letter, in points).
pub const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// Title used when a document has no page-1 blocks to build one from.
pub const PLACEHOLDER_TITLE: &str = "Untitled Document";

fn default_page_height() -> f32 {
    DEFAULT_PAGE_HEIGHT
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Block rectangle in page coordinates. `y0` is the top edge, `y1` the bottom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    #[serde(default)]
    pub x0: f32,
    #[serde(default)]
    pub y0: f32,
    #[serde(default)]
    pub x1: f32,
    #[serde(default)]
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        BBox { x0, y0, x1, y1 }
    }

    /// A full-width box spanning `y0..y1`, for callers that only track
    /// vertical extent.
    pub fn vertical(y0: f32, y1: f32) -> Self {
        BBox {
            x0: 0.0,
            y0,
            x1: 0.0,
            y1,
        }
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const H1: Self = HeadingLevel(1);
    pub const H2: Self = HeadingLevel(2);

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = InvalidHeadingLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value >= 1 {
            Ok(HeadingLevel(value))
        } else {
            Err(InvalidHeadingLevel)
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

impl FromStr for HeadingLevel {
    type Err = InvalidHeadingLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix(['H', 'h'])
            .ok_or(InvalidHeadingLevel)?;
        let level = digits.parse::<u8>().map_err(|_| InvalidHeadingLevel)?;
        HeadingLevel::try_from(level)
    }
}

impl Serialize for HeadingLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HeadingLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Label attached to a block, either by the first-pass classifier or by the
/// rule engine.
///
/// String forms are `TITLE`, `H<n>` and `NONE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Label {
    Title,
    Heading(HeadingLevel),
    #[default]
    None,
}

impl Label {
    pub const H1: Self = Label::Heading(HeadingLevel::H1);
    pub const H2: Self = Label::Heading(HeadingLevel::H2);

    /// Build a heading label, returning `None` for level 0.
    pub fn heading(level: u8) -> Option<Self> {
        HeadingLevel::try_from(level).ok().map(Label::Heading)
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Label::Heading(_))
    }

    pub fn heading_level(&self) -> Option<HeadingLevel> {
        match self {
            Label::Heading(level) => Some(*level),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Title => write!(f, "TITLE"),
            Label::Heading(level) => write!(f, "{level}"),
            Label::None => write!(f, "NONE"),
        }
    }
}

impl FromStr for Label {
    type Err = InvalidLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("TITLE") {
            return Ok(Label::Title);
        }
        if trimmed.eq_ignore_ascii_case("NONE") {
            return Ok(Label::None);
        }
        trimmed
            .parse::<HeadingLevel>()
            .map(Label::Heading)
            .map_err(|_| InvalidLabel(s.to_string()))
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Classifier output is noisy; an unknown class name is read as `NONE`.
fn lenient_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Label>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| {
        s.parse().unwrap_or_else(|e: InvalidLabel| {
            log::warn!("{e}; treating it as NONE");
            Label::None
        })
    }))
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// A unit of extracted text with typography, position and page metadata.
///
/// Optional extractor fields fall back to defaults when absent: font size 0
/// (unknown), not bold, a 792pt page, and no vertical gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub text: String,
    #[serde(default)]
    pub font_size: f32,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub bbox: BBox,
    pub page_number: usize,
    #[serde(default = "default_page_height")]
    pub page_height: f32,
    #[serde(default)]
    pub vertical_space_before: f32,
    /// First-pass label supplied by an external classifier, if any.
    #[serde(
        default,
        deserialize_with = "lenient_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub predicted_label: Option<Label>,
    /// Written once by the pipeline after refinement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_label: Option<Label>,
}

impl Block {
    pub fn new(text: impl Into<String>, font_size: f32, page_number: usize) -> Self {
        Block {
            text: text.into(),
            font_size,
            is_bold: false,
            bbox: BBox::default(),
            page_number,
            page_height: DEFAULT_PAGE_HEIGHT,
            vertical_space_before: 0.0,
            predicted_label: None,
            final_label: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.is_bold = true;
        self
    }

    pub fn with_bbox(mut self, bbox: BBox) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_space_before(mut self, space: f32) -> Self {
        self.vertical_space_before = space;
        self
    }

    pub fn with_predicted(mut self, label: Label) -> Self {
        self.predicted_label = Some(label);
        self
    }

    /// Text without surrounding whitespace; every rule judges this form.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Page height, or `fallback` when the reported height is unusable.
    pub fn page_height_or(&self, fallback: f32) -> f32 {
        if self.page_height > 0.0 {
            self.page_height
        } else {
            fallback
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

/// The structured result handed to the result sink.
///
/// Field order is part of the wire format: `title` then `outline`, and
/// `level`, `text`, `page` inside each entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

impl DocumentOutline {
    pub fn untitled() -> Self {
        DocumentOutline {
            title: PLACEHOLDER_TITLE.to_string(),
            outline: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
#[error("Heading level must be at least 1 (expected 'H<n>')")]
pub struct InvalidHeadingLevel;

#[derive(Debug, Error)]
#[error("Unrecognised label '{0}' (expected TITLE, H<n> or NONE)")]
pub struct InvalidLabel(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_valid() {
        assert!(HeadingLevel::try_from(1).is_ok());
        assert!(HeadingLevel::try_from(9).is_ok());
    }

    #[test]
    fn test_heading_level_invalid() {
        assert!(HeadingLevel::try_from(0).is_err());
        assert!("H0".parse::<HeadingLevel>().is_err());
        assert!("Hx".parse::<HeadingLevel>().is_err());
        assert!("3".parse::<HeadingLevel>().is_err());
    }

    #[test]
    fn test_label_parse() {
        assert_eq!("TITLE".parse::<Label>().unwrap(), Label::Title);
        assert_eq!("NONE".parse::<Label>().unwrap(), Label::None);
        assert_eq!("h3".parse::<Label>().unwrap(), Label::heading(3).unwrap());
        assert!("HEADER".parse::<Label>().is_err());
        assert!("H".parse::<Label>().is_err());
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::Title.to_string(), "TITLE");
        assert_eq!(Label::H2.to_string(), "H2");
        assert_eq!(Label::None.to_string(), "NONE");
    }

    #[test]
    fn test_block_defaults_for_missing_fields() {
        let json = r#"{"text": "Intro", "bbox": {"y0": 10, "y1": 20}, "page_number": 2}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.font_size, 0.0);
        assert!(!block.is_bold);
        assert_eq!(block.page_height, DEFAULT_PAGE_HEIGHT);
        assert_eq!(block.vertical_space_before, 0.0);
        assert_eq!(block.bbox.y1, 20.0);
        assert_eq!(block.predicted_label, None);
    }

    #[test]
    fn test_block_unknown_predicted_label_reads_as_none() {
        let json = r#"{"text": "x", "page_number": 1, "predicted_label": "CAPTION"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.predicted_label, Some(Label::None));
    }

    #[test]
    fn test_page_height_fallback() {
        let mut block = Block::new("x", 10.0, 1);
        block.page_height = 0.0;
        assert_eq!(block.page_height_or(DEFAULT_PAGE_HEIGHT), DEFAULT_PAGE_HEIGHT);
    }

    #[test]
    fn test_outline_wire_format() {
        let outline = DocumentOutline {
            title: "Report".to_string(),
            outline: vec![OutlineEntry {
                level: HeadingLevel::H1,
                text: "1. Scope".to_string(),
                page: 2,
            }],
        };
        let json = serde_json::to_string(&outline).unwrap();
        assert_eq!(
            json,
            r#"{"title":"Report","outline":[{"level":"H1","text":"1. Scope","page":2}]}"#
        );
    }
}

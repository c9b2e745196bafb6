use std::path::PathBuf;

use outline::rules::assess;
use outline::{LabeledDocument, Outliner, RuleConfig};

use crate::extract::ClassifierArg;
use crate::prelude::{println, *};

/// Longest block text shown in a table cell.
const MAX_TEXT_CHARS: usize = 60;

#[derive(Debug, clap::Args, Clone)]
pub struct InspectOptions {
    /// Block file (JSON array of text blocks)
    pub path: PathBuf,

    /// First-pass classifier (overrides the config file)
    #[arg(long, env = "DOCOUTLINE_CLASSIFIER")]
    pub classifier: Option<ClassifierArg>,

    /// Only show blocks that ended up as a title or heading
    #[arg(long)]
    pub headings_only: bool,
}

/// One table row per block.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectRow {
    pub index: usize,
    pub page: usize,
    pub font_size: f32,
    pub predicted: String,
    pub label: String,
    pub explanation: String,
    pub text: String,
}

pub async fn run(options: InspectOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::resolve(&global, options.classifier.map(Into::into))?;
    let rules = config.rules.clone();
    let outliner = Outliner::new(config);

    let path = options.path.clone();
    let doc = tokio::task::spawn_blocking(move || -> Result<LabeledDocument> {
        let blocks = crate::document::read_blocks(&path)?;
        Ok(outliner.process(blocks))
    })
    .await??;

    let rows = inspect_rows(&doc, &rules, options.headings_only);

    println!("Title: {}", doc.outline.title);
    println!("Median font: {:.2}", doc.stats.median_font);
    println!(
        "Blocks: {}  Headings: {}\n",
        doc.blocks.len(),
        doc.outline.outline.len()
    );

    let mut table = new_table();
    table.add_row(prettytable::row![
        "#", "Page", "Font", "Predicted", "Final", "Rules", "Text"
    ]);
    for row in &rows {
        table.add_row(prettytable::row![
            row.index,
            row.page,
            format!("{:.1}", row.font_size),
            row.predicted,
            row.label,
            row.explanation,
            row.text
        ]);
    }
    table.printstd();

    Ok(())
}

/// Describe how each block was judged, in reading order.
pub fn inspect_rows(
    doc: &LabeledDocument,
    rules: &RuleConfig,
    headings_only: bool,
) -> Vec<InspectRow> {
    doc.blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| {
            !headings_only || block.final_label.is_some_and(|l| l != outline::Label::None)
        })
        .map(|(index, block)| InspectRow {
            index,
            page: block.page_number,
            font_size: block.font_size,
            predicted: label_cell(block.predicted_label),
            label: label_cell(block.final_label),
            explanation: assess(block, doc.stats.median_font, rules).to_string(),
            text: truncate(block.trimmed_text(), MAX_TEXT_CHARS),
        })
        .collect()
}

fn label_cell(label: Option<outline::Label>) -> String {
    label.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

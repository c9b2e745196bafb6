use std::path::PathBuf;

use outline::render::{format_indented, format_markdown, to_json};
use outline::{ClassifierKind, DocumentOutline, Outliner};

use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Clone)]
pub struct ExtractOptions {
    /// Block file (JSON array of text blocks)
    pub path: PathBuf,

    /// Write the outline here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: json, indented, or markdown (default: json)
    #[arg(short, long, env = "DOCOUTLINE_FORMAT", default_value = "json")]
    pub format: OutputFormat,

    /// First-pass classifier (overrides the config file)
    #[arg(long, env = "DOCOUTLINE_CLASSIFIER")]
    pub classifier: Option<ClassifierArg>,
}

#[derive(Debug, Clone, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty JSON with 4-space indentation
    Json,
    /// Indented text format (2 spaces per level)
    Indented,
    /// Markdown nested list format
    Markdown,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierArg {
    /// Labels stored on the blocks, font ranking elsewhere
    Auto,
    /// Labels stored on the blocks only
    Preset,
    /// Rank the document's large font sizes
    FontRank,
    /// Start every block unlabelled
    #[value(name = "none")]
    #[serde(rename = "none")]
    Unlabeled,
}

impl From<ClassifierArg> for ClassifierKind {
    fn from(arg: ClassifierArg) -> Self {
        match arg {
            ClassifierArg::Auto => ClassifierKind::Auto,
            ClassifierArg::Preset => ClassifierKind::Preset,
            ClassifierArg::FontRank => ClassifierKind::FontRank,
            ClassifierArg::Unlabeled => ClassifierKind::Unlabeled,
        }
    }
}

pub async fn run(options: ExtractOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::resolve(&global, options.classifier.map(Into::into))?;
    let outliner = Outliner::new(config);

    let path = options.path.clone();
    let outline = tokio::task::spawn_blocking(move || extract(&outliner, &path)).await??;

    let rendered = render(&outline, &options.format)?;
    match &options.output {
        Some(output) => {
            crate::document::write_output(output, &rendered)?;
            log::info!("Wrote outline to {}", output.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn extract(outliner: &Outliner, path: &std::path::Path) -> Result<DocumentOutline> {
    let blocks = crate::document::read_blocks(path)?;
    Ok(outliner.process(blocks).outline)
}

/// Render an outline in the requested format.
pub fn render(outline: &DocumentOutline, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(outline).map_err(|e| eyre!("JSON serialization failed: {}", e)),
        OutputFormat::Indented => Ok(format_indented(outline)),
        OutputFormat::Markdown => Ok(format_markdown(outline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline::{HeadingLevel, OutlineEntry};

    fn sample() -> DocumentOutline {
        DocumentOutline {
            title: "Harbour Survey".to_string(),
            outline: vec![
                OutlineEntry {
                    level: HeadingLevel::H1,
                    text: "1. Findings".to_string(),
                    page: 2,
                },
                OutlineEntry {
                    level: HeadingLevel::H2,
                    text: "1.1. Depth".to_string(),
                    page: 3,
                },
            ],
        }
    }

    #[test]
    fn test_render_formats() {
        let json = render(&sample(), &OutputFormat::Json).unwrap();
        assert!(json.contains("    \"title\": \"Harbour Survey\""));

        assert_eq!(
            render(&sample(), &OutputFormat::Indented).unwrap(),
            "Harbour Survey\n1. Findings  (p. 2)\n  1.1. Depth  (p. 3)"
        );
        assert_eq!(
            render(&sample(), &OutputFormat::Markdown).unwrap(),
            "# Harbour Survey\n\n* 1. Findings (p. 2)\n  * 1.1. Depth (p. 3)"
        );
    }

    #[test]
    fn test_classifier_arg_conversion() {
        assert_eq!(ClassifierKind::from(ClassifierArg::Auto), ClassifierKind::Auto);
        assert_eq!(
            ClassifierKind::from(ClassifierArg::Unlabeled),
            ClassifierKind::Unlabeled
        );
    }

    #[test]
    fn test_classifier_arg_names() {
        use clap::ValueEnum;
        let names: Vec<String> = ClassifierArg::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["auto", "preset", "font-rank", "none"]);
    }

    #[tokio::test]
    async fn test_run_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("blocks.json");
        std::fs::write(
            &input,
            r#"[{"text": "Harbour Survey", "font_size": 22, "is_bold": true, "page_number": 1,
                 "bbox": {"y0": 200, "y1": 222}}]"#,
        )
        .unwrap();
        let output = dir.path().join("out").join("outline.md");

        let options = ExtractOptions {
            path: input,
            output: Some(output.clone()),
            format: OutputFormat::Markdown,
            classifier: Some(ClassifierArg::Unlabeled),
        };
        let global = crate::Global {
            config: None,
            verbose: false,
        };
        run(options, global).await.unwrap();

        assert_eq!(std::fs::read_to_string(output).unwrap(), "# Harbour Survey");
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use outline::Outliner;

use crate::extract::ClassifierArg;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args, Clone)]
pub struct BatchOptions {
    /// Directory containing block files (*.json)
    #[arg(short, long, env = "DOCOUTLINE_INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Directory receiving one outline per block file
    #[arg(short, long, env = "DOCOUTLINE_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Number of documents processed at the same time
    #[arg(short, long, env = "DOCOUTLINE_JOBS", default_value = "4")]
    pub jobs: usize,

    /// First-pass classifier (overrides the config file)
    #[arg(long, env = "DOCOUTLINE_CLASSIFIER")]
    pub classifier: Option<ClassifierArg>,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub written: Vec<PathBuf>,
    /// Input file and the rendered error chain, sorted by path.
    pub failed: Vec<(PathBuf, String)>,
}

pub async fn run(options: BatchOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::resolve(&global, options.classifier.map(Into::into))?;
    let outliner = Arc::new(Outliner::new(config));

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?,
    );

    let summary = process_directory(
        outliner,
        &options.input_dir,
        &options.output_dir,
        options.jobs,
        &progress,
    )
    .await?;

    progress.finish_and_clear();

    for (path, reason) in &summary.failed {
        eprintln!("Failed {}: {}", path.display(), reason);
    }
    println!(
        "Processed {} of {} block files into {}",
        summary.written.len(),
        summary.total,
        options.output_dir.display()
    );

    Ok(())
}

/// Every `*.json` file directly inside `dir`, sorted by name.
pub fn block_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InputDirNotFound(dir.display().to_string()).into());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if path.is_file() && is_json {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// `<output_dir>/<stem>.json` for an input block file.
pub fn output_path(output_dir: &Path, input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_eyre("Block file has no file name")?;
    let mut name = stem.to_os_string();
    name.push(".json");
    Ok(output_dir.join(name))
}

/// Convert every block file in `input_dir`, running up to `jobs` documents
/// concurrently. A file that fails is logged and skipped.
pub async fn process_directory(
    outliner: Arc<Outliner>,
    input_dir: &Path,
    output_dir: &Path,
    jobs: usize,
    progress: &ProgressBar,
) -> Result<BatchSummary> {
    let files = block_files(input_dir)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory {}", output_dir.display()))?;

    if files.is_empty() {
        log::warn!("No block files found in {}", input_dir.display());
        return Ok(BatchSummary::default());
    }

    log::info!("Found {} block files to process", files.len());
    progress.set_length(files.len() as u64);

    let total = files.len();
    let results: Vec<(PathBuf, Result<PathBuf>)> = futures::stream::iter(files)
        .map(|input| {
            let outliner = Arc::clone(&outliner);
            let output_dir = output_dir.to_path_buf();
            async move {
                let task_input = input.clone();
                let result = tokio::task::spawn_blocking(move || -> Result<PathBuf> {
                    let output = output_path(&output_dir, &task_input)?;
                    crate::document::process_file(&outliner, &task_input, &output)?;
                    Ok(output)
                })
                .await
                .map_err(|e| eyre!("Worker task failed: {}", e))
                .and_then(|result| result);
                (input, result)
            }
        })
        .buffer_unordered(jobs.max(1))
        .inspect(|(input, _)| {
            if let Some(name) = input.file_name() {
                progress.set_message(name.to_string_lossy().into_owned());
            }
            progress.inc(1);
        })
        .collect()
        .await;

    let mut summary = BatchSummary {
        total,
        ..BatchSummary::default()
    };
    for (input, result) in results {
        match result {
            Ok(output) => summary.written.push(output),
            Err(err) => {
                log::error!("Failed to process {}: {:#}", input.display(), err);
                summary.failed.push((input, format!("{err:#}")));
            }
        }
    }
    summary.written.sort();
    summary.failed.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(summary)
}

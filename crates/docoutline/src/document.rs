use std::path::Path;

use outline::{Block, DocumentOutline, Outliner};

use crate::prelude::*;

/// Read a block file written by the block extractor.
pub fn read_blocks(path: &Path) -> Result<Vec<Block>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read block file {}", path.display()))?;

    outline::parse_blocks(&contents)
        .with_context(|| format!("Failed to parse block file {}", path.display()))
}

/// Write `contents` to `path`, creating missing parent directories.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Read `input`, build its outline and write it as JSON to `output`.
pub fn process_file(outliner: &Outliner, input: &Path, output: &Path) -> Result<DocumentOutline> {
    let blocks = read_blocks(input)?;
    let doc = outliner.process(blocks);
    write_output(output, &outline::render::to_json(&doc.outline)?)?;

    log::info!(
        "{} -> {} ({} headings)",
        input.display(),
        output.display(),
        doc.outline.outline.len()
    );
    Ok(doc.outline)
}

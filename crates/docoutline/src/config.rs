use std::path::Path;

use outline::{ClassifierKind, OutlineConfig};

use crate::prelude::*;

/// Load the run configuration, falling back to defaults when no file is given.
pub fn load(path: Option<&Path>) -> Result<OutlineConfig> {
    let Some(path) = path else {
        return Ok(OutlineConfig::default());
    };

    if !path.is_file() {
        return Err(Error::ConfigNotFound(path.display().to_string()).into());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;

    let config = parse(&contents).map_err(|reason| Error::InvalidConfig {
        path: path.display().to_string(),
        reason,
    })?;

    log::debug!("loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

fn parse(contents: &str) -> std::result::Result<OutlineConfig, String> {
    toml::from_str(contents).map_err(|e| e.message().to_string())
}

/// Load the configuration and apply a classifier chosen on the command line.
pub fn resolve(global: &crate::Global, classifier: Option<ClassifierKind>) -> Result<OutlineConfig> {
    let mut config = load(global.config.as_deref())?;
    if let Some(kind) = classifier {
        config.classifier = kind;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline::TitleMergeOrder;
    use std::io::Write;

    #[test]
    fn test_no_path_uses_defaults() {
        assert_eq!(load(None).unwrap(), OutlineConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "classifier = \"unlabeled\"\n\n[rules]\nmin_words = 3\n\n[structure]\nmerge_order = \"rank-order\""
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.classifier, ClassifierKind::Unlabeled);
        assert_eq!(config.rules.min_words, 3);
        assert_eq!(config.rules.promotion_score, 4);
        assert_eq!(config.structure.merge_order, TitleMergeOrder::RankOrder);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rules]\nmin_words = \"two\"").unwrap();

        let err = load(Some(file.path())).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config"));
    }

    #[test]
    fn test_command_line_classifier_wins() {
        let global = crate::Global {
            config: None,
            verbose: false,
        };
        let config = resolve(&global, Some(ClassifierKind::FontRank)).unwrap();
        assert_eq!(config.classifier, ClassifierKind::FontRank);

        let config = resolve(&global, None).unwrap();
        assert_eq!(config.classifier, ClassifierKind::Auto);
    }
}

//! Builds the pipeline configuration from an optional TOML file and
//! command-line overrides.

use std::path::Path;

use anyhow::{Context, Result};
use cvsift_core::FilterConfig;
use tracing::warn;

use crate::Cli;

pub fn load_config_file(path: &Path) -> Result<FilterConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// File values first, flags on top.
pub fn resolve(cli: &Cli) -> Result<FilterConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => FilterConfig::default(),
    };
    if let Some(threshold) = cli.mos_threshold {
        config.mos_threshold = threshold;
    }
    if let Some(secs) = cli.scorer_timeout {
        config.scorer_timeout_secs = Some(secs);
    }
    if cli.skip_unreadable_audio {
        config.skip_unreadable_audio = true;
    }
    if !(1.0..=4.0).contains(&config.mos_threshold) {
        warn!(
            threshold = config.mos_threshold,
            "MOS threshold is usually between 1.0 and 4.0"
        );
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sift.toml");
        std::fs::write(&path, "mos_threshold = 2.5\nmax_clip_ms = 12000\n").unwrap();

        let cli = Cli::parse_from([
            "cvsift",
            "cv",
            "out",
            "--config",
            path.to_str().unwrap(),
            "--mos-threshold",
            "3.5",
        ]);
        let config = resolve(&cli).unwrap();
        assert_eq!(config.mos_threshold, 3.5);
        assert_eq!(config.max_clip_ms, 12_000);
        assert_eq!(config.min_speaker_ms, FilterConfig::default().min_speaker_ms);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sift.toml");
        std::fs::write(&path, "mos_treshold = 2.5\n").unwrap();
        assert!(load_config_file(&path).is_err());
    }

    #[test]
    fn defaults_without_file() {
        let cli = Cli::parse_from(["cvsift", "cv", "out"]);
        assert_eq!(resolve(&cli).unwrap(), FilterConfig::default());
    }
}

use anyhow::{Context, Result};
use cogex_experiment::ExperimentConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const OUTPUT_DIR_VAR: &str = "COGEX_OUTPUT_DIR";
pub const FONT_VAR: &str = "COGEX_FONT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// TrueType/OpenType font used for every text screen.
    pub font: Option<PathBuf>,
    pub fullscreen: bool,
    /// Window size when not fullscreen.
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            font: None,
            fullscreen: true,
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub experiment: ExperimentConfig,
    pub display: DisplayConfig,
}

impl Settings {
    /// Defaults, then the TOML file if one is given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                Self::from_toml(&raw).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        settings.apply_overrides(|name| std::env::var(name).ok());
        settings
            .experiment
            .validate()
            .context("invalid experiment configuration")?;
        debug!(?settings, "settings loaded");
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(OUTPUT_DIR_VAR).filter(|v| !v.is_empty()) {
            self.experiment.output.dir = PathBuf::from(dir);
        }
        if let Some(font) = lookup(FONT_VAR).filter(|v| !v.is_empty()) {
            self.display.font = Some(PathBuf::from(font));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogex_experiment::ResultFormat;
    use std::time::Duration;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let settings = Settings::from_toml(
            r#"
            [nback]
            lag = 3
            match_probability = 0.4

            [nback.timing]
            session_duration_s = 120

            [output]
            format = "json"

            [display]
            fullscreen = false
            "#,
        )
        .unwrap();

        let nback = &settings.experiment.nback;
        assert_eq!(nback.lag, 3);
        assert_eq!(nback.match_probability, 0.4);
        assert!(!nback.allow_consecutive_matches);
        assert_eq!(nback.timing.block_trials, 200);
        assert_eq!(nback.timing.session_duration(), Some(Duration::from_secs(120)));
        assert_eq!(settings.experiment.output.format, ResultFormat::Json);
        assert_eq!(settings.experiment.stroop.timing.practice_response_window(), None);
        assert!(!settings.display.fullscreen);
        assert_eq!(settings.display.width, 1280);
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut settings = Settings::from_toml(
            r#"
            [output]
            dir = "from-file"
            "#,
        )
        .unwrap();
        settings.apply_overrides(|name| match name {
            OUTPUT_DIR_VAR => Some("/tmp/cogex-out".to_string()),
            FONT_VAR => Some("/usr/share/fonts/DejaVuSans.ttf".to_string()),
            _ => None,
        });

        assert_eq!(settings.experiment.output.dir, PathBuf::from("/tmp/cogex-out"));
        assert_eq!(
            settings.display.font,
            Some(PathBuf::from("/usr/share/fonts/DejaVuSans.ttf"))
        );
    }

    #[test]
    fn empty_override_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_overrides(|_| Some(String::new()));
        assert_eq!(settings.experiment.output.dir, PathBuf::from("results"));
        assert_eq!(settings.display.font, None);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Settings::from_toml("[output]\nformat = \"xlsx\"\n").is_err());
    }
}

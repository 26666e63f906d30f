//! Configuration management.
//!
//! Sources are merged lowest priority first:
//! 1. Built-in defaults
//! 2. User config file (`~/.config/cyclescope/config.toml`)
//! 3. Project-local config file (`./cyclescope.toml`)
//! 4. File given with `--config`
//! 5. Environment variables (`CYCLESCOPE_OUTPUT`, `CYCLESCOPE_FRAME_DELAY_MS`,
//!    `CYCLESCOPE_MAX_STEPS`)
//!
//! Command-line flags are applied on top by the binary.
//!
//! # Config File Format
//!
//! ```toml
//! output = "trace.gif"
//! frame_delay_ms = 150
//! # 0 removes the limit
//! max_steps = 500000
//! workers = 4
//!
//! [render]
//! scale = 3
//! highlight = [255, 200, 0]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::render::{DEFAULT_FRAME_DELAY_MS, RenderStyle, Rgb};
use crate::{log_debug, log_warn};

pub const DEFAULT_OUTPUT: &str = "result.gif";
pub const DEFAULT_MAX_STEPS: usize = 100_000;
const CONFIG_DIR_NAME: &str = "cyclescope";
const LOCAL_CONFIG_FILE: &str = "cyclescope.toml";

/// Overrides for [`RenderStyle`]. Unset keys keep the default style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    pub scale: Option<u32>,
    pub margin: Option<u32>,
    pub line_padding: Option<u32>,
    pub background: Option<Rgb>,
    pub text: Option<Rgb>,
    pub highlight: Option<Rgb>,
}

impl RenderSection {
    fn merge(&mut self, other: Self) {
        self.scale = other.scale.or(self.scale);
        self.margin = other.margin.or(self.margin);
        self.line_padding = other.line_padding.or(self.line_padding);
        self.background = other.background.or(self.background);
        self.text = other.text.or(self.text);
        self.highlight = other.highlight.or(self.highlight);
    }

    pub fn style(&self) -> RenderStyle {
        let default = RenderStyle::default();
        RenderStyle {
            scale: self.scale.unwrap_or(default.scale),
            margin: self.margin.unwrap_or(default.margin),
            line_padding: self.line_padding.unwrap_or(default.line_padding),
            background: self.background.unwrap_or(default.background),
            text: self.text.unwrap_or(default.text),
            highlight: self.highlight.unwrap_or(default.highlight),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the animation is written.
    pub output: Option<PathBuf>,
    pub frame_delay_ms: Option<u32>,
    /// Executed instructions before a run is abandoned. `0` means no limit.
    pub max_steps: Option<usize>,
    /// Frame rendering threads.
    pub workers: Option<usize>,
    pub render: RenderSection,
}

impl Config {
    /// Load configuration from every source, `explicit` being the file given
    /// on the command line.
    pub fn load(explicit: Option<&Path>) -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::user_config_path().and_then(|p| Self::load_from_file(&p)) {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_from_file(Path::new(LOCAL_CONFIG_FILE)) {
            config.merge(local_config);
        }

        if let Some(path) = explicit {
            match Self::load_from_file(path) {
                Some(explicit_config) => config.merge(explicit_config),
                None if !path.exists() => log_warn!("Config file {} not found", path.display()),
                None => (),
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load configuration from a specific file. Missing, unreadable and
    /// malformed files give `None`.
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log_debug!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log_warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log_warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are set in the other config.
    pub fn merge(&mut self, other: Self) {
        if other.output.is_some() {
            self.output = other.output;
        }
        self.frame_delay_ms = other.frame_delay_ms.or(self.frame_delay_ms);
        self.max_steps = other.max_steps.or(self.max_steps);
        self.workers = other.workers.or(self.workers);
        self.render.merge(other.render);
    }

    /// Apply environment variable overrides read through `var`.
    /// Values that do not parse are ignored with a warning.
    pub fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("CYCLESCOPE_OUTPUT") {
            log_debug!("Using CYCLESCOPE_OUTPUT from environment: {}", path);
            self.output = Some(PathBuf::from(path));
        }
        if let Some(raw) = var("CYCLESCOPE_FRAME_DELAY_MS") {
            match raw.trim().parse() {
                Ok(ms) => self.frame_delay_ms = Some(ms),
                Err(_) => log_warn!("Ignoring CYCLESCOPE_FRAME_DELAY_MS={:?}", raw),
            }
        }
        if let Some(raw) = var("CYCLESCOPE_MAX_STEPS") {
            match raw.trim().parse() {
                Ok(steps) => self.max_steps = Some(steps),
                Err(_) => log_warn!("Ignoring CYCLESCOPE_MAX_STEPS={:?}", raw),
            }
        }
    }

    pub fn output(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }

    pub fn frame_delay_ms(&self) -> u32 {
        self.frame_delay_ms.unwrap_or(DEFAULT_FRAME_DELAY_MS)
    }

    /// Step limit handed to the machine, `None` when disabled.
    pub fn step_limit(&self) -> Option<usize> {
        match self.max_steps.unwrap_or(DEFAULT_MAX_STEPS) {
            0 => None,
            n => Some(n),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
            .filter(|w| *w > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
    }

    pub fn render_style(&self) -> RenderStyle {
        self.render.style()
    }

    /// Every setting with defaults filled in.
    pub fn effective(&self) -> Self {
        let style = self.render_style();
        Config {
            output: Some(self.output()),
            frame_delay_ms: Some(self.frame_delay_ms()),
            max_steps: Some(self.max_steps.unwrap_or(DEFAULT_MAX_STEPS)),
            workers: Some(self.workers()),
            render: RenderSection {
                scale: Some(style.scale),
                margin: Some(style.margin),
                line_padding: Some(style.line_padding),
                background: Some(style.background),
                text: Some(style.text),
                highlight: Some(style.highlight),
            },
        }
    }

    /// The effective configuration as a config file.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&self.effective())
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"))
    }
}

//! Configuration loading and parsing.
//!
//! Parses `capsulyric.toml` (or an override path provided by the binary).
//! Every field carries a default so a partial file, a missing file, or a file
//! that fails to parse all yield a usable configuration. Unknown fields are
//! ignored (TOML deserialization tolerance) to allow forward evolution.
//!
//! The raw parsed values are kept as written; `Config::sanitize` computes the
//! effective values, clamping combinations that would break the marquee
//! (e.g. a delay floor above its ceiling) and logging each clamp under the
//! `config` target.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const FILE_NAME: &str = "capsulyric.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MarqueeSection {
    pub max_display_weight: usize,
    pub compensation_threshold: usize,
    pub initial_pause_ms: u64,
    pub final_pause_ms: u64,
}

impl Default for MarqueeSection {
    fn default() -> Self {
        Self {
            max_display_weight: 22,
            compensation_threshold: 8,
            initial_pause_ms: 1000,
            final_pause_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TimingSection {
    pub default_delay_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub min_char_duration_ms: u64,
    pub max_gap_ms: u64,
    pub history: usize,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            default_delay_ms: 1800,
            min_delay_ms: 500,
            max_delay_ms: 5000,
            min_char_duration_ms: 50,
            max_gap_ms: 30_000,
            history: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PublishSection {
    pub throttle_ms: u64,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self { throttle_ms: 50 }
    }
}

/// One `[[rules]]` entry. The field order stays a string here; the rules
/// crate owns its parsing and reports unknown values.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    pub package: String,
    #[serde(default = "RuleEntry::default_enabled")]
    pub enabled: bool,
    #[serde(default = "RuleEntry::default_car_protocol")]
    pub car_protocol: bool,
    #[serde(default = "RuleEntry::default_separator")]
    pub separator: String,
    #[serde(default = "RuleEntry::default_field_order")]
    pub field_order: String,
}

impl RuleEntry {
    const fn default_enabled() -> bool {
        true
    }
    const fn default_car_protocol() -> bool {
        true
    }
    fn default_separator() -> String {
        "-".to_string()
    }
    fn default_field_order() -> String {
        "artist-title".to_string()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct WhitelistSection {
    /// `None` keeps the built-in player list.
    pub packages: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    pub marquee: MarqueeSection,
    pub timing: TimingSection,
    pub publish: PublishSection,
    /// Empty keeps the built-in rules; entries override by package.
    pub rules: Vec<RuleEntry>,
    pub whitelist: WhitelistSection,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub path: Option<PathBuf>,
    pub file: ConfigFile, // parsed (or default) data
    /// Clamped copy of `file` produced by `sanitize`.
    pub effective: ConfigFile,
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("capsulyric").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default().sanitized());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Ok(Config {
            raw: Some(content),
            path: Some(path),
            effective: file.clone(),
            file,
        }
        .sanitized()),
        Err(err) => {
            warn!(
                target: "config",
                path = %path.display(),
                error = %err,
                "config_parse_failed_using_defaults"
            );
            Ok(Config::default().sanitized())
        }
    }
}

impl Config {
    fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }

    /// Recompute `effective` from `file`, clamping inconsistent values.
    /// Returns the number of fields that were clamped.
    pub fn sanitize(&mut self) -> usize {
        let mut eff = self.file.clone();
        let mut clamped = 0usize;

        if eff.marquee.max_display_weight == 0 {
            info!(target: "config", raw = 0, clamped = 1, "max_display_weight_clamped");
            eff.marquee.max_display_weight = 1;
            clamped += 1;
        }
        if eff.marquee.compensation_threshold > eff.marquee.max_display_weight {
            info!(
                target: "config",
                raw = eff.marquee.compensation_threshold,
                clamped = eff.marquee.max_display_weight,
                "compensation_threshold_clamped"
            );
            eff.marquee.compensation_threshold = eff.marquee.max_display_weight;
            clamped += 1;
        }
        // A zero delay would re-arm the tick at the same instant forever.
        if eff.timing.max_delay_ms == 0 {
            info!(target: "config", raw = 0, clamped = 1, "max_delay_clamped");
            eff.timing.max_delay_ms = 1;
            clamped += 1;
        }
        if eff.timing.min_delay_ms == 0 {
            info!(target: "config", raw = 0, clamped = 1, "min_delay_floor_clamped");
            eff.timing.min_delay_ms = 1;
            clamped += 1;
        }
        if eff.timing.min_delay_ms > eff.timing.max_delay_ms {
            info!(
                target: "config",
                raw = eff.timing.min_delay_ms,
                clamped = eff.timing.max_delay_ms,
                "min_delay_clamped"
            );
            eff.timing.min_delay_ms = eff.timing.max_delay_ms;
            clamped += 1;
        }
        let default_delay = eff
            .timing
            .default_delay_ms
            .clamp(eff.timing.min_delay_ms, eff.timing.max_delay_ms);
        if default_delay != eff.timing.default_delay_ms {
            info!(
                target: "config",
                raw = eff.timing.default_delay_ms,
                clamped = default_delay,
                "default_delay_clamped"
            );
            eff.timing.default_delay_ms = default_delay;
            clamped += 1;
        }
        if eff.timing.history == 0 {
            info!(target: "config", raw = 0, clamped = 1, "timing_history_clamped");
            eff.timing.history = 1;
            clamped += 1;
        }

        self.effective = eff;
        clamped
    }
}

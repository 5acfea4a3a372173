//! Conversion from the parsed configuration to runtime components.

use std::str::FromStr;

use anyhow::{Context, Result};
use core_config::ConfigFile;
use core_marquee::MarqueeLayout;
use core_rules::{FieldOrder, ParserRule, RuleSet, Whitelist};
use core_timing::TimerConfig;

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub layout: MarqueeLayout,
    pub timer: TimerConfig,
    pub rules: RuleSet,
    pub whitelist: Whitelist,
    pub throttle_ms: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            layout: MarqueeLayout::default(),
            timer: TimerConfig::default(),
            rules: RuleSet::default(),
            whitelist: Whitelist::default(),
            throttle_ms: 50,
        }
    }
}

impl RuntimeSettings {
    /// Build from effective (already sanitized) configuration values.
    ///
    /// Configured rules are layered over the built-in ones by package; a
    /// configured whitelist replaces the built-in list.
    pub fn from_config(file: &ConfigFile) -> Result<Self> {
        let layout = MarqueeLayout {
            max_display_weight: file.marquee.max_display_weight,
            compensation_threshold: file.marquee.compensation_threshold,
            initial_pause_ms: file.marquee.initial_pause_ms,
            final_pause_ms: file.marquee.final_pause_ms,
        };
        let timer = TimerConfig {
            default_delay_ms: file.timing.default_delay_ms,
            min_delay_ms: file.timing.min_delay_ms,
            max_delay_ms: file.timing.max_delay_ms,
            min_char_duration_ms: file.timing.min_char_duration_ms,
            max_gap_ms: file.timing.max_gap_ms,
            history: file.timing.history,
            ..TimerConfig::default()
        };

        let mut rules = RuleSet::default();
        for entry in &file.rules {
            let order = FieldOrder::from_str(&entry.field_order)
                .with_context(|| format!("rule for {}", entry.package))?;
            let rule = ParserRule::new(entry.package.as_str())
                .with_separator(entry.separator.as_str())
                .with_order(order)
                .enabled(entry.enabled)
                .car_protocol(entry.car_protocol);
            rule.validate()
                .with_context(|| format!("rule for {}", entry.package))?;
            rules.upsert(rule);
        }

        let whitelist = match &file.whitelist.packages {
            Some(packages) => Whitelist::from_packages(packages.iter().map(String::as_str)),
            None => Whitelist::default(),
        };

        Ok(Self {
            layout,
            timer,
            rules,
            whitelist,
            throttle_ms: file.publish.throttle_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::{RuleEntry, WhitelistSection};
    use pretty_assertions::assert_eq;

    fn entry(package: &str, field_order: &str) -> RuleEntry {
        RuleEntry {
            package: package.to_string(),
            enabled: true,
            car_protocol: true,
            separator: " / ".to_string(),
            field_order: field_order.to_string(),
        }
    }

    #[test]
    fn defaults_match_component_defaults() {
        let settings = RuntimeSettings::from_config(&ConfigFile::default()).unwrap();
        assert_eq!(settings.layout, MarqueeLayout::default());
        assert_eq!(settings.timer, TimerConfig::default());
        assert_eq!(settings.rules, RuleSet::default());
        assert_eq!(settings.whitelist, Whitelist::default());
        assert_eq!(settings.throttle_ms, 50);
    }

    #[test]
    fn configured_rules_layer_over_builtins() {
        let mut file = ConfigFile::default();
        file.rules.push(entry("com.example.player", "title-artist"));
        file.rules.push(RuleEntry {
            enabled: false,
            ..entry("com.miui.player", "artist-title")
        });
        let settings = RuntimeSettings::from_config(&file).unwrap();
        assert_eq!(settings.rules.rules().len(), 4);
        let custom = settings.rules.rule_for("com.example.player").unwrap();
        assert_eq!(custom.separator, " / ");
        assert_eq!(custom.field_order, FieldOrder::TitleArtist);
        assert!(settings.rules.rule_for("com.miui.player").is_none());
    }

    #[test]
    fn bad_field_order_names_the_package() {
        let mut file = ConfigFile::default();
        file.rules.push(entry("com.example.player", "sideways"));
        let err = RuntimeSettings::from_config(&file).unwrap_err();
        assert!(format!("{err:#}").contains("com.example.player"));
    }

    #[test]
    fn whitelist_override_replaces_builtins() {
        let mut file = ConfigFile::default();
        file.whitelist = WhitelistSection {
            packages: Some(vec!["com.example.player".to_string()]),
        };
        let settings = RuntimeSettings::from_config(&file).unwrap();
        assert!(settings.whitelist.is_allowed("com.example.player"));
        assert!(!settings.whitelist.is_allowed("com.miui.player"));
    }
}

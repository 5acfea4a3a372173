//! Rule collection and track extraction.

use tracing::debug;

use crate::rule::{ParserRule, parse_with_rule};

pub const DEFAULT_PACKAGES: [&str; 3] = [
    "com.tencent.qqmusic",
    "com.netease.cloudmusic",
    "com.miui.player",
];

const UNKNOWN: &str = "Unknown";

/// Parser rules keyed by package, kept sorted by package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ParserRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(DEFAULT_PACKAGES.iter().map(|p| ParserRule::new(*p)))
    }
}

impl RuleSet {
    /// Build from `rules`; a later rule for the same package replaces an earlier one.
    pub fn new(rules: impl IntoIterator<Item = ParserRule>) -> Self {
        let mut set = Self { rules: Vec::new() };
        for rule in rules {
            set.upsert(rule);
        }
        set
    }

    pub fn upsert(&mut self, rule: ParserRule) {
        match self
            .rules
            .binary_search_by(|r| r.package.as_str().cmp(rule.package.as_str()))
        {
            Ok(i) => self.rules[i] = rule,
            Err(i) => self.rules.insert(i, rule),
        }
    }

    pub fn rules(&self) -> &[ParserRule] {
        &self.rules
    }

    /// Enabled rule for `package`, if any.
    pub fn rule_for(&self, package: &str) -> Option<&ParserRule> {
        self.rules
            .binary_search_by(|r| r.package.as_str().cmp(package))
            .ok()
            .map(|i| &self.rules[i])
            .filter(|r| r.enabled)
    }

    pub fn enabled_packages(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .map(|r| r.package.as_str())
    }
}

/// Track fields recovered from one media metadata update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    /// Present only when a car-protocol rule matched.
    pub lyric: Option<String>,
}

/// Interpret raw media metadata from `package` using `rules`.
pub fn extract_track(
    raw_title: Option<&str>,
    raw_artist: Option<&str>,
    package: &str,
    rules: &RuleSet,
) -> TrackInfo {
    let mut info = TrackInfo {
        title: raw_title.unwrap_or(UNKNOWN).to_string(),
        artist: raw_artist.unwrap_or(UNKNOWN).to_string(),
        lyric: None,
    };

    let rule = rules.rule_for(package).filter(|r| r.car_protocol);
    if let (Some(rule), Some(artist)) = (rule, raw_artist) {
        let parsed = parse_with_rule(artist, rule);
        if !parsed.title.is_empty() {
            info.lyric = raw_title.map(str::to_string);
            info.title = parsed.title;
            info.artist = parsed.artist;
        }
    }
    debug!(
        target: "rules.extract",
        package,
        has_lyric = info.lyric.is_some(),
        "track_extracted"
    );
    info
}

/// Short human name for a player package.
pub fn app_display_name(package: Option<&str>) -> String {
    let Some(package) = package else {
        return "Music".to_string();
    };
    if package.contains("qqmusic") {
        "QQ Music".to_string()
    } else if package.contains("netease") {
        "NetEase".to_string()
    } else if package.contains("miui") {
        "Mi Music".to_string()
    } else {
        package.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::FieldOrder;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_sorted_and_enabled() {
        let set = RuleSet::default();
        let pkgs: Vec<_> = set.enabled_packages().collect();
        assert_eq!(
            pkgs,
            ["com.miui.player", "com.netease.cloudmusic", "com.tencent.qqmusic"]
        );
    }

    #[test]
    fn disabled_rule_is_not_returned() {
        let set = RuleSet::new([ParserRule::new("a").enabled(false)]);
        assert!(set.rule_for("a").is_none());
        assert_eq!(set.enabled_packages().count(), 0);
    }

    #[test]
    fn upsert_replaces_same_package() {
        let mut set = RuleSet::default();
        set.upsert(ParserRule::new("com.miui.player").with_order(FieldOrder::TitleArtist));
        assert_eq!(set.rules().len(), 3);
        assert_eq!(
            set.rule_for("com.miui.player").unwrap().field_order,
            FieldOrder::TitleArtist
        );
    }

    #[test]
    fn car_protocol_moves_title_to_lyric() {
        let info = extract_track(
            Some("故事的小黄花"),
            Some("周杰伦-晴天"),
            "com.tencent.qqmusic",
            &RuleSet::default(),
        );
        assert_eq!(info.lyric.as_deref(), Some("故事的小黄花"));
        assert_eq!(info.title, "晴天");
        assert_eq!(info.artist, "周杰伦");
    }

    #[test]
    fn unknown_package_passes_through() {
        let info = extract_track(Some("Yellow"), Some("Coldplay"), "org.example", &RuleSet::default());
        assert_eq!(info.lyric, None);
        assert_eq!(info.title, "Yellow");
        assert_eq!(info.artist, "Coldplay");
    }

    #[test]
    fn non_car_protocol_rule_passes_through() {
        let set = RuleSet::new([ParserRule::new("p").car_protocol(false)]);
        let info = extract_track(Some("t"), Some("a-b"), "p", &set);
        assert_eq!(info.lyric, None);
    }

    #[test]
    fn missing_fields_become_unknown() {
        let info = extract_track(None, None, "com.tencent.qqmusic", &RuleSet::default());
        assert_eq!(info.title, "Unknown");
        assert_eq!(info.artist, "Unknown");
        assert_eq!(info.lyric, None);
    }

    #[test]
    fn display_names() {
        assert_eq!(app_display_name(Some("com.tencent.qqmusic")), "QQ Music");
        assert_eq!(app_display_name(Some("com.netease.cloudmusic")), "NetEase");
        assert_eq!(app_display_name(Some("com.miui.player")), "Mi Music");
        assert_eq!(app_display_name(Some("org.example")), "org.example");
        assert_eq!(app_display_name(None), "Music");
    }
}

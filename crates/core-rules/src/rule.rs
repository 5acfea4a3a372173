//! Notification parser rules.
//!
//! Many music apps publish lyrics through the "car protocol": while a song
//! plays, the media session's *title* carries the current lyric line and the
//! *artist* field carries `"<artist><sep><title>"` (or the reverse). A rule
//! tells us, per app package, whether that convention is in use and how to
//! split the artist field back into title and artist.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Order of the two fields inside the combined artist string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldOrder {
    /// `"周杰伦-晴天"` -> title `晴天`, artist `周杰伦`.
    #[default]
    ArtistTitle,
    /// `"晴天-周杰伦"` -> title `晴天`, artist `周杰伦`.
    TitleArtist,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unknown field order `{0}` (expected `artist-title` or `title-artist`)")]
    UnknownFieldOrder(String),
    #[error("rule for `{0}` has an empty separator")]
    EmptySeparator(String),
    #[error("rule has an empty package name")]
    EmptyPackage,
}

impl FromStr for FieldOrder {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "artist-title" => Ok(FieldOrder::ArtistTitle),
            "title-artist" => Ok(FieldOrder::TitleArtist),
            _ => Err(RuleError::UnknownFieldOrder(s.to_string())),
        }
    }
}

impl fmt::Display for FieldOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldOrder::ArtistTitle => "artist-title",
            FieldOrder::TitleArtist => "title-artist",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserRule {
    pub package: String,
    pub enabled: bool,
    /// Title field carries the lyric; artist field carries both names.
    pub car_protocol: bool,
    pub separator: String,
    pub field_order: FieldOrder,
}

impl ParserRule {
    pub const DEFAULT_SEPARATOR: &'static str = "-";

    /// Enabled car-protocol rule with the default separator and order.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            enabled: true,
            car_protocol: true,
            separator: Self::DEFAULT_SEPARATOR.to_string(),
            field_order: FieldOrder::ArtistTitle,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_order(mut self, order: FieldOrder) -> Self {
        self.field_order = order;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn car_protocol(mut self, car_protocol: bool) -> Self {
        self.car_protocol = car_protocol;
        self
    }

    /// Reject rules that could never match anything.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.package.trim().is_empty() {
            return Err(RuleError::EmptyPackage);
        }
        if self.separator.is_empty() {
            return Err(RuleError::EmptySeparator(self.package.clone()));
        }
        Ok(())
    }
}

/// Title and artist recovered from a combined field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFields {
    pub title: String,
    pub artist: String,
}

/// Split `input` at the first occurrence of the rule's separator.
///
/// Without a separator the whole input is the title and the artist is empty.
pub fn parse_with_rule(input: &str, rule: &ParserRule) -> ParsedFields {
    let Some((first, second)) = input.split_once(rule.separator.as_str()) else {
        tracing::debug!(
            target: "rules.parser",
            package = rule.package.as_str(),
            separator = rule.separator.as_str(),
            "separator_not_found"
        );
        return ParsedFields {
            title: input.to_string(),
            artist: String::new(),
        };
    };
    let (first, second) = (first.trim().to_string(), second.trim().to_string());
    match rule.field_order {
        FieldOrder::ArtistTitle => ParsedFields {
            title: second,
            artist: first,
        },
        FieldOrder::TitleArtist => ParsedFields {
            title: first,
            artist: second,
        },
    }
}

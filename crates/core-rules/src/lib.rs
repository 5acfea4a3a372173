//! Per-app lyric extraction rules, the player whitelist and display names.

pub mod rule;
pub mod ruleset;
pub mod whitelist;

pub use rule::{FieldOrder, ParsedFields, ParserRule, RuleError, parse_with_rule};
pub use ruleset::{DEFAULT_PACKAGES, RuleSet, TrackInfo, app_display_name, extract_track};
pub use whitelist::{Whitelist, WhitelistEntry};

//! Packages whose media sessions are allowed to drive the capsule.

use crate::ruleset::DEFAULT_PACKAGES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistEntry {
    pub package: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist {
    entries: Vec<WhitelistEntry>,
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::from_packages(DEFAULT_PACKAGES)
    }
}

impl Whitelist {
    /// Entries sorted by package; duplicates keep the last entry.
    pub fn new(entries: impl IntoIterator<Item = WhitelistEntry>) -> Self {
        let mut list: Vec<WhitelistEntry> = Vec::new();
        for entry in entries {
            match list.binary_search_by(|e| e.package.cmp(&entry.package)) {
                Ok(i) => list[i] = entry,
                Err(i) => list.insert(i, entry),
            }
        }
        Self { entries: list }
    }

    pub fn from_packages<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(packages.into_iter().map(|p| WhitelistEntry {
            package: p.into(),
            enabled: true,
        }))
    }

    pub fn entries(&self) -> &[WhitelistEntry] {
        &self.entries
    }

    pub fn is_allowed(&self, package: &str) -> bool {
        self.entries
            .binary_search_by(|e| e.package.as_str().cmp(package))
            .is_ok_and(|i| self.entries[i].enabled)
    }

    pub fn set_enabled(&mut self, package: &str, enabled: bool) -> bool {
        match self
            .entries
            .binary_search_by(|e| e.package.as_str().cmp(package))
        {
            Ok(i) => {
                self.entries[i].enabled = enabled;
                true
            }
            Err(_) => false,
        }
    }
}

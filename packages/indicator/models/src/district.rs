//! District registry and regional grouping.
//!
//! The set of valid districts is fixed: every district of Bangladesh is
//! listed in `districts.toml`, which is baked into the binary at compile
//! time via [`include_str!`]. Each entry carries its accepted spellings
//! and the [`Region`] it is grouped under for regional analysis.
//!
//! A [`District`] remembers the label exactly as it appeared in the input
//! so rows can be written back unchanged, while comparisons, hashing and
//! lookups go through the canonical registry entry. `"Chittagong"` and
//! `"Chattogram"` are therefore the same district.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Registry TOML embedded at compile time.
const DISTRICTS_TOML: &str = include_str!("../districts.toml");

static REGISTRY: LazyLock<DistrictRegistry> = LazyLock::new(|| {
    DistrictRegistry::from_toml(DISTRICTS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse districts.toml: {e}"))
});

/// Regional grouping of districts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Region {
    /// Districts on the Bay of Bengal coast.
    Coastal,
    /// Northern districts (Rajshahi and Rangpur belts).
    Northern,
    /// Greater Dhaka and surrounding districts.
    Central,
    /// Districts not in any of the named groups.
    Other,
}

impl Region {
    /// Returns a capitalized label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Coastal => "Coastal",
            Self::Northern => "Northern",
            Self::Central => "Central",
            Self::Other => "Other",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Coastal, Self::Northern, Self::Central, Self::Other]
    }
}

/// One district as listed in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DistrictEntry {
    /// Canonical spelling.
    pub name: String,
    /// Administrative division the district belongs to.
    pub division: String,
    /// Regional grouping.
    pub region: Region,
    /// Alternate spellings accepted on input.
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    district: Vec<DistrictEntry>,
}

/// Errors raised while building a [`DistrictRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry TOML is malformed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Two entries claim the same spelling.
    #[error("District spelling '{spelling}' is claimed by both {first} and {second}")]
    DuplicateSpelling {
        /// The conflicting spelling.
        spelling: String,
        /// Canonical name of the first entry claiming it.
        first: String,
        /// Canonical name of the second entry claiming it.
        second: String,
    },
}

/// Lookup table of every known district.
#[derive(Debug)]
pub struct DistrictRegistry {
    entries: Vec<DistrictEntry>,
    by_key: BTreeMap<String, usize>,
}

impl DistrictRegistry {
    /// Parses a registry from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the TOML is malformed or two entries
    /// share a spelling.
    pub fn from_toml(toml_str: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(toml_str)?;
        let mut by_key = BTreeMap::new();

        for (idx, entry) in file.district.iter().enumerate() {
            let spellings = std::iter::once(&entry.name).chain(entry.aliases.iter());
            for spelling in spellings {
                let key = normalize_key(spelling);
                match by_key.get(&key) {
                    Some(&existing) if existing != idx => {
                        let first: &DistrictEntry = &file.district[existing];
                        return Err(RegistryError::DuplicateSpelling {
                            spelling: spelling.clone(),
                            first: first.name.clone(),
                            second: entry.name.clone(),
                        });
                    }
                    _ => {
                        by_key.insert(key, idx);
                    }
                }
            }
        }

        Ok(Self {
            entries: file.district,
            by_key,
        })
    }

    /// Returns the registry embedded in this crate.
    ///
    /// # Panics
    ///
    /// Panics on first use if the embedded `districts.toml` is malformed,
    /// which the tests in this crate guard against.
    #[must_use]
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    /// Resolves any accepted spelling (case, spacing and punctuation
    /// insensitive) to its registry entry.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&DistrictEntry> {
        self.by_key
            .get(&normalize_key(name))
            .map(|&idx| &self.entries[idx])
    }

    /// Returns every entry in registry order.
    #[must_use]
    pub fn entries(&self) -> &[DistrictEntry] {
        &self.entries
    }

    /// Returns the entries grouped under a region.
    pub fn in_region(&self, region: Region) -> impl Iterator<Item = &DistrictEntry> {
        self.entries.iter().filter(move |e| e.region == region)
    }

    /// Number of districts in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the registry has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercases and strips everything but letters and digits, so that
/// `"Cox's Bazar"`, `"coxs bazar"` and `"COX'S-BAZAR"` compare equal.
fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Error returned when a name does not match any known district.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown district '{name}'")]
pub struct UnknownDistrictError {
    /// The name that failed to resolve.
    pub name: String,
}

/// A validated district label.
#[derive(Debug, Clone)]
pub struct District {
    label: String,
    entry: &'static DistrictEntry,
}

impl District {
    /// Validates a label against the embedded registry, keeping the label
    /// exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownDistrictError`] if the label is not an accepted
    /// spelling of any district.
    pub fn parse(label: &str) -> Result<Self, UnknownDistrictError> {
        let entry = DistrictRegistry::global()
            .resolve(label)
            .ok_or_else(|| UnknownDistrictError {
                name: label.to_string(),
            })?;
        Ok(Self {
            label: label.to_string(),
            entry,
        })
    }

    /// The label as it appeared in the input.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The canonical registry spelling.
    #[must_use]
    pub fn name(&self) -> &'static str {
        let entry: &'static DistrictEntry = self.entry;
        &entry.name
    }

    /// The administrative division.
    #[must_use]
    pub fn division(&self) -> &'static str {
        let entry: &'static DistrictEntry = self.entry;
        &entry.division
    }

    /// The regional grouping.
    #[must_use]
    pub const fn region(&self) -> Region {
        self.entry.region
    }

    /// Returns `true` if `name` is any accepted spelling of this district.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        DistrictRegistry::global()
            .resolve(name)
            .is_some_and(|e| e.name == self.entry.name)
    }
}

impl PartialEq for District {
    fn eq(&self, other: &Self) -> bool {
        self.entry.name == other.entry.name
    }
}

impl Eq for District {}

impl std::hash::Hash for District {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.entry.name.hash(state);
    }
}

impl PartialOrd for District {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for District {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.entry.name.cmp(&other.entry.name)
    }
}

impl std::fmt::Display for District {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for District {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_loads_all_districts() {
        assert_eq!(DistrictRegistry::global().len(), 64);
    }

    #[test]
    fn region_groups_match_known_lists() {
        let registry = DistrictRegistry::global();
        let coastal: Vec<&str> = registry
            .in_region(Region::Coastal)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(coastal.len(), 6);
        assert!(coastal.contains(&"Cox's Bazar"));
        assert_eq!(registry.in_region(Region::Northern).count(), 6);
        assert_eq!(registry.in_region(Region::Central).count(), 5);
    }

    #[test]
    fn resolves_alternate_spellings() {
        let registry = DistrictRegistry::global();
        assert_eq!(registry.resolve("Chittagong").unwrap().name, "Chattogram");
        assert_eq!(registry.resolve("coxs bazar").unwrap().name, "Cox's Bazar");
        assert_eq!(registry.resolve("BOGRA").unwrap().name, "Bogura");
        assert!(registry.resolve("Kolkata").is_none());
    }

    #[test]
    fn district_keeps_label_but_compares_canonically() {
        let a = District::parse("Chittagong").unwrap();
        let b = District::parse("Chattogram").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.label(), "Chittagong");
        assert_eq!(a.name(), "Chattogram");
        assert_eq!(a.region(), Region::Coastal);
        assert_eq!(a.division(), "Chattogram");
        assert!(b.matches("chittagong"));
    }

    #[test]
    fn unknown_district_is_rejected() {
        let err = District::parse("Atlantis").unwrap_err();
        assert_eq!(err.name, "Atlantis");
    }

    #[test]
    fn duplicate_spelling_across_entries_is_an_error() {
        let toml = r#"
            [[district]]
            name = "Dhaka"
            division = "Dhaka"
            region = "central"

            [[district]]
            name = "Dacca"
            division = "Dhaka"
            region = "central"
            aliases = ["dhaka"]
        "#;
        assert!(matches!(
            DistrictRegistry::from_toml(toml),
            Err(RegistryError::DuplicateSpelling { .. })
        ));
    }
}

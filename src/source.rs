//! Data sources that steer web search toward a site or a set of sites.
//!
//! The table is built once at startup (built-in defaults or the `[sources]`
//! section of the config file) and never changes afterwards.

use serde::{Deserialize, Serialize};

/// Identifier meaning "do not restrict the search".
pub const NO_RESTRICTION: &str = "none";

/// Identifier of the built-in aggregate source.
pub const ALL_SOURCES: &str = "all";

/// What a data source points the search at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTarget {
    /// A single domain (`bryancountyga.com`) or a suffix marker (`.gov`).
    Site(String),
    /// Every domain in the table.
    All,
}

/// A named filter for web search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub label: String,
    pub target: SourceTarget,
}

impl DataSource {
    /// Create a single-site source.
    pub fn site(id: &str, label: &str, site: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            target: SourceTarget::Site(site.to_string()),
        }
    }

    /// Create an aggregate source.
    pub fn all(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            target: SourceTarget::All,
        }
    }

    /// Returns true if this source targets a domain rather than a suffix.
    pub fn is_domain(&self) -> bool {
        matches!(&self.target, SourceTarget::Site(site) if !site.starts_with('.'))
    }
}

/// Built-in source list.
pub fn builtin_sources() -> Vec<DataSource> {
    vec![
        DataSource::site("bryancounty", "Bryan County", "bryancountyga.com"),
        DataSource::site("chathamcounty", "Chatham County", "chathamcountyga.gov"),
        DataSource::site("effinghamcounty", "Effingham County", "effinghamcounty.org"),
        DataSource::site("libertycounty", "Liberty County", "libertycountyga.com"),
        DataSource::site("savannah", "City of Savannah", "savannahga.gov"),
        DataSource::site("census", "U.S. Census Bureau", "census.gov"),
        DataSource::site("gov", "Government sites (.gov)", ".gov"),
        DataSource::all(ALL_SOURCES, "All local sources"),
    ]
}

/// Returns true if `id` selects no restriction.
pub fn is_unrestricted(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || id.eq_ignore_ascii_case(NO_RESTRICTION)
}

/// Immutable lookup table of data sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTable {
    sources: Vec<DataSource>,
}

impl Default for SourceTable {
    fn default() -> Self {
        Self::new(builtin_sources())
    }
}

impl SourceTable {
    /// Build a table from a list of sources. Later duplicates of an id are ignored.
    pub fn new(sources: Vec<DataSource>) -> Self {
        let mut deduped: Vec<DataSource> = Vec::with_capacity(sources.len());
        for source in sources {
            if !deduped.iter().any(|s| s.id == source.id) {
                deduped.push(source);
            }
        }
        Self { sources: deduped }
    }

    /// Look up a source by identifier.
    pub fn get(&self, id: &str) -> Option<&DataSource> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// All sources in display order.
    pub fn iter(&self) -> impl Iterator<Item = &DataSource> {
        self.sources.iter()
    }

    /// Number of configured sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if the table has no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Every single-site domain in table order (suffix markers excluded).
    pub fn domains(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.is_domain())
            .filter_map(|s| match &s.target {
                SourceTarget::Site(site) => Some(site.as_str()),
                SourceTarget::All => None,
            })
            .collect()
    }

    /// Human-readable label for an identifier.
    pub fn label_for(&self, id: &str) -> &str {
        if is_unrestricted(id) {
            return "No restriction";
        }
        self.get(id).map(|s| s.label.as_str()).unwrap_or("No restriction")
    }

    /// Selectable identifiers: "no restriction" first, then every source.
    pub fn choices(&self) -> Vec<&str> {
        std::iter::once(NO_RESTRICTION)
            .chain(self.sources.iter().map(|s| s.id.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = SourceTable::default();
        let source = table.get("bryancounty").unwrap();
        assert_eq!(source.target, SourceTarget::Site("bryancountyga.com".to_string()));
        assert!(table.get("atlantis").is_none());
    }

    #[test]
    fn test_domains_exclude_suffix_and_aggregate() {
        let table = SourceTable::default();
        let domains = table.domains();
        assert!(domains.contains(&"census.gov"));
        assert!(!domains.contains(&".gov"));
        assert_eq!(domains.len(), 6);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let table = SourceTable::new(vec![
            DataSource::site("a", "First", "a.com"),
            DataSource::site("a", "Second", "b.com"),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.label_for("a"), "First");
    }

    #[test]
    fn test_unrestricted_ids() {
        assert!(is_unrestricted(""));
        assert!(is_unrestricted("none"));
        assert!(is_unrestricted(" NONE "));
        assert!(!is_unrestricted("gov"));
    }

    #[test]
    fn test_choices_start_with_no_restriction() {
        let table = SourceTable::default();
        let choices = table.choices();
        assert_eq!(choices[0], NO_RESTRICTION);
        assert_eq!(choices.len(), table.len() + 1);
        assert_eq!(table.label_for("none"), "No restriction");
        assert_eq!(table.label_for("unknown"), "No restriction");
    }

    #[test]
    fn test_target_toml_shape() {
        #[derive(Deserialize)]
        struct Wrapper {
            sources: Vec<DataSource>,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
[[sources]]
id = "tybee"
label = "Tybee Island"
target = { site = "cityoftybee.org" }

[[sources]]
id = "all"
label = "Everything"
target = "all"
"#,
        )
        .unwrap();
        assert_eq!(parsed.sources[0].target, SourceTarget::Site("cityoftybee.org".to_string()));
        assert_eq!(parsed.sources[1].target, SourceTarget::All);
    }
}

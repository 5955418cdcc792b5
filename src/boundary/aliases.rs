//! Known locality aliases.
//!
//! This table is configuration data: adding a locality means adding an
//! entry here or in the TOML config, never touching the scoring code.

use serde::{Deserialize, Serialize};

fn default_marker() -> String {
    "stad".to_string()
}

fn default_large_type_score() -> f64 {
    95.0
}

fn default_size_bonus() -> f64 {
    50.0
}

fn default_max_area_km2() -> f64 {
    4000.0
}

/// Municipalities whose legal boundary is much larger than the urban area
/// (e.g. Swedish "stad" municipalities). Candidates matching this rule get an
/// override type score, a fixed size score and a wider size window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeMunicipality {
    /// Substring the candidate name must contain, besides one of the entry keys
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_large_type_score")]
    pub type_score: f64,
    #[serde(default = "default_size_bonus")]
    pub size_bonus: f64,
    #[serde(default = "default_max_area_km2")]
    pub max_area_km2: f64,
}

impl Default for LargeMunicipality {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            type_score: default_large_type_score(),
            size_bonus: default_size_bonus(),
            max_area_km2: default_max_area_km2(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    /// Lower-case substrings identifying this locality in any spelling
    pub keys: Vec<String>,
    /// Local-script or historical names to query as well
    #[serde(default)]
    pub alternates: Vec<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Local administrative forms, `{name}` is replaced by the variant
    #[serde(default)]
    pub suffix_forms: Vec<String>,
    #[serde(default)]
    pub large_municipality: Option<LargeMunicipality>,
}

impl AliasEntry {
    /// True if `name` contains any of the keys, ignoring case
    pub fn matches(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.keys.iter().any(|k| lower.contains(&k.to_lowercase()))
    }

    /// Large-municipality rule applying to a candidate with this name
    pub fn large_municipality_for(&self, candidate_name: &str) -> Option<&LargeMunicipality> {
        let rule = self.large_municipality.as_ref()?;
        let lower = candidate_name.to_lowercase();
        (lower.contains(&rule.marker.to_lowercase()) && self.matches(candidate_name))
            .then_some(rule)
    }

    /// Localities recovered from past pilot submissions
    pub fn builtin() -> Vec<AliasEntry> {
        fn strings(values: &[&str]) -> Vec<String> {
            values.iter().map(|s| s.to_string()).collect()
        }

        vec![
            AliasEntry {
                keys: strings(&["göteborg", "gothenburg"]),
                alternates: strings(&["Göteborg", "Göteborgs Stad"]),
                country: Some("Sweden".into()),
                suffix_forms: strings(&["{name} kommun", "{name}s Stad"]),
                large_municipality: Some(LargeMunicipality::default()),
            },
            AliasEntry {
                keys: strings(&["stockholm"]),
                alternates: vec![],
                country: Some("Sweden".into()),
                suffix_forms: strings(&["{name} kommun", "{name}s Stad"]),
                large_municipality: Some(LargeMunicipality::default()),
            },
            AliasEntry {
                keys: strings(&["malmö", "malmo"]),
                alternates: strings(&["Malmö", "Malmö Stad"]),
                country: Some("Sweden".into()),
                suffix_forms: strings(&["{name} kommun"]),
                large_municipality: Some(LargeMunicipality::default()),
            },
            AliasEntry {
                keys: strings(&["utrecht"]),
                alternates: vec![],
                country: Some("Netherlands".into()),
                suffix_forms: strings(&["{name} gemeente"]),
                large_municipality: None,
            },
            AliasEntry {
                keys: strings(&["heidelberg"]),
                alternates: vec![],
                country: Some("Germany".into()),
                suffix_forms: vec![],
                large_municipality: None,
            },
            AliasEntry {
                keys: strings(&["barcelona"]),
                alternates: vec![],
                country: Some("Spain".into()),
                suffix_forms: vec![],
                large_municipality: None,
            },
            AliasEntry {
                keys: strings(&["budapest"]),
                alternates: vec![],
                country: Some("Hungary".into()),
                suffix_forms: vec![],
                large_municipality: None,
            },
        ]
    }
}

/// Ordered collection of [`AliasEntry`]
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn new(entries: Vec<AliasEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    /// Entries whose keys occur in `name`, in table order
    pub fn matching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AliasEntry> + 'a {
        self.entries.iter().filter(move |e| e.matches(name))
    }

    /// First large-municipality rule that applies to a candidate name
    pub fn large_municipality_for(&self, candidate_name: &str) -> Option<&LargeMunicipality> {
        self.entries
            .iter()
            .find_map(|e| e.large_municipality_for(candidate_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        AliasTable::new(AliasEntry::builtin())
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let table = table();
        let hits: Vec<_> = table.matching("GÖTEBORG").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].country.as_deref(), Some("Sweden"));
        assert_eq!(table.matching("Gothenburg").count(), 1);
        assert_eq!(table.matching("lisbon").count(), 0);
    }

    #[test]
    fn test_large_municipality_needs_marker_and_key() {
        let table = table();
        assert!(table.large_municipality_for("Göteborgs Stad").is_some());
        assert!(table.large_municipality_for("Stockholms stad").is_some());
        assert!(table.large_municipality_for("Göteborg").is_none());
        assert!(table.large_municipality_for("Karlstad").is_none());
        assert!(table.large_municipality_for("Utrecht stad").is_none());
    }

    #[test]
    fn test_entry_from_toml_uses_rule_defaults() {
        #[derive(Deserialize)]
        struct Wrapper {
            aliases: Vec<AliasEntry>,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
            [[aliases]]
            keys = ["oslo"]
            country = "Norway"
            suffix_forms = ["{name} kommune"]
            [aliases.large_municipality]
            marker = "kommune"
            "#,
        )
        .unwrap();
        let entry = &parsed.aliases[0];
        let rule = entry.large_municipality.as_ref().unwrap();
        assert_eq!(rule.marker, "kommune");
        assert_eq!(rule.type_score, 95.0);
        assert_eq!(rule.max_area_km2, 4000.0);
        assert!(entry.alternates.is_empty());
    }
}

//! Candidate scoring and eligibility.
//!
//! Pure functions over candidate fields, kept apart from the network code so
//! they can be exercised with canned candidates.

use geo::Geometry;
use tracing::debug;

use super::{AliasTable, LargeMunicipality};
use crate::geometry::kernel;
use crate::nominatim::SearchHit;

/// Smallest boundary accepted, in km²
pub const MIN_AREA_KM2: f64 = 10.0;
/// Largest boundary accepted unless a large-municipality rule applies
pub const MAX_AREA_KM2: f64 = 2000.0;
/// Size score peaks at this area
pub const PREFERRED_AREA_KM2: f64 = 200.0;
pub const DEFAULT_TYPE_SCORE: f64 = 50.0;

/// One polygon result for one query, not yet confirmed as the boundary.
#[derive(Debug, Clone)]
pub struct BoundaryCandidate {
    pub geometry: Geometry<f64>,
    pub feature_type: String,
    pub class: String,
    pub display_name: String,
    pub name: String,
    pub area_km2: f64,
    /// Variant query that returned this candidate
    pub query: String,
}

impl BoundaryCandidate {
    /// Build from a search hit; hits without geometry yield nothing.
    pub fn from_hit(hit: SearchHit, query: &str) -> Option<Self> {
        let geometry = hit.geometry?;
        let area_km2 = kernel::area_km2(&geometry);
        Some(Self {
            geometry,
            feature_type: hit.feature_type,
            class: hit.class,
            display_name: hit.display_name,
            name: hit.name,
            area_km2,
            query: query.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub type_score: f64,
    pub size_score: f64,
}

impl CandidateScore {
    pub fn total(&self) -> f64 {
        self.type_score + self.size_score
    }
}

/// Predicates of the type-score table, checked in order
#[derive(Debug, Clone, Copy)]
enum TypeRule {
    Type(&'static str),
    ClassWithDisplayWord {
        class: &'static str,
        word: &'static str,
    },
    TypeIn(&'static [&'static str]),
    /// Administrative boundary matching a large-municipality alias; the
    /// alias rule supplies the score
    LargeMunicipality,
    AdministrativeBelow {
        max_area_km2: f64,
    },
}

const TYPE_RULES: &[(TypeRule, f64)] = &[
    (TypeRule::Type("city"), 100.0),
    (
        TypeRule::ClassWithDisplayWord {
            class: "place",
            word: "city",
        },
        90.0,
    ),
    (TypeRule::TypeIn(&["town", "village"]), 80.0),
    (TypeRule::LargeMunicipality, 95.0),
    (TypeRule::AdministrativeBelow { max_area_km2: 500.0 }, 70.0),
    (TypeRule::Type("administrative"), 30.0),
];

/// Lower-cased view of the fields the rules read
struct Fields {
    feature_type: String,
    class: String,
    display_name: String,
    area_km2: f64,
}

impl TypeRule {
    fn score(
        &self,
        fields: &Fields,
        large: Option<&LargeMunicipality>,
        table_score: f64,
    ) -> Option<f64> {
        let applies = match self {
            TypeRule::Type(t) => fields.feature_type == *t,
            TypeRule::ClassWithDisplayWord { class, word } => {
                fields.class == *class && fields.display_name.contains(word)
            }
            TypeRule::TypeIn(types) => types.contains(&fields.feature_type.as_str()),
            TypeRule::LargeMunicipality => {
                return (fields.feature_type == "administrative")
                    .then_some(large)
                    .flatten()
                    .map(|rule| rule.type_score);
            }
            TypeRule::AdministrativeBelow { max_area_km2 } => {
                fields.feature_type == "administrative" && fields.area_km2 < *max_area_km2
            }
        };
        applies.then_some(table_score)
    }
}

/// Scores candidates against a fixed rule table plus the alias table.
pub struct Scorer<'a> {
    aliases: &'a AliasTable,
}

impl<'a> Scorer<'a> {
    pub fn new(aliases: &'a AliasTable) -> Self {
        Self { aliases }
    }

    fn large_rule(&self, candidate: &BoundaryCandidate) -> Option<&'a LargeMunicipality> {
        self.aliases.large_municipality_for(&candidate.name)
    }

    pub fn type_score(&self, candidate: &BoundaryCandidate) -> f64 {
        let fields = Fields {
            feature_type: candidate.feature_type.to_lowercase(),
            class: candidate.class.to_lowercase(),
            display_name: candidate.display_name.to_lowercase(),
            area_km2: candidate.area_km2,
        };
        let large = self.large_rule(candidate);
        TYPE_RULES
            .iter()
            .find_map(|(rule, score)| rule.score(&fields, large, *score))
            .unwrap_or(DEFAULT_TYPE_SCORE)
    }

    pub fn size_score(&self, candidate: &BoundaryCandidate) -> f64 {
        match self.large_rule(candidate) {
            Some(rule) => rule.size_bonus,
            None => bell_size_score(candidate.area_km2),
        }
    }

    pub fn score(&self, candidate: &BoundaryCandidate) -> CandidateScore {
        CandidateScore {
            type_score: self.type_score(candidate),
            size_score: self.size_score(candidate),
        }
    }

    /// Polygonal and within the size window
    pub fn is_eligible(&self, candidate: &BoundaryCandidate) -> bool {
        if !kernel::is_areal(&candidate.geometry) {
            return false;
        }
        let max_area = self
            .large_rule(candidate)
            .map(|rule| rule.max_area_km2)
            .unwrap_or(MAX_AREA_KM2);
        candidate.area_km2 > MIN_AREA_KM2 && candidate.area_km2 < max_area
    }
}

/// `max(0, 100 - |area - 200| / 10)`
pub fn bell_size_score(area_km2: f64) -> f64 {
    (100.0 - (area_km2 - PREFERRED_AREA_KM2).abs() / 10.0).max(0.0)
}

/// Tracks the best eligible candidate; the first of equal scores wins.
pub struct BestCandidate<'s, 'a> {
    scorer: &'s Scorer<'a>,
    best: Option<(BoundaryCandidate, CandidateScore)>,
}

impl<'s, 'a> BestCandidate<'s, 'a> {
    pub fn new(scorer: &'s Scorer<'a>) -> Self {
        Self { scorer, best: None }
    }

    /// Offer a candidate; returns true if it became the new best
    pub fn offer(&mut self, candidate: BoundaryCandidate) -> bool {
        let score = self.scorer.score(&candidate);
        let eligible = self.scorer.is_eligible(&candidate);
        debug!(
            "  {} '{}' type='{}' class='{}' area={:.2} km² score={:.1} eligible={}",
            kernel::type_name(&candidate.geometry),
            candidate.display_name,
            candidate.feature_type,
            candidate.class,
            candidate.area_km2,
            score.total(),
            eligible
        );
        if !eligible {
            return false;
        }
        let better = self
            .best
            .as_ref()
            .map_or(true, |(_, best)| score.total() > best.total());
        if better {
            self.best = Some((candidate, score));
        }
        better
    }

    pub fn into_best(self) -> Option<(BoundaryCandidate, CandidateScore)> {
        self.best
    }
}

/// Pick the best eligible candidate from an ordered sequence.
pub fn select_best<I>(
    scorer: &Scorer<'_>,
    candidates: I,
) -> Option<(BoundaryCandidate, CandidateScore)>
where
    I: IntoIterator<Item = BoundaryCandidate>,
{
    let mut best = BestCandidate::new(scorer);
    for candidate in candidates {
        best.offer(candidate);
    }
    best.into_best()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::AliasEntry;
    use geo::point;

    fn table() -> AliasTable {
        AliasTable::new(AliasEntry::builtin())
    }

    fn candidate(
        feature_type: &str,
        class: &str,
        display: &str,
        name: &str,
        area_km2: f64,
    ) -> BoundaryCandidate {
        BoundaryCandidate {
            geometry: crate::geometry::kernel::tests::square(0.0, 0.0, 0.1),
            feature_type: feature_type.into(),
            class: class.into(),
            display_name: display.into(),
            name: name.into(),
            area_km2,
            query: "q".into(),
        }
    }

    #[test]
    fn test_type_rules_in_order() {
        let table = table();
        let scorer = Scorer::new(&table);
        assert_eq!(scorer.type_score(&candidate("city", "place", "", "", 100.0)), 100.0);
        assert_eq!(scorer.type_score(&candidate("hamlet", "place", "Some City, X", "", 100.0)), 90.0);
        assert_eq!(scorer.type_score(&candidate("town", "place", "", "", 100.0)), 80.0);
        assert_eq!(scorer.type_score(&candidate("village", "", "", "", 100.0)), 80.0);
        assert_eq!(scorer.type_score(&candidate("administrative", "boundary", "", "", 499.0)), 70.0);
        assert_eq!(scorer.type_score(&candidate("administrative", "boundary", "", "", 500.0)), 30.0);
        assert_eq!(scorer.type_score(&candidate("", "", "", "", 100.0)), DEFAULT_TYPE_SCORE);
    }

    #[test]
    fn test_large_municipality_override() {
        let table = table();
        let scorer = Scorer::new(&table);
        let gbg = candidate("administrative", "boundary", "Göteborgs Stad, Sweden", "Göteborgs Stad", 3500.0);
        assert_eq!(scorer.type_score(&gbg), 95.0);
        assert_eq!(scorer.size_score(&gbg), 50.0);
        assert!(scorer.is_eligible(&gbg));

        // A city-typed result keeps its own type score
        let city = candidate("city", "place", "", "Göteborgs Stad", 3500.0);
        assert_eq!(scorer.type_score(&city), 100.0);
    }

    #[test]
    fn test_size_window() {
        let table = table();
        let scorer = Scorer::new(&table);
        assert!(!scorer.is_eligible(&candidate("city", "", "", "Lyon", 10.0)));
        assert!(scorer.is_eligible(&candidate("city", "", "", "Lyon", 10.5)));
        assert!(scorer.is_eligible(&candidate("city", "", "", "Lyon", 1999.0)));
        assert!(!scorer.is_eligible(&candidate("city", "", "", "Lyon", 3000.0)));
        assert!(!scorer.is_eligible(&candidate("administrative", "", "", "Göteborgs Stad", 4100.0)));
    }

    #[test]
    fn test_point_never_eligible() {
        let table = table();
        let scorer = Scorer::new(&table);
        for area in [0.0, 50.0, 200.0, 1500.0] {
            let mut c = candidate("city", "place", "", "", area);
            c.geometry = Geometry::Point(point!(x: 1.0, y: 1.0));
            assert!(!scorer.is_eligible(&c));
        }
    }

    #[test]
    fn test_bell_size_score() {
        assert_eq!(bell_size_score(200.0), 100.0);
        assert_eq!(bell_size_score(300.0), 90.0);
        assert_eq!(bell_size_score(100.0), 90.0);
        assert_eq!(bell_size_score(1500.0), 0.0);
    }

    #[test]
    fn test_select_best_prefers_higher_score() {
        let table = table();
        let scorer = Scorer::new(&table);
        let candidates = vec![
            candidate("administrative", "boundary", "Region", "Region", 1500.0),
            candidate("city", "place", "Lyon", "Lyon", 1000.0),
            candidate("town", "place", "Lyon", "Lyon", 200.0),
        ];
        let (best, score) = select_best(&scorer, candidates).unwrap();
        assert_eq!(best.feature_type, "town");
        assert_eq!(score.total(), 180.0);
    }

    #[test]
    fn test_select_best_first_wins_ties() {
        let table = table();
        let scorer = Scorer::new(&table);
        let mut first = candidate("city", "place", "A", "A", 150.0);
        first.query = "first".into();
        let mut second = first.clone();
        second.query = "second".into();

        let (best, _) = select_best(&scorer, vec![first.clone(), second.clone()]).unwrap();
        assert_eq!(best.query, "first");
        let (best, _) = select_best(&scorer, vec![second, first]).unwrap();
        assert_eq!(best.query, "second");
    }

    #[test]
    fn test_score_independent_of_order() {
        let table = table();
        let scorer = Scorer::new(&table);
        let a = candidate("administrative", "boundary", "Utrecht", "Utrecht", 99.0);
        let before = scorer.score(&a);
        let _ = scorer.score(&candidate("city", "", "", "", 10.0));
        assert_eq!(scorer.score(&a), before);
    }

    #[test]
    fn test_select_best_none_when_nothing_eligible() {
        let table = table();
        let scorer = Scorer::new(&table);
        let candidates = vec![candidate("city", "", "", "", 5.0), candidate("city", "", "", "", 2500.0)];
        assert!(select_best(&scorer, candidates).is_none());
    }
}

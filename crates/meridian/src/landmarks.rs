//! Static landmark overrides and quick-pick locations.
//!
//! A small built-in table of world-famous landmarks short-circuits the
//! ranking for queries that obviously target one of them; a second table of
//! major cities pads the shortlist for bare prefixes. Both produce ordinary
//! suggestions with embedded geometry, so committing one needs no network.

use meridian_providers::{Feature, FeatureKind, LngLat, ProviderKind, Suggestion};

use crate::{aggregate::dedup_keep_first, intent::normalize_query};

/// The UI never shows more than this many suggestions.
pub const SHORTLIST_CAP: usize = 5;

/// Prefix alias matches need this many characters; exact matches always
/// count.
const MIN_PREFIX_LEN: usize = 3;

struct StaticPlace {
    aliases: &'static [&'static str],
    name: &'static str,
    subtitle: &'static str,
    kind: FeatureKind,
    lng: f64,
    lat: f64,
}

impl StaticPlace {
    fn matches(&self, normalized_query: &str) -> bool {
        self.aliases.iter().any(|alias| {
            *alias == normalized_query
                || (normalized_query.len() >= MIN_PREFIX_LEN
                    && alias.starts_with(normalized_query))
        })
    }

    fn suggestion(&self) -> Suggestion {
        let feature = Feature::new(
            LngLat::new(self.lng, self.lat),
            format!("{}, {}", self.name, self.subtitle),
        )
        .with_kind(self.kind);
        Suggestion {
            id: format!("static.{}", self.aliases[0].replace(' ', "-")),
            name: self.name.to_owned(),
            subtitle: self.subtitle.to_owned(),
            kind: self.kind,
            origin: ProviderKind::Static,
            feature: Some(feature),
        }
    }
}

const LANDMARKS: &[StaticPlace] = &[
    StaticPlace {
        aliases: &["eiffel tower", "eiffel"],
        name: "Eiffel Tower",
        subtitle: "Paris, France",
        kind: FeatureKind::Poi,
        lng: 2.2945,
        lat: 48.8584,
    },
    StaticPlace {
        aliases: &["statue of liberty", "liberty island"],
        name: "Statue of Liberty",
        subtitle: "New York, United States",
        kind: FeatureKind::Poi,
        lng: -74.0445,
        lat: 40.6892,
    },
    StaticPlace {
        aliases: &["big ben", "elizabeth tower"],
        name: "Big Ben",
        subtitle: "London, United Kingdom",
        kind: FeatureKind::Poi,
        lng: -0.1246,
        lat: 51.5007,
    },
    StaticPlace {
        aliases: &["taj mahal"],
        name: "Taj Mahal",
        subtitle: "Agra, India",
        kind: FeatureKind::Poi,
        lng: 78.0421,
        lat: 27.1751,
    },
    StaticPlace {
        aliases: &["colosseum", "coliseum"],
        name: "Colosseum",
        subtitle: "Rome, Italy",
        kind: FeatureKind::Poi,
        lng: 12.4922,
        lat: 41.8902,
    },
    StaticPlace {
        aliases: &["golden gate bridge", "golden gate"],
        name: "Golden Gate Bridge",
        subtitle: "San Francisco, United States",
        kind: FeatureKind::Poi,
        lng: -122.4783,
        lat: 37.8199,
    },
    StaticPlace {
        aliases: &["sydney opera house", "opera house"],
        name: "Sydney Opera House",
        subtitle: "Sydney, Australia",
        kind: FeatureKind::Poi,
        lng: 151.2153,
        lat: -33.8568,
    },
    StaticPlace {
        aliases: &["burj khalifa"],
        name: "Burj Khalifa",
        subtitle: "Dubai, United Arab Emirates",
        kind: FeatureKind::Poi,
        lng: 55.2744,
        lat: 25.1972,
    },
    StaticPlace {
        aliases: &["machu picchu"],
        name: "Machu Picchu",
        subtitle: "Cusco Region, Peru",
        kind: FeatureKind::Poi,
        lng: -72.5450,
        lat: -13.1631,
    },
    StaticPlace {
        aliases: &["times square"],
        name: "Times Square",
        subtitle: "New York, United States",
        kind: FeatureKind::Poi,
        lng: -73.9855,
        lat: 40.7580,
    },
];

const QUICK_PICKS: &[StaticPlace] = &[
    StaticPlace {
        aliases: &["new york"],
        name: "New York",
        subtitle: "United States",
        kind: FeatureKind::Place,
        lng: -74.0060,
        lat: 40.7128,
    },
    StaticPlace {
        aliases: &["london"],
        name: "London",
        subtitle: "United Kingdom",
        kind: FeatureKind::Place,
        lng: -0.1276,
        lat: 51.5074,
    },
    StaticPlace {
        aliases: &["tokyo"],
        name: "Tokyo",
        subtitle: "Japan",
        kind: FeatureKind::Place,
        lng: 139.6917,
        lat: 35.6895,
    },
    StaticPlace {
        aliases: &["paris"],
        name: "Paris",
        subtitle: "France",
        kind: FeatureKind::Place,
        lng: 2.3522,
        lat: 48.8566,
    },
    StaticPlace {
        aliases: &["dubai"],
        name: "Dubai",
        subtitle: "United Arab Emirates",
        kind: FeatureKind::Place,
        lng: 55.2708,
        lat: 25.2048,
    },
    StaticPlace {
        aliases: &["singapore"],
        name: "Singapore",
        subtitle: "Singapore",
        kind: FeatureKind::Place,
        lng: 103.8198,
        lat: 1.3521,
    },
    StaticPlace {
        aliases: &["sydney"],
        name: "Sydney",
        subtitle: "Australia",
        kind: FeatureKind::Place,
        lng: 151.2093,
        lat: -33.8688,
    },
    StaticPlace {
        aliases: &["berlin"],
        name: "Berlin",
        subtitle: "Germany",
        kind: FeatureKind::Place,
        lng: 13.4050,
        lat: 52.5200,
    },
];

/// Assemble the final shortlist: landmark overrides ahead of ranked dynamic
/// suggestions ahead of quick picks, deduplicated, capped at `cap` entries
/// ([`SHORTLIST_CAP`] by default).
pub fn shortlist(query: &str, dynamic: Vec<Suggestion>, cap: usize) -> Vec<Suggestion> {
    let normalized = normalize_query(query);
    let mut merged = matching(LANDMARKS, &normalized);
    merged.extend(dynamic);
    merged.extend(matching(QUICK_PICKS, &normalized));
    dedup_keep_first(&mut merged);
    merged.truncate(cap);
    merged
}

fn matching(table: &[StaticPlace], normalized_query: &str) -> Vec<Suggestion> {
    if normalized_query.is_empty() {
        return Vec::new();
    }
    table
        .iter()
        .filter(|place| place.matches(normalized_query))
        .map(StaticPlace::suggestion)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic(name: &str, subtitle: &str) -> Suggestion {
        Suggestion {
            id: name.to_lowercase(),
            name: name.to_owned(),
            subtitle: subtitle.to_owned(),
            kind: FeatureKind::Place,
            origin: ProviderKind::Geocoder,
            feature: None,
        }
    }

    #[test]
    fn landmark_overrides_lead_the_shortlist() {
        let list = shortlist(
            "eiffel tower",
            vec![dynamic("Eiffel", "Bavaria, Germany")],
            SHORTLIST_CAP,
        );
        assert_eq!(list[0].name, "Eiffel Tower");
        assert_eq!(list[0].origin, ProviderKind::Static);
        assert!(list[0].feature.is_some());
    }

    #[test]
    fn prefix_alias_matches_count() {
        let list = shortlist("eiffel to", Vec::new(), SHORTLIST_CAP);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Eiffel Tower");
    }

    #[test]
    fn short_prefixes_do_not_match() {
        assert!(shortlist("ei", Vec::new(), SHORTLIST_CAP).is_empty());
    }

    #[test]
    fn quick_picks_trail_dynamic_suggestions() {
        let list = shortlist(
            "tokyo",
            vec![dynamic("Tokyo Tower", "Tokyo, Japan")],
            SHORTLIST_CAP,
        );
        assert_eq!(list[0].name, "Tokyo Tower");
        let quick = list
            .iter()
            .find(|s| s.origin == ProviderKind::Static)
            .unwrap();
        assert_eq!(quick.name, "Tokyo");
    }

    #[test]
    fn duplicate_of_quick_pick_keeps_the_dynamic_entry() {
        let list = shortlist("london", vec![dynamic("London", "United Kingdom")], SHORTLIST_CAP);
        let londons: Vec<_> = list.iter().filter(|s| s.name == "London").collect();
        assert_eq!(londons.len(), 1);
        assert_eq!(londons[0].origin, ProviderKind::Geocoder);
    }

    #[test]
    fn shortlist_is_capped() {
        let many: Vec<Suggestion> = (0..8)
            .map(|i| dynamic(&format!("Tokyo {i}"), "Japan"))
            .collect();
        let list = shortlist("tokyo", many, SHORTLIST_CAP);
        assert_eq!(list.len(), SHORTLIST_CAP);
    }

    #[test]
    fn empty_query_adds_nothing_static() {
        assert!(shortlist("", Vec::new(), SHORTLIST_CAP).is_empty());
    }
}

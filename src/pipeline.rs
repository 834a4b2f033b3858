use crate::geometry;
use crate::layers::{Layer, LayerStore, Marker};
use crate::models::Element;
use crate::taxonomy;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// How many leading elements the category detection samples. Result
/// sets are assumed homogeneous; scanning a prefix trades exhaustive
/// classification for speed.
const DETECTION_SAMPLE: usize = 10;
/// Popup rows kept per marker after cleanup.
const MAX_POPUP_TAGS: usize = 3;

const HIDDEN_TAG_KEYS: &[&str] = &[
    "source",
    "ref",
    "wikidata",
    "wikipedia",
    "created_by",
    "check_date",
    "attribution",
    "fixme",
];
const HIDDEN_TAG_PREFIXES: &[&str] = &["addr:", "source:", "ref:", "name:", "contact:"];

#[derive(Serialize, Debug, Clone)]
pub struct RenderReport {
    /// The layer created for this query, with its markers; `None` when
    /// the result set was empty.
    pub layer: Option<Layer>,
    pub placed: usize,
    pub skipped: usize,
    pub message: String,
}

/// Turns one query's element sequence into one new layer. An empty
/// sequence mutates nothing; unplaceable elements are skipped and
/// counted, never a failure of the whole render.
pub fn render(store: &mut LayerStore, elements: &[Element], place_name: &str) -> RenderReport {
    if elements.is_empty() {
        return RenderReport {
            layer: None,
            placed: 0,
            skipped: 0,
            message: format!("no results found in {place_name}"),
        };
    }

    let category = taxonomy::lookup(detect_category(elements));
    let name = format!("{} · {place_name}", category.label);
    let layer_id = store.add_layer(category.id, category.color, &name);

    let mut placed = 0;
    let mut skipped = 0;
    for element in elements {
        match geometry::centroid(&element.geometry) {
            Some(position) => {
                store.attach_marker(
                    &layer_id,
                    Marker {
                        position,
                        popup: popup_tags(element.tags.as_ref()),
                    },
                );
                placed += 1;
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("{} of {} elements had no placeable geometry", skipped, elements.len());
    }

    RenderReport {
        layer: store.get(&layer_id).cloned(),
        placed,
        skipped,
        message: format!(
            "found {placed} {} in {place_name}",
            category.label.to_lowercase()
        ),
    }
}

/// Scans at most the first ten elements; the first non-fallback
/// category wins, otherwise the whole set is filed under the fallback.
fn detect_category(elements: &[Element]) -> &'static str {
    elements
        .iter()
        .take(DETECTION_SAMPLE)
        .map(|element| taxonomy::classify(element.tags.as_ref()))
        .find(|id| *id != taxonomy::FALLBACK)
        .unwrap_or(taxonomy::FALLBACK)
}

/// Popup content for one marker: administrative, address and
/// attribution style keys are dropped, the name comes first, and at
/// most three rows survive.
fn popup_tags(tags: Option<&HashMap<String, String>>) -> Vec<(String, String)> {
    let Some(tags) = tags else {
        return Vec::new();
    };
    let mut rows: Vec<(String, String)> = tags
        .iter()
        .filter(|(key, _)| !hidden_tag(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    rows.sort_by(|a, b| popup_rank(&a.0).cmp(&popup_rank(&b.0)).then(a.0.cmp(&b.0)));
    rows.truncate(MAX_POPUP_TAGS);
    rows
}

fn popup_rank(key: &str) -> u8 {
    if key == "name" {
        0
    } else {
        1
    }
}

fn hidden_tag(key: &str) -> bool {
    HIDDEN_TAG_KEYS.iter().any(|hidden| *hidden == key)
        || HIDDEN_TAG_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Geometry;

    fn tagged(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn point(lng: f64, lat: f64, pairs: &[(&str, &str)]) -> Element {
        Element {
            geometry: Geometry::Point { coordinates: [lng, lat] },
            tags: tagged(pairs),
        }
    }

    fn line(pairs: &[(&str, &str)]) -> Element {
        Element {
            geometry: Geometry::LineString {
                coordinates: vec![[0.0, 0.0], [1.0, 1.0]],
            },
            tags: tagged(pairs),
        }
    }

    #[test]
    fn empty_result_set_mutates_nothing() {
        let mut store = LayerStore::new();
        let report = render(&mut store, &[], "Madrid");
        assert!(report.layer.is_none());
        assert_eq!(report.placed, 0);
        assert!(report.message.contains("no results"));
        assert!(store.counts_by_category().is_empty());
    }

    #[test]
    fn one_layer_with_placed_and_skipped_counts() {
        let mut store = LayerStore::new();
        let elements = vec![
            point(2.1, 41.4, &[("amenity", "cafe"), ("name", "Bar Mut")]),
            line(&[("amenity", "cafe")]),
            point(2.2, 41.5, &[("amenity", "cafe")]),
            line(&[("amenity", "cafe")]),
            point(2.3, 41.6, &[("amenity", "cafe")]),
        ];
        let report = render(&mut store, &elements, "Barcelona");

        assert_eq!(report.placed, 3);
        assert_eq!(report.skipped, 2);
        assert!(report.message.contains("found 3"));
        let layer = report.layer.unwrap();
        assert_eq!(layer.category, "cafe");
        assert_eq!(layer.markers.len(), 3);
        assert_eq!(store.counts_by_category().get("cafe"), Some(&3));
        assert_eq!(store.iter().count(), 1);
    }

    #[test]
    fn detection_takes_first_non_fallback_category() {
        let elements = vec![
            point(0.0, 0.0, &[]),
            point(0.0, 0.0, &[("tourism", "museum")]),
            point(0.0, 0.0, &[("amenity", "cafe")]),
        ];
        assert_eq!(detect_category(&elements), "museum");
    }

    #[test]
    fn detection_stops_after_ten_elements() {
        let mut elements: Vec<Element> = (0..10).map(|_| point(0.0, 0.0, &[])).collect();
        elements.push(point(0.0, 0.0, &[("amenity", "cafe")]));
        assert_eq!(detect_category(&elements), taxonomy::FALLBACK);
    }

    #[test]
    fn untagged_result_set_files_under_fallback() {
        let mut store = LayerStore::new();
        let report = render(&mut store, &[point(1.0, 1.0, &[])], "Lyon");
        let layer = report.layer.unwrap();
        assert_eq!(layer.category, "poi");
        assert!(layer.name.contains("Lyon"));
    }

    #[test]
    fn popup_drops_admin_keys_and_keeps_at_most_three() {
        let tags = tagged(&[
            ("name", "Louvre"),
            ("addr:street", "Rue de Rivoli"),
            ("wikidata", "Q19675"),
            ("source", "survey"),
            ("tourism", "museum"),
            ("opening_hours", "09:00-18:00"),
            ("wheelchair", "yes"),
        ]);
        let rows = popup_tags(tags.as_ref());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].0, "name");
        assert!(rows.iter().all(|(key, _)| !key.starts_with("addr:")));
        assert!(rows.iter().all(|(key, _)| key != "wikidata" && key != "source"));
    }

    #[test]
    fn popup_of_untagged_element_is_empty() {
        assert!(popup_tags(None).is_empty());
    }
}

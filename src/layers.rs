use crate::models::Coordinate;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Serialize, Debug, Clone)]
pub struct Marker {
    pub position: Coordinate,
    /// Tag rows shown in the marker popup, already cleaned for display.
    pub popup: Vec<(String, String)>,
}

/// One rendered, removable group of markers sharing a category and
/// originating query. The layer exclusively owns its markers.
#[derive(Serialize, Debug, Clone)]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub category: String,
    pub color: String,
    pub markers: Vec<Marker>,
}

/// Summary of a released layer, returned from removals so the display
/// collaborator can detach the layer's markers from the map.
#[derive(Serialize, Debug, Clone)]
pub struct RemovedLayer {
    pub id: String,
    pub category: String,
    pub marker_count: usize,
}

/// Single source of truth for what is currently displayed. Owned value
/// passed explicitly to the pipeline and legend, never a global.
#[derive(Default)]
pub struct LayerStore {
    layers: HashMap<String, Layer>,
    next_seq: u64,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty layer and returns its fresh id. The id embeds a
    /// store-local sequence number, so two layers created within the
    /// same millisecond still get distinct ids.
    pub fn add_layer(&mut self, category: &str, color: &str, name: &str) -> String {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = format!(
            "{category}-{}-{}-{seq}",
            slug(name),
            Utc::now().timestamp_millis()
        );
        self.layers.insert(
            id.clone(),
            Layer {
                id: id.clone(),
                name: name.to_string(),
                category: category.to_string(),
                color: color.to_string(),
                markers: Vec::new(),
            },
        );
        id
    }

    /// Appends a marker to the layer's owned collection. The pipeline
    /// only attaches to the layer it just created; an unknown id drops
    /// the marker.
    pub fn attach_marker(&mut self, layer_id: &str, marker: Marker) {
        match self.layers.get_mut(layer_id) {
            Some(layer) => layer.markers.push(marker),
            None => debug!("dropping marker for unknown layer {}", layer_id),
        }
    }

    /// No-op when the id is absent.
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<RemovedLayer> {
        self.layers.remove(layer_id).map(released)
    }

    /// Removes every layer of the given category.
    pub fn remove_category(&mut self, category: &str) -> Vec<RemovedLayer> {
        let ids: Vec<String> = self
            .layers
            .values()
            .filter(|layer| layer.category == category)
            .map(|layer| layer.id.clone())
            .collect();
        ids.iter()
            .filter_map(|id| self.remove_layer(id))
            .collect()
    }

    pub fn clear_all(&mut self) -> Vec<RemovedLayer> {
        self.layers.drain().map(|(_, layer)| released(layer)).collect()
    }

    /// Derived read: marker counts summed per category across all
    /// remaining layers.
    pub fn counts_by_category(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for layer in self.layers.values() {
            *counts.entry(layer.category.clone()).or_insert(0) += layer.markers.len();
        }
        counts
    }

    pub fn get(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.get(layer_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }
}

fn released(layer: Layer) -> RemovedLayer {
    info!(
        "removed layer {} ({} markers, category {})",
        layer.id,
        layer.markers.len(),
        layer.category
    );
    RemovedLayer {
        id: layer.id,
        category: layer.category,
        marker_count: layer.markers.len(),
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}

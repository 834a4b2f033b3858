use crate::layers::LayerStore;
use crate::taxonomy::TAXONOMY;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
    pub active: bool,
    /// The remove affordance is only shown while the category has
    /// markers on the map.
    pub removable: bool,
}

/// Display-side summary of the layer store. `sync` fully rebuilds the
/// entries from the store, so repeated calls never accumulate stale
/// state.
#[derive(Default)]
pub struct Legend {
    entries: Vec<LegendEntry>,
}

impl Legend {
    pub fn new(store: &LayerStore) -> Self {
        let mut legend = Self::default();
        legend.sync(store);
        legend
    }

    /// Rebuilds the legend for every known category, including
    /// zero-count ones, which render as inactive rather than missing.
    pub fn sync(&mut self, store: &LayerStore) {
        let counts = store.counts_by_category();
        self.entries = TAXONOMY
            .iter()
            .map(|category| {
                let count = counts.get(category.id).copied().unwrap_or(0);
                LegendEntry {
                    id: category.id,
                    label: category.label,
                    color: category.color,
                    count,
                    active: count > 0,
                    removable: count > 0,
                }
            })
            .collect();
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }
}

use std::collections::HashMap;

/// One entry in the fixed POI taxonomy. The table never changes at
/// runtime; categories are identified by the OSM tag value they match.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub id: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub matches: &'static [(&'static str, &'static str)],
}

pub const FALLBACK: &str = "poi";

const FALLBACK_CATEGORY: Category = Category {
    id: FALLBACK,
    label: "Points of interest",
    color: "#7f8c8d",
    matches: &[],
};

/// Ordered by tag theme: tourism, amenity, shop, leisure, historic,
/// railway. The order is a priority list: when an element carries tags
/// from two themes, the earlier theme wins.
pub static TAXONOMY: &[Category] = &[
    // tourism
    Category { id: "museum", label: "Museums", color: "#8e44ad", matches: &[("tourism", "museum")] },
    Category { id: "hotel", label: "Hotels", color: "#2980b9", matches: &[("tourism", "hotel")] },
    Category { id: "hostel", label: "Hostels", color: "#5dade2", matches: &[("tourism", "hostel")] },
    Category { id: "viewpoint", label: "Viewpoints", color: "#16a085", matches: &[("tourism", "viewpoint")] },
    // amenity
    Category { id: "cafe", label: "Cafes", color: "#a0522d", matches: &[("amenity", "cafe")] },
    Category { id: "restaurant", label: "Restaurants", color: "#e74c3c", matches: &[("amenity", "restaurant")] },
    Category { id: "hospital", label: "Hospitals", color: "#c0392b", matches: &[("amenity", "hospital")] },
    Category { id: "school", label: "Schools", color: "#d35400", matches: &[("amenity", "school")] },
    Category { id: "university", label: "Universities", color: "#e67e22", matches: &[("amenity", "university")] },
    Category { id: "library", label: "Libraries", color: "#6c3483", matches: &[("amenity", "library")] },
    Category { id: "pharmacy", label: "Pharmacies", color: "#1abc9c", matches: &[("amenity", "pharmacy")] },
    Category { id: "bank", label: "Banks", color: "#2c3e50", matches: &[("amenity", "bank")] },
    Category { id: "bar", label: "Bars", color: "#f39c12", matches: &[("amenity", "bar")] },
    Category { id: "parking", label: "Parking", color: "#34495e", matches: &[("amenity", "parking")] },
    // shop
    Category { id: "supermarket", label: "Supermarkets", color: "#27ae60", matches: &[("shop", "supermarket")] },
    Category { id: "bakery", label: "Bakeries", color: "#f1c40f", matches: &[("shop", "bakery")] },
    Category { id: "hairdresser", label: "Hairdressers", color: "#e84393", matches: &[("shop", "hairdresser")] },
    // leisure
    Category { id: "park", label: "Parks", color: "#2ecc71", matches: &[("leisure", "park")] },
    Category { id: "garden", label: "Gardens", color: "#58d68d", matches: &[("leisure", "garden")] },
    Category { id: "sports_centre", label: "Sports centres", color: "#3498db", matches: &[("leisure", "sports_centre")] },
    Category { id: "pitch", label: "Pitches", color: "#45b39d", matches: &[("leisure", "pitch")] },
    Category { id: "playground", label: "Playgrounds", color: "#f5b041", matches: &[("leisure", "playground")] },
    Category { id: "dog_park", label: "Dog parks", color: "#82e0aa", matches: &[("leisure", "dog_park")] },
    // historic
    Category { id: "monument", label: "Monuments", color: "#9b59b6", matches: &[("historic", "monument")] },
    // railway
    Category { id: "station", label: "Stations", color: "#95a5a6", matches: &[("railway", "station")] },
    FALLBACK_CATEGORY,
];

/// Assigns an element to a category from its tags. First matching
/// predicate in table order wins; missing tags or no match fall back
/// to the generic `poi` category.
pub fn classify(tags: Option<&HashMap<String, String>>) -> &'static str {
    let Some(tags) = tags else {
        return FALLBACK;
    };
    for category in TAXONOMY {
        for (key, value) in category.matches {
            if tags.get(*key).is_some_and(|v| v == value) {
                return category.id;
            }
        }
    }
    FALLBACK
}

/// Display metadata for a category id; unknown ids get the fallback's.
pub fn lookup(id: &str) -> Category {
    TAXONOMY
        .iter()
        .find(|category| category.id == id)
        .copied()
        .unwrap_or(FALLBACK_CATEGORY)
}

use crate::models::BoundingBox;

/// Execution timeout stamped into the output directive, in seconds.
const QUERY_TIMEOUT_SECS: u32 = 25;
/// Result cap appended when the query has no bounded output statement.
const MAX_RESULTS: u32 = 500;

pub const BBOX_PLACEHOLDER: &str = "{{bbox}}";

/// Repairs an Overpass query template coming from the agent so it is
/// safe to send to a shared public endpoint. Total: always returns a
/// usable query, never fails. Pattern-based rewriting, not a parser:
/// it guards the common query shapes, not arbitrary malformed input.
pub fn normalize(raw: &str) -> String {
    let mut query = raw.trim().to_string();

    // Output directive with a timeout must lead the query.
    if query.starts_with("[out:") {
        let header_end = query.find(';').unwrap_or(query.len());
        if !query[..header_end].contains("[timeout:") {
            query.insert_str(header_end, &format!("[timeout:{QUERY_TIMEOUT_SECS}]"));
        }
    } else {
        query = format!("[out:json][timeout:{QUERY_TIMEOUT_SECS}];{query}");
    }

    // Centroid placement needs full geometry, not ids.
    if let Some(prefix) = query
        .strip_suffix("out body;")
        .or_else(|| query.strip_suffix("out body"))
    {
        query = format!("{prefix}out geom;");
    }

    // Unbounded queries time out against the public service.
    if !ends_with_bounded_output(&query) {
        if !query.ends_with(';') {
            query.push(';');
        }
        query.push_str(&format!("out geom {MAX_RESULTS};"));
    }

    query
}

/// True when the final statement both emits geometry and caps the
/// result count, e.g. `out geom 500`.
fn ends_with_bounded_output(query: &str) -> bool {
    let body = query.trim_end_matches(';');
    let last = body.rsplit(';').next().unwrap_or("").trim();
    match last.strip_prefix("out geom") {
        Some(rest) => {
            let rest = rest.trim();
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Substitutes every bounding-box placeholder in the template with the
/// geocoded box, in Overpass coordinate order.
pub fn apply_bbox(query: &str, bbox: &BoundingBox) -> String {
    query.replace(BBOX_PLACEHOLDER, &bbox.to_overpass())
}

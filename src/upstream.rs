use crate::config::Config;
use crate::models::{BoundingBox, Coordinate, Element, Geometry};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

pub struct Geocoded {
    pub bbox: BoundingBox,
    pub center: Coordinate,
}

#[derive(Deserialize)]
struct GeocoderPlace {
    // Nominatim order: min lat, max lat, min lon, max lon, as strings.
    boundingbox: [String; 4],
    lat: String,
    lon: String,
}

/// Resolves a place name to a bounding box and center. `Ok(None)` means
/// the geocoder found no match, which callers surface to the user.
pub async fn geocode(
    client: &reqwest::Client,
    config: &Config,
    place: &str,
) -> Result<Option<Geocoded>> {
    let resp = client
        .get(&config.geocoder_url)
        .query(&[("q", place), ("format", "json"), ("limit", "1")])
        .send()
        .await
        .context("geocoder request failed")?;
    if !resp.status().is_success() {
        return Err(anyhow!("geocoder returned {}", resp.status()));
    }
    let places: Vec<GeocoderPlace> = resp.json().await.context("invalid geocoder response")?;
    let Some(top) = places.into_iter().next() else {
        debug!("geocoder found nothing for {:?}", place);
        return Ok(None);
    };
    Ok(Some(Geocoded {
        bbox: parse_bbox(&top.boundingbox)?,
        center: Coordinate {
            lng: top.lon.parse().context("invalid geocoder longitude")?,
            lat: top.lat.parse().context("invalid geocoder latitude")?,
        },
    }))
}

fn parse_bbox(bounds: &[String; 4]) -> Result<BoundingBox> {
    let parse = |s: &String| {
        s.parse::<f64>()
            .with_context(|| format!("invalid bounding box value {s:?}"))
    };
    Ok(BoundingBox {
        min_lat: parse(&bounds[0])?,
        max_lat: parse(&bounds[1])?,
        min_lng: parse(&bounds[2])?,
        max_lng: parse(&bounds[3])?,
    })
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<RawElement>,
}

#[derive(Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    kind: String,
    lat: Option<f64>,
    lon: Option<f64>,
    geometry: Option<Vec<RawPoint>>,
    members: Option<Vec<RawMember>>,
    tags: Option<HashMap<String, String>>,
}

#[derive(Deserialize, Clone, Copy)]
struct RawPoint {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RawMember {
    #[serde(default)]
    role: String,
    geometry: Option<Vec<RawPoint>>,
}

/// Executes a normalized, bbox-substituted query against the Overpass
/// endpoint and converts the raw elements for the pipeline.
pub async fn run_query(
    client: &reqwest::Client,
    config: &Config,
    query: &str,
) -> Result<Vec<Element>> {
    let resp = client
        .post(&config.overpass_url)
        .form(&[("data", query)])
        .send()
        .await
        .context("overpass request failed")?;
    if !resp.status().is_success() {
        return Err(anyhow!("overpass returned {}", resp.status()));
    }
    let raw: OverpassResponse = resp.json().await.context("invalid overpass response")?;
    debug!("overpass returned {} elements", raw.elements.len());
    Ok(raw.elements.into_iter().map(convert).collect())
}

fn convert(raw: RawElement) -> Element {
    let geometry = match raw.kind.as_str() {
        "node" => match (raw.lon, raw.lat) {
            (Some(lon), Some(lat)) => Geometry::Point { coordinates: [lon, lat] },
            _ => Geometry::Unsupported,
        },
        "way" => way_geometry(raw.geometry.as_deref()),
        "relation" => relation_geometry(raw.members.as_deref()),
        _ => Geometry::Unsupported,
    };
    Element {
        geometry,
        tags: raw.tags,
    }
}

/// Closed ways become polygons; open ways stay line strings, which the
/// resolver treats as unplaceable.
fn way_geometry(points: Option<&[RawPoint]>) -> Geometry {
    let Some(points) = points else {
        return Geometry::Unsupported;
    };
    if points.is_empty() {
        return Geometry::Unsupported;
    }
    let ring: Vec<[f64; 2]> = points.iter().map(|p| [p.lon, p.lat]).collect();
    let closed = ring.len() >= 4 && ring.first() == ring.last();
    if closed {
        Geometry::Polygon { coordinates: vec![ring] }
    } else {
        Geometry::LineString { coordinates: ring }
    }
}

/// Builds a multi-polygon from the relation's outer members. Overpass
/// does not always tag member roles, so when no outer member carries
/// geometry every member ring is used instead.
fn relation_geometry(members: Option<&[RawMember]>) -> Geometry {
    let Some(members) = members else {
        return Geometry::Unsupported;
    };
    let collect = |outer_only: bool| -> Vec<Vec<Vec<[f64; 2]>>> {
        members
            .iter()
            .filter(|member| !outer_only || member.role == "outer")
            .filter_map(|member| member.geometry.as_ref())
            .filter(|points| !points.is_empty())
            .map(|points| vec![points.iter().map(|p| [p.lon, p.lat]).collect::<Vec<_>>()])
            .collect()
    };
    let mut polygons = collect(true);
    if polygons.is_empty() {
        polygons = collect(false);
    }
    if polygons.is_empty() {
        Geometry::Unsupported
    } else {
        Geometry::MultiPolygon { coordinates: polygons }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_elements(json: &str) -> Vec<Element> {
        let raw: OverpassResponse = serde_json::from_str(json).unwrap();
        raw.elements.into_iter().map(convert).collect()
    }

    #[test]
    fn node_becomes_point() {
        let elements = parse_elements(
            r#"{"elements":[{"type":"node","lat":41.4,"lon":2.1,"tags":{"amenity":"cafe"}}]}"#,
        );
        assert_eq!(elements[0].geometry, Geometry::Point { coordinates: [2.1, 41.4] });
        assert_eq!(
            elements[0].tags.as_ref().unwrap().get("amenity").unwrap(),
            "cafe"
        );
    }

    #[test]
    fn closed_way_becomes_polygon() {
        let elements = parse_elements(
            r#"{"elements":[{"type":"way","geometry":[
                {"lat":0.0,"lon":0.0},{"lat":2.0,"lon":0.0},
                {"lat":2.0,"lon":2.0},{"lat":0.0,"lon":0.0}]}]}"#,
        );
        assert!(matches!(elements[0].geometry, Geometry::Polygon { .. }));
    }

    #[test]
    fn open_way_stays_unplaceable_linestring() {
        let elements = parse_elements(
            r#"{"elements":[{"type":"way","geometry":[
                {"lat":0.0,"lon":0.0},{"lat":1.0,"lon":1.0}]}]}"#,
        );
        assert!(matches!(elements[0].geometry, Geometry::LineString { .. }));
        assert_eq!(crate::geometry::centroid(&elements[0].geometry), None);
    }

    #[test]
    fn relation_outer_members_become_multipolygon() {
        let elements = parse_elements(
            r#"{"elements":[{"type":"relation","members":[
                {"role":"outer","geometry":[{"lat":0.0,"lon":0.0},{"lat":0.0,"lon":2.0},{"lat":2.0,"lon":2.0}]},
                {"role":"inner","geometry":[{"lat":0.5,"lon":0.5}]}]}]}"#,
        );
        match &elements[0].geometry {
            Geometry::MultiPolygon { coordinates } => {
                assert_eq!(coordinates.len(), 1);
                assert_eq!(coordinates[0][0].len(), 3);
            }
            other => panic!("expected multipolygon, got {other:?}"),
        }
    }

    #[test]
    fn relation_without_roles_uses_all_member_rings() {
        let elements = parse_elements(
            r#"{"elements":[{"type":"relation","members":[
                {"geometry":[{"lat":0.0,"lon":0.0},{"lat":1.0,"lon":1.0}]}]}]}"#,
        );
        assert!(matches!(elements[0].geometry, Geometry::MultiPolygon { .. }));
    }

    #[test]
    fn relation_without_geometry_is_unsupported() {
        let elements =
            parse_elements(r#"{"elements":[{"type":"relation","members":[{"role":"outer"}]}]}"#);
        assert_eq!(elements[0].geometry, Geometry::Unsupported);
    }

    #[test]
    fn geocoder_bbox_parses_into_ordered_bounds() {
        let place: GeocoderPlace = serde_json::from_str(
            r#"{"boundingbox":["41.32","41.47","2.05","2.23"],"lat":"41.39","lon":"2.17"}"#,
        )
        .unwrap();
        let bbox = parse_bbox(&place.boundingbox).unwrap();
        assert_eq!(bbox.min_lat, 41.32);
        assert_eq!(bbox.max_lat, 41.47);
        assert_eq!(bbox.min_lng, 2.05);
        assert_eq!(bbox.max_lng, 2.23);
        assert_eq!(bbox.to_overpass(), "41.32,2.05,41.47,2.23");
    }

    #[test]
    fn malformed_bbox_is_an_error() {
        let bounds = [
            "not-a-number".to_string(),
            "41.47".to_string(),
            "2.05".to_string(),
            "2.23".to_string(),
        ];
        assert!(parse_bbox(&bounds).is_err());
    }
}

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};

/// Instructions for the upstream model: turn a free-text prompt into an
/// Overpass query template plus place name. The query it produces still
/// goes through `query::normalize` before touching the network.
const SYSTEM_PROMPT: &str = r##"
You are a geospatial assistant that converts natural language queries into OpenStreetMap queries.

IMPORTANT: User queries may or may not include action verbs (show, find, get, put, display, search, locate, etc.).
Always extract the POI type and location regardless of whether a verb is present.

Examples of valid user queries:
- "museums in Madrid"
- "show museums in Madrid"
- "parks in Barcelona"
- "find parks in Barcelona"
- "cafes in Paris"

From these queries, extract:
1. POI type: museums, parks, cafes, restaurants, hotels, hospitals, schools, supermarkets, libraries, pharmacies, banks, bakeries, bars, universities, viewpoints, gardens, sports centres, pitches, playgrounds, hostels, hairdressers, monuments, stations, dog parks, parking
2. Location: city, country, or region name

Return ONLY a JSON object with this exact structure:
{
  "query": "(node[\"key\"=\"value\"]({{bbox}});way[\"key\"=\"value\"]({{bbox}});relation[\"key\"=\"value\"]({{bbox}}););out geom;",
  "categories": ["category1"],
  "place_name": "City Name",
  "style_definitions": {
    "node": {
      "color": "#hexcolor",
      "icon": "icon_name"
    }
  }
}

Critical requirements:
- ALWAYS use the format: (node["tag"="value"]({{bbox}});way["tag"="value"]({{bbox}});relation["tag"="value"]({{bbox}}););out geom;
- The query MUST include node, way, AND relation wrapped in parentheses with a union semicolon between them
- Use {{bbox}} placeholder in ALL query parts (node, way, relation)
- End with );out geom; (NOT out body;)
- Map POI types to correct OSM tags:
  * museums -> tourism=museum
  * parks -> leisure=park
  * cafes -> amenity=cafe
  * restaurants -> amenity=restaurant
  * hotels -> tourism=hotel
  * hostels -> tourism=hostel
  * hospitals -> amenity=hospital
  * schools -> amenity=school
  * universities -> amenity=university
  * supermarkets -> shop=supermarket
  * bakeries -> shop=bakery
  * hairdressers -> shop=hairdresser
  * libraries -> amenity=library
  * pharmacies -> amenity=pharmacy
  * banks -> amenity=bank
  * bars -> amenity=bar
  * viewpoints -> tourism=viewpoint
  * gardens -> leisure=garden
  * sports centres -> leisure=sports_centre
  * pitches -> leisure=pitch
  * playgrounds -> leisure=playground
  * dog parks -> leisure=dog_park
  * monuments -> historic=monument
  * stations -> railway=station
  * parking -> amenity=parking
- Return valid Overpass QL syntax
- Never add text outside the JSON
- Do not use markdown code fences
"##;

/// Forwards the user prompt to the configured OpenAI-compatible chat
/// endpoint and returns the model's JSON payload. Non-JSON model output
/// comes back as an error payload carrying the raw content, mirroring
/// what the frontend expects.
pub async fn predict(client: &reqwest::Client, config: &Config, prompt: &str) -> Result<Value> {
    let api_key =
        std::env::var("GROQ_API_KEY").map_err(|_| anyhow!("GROQ_API_KEY not configured"))?;

    let payload = json!({
        "model": config.agent_model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": prompt},
        ],
        "temperature": 0,
    });

    let resp = client
        .post(&config.agent_url)
        .bearer_auth(api_key)
        .json(&payload)
        .send()
        .await
        .context("agent request failed")?;
    let raw: Value = resp.json().await.context("invalid agent response")?;

    let Some(content) = raw
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    else {
        return Ok(json!({"error": "unexpected agent response format", "raw": raw}));
    };
    let content = content.trim();
    if !content.starts_with('{') {
        return Ok(json!({"error": "agent did not return JSON", "raw": content}));
    }
    Ok(serde_json::from_str(content).unwrap_or_else(|_| json!({"raw": content})))
}

use axum::{
    extract::{Json, Path, State},
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::{error, info};

mod agent;
mod config;
mod geometry;
mod layers;
mod legend;
mod models;
mod pipeline;
mod query;
mod taxonomy;
mod upstream;

use config::Config;
use layers::LayerStore;
use legend::Legend;
use models::{Prompt, QueryRequest};

struct AppState {
    config: Config,
    http_client: reqwest::Client,
    map: Mutex<MapState>,
}

/// Layer store and legend live under one lock so every mutation plus
/// its legend re-sync is observed atomically.
struct MapState {
    store: LayerStore,
    legend: Legend,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let config = Config::load()?;
    let thread_count = config.thread_count.unwrap_or_else(num_cpus::get);

    info!("starting server with {} threads", thread_count);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(thread_count)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn log_request_response(req: Request<axum::body::Body>, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let method = req.method().to_string();
    info!("incoming request: {} {}", method, path);
    let response = next.run(req).await;
    info!("request result: {} for {} {}", response.status(), method, path);
    response
}

async fn async_main(config: Config) -> anyhow::Result<()> {
    let http_client = reqwest::Client::builder()
        .user_agent(concat!("poimap/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let store = LayerStore::new();
    let legend = Legend::new(&store);
    let state = Arc::new(AppState {
        config: config.clone(),
        http_client,
        map: Mutex::new(MapState { store, legend }),
    });

    let app = Router::new()
        .route("/api/predict", post(post_predict))
        .route("/api/query", post(post_query))
        .route("/api/legend", get(get_legend))
        .route("/api/layers", get(get_layers).delete(delete_all_layers))
        .route("/api/layers/{id}", delete(delete_layer))
        .route("/api/categories/{category}", delete(delete_category))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_request_response))
        .with_state(state);

    let addr = config.bind_addr.unwrap_or_else(|| "0.0.0.0:8000".to_string());
    info!("listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Handlers ---

async fn post_predict(State(state): State<Arc<AppState>>, Json(data): Json<Prompt>) -> Response {
    match agent::predict(&state.http_client, &state.config, &data.prompt).await {
        Ok(value) => Json(value).into_response(),
        Err(e) => {
            error!("agent error: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

/// Runs one query end to end: normalize, geocode, substitute the
/// bounding box, fetch elements, render one layer, re-sync the legend.
/// A failure anywhere leaves existing layers untouched.
async fn post_query(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> Response {
    let template = query::normalize(&req.query);

    let geocoded = match upstream::geocode(&state.http_client, &state.config, &req.place_name).await
    {
        Ok(Some(geocoded)) => geocoded,
        Ok(None) => {
            return (
                axum::http::StatusCode::NOT_FOUND,
                Json(json!({"error": format!("could not find \"{}\"", req.place_name)})),
            )
                .into_response();
        }
        Err(e) => {
            error!("geocoder error: {}", e);
            return (
                axum::http::StatusCode::BAD_GATEWAY,
                Json(json!({"error": e.to_string()})),
            )
                .into_response();
        }
    };

    let bounded = query::apply_bbox(&template, &geocoded.bbox);
    let elements = match upstream::run_query(&state.http_client, &state.config, &bounded).await {
        Ok(elements) => elements,
        Err(e) => {
            error!("overpass error: {}", e);
            return (
                axum::http::StatusCode::BAD_GATEWAY,
                Json(json!({"error": e.to_string()})),
            )
                .into_response();
        }
    };

    let (report, legend_entries) = {
        let mut map = state.map.lock().unwrap();
        let MapState { store, legend } = &mut *map;
        let report = pipeline::render(store, &elements, &req.place_name);
        legend.sync(store);
        (report, legend.entries().to_vec())
    };

    Json(json!({
        "message": report.message,
        "placed": report.placed,
        "skipped": report.skipped,
        "layer": report.layer,
        "center": geocoded.center,
        "bbox": geocoded.bbox,
        "legend": legend_entries,
    }))
    .into_response()
}

async fn get_legend(State(state): State<Arc<AppState>>) -> Response {
    let map = state.map.lock().unwrap();
    Json(json!({"legend": map.legend.entries()})).into_response()
}

async fn get_layers(State(state): State<Arc<AppState>>) -> Response {
    let map = state.map.lock().unwrap();
    let layers: Vec<_> = map
        .store
        .iter()
        .map(|layer| {
            json!({
                "id": layer.id,
                "name": layer.name,
                "category": layer.category,
                "color": layer.color,
                "markers": layer.markers.len(),
            })
        })
        .collect();
    Json(json!({"layers": layers})).into_response()
}

async fn delete_layer(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let mut map = state.map.lock().unwrap();
    let MapState { store, legend } = &mut *map;
    match store.remove_layer(&id) {
        Some(removed) => {
            legend.sync(store);
            Json(json!({"removed": [removed], "legend": legend.entries()})).into_response()
        }
        None => (
            axum::http::StatusCode::NOT_FOUND,
            Json(json!({"error": format!("layer \"{id}\" not found")})),
        )
            .into_response(),
    }
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Response {
    let mut map = state.map.lock().unwrap();
    let MapState { store, legend } = &mut *map;
    let removed = store.remove_category(&category);
    legend.sync(store);
    Json(json!({"removed": removed, "legend": legend.entries()})).into_response()
}

async fn delete_all_layers(State(state): State<Arc<AppState>>) -> Response {
    let mut map = state.map.lock().unwrap();
    let MapState { store, legend } = &mut *map;
    let removed = store.clear_all();
    legend.sync(store);
    Json(json!({"removed": removed, "legend": legend.entries()})).into_response()
}

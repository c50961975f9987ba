use crate::config::AppConfig;
use crate::engine::MapEngine;
use crate::scene::{SceneSnapshot, SceneSurface};
use crate::style::popup_content;
use crate::types::{BaseLayer, ClaimFeature, LayerToggle, Notification};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{LineString, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

// Wrapper for RTree indexing
struct ClaimIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for ClaimIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub engine: Mutex<MapEngine<SceneSurface>>,
    pub claims: Vec<ClaimFeature>,
    polygons: Vec<Polygon<f64>>,
    tree: RTree<ClaimIndex>,
}

impl AppState {
    fn engine(&self) -> MutexGuard<'_, MapEngine<SceneSurface>> {
        self.engine.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Deserialize)]
pub struct PointQuery {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: String,
}

#[derive(Deserialize)]
pub struct FilterQuery {
    #[serde(rename = "type")]
    filter_type: String,
}

#[derive(Serialize)]
pub struct ClaimAtPoint {
    pub claim_id: String,
    pub village: String,
    pub popup: String,
}

#[derive(Serialize)]
pub struct CommandResponse {
    pub notifications: Vec<Notification>,
    pub messages: Vec<String>,
}

fn command_response(engine: &mut MapEngine<SceneSurface>) -> Json<CommandResponse> {
    let notifications = engine.drain_events();
    let messages = notifications.iter().map(|n| n.to_string()).collect();
    Json(CommandResponse {
        notifications,
        messages,
    })
}

pub async fn start_server(config: AppConfig, claims: Vec<ClaimFeature>) -> Result<()> {
    // One engine per mounted map; the serve host is its host surface.
    let mut engine = MapEngine::new(claims.clone(), &config.map);
    {
        let map = config.map.clone();
        let sources = config.sources.clone();
        engine.mount(move || Ok(SceneSurface::new(&map, &sources)));
    }
    for event in engine.drain_events() {
        info!("{}", event);
    }

    // Spatial index for popup point lookups
    info!("Building spatial index for {} claims", claims.len());
    let polygons: Vec<Polygon<f64>> = claims
        .iter()
        .map(|c| Polygon::new(LineString::from(c.boundary.clone()), vec![]))
        .collect();
    let tree_items: Vec<ClaimIndex> = polygons
        .iter()
        .enumerate()
        .filter_map(|(i, poly)| {
            poly.bounding_rect().map(|rect| ClaimIndex {
                index: i,
                aabb: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();
    let tree = RTree::bulk_load(tree_items);

    let state = Arc::new(AppState {
        engine: Mutex::new(engine),
        claims,
        polygons,
        tree,
    });

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let app = Router::new()
        .route("/api/scene", get(scene_handler))
        .route("/api/map/base-layer", post(toggle_base_handler))
        .route("/api/map/layers", put(layers_handler))
        .route("/api/map/filter", put(filter_handler))
        .route("/api/map/search", get(search_handler))
        .route("/api/query", get(query_handler))
        .fallback_service(ServeDir::new("."))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn scene_handler(State(state): State<Arc<AppState>>) -> Json<Option<SceneSnapshot>> {
    let engine = state.engine();
    Json(engine.surface().map(|s| s.snapshot()))
}

#[derive(Serialize)]
pub struct BaseLayerResponse {
    pub active: BaseLayer,
}

async fn toggle_base_handler(State(state): State<Arc<AppState>>) -> Json<BaseLayerResponse> {
    let mut engine = state.engine();
    engine.toggle_base_layer();
    Json(BaseLayerResponse {
        active: engine.active_base_layer(),
    })
}

async fn layers_handler(
    State(state): State<Arc<AppState>>,
    Json(toggles): Json<Vec<LayerToggle>>,
) -> Json<CommandResponse> {
    let mut engine = state.engine();
    engine.apply_layer_toggles(&toggles);
    command_response(&mut engine)
}

async fn filter_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterQuery>,
) -> Json<CommandResponse> {
    let mut engine = state.engine();
    engine.set_filter(&params.filter_type);
    command_response(&mut engine)
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Json<CommandResponse> {
    let mut engine = state.engine();
    engine.search(&params.q);
    command_response(&mut engine)
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointQuery>,
) -> Json<Option<ClaimAtPoint>> {
    let point = Point::new(params.lon, params.lat);
    let envelope = AABB::from_point([params.lon, params.lat]);

    let candidates = state.tree.locate_in_envelope_intersecting(&envelope);

    for candidate in candidates {
        let polygon = &state.polygons[candidate.index];
        if polygon.contains(&point) {
            if let Some(claim) = state.claims.get(candidate.index) {
                return Json(Some(ClaimAtPoint {
                    claim_id: claim.claim_id.clone(),
                    village: claim.village.clone(),
                    popup: popup_content(claim),
                }));
            }
        }
    }

    Json(None)
}

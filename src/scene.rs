use crate::config::{MapConfig, SourcesConfig};
use crate::layers::{LayerVisibility, MapSurface};
use crate::style::{popup_content, style_for};
use crate::types::{BaseLayer, ClaimFeature, Overlay};
use geo::Coord;
use serde::Serialize;

/// Retained-scene backend: keeps the visible map contents as a structured
/// display list instead of pixels. The serve host ships its snapshot as JSON
/// to whatever thin client draws it.
pub struct SceneSurface {
    visibility: LayerVisibility,
    claims: Vec<ClaimPolygon>,
    camera: Camera,
    sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimPolygon {
    pub id: u64,
    /// Ring as [lat, lon] pairs, matching the host-facing convention.
    pub ring: Vec<[f64; 2]>,
    pub stroke: String,
    pub fill: String,
    pub fill_opacity: f64,
    pub weight: u32,
    pub popup: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Camera {
    /// [lat, lon]
    pub center: [f64; 2],
    pub zoom: u8,
    /// Last navigation command, if any. Re-issuing one replaces it.
    pub fly: Option<FlyTo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlyTo {
    pub center: [f64; 2],
    pub zoom: u8,
    pub duration_secs: f64,
}

/// Serializable view of the whole scene.
#[derive(Debug, Serialize)]
pub struct SceneSnapshot {
    pub camera: Camera,
    pub base: BaseView,
    pub overlays: Vec<OverlayView>,
    pub claims: Vec<ClaimPolygon>,
}

#[derive(Debug, Serialize)]
pub struct BaseView {
    pub active: Option<BaseLayer>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OverlayView {
    pub id: Overlay,
    pub visible: bool,
    pub source: String,
}

impl SceneSurface {
    pub fn new(map: &MapConfig, sources: &SourcesConfig) -> Self {
        SceneSurface {
            visibility: LayerVisibility::new(&map.base_layers),
            claims: Vec::new(),
            camera: Camera {
                center: map.center,
                zoom: map.zoom,
                fly: None,
            },
            sources: sources.clone(),
        }
    }

    fn base_source(&self, kind: BaseLayer) -> String {
        match kind {
            BaseLayer::Street => self.sources.street.clone(),
            BaseLayer::Satellite => self.sources.satellite.clone(),
            BaseLayer::Topo => self.sources.topo.clone(),
        }
    }

    fn overlay_source(&self, overlay: Overlay) -> String {
        match overlay {
            // The claim layer is vector data rendered from the scene itself.
            Overlay::ForestRights => String::new(),
            Overlay::Watershed => self.sources.watershed.clone(),
            Overlay::LandUse => self.sources.land_use.clone(),
            Overlay::ForestCover => self.sources.forest_cover.clone(),
        }
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        let active = self.visibility.active_base();
        SceneSnapshot {
            camera: self.camera.clone(),
            base: BaseView {
                active,
                source: active.map(|k| self.base_source(k)),
            },
            overlays: self
                .visibility
                .overlays()
                .iter()
                .map(|(overlay, visible)| OverlayView {
                    id: *overlay,
                    visible: *visible,
                    source: self.overlay_source(*overlay),
                })
                .collect(),
            // A hidden claim layer ships no polygons.
            claims: if self.visibility.overlay_visible(Overlay::ForestRights) {
                self.claims.clone()
            } else {
                Vec::new()
            },
        }
    }

    pub fn visibility(&self) -> &LayerVisibility {
        &self.visibility
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

impl MapSurface for SceneSurface {
    fn set_base_layer(&mut self, kind: BaseLayer) {
        self.visibility.set_base_layer(kind);
    }

    fn set_overlay_visible(&mut self, overlay: Overlay, visible: bool) {
        self.visibility.set_overlay_visible(overlay, visible);
    }

    fn rebuild_claim_layer(&mut self, features: &[ClaimFeature]) {
        self.claims.clear();
        for feature in features {
            let style = style_for(feature.status);
            self.claims.push(ClaimPolygon {
                id: feature.id,
                ring: feature.boundary.iter().map(|c| [c.y, c.x]).collect(),
                stroke: style.stroke.to_string(),
                fill: style.fill.to_string(),
                fill_opacity: style.fill_opacity,
                weight: style.weight,
                popup: popup_content(feature),
            });
        }
    }

    fn fly_to(&mut self, center: Coord<f64>, zoom: u8, duration_secs: f64) {
        self.camera.center = [center.y, center.x];
        self.camera.zoom = zoom;
        self.camera.fly = Some(FlyTo {
            center: [center.y, center.x],
            zoom,
            duration_secs,
        });
    }
}

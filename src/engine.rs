use crate::config::MapConfig;
use crate::layers::MapSurface;
use crate::style::centroid_of;
use crate::types::{BaseLayer, ClaimFeature, ClaimFilter, LayerToggle, Notification, Overlay};
use anyhow::Result;

/// Upper bound on navigation animation time. Cosmetic only.
const MAX_FLY_SECS: f64 = 5.0;

/// Map engine: owns the claim dataset, the current base/filter/search state
/// and the attached rendering surface, and keeps the surface consistent with
/// every state change the host delivers. Every command on an unmounted
/// engine is a no-op.
pub struct MapEngine<S: MapSurface> {
    claims: Vec<ClaimFeature>,
    base_cycle: Vec<BaseLayer>,
    search_zoom: u8,
    fly_duration_secs: f64,
    base_index: usize,
    filter: ClaimFilter,
    search_query: String,
    surface: Option<S>,
    events: Vec<Notification>,
}

impl<S: MapSurface> MapEngine<S> {
    pub fn new(claims: Vec<ClaimFeature>, map: &MapConfig) -> Self {
        let base_cycle = if map.base_layers.is_empty() {
            BaseLayer::ALL.to_vec()
        } else {
            map.base_layers.clone()
        };
        MapEngine {
            claims,
            base_cycle,
            search_zoom: map.search_zoom,
            fly_duration_secs: map.fly_duration_secs.min(MAX_FLY_SECS),
            base_index: 0,
            filter: ClaimFilter::default(),
            search_query: String::new(),
            surface: None,
            events: Vec::new(),
        }
    }

    /// Attaches a rendering surface. On factory failure the engine emits a
    /// load-failure notification and stays unmounted with no partial layer
    /// state. Mounting an already-mounted engine is a no-op.
    pub fn mount<F>(&mut self, make_surface: F)
    where
        F: FnOnce() -> Result<S>,
    {
        if self.surface.is_some() {
            return;
        }
        let mut surface = match make_surface() {
            Ok(s) => s,
            Err(e) => {
                self.events.push(Notification::LoadFailed {
                    reason: e.to_string(),
                });
                return;
            }
        };
        self.base_index = 0;
        self.filter = ClaimFilter::default();
        surface.set_base_layer(self.base_cycle[0]);
        surface.rebuild_claim_layer(&self.claims);
        self.surface = Some(surface);
        self.events.push(Notification::LoadSucceeded {
            claims: self.claims.len(),
        });
    }

    /// Detaches and drops the rendering surface with all its layer handles.
    pub fn unmount(&mut self) {
        self.surface = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Advances the base layer cyclically through the configured cycle.
    pub fn toggle_base_layer(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        self.base_index = (self.base_index + 1) % self.base_cycle.len();
        surface.set_base_layer(self.base_cycle[self.base_index]);
    }

    pub fn active_base_layer(&self) -> BaseLayer {
        self.base_cycle[self.base_index]
    }

    /// Reconciles overlay visibility from the host's toggle list. Known ids
    /// present in the list are applied; everything else keeps its previous
    /// visibility.
    pub fn apply_layer_toggles(&mut self, toggles: &[LayerToggle]) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        for toggle in toggles {
            if let Some(overlay) = Overlay::from_toggle_id(&toggle.id) {
                surface.set_overlay_visible(overlay, toggle.enabled);
            }
        }
    }

    /// Applies a claim-type filter from the host's raw value. Unrecognized
    /// values are ignored (the host may send transitional values mid-update).
    pub fn set_filter(&mut self, raw: &str) {
        let Some(filter) = ClaimFilter::parse(raw) else {
            return;
        };
        self.apply_filter(filter);
    }

    pub fn apply_filter(&mut self, filter: ClaimFilter) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        self.filter = filter;
        let subset: Vec<ClaimFeature> = self
            .claims
            .iter()
            .filter(|c| filter.admits(c.claim_type))
            .cloned()
            .collect();
        surface.rebuild_claim_layer(&subset);
    }

    pub fn filter(&self) -> ClaimFilter {
        self.filter
    }

    /// Free-text search over village names and claim ids. Centers on the
    /// first match in dataset order; an empty query is idle.
    pub fn search(&mut self, query: &str) {
        if self.surface.is_none() {
            return;
        }
        let normalized = query.trim().to_lowercase();
        self.search_query = normalized.clone();
        if normalized.is_empty() {
            return;
        }

        let matched = self.claims.iter().find(|c| {
            c.village.to_lowercase().contains(&normalized)
                || c.claim_id.to_lowercase().contains(&normalized)
        });

        match matched {
            Some(claim) => {
                if let Some(center) = centroid_of(&claim.boundary) {
                    let village = claim.village.clone();
                    let zoom = self.search_zoom;
                    let duration = self.fly_duration_secs;
                    if let Some(surface) = self.surface.as_mut() {
                        surface.fly_to(center, zoom, duration);
                    }
                    self.events.push(Notification::SearchMatched { village });
                } else {
                    self.events.push(Notification::SearchMissed);
                }
            }
            None => self.events.push(Notification::SearchMissed),
        }
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Drains the pending host-facing notifications in emission order.
    pub fn drain_events(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapConfig, SourcesConfig};
    use crate::data::sample_claims;
    use crate::scene::SceneSurface;
    use anyhow::anyhow;

    fn test_map_config() -> MapConfig {
        MapConfig {
            center: [20.5937, 78.9629],
            zoom: 6,
            base_layers: BaseLayer::ALL.to_vec(),
            search_zoom: 12,
            fly_duration_secs: 1.5,
        }
    }

    fn test_sources() -> SourcesConfig {
        SourcesConfig {
            street: "s".into(),
            satellite: "s".into(),
            topo: "s".into(),
            watershed: "s".into(),
            land_use: "s".into(),
            forest_cover: "s".into(),
        }
    }

    fn mounted_engine() -> MapEngine<SceneSurface> {
        let map = test_map_config();
        let sources = test_sources();
        let mut engine = MapEngine::new(sample_claims(), &map);
        engine.mount(|| Ok(SceneSurface::new(&map, &sources)));
        engine
    }

    #[test]
    fn mount_renders_all_claims_and_reports_success() {
        let mut engine = mounted_engine();
        assert!(engine.is_mounted());
        assert_eq!(engine.surface().unwrap().claim_count(), 4);
        assert_eq!(
            engine.drain_events(),
            vec![Notification::LoadSucceeded { claims: 4 }]
        );
    }

    #[test]
    fn failed_mount_reports_and_stays_unmounted() {
        let map = test_map_config();
        let mut engine: MapEngine<SceneSurface> = MapEngine::new(sample_claims(), &map);
        engine.mount(|| Err(anyhow!("container attach failed")));
        assert!(!engine.is_mounted());
        let events = engine.drain_events();
        assert!(matches!(events.as_slice(), [Notification::LoadFailed { reason }]
            if reason.contains("container attach failed")));
    }

    #[test]
    fn base_layer_cycles_back_after_full_loop() {
        let mut engine = mounted_engine();
        let start = engine.active_base_layer();
        for _ in 0..BaseLayer::ALL.len() {
            engine.toggle_base_layer();
        }
        assert_eq!(engine.active_base_layer(), start);
        // and after two full loops
        for _ in 0..2 * BaseLayer::ALL.len() {
            engine.toggle_base_layer();
        }
        assert_eq!(engine.active_base_layer(), start);
    }

    #[test]
    fn exactly_one_base_visible_after_any_toggle_sequence() {
        let mut engine = mounted_engine();
        for _ in 0..7 {
            engine.toggle_base_layer();
            assert_eq!(engine.surface().unwrap().visibility().visible_base_count(), 1);
        }
    }

    #[test]
    fn empty_base_config_still_shows_one_base() {
        let mut map = test_map_config();
        map.base_layers = Vec::new();
        let sources = test_sources();
        let mut engine = MapEngine::new(sample_claims(), &map);
        let factory_map = map.clone();
        engine.mount(move || Ok(SceneSurface::new(&factory_map, &sources)));

        // Engine and surface both fall back to the full cycle.
        assert_eq!(engine.surface().unwrap().visibility().visible_base_count(), 1);
        engine.toggle_base_layer();
        assert_eq!(engine.active_base_layer(), BaseLayer::Satellite);
        assert_eq!(
            engine.surface().unwrap().visibility().active_base(),
            Some(BaseLayer::Satellite)
        );
    }

    #[test]
    fn filter_renders_matching_subset_and_restores() {
        let mut engine = mounted_engine();
        engine.set_filter("ifr");
        assert_eq!(engine.surface().unwrap().claim_count(), 2); // Bhilwara + Bastar
        engine.set_filter("cfr");
        assert_eq!(engine.surface().unwrap().claim_count(), 1);
        engine.set_filter("all");
        assert_eq!(engine.surface().unwrap().claim_count(), 4);
    }

    #[test]
    fn unknown_filter_value_is_ignored() {
        let mut engine = mounted_engine();
        engine.set_filter("cr");
        assert_eq!(engine.filter(), ClaimFilter::Cr);
        engine.set_filter("bogus");
        assert_eq!(engine.filter(), ClaimFilter::Cr);
        assert_eq!(engine.surface().unwrap().claim_count(), 1);
    }

    #[test]
    fn layer_toggles_reconcile_without_replacing() {
        let mut engine = mounted_engine();
        engine.apply_layer_toggles(&[
            LayerToggle { id: "water".into(), enabled: true },
            LayerToggle { id: "volcanoes".into(), enabled: true }, // unknown: ignored
        ]);
        let vis = engine.surface().unwrap().visibility();
        assert!(vis.overlay_visible(Overlay::Watershed));
        // Omitted ids keep their previous visibility.
        assert!(vis.overlay_visible(Overlay::ForestRights));
        assert!(!vis.overlay_visible(Overlay::LandUse));

        engine.apply_layer_toggles(&[LayerToggle { id: "forest".into(), enabled: false }]);
        let vis = engine.surface().unwrap().visibility();
        assert!(!vis.overlay_visible(Overlay::ForestRights));
        assert!(vis.overlay_visible(Overlay::Watershed));
    }

    #[test]
    fn search_centers_on_vertex_mean_of_match() {
        let mut engine = mounted_engine();
        engine.drain_events();
        engine.search("  KHUNTI ");
        let camera = engine.surface().unwrap().camera();
        assert!((camera.center[0] - 21.25).abs() < 1e-9);
        assert!((camera.center[1] - 79.15).abs() < 1e-9);
        assert_eq!(camera.zoom, 12);
        assert_eq!(
            engine.drain_events(),
            vec![Notification::SearchMatched { village: "Khunti Village".into() }]
        );
    }

    #[test]
    fn search_matches_claim_id_substring() {
        let mut engine = mounted_engine();
        engine.drain_events();
        engine.search("fra-2024-003");
        assert_eq!(
            engine.drain_events(),
            vec![Notification::SearchMatched { village: "Dantewada Village".into() }]
        );
    }

    #[test]
    fn no_match_search_does_not_navigate() {
        let mut engine = mounted_engine();
        engine.drain_events();
        let before = engine.surface().unwrap().camera().center;
        engine.search("zzz-nonexistent");
        assert_eq!(engine.surface().unwrap().camera().center, before);
        assert!(engine.surface().unwrap().camera().fly.is_none());
        assert_eq!(engine.drain_events(), vec![Notification::SearchMissed]);
    }

    #[test]
    fn empty_search_is_idle() {
        let mut engine = mounted_engine();
        engine.drain_events();
        engine.search("   ");
        assert!(engine.drain_events().is_empty());
        assert!(engine.surface().unwrap().camera().fly.is_none());
        assert_eq!(engine.search_query(), "");
    }

    #[test]
    fn commands_after_unmount_are_noops() {
        let mut engine = mounted_engine();
        engine.unmount();
        assert!(!engine.is_mounted());
        engine.search("khunti");
        engine.toggle_base_layer();
        engine.set_filter("ifr");
        engine.apply_layer_toggles(&[LayerToggle { id: "water".into(), enabled: true }]);
        // Only the original mount success is pending; the stale commands
        // produced nothing.
        assert_eq!(
            engine.drain_events(),
            vec![Notification::LoadSucceeded { claims: 4 }]
        );
        assert!(engine.surface().is_none());
    }
}

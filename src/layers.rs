use crate::types::{BaseLayer, ClaimFeature, Overlay};
use geo::Coord;
use std::collections::BTreeMap;

/// Rendering-surface contract shared by every backend. The engine only ever
/// talks to this; which concrete backend sits behind it is a composition-time
/// choice.
pub trait MapSurface {
    /// Hides the currently visible base layer and shows `kind`. No-op when
    /// `kind` is already active. Exactly one base layer is visible after the
    /// call.
    fn set_base_layer(&mut self, kind: BaseLayer);

    /// Idempotent overlay visibility switch.
    fn set_overlay_visible(&mut self, overlay: Overlay, visible: bool);

    /// Clears all rendered claim polygons and re-adds one per feature.
    fn rebuild_claim_layer(&mut self, features: &[ClaimFeature]);

    /// Fire-and-forget pan/zoom. Animations are cosmetic; the latest command
    /// wins and nothing awaits completion.
    fn fly_to(&mut self, center: Coord<f64>, zoom: u8, duration_secs: f64);
}

/// Base/overlay visibility registry embedded by both backends.
#[derive(Debug, Clone)]
pub struct LayerVisibility {
    base: BTreeMap<BaseLayer, bool>,
    overlays: BTreeMap<Overlay, bool>,
}

impl LayerVisibility {
    /// Registers one handle per base kind in `base_layers` (the first one
    /// visible) and one per overlay kind with its default visibility. An
    /// empty list falls back to the full base cycle so one base layer is
    /// always visible.
    pub fn new(base_layers: &[BaseLayer]) -> Self {
        let base_layers: &[BaseLayer] = if base_layers.is_empty() {
            &BaseLayer::ALL
        } else {
            base_layers
        };
        let base = base_layers
            .iter()
            .enumerate()
            .map(|(i, kind)| (*kind, i == 0))
            .collect();
        let overlays = Overlay::ALL
            .iter()
            .map(|o| (*o, o.default_visible()))
            .collect();
        LayerVisibility { base, overlays }
    }

    pub fn set_base_layer(&mut self, kind: BaseLayer) {
        if !self.base.contains_key(&kind) {
            return; // Not part of this map's base cycle
        }
        for (k, visible) in self.base.iter_mut() {
            *visible = *k == kind;
        }
    }

    pub fn set_overlay_visible(&mut self, overlay: Overlay, visible: bool) {
        if let Some(entry) = self.overlays.get_mut(&overlay) {
            *entry = visible;
        }
    }

    pub fn active_base(&self) -> Option<BaseLayer> {
        self.base
            .iter()
            .find_map(|(k, visible)| visible.then_some(*k))
    }

    pub fn visible_base_count(&self) -> usize {
        self.base.values().filter(|v| **v).count()
    }

    pub fn overlay_visible(&self, overlay: Overlay) -> bool {
        self.overlays.get(&overlay).copied().unwrap_or(false)
    }

    pub fn overlays(&self) -> &BTreeMap<Overlay, bool> {
        &self.overlays
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_base_layer_visible_by_default() {
        let vis = LayerVisibility::new(&BaseLayer::ALL);
        assert_eq!(vis.active_base(), Some(BaseLayer::Street));
        assert_eq!(vis.visible_base_count(), 1);
    }

    #[test]
    fn default_overlays_show_only_forest_rights() {
        let vis = LayerVisibility::new(&BaseLayer::ALL);
        assert!(vis.overlay_visible(Overlay::ForestRights));
        assert!(!vis.overlay_visible(Overlay::Watershed));
        assert!(!vis.overlay_visible(Overlay::LandUse));
        assert!(!vis.overlay_visible(Overlay::ForestCover));
    }

    #[test]
    fn exactly_one_base_visible_after_switches() {
        let mut vis = LayerVisibility::new(&BaseLayer::ALL);
        for kind in [
            BaseLayer::Satellite,
            BaseLayer::Satellite, // repeat is a no-op
            BaseLayer::Topo,
            BaseLayer::Street,
        ] {
            vis.set_base_layer(kind);
            assert_eq!(vis.visible_base_count(), 1);
        }
        assert_eq!(vis.active_base(), Some(BaseLayer::Street));
    }

    #[test]
    fn empty_base_list_falls_back_to_full_cycle() {
        let vis = LayerVisibility::new(&[]);
        assert_eq!(vis.active_base(), Some(BaseLayer::Street));
        assert_eq!(vis.visible_base_count(), 1);
    }

    #[test]
    fn unregistered_base_kind_is_ignored() {
        let mut vis = LayerVisibility::new(&[BaseLayer::Street, BaseLayer::Satellite]);
        vis.set_base_layer(BaseLayer::Topo);
        assert_eq!(vis.active_base(), Some(BaseLayer::Street));
    }

    #[test]
    fn overlay_toggle_is_idempotent() {
        let mut vis = LayerVisibility::new(&BaseLayer::ALL);
        vis.set_overlay_visible(Overlay::Watershed, true);
        vis.set_overlay_visible(Overlay::Watershed, true);
        assert!(vis.overlay_visible(Overlay::Watershed));
        vis.set_overlay_visible(Overlay::Watershed, false);
        assert!(!vis.overlay_visible(Overlay::Watershed));
    }
}

use geo::Coord;
use serde::{Deserialize, Serialize};

/// One forest-rights claim polygon with its attributes. The dataset is loaded
/// once at engine mount and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ClaimFeature {
    pub id: u64,
    /// Boundary vertices, x = longitude, y = latitude. Implicitly closed; an
    /// explicit closing vertex is accepted and simply participates in the
    /// centroid mean like any other vertex.
    pub boundary: Vec<Coord<f64>>,
    pub village: String,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    pub area: String,
    pub claim_id: String,
    pub beneficiaries: u32,
    pub date_granted: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClaimType {
    Ifr,
    Cfr,
    Cr,
}

impl ClaimType {
    pub fn label(&self) -> &'static str {
        match self {
            ClaimType::Ifr => "IFR",
            ClaimType::Cfr => "CFR",
            ClaimType::Cr => "CR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Approved,
    Pending,
    #[serde(rename = "Under Review")]
    UnderReview,
}

impl ClaimStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Pending => "Pending",
            ClaimStatus::UnderReview => "Under Review",
        }
    }
}

/// Overlay visibility entry supplied by the host. The host's toggle list is
/// the source of truth; entries it omits leave the prior visibility alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerToggle {
    pub id: String,
    pub enabled: bool,
}

/// Base imagery kinds. Mutually exclusive; the engine cycles through the
/// configured subset in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseLayer {
    Street,
    Satellite,
    Topo,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 3] = [BaseLayer::Street, BaseLayer::Satellite, BaseLayer::Topo];
}

/// Thematic overlays drawn above the base layer, independently toggleable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    ForestRights,
    Watershed,
    LandUse,
    ForestCover,
}

impl Overlay {
    pub const ALL: [Overlay; 4] = [
        Overlay::ForestRights,
        Overlay::Watershed,
        Overlay::LandUse,
        Overlay::ForestCover,
    ];

    /// Maps a host toggle id to an overlay. Unknown ids yield None and are
    /// ignored by the engine.
    pub fn from_toggle_id(id: &str) -> Option<Overlay> {
        match id {
            "forest" => Some(Overlay::ForestRights),
            "water" => Some(Overlay::Watershed),
            "agriculture" => Some(Overlay::LandUse),
            "infrastructure" => Some(Overlay::ForestCover),
            _ => None,
        }
    }

    /// Visible by default: only the forest-rights claim layer.
    pub fn default_visible(&self) -> bool {
        matches!(self, Overlay::ForestRights)
    }
}

/// Claim-type filter applied to the rendered claim layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimFilter {
    #[default]
    All,
    Ifr,
    Cr,
    Cfr,
}

impl ClaimFilter {
    /// Parses the host-supplied filter value. Unknown values yield None; the
    /// engine keeps its previous filter in that case.
    pub fn parse(raw: &str) -> Option<ClaimFilter> {
        match raw {
            "all" => Some(ClaimFilter::All),
            "ifr" => Some(ClaimFilter::Ifr),
            "cr" => Some(ClaimFilter::Cr),
            "cfr" => Some(ClaimFilter::Cfr),
            _ => None,
        }
    }

    pub fn admits(&self, claim_type: ClaimType) -> bool {
        match self {
            ClaimFilter::All => true,
            ClaimFilter::Ifr => claim_type == ClaimType::Ifr,
            ClaimFilter::Cr => claim_type == ClaimType::Cr,
            ClaimFilter::Cfr => claim_type == ClaimType::Cfr,
        }
    }
}

/// Feedback events the engine emits towards the host surface. The host drains
/// these and presents them however it likes (toasts, logs, HTTP bodies).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    LoadSucceeded { claims: usize },
    LoadFailed { reason: String },
    SearchMatched { village: String },
    SearchMissed,
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::LoadSucceeded { .. } => write!(f, "Map loaded successfully"),
            Notification::LoadFailed { reason } => write!(f, "Map failed to load: {}", reason),
            Notification::SearchMatched { village } => write!(f, "Found: {}", village),
            Notification::SearchMissed => write!(f, "No matching location found"),
        }
    }
}

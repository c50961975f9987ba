use crate::types::{ClaimFeature, ClaimStatus};
use geo::Coord;

// Same stroke weight for every status.
pub const STROKE_WEIGHT: u32 = 2;

/// Resolved polygon styling, colors as CSS hex strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonStyle {
    pub stroke: &'static str,
    pub fill: &'static str,
    pub fill_opacity: f64,
    pub weight: u32,
}

/// Status → style mapping; anything outside Approved/Pending gets the
/// neutral gray.
pub fn style_for(status: ClaimStatus) -> PolygonStyle {
    let (stroke, fill) = match status {
        ClaimStatus::Approved => ("#16a34a", "#22c55e"),
        ClaimStatus::Pending => ("#f59e0b", "#fbbf24"),
        _ => ("#6b7280", "#9ca3af"),
    };
    PolygonStyle {
        stroke,
        fill,
        fill_opacity: 0.4,
        weight: STROKE_WEIGHT,
    }
}

/// Unweighted arithmetic mean of the boundary vertices. Deliberately not an
/// area-weighted centroid: this is a navigation target, and it must agree
/// with the mean a host computes from the raw vertex list.
pub fn centroid_of(boundary: &[Coord<f64>]) -> Option<Coord<f64>> {
    if boundary.is_empty() {
        return None;
    }
    let n = boundary.len() as f64;
    let sum = boundary
        .iter()
        .fold(Coord { x: 0.0, y: 0.0 }, |acc, c| Coord {
            x: acc.x + c.x,
            y: acc.y + c.y,
        });
    Some(Coord {
        x: sum.x / n,
        y: sum.y / n,
    })
}

/// Popup markup for one claim. Pure presentation; the date row only appears
/// when a grant date exists.
pub fn popup_content(feature: &ClaimFeature) -> String {
    let status_color = style_for(feature.status).stroke;
    let mut html = format!(
        concat!(
            "<div style=\"font-family: system-ui; min-width: 200px;\">",
            "<h3 style=\"font-weight: bold; margin-bottom: 8px; color: #1f2937;\">{village}</h3>",
            "<p style=\"margin: 4px 0; font-size: 14px;\"><strong>Claim ID:</strong> {claim_id}</p>",
            "<p style=\"margin: 4px 0; font-size: 14px;\"><strong>Type:</strong> {claim_type}</p>",
            "<p style=\"margin: 4px 0; font-size: 14px;\"><strong>Area:</strong> {area}</p>",
            "<p style=\"margin: 4px 0; font-size: 14px;\"><strong>Status:</strong> ",
            "<span style=\"color: {status_color}\">{status}</span></p>",
            "<p style=\"margin: 4px 0; font-size: 14px;\"><strong>Beneficiaries:</strong> {beneficiaries}</p>",
        ),
        village = feature.village,
        claim_id = feature.claim_id,
        claim_type = feature.claim_type.label(),
        area = feature.area,
        status_color = status_color,
        status = feature.status.label(),
        beneficiaries = feature.beneficiaries,
    );
    if let Some(date) = &feature.date_granted {
        html.push_str(&format!(
            "<p style=\"margin: 4px 0; font-size: 14px;\"><strong>Date Granted:</strong> {}</p>",
            date
        ));
    }
    html.push_str("</div>");
    html
}

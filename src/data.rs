use crate::config::AppConfig;
use crate::types::{ClaimFeature, ClaimStatus, ClaimType};
use anyhow::{anyhow, Context, Result};
use geo::Coord;
use geojson::{GeoJson, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Loads the claim dataset: the configured GeoJSON file when one is set,
/// otherwise the built-in sample claims.
pub fn load_claims(config: &AppConfig) -> Result<Vec<ClaimFeature>> {
    let claims = match &config.input.claims {
        Some(path) => load_geojson_claims(path)?,
        None => {
            info!("No claims file configured, using built-in sample dataset");
            sample_claims()
        }
    };
    info!("Loaded {} claim features", claims.len());
    Ok(claims)
}

fn load_geojson_claims(path: &Path) -> Result<Vec<ClaimFeature>> {
    info!("Loading claims from {:?}", path);
    let file = File::open(path)
        .with_context(|| format!("Failed to open claims GeoJSON: {:?}", path))?;
    let reader = BufReader::new(file);
    let geojson = GeoJson::from_reader(reader).context("Failed to parse claims GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Claims GeoJSON must be a FeatureCollection")),
    };

    let mut claims = Vec::new();

    for feature in collection.features {
        // Take the first (exterior) ring verbatim so the vertex list stays
        // exactly as authored, closed or not.
        let boundary = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Polygon(rings)) => match rings.first() {
                Some(ring) => ring
                    .iter()
                    .filter(|pos| pos.len() >= 2)
                    .map(|pos| Coord { x: pos[0], y: pos[1] })
                    .collect::<Vec<_>>(),
                None => continue,
            },
            _ => continue, // Skip points/lines/multipolygons
        };

        if boundary.len() < 3 {
            warn!("Skipping claim with fewer than 3 boundary vertices");
            continue;
        }

        let props = feature
            .properties
            .as_ref()
            .ok_or_else(|| anyhow!("Claim feature is missing properties"))?;

        let get_str = |key: &str| -> Result<String> {
            props
                .get(key)
                .and_then(|v| v.as_str())
                .map(String::from)
                .ok_or_else(|| anyhow!("Claim property '{}' missing or not a string", key))
        };

        let claim_type = match get_str("type")?.as_str() {
            "IFR" => ClaimType::Ifr,
            "CFR" => ClaimType::Cfr,
            "CR" => ClaimType::Cr,
            other => {
                warn!("Skipping claim with unknown type '{}'", other);
                continue;
            }
        };

        let status = match get_str("status")?.as_str() {
            "Approved" => ClaimStatus::Approved,
            "Pending" => ClaimStatus::Pending,
            // Anything else styles as the fallback gray anyway.
            _ => ClaimStatus::UnderReview,
        };

        let village = get_str("village")?;
        if village.is_empty() {
            return Err(anyhow!("Claim village name must be non-empty"));
        }

        claims.push(ClaimFeature {
            id: props.get("id").and_then(|v| v.as_u64()).unwrap_or_default(),
            boundary,
            village,
            claim_type,
            status,
            area: get_str("area")?,
            claim_id: get_str("claimId")?,
            beneficiaries: props
                .get("beneficiaries")
                .and_then(|v| v.as_u64())
                .unwrap_or_default() as u32,
            date_granted: props
                .get("dateGranted")
                .and_then(|v| v.as_str())
                .map(String::from),
        });
    }

    Ok(claims)
}

fn square(lat: f64, lon: f64, side: f64) -> Vec<Coord<f64>> {
    vec![
        Coord { x: lon, y: lat },
        Coord { x: lon, y: lat + side },
        Coord { x: lon + side, y: lat + side },
        Coord { x: lon + side, y: lat },
    ]
}

/// Built-in sample claims covering every claim type and status.
pub fn sample_claims() -> Vec<ClaimFeature> {
    vec![
        ClaimFeature {
            id: 1,
            boundary: square(20.5, 78.5, 0.1),
            village: "Bhilwara Village".into(),
            claim_type: ClaimType::Ifr,
            status: ClaimStatus::Approved,
            area: "5.2 ha".into(),
            claim_id: "FRA-2024-001".into(),
            beneficiaries: 45,
            date_granted: Some("2024-01-15".into()),
        },
        ClaimFeature {
            id: 2,
            boundary: square(21.2, 79.1, 0.1),
            village: "Khunti Village".into(),
            claim_type: ClaimType::Cfr,
            status: ClaimStatus::Pending,
            area: "12.5 ha".into(),
            claim_id: "FRA-2024-002".into(),
            beneficiaries: 120,
            date_granted: None,
        },
        ClaimFeature {
            id: 3,
            boundary: square(19.8, 81.5, 0.1),
            village: "Dantewada Village".into(),
            claim_type: ClaimType::Cr,
            status: ClaimStatus::Approved,
            area: "8.7 ha".into(),
            claim_id: "FRA-2024-003".into(),
            beneficiaries: 78,
            date_granted: Some("2024-02-20".into()),
        },
        ClaimFeature {
            id: 4,
            boundary: square(22.1, 82.0, 0.1),
            village: "Bastar Village".into(),
            claim_type: ClaimType::Ifr,
            status: ClaimStatus::UnderReview,
            area: "4.1 ha".into(),
            claim_id: "FRA-2024-004".into(),
            beneficiaries: 32,
            date_granted: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[78.5, 20.5], [78.5, 20.6], [78.6, 20.6], [78.6, 20.5]]]
                },
                "properties": {
                    "id": 1,
                    "village": "Bhilwara Village",
                    "type": "IFR",
                    "area": "5.2 ha",
                    "status": "Approved",
                    "claimId": "FRA-2024-001",
                    "beneficiaries": 45,
                    "dateGranted": "2024-01-15"
                }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[82.0, 22.1], [82.0, 22.2], [82.1, 22.2], [82.1, 22.1]]]
                },
                "properties": {
                    "id": 4,
                    "village": "Bastar Village",
                    "type": "IFR",
                    "area": "4.1 ha",
                    "status": "Under Review",
                    "claimId": "FRA-2024-004",
                    "beneficiaries": 32
                }
            }
        ]
    }"#;

    #[test]
    fn parses_geojson_claims() {
        let dir = std::env::temp_dir().join("fra-atlas-data-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("claims.geojson");
        let mut file = File::create(&path).unwrap();
        file.write_all(SAMPLE_GEOJSON.as_bytes()).unwrap();

        let claims = load_geojson_claims(&path).unwrap();
        assert_eq!(claims.len(), 2);

        let first = &claims[0];
        assert_eq!(first.village, "Bhilwara Village");
        assert_eq!(first.claim_type, ClaimType::Ifr);
        assert_eq!(first.status, ClaimStatus::Approved);
        assert_eq!(first.boundary.len(), 4);
        assert_eq!(first.date_granted.as_deref(), Some("2024-01-15"));

        let second = &claims[1];
        assert_eq!(second.status, ClaimStatus::UnderReview);
        assert!(second.date_granted.is_none());
    }

    #[test]
    fn sample_dataset_covers_all_types() {
        let claims = sample_claims();
        assert_eq!(claims.len(), 4);
        assert!(claims.iter().any(|c| c.claim_type == ClaimType::Ifr));
        assert!(claims.iter().any(|c| c.claim_type == ClaimType::Cfr));
        assert!(claims.iter().any(|c| c.claim_type == ClaimType::Cr));
        // claim_id uniqueness
        let mut ids: Vec<_> = claims.iter().map(|c| c.claim_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }
}

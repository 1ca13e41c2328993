//! JSON export and PPM heatmap rendering for `RoadHealth` results.
//!
//! Iterates tiles row-major, looks up a color ramp per value, and writes a
//! plain binary PPM (P6) file — no GPU texture or rendering dependency
//! required.

use serde::Serialize;

use crate::error::Result;
use crate::road_health::RoadHealthResult;

#[derive(Serialize)]
struct RoadHealthJson {
    centrality01: Vec<f32>,
    vulnerability01: Vec<f32>,
    bypass_mask: Vec<bool>,
}

pub fn export_road_health_json(health: &RoadHealthResult) -> Result<String> {
    let doc = RoadHealthJson {
        centrality01: health.centrality01.clone(),
        vulnerability01: health.vulnerability01.clone(),
        bypass_mask: health.bypass_mask.clone(),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| crate::error::IsoCityError::Decode(e.to_string()))
}

/// Blue (low) -> yellow -> red (high) ramp over `[0,1]`.
fn ramp(v: f32) -> [u8; 3] {
    let v = v.clamp(0.0, 1.0);
    if v < 0.5 {
        let t = v / 0.5;
        [
            (t * 255.0) as u8,
            (t * 200.0) as u8,
            ((1.0 - t) * 255.0) as u8,
        ]
    } else {
        let t = (v - 0.5) / 0.5;
        [255, ((1.0 - t) * 200.0) as u8, 0]
    }
}

/// Which per-tile field to render as a PPM heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthField {
    Centrality,
    Vulnerability,
}

/// Renders a `width x height` binary PPM (P6) heatmap of the chosen field.
/// Tiles beyond the result's tile-index range (e.g. a world with no roads)
/// are rendered black.
pub fn export_road_health_ppm(width: usize, height: usize, health: &RoadHealthResult, field: HealthField) -> Vec<u8> {
    let values: &[f32] = match field {
        HealthField::Centrality => &health.centrality01,
        HealthField::Vulnerability => &health.vulnerability01,
    };

    let mut out = format!("P6\n{width} {height}\n255\n").into_bytes();
    for i in 0..width * height {
        let v = values.get(i).copied().unwrap_or(0.0);
        let [r, g, b] = ramp(v);
        out.extend_from_slice(&[r, g, b]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppm_has_correct_header_and_byte_count() {
        let health = RoadHealthResult {
            centrality01: vec![0.0, 0.5, 1.0, 0.25],
            vulnerability01: vec![0.0; 4],
            bypass_mask: vec![false; 4],
        };
        let ppm = export_road_health_ppm(2, 2, &health, HealthField::Centrality);
        assert!(ppm.starts_with(b"P6\n2 2\n255\n"));
        let header_len = b"P6\n2 2\n255\n".len();
        assert_eq!(ppm.len() - header_len, 2 * 2 * 3);
    }

    #[test]
    fn missing_tiles_render_black() {
        let health = RoadHealthResult::default();
        let ppm = export_road_health_ppm(2, 1, &health, HealthField::Centrality);
        let header_len = b"P6\n2 1\n255\n".len();
        assert_eq!(&ppm[header_len..], &[0u8, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn json_export_has_matching_length_arrays() {
        let health = RoadHealthResult {
            centrality01: vec![0.1, 0.2],
            vulnerability01: vec![0.3, 0.4],
            bypass_mask: vec![true, false],
        };
        let json = export_road_health_json(&health).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["centrality01"].as_array().unwrap().len(), 2);
    }
}

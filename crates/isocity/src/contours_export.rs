//! JSON and SVG export for extracted contour levels.
//!
//! The SVG writer emits one `<path>` per polyline with fixed 3-decimal
//! coordinate precision so output diffs stay stable.

use serde::Serialize;

use crate::contours::{ContourLevel, Point};
use crate::error::Result;

#[derive(Serialize)]
struct PointJson {
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct PolylineJson {
    points: Vec<PointJson>,
    closed: bool,
}

#[derive(Serialize)]
struct LevelJson {
    level: f64,
    lines: Vec<PolylineJson>,
}

pub fn export_contours_json(levels: &[ContourLevel]) -> Result<String> {
    let records: Vec<LevelJson> = levels
        .iter()
        .map(|l| LevelJson {
            level: l.level,
            lines: l
                .lines
                .iter()
                .map(|poly| PolylineJson {
                    points: poly.points.iter().map(|p| PointJson { x: p.x, y: p.y }).collect(),
                    closed: poly.closed,
                })
                .collect(),
        })
        .collect();
    serde_json::to_string_pretty(&records).map_err(|e| crate::error::IsoCityError::Decode(e.to_string()))
}

fn path_d(points: &[Point]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { "L" };
        d.push_str(&format!("{cmd}{:.3},{:.3} ", p.x, p.y));
    }
    d
}

/// Renders all levels into one SVG document, one `<path>` per polyline,
/// scaled 1 tile-unit == `scale` pixels.
pub fn export_contours_svg(levels: &[ContourLevel], width: usize, height: usize, scale: f64) -> String {
    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {:.3} {:.3}\">\n",
        width as f64 * scale,
        height as f64 * scale
    );
    for level in levels {
        for poly in &level.lines {
            let scaled: Vec<Point> = poly
                .points
                .iter()
                .map(|p| Point { x: p.x * scale, y: p.y * scale })
                .collect();
            out.push_str(&format!(
                "  <path d=\"{}\" fill=\"none\" stroke=\"black\" data-level=\"{}\"/>\n",
                path_d(&scaled),
                level.level
            ));
        }
    }
    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContoursConfig;
    use crate::contours::build_contours;

    #[test]
    fn svg_contains_one_path_per_polyline() {
        let heights: Vec<f32> = (0..16).map(|i| (i / 4) as f32).collect();
        let levels = build_contours(&heights, 4, 4, &[1.5], &ContoursConfig::default()).unwrap();
        let line_count: usize = levels.iter().map(|l| l.lines.len()).sum();
        let svg = export_contours_svg(&levels, 4, 4, 10.0);
        assert_eq!(svg.matches("<path").count(), line_count);
    }

    #[test]
    fn json_export_preserves_level_count() {
        let heights = vec![1.0f32; 9];
        let levels = build_contours(&heights, 3, 3, &[0.5, 1.5], &ContoursConfig::default()).unwrap();
        let json = export_contours_json(&levels).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }
}

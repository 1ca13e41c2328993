//! Marching-squares contour extraction with polyline stitching and
//! Douglas-Peucker simplification.
//!
//! The 16-case table, an asymptotic decider for ambiguous cases 5 and 10,
//! integer-quantized endpoint keys so stitching doesn't depend on float
//! equality, and degree-1-first open-polyline tracing before looping over
//! whatever segments remain.

use std::collections::BTreeMap;

use crate::config::ContoursConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct ContourPolyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

#[derive(Debug, Clone)]
pub struct ContourLevel {
    pub level: f64,
    pub lines: Vec<ContourPolyline>,
}

const DEFAULT_QUANTIZE: f64 = 1e-6;
const MIN_POINTS: usize = 2;

pub fn build_corner_height_grid(tile_heights: &[f32], width: usize, height: usize) -> Vec<f64> {
    let cw = width + 1;
    let ch = height + 1;
    let mut corners = vec![0.0f64; cw * ch];

    for cy in 0..ch {
        for cx in 0..cw {
            let mut sum = 0.0f64;
            let mut count = 0u32;
            // the 4 tiles that share this corner, at (cx-1,cy-1),(cx,cy-1),(cx-1,cy),(cx,cy)
            for &(tx, ty) in &[
                (cx as i64 - 1, cy as i64 - 1),
                (cx as i64, cy as i64 - 1),
                (cx as i64 - 1, cy as i64),
                (cx as i64, cy as i64),
            ] {
                if tx >= 0 && ty >= 0 && (tx as usize) < width && (ty as usize) < height {
                    sum += tile_heights[(ty as usize) * width + tx as usize] as f64;
                    count += 1;
                }
            }
            corners[cy * cw + cx] = if count > 0 { sum / count as f64 } else { 0.0 };
        }
    }

    corners
}

fn quantize(v: f64) -> i64 {
    (v / DEFAULT_QUANTIZE).round() as i64
}

fn lerp_edge(level: f64, p0: Point, v0: f64, p1: Point, v1: f64) -> Point {
    let t = if (v1 - v0).abs() < 1e-12 {
        0.5
    } else {
        ((level - v0) / (v1 - v0)).clamp(0.0, 1.0)
    };
    Point {
        x: p0.x + (p1.x - p0.x) * t,
        y: p0.y + (p1.y - p0.y) * t,
    }
}

#[derive(Debug, Clone, Copy)]
struct RawSegment {
    p0: Point,
    p1: Point,
}

fn extract_level_segments(corners: &[f64], width: usize, height: usize, level: f64, use_asymptotic_decider: bool) -> Vec<RawSegment> {
    let cw = width + 1;
    let mut segments = Vec::new();

    for cy in 0..height {
        for cx in 0..width {
            let tl_v = corners[cy * cw + cx];
            let tr_v = corners[cy * cw + cx + 1];
            let bl_v = corners[(cy + 1) * cw + cx];
            let br_v = corners[(cy + 1) * cw + cx + 1];

            let tl = tl_v > level;
            let tr = tr_v > level;
            let br = br_v > level;
            let bl = bl_v > level;

            let mask = (tl as u8) << 3 | (tr as u8) << 2 | (br as u8) << 1 | (bl as u8);
            if mask == 0 || mask == 15 {
                continue;
            }

            let top_l = Point { x: cx as f64, y: cy as f64 };
            let top_r = Point { x: cx as f64 + 1.0, y: cy as f64 };
            let bot_l = Point { x: cx as f64, y: cy as f64 + 1.0 };
            let bot_r = Point { x: cx as f64 + 1.0, y: cy as f64 + 1.0 };

            let top_pt = lerp_edge(level, top_l, tl_v, top_r, tr_v);
            let right_pt = lerp_edge(level, top_r, tr_v, bot_r, br_v);
            let bottom_pt = lerp_edge(level, bot_l, bl_v, bot_r, br_v);
            let left_pt = lerp_edge(level, top_l, tl_v, bot_l, bl_v);

            let center_avg = (tl_v + tr_v + br_v + bl_v) / 4.0;

            let mut push = |a: Point, b: Point| segments.push(RawSegment { p0: a, p1: b });

            match mask {
                1 | 14 => push(left_pt, bottom_pt),
                2 => push(bottom_pt, right_pt),
                13 => push(right_pt, bottom_pt),
                3 | 12 => push(left_pt, right_pt),
                4 => push(top_pt, right_pt),
                11 => push(right_pt, top_pt),
                6 | 9 => push(top_pt, bottom_pt),
                7 => push(left_pt, top_pt),
                8 => push(top_pt, left_pt),
                5 => {
                    // ambiguous: corners TL and BR above level
                    let around_low = !use_asymptotic_decider || center_avg <= level;
                    if around_low {
                        push(left_pt, top_pt);
                        push(right_pt, bottom_pt);
                    } else {
                        push(top_pt, right_pt);
                        push(bottom_pt, left_pt);
                    }
                }
                10 => {
                    // ambiguous: corners TR and BL above level
                    let around_low = !use_asymptotic_decider || center_avg <= level;
                    if around_low {
                        push(top_pt, right_pt);
                        push(bottom_pt, left_pt);
                    } else {
                        push(left_pt, top_pt);
                        push(right_pt, bottom_pt);
                    }
                }
                _ => {}
            }
        }
    }

    segments
}

fn dedupe_degenerate(segments: Vec<RawSegment>) -> Vec<RawSegment> {
    segments
        .into_iter()
        .filter(|s| {
            quantize(s.p0.x) != quantize(s.p1.x) || quantize(s.p0.y) != quantize(s.p1.y)
        })
        .collect()
}

type Key = (i64, i64);

fn key(p: Point) -> Key {
    (quantize(p.x), quantize(p.y))
}

fn stitch(segments: Vec<RawSegment>) -> Vec<ContourPolyline> {
    let mut adjacency: BTreeMap<Key, Vec<usize>> = BTreeMap::new();
    for (i, s) in segments.iter().enumerate() {
        adjacency.entry(key(s.p0)).or_default().push(i);
        adjacency.entry(key(s.p1)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();

    let other_endpoint = |seg_idx: usize, from_key: Key| -> (Point, Key) {
        let s = segments[seg_idx];
        if key(s.p0) == from_key {
            (s.p1, key(s.p1))
        } else {
            (s.p0, key(s.p0))
        }
    };

    let ordered_keys: Vec<Key> = adjacency.keys().copied().collect();

    // Phase 1: start traces from degree-1 endpoints (open polylines).
    for &k in &ordered_keys {
        let incident = adjacency[&k].clone();
        let unused_count = incident.iter().filter(|&&i| !used[i]).count();
        if unused_count != 1 {
            continue;
        }
        let start_seg = *incident.iter().find(|&&i| !used[i]).unwrap();
        let mut points = Vec::new();
        let s0 = segments[start_seg];
        points.push(s0.p0);
        points.push(s0.p1);
        used[start_seg] = true;
        let mut cur_key = key(s0.p1);
        let mut last_seg = start_seg;

        loop {
            let incident = adjacency.get(&cur_key).cloned().unwrap_or_default();
            let next_seg = incident
                .iter()
                .copied()
                .filter(|&i| !used[i] && i != last_seg)
                .min()
                .or_else(|| incident.iter().copied().find(|&i| !used[i]));
            match next_seg {
                Some(seg) => {
                    let (pt, nk) = other_endpoint(seg, cur_key);
                    points.push(pt);
                    used[seg] = true;
                    last_seg = seg;
                    cur_key = nk;
                }
                None => break,
            }
        }

        lines.push(ContourPolyline { points, closed: false });
    }

    // Phase 2: remaining unused segments form loops.
    for start_seg in 0..segments.len() {
        if used[start_seg] {
            continue;
        }
        let s0 = segments[start_seg];
        let start_key = key(s0.p0);
        let mut points = vec![s0.p0, s0.p1];
        used[start_seg] = true;
        let mut cur_key = key(s0.p1);
        let mut last_seg = start_seg;

        loop {
            if cur_key == start_key {
                break;
            }
            let incident = adjacency.get(&cur_key).cloned().unwrap_or_default();
            let next_seg = incident
                .iter()
                .copied()
                .filter(|&i| !used[i] && i != last_seg)
                .min()
                .or_else(|| incident.iter().copied().find(|&i| !used[i]));
            match next_seg {
                Some(seg) => {
                    let (pt, nk) = other_endpoint(seg, cur_key);
                    points.push(pt);
                    used[seg] = true;
                    last_seg = seg;
                    cur_key = nk;
                }
                None => break,
            }
        }

        let closed = points.len() > 2 && key(*points.last().unwrap()) == start_key;
        lines.push(ContourPolyline { points, closed });
    }

    lines
}

fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 < 1e-18 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len2;
    let proj = Point { x: a.x + t * dx, y: a.y + t * dy };
    ((p.x - proj.x).powi(2) + (p.y - proj.y).powi(2)).sqrt()
}

fn douglas_peucker_open(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let (first, last) = (points[0], *points.last().unwrap());
    let mut max_dist = 0.0;
    let mut max_idx = 0;
    for (i, &p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = perpendicular_distance(p, first, last);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }
    if max_dist > epsilon {
        let mut left = douglas_peucker_open(&points[..=max_idx], epsilon);
        let right = douglas_peucker_open(&points[max_idx..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn rotate_to_min_start(points: &[Point]) -> Vec<Point> {
    // points[0] == points[last] for a closed ring; rotate the open prefix.
    let ring = &points[..points.len() - 1];
    if ring.is_empty() {
        return points.to_vec();
    }
    let min_idx = (0..ring.len())
        .min_by(|&a, &b| {
            let ka = key(ring[a]);
            let kb = key(ring[b]);
            ka.cmp(&kb)
        })
        .unwrap();
    let mut rotated: Vec<Point> = ring[min_idx..].to_vec();
    rotated.extend_from_slice(&ring[..min_idx]);
    rotated.push(rotated[0]);
    rotated
}

fn simplify_polyline(poly: &ContourPolyline, epsilon: f64) -> ContourPolyline {
    if poly.closed {
        let rotated = rotate_to_min_start(&poly.points);
        let mut simplified = douglas_peucker_open(&rotated, epsilon);
        if simplified.first() != simplified.last() {
            let first = simplified[0];
            simplified.push(first);
        }
        ContourPolyline { points: simplified, closed: true }
    } else {
        ContourPolyline {
            points: douglas_peucker_open(&poly.points, epsilon),
            closed: false,
        }
    }
}

pub fn build_contours(
    tile_heights: &[f32],
    width: usize,
    height: usize,
    levels: &[f64],
    config: &ContoursConfig,
) -> Result<Vec<ContourLevel>, crate::error::IsoCityError> {
    if width == 0 || height == 0 {
        return Err(crate::error::IsoCityError::InvalidInput(
            "contour grid must be non-empty".to_string(),
        ));
    }
    if tile_heights.len() != width * height {
        return Err(crate::error::IsoCityError::InvalidInput(
            "tile height count does not match width*height".to_string(),
        ));
    }
    if tile_heights.iter().any(|h| !h.is_finite()) {
        return Err(crate::error::IsoCityError::InvalidInput(
            "non-finite height in contour input".to_string(),
        ));
    }

    let corners = build_corner_height_grid(tile_heights, width, height);

    let mut out = Vec::with_capacity(levels.len());
    for &level in levels {
        let raw = extract_level_segments(&corners, width, height, level, true);
        let raw = dedupe_degenerate(raw);
        let lines_unsimplified = stitch(raw);
        let mut lines: Vec<ContourPolyline> = lines_unsimplified
            .into_iter()
            .map(|l| simplify_polyline(&l, config.simplify_epsilon))
            .filter(|l| l.points.len() >= MIN_POINTS)
            .collect();
        lines.sort_by(|a, b| key(a.points[0]).cmp(&key(b.points[0])));
        out.push(ContourLevel { level, lines });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_mask_six_produces_one_segment() {
        // A single tile with corners arranged so TR|BR are above level 0.5:
        // need a 2x2 corner grid derived from a 1x1 tile grid (all corners
        // equal the single tile height), so craft the corners directly.
        let corners = vec![0.0, 0.0, 1.0, 1.0];
        let raw = extract_level_segments(&corners, 1, 1, 0.5, true);
        assert_eq!(raw.len(), 1);
    }

    #[test]
    fn flat_field_has_no_contours() {
        let heights = vec![1.0f32; 9];
        let config = ContoursConfig::default();
        let levels = [0.5];
        let result = build_contours(&heights, 3, 3, &levels, &config).unwrap();
        assert!(result[0].lines.is_empty());
    }

    #[test]
    fn mismatched_size_is_invalid_input() {
        let heights = vec![1.0f32; 4];
        let config = ContoursConfig::default();
        let result = build_contours(&heights, 3, 3, &[0.5], &config);
        assert!(result.is_err());
    }

    #[test]
    fn ramp_produces_a_contour_line() {
        let heights: Vec<f32> = (0..16).map(|i| (i / 4) as f32).collect();
        let config = ContoursConfig::default();
        let result = build_contours(&heights, 4, 4, &[1.5], &config).unwrap();
        assert!(!result[0].lines.is_empty());
    }
}

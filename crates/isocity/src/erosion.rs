//! Heightfield erosion: thermal relaxation, river carving, smoothing.
//!
//! All three passes double-buffer so a tile's neighbors always see the
//! previous pass's heights, never a partially-updated row.

use crate::config::{ErosionConfig, HydrologyConfig};
use crate::hydrology::build_hydrology_field;

fn lowest_neighbor(heights: &[f32], width: usize, height: usize, x: usize, y: usize) -> Option<(usize, f32)> {
    let cand = [
        (x as i64 - 1, y as i64),
        (x as i64 + 1, y as i64),
        (x as i64, y as i64 - 1),
        (x as i64, y as i64 + 1),
    ];
    let mut best: Option<(usize, f32)> = None;
    for (nx, ny) in cand {
        if nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height {
            let nidx = ny as usize * width + nx as usize;
            let h = heights[nidx];
            match best {
                None => best = Some((nidx, h)),
                Some((_, bh)) if h < bh => best = Some((nidx, h)),
                _ => {}
            }
        }
    }
    best
}

fn thermal_pass(heights: &mut [f32], width: usize, height: usize, config: &ErosionConfig) {
    for _ in 0..config.thermal_iterations {
        let mut delta = vec![0.0f32; heights.len()];
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                if let Some((nidx, nh)) = lowest_neighbor(heights, width, height, x, y) {
                    let d = heights[idx] - nh;
                    if d > config.thermal_talus {
                        let moved = config.thermal_rate * (d - config.thermal_talus);
                        delta[idx] -= moved;
                        delta[nidx] += moved;
                    }
                }
            }
        }
        for i in 0..heights.len() {
            heights[i] += delta[i];
        }
    }
}

fn river_carve_pass(heights: &mut [f32], width: usize, height: usize, config: &ErosionConfig) {
    let hydro_config = HydrologyConfig::default();
    let field = build_hydrology_field(heights, width, height, &hydro_config);
    let min_accum = 32u32.max((width * height) as u32 / 64);
    let max_accum = field.max_accum.max(min_accum + 1);

    for i in 0..heights.len() {
        if field.accum[i] >= min_accum {
            let t = ((field.accum[i] - min_accum) as f32 / (max_accum - min_accum) as f32).clamp(0.0, 1.0);
            heights[i] -= config.river_carve_depth * t.powf(config.river_carve_power);
        }
    }
}

fn smoothing_pass(heights: &mut [f32], width: usize, height: usize, config: &ErosionConfig) {
    for _ in 0..config.smoothing_iterations {
        let mut next = heights.to_vec();
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let mut sum = 0.0f32;
                let mut count = 0u32;
                for (nx, ny) in [
                    (x as i64 - 1, y as i64),
                    (x as i64 + 1, y as i64),
                    (x as i64, y as i64 - 1),
                    (x as i64, y as i64 + 1),
                ] {
                    if nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height {
                        sum += heights[ny as usize * width + nx as usize];
                        count += 1;
                    }
                }
                if count > 0 {
                    let avg = sum / count as f32;
                    next[idx] = heights[idx] + (avg - heights[idx]) * config.smooth_rate;
                }
            }
        }
        heights.copy_from_slice(&next);
    }
}

pub fn erode(heights: &mut [f32], width: usize, height: usize, config: &ErosionConfig, carve_rivers: bool) {
    thermal_pass(heights, width, height, config);
    if carve_rivers {
        river_carve_pass(heights, width, height, config);
    }
    smoothing_pass(heights, width, height, config);

    let scale = 1.0 / config.quantize_scale;
    for h in heights.iter_mut() {
        *h = (*h / scale).round() * scale;
        *h = h.clamp(crate::world::MIN_HEIGHT, crate::world::MAX_HEIGHT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thermal_pass_reduces_steep_deltas() {
        let mut heights = vec![2.0, 0.0, 0.0, 0.0];
        let config = ErosionConfig {
            thermal_iterations: 1,
            ..Default::default()
        };
        thermal_pass(&mut heights, 2, 2, &config);
        assert!(heights[0] < 2.0);
    }

    #[test]
    fn erosion_keeps_heights_in_bounds() {
        let mut heights = vec![5.0, -5.0, 3.0, -3.0];
        let config = ErosionConfig::default();
        erode(&mut heights, 2, 2, &config, true);
        for h in heights {
            assert!((crate::world::MIN_HEIGHT..=crate::world::MAX_HEIGHT).contains(&h));
        }
    }

    #[test]
    fn smoothing_pulls_spike_toward_neighbors() {
        let mut heights = vec![0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0];
        let config = ErosionConfig {
            thermal_iterations: 0,
            smoothing_iterations: 1,
            ..Default::default()
        };
        smoothing_pass(&mut heights, 3, 3, &config);
        assert!(heights[4] < 2.0);
    }
}

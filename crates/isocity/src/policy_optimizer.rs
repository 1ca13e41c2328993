//! Searches the 5-lever policy space for the best-scoring `SimConfig` tweak.
//!
//! Exhaustive search for small spaces, cross-entropy-method sampling
//! otherwise, evaluated by a `std::thread::scope` worker pool indexed by an
//! atomic work counter. No async runtime anywhere in this module.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

use crate::config::{PolicyOptimizerConfig, SimConfig};
use crate::sim::{apply_policy_to_config, Simulator};
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicyCandidate {
    pub tax_residential: i32,
    pub tax_commercial: i32,
    pub tax_industrial: i32,
    pub maintenance_road: i32,
    pub maintenance_park: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyRange {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyRanges {
    pub tax_residential: PolicyRange,
    pub tax_commercial: PolicyRange,
    pub tax_industrial: PolicyRange,
    pub maintenance_road: PolicyRange,
    pub maintenance_park: PolicyRange,
}

impl Default for PolicyRanges {
    fn default() -> Self {
        let tax = PolicyRange { min: 0, max: 20 };
        let maint = PolicyRange { min: 0, max: 15 };
        Self {
            tax_residential: tax,
            tax_commercial: tax,
            tax_industrial: tax,
            maintenance_road: maint,
            maintenance_park: maint,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub w_money_delta: f64,
    pub w_population: f64,
    pub w_happy_pop: f64,
    pub w_unemployed: f64,
    pub w_congestion_pop: f64,
    pub min_happiness: f32,
    pub min_money_end: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            w_money_delta: 0.001,
            w_population: 1.0,
            w_happy_pop: 2.0,
            w_unemployed: 3.0,
            w_congestion_pop: 1.5,
            min_happiness: 0.1,
            min_money_end: -1_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalResult {
    pub score: f64,
    pub money_end: i64,
    pub population_end: u32,
    pub avg_happiness: f32,
}

pub enum SearchMethod {
    Exhaustive { max_candidates: usize },
    Cem,
}

#[derive(Default)]
pub struct PolicyOptProgress {
    pub evaluated: AtomicUsize,
    pub total: AtomicUsize,
}

fn pack_key(p: &PolicyCandidate) -> u64 {
    (p.tax_residential as u64 & 0xFFF)
        | ((p.tax_commercial as u64 & 0xFFF) << 12)
        | ((p.tax_industrial as u64 & 0xFFF) << 24)
        | ((p.maintenance_road as u64 & 0xFFF) << 36)
        | ((p.maintenance_park as u64 & 0xFFF) << 48)
}

fn clamp_to_ranges(mut p: PolicyCandidate, ranges: &PolicyRanges) -> PolicyCandidate {
    p.tax_residential = p.tax_residential.clamp(ranges.tax_residential.min, ranges.tax_residential.max);
    p.tax_commercial = p.tax_commercial.clamp(ranges.tax_commercial.min, ranges.tax_commercial.max);
    p.tax_industrial = p.tax_industrial.clamp(ranges.tax_industrial.min, ranges.tax_industrial.max);
    p.maintenance_road = p.maintenance_road.clamp(ranges.maintenance_road.min, ranges.maintenance_road.max);
    p.maintenance_park = p.maintenance_park.clamp(ranges.maintenance_park.min, ranges.maintenance_park.max);
    p
}

fn evaluate_candidate(
    base_world: &World,
    base_config: &SimConfig,
    policy: &PolicyCandidate,
    eval_days: u32,
    weights: &ScoreWeights,
) -> EvalResult {
    let mut world = base_world.clone();
    let mut config = *base_config;
    apply_policy_to_config(&mut config, policy);
    let mut sim = Simulator::new(config);

    let money_start = world.stats().money;
    let mut happiness_sum = 0.0f64;

    for _ in 0..eval_days {
        sim.step_once(&mut world);
        happiness_sum += world.stats().happiness as f64;
    }

    let stats = world.stats();
    let avg_happiness = if eval_days > 0 {
        (happiness_sum / eval_days as f64) as f32
    } else {
        stats.happiness
    };

    let money_delta = (stats.money - money_start) as f64;
    let pop = stats.population as f64;
    let unemployed = (stats.population.saturating_sub(stats.employed)) as f64;

    let score = if avg_happiness < weights.min_happiness || stats.money < weights.min_money_end {
        f64::NEG_INFINITY
    } else {
        weights.w_money_delta * money_delta
            + weights.w_population * pop
            + weights.w_happy_pop * avg_happiness as f64 * pop
            - weights.w_unemployed * unemployed
            - weights.w_congestion_pop * stats.traffic_congestion as f64 * pop
    };

    EvalResult {
        score,
        money_end: stats.money,
        population_end: stats.population,
        avg_happiness,
    }
}

/// Strict total order matching spec tie semantics: higher score wins; within
/// `score_epsilon` of each other, the lexicographically-smaller policy wins.
fn better(a: (&PolicyCandidate, f64), b: (&PolicyCandidate, f64), epsilon: f64) -> bool {
    if (a.1 - b.1).abs() > epsilon {
        return a.1 > b.1;
    }
    policy_key_tuple(a.0) < policy_key_tuple(b.0)
}

fn policy_key_tuple(p: &PolicyCandidate) -> (i32, i32, i32, i32, i32) {
    (
        p.tax_residential,
        p.tax_commercial,
        p.tax_industrial,
        p.maintenance_road,
        p.maintenance_park,
    )
}

struct SharedCache {
    map: Mutex<HashMap<u64, EvalResult>>,
}

#[allow(clippy::too_many_arguments)]
fn evaluate_batch(
    batch: &[PolicyCandidate],
    base_world: &World,
    base_config: &SimConfig,
    eval_days: u32,
    weights: &ScoreWeights,
    cache: &SharedCache,
    progress: Option<&PolicyOptProgress>,
    workers: usize,
    score_epsilon: f64,
) -> Vec<EvalResult> {
    let results: Vec<Mutex<Option<EvalResult>>> = (0..batch.len()).map(|_| Mutex::new(None)).collect();
    let next_index = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        let auto_workers = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        let worker_count = if workers == 0 { auto_workers } else { workers }.min(batch.len().max(1));
        for _ in 0..worker_count {
            scope.spawn(|| loop {
                let i = next_index.fetch_add(1, Ordering::Relaxed);
                if i >= batch.len() {
                    break;
                }
                let policy = batch[i];
                let key = pack_key(&policy);

                let cached = cache.map.lock().unwrap().get(&key).copied();
                let result = match cached {
                    Some(r) => r,
                    None => {
                        let r = evaluate_candidate(base_world, base_config, &policy, eval_days, weights);
                        let mut guard = cache.map.lock().unwrap();
                        let better_existing = guard
                            .get(&key)
                            .map(|existing| !better((&policy, r.score), (&policy, existing.score), score_epsilon))
                            .unwrap_or(true);
                        if better_existing {
                            guard.insert(key, r);
                        }
                        r
                    }
                };

                *results[i].lock().unwrap() = Some(result);
                if let Some(p) = progress {
                    p.evaluated.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    results.into_iter().map(|m| m.into_inner().unwrap().unwrap()).collect()
}

#[allow(clippy::too_many_arguments)]
pub fn exhaustive_search(
    base_world: &World,
    base_config: &SimConfig,
    ranges: &PolicyRanges,
    max_candidates: usize,
    eval_days: u32,
    weights: &ScoreWeights,
    progress: Option<&PolicyOptProgress>,
    workers: usize,
    score_epsilon: f64,
) -> Option<(PolicyCandidate, EvalResult)> {
    let mut candidates = Vec::new();
    for tr in ranges.tax_residential.min..=ranges.tax_residential.max {
        for tc in ranges.tax_commercial.min..=ranges.tax_commercial.max {
            for ti in ranges.tax_industrial.min..=ranges.tax_industrial.max {
                for mr in ranges.maintenance_road.min..=ranges.maintenance_road.max {
                    for mp in ranges.maintenance_park.min..=ranges.maintenance_park.max {
                        candidates.push(PolicyCandidate {
                            tax_residential: tr,
                            tax_commercial: tc,
                            tax_industrial: ti,
                            maintenance_road: mr,
                            maintenance_park: mp,
                        });
                        if candidates.len() > max_candidates {
                            return None;
                        }
                    }
                }
            }
        }
    }

    if let Some(p) = progress {
        p.total.store(candidates.len(), Ordering::Relaxed);
    }

    let cache = SharedCache { map: Mutex::new(HashMap::new()) };
    let results = evaluate_batch(&candidates, base_world, base_config, eval_days, weights, &cache, progress, workers, score_epsilon);

    let mut best: Option<(PolicyCandidate, EvalResult)> = None;
    for (policy, result) in candidates.into_iter().zip(results) {
        let is_better = match &best {
            None => true,
            Some((bp, br)) => better((&policy, result.score), (bp, br.score), score_epsilon),
        };
        if is_better {
            best = Some((policy, result));
        }
    }
    best
}

pub struct CemTrace {
    pub best_by_iteration: Vec<(PolicyCandidate, f64)>,
}

pub fn cem_search(
    base_world: &World,
    base_config: &SimConfig,
    ranges: &PolicyRanges,
    config: &PolicyOptimizerConfig,
    eval_days: u32,
    weights: &ScoreWeights,
    seed: u64,
    progress: Option<&PolicyOptProgress>,
) -> (PolicyCandidate, EvalResult, CemTrace) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cache = SharedCache { map: Mutex::new(HashMap::new()) };

    let axes = [
        ranges.tax_residential,
        ranges.tax_commercial,
        ranges.tax_industrial,
        ranges.maintenance_road,
        ranges.maintenance_park,
    ];

    let mut mean: [f64; 5] = axes.map(|r| (r.min as f64 + r.max as f64) / 2.0);
    let mut std: [f64; 5] = axes.map(|r| (r.max - r.min) as f64 / 2.0);

    let mut best: Option<(PolicyCandidate, EvalResult)> = None;
    let mut trace = Vec::new();

    if let Some(p) = progress {
        p.total.store(config.population * config.generations, Ordering::Relaxed);
    }

    for iteration in 0..config.generations {
        let mut batch = Vec::with_capacity(config.population);
        for i in 0..config.population {
            if iteration == 0 && i == 0 {
                if let Some((bp, _)) = &best {
                    batch.push(*bp);
                    continue;
                }
            }
            let explore = rng.gen_bool(config.explore_prob.clamp(0.0, 1.0));
            let sample = if explore {
                PolicyCandidate {
                    tax_residential: rng.gen_range(axes[0].min..=axes[0].max),
                    tax_commercial: rng.gen_range(axes[1].min..=axes[1].max),
                    tax_industrial: rng.gen_range(axes[2].min..=axes[2].max),
                    maintenance_road: rng.gen_range(axes[3].min..=axes[3].max),
                    maintenance_park: rng.gen_range(axes[4].min..=axes[4].max),
                }
            } else {
                let vals: Vec<i32> = (0..5)
                    .map(|k| {
                        let v = mean[k] + rng.gen_range(-1.0f64..1.0) * std[k];
                        v.round() as i32
                    })
                    .collect();
                PolicyCandidate {
                    tax_residential: vals[0],
                    tax_commercial: vals[1],
                    tax_industrial: vals[2],
                    maintenance_road: vals[3],
                    maintenance_park: vals[4],
                }
            };
            batch.push(clamp_to_ranges(sample, ranges));
        }

        let results = evaluate_batch(&batch, base_world, base_config, eval_days, weights, &cache, progress, config.workers, config.score_epsilon);

        let mut ranked: Vec<(PolicyCandidate, EvalResult)> = batch.into_iter().zip(results).collect();
        ranked.sort_by(|a, b| {
            if better((&a.0, a.1.score), (&b.0, b.1.score), config.score_epsilon) {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Greater
            }
        });

        if let Some((p, r)) = ranked.first() {
            let is_better = best
                .as_ref()
                .map(|(bp, br)| better((p, r.score), (bp, br.score), config.score_epsilon))
                .unwrap_or(true);
            if is_better {
                best = Some((*p, *r));
            }
        }
        if let Some((bp, br)) = &best {
            trace.push((*bp, br.score));
        }

        let elite_count = config.elites.min(ranked.len()).max(1);
        let elites = &ranked[..elite_count];
        for k in 0..5 {
            let vals: Vec<f64> = elites
                .iter()
                .map(|(p, _)| match k {
                    0 => p.tax_residential as f64,
                    1 => p.tax_commercial as f64,
                    2 => p.tax_industrial as f64,
                    3 => p.maintenance_road as f64,
                    _ => p.maintenance_park as f64,
                })
                .collect();
            let m = vals.iter().sum::<f64>() / vals.len() as f64;
            let var = vals.iter().map(|v| (v - m).powi(2)).sum::<f64>() / vals.len() as f64;
            mean[k] = m;
            std[k] = (var.sqrt() * config.std_decay).max(0.5);
        }
    }

    let (bp, br) = best.expect("at least one candidate evaluated");
    (bp, br, CemTrace { best_by_iteration: trace })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;

    #[test]
    fn pack_key_is_injective_over_small_range() {
        let a = PolicyCandidate { tax_residential: 1, tax_commercial: 2, tax_industrial: 3, maintenance_road: 4, maintenance_park: 5 };
        let b = PolicyCandidate { tax_residential: 1, tax_commercial: 2, tax_industrial: 3, maintenance_road: 4, maintenance_park: 6 };
        assert_ne!(pack_key(&a), pack_key(&b));
    }

    #[test]
    fn exhaustive_search_picks_best_within_budget() {
        let world = World::new(3, 3, 1);
        let config = SimConfig { width: 3, height: 3, seed: 1, ..Default::default() };
        let ranges = PolicyRanges {
            tax_residential: PolicyRange { min: 0, max: 1 },
            tax_commercial: PolicyRange { min: 0, max: 1 },
            tax_industrial: PolicyRange { min: 0, max: 1 },
            maintenance_road: PolicyRange { min: 0, max: 1 },
            maintenance_park: PolicyRange { min: 0, max: 1 },
        };
        let weights = ScoreWeights::default();
        let result = exhaustive_search(&world, &config, &ranges, 1000, 3, &weights, None, 0, 1e-9);
        assert!(result.is_some());
    }

    #[test]
    fn cem_search_returns_a_best_candidate() {
        let world = World::new(3, 3, 1);
        let config = SimConfig { width: 3, height: 3, seed: 1, ..Default::default() };
        let ranges = PolicyRanges::default();
        let opt_config = PolicyOptimizerConfig { population: 6, elites: 2, generations: 2, ..Default::default() };
        let weights = ScoreWeights::default();
        let (_, result, trace) = cem_search(&world, &config, &ranges, &opt_config, 2, &weights, 42, None);
        assert!(result.score.is_finite() || result.score == f64::NEG_INFINITY);
        assert_eq!(trace.best_by_iteration.len(), opt_config.generations);
    }
}

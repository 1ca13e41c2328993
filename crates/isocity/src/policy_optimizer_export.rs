//! Exports optimizer results to JSON and CSV.
//!
//! One JSON blob for the winning policy plus its score, a top-K CSV, and a
//! per-iteration CEM trace CSV. All floats are emitted with fixed precision
//! so diffs stay stable.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::policy_optimizer::{CemTrace, EvalResult, PolicyCandidate};

#[derive(Serialize)]
struct PolicyJson {
    tax_residential: i32,
    tax_commercial: i32,
    tax_industrial: i32,
    maintenance_road: i32,
    maintenance_park: i32,
    score: f64,
    money_end: i64,
    population_end: u32,
    avg_happiness: f32,
}

pub fn export_policy_optimization_json(policy: &PolicyCandidate, result: &EvalResult) -> Result<String> {
    let record = PolicyJson {
        tax_residential: policy.tax_residential,
        tax_commercial: policy.tax_commercial,
        tax_industrial: policy.tax_industrial,
        maintenance_road: policy.maintenance_road,
        maintenance_park: policy.maintenance_park,
        score: result.score,
        money_end: result.money_end,
        population_end: result.population_end,
        avg_happiness: result.avg_happiness,
    };
    serde_json::to_string_pretty(&record).map_err(|e| crate::error::IsoCityError::Decode(e.to_string()))
}

pub fn export_top_csv(ranked: &[(PolicyCandidate, EvalResult)]) -> String {
    let mut out = String::from(
        "rank,tax_residential,tax_commercial,tax_industrial,maintenance_road,maintenance_park,score,money_end,population_end,avg_happiness\n",
    );
    for (i, (p, r)) in ranked.iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{},{},{},{:.6},{},{},{:.6}\n",
            i + 1,
            p.tax_residential,
            p.tax_commercial,
            p.tax_industrial,
            p.maintenance_road,
            p.maintenance_park,
            r.score,
            r.money_end,
            r.population_end,
            r.avg_happiness
        ));
    }
    out
}

pub fn export_trace_csv(trace: &CemTrace) -> String {
    let mut out = String::from(
        "iteration,tax_residential,tax_commercial,tax_industrial,maintenance_road,maintenance_park,score\n",
    );
    for (i, (p, score)) in trace.best_by_iteration.iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{},{},{},{:.6}\n",
            i, p.tax_residential, p.tax_commercial, p.tax_industrial, p.maintenance_road, p.maintenance_park, score
        ));
    }
    out
}

pub fn write_to_file(contents: &str, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_csv_has_header_and_one_row_per_candidate() {
        let policy = PolicyCandidate {
            tax_residential: 5,
            tax_commercial: 5,
            tax_industrial: 5,
            maintenance_road: 5,
            maintenance_park: 5,
        };
        let result = EvalResult {
            score: 123.456,
            money_end: 1000,
            population_end: 50,
            avg_happiness: 0.7,
        };
        let csv = export_top_csv(&[(policy, result)]);
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn json_export_round_trips_through_serde_value() {
        let policy = PolicyCandidate {
            tax_residential: 1,
            tax_commercial: 2,
            tax_industrial: 3,
            maintenance_road: 4,
            maintenance_park: 5,
        };
        let result = EvalResult {
            score: 1.0,
            money_end: 10,
            population_end: 1,
            avg_happiness: 0.5,
        };
        let json = export_policy_optimization_json(&policy, &result).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tax_residential"], 1);
    }
}

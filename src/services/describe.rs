//! Descriptive statistics per column, one summary row per column.

use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::HashMap;

use crate::models::{
    CategoricalSummary, Column, ColumnData, ColumnSummary, NumericSummary, SummaryStats, Table,
};

pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    table.columns().par_iter().map(summarize_column).collect()
}

pub fn summarize_column(column: &Column) -> ColumnSummary {
    let stats = match &column.data {
        ColumnData::Numeric(values) => SummaryStats::Numeric(summarize_numeric(values)),
        ColumnData::Categorical(values) => SummaryStats::Categorical(summarize_categorical(values)),
    };

    ColumnSummary {
        name: column.name.clone(),
        stats,
    }
}

fn summarize_numeric(values: &[Option<f64>]) -> NumericSummary {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    if count == 0 {
        return NumericSummary {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            q50: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }

    NumericSummary {
        count,
        mean: Statistics::mean(sorted.iter()),
        // sample standard deviation, NaN for a single value
        std: Statistics::std_dev(sorted.iter()),
        min: sorted[0],
        q25: percentile(&sorted, 25.0),
        q50: percentile(&sorted, 50.0),
        q75: percentile(&sorted, 75.0),
        max: sorted[count - 1],
    }
}

fn summarize_categorical(values: &[Option<String>]) -> CategoricalSummary {
    // value -> (occurrences, first position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut count = 0;

    for (idx, value) in values.iter().enumerate() {
        if let Some(value) = value {
            count += 1;
            counts.entry(value.as_str()).or_insert((0, idx)).0 += 1;
        }
    }

    let top = counts
        .iter()
        .max_by(|(_, (ca, ia)), (_, (cb, ib))| ca.cmp(cb).then(ib.cmp(ia)))
        .map(|(value, (freq, _))| (value.to_string(), *freq));

    CategoricalSummary {
        count,
        unique: counts.len(),
        freq: top.as_ref().map(|(_, freq)| *freq),
        top: top.map(|(value, _)| value),
    }
}

/// Percentile of already-sorted values with linear interpolation between
/// closest ranks (NumPy's default).
pub(crate) fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted_values[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;

    if lower == upper {
        sorted_values[lower]
    } else {
        sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
    }
}

//! Pairwise Pearson correlation over the numeric columns of a table.

use crate::models::{Column, ColumnData, CorrelationMatrix, Table};

/// Correlation over every numeric column, using pairwise-complete rows.
///
/// Coefficients that cannot be computed (fewer than two shared rows, or a
/// constant column) are `NaN`. The diagonal is exactly 1.0 for columns with
/// nonzero variance.
pub fn correlation_matrix(table: &Table) -> CorrelationMatrix {
    let columns: Vec<&Column> = table.numeric_columns().collect();
    let series: Vec<&[Option<f64>]> = columns
        .iter()
        .filter_map(|c| match &c.data {
            ColumnData::Numeric(values) => Some(values.as_slice()),
            ColumnData::Categorical(_) => None,
        })
        .collect();

    let n = series.len();
    let mut values = vec![vec![f64::NAN; n]; n];

    for i in 0..n {
        values[i][i] = match pearson(series[i], series[i]) {
            r if r.is_nan() => f64::NAN,
            _ => 1.0,
        };
        for j in (i + 1)..n {
            let r = pearson(series[i], series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: columns.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}

fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (sxy, sxx, syy) = pairs.iter().fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (a, b)| {
        let dx = a - mean_x;
        let dy = b - mean_y;
        (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
    });

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }

    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

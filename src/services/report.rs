use rayon::prelude::*;

use crate::error::AppError;
use crate::models::{
    CorrelationSection, DatasetOverview, DistributionChart, DistributionSection, ReportSections,
    Table,
};
use crate::services::{charts, correlation, describe, distribution, missing};

pub const CORRELATION_UNAVAILABLE: &str =
    "Correlation not available: fewer than 2 numeric columns.";
pub const NO_VALUES_TO_PLOT: &str = "No non-missing values to plot.";

/// Runs the whole report pipeline over one table.
pub fn generate_report(table: &Table) -> Result<ReportSections, AppError> {
    let start = std::time::Instant::now();

    let summaries = describe::describe(table);
    tracing::debug!("Computed {} column summaries", summaries.len());

    let missing = missing::missing_values(table);
    tracing::debug!("{} columns have missing values", missing.entries.len());

    let distributions = distribution_sections(table)?;
    let correlation = correlation_section(table)?;

    let overview = DatasetOverview {
        rows: table.row_count(),
        columns: table.column_count(),
        numeric_columns: distributions.len(),
    };

    tracing::info!(
        "Report generated for {} rows x {} columns in {:?}",
        overview.rows,
        overview.columns,
        start.elapsed()
    );

    Ok(ReportSections {
        overview,
        summaries,
        missing,
        distributions,
        correlation,
    })
}

fn distribution_sections(table: &Table) -> Result<Vec<DistributionSection>, AppError> {
    let numeric: Vec<_> = table.numeric_columns().collect();

    numeric
        .par_iter()
        .map(|column| {
            let chart = match distribution::histogram(&column.numeric_values()) {
                Some(hist) => DistributionChart::Svg(charts::histogram_svg(&column.name, &hist)?),
                None => {
                    tracing::debug!("Column {} has no values to plot", column.name);
                    DistributionChart::Empty {
                        message: NO_VALUES_TO_PLOT.to_string(),
                    }
                }
            };
            Ok::<_, AppError>(DistributionSection {
                column: column.name.clone(),
                chart,
            })
        })
        .collect()
}

fn correlation_section(table: &Table) -> Result<CorrelationSection, AppError> {
    let matrix = correlation::correlation_matrix(table);
    if matrix.size() < 2 {
        return Ok(CorrelationSection::Unavailable {
            message: CORRELATION_UNAVAILABLE.to_string(),
        });
    }

    let svg = charts::heatmap_svg(&matrix)?;
    Ok(CorrelationSection::Heatmap { matrix, svg })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, SummaryStats};

    fn scenario_a() -> Table {
        Table::new(vec![
            Column::numeric("age", vec![Some(23.0), Some(35.0), None, Some(41.0), Some(29.0)]),
            Column::categorical(
                "city",
                ["Lisbon", "Porto", "Lisbon", "Faro", "Braga"]
                    .iter()
                    .map(|s| Some(s.to_string()))
                    .collect(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn mixed_table_with_one_numeric_column() {
        let report = generate_report(&scenario_a()).unwrap();

        assert_eq!(report.summaries.len(), 2);
        assert!(matches!(report.summaries[0].stats, SummaryStats::Numeric(_)));
        assert!(matches!(report.summaries[1].stats, SummaryStats::Categorical(_)));
        assert_eq!(report.missing.entries, vec![("age".to_string(), 1)]);
        assert_eq!(report.distributions.len(), 1);
        assert!(matches!(report.distributions[0].chart, DistributionChart::Svg(_)));
        assert_eq!(
            report.correlation,
            CorrelationSection::Unavailable {
                message: CORRELATION_UNAVAILABLE.to_string()
            }
        );
        assert_eq!(
            report.overview,
            DatasetOverview {
                rows: 5,
                columns: 2,
                numeric_columns: 1
            }
        );
    }

    #[test]
    fn correlated_columns_render_heatmap() {
        let a: Vec<Option<f64>> = (1..=8).map(|v| Some(v as f64)).collect();
        let b = a.iter().map(|v| v.map(|x| x * 2.0)).collect();
        let table = Table::new(vec![Column::numeric("a", a), Column::numeric("b", b)]).unwrap();

        match generate_report(&table).unwrap().correlation {
            CorrelationSection::Heatmap { matrix, svg } => {
                assert!((matrix.get("a", "b").unwrap() - 1.0).abs() < 1e-9);
                assert!(svg.contains("1.00"));
            }
            other => panic!("expected heatmap, got {:?}", other),
        }
    }

    #[test]
    fn all_null_numeric_column_gets_placeholder() {
        let table = Table::new(vec![
            Column::numeric("empty", vec![None, None, None]),
            Column::numeric("x", vec![Some(1.0), Some(2.0), Some(3.0)]),
        ])
        .unwrap();

        let report = generate_report(&table).unwrap();
        assert_eq!(
            report.distributions[0].chart,
            DistributionChart::Empty {
                message: NO_VALUES_TO_PLOT.to_string()
            }
        );
        assert_eq!(report.missing.get("empty"), Some(3));
    }

    #[test]
    fn pipeline_is_deterministic() {
        let table = scenario_a();
        let first = generate_report(&table).unwrap();
        let second = generate_report(&table).unwrap();

        assert_eq!(first.summaries, second.summaries);
        assert_eq!(first.missing, second.missing);
        assert_eq!(first.correlation, second.correlation);
        assert_eq!(first, second);
    }

    #[test]
    fn extreme_magnitudes_still_produce_charts() {
        let table = Table::new(vec![
            Column::numeric("a", vec![Some(1e308), Some(-1e308), Some(0.0)]),
            Column::numeric("b", vec![Some(1.0), Some(2.0), Some(3.0)]),
        ])
        .unwrap();

        let report = generate_report(&table).unwrap();
        assert!(report
            .distributions
            .iter()
            .all(|d| matches!(d.chart, DistributionChart::Svg(_))));
        assert!(matches!(report.correlation, CorrelationSection::Heatmap { .. }));
    }
}

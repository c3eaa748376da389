use crate::models::{MissingReport, Table};

/// Null counts per column, keeping only columns with at least one null.
pub fn missing_values(table: &Table) -> MissingReport {
    let entries = table
        .columns()
        .iter()
        .map(|column| (column.name.clone(), column.null_count()))
        .filter(|(_, nulls)| *nulls > 0)
        .collect();

    MissingReport { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    #[test]
    fn reports_only_columns_with_nulls() {
        let table = Table::new(vec![
            Column::numeric("age", vec![Some(31.0), None, Some(40.0)]),
            Column::categorical("city", vec![Some("a".into()), Some("b".into()), Some("c".into())]),
            Column::categorical("zip", vec![None, None, Some("1000".into())]),
        ])
        .unwrap();

        let report = missing_values(&table);
        assert_eq!(
            report.entries,
            vec![("age".to_string(), 1), ("zip".to_string(), 2)]
        );
        assert_eq!(report.get("city"), None);
    }

    #[test]
    fn complete_table_yields_empty_report() {
        let table = Table::new(vec![Column::numeric("x", vec![Some(1.0), Some(2.0)])]).unwrap();
        assert!(missing_values(&table).is_empty());
    }
}

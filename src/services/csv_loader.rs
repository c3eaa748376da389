use bytes::Bytes;
use polars::prelude::*;
use std::io::Cursor;

use crate::error::AppError;
use crate::models::{Column, Table};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// Markers read as missing, in addition to empty fields.
const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Turns an uploaded CSV into a typed [`Table`].
#[derive(Debug, Clone)]
pub struct CsvLoader {
    infer_schema_rows: usize,
}

impl CsvLoader {
    pub fn new(infer_schema_rows: usize) -> Self {
        Self {
            infer_schema_rows: infer_schema_rows.max(1),
        }
    }

    pub fn load(&self, file_name: &str, data: Bytes) -> Result<Table, AppError> {
        let start = std::time::Instant::now();
        validate_file_name(file_name)?;
        let data = validate_content(data)?;

        tracing::debug!("Parsing {} ({} bytes)", file_name, data.len());
        let df = self.read_dataframe(data)?;
        let table = dataframe_to_table(&df)?;

        tracing::info!(
            "Parsed {} into {} rows x {} columns in {:?}",
            file_name,
            table.row_count(),
            table.column_count(),
            start.elapsed()
        );
        Ok(table)
    }

    /// Types are guessed from the first `infer_schema_rows` rows. When a later
    /// row disagrees, the file is read again with types inferred over every row.
    fn read_dataframe(&self, data: Bytes) -> Result<DataFrame, AppError> {
        match parse_csv(data.clone(), Some(self.infer_schema_rows)) {
            Ok(df) => Ok(df),
            Err(e) => {
                tracing::warn!(
                    "Schema from the first {} rows did not fit ({}), inferring over the whole file",
                    self.infer_schema_rows,
                    e
                );
                parse_csv(data, None).map_err(|e| AppError::ParseFailure(e.to_string()))
            }
        }
    }
}

fn parse_csv(data: Bytes, infer_schema_rows: Option<usize>) -> PolarsResult<DataFrame> {
    let null_values = NullValues::AllColumns(NA_VALUES.iter().map(|s| s.to_string()).collect());

    CsvReader::new(Cursor::new(data))
        .has_header(true)
        .infer_schema(infer_schema_rows)
        .with_null_values(Some(null_values))
        .finish()
}

fn validate_file_name(file_name: &str) -> Result<(), AppError> {
    let is_csv = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        Ok(())
    } else {
        Err(AppError::UnsupportedFileType(format!(
            "'{}' is not a .csv file",
            file_name
        )))
    }
}

fn validate_content(data: Bytes) -> Result<Bytes, AppError> {
    let data = if data.starts_with(UTF8_BOM) {
        data.slice(UTF8_BOM.len()..)
    } else {
        data
    };

    if data.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(AppError::ParseFailure("the file is empty".to_string()));
    }
    if data.contains(&0) || std::str::from_utf8(&data).is_err() {
        return Err(AppError::ParseFailure(
            "the file is not UTF-8 encoded text".to_string(),
        ));
    }
    Ok(data)
}

fn dataframe_to_table(df: &DataFrame) -> Result<Table, AppError> {
    if df.width() == 0 {
        return Err(AppError::ParseFailure("no columns found".to_string()));
    }

    let columns = df
        .get_columns()
        .iter()
        .map(series_to_column)
        .collect::<Result<Vec<_>, AppError>>()?;

    Table::new(columns).map_err(AppError::ParseFailure)
}

fn series_to_column(series: &Series) -> Result<Column, AppError> {
    let name = series.name().to_string();

    if series.dtype().is_numeric() {
        let floats = series.cast(&DataType::Float64)?;
        let values = floats
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(Column::numeric(name, values))
    } else {
        let strings = series.cast(&DataType::String)?;
        let values = strings
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(Column::categorical(name, values))
    }
}

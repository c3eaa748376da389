//! HTML rendering of the single report page.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::models::{
    ColumnSummary, CorrelationSection, DistributionChart, DistributionSection, MissingReport,
    ReportSections, SummaryStats,
};

pub const PAGE_TITLE: &str = "Data Report Generator";
pub const UPLOAD_PROMPT: &str = "Please upload a CSV file to get started.";
pub const UPLOAD_SUCCESS: &str = "File uploaded successfully!";
pub const REPORT_COMPLETE: &str = "All reports have been generated based on your uploaded CSV file.";
pub const NO_MISSING_VALUES: &str = "No missing values found.";

const SUMMARY_HEADERS: [&str; 11] = [
    "count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max",
];

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 0 auto; max-width: 1200px; padding: 1.5rem 2rem; color: #262730; }
h1 { margin-bottom: 1rem; }
h2 { margin-top: 2.2rem; border-bottom: 1px solid #e6e6e6; padding-bottom: .3rem; }
form.upload { border: 1px dashed #aaa; border-radius: 8px; padding: 1rem; background: #fafafa; }
.banner { border-radius: 6px; padding: .8rem 1rem; margin: 1rem 0; }
.banner.success { background: #e8f6ec; color: #1b6b35; }
.banner.warning { background: #fff8e1; color: #8a6100; }
.banner.info { background: #e8f1fb; color: #174a7c; }
table.data { border-collapse: collapse; font-size: .9rem; }
table.data th, table.data td { border: 1px solid #e0e0e0; padding: .3rem .6rem; text-align: right; }
table.data th:first-child, table.data td:first-child { text-align: left; font-weight: 600; }
table.data thead th { background: #f5f5f5; }
.chart { margin: .5rem 0 1.5rem; }
.placeholder { color: #777; font-style: italic; }
"#;

/// What the page shows for one request.
#[derive(Debug, Clone)]
pub enum PageView {
    NoFile {
        warning: Option<String>,
    },
    FileLoaded {
        file_name: String,
        generated_at: DateTime<Utc>,
        report: ReportSections,
    },
}

pub fn render(view: &PageView) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>📊 {}</h1>\n", PAGE_TITLE));
    body.push_str(&upload_form());

    match view {
        PageView::NoFile { warning } => {
            if let Some(warning) = warning {
                body.push_str(&banner("warning", &html_escape(warning)));
            }
            body.push_str(&banner("warning", &format!("👈 {}", UPLOAD_PROMPT)));
        }
        PageView::FileLoaded {
            file_name,
            generated_at,
            report,
        } => {
            body.push_str(&banner(
                "success",
                &format!(
                    "✅ {} <strong>{}</strong>: {} rows × {} columns ({} numeric).",
                    UPLOAD_SUCCESS,
                    html_escape(file_name),
                    report.overview.rows,
                    report.overview.columns,
                    report.overview.numeric_columns
                ),
            ));
            body.push_str(&report_sections(report));
            body.push_str(&banner(
                "info",
                &format!(
                    "✅ {} Generated {}.",
                    REPORT_COMPLETE,
                    generated_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
            ));
        }
    }

    document(&body)
}

/// Generic page for run failures; details stay in the log.
pub fn render_error() -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>📊 {}</h1>\n", PAGE_TITLE));
    body.push_str(&upload_form());
    body.push_str(&banner(
        "warning",
        "Something went wrong while generating the report. Please try again.",
    ));
    document(&body)
}

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        PAGE_TITLE, STYLE, body
    )
}

fn upload_form() -> String {
    "<form class=\"upload\" method=\"post\" action=\"/report\" enctype=\"multipart/form-data\">\n\
     <label for=\"file\">Upload your CSV file</label><br>\n\
     <input id=\"file\" type=\"file\" name=\"file\" accept=\".csv,text/csv\" required>\n\
     <button type=\"submit\">Generate report</button>\n\
     </form>\n"
        .to_string()
}

fn banner(kind: &str, html: &str) -> String {
    format!("<div class=\"banner {}\">{}</div>\n", kind, html)
}

fn report_sections(report: &ReportSections) -> String {
    let mut html = String::new();

    html.push_str("<section id=\"summary\">\n<h2>🔍 Summary Statistics</h2>\n");
    html.push_str(&summary_table(&report.summaries));
    html.push_str("</section>\n");

    html.push_str("<section id=\"missing\">\n<h2>❗ Missing Value Report</h2>\n");
    html.push_str(&missing_table(&report.missing));
    html.push_str("</section>\n");

    html.push_str("<section id=\"histograms\">\n<h2>📊 Histograms for Numerical Data</h2>\n");
    if report.distributions.is_empty() {
        html.push_str("<p class=\"placeholder\">No numeric columns found.</p>\n");
    }
    for section in &report.distributions {
        html.push_str(&distribution_block(section));
    }
    html.push_str("</section>\n");

    html.push_str("<section id=\"correlation\">\n<h2>🔗 Correlation Matrix</h2>\n");
    match &report.correlation {
        CorrelationSection::Heatmap { svg, .. } => {
            let _ = writeln!(html, "<div class=\"chart\">{}</div>", svg);
        }
        CorrelationSection::Unavailable { message } => {
            let _ = writeln!(html, "<p class=\"placeholder\">{}</p>", html_escape(message));
        }
    }
    html.push_str("</section>\n");

    html
}

fn summary_table(summaries: &[ColumnSummary]) -> String {
    let mut html = String::from("<table class=\"data\">\n<thead><tr><th></th>");
    for header in SUMMARY_HEADERS {
        let _ = write!(html, "<th>{}</th>", html_escape(header));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for summary in summaries {
        let _ = write!(html, "<tr><td>{}</td>", html_escape(&summary.name));
        for cell in summary_cells(&summary.stats) {
            let _ = write!(html, "<td>{}</td>", html_escape(&cell));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n");
    html
}

/// Cells in `SUMMARY_HEADERS` order; blank where the statistic does not apply.
fn summary_cells(stats: &SummaryStats) -> Vec<String> {
    let blank = String::new;
    match stats {
        SummaryStats::Numeric(s) => vec![
            s.count.to_string(),
            blank(),
            blank(),
            blank(),
            format_stat(s.mean),
            format_stat(s.std),
            format_stat(s.min),
            format_stat(s.q25),
            format_stat(s.q50),
            format_stat(s.q75),
            format_stat(s.max),
        ],
        SummaryStats::Categorical(s) => {
            let mut cells = vec![
                s.count.to_string(),
                s.unique.to_string(),
                s.top.clone().unwrap_or_default(),
                s.freq.map(|f| f.to_string()).unwrap_or_default(),
            ];
            cells.resize(SUMMARY_HEADERS.len(), blank());
            cells
        }
    }
}

fn missing_table(report: &MissingReport) -> String {
    if report.is_empty() {
        return format!("<p class=\"placeholder\">{}</p>\n", NO_MISSING_VALUES);
    }

    let mut html =
        String::from("<table class=\"data\">\n<thead><tr><th>column</th><th>missing</th></tr></thead>\n<tbody>\n");
    for (column, count) in &report.entries {
        let _ = writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", html_escape(column), count);
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn distribution_block(section: &DistributionSection) -> String {
    let heading = format!("<h3>{}</h3>\n", html_escape(&section.column));
    match &section.chart {
        DistributionChart::Svg(svg) => format!("{}<div class=\"chart\">{}</div>\n", heading, svg),
        DistributionChart::Empty { message } => format!(
            "{}<p class=\"placeholder\">{}</p>\n",
            heading,
            html_escape(message)
        ),
    }
}

/// Six significant digits, `%g` style: trailing zeros trimmed, exponent form
/// below 1e-4 or from 1e15 up. NaN renders blank.
fn format_stat(value: f64) -> String {
    const SIGNIFICANT: i32 = 6;

    if value.is_nan() {
        return String::new();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let exponent = value.abs().log10().floor() as i32;
    if !(-4..15).contains(&exponent) {
        let formatted = format!("{:.*e}", (SIGNIFICANT - 1) as usize, value);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{}", trim_zeros(mantissa), exp),
            None => formatted,
        };
    }

    let decimals = (SIGNIFICANT - 1 - exponent).max(0) as usize;
    trim_zeros(&format!("{:.*}", decimals, value)).to_string()
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Escape HTML special characters
fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

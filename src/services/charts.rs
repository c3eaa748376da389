//! SVG rendering of the histogram and correlation heatmap charts.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::distribution::position;
use crate::error::AppError;
use crate::models::{CorrelationMatrix, Histogram};

const HIST_SIZE: (u32, u32) = (400, 240);
const BAR_FILL: RGBColor = RGBColor(135, 206, 235);
const KDE_LINE: RGBColor = RGBColor(31, 119, 180);

const CELL_SIZE: i32 = 64;
const LABEL_WIDTH: i32 = 110;
const TITLE_HEIGHT: i32 = 34;
const FOOTER_HEIGHT: i32 = 36;
const COLORBAR_WIDTH: i32 = 70;
const LABEL_CHARS: usize = 10;

// coolwarm anchors at -1, 0 and 1
const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);
const UNDEFINED_FILL: RGBColor = RGBColor(245, 245, 245);

fn render_err<E: std::fmt::Display>(err: E) -> AppError {
    AppError::Render(err.to_string())
}

pub fn histogram_svg(column: &str, hist: &Histogram) -> Result<String, AppError> {
    let (x_lo, x_hi) = match (hist.edges.first(), hist.edges.last()) {
        (Some(lo), Some(hi)) if hi > lo => (*lo, *hi),
        _ => return Err(AppError::Render(format!("histogram for '{}' has no bins", column))),
    };

    let curve_max = hist
        .density
        .as_ref()
        .map(|points| points.iter().map(|(_, y)| *y).fold(0.0, f64::max))
        .unwrap_or(0.0);
    let y_max = (hist.max_count() as f64).max(curve_max).max(1.0) * 1.1;

    // A spread too wide for f64 is drawn in bin units and labelled back in data units.
    let in_data_units = (x_hi - x_lo).is_finite();
    let bins = hist.counts.len() as f64;
    let to_axis = |v: f64| {
        if in_data_units {
            v
        } else {
            position(v, x_lo, x_hi) * bins
        }
    };
    let from_axis = |x: f64| {
        let t = x / bins;
        x_lo * (1.0 - t) + x_hi * t
    };
    let wide_label = |x: &f64| format!("{:.2e}", from_axis(*x));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, HIST_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Distribution of {}", column), ("sans-serif", 15).into_font())
            .margin(10)
            .x_label_area_size(36)
            .y_label_area_size(44)
            .build_cartesian_2d(to_axis(x_lo)..to_axis(x_hi), 0f64..y_max)
            .map_err(render_err)?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(column)
            .y_desc("Frequency")
            .x_labels(6)
            .y_labels(5)
            .label_style(("sans-serif", 11).into_font())
            .axis_desc_style(("sans-serif", 12).into_font())
            .bold_line_style(RGBColor(225, 225, 225))
            .light_line_style(WHITE);
        if !in_data_units {
            mesh.x_label_formatter(&wide_label);
        }
        mesh.draw().map_err(render_err)?;

        let bars = hist.counts.iter().enumerate().map(|(i, &count)| {
            [
                (to_axis(hist.edges[i]), 0.0),
                (to_axis(hist.edges[i + 1]), count as f64),
            ]
        });

        chart
            .draw_series(bars.clone().map(|corners| Rectangle::new(corners, BAR_FILL.filled())))
            .map_err(render_err)?;
        chart
            .draw_series(bars.map(|corners| Rectangle::new(corners, BLACK.stroke_width(1))))
            .map_err(render_err)?;

        if let Some(points) = &hist.density {
            chart
                .draw_series(LineSeries::new(
                    points.iter().map(|&(x, y)| (to_axis(x), y)),
                    KDE_LINE.stroke_width(2),
                ))
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }

    Ok(svg)
}

pub fn heatmap_svg(matrix: &CorrelationMatrix) -> Result<String, AppError> {
    let n = matrix.size() as i32;
    if n == 0 {
        return Err(AppError::Render("correlation matrix is empty".to_string()));
    }

    let grid = n * CELL_SIZE;
    let width = (LABEL_WIDTH + grid + COLORBAR_WIDTH) as u32;
    let height = (TITLE_HEIGHT + grid + FOOTER_HEIGHT) as u32;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let centered = Pos::new(HPos::Center, VPos::Center);
        let title_style = ("sans-serif", 15).into_font().color(&BLACK).pos(centered);
        let label_style = ("sans-serif", 11).into_font().color(&BLACK);
        let annot = ("sans-serif", 11).into_font();

        root.draw(&Text::new(
            "Correlation Heatmap",
            (LABEL_WIDTH + grid / 2, TITLE_HEIGHT / 2),
            title_style,
        ))
        .map_err(render_err)?;

        for (i, row) in matrix.values.iter().enumerate() {
            let y0 = TITLE_HEIGHT + i as i32 * CELL_SIZE;

            root.draw(&Text::new(
                short_label(&matrix.columns[i]),
                (LABEL_WIDTH - 6, y0 + CELL_SIZE / 2),
                label_style.clone().pos(Pos::new(HPos::Right, VPos::Center)),
            ))
            .map_err(render_err)?;

            for (j, &r) in row.iter().enumerate() {
                let x0 = LABEL_WIDTH + j as i32 * CELL_SIZE;
                let cell = [(x0, y0), (x0 + CELL_SIZE, y0 + CELL_SIZE)];

                root.draw(&Rectangle::new(cell, coolwarm(r).filled()))
                    .map_err(render_err)?;
                root.draw(&Rectangle::new(cell, WHITE.stroke_width(1)))
                    .map_err(render_err)?;

                if !r.is_nan() {
                    let text_color = if r.abs() > 0.6 { &WHITE } else { &BLACK };
                    root.draw(&Text::new(
                        format!("{:.2}", r),
                        (x0 + CELL_SIZE / 2, y0 + CELL_SIZE / 2),
                        annot.color(text_color).pos(centered),
                    ))
                    .map_err(render_err)?;
                }
            }
        }

        for (j, name) in matrix.columns.iter().enumerate() {
            root.draw(&Text::new(
                short_label(name),
                (LABEL_WIDTH + j as i32 * CELL_SIZE + CELL_SIZE / 2, TITLE_HEIGHT + grid + 6),
                label_style.clone().pos(Pos::new(HPos::Center, VPos::Top)),
            ))
            .map_err(render_err)?;
        }

        draw_colorbar(&root, LABEL_WIDTH + grid + 16, TITLE_HEIGHT, grid)?;
        root.present().map_err(render_err)?;
    }

    Ok(svg)
}

fn draw_colorbar(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    x: i32,
    y: i32,
    height: i32,
) -> Result<(), AppError> {
    const STEPS: i32 = 40;
    let bar_width = 14;
    let step_height = (height as f64 / STEPS as f64).max(1.0);

    for k in 0..STEPS {
        // top of the bar is +1
        let r = 1.0 - 2.0 * (k as f64 + 0.5) / STEPS as f64;
        let top = y + (k as f64 * step_height) as i32;
        let bottom = y + ((k + 1) as f64 * step_height).ceil() as i32;
        root.draw(&Rectangle::new([(x, top), (x + bar_width, bottom)], coolwarm(r).filled()))
            .map_err(render_err)?;
    }

    let tick_style = ("sans-serif", 10)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    for (label, offset) in [("1.0", 0), ("0.0", height / 2), ("-1.0", height)] {
        root.draw(&Text::new(label, (x + bar_width + 4, y + offset), tick_style.clone()))
            .map_err(render_err)?;
    }

    Ok(())
}

/// Diverging blue-grey-red scale over [-1, 1]; undefined values are light grey.
fn coolwarm(r: f64) -> RGBColor {
    if r.is_nan() {
        return UNDEFINED_FILL;
    }

    let r = r.clamp(-1.0, 1.0);
    let (from, to, t) = if r < 0.0 {
        (COLD, NEUTRAL, r + 1.0)
    } else {
        (NEUTRAL, WARM, r)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;

    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

fn short_label(name: &str) -> String {
    if name.chars().count() <= LABEL_CHARS {
        name.to_string()
    } else {
        let mut label: String = name.chars().take(LABEL_CHARS - 1).collect();
        label.push('…');
        label
    }
}

//! SVG chart rendering with plotters.

use crate::error::{AppError, Result};
use crate::reports::stats::{BoxStats, GaussianKde, Histogram};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Display;
use std::path::Path;

const FONT: &str = "sans-serif";
const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);
const BOX_COLOR: RGBColor = RGBColor(166, 206, 227);
const MISSING_COLOR: RGBColor = RGBColor(200, 200, 200);

const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

fn chart_err<E: Display>(err: E) -> AppError {
    AppError::Report(err.to_string())
}

/// Histogram of ages with a kernel density curve scaled to counts
pub fn age_distribution(ages: &[f64], bins: usize, path: &Path) -> Result<()> {
    let hist = Histogram::new(ages, bins)
        .ok_or_else(|| AppError::Report("no Age values to plot".to_string()))?;
    let lo = hist.edges[0];
    let hi = hist.edges[hist.edges.len() - 1];

    let scale = ages.len() as f64 * hist.bin_width();
    let density: Vec<(f64, f64)> = GaussianKde::new(ages)
        .map(|kde| {
            kde.curve(lo, hi, 200)
                .into_iter()
                .map(|(x, d)| (x, d * scale))
                .collect()
        })
        .unwrap_or_default();

    let y_max = density
        .iter()
        .map(|(_, y)| *y)
        .fold(hist.max_count() as f64, f64::max)
        * 1.1;

    let root = SVGBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Age Distribution", (FONT, 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(lo..hi, 0f64..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Age")
        .y_desc("Count")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
            Rectangle::new(
                [(hist.edges[i], 0.0), (hist.edges[i + 1], count as f64)],
                BAR_COLOR.filled(),
            )
        }))
        .map_err(chart_err)?;
    chart
        .draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
            Rectangle::new(
                [(hist.edges[i], 0.0), (hist.edges[i + 1], count as f64)],
                BLACK.stroke_width(1),
            )
        }))
        .map_err(chart_err)?;

    if !density.is_empty() {
        chart
            .draw_series(LineSeries::new(density, BLUE.stroke_width(2)))
            .map_err(chart_err)?;
    }

    root.present().map_err(chart_err)?;
    Ok(())
}

/// One box plot per group, in the order given
pub fn box_plot(groups: &[(String, Vec<f64>)], y_desc: &str, path: &Path) -> Result<()> {
    let boxes: Vec<(&str, BoxStats)> = groups
        .iter()
        .filter_map(|(name, values)| BoxStats::new(values).map(|stats| (name.as_str(), stats)))
        .collect();
    if boxes.is_empty() {
        return Err(AppError::Report(format!("no {y_desc} values to plot")));
    }

    let (y_lo, y_hi) = boxes
        .iter()
        .flat_map(|(_, b)| {
            b.outliers
                .iter()
                .copied()
                .chain([b.whisker_low, b.whisker_high])
        })
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let pad = ((y_hi - y_lo) * 0.05).max(1.0);

    let n = boxes.len();
    let labels: Vec<&str> = boxes.iter().map(|(name, _)| *name).collect();

    let root = SVGBackend::new(path, (1100, 650)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{y_desc} by Department"), (FONT, 24))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), (y_lo - pad)..(y_hi + pad))
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x: &f64| {
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < n {
                labels[i as usize].to_string()
            } else {
                String::new()
            }
        })
        .x_label_style((FONT, 11))
        .x_desc("Department")
        .y_desc(y_desc)
        .draw()
        .map_err(chart_err)?;

    let half = 0.3;
    let cap = 0.15;
    for (i, (_, b)) in boxes.iter().enumerate() {
        let x = i as f64;

        chart
            .draw_series([
                Rectangle::new([(x - half, b.q1), (x + half, b.q3)], BOX_COLOR.filled()),
                Rectangle::new([(x - half, b.q1), (x + half, b.q3)], BLACK.stroke_width(1)),
            ])
            .map_err(chart_err)?;

        chart
            .draw_series([
                PathElement::new(vec![(x - half, b.median), (x + half, b.median)], RED.stroke_width(2)),
                PathElement::new(vec![(x, b.q1), (x, b.whisker_low)], BLACK.stroke_width(1)),
                PathElement::new(vec![(x, b.q3), (x, b.whisker_high)], BLACK.stroke_width(1)),
                PathElement::new(
                    vec![(x - cap, b.whisker_low), (x + cap, b.whisker_low)],
                    BLACK.stroke_width(1),
                ),
                PathElement::new(
                    vec![(x - cap, b.whisker_high), (x + cap, b.whisker_high)],
                    BLACK.stroke_width(1),
                ),
            ])
            .map_err(chart_err)?;

        chart
            .draw_series(
                b.outliers
                    .iter()
                    .map(|&v| Circle::new((x, v), 3, BLACK.stroke_width(1))),
            )
            .map_err(chart_err)?;
    }

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Annotated heatmap of a correlation matrix with a colour bar
pub fn correlation_heatmap(
    names: &[&str],
    matrix: &[Vec<Option<f64>>],
    path: &Path,
) -> Result<()> {
    let n = names.len();
    if n == 0 {
        return Err(AppError::Report("no numeric columns to correlate".to_string()));
    }

    let cell: i32 = if n > 12 { 40 } else { 60 };
    let longest = names.iter().map(|s| s.chars().count()).max().unwrap_or(0) as i32;
    let label_space = longest * 7 + 20;
    let grid = cell * n as i32;
    let (left, top) = (label_space, 60);
    let bar_x = left + grid + 30;

    let width = (bar_x + 90) as u32;
    let height = (top + grid + label_space + 20) as u32;

    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let centered = Pos::new(HPos::Center, VPos::Center);
    root.draw(&Text::new(
        "Correlation Heatmap",
        (width as i32 / 2, top / 2),
        (FONT, 24).into_font().color(&BLACK).pos(centered),
    ))
    .map_err(chart_err)?;

    for (row, values) in matrix.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            let x0 = left + col as i32 * cell;
            let y0 = top + row as i32 * cell;

            let (fill, label) = match value {
                Some(r) => (coolwarm(*r), format!("{r:.2}")),
                None => (MISSING_COLOR, "nan".to_string()),
            };
            let ink = match value {
                Some(r) if r.abs() > 0.6 => WHITE,
                _ => BLACK,
            };

            root.draw(&Rectangle::new([(x0, y0), (x0 + cell, y0 + cell)], fill.filled()))
                .map_err(chart_err)?;
            root.draw(&Rectangle::new(
                [(x0, y0), (x0 + cell, y0 + cell)],
                WHITE.stroke_width(1),
            ))
            .map_err(chart_err)?;
            root.draw(&Text::new(
                label,
                (x0 + cell / 2, y0 + cell / 2),
                (FONT, 12).into_font().color(&ink).pos(centered),
            ))
            .map_err(chart_err)?;
        }
    }

    for (i, name) in names.iter().enumerate() {
        let offset = i as i32 * cell + cell / 2;
        root.draw(&Text::new(
            name.to_string(),
            (left - 8, top + offset),
            (FONT, 12)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(chart_err)?;
        root.draw(&Text::new(
            name.to_string(),
            (left + offset, top + grid + 8),
            (FONT, 12)
                .into_font()
                .transform(FontTransform::Rotate90)
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        ))
        .map_err(chart_err)?;
    }

    // Colour bar, +1 at the top
    let steps = 50;
    let step_height = grid as f64 / steps as f64;
    for s in 0..steps {
        let value = 1.0 - 2.0 * (s as f64 + 0.5) / steps as f64;
        let y0 = top + (s as f64 * step_height) as i32;
        let y1 = top + ((s + 1) as f64 * step_height).ceil() as i32;
        root.draw(&Rectangle::new(
            [(bar_x, y0), (bar_x + 20, y1)],
            coolwarm(value).filled(),
        ))
        .map_err(chart_err)?;
    }
    for (value, y) in [(1.0, top), (0.0, top + grid / 2), (-1.0, top + grid)] {
        root.draw(&Text::new(
            format!("{value:.1}"),
            (bar_x + 26, y),
            (FONT, 12)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        ))
        .map_err(chart_err)?;
    }

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Diverging blue-white-red colour for a correlation in [-1, 1]
pub fn coolwarm(value: f64) -> RGBColor {
    let v = if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) };
    let (from, to, t) = if v < 0.0 {
        (COOL, NEUTRAL, v + 1.0)
    } else {
        (NEUTRAL, WARM, v)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

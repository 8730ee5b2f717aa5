//! SVG output for a single layer.
//!
//! The document is written as plain text; coordinates are projected through
//! [`Viewport`] so both axes share one scale.

use std::fmt::Write;
use std::path::PathBuf;

use lib_layercom::glam::DVec2;
use lib_layercom::render::{PathBounds, PathRenderer};
use tracing::info;

use super::{PlotError, Viewport};
use crate::config::PlotConfig;

const GRID_STEP_MM: f64 = 10.0;
const MAX_GRID_LINES: usize = 200;
const VERTEX_RADIUS: f64 = 1.5;
const MARKER_RADIUS: f64 = 6.0;

/// Saves the layer plot to a file rather than displaying it.
pub struct SvgRenderer {
    path: PathBuf,
    style: PlotConfig,
}

impl SvgRenderer {
    pub fn new(path: PathBuf, style: PlotConfig) -> Self {
        SvgRenderer { path, style }
    }
}

impl PathRenderer for SvgRenderer {
    type Error = PlotError;

    fn render(&mut self, path: &[DVec2], marker: Option<DVec2>) -> Result<(), PlotError> {
        let document = svg_document(path, marker, &self.style);
        std::fs::write(&self.path, document).map_err(|source| PlotError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "wrote layer plot");
        Ok(())
    }
}

/// Picks a grid spacing that gives a readable number of lines over `extent`.
fn grid_step(extent: f64) -> f64 {
    let mut step = GRID_STEP_MM;
    if !(extent.is_finite() && extent > 0.0) {
        return step;
    }
    while extent / step > 20.0 {
        step *= 10.0;
    }
    while extent / step < 2.0 {
        step /= 10.0;
    }
    step
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = (-step.log10().floor()).max(0.0) as usize;
    // Avoid "-0".
    let value = if value.abs() < step * 1e-6 { 0.0 } else { value };
    format!("{:.*}", decimals, value)
}

fn write_grid(out: &mut String, viewport: &Viewport, size: DVec2, margin: f64) {
    let visible = viewport.visible();
    let extent = visible.size().max_element();
    let step = grid_step(extent);

    let mut lines = String::new();
    let mut labels = String::new();

    let start_x = (visible.min.x / step).ceil() as i64;
    let start_y = (visible.min.y / step).ceil() as i64;

    for i in 0..MAX_GRID_LINES as i64 {
        let x = (start_x + i) as f64 * step;
        if x > visible.max.x {
            break;
        }
        let sx = viewport.project(DVec2::new(x, 0.0)).x;
        if sx < margin || sx > size.x - margin {
            continue;
        }
        let _ = write!(lines, "M {:.2} {:.2} V {:.2} ", sx, margin, size.y - margin);
        let _ = writeln!(
            labels,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
            sx,
            size.y - margin + 16.0,
            format_tick(x, step)
        );
    }

    for i in 0..MAX_GRID_LINES as i64 {
        let y = (start_y + i) as f64 * step;
        if y > visible.max.y {
            break;
        }
        let sy = viewport.project(DVec2::new(0.0, y)).y;
        if sy < margin || sy > size.y - margin {
            continue;
        }
        let _ = write!(lines, "M {:.2} {:.2} H {:.2} ", margin, sy, size.x - margin);
        let _ = writeln!(
            labels,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="end">{}</text>"#,
            margin - 6.0,
            sy + 4.0,
            format_tick(y, step)
        );
    }

    let _ = writeln!(
        out,
        r##"<path d="{}" stroke="#d0d0d0" stroke-width="1" fill="none"/>"##,
        lines.trim_end()
    );
    let _ = writeln!(
        out,
        r##"<g font-family="sans-serif" font-size="11" fill="#404040">"##
    );
    out.push_str(&labels);
    let _ = writeln!(out, "</g>");
}

pub fn svg_document(path: &[DVec2], marker: Option<DVec2>, style: &PlotConfig) -> String {
    let size = DVec2::new(style.width as f64, style.height as f64);
    let mut bounds = PathBounds::from_points(path.iter().copied()).unwrap_or(PathBounds {
        min: DVec2::ZERO,
        max: DVec2::ZERO,
    });
    if let Some(m) = marker {
        bounds.include(m);
    }
    let viewport = Viewport::fit(&bounds, size, style.margin, 1.0);

    let mut out = String::with_capacity(1024 + path.len() * 48);
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = style.width,
        h = style.height
    );
    let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#);

    write_grid(&mut out, &viewport, size, style.margin);

    let _ = writeln!(
        out,
        r#"<rect x="{m:.2}" y="{m:.2}" width="{w:.2}" height="{h:.2}" stroke="black" fill="none"/>"#,
        m = style.margin,
        w = size.x - 2.0 * style.margin,
        h = size.y - 2.0 * style.margin
    );

    let mut points = String::with_capacity(path.len() * 16);
    for p in path {
        let s = viewport.project(*p);
        let _ = write!(points, "{:.2},{:.2} ", s.x, s.y);
    }
    let _ = writeln!(
        out,
        r#"<polyline id="toolpath" points="{}" stroke="{}" stroke-width="1" fill="none"/>"#,
        points.trim_end(),
        style.path_color
    );

    let _ = writeln!(out, r#"<g id="vertices" fill="{}">"#, style.path_color);
    for p in path {
        let s = viewport.project(*p);
        let _ = writeln!(
            out,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{}"/>"#,
            s.x, s.y, VERTEX_RADIUS
        );
    }
    let _ = writeln!(out, "</g>");

    if let Some(m) = marker {
        let s = viewport.project(m);
        let _ = writeln!(
            out,
            r#"<circle id="center-of-mass" cx="{:.2}" cy="{:.2}" r="{}" fill="{}"/>"#,
            s.x, s.y, MARKER_RADIUS, style.marker_color
        );
    }

    write_labels(&mut out, size, style, marker.is_some());

    let _ = writeln!(out, "</svg>");
    out
}

fn write_labels(out: &mut String, size: DVec2, style: &PlotConfig, has_marker: bool) {
    let m = style.margin;
    let _ = writeln!(out, r#"<g font-family="sans-serif" fill="black">"#);
    let _ = writeln!(
        out,
        r#"<text x="{:.2}" y="{:.2}" font-size="16" text-anchor="middle">G-code Layer Visualization</text>"#,
        size.x / 2.0,
        m / 2.0
    );
    let _ = writeln!(
        out,
        r#"<text x="{:.2}" y="{:.2}" font-size="13" text-anchor="middle">X (mm)</text>"#,
        size.x / 2.0,
        size.y - m / 4.0
    );
    let _ = writeln!(
        out,
        r#"<text x="{x:.2}" y="{y:.2}" font-size="13" text-anchor="middle" transform="rotate(-90 {x:.2} {y:.2})">Y (mm)</text>"#,
        x = m / 4.0,
        y = size.y / 2.0
    );

    // Legend, top-right inside the plot frame.
    let lx = size.x - m - 150.0;
    let ly = m + 16.0;
    let _ = writeln!(
        out,
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}"/>"#,
        lx,
        ly - 4.0,
        lx + 24.0,
        ly - 4.0,
        style.path_color
    );
    let _ = writeln!(
        out,
        r#"<text x="{:.2}" y="{:.2}" font-size="12">Toolpath</text>"#,
        lx + 30.0,
        ly
    );
    if has_marker {
        let _ = writeln!(
            out,
            r#"<circle cx="{:.2}" cy="{:.2}" r="5" fill="{}"/>"#,
            lx + 12.0,
            ly + 14.0,
            style.marker_color
        );
        let _ = writeln!(
            out,
            r#"<text x="{:.2}" y="{:.2}" font-size="12">Center of Mass</text>"#,
            lx + 30.0,
            ly + 18.0
        );
    }
    let _ = writeln!(out, "</g>");
}

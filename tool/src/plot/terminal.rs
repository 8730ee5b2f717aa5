use std::io::{self, IsTerminal, Write};

use lib_layercom::glam::DVec2;
use lib_layercom::render::{PathBounds, PathRenderer};

use super::{PlotError, Viewport};

const PATH_GLYPH: char = '.';
const VERTEX_GLYPH: char = '+';
const MARKER_GLYPH: char = '@';

// Character cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;
const MIN_COLS: usize = 20;
const MIN_ROWS: usize = 10;
const FALLBACK_SIZE: (usize, usize) = (78, 30);

struct Canvas {
    cols: usize,
    rows: usize,
    cells: Vec<char>,
}

impl Canvas {
    fn new(cols: usize, rows: usize) -> Self {
        Canvas {
            cols,
            rows,
            cells: vec![' '; cols * rows],
        }
    }

    fn index(&self, p: DVec2) -> Option<usize> {
        let (c, r) = (p.x.round(), p.y.round());
        if c < 0.0 || r < 0.0 || c >= self.cols as f64 || r >= self.rows as f64 {
            return None;
        }
        Some(r as usize * self.cols + c as usize)
    }

    fn plot(&mut self, p: DVec2, glyph: char) {
        if let Some(i) = self.index(p) {
            self.cells[i] = glyph;
        }
    }

    fn plot_blank(&mut self, p: DVec2, glyph: char) {
        if let Some(i) = self.index(p) {
            if self.cells[i] == ' ' {
                self.cells[i] = glyph;
            }
        }
    }

    fn line(&mut self, a: DVec2, b: DVec2, glyph: char) {
        let steps = (b - a).abs().max_element().ceil().max(1.0) as usize;
        for i in 0..=steps {
            self.plot_blank(a.lerp(b, i as f64 / steps as f64), glyph);
        }
    }

    fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.chunks(self.cols).map(|row| row.iter().collect())
    }
}

/// Draws the layer with text characters and, when attached to an
/// interactive terminal, waits for Enter before returning.
pub struct TerminalRenderer<W: Write> {
    out: W,
    size: Option<(usize, usize)>,
    wait: bool,
}

/// Where a terminal plot is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotStream {
    Stdout,
    Stderr,
}

impl TerminalRenderer<Box<dyn Write>> {
    pub fn to_stream(stream: PlotStream) -> Self {
        let out: Box<dyn Write> = match stream {
            PlotStream::Stdout => Box::new(io::stdout()),
            PlotStream::Stderr => Box::new(io::stderr()),
        };
        TerminalRenderer::new(out)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        TerminalRenderer {
            out,
            size: None,
            wait: true,
        }
    }

    /// Fixes the plot area instead of following the terminal size.
    pub fn with_size(mut self, cols: usize, rows: usize) -> Self {
        self.size = Some((cols.max(MIN_COLS), rows.max(MIN_ROWS)));
        self
    }

    pub fn wait_for_dismiss(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    fn canvas_size(&self) -> (usize, usize) {
        self.size.unwrap_or_else(|| {
            term_size::dimensions()
                // Room for the frame, legend and prompt.
                .map(|(w, h)| {
                    (
                        w.saturating_sub(2).max(MIN_COLS),
                        h.saturating_sub(7).max(MIN_ROWS),
                    )
                })
                .unwrap_or(FALLBACK_SIZE)
        })
    }

    fn draw(&self, path: &[DVec2], marker: Option<DVec2>) -> Canvas {
        let (cols, rows) = self.canvas_size();
        let mut canvas = Canvas::new(cols, rows);

        let mut bounds = match PathBounds::from_points(path.iter().copied()) {
            Some(bounds) => bounds,
            None => return canvas,
        };
        if let Some(m) = marker {
            bounds.include(m);
        }

        // Cell centers run from 0 to cols-1 / rows-1.
        let surface = DVec2::new((cols - 1) as f64, (rows - 1) as f64);
        let viewport = Viewport::fit(&bounds, surface, 1.0, CELL_ASPECT);
        let projected = path.iter().map(|p| viewport.project(*p)).collect::<Vec<_>>();

        for pair in projected.windows(2) {
            canvas.line(pair[0], pair[1], PATH_GLYPH);
        }
        for p in &projected {
            canvas.plot(*p, VERTEX_GLYPH);
        }
        if let Some(m) = marker {
            canvas.plot(viewport.project(m), MARKER_GLYPH);
        }

        canvas
    }
}

impl<W: Write> PathRenderer for TerminalRenderer<W> {
    type Error = PlotError;

    fn render(&mut self, path: &[DVec2], marker: Option<DVec2>) -> Result<(), PlotError> {
        let canvas = self.draw(path, marker);
        let frame = "-".repeat(canvas.cols);

        writeln!(self.out, "G-code Layer Visualization")?;
        writeln!(self.out, "+{frame}+")?;
        for row in canvas.rows() {
            writeln!(self.out, "|{row}|")?;
        }
        writeln!(self.out, "+{frame}+")?;

        if let Some(bounds) = PathBounds::from_points(path.iter().copied()) {
            writeln!(
                self.out,
                " X (mm): {:.3} .. {:.3}   Y (mm): {:.3} .. {:.3}",
                bounds.min.x, bounds.max.x, bounds.min.y, bounds.max.y
            )?;
        }
        write!(
            self.out,
            " {VERTEX_GLYPH}{PATH_GLYPH} Toolpath ({} points)",
            path.len()
        )?;
        if let Some(m) = marker {
            write!(
                self.out,
                "   {MARKER_GLYPH} Center of Mass ({:.3}, {:.3})",
                m.x, m.y
            )?;
        }
        writeln!(self.out)?;

        if self.wait && io::stdin().is_terminal() {
            write!(self.out, "Press Enter to close the plot.")?;
            self.out.flush()?;
            let mut buf = String::new();
            io::stdin().read_line(&mut buf)?;
        }
        self.out.flush()?;

        Ok(())
    }
}

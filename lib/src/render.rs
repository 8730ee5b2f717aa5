//! Drawing boundary for an analyzed layer.
//!
//! The library never draws anything itself. Callers supply a
//! [`PathRenderer`] and hand it the layer through [`render_layer`], which is
//! where the empty-layer case is decided.

use glam::DVec2;
use tracing::debug;

use crate::centroid::Centroid;
use crate::layer::Sample;

/// A surface able to show one toolpath and an optional marked point.
pub trait PathRenderer {
    type Error;

    /// `path` is never empty and is in toolpath order.
    fn render(&mut self, path: &[DVec2], marker: Option<DVec2>) -> Result<(), Self::Error>;
}

impl<R: PathRenderer + ?Sized> PathRenderer for Box<R> {
    type Error = R::Error;

    fn render(&mut self, path: &[DVec2], marker: Option<DVec2>) -> Result<(), Self::Error> {
        (**self).render(path, marker)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Drawn,
    NothingToDisplay,
}

/// Hands a layer to `renderer`, unless there is nothing to draw.
pub fn render_layer<R: PathRenderer + ?Sized>(
    renderer: &mut R,
    samples: &[Sample],
    centroid: Option<&Centroid>,
) -> Result<RenderOutcome, R::Error> {
    if samples.is_empty() {
        debug!("empty layer, skipping render");
        return Ok(RenderOutcome::NothingToDisplay);
    }

    let path = samples.iter().map(Sample::position).collect::<Vec<_>>();
    renderer.render(&path, centroid.map(Centroid::position))?;
    Ok(RenderOutcome::Drawn)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub path: Vec<DVec2>,
    pub marker: Option<DVec2>,
}

/// Keeps every call instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathRenderer for RecordingRenderer {
    type Error = std::convert::Infallible;

    fn render(&mut self, path: &[DVec2], marker: Option<DVec2>) -> Result<(), Self::Error> {
        self.calls.push(RenderCall {
            path: path.to_vec(),
            marker,
        });
        Ok(())
    }
}

/// Axis-aligned extents of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl PathBounds {
    pub fn from_points<I: IntoIterator<Item = DVec2>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = PathBounds {
            min: first,
            max: first,
        };
        for p in points {
            bounds.include(p);
        }
        Some(bounds)
    }

    pub fn include(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

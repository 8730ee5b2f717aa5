use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glam::DVec2;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::gcode::{GCodeReadError, GCodeReader, MotionCommand};

/// A single toolpath point on the analyzed layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    /// Material fed since the previous `E` word anywhere in the file.
    pub extrusion_delta: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, extrusion_delta: f64) -> Self {
        Sample {
            x,
            y,
            extrusion_delta,
        }
    }

    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Selects which layer heights count as "the" layer.
///
/// The default tolerance of zero means a height must compare equal, bit for
/// bit as parsed, to `height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerTarget {
    pub height: f64,
    pub tolerance: f64,
}

impl LayerTarget {
    pub fn exact(height: f64) -> Self {
        LayerTarget {
            height,
            tolerance: 0.0,
        }
    }

    pub fn with_tolerance(self, tolerance: f64) -> Self {
        LayerTarget { tolerance, ..self }
    }

    #[allow(clippy::float_cmp)]
    pub fn contains(&self, z: f64) -> bool {
        if self.tolerance > 0.0 {
            (z - self.height).abs() <= self.tolerance
        } else {
            z == self.height
        }
    }
}

/// Registers carried from line to line. Neither is ever reset, so both track
/// the whole file rather than just the target layer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtractionState {
    pub current_height: Option<f64>,
    pub previous_extrusion: Option<f64>,
}

impl ExtractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one motion command.
    ///
    /// The height register is updated before the layer check, and the
    /// extrusion register only after the delta has been taken.
    pub fn step(self, cmd: &MotionCommand, target: &LayerTarget) -> (Self, Option<Sample>) {
        let current_height = cmd.z.or(self.current_height);

        let sample = match (current_height, cmd.x, cmd.y) {
            (Some(z), Some(x), Some(y)) if target.contains(z) => {
                let extrusion_delta = match (cmd.e, self.previous_extrusion) {
                    (Some(e), Some(prev)) => e - prev,
                    _ => 0.0,
                };
                Some(Sample::new(x, y, extrusion_delta))
            }
            _ => None,
        };

        let next = ExtractionState {
            current_height,
            previous_extrusion: cmd.e.or(self.previous_extrusion),
        };
        (next, sample)
    }
}

/// Everything one pass over a source produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub samples: Vec<Sample>,
    pub state: ExtractionState,
    pub lines: usize,
}

impl Extraction {
    fn push(mut self, line: usize, cmd: Option<MotionCommand>, target: &LayerTarget) -> Self {
        self.lines = line;
        if let Some(cmd) = cmd {
            let (state, sample) = self.state.step(&cmd, target);
            self.state = state;
            if let Some(sample) = sample {
                trace!(line, command = %cmd, de = sample.extrusion_delta, "sample");
                self.samples.push(sample);
            }
        }
        self
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("cannot open {}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read failed")]
    Read(#[from] GCodeReadError),
}

/// Collects the samples of one layer from a line-oriented source in a single
/// forward pass.
pub fn extract<R: BufRead>(rdr: R, target: LayerTarget) -> Result<Extraction, ExtractError> {
    debug!(
        height = target.height,
        tolerance = target.tolerance,
        "extracting layer"
    );

    let extraction = GCodeReader::new(rdr).try_fold(
        Extraction::default(),
        |acc, line| -> Result<Extraction, ExtractError> {
            let line = line?;
            Ok(acc.push(line.number, line.motion, &target))
        },
    )?;

    debug!(
        lines = extraction.lines,
        samples = extraction.samples.len(),
        "extraction finished"
    );
    Ok(extraction)
}

pub fn extract_file<P: AsRef<Path>>(
    path: P,
    target: LayerTarget,
) -> Result<Extraction, ExtractError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ExtractError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    extract(BufReader::new(file), target)
}

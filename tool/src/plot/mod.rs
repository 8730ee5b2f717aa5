use std::io;
use std::path::PathBuf;

use thiserror::Error;

use lib_layercom::render::PathRenderer;

pub mod svg;
pub mod terminal;
mod viewport;

pub use viewport::Viewport;

#[derive(clap::ArgEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum PlotTarget {
    /// Draw in the terminal and wait for Enter
    Terminal,
    /// Save an SVG file
    Svg,
    None,
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("cannot write plot to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("terminal output failed")]
    Terminal(#[from] io::Error),
}

pub type BoxedRenderer = Box<dyn PathRenderer<Error = PlotError>>;

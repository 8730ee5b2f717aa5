use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use lib_layercom::centroid::{centroid, Centroid};
use lib_layercom::layer::{extract, extract_file, Extraction, LayerTarget};
use lib_layercom::render::{render_layer, RenderOutcome};

use crate::cmd::OutputFormat;
use crate::config::PlotConfig;
use crate::plot::svg::SvgRenderer;
use crate::plot::terminal::{PlotStream, TerminalRenderer};
use crate::plot::{BoxedRenderer, PlotTarget};
use crate::Opts;

/// Compute and plot the center of mass of one layer
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    /// G-code file to read, or `-` for stdin
    input: String,

    /// Layer height to analyze, as written in the file's Z words
    #[clap(short = 'z', long = "target-z", allow_hyphen_values = true)]
    target_z: f64,

    /// Accept Z values within this distance of the target
    #[clap(long)]
    tolerance: Option<f64>,

    #[clap(arg_enum, long, short, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    #[clap(arg_enum, long, default_value_t = PlotTarget::Terminal)]
    plot: PlotTarget,

    /// File written by `--plot svg`
    #[clap(long, short, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Return right after drawing instead of waiting for Enter
    #[clap(long)]
    no_wait: bool,
}

#[derive(Debug, Serialize)]
struct LayerReport<'a> {
    target: LayerTarget,
    lines: usize,
    samples: usize,
    centroid: Option<&'a Centroid>,
}

pub fn center_of_mass_message(target_z: f64, com: Option<&Centroid>) -> String {
    match com {
        Some(c) => format!(
            "Center of Mass for Z={}: (X={:.3}, Y={:.3})",
            target_z, c.x, c.y
        ),
        None => format!("No data found for Z={}", target_z),
    }
}

impl AnalyzeCmd {
    pub fn run(&self, opts: &Opts) -> Result<()> {
        let config = opts.config()?;
        let tolerance = self.tolerance.unwrap_or(config.height_tolerance);
        let target = LayerTarget::exact(self.target_z).with_tolerance(tolerance);

        let extraction = self
            .extract(target)
            .with_context(|| format!("extracting layer Z={} from {}", self.target_z, self.input))?;
        let com = centroid(&extraction.samples);

        match self.format {
            OutputFormat::Human => println!("{}", center_of_mass_message(self.target_z, com.as_ref())),
            OutputFormat::Json => {
                let report = LayerReport {
                    target,
                    lines: extraction.lines,
                    samples: extraction.samples.len(),
                    centroid: com.as_ref(),
                };
                serde_json::to_writer_pretty(io::stdout(), &report)?;
                println!();
            }
        }

        let mut renderer = match self.renderer(&config.plot) {
            Some(renderer) => renderer,
            None => return Ok(()),
        };
        let outcome = render_layer(&mut renderer, &extraction.samples, com.as_ref())
            .context("rendering layer")?;
        if self.format == OutputFormat::Human {
            match (outcome, self.plot) {
                (RenderOutcome::NothingToDisplay, _) => println!("No points to visualize."),
                (RenderOutcome::Drawn, PlotTarget::Svg) => {
                    println!("Plot saved to {}", self.svg_path().display())
                }
                (RenderOutcome::Drawn, _) => {}
            }
        }

        Ok(())
    }

    fn extract(&self, target: LayerTarget) -> Result<Extraction> {
        let extraction = match self.input.as_str() {
            "-" => extract(io::stdin().lock(), target)?,
            filename => extract_file(filename, target)?,
        };
        Ok(extraction)
    }

    fn renderer(&self, style: &PlotConfig) -> Option<BoxedRenderer> {
        match self.plot {
            PlotTarget::None => None,
            PlotTarget::Terminal => Some(Box::new(
                TerminalRenderer::to_stream(self.terminal_stream())
                    .wait_for_dismiss(!self.no_wait),
            )),
            PlotTarget::Svg => Some(Box::new(SvgRenderer::new(
                self.svg_path(),
                style.clone(),
            ))),
        }
    }

    // stdout is reserved for the report when it is JSON.
    fn terminal_stream(&self) -> PlotStream {
        match self.format {
            OutputFormat::Human => PlotStream::Stdout,
            OutputFormat::Json => PlotStream::Stderr,
        }
    }

    fn svg_path(&self) -> PathBuf {
        match (&self.output, self.input.as_str()) {
            (Some(path), _) => path.clone(),
            (None, "-") => PathBuf::from("layer.svg"),
            (None, input) => Path::new(input).with_extension("svg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn com(x: f64, y: f64) -> Centroid {
        Centroid {
            x,
            y,
            total_weight: 1.0,
            weighted_samples: 1,
        }
    }

    #[test]
    fn message_uses_three_decimals() {
        assert_eq!(
            center_of_mass_message(3.0, Some(&com(10.0, 0.0))),
            "Center of Mass for Z=3: (X=10.000, Y=0.000)"
        );
        assert_eq!(
            center_of_mass_message(0.2, Some(&com(1.23456, -7.0006))),
            "Center of Mass for Z=0.2: (X=1.235, Y=-7.001)"
        );
    }

    #[test]
    fn message_without_centroid() {
        assert_eq!(center_of_mass_message(3.0, None), "No data found for Z=3");
        assert_eq!(center_of_mass_message(0.45, None), "No data found for Z=0.45");
    }

    #[test]
    fn empty_extraction_reports_no_data() {
        let extraction = extract("; header\nM104 S200\nG28\n".as_bytes(), LayerTarget::exact(3.0))
            .unwrap();
        let com = centroid(&extraction.samples);
        assert_eq!(
            center_of_mass_message(3.0, com.as_ref()),
            "No data found for Z=3"
        );
    }

    #[test]
    fn extracted_layer_reports_center() {
        let src = "G1 Z3 ; comment\nG1 X0 Y0 E1.0\nG1 X10 Y0 E3.0\nG1 Z5\nG1 X0 Y5 E5.0\n";
        let extraction = extract(src.as_bytes(), LayerTarget::exact(3.0)).unwrap();
        let com = centroid(&extraction.samples);
        assert_eq!(
            center_of_mass_message(3.0, com.as_ref()),
            "Center of Mass for Z=3: (X=10.000, Y=0.000)"
        );
    }

    fn parse(args: &[&str]) -> AnalyzeCmd {
        AnalyzeCmd::try_parse_from(std::iter::once("analyze").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn svg_path_defaults_next_to_input() {
        let cmd = parse(&["prints/benchy.gcode", "-z", "0.2", "--plot", "svg"]);
        assert_eq!(cmd.plot, PlotTarget::Svg);
        assert_eq!(cmd.svg_path(), PathBuf::from("prints/benchy.svg"));

        let cmd = parse(&["-", "-z", "0.2", "--plot", "svg"]);
        assert_eq!(cmd.svg_path(), PathBuf::from("layer.svg"));

        let cmd = parse(&["a.gcode", "-z", "0.2", "-o", "out/plot.svg"]);
        assert_eq!(cmd.svg_path(), PathBuf::from("out/plot.svg"));
    }

    #[test]
    fn parses_flags() {
        let cmd = parse(&[
            "a.gcode",
            "--target-z",
            "-1.5",
            "--tolerance",
            "0.01",
            "--format",
            "json",
            "--plot",
            "none",
            "--no-wait",
        ]);
        assert_eq!(cmd.target_z, -1.5);
        assert_eq!(cmd.tolerance, Some(0.01));
        assert_eq!(cmd.format, OutputFormat::Json);
        assert_eq!(cmd.plot, PlotTarget::None);
        assert!(cmd.no_wait);
        assert!(cmd.renderer(&PlotConfig::default()).is_none());
    }

    #[test]
    fn json_report_keeps_terminal_plot_off_stdout() {
        let cmd = parse(&["a.gcode", "-z", "0.2", "--format", "json"]);
        assert_eq!(cmd.plot, PlotTarget::Terminal);
        assert_eq!(cmd.terminal_stream(), PlotStream::Stderr);
        assert!(cmd.renderer(&PlotConfig::default()).is_some());

        let cmd = parse(&["a.gcode", "-z", "0.2"]);
        assert_eq!(cmd.terminal_stream(), PlotStream::Stdout);
    }
}

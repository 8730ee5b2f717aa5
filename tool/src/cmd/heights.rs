use std::collections::BTreeMap;
use std::io::BufRead;

use anyhow::{Context, Result};
use clap::Parser;
use ordered_float::NotNan;
use serde::{ser::SerializeSeq, Serialize, Serializer};
use tracing::warn;

use lib_layercom::gcode::{GCodeReadError, GCodeReader};

use crate::cmd::{open_input, OutputFormat};
use crate::Opts;

/// List the layer heights set by G1 moves
#[derive(Parser, Debug)]
pub struct HeightsCmd {
    /// G-code file to read, or `-` for stdin
    input: String,

    #[clap(arg_enum, long, short, default_value_t = OutputFormat::Human)]
    format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
struct HeightIndex {
    /// X/Y moves issued while each height was current.
    #[serde(serialize_with = "serialize_heights")]
    heights: BTreeMap<NotNan<f64>, usize>,
}

fn serialize_heights<S: Serializer>(
    heights: &BTreeMap<NotNan<f64>, usize>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(heights.len()))?;

    for (z, moves) in heights {
        seq.serialize_element(&(z.into_inner(), moves))?;
    }

    seq.end()
}

impl HeightIndex {
    fn scan<R: BufRead>(rdr: R) -> Result<Self, GCodeReadError> {
        let mut index = HeightIndex::default();
        let mut current = None;

        for line in GCodeReader::new(rdr) {
            let line = line?;
            let cmd = match line.motion {
                Some(cmd) => cmd,
                None => continue,
            };

            if let Some(z) = cmd.z {
                current = match NotNan::new(z) {
                    Ok(z) => {
                        index.heights.entry(z).or_insert(0);
                        Some(z)
                    }
                    Err(_) => {
                        warn!(line = line.number, "ignoring NaN layer height");
                        None
                    }
                };
            }

            if let (Some(z), Some(_), Some(_)) = (current, cmd.x, cmd.y) {
                *index.heights.entry(z).or_insert(0) += 1;
            }
        }

        Ok(index)
    }
}

impl HeightsCmd {
    pub fn run(&self, _opts: &Opts) -> Result<()> {
        let src = open_input(&self.input).with_context(|| format!("cannot open {}", self.input))?;
        let index = HeightIndex::scan(src).with_context(|| format!("reading {}", self.input))?;

        match self.format {
            OutputFormat::Human => {
                if index.heights.is_empty() {
                    println!("No layer heights found");
                    return Ok(());
                }
                // Heights print in shortest round-trip form so they can be
                // passed back to `analyze -z` and match exactly.
                let heights = index
                    .heights
                    .iter()
                    .map(|(z, moves)| (z.to_string(), *moves))
                    .collect::<Vec<_>>();
                let longest_z = heights.iter().map(|(z, _)| z.len()).max().unwrap_or(0);
                println!("Layer heights:");
                for (z, moves) in heights {
                    println!("  Z={z:<longest_z$}  {moves} moves");
                }
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(std::io::stdout(), &index)?;
                println!();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nn(v: f64) -> NotNan<f64> {
        NotNan::new(v).unwrap()
    }

    #[test]
    fn counts_moves_per_height() {
        let src = "G1 Z0.2\nG1 X1 Y1 E1\nG1 X2 Y1 E2\nG1 Z0.4 X0 Y0\nG1 E1.5\nG0 Z9\nG1 X3 Y3 E3\n";
        let index = HeightIndex::scan(src.as_bytes()).unwrap();
        assert_eq!(
            index.heights.into_iter().collect::<Vec<_>>(),
            vec![(nn(0.2), 2), (nn(0.4), 2)]
        );
    }

    #[test]
    fn heights_without_moves_are_listed() {
        let src = "G1 Z5\nG1 Z0.3\nG1 X1 Y1\nG1 Z5\n";
        let index = HeightIndex::scan(src.as_bytes()).unwrap();
        assert_eq!(
            index.heights.into_iter().collect::<Vec<_>>(),
            vec![(nn(0.3), 1), (nn(5.0), 0)]
        );
    }

    #[test]
    fn serializes_as_pairs() {
        let index = HeightIndex::scan("G1 Z0.2\nG1 X1 Y1\n".as_bytes()).unwrap();
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"{"heights":[[0.2,1]]}"#);
    }
}

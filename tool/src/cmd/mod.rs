pub mod analyze;
pub mod dump_config;
pub mod heights;

#[derive(clap::ArgEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Opens `input` as a buffered source, treating `-` as stdin.
pub fn open_input(input: &str) -> std::io::Result<Box<dyn std::io::BufRead>> {
    use std::fs::File;
    use std::io::BufReader;

    Ok(match input {
        "-" => Box::new(std::io::stdin().lock()),
        filename => Box::new(BufReader::new(File::open(filename)?)),
    })
}

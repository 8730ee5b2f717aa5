use std::fmt::Display;
use std::io::{self, BufRead};

use thiserror::Error;

/// Axis words carried by a single `G1` line.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct MotionCommand {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
}

impl MotionCommand {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none() && self.e.is_none()
    }
}

impl Display for MotionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "G1")?;
        if let Some(v) = self.x {
            write!(f, " X{}", v)?;
        }
        if let Some(v) = self.y {
            write!(f, " Y{}", v)?;
        }
        if let Some(v) = self.z {
            write!(f, " Z{}", v)?;
        }
        if let Some(v) = self.e {
            write!(f, " E{}", v)?;
        }
        Ok(())
    }
}

/// One line of input. `motion` is `None` for anything that isn't a `G1`
/// carrying at least one of X/Y/Z/E.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct GCodeLine {
    pub number: usize,
    pub motion: Option<MotionCommand>,
}

#[derive(Error, Debug)]
pub enum GCodeReadError {
    #[error("IO error at line {line}")]
    IO {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("invalid gcode at line {line}")]
    ParseError {
        line: usize,
        #[source]
        source: GCodeParseError,
    },
}

impl GCodeReadError {
    pub fn line(&self) -> usize {
        match self {
            GCodeReadError::IO { line, .. } | GCodeReadError::ParseError { line, .. } => *line,
        }
    }
}

/// Reads raw lines and parses the `G1` ones. Only candidate lines are
/// decoded as UTF-8, so comments and other commands may hold any bytes.
pub struct GCodeReader<R: BufRead> {
    rdr: R,
    buf: Vec<u8>,
    line: usize,
}

impl<R: BufRead> GCodeReader<R> {
    pub fn new(rdr: R) -> GCodeReader<R> {
        GCodeReader {
            rdr,
            buf: Vec::new(),
            line: 0,
        }
    }

    fn parse_buffer(&self) -> Result<Option<MotionCommand>, GCodeReadError> {
        let line = self.line;
        if !self.buf.starts_with(b"G1") {
            return Ok(None);
        }
        let text = std::str::from_utf8(&self.buf).map_err(|e| GCodeReadError::IO {
            line,
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        parse_motion(text).map_err(|source| GCodeReadError::ParseError { line, source })
    }
}

impl<R: BufRead> Iterator for GCodeReader<R> {
    type Item = Result<GCodeLine, GCodeReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        self.line += 1;
        let line = self.line;
        match self.rdr.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => Some(self.parse_buffer().map(|motion| GCodeLine {
                number: line,
                motion,
            })),
            Err(source) => Some(Err(GCodeReadError::IO { line, source })),
        }
    }
}

pub use parser::parse_motion;
pub use parser::GCodeParseError;

mod parser {
    use super::*;
    use nom::{
        branch::alt,
        bytes::complete::{tag, take_till1, take_while, take_while1},
        combinator::{eof, opt, peek},
        multi::separated_list0,
        sequence::terminated,
        IResult,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct GCodeParseError {
        pub axis: char,
        pub field: String,
    }

    impl std::error::Error for GCodeParseError {}

    impl std::fmt::Display for GCodeParseError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "malformed {} field {:?}", self.axis, self.field)
        }
    }

    /// Parses one raw input line. Lines that aren't `G1` commands yield
    /// `Ok(None)`, never an error.
    ///
    /// Everything from the first `;` on is a comment and is dropped before
    /// fields are split, so words inside comments never count.
    pub fn parse_motion(line: &str) -> Result<Option<MotionCommand>, GCodeParseError> {
        let fields = match motion_fields(line.trim_end()) {
            Ok((_, fields)) => fields,
            Err(_) => return Ok(None),
        };
        let cmd = map_fields(fields)?;
        Ok(if cmd.is_empty() { None } else { Some(cmd) })
    }

    fn motion_fields(s: &str) -> IResult<&str, Vec<&str>> {
        let (s, _) = command_word(s)?;
        let (s, _) = take_while(char::is_whitespace)(s)?;
        let (s, fields) = separated_list0(take_while1(char::is_whitespace), field)(s)?;
        let (s, _) = take_while(char::is_whitespace)(s)?;
        let (s, _) = opt(comment)(s)?;
        Ok((s, fields))
    }

    // Exactly `G1` at column 0; `G10`, `G11` and friends don't qualify.
    fn command_word(s: &str) -> IResult<&str, &str> {
        terminated(
            tag("G1"),
            peek(alt((eof, take_while1(char::is_whitespace), tag(";")))),
        )(s)
    }

    fn field(s: &str) -> IResult<&str, &str> {
        take_till1(|c: char| c.is_whitespace() || c == ';')(s)
    }

    fn comment(s: &str) -> IResult<&str, &str> {
        let (s, _) = tag(";")(s)?;
        Ok(("", s.trim()))
    }

    fn map_fields(fields: Vec<&str>) -> Result<MotionCommand, GCodeParseError> {
        let mut cmd = MotionCommand::default();

        for field in fields.into_iter() {
            let mut chars = field.chars();
            let (axis, slot) = match chars.next() {
                Some('X') => ('X', &mut cmd.x),
                Some('Y') => ('Y', &mut cmd.y),
                Some('Z') => ('Z', &mut cmd.z),
                Some('E') => ('E', &mut cmd.e),
                _ => continue,
            };
            let v = lexical_core::parse::<f64>(chars.as_str().as_bytes()).map_err(|_| {
                GCodeParseError {
                    axis,
                    field: field.to_string(),
                }
            })?;
            *slot = Some(v);
        }

        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(line: &str) -> Option<MotionCommand> {
        parse_motion(line).expect("line should parse")
    }

    #[test]
    fn parses_all_axis_words() {
        let cmd = motion("G1 X10.5 Y-2 Z0.2 E1.25 F1800\n").unwrap();
        assert_eq!(cmd.x, Some(10.5));
        assert_eq!(cmd.y, Some(-2.0));
        assert_eq!(cmd.z, Some(0.2));
        assert_eq!(cmd.e, Some(1.25));
    }

    #[test]
    fn comment_text_is_not_tokenized() {
        let cmd = motion("G1 Z3 ; Xylophone Eagle").unwrap();
        assert_eq!(
            cmd,
            MotionCommand {
                z: Some(3.0),
                ..Default::default()
            }
        );

        let cmd = motion("G1 X1 Y2;inline").unwrap();
        assert_eq!((cmd.x, cmd.y), (Some(1.0), Some(2.0)));
    }

    #[test]
    fn non_motion_lines_are_inert() {
        for line in [
            "",
            "\n",
            "; G1 X1 Y1",
            "G0 X1 Y1",
            "M104 S200",
            "G10",
            "G11 X1 Y1",
            " G1 X1 Y1",
            "g1 X1 Y1",
            "G1X1 Y1 Z1",
        ] {
            assert_eq!(parse_motion(line), Ok(None), "{:?}", line);
        }
    }

    #[test]
    fn g1_without_axis_words_is_inert() {
        assert_eq!(parse_motion("G1 F1200\n"), Ok(None));
        assert_eq!(parse_motion("G1 x1 y1"), Ok(None));
        assert_eq!(parse_motion("G1"), Ok(None));
    }

    #[test]
    fn handles_crlf_and_tabs() {
        let cmd = motion("G1\tX1\t Y2  E0.5\r\n").unwrap();
        assert_eq!((cmd.x, cmd.y, cmd.e), (Some(1.0), Some(2.0), Some(0.5)));
    }

    #[test]
    fn last_repeated_word_wins() {
        let cmd = motion("G1 X1 X7 Y0").unwrap();
        assert_eq!(cmd.x, Some(7.0));
    }

    #[test]
    fn malformed_fields_are_errors() {
        assert_eq!(
            parse_motion("G1 Xabc Y1"),
            Err(GCodeParseError {
                axis: 'X',
                field: "Xabc".into()
            })
        );
        assert_eq!(
            parse_motion("G1 X1 Y1 E"),
            Err(GCodeParseError {
                axis: 'E',
                field: "E".into()
            })
        );
        assert!(parse_motion("G1 Z1.2.3").is_err());
    }

    #[test]
    fn display_round_trips_words() {
        let cmd = motion("G1 X1 Y2.5 E3").unwrap();
        assert_eq!(cmd.to_string(), "G1 X1 Y2.5 E3");
    }

    #[test]
    fn reader_numbers_lines() {
        let src = "; header\nG1 Z0.2\nM107\nG1 X1 Y1 E0.1\n";
        let lines = GCodeReader::new(src.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].motion, None);
        assert_eq!(lines[1].number, 2);
        assert_eq!(lines[1].motion.unwrap().z, Some(0.2));
        assert_eq!(lines[3].number, 4);
        assert_eq!(lines[3].motion.unwrap().x, Some(1.0));
    }

    #[test]
    fn reader_skips_undecodable_comments() {
        let src: &[u8] = b"; temp\xe9rature 210\nG1 Z1\nM117 \xff\xfe\nG1 X1 Y1 E1\n";
        let lines = GCodeReader::new(src)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].motion, None);
        assert_eq!(lines[2].motion, None);
        assert_eq!(lines[3].number, 4);
        assert_eq!(lines[3].motion.unwrap().x, Some(1.0));
    }

    #[test]
    fn reader_rejects_undecodable_motion_line() {
        let src: &[u8] = b"G1 Z1\nG1 X1 \xff\n";
        let err = GCodeReader::new(src)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        match err {
            GCodeReadError::IO { line, source } => {
                assert_eq!(line, 2);
                assert_eq!(source.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn reader_reports_line_of_malformed_field() {
        let src = "G1 Z1\nG1 X1 Y1\nG1 X1 Yoops\n";
        let err = GCodeReader::new(src.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert_eq!(err.line(), 3);
        match err {
            GCodeReadError::ParseError { source, .. } => assert_eq!(source.axis, 'Y'),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

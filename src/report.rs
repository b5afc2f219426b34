// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use crate::{FloorplanResult, ParseError, Rect};

/// Placement of one block as written to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedBlock {
    pub name: String,
    pub rect: Rect,
}

/// Contents of the result report. Lines, in order: cost, wirelength, chip
/// area, `width height`, runtime in seconds, then `name x1 y1 x2 y2` per
/// block.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub cost: f64,
    pub wirelength: i64,
    pub area: i64,
    pub width: i64,
    pub height: i64,
    pub runtime: Duration,
    pub blocks: Vec<PlacedBlock>,
}

impl Report {
    pub fn from_result(result: &FloorplanResult) -> Self {
        Report {
            cost: result.cost,
            wirelength: result.wirelength,
            area: result.area,
            width: result.width,
            height: result.height,
            runtime: result.runtime,
            blocks: result
                .blocks
                .iter()
                .map(|b| PlacedBlock {
                    name: b.name().to_string(),
                    rect: b.rect(),
                })
                .collect(),
        }
    }

    pub fn emit(&self) -> String {
        self.to_string()
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.emit().as_bytes())?;
        writer.flush()
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, self.emit())
    }

    /// Reads a report back, e.g. for plotting or checking a produced result.
    pub fn parse(src: &str) -> Result<Self, ParseError> {
        let mut lines = src
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let mut next = |expected: &'static str| {
            lines.next().ok_or(ParseError::UnexpectedEof { expected })
        };

        let (line, tok) = next("cost")?;
        let cost = parse_num::<f64>(line, "cost", tok)?;
        let (line, tok) = next("wirelength")?;
        let wirelength = parse_num(line, "wirelength", tok)?;
        let (line, tok) = next("area")?;
        let area = parse_num(line, "area", tok)?;

        let (line, dims) = next("chip dimensions")?;
        let mut dims = dims.split_whitespace();
        let width = parse_num(
            line,
            "chip width",
            dims.next().ok_or(ParseError::MissingField {
                line,
                field: "chip width",
            })?,
        )?;
        let height = parse_num(
            line,
            "chip height",
            dims.next().ok_or(ParseError::MissingField {
                line,
                field: "chip height",
            })?,
        )?;

        let (line, tok) = next("runtime")?;
        let runtime = parse_num::<f64>(line, "runtime", tok)
            .and_then(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|_| ParseError::InvalidNumber {
                    line,
                    field: "runtime",
                    value: tok.to_string(),
                })
            })?;

        let mut blocks = Vec::new();
        for (line, text) in lines {
            let fields = text.split_whitespace().collect::<Vec<_>>();
            if fields.len() != 5 {
                return Err(ParseError::MissingField {
                    line,
                    field: "block placement",
                });
            }
            let coord = |i: usize, field: &'static str| parse_num::<i64>(line, field, fields[i]);
            blocks.push(PlacedBlock {
                name: fields[0].to_string(),
                rect: Rect::new(
                    coord(1, "x1")?,
                    coord(2, "y1")?,
                    coord(3, "x2")?,
                    coord(4, "y2")?,
                ),
            });
        }

        Ok(Report {
            cost,
            wirelength,
            area,
            width,
            height,
            runtime,
            blocks,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.cost)?;
        writeln!(f, "{}", self.wirelength)?;
        writeln!(f, "{}", self.area)?;
        writeln!(f, "{} {}", self.width, self.height)?;
        writeln!(f, "{}", self.runtime.as_secs_f64())?;
        for b in &self.blocks {
            writeln!(
                f,
                "{} {} {} {} {}",
                b.name, b.rect.min_x, b.rect.min_y, b.rect.max_x, b.rect.max_y
            )?;
        }
        Ok(())
    }
}

fn parse_num<T: std::str::FromStr>(
    line: usize,
    field: &'static str,
    token: &str,
) -> Result<T, ParseError> {
    token.parse::<T>().map_err(|_| ParseError::InvalidNumber {
        line,
        field,
        value: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report {
            cost: 1.25,
            wirelength: 42,
            area: 30,
            width: 6,
            height: 5,
            runtime: Duration::from_millis(1500),
            blocks: vec![
                PlacedBlock {
                    name: "a".to_string(),
                    rect: Rect::new(0, 0, 4, 2),
                },
                PlacedBlock {
                    name: "b".to_string(),
                    rect: Rect::new(4, 0, 6, 2),
                },
            ],
        }
    }

    #[test]
    fn test_emit_layout() {
        assert_eq!(report().emit(), "1.25\n42\n30\n6 5\n1.5\na 0 0 4 2\nb 4 0 6 2\n");
    }

    #[test]
    fn test_display_matches_written_bytes() {
        let r = report();
        let mut buf = Vec::new();
        r.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), format!("{r}"));
    }

    #[test]
    fn test_parse_emitted() {
        let r = report();
        assert_eq!(Report::parse(&r.emit()).unwrap(), r);
    }

    #[test]
    fn test_parse_bad_block_line() {
        let err = Report::parse("1\n2\n3\n4 5\n0.1\na 0 0 1\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingField { line: 6, .. }));
    }

    #[test]
    fn test_parse_truncated() {
        let err = Report::parse("1\n2\n3\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedEof {
                expected: "chip dimensions"
            }
        ));
    }
}

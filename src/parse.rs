// SPDX-License-Identifier: Apache-2.0

use std::iter::Peekable;
use std::sync::LazyLock;

use regex::Regex;

use crate::{Block, MAX_COORDINATE, Outline, ParseError, Terminal};

/// Optional `Label:` prefix on a header line, e.g. `Outline: 100 200`.
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:([A-Za-z_][A-Za-z0-9_]*)\s*:)?\s*(.*?)\s*$").unwrap()
});

/// Contents of a block file before nets are attached.
#[derive(Debug, Clone)]
pub struct BlockFile {
    pub outline: Outline,
    pub blocks: Vec<Block>,
    pub terminals: Vec<Terminal>,
}

fn parse_int(line: usize, field: &'static str, token: &str) -> Result<i64, ParseError> {
    token.parse::<i64>().map_err(|_| ParseError::InvalidNumber {
        line,
        field,
        value: token.to_string(),
    })
}

fn parse_count(line: usize, field: &'static str, token: &str) -> Result<usize, ParseError> {
    let value = parse_int(line, field, token)?;
    usize::try_from(value).map_err(|_| ParseError::NegativeCount { line, field, value })
}

fn parse_coordinate(line: usize, field: &'static str, token: &str) -> Result<i64, ParseError> {
    let value = parse_int(line, field, token)?;
    if (-MAX_COORDINATE..=MAX_COORDINATE).contains(&value) {
        Ok(value)
    } else {
        Err(ParseError::CoordinateOutOfRange {
            line,
            field,
            value,
            limit: MAX_COORDINATE,
        })
    }
}

fn field<'a>(
    tokens: &[&'a str],
    index: usize,
    line: usize,
    name: &'static str,
) -> Result<&'a str, ParseError> {
    tokens
        .get(index)
        .copied()
        .ok_or(ParseError::MissingField { line, field: name })
}

fn no_trailing(tokens: &[&str], expected_len: usize, line: usize) -> Result<(), ParseError> {
    match tokens.get(expected_len) {
        Some(extra) => Err(ParseError::TrailingField {
            line,
            found: extra.to_string(),
        }),
        None => Ok(()),
    }
}

/// Non-blank lines with their 1-based line numbers.
fn content_lines(src: &str) -> impl Iterator<Item = (usize, &str)> {
    src.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
}

fn next_line<'a>(
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    expected: &'static str,
) -> Result<(usize, &'a str), ParseError> {
    lines.next().ok_or(ParseError::UnexpectedEof { expected })
}

/// Splits a header line into its whitespace-separated values, dropping an
/// optional leading `Label:`.
fn header_values(line: &str) -> Vec<&str> {
    match HEADER_RE.captures(line) {
        Some(caps) => caps
            .get(2)
            .map(|m| m.as_str().split_whitespace().collect())
            .unwrap_or_default(),
        None => line.split_whitespace().collect(),
    }
}

/// Parses a block file: outline, block count, terminal count, then one
/// `name width height` line per block and one `name terminal x y` line per
/// terminal. Blank lines are treated as separators.
pub fn parse_blocks(src: &str) -> Result<BlockFile, ParseError> {
    let mut lines = content_lines(src);

    let (line_no, line) = next_line(&mut lines, "outline")?;
    let values = header_values(line);
    let width = field(&values, 0, line_no, "outline width")?;
    let height = field(&values, 1, line_no, "outline height")?;
    no_trailing(&values, 2, line_no)?;
    let width = parse_int(line_no, "outline width", width)?;
    let height = parse_int(line_no, "outline height", height)?;
    if width <= 0 || height <= 0 {
        return Err(ParseError::InvalidOutline {
            line: line_no,
            width,
            height,
        });
    }
    let outline = Outline::new(width, height);

    let (line_no, line) = next_line(&mut lines, "block count")?;
    let values = header_values(line);
    let count = field(&values, 0, line_no, "block count")?;
    no_trailing(&values, 1, line_no)?;
    let num_blocks = parse_count(line_no, "block count", count)?;

    let (line_no, line) = next_line(&mut lines, "terminal count")?;
    let values = header_values(line);
    let count = field(&values, 0, line_no, "terminal count")?;
    no_trailing(&values, 1, line_no)?;
    let num_terminals = parse_count(line_no, "terminal count", count)?;

    // counts come from the file, so nothing is pre-sized from them
    let mut blocks = Vec::new();
    // worst case packing places every block end to end
    let mut extent: i64 = 0;
    for _ in 0..num_blocks {
        let (line_no, line) = next_line(&mut lines, "block")?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let name = field(&tokens, 0, line_no, "block name")?;
        let width = field(&tokens, 1, line_no, "block width")?;
        let height = field(&tokens, 2, line_no, "block height")?;
        no_trailing(&tokens, 3, line_no)?;
        let width = parse_int(line_no, "block width", width)?;
        let height = parse_int(line_no, "block height", height)?;
        let block = Block::new(name, width, height)?;
        extent = extent.saturating_add(block.width().max(block.height()));
        if extent > MAX_COORDINATE {
            return Err(ParseError::ExtentTooLarge {
                line: line_no,
                limit: MAX_COORDINATE,
            });
        }
        blocks.push(block);
    }

    let mut terminals = Vec::new();
    for _ in 0..num_terminals {
        let (line_no, line) = next_line(&mut lines, "terminal")?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let name = field(&tokens, 0, line_no, "terminal name")?;
        let keyword = field(&tokens, 1, line_no, "terminal keyword")?;
        if !keyword.eq_ignore_ascii_case("terminal") {
            return Err(ParseError::UnexpectedToken {
                line: line_no,
                expected: "terminal",
                found: keyword.to_string(),
            });
        }
        let x = field(&tokens, 2, line_no, "terminal x")?;
        let y = field(&tokens, 3, line_no, "terminal y")?;
        no_trailing(&tokens, 4, line_no)?;
        let x = parse_coordinate(line_no, "terminal x", x)?;
        let y = parse_coordinate(line_no, "terminal y", y)?;
        terminals.push(Terminal::new(name, x, y));
    }

    if let Some((line_no, line)) = lines.next() {
        log::warn!("Ignoring content after the last terminal at line {line_no}: '{line}'");
    }

    Ok(BlockFile {
        outline,
        blocks,
        terminals,
    })
}

/// One net as read from the net file: the line it starts on and the pin
/// names in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetDecl {
    pub line: usize,
    pub pins: Vec<String>,
}

fn expect_keyword<'a>(
    tokens: &mut impl Iterator<Item = (usize, &'a str)>,
    keyword: &'static str,
) -> Result<usize, ParseError> {
    let (line, token) = tokens
        .next()
        .ok_or(ParseError::UnexpectedEof { expected: keyword })?;
    if token.trim_end_matches(':').eq_ignore_ascii_case(keyword) {
        Ok(line)
    } else {
        Err(ParseError::UnexpectedToken {
            line,
            expected: keyword,
            found: token.to_string(),
        })
    }
}

fn next_count<'a>(
    tokens: &mut Peekable<impl Iterator<Item = (usize, &'a str)>>,
    field: &'static str,
) -> Result<usize, ParseError> {
    // tolerate "NumNets : 3" as well as "NumNets: 3"
    if tokens.peek().is_some_and(|(_, t)| *t == ":") {
        tokens.next();
    }
    let (line, token) = tokens
        .next()
        .ok_or(ParseError::UnexpectedEof { expected: field })?;
    parse_count(line, field, token)
}

/// Parses a net file: `NumNets: n` followed by `n` groups of
/// `NetDegree: d` and `d` pin names. Names are resolved later against the
/// design, so unknown names are kept here.
pub fn parse_nets(src: &str) -> Result<Vec<NetDecl>, ParseError> {
    let mut tokens = src
        .lines()
        .enumerate()
        .flat_map(|(i, l)| l.split_whitespace().map(move |t| (i + 1, t)))
        .peekable();

    if tokens.peek().is_none() {
        return Ok(Vec::new());
    }

    expect_keyword(&mut tokens, "NumNets")?;
    let num_nets = next_count(&mut tokens, "net count")?;

    let mut nets = Vec::new();
    for _ in 0..num_nets {
        let line = expect_keyword(&mut tokens, "NetDegree")?;
        let degree = next_count(&mut tokens, "net degree")?;
        let mut pins = Vec::new();
        for _ in 0..degree {
            let (_, name) = tokens
                .next()
                .ok_or(ParseError::UnexpectedEof { expected: "net pin" })?;
            pins.push(name.to_string());
        }
        nets.push(NetDecl { line, pins });
    }

    if let Some((line, token)) = tokens.next() {
        log::warn!("Ignoring content after the last net at line {line}: '{token}'");
    }

    Ok(nets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKS: &str = "Outline: 10 12
NumBlocks: 2
NumTerminals: 1

a 4 2
b 3 3

p terminal 0 7
";

    #[test]
    fn test_parse_blocks_with_labels() {
        let parsed = parse_blocks(BLOCKS).unwrap();
        assert_eq!(parsed.outline, Outline::new(10, 12));
        assert_eq!(parsed.blocks.len(), 2);
        assert_eq!(parsed.blocks[1].name(), "b");
        assert_eq!(parsed.blocks[1].width(), 3);
        assert_eq!(parsed.terminals[0].name(), "p");
        assert_eq!(parsed.terminals[0].rect().min_y, 7);
    }

    #[test]
    fn test_parse_blocks_bare_headers() {
        let parsed = parse_blocks("5 6\n1\n0\n\nx 1 2\n").unwrap();
        assert_eq!(parsed.outline, Outline::new(5, 6));
        assert_eq!(parsed.blocks.len(), 1);
        assert!(parsed.terminals.is_empty());
    }

    #[test]
    fn test_parse_blocks_bad_number() {
        let err = parse_blocks("Outline: 10 12\nNumBlocks: 1\nNumTerminals: 0\n\na 4 x\n")
            .unwrap_err();
        match err {
            ParseError::InvalidNumber { line, field, value } => {
                assert_eq!(line, 5);
                assert_eq!(field, "block height");
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_blocks_short_line() {
        let err = parse_blocks("Outline: 10 12\nNumBlocks: 1\nNumTerminals: 0\n\na 4\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingField {
                line: 5,
                field: "block height"
            }
        ));
    }

    #[test]
    fn test_parse_blocks_truncated() {
        let err = parse_blocks("Outline: 10 12\nNumBlocks: 3\nNumTerminals: 0\n\na 4 2\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { expected: "block" }));
    }

    #[test]
    fn test_parse_blocks_terminal_keyword() {
        let err = parse_blocks("Outline: 10 12\nNumBlocks: 0\nNumTerminals: 1\n\np pad 1 1\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { line: 5, .. }));
    }

    #[test]
    fn test_parse_blocks_zero_dimension() {
        let err = parse_blocks("Outline: 10 12\nNumBlocks: 1\nNumTerminals: 0\n\na 0 2\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::NonPositiveDimension { .. }));
    }

    #[test]
    fn test_parse_blocks_huge_count_is_truncation() {
        let err = parse_blocks(
            "Outline: 10 10\nNumBlocks: 9223372036854775807\nNumTerminals: 0\n\na 1 1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { expected: "block" }));
    }

    #[test]
    fn test_parse_blocks_oversized_block() {
        let err = parse_blocks(
            "Outline: 10 10\nNumBlocks: 2\nNumTerminals: 0\n\na 5000000000000000000 1\nb 5000000000000000000 1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::DimensionTooLarge { .. }));
    }

    #[test]
    fn test_parse_blocks_extent_limit() {
        let half = MAX_COORDINATE / 2 + 1;
        let src = format!("10 10\n2\n0\n\na {half} 1\nb 1 {half}\n");
        let err = parse_blocks(&src).unwrap_err();
        assert!(matches!(err, ParseError::ExtentTooLarge { line: 6, .. }));
    }

    #[test]
    fn test_parse_blocks_terminal_out_of_range() {
        let src = "10 10\n0\n1\n\np terminal 0 -9223372036854775808\n";
        let err = parse_blocks(src).unwrap_err();
        assert!(matches!(
            err,
            ParseError::CoordinateOutOfRange {
                line: 5,
                field: "terminal y",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_blocks_bad_outline() {
        for outline in ["0 10", "10 -3"] {
            let err = parse_blocks(&format!("{outline}\n0\n0\n")).unwrap_err();
            assert!(matches!(err, ParseError::InvalidOutline { line: 1, .. }));
        }
    }

    #[test]
    fn test_parse_nets_huge_degree_is_truncation() {
        let err = parse_nets("NumNets: 1\nNetDegree: 9223372036854775807\na\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { expected: "net pin" }));
        let err = parse_nets("NumNets: 9223372036854775807\nNetDegree: 1\na\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { expected: "NetDegree" }));
    }

    #[test]
    fn test_parse_nets() {
        let nets = parse_nets("NumNets: 2\nNetDegree: 2\na b\nNetDegree: 3\np\nb\nq\n").unwrap();
        assert_eq!(nets.len(), 2);
        assert_eq!(nets[0].pins, vec!["a", "b"]);
        assert_eq!(nets[1].line, 4);
        assert_eq!(nets[1].pins, vec!["p", "b", "q"]);
    }

    #[test]
    fn test_parse_nets_bad_keyword() {
        let err = parse_nets("NumNets: 1\nDegree: 2 a b\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken {
                line: 2,
                expected: "NetDegree",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_nets_truncated() {
        let err = parse_nets("NumNets: 1\nNetDegree: 3 a b\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { expected: "net pin" }));
    }

    #[test]
    fn test_parse_nets_empty() {
        assert!(parse_nets("").unwrap().is_empty());
    }
}

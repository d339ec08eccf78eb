//! Vertex and color codec.
//!
//! Columns are letters with 'I' skipped (`A`..`H`, `J`..), rows are 1-based
//! decimal numbers, so `(4, 4)` is `D4` and `(16, 16)` is `Q16`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::board::Color;
use crate::constants::COLUMNS;

/// A move target: a board point, or one of the two non-point moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Vertex {
    Point { x: usize, y: usize },
    Pass,
    Resign,
}

impl Vertex {
    pub fn point(x: usize, y: usize) -> Self {
        Vertex::Point { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VertexError {
    #[error("invalid color: {0:?}")]
    Color(String),
    #[error("invalid vertex: {0:?}")]
    Vertex(String),
    #[error("missing vertex")]
    Missing,
}

// =============================================================================
// Colors
// =============================================================================

/// Parse `b`/`black`/`w`/`white` in any case. Anything else is `None`.
pub fn parse_color(token: &str) -> Option<Color> {
    match token.to_ascii_lowercase().as_str() {
        "b" | "black" => Some(Color::Black),
        "w" | "white" => Some(Color::White),
        _ => None,
    }
}

pub fn format_color(color: Color) -> &'static str {
    match color {
        Color::Black => "B",
        Color::White => "W",
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(format_color(*self))
    }
}

impl FromStr for Color {
    type Err = VertexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s).ok_or_else(|| VertexError::Color(s.to_string()))
    }
}

// =============================================================================
// Vertices
// =============================================================================

/// Format a 1-based point, e.g. `(3, 2)` -> `C2`.
///
/// # Panics
///
/// If `x` is 0 or beyond the 25-letter column alphabet.
pub fn format_vertex(x: usize, y: usize) -> String {
    format!("{}{y}", COLUMNS[x - 1] as char)
}

/// Column number for a letter, case-insensitive.
fn column_of(letter: u8) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    COLUMNS.iter().position(|&c| c == upper).map(|i| i + 1)
}

/// Parse a point such as `D4` or `q16`.
fn parse_point(token: &str) -> Option<(usize, usize)> {
    let bytes = token.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let x = column_of(bytes[0])?;
    let digits = &token[1..];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let y = digits.parse().ok()?;
    Some((x, y))
}

/// Parse a vertex: a point, `pass` or `resign` (case-insensitive).
pub fn parse_vertex(token: &str) -> Result<Vertex, VertexError> {
    if token.eq_ignore_ascii_case("pass") {
        return Ok(Vertex::Pass);
    }
    if token.eq_ignore_ascii_case("resign") {
        return Ok(Vertex::Resign);
    }
    parse_point(token)
        .map(|(x, y)| Vertex::point(x, y))
        .ok_or_else(|| VertexError::Vertex(token.to_string()))
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vertex::Point { x, y } => f.write_str(&format_vertex(*x, *y)),
            Vertex::Pass => f.write_str("PASS"),
            Vertex::Resign => f.write_str("RESIGN"),
        }
    }
}

impl FromStr for Vertex {
    type Err = VertexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_vertex(s.trim())
    }
}

// =============================================================================
// Moves
// =============================================================================

/// Parse `"<color> <point>"`. Tokens after the point are ignored.
pub fn parse_move(text: &str) -> Result<(Color, usize, usize), VertexError> {
    let mut tokens = text.split_whitespace();
    let color_token = tokens.next().unwrap_or_default();
    let color = color_token.parse::<Color>()?;
    let vertex = tokens.next().ok_or(VertexError::Missing)?;
    let (x, y) = parse_point(vertex).ok_or_else(|| VertexError::Vertex(vertex.to_string()))?;
    Ok((color, x, y))
}

/// Format a move, e.g. `B C2`.
pub fn format_move(color: Color, x: usize, y: usize) -> String {
    format!("{} {}", format_color(color), format_vertex(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("b"), Some(Color::Black));
        assert_eq!(parse_color("BLACK"), Some(Color::Black));
        assert_eq!(parse_color("W"), Some(Color::White));
        assert_eq!(parse_color("white"), Some(Color::White));
        assert_eq!(parse_color("C"), None);
        assert_eq!(parse_color(""), None);
    }

    #[test]
    fn test_format_color() {
        assert_eq!(format_color(Color::Black), "B");
        assert_eq!(format_color(Color::White), "W");
    }

    #[test]
    fn test_format_vertex() {
        assert_eq!(format_vertex(4, 4), "D4");
        assert_eq!(format_vertex(16, 16), "Q16");
        assert_eq!(format_vertex(8, 1), "H1");
        assert_eq!(format_vertex(9, 1), "J1", "column I is skipped");
        assert_eq!(format_vertex(19, 19), "T19");
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(parse_move("B D4"), Ok((Color::Black, 4, 4)));
        assert_eq!(parse_move("WHITE q16 XXX"), Ok((Color::White, 16, 16)));
        assert!(parse_move("C X").is_err());
        assert!(parse_move("B 55").is_err());
        assert!(parse_move("B dd").is_err());
        assert!(parse_move("B X").is_err());
        assert!(parse_move("B").is_err());
        assert!(parse_move("").is_err());
        assert!(parse_move("B I5").is_err(), "I is not a column");
        assert!(parse_move("B pass").is_err());
    }

    #[test]
    fn test_format_move() {
        assert_eq!(format_move(Color::Black, 3, 2), "B C2");
    }

    #[test]
    fn test_parse_vertex() {
        assert_eq!(parse_vertex("pass"), Ok(Vertex::Pass));
        assert_eq!(parse_vertex("PASS"), Ok(Vertex::Pass));
        assert_eq!(parse_vertex("resign"), Ok(Vertex::Resign));
        assert_eq!(parse_vertex("Q16"), Ok(Vertex::point(16, 16)));
        assert!(parse_vertex("Z").is_err());
        assert_eq!(" d4 ".parse::<Vertex>(), Ok(Vertex::point(4, 4)));
    }

    #[test]
    fn test_vertex_display() {
        assert_eq!(Vertex::point(4, 4).to_string(), "D4");
        assert_eq!(Vertex::Pass.to_string(), "PASS");
        assert_eq!(Vertex::Resign.to_string(), "RESIGN");
    }

    proptest! {
        #[test]
        fn move_format_parses_back(x in 1usize..=19, y in 1usize..=19, black in any::<bool>()) {
            let color = if black { Color::Black } else { Color::White };
            prop_assert_eq!(parse_move(&format_move(color, x, y)), Ok((color, x, y)));
        }
    }
}

use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    str::FromStr,
    sync::Arc,
};

use nom::{
    bytes::complete::take_till1,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res},
    sequence::{preceded, separated_pair, tuple},
    IResult,
};
use nom_locate::LocatedSpan;
use thiserror::Error;

/// A span of source text. Coordinates are 0-based; the display form is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    file_name: Arc<str>,
    start_line: usize,
    start_column: usize,
    end_line: usize,
    end_column: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationParseError {
    #[error("malformed source location `{0}`")]
    Malformed(String),
    #[error("source location `{0}` has a zero line or column")]
    ZeroCoordinate(String),
}

impl SourceLocation {
    pub fn new(
        file_name: impl Into<Arc<str>>,
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Placeholder for values that did not come from any source file.
    pub fn unknown() -> Self {
        Self::new("<unknown>", 1, 1, 1, 1)
    }

    /// Build a location from two `nom_locate` spans: the start of a token and the
    /// remaining input after it.
    pub fn from_spans<X>(
        file_name: impl Into<Arc<str>>,
        start: &LocatedSpan<&str, X>,
        end: &LocatedSpan<&str, X>,
    ) -> Self {
        Self::new(
            file_name,
            start.location_line() as usize - 1,
            start.get_utf8_column() - 1,
            end.location_line() as usize - 1,
            end.get_utf8_column() - 1,
        )
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }

    pub fn start_column(&self) -> usize {
        self.start_column
    }

    pub fn end_line(&self) -> usize {
        self.end_line
    }

    pub fn end_column(&self) -> usize {
        self.end_column
    }

    /// The empty location immediately following this one.
    pub fn after(&self) -> Self {
        Self::new(
            self.file_name.clone(),
            self.end_line,
            self.end_column,
            self.end_line,
            self.end_column,
        )
    }

    pub fn plus_columns(&self, columns: usize) -> Self {
        Self::new(
            self.file_name.clone(),
            self.start_line,
            self.start_column,
            self.end_line,
            self.end_column + columns,
        )
    }

    /// Extend the end by whole lines; the end column moves to the start of the line.
    pub fn plus_lines(&self, lines: usize) -> Self {
        Self::new(
            self.file_name.clone(),
            self.start_line,
            self.start_column,
            self.end_line + lines,
            0,
        )
    }

    /// Whether this location ends strictly after `other`.
    pub fn is_further(&self, other: &SourceLocation) -> bool {
        match self.end_line.cmp(&other.end_line) {
            Ordering::Equal => self.end_column > other.end_column,
            ordering => ordering == Ordering::Greater,
        }
    }

    pub fn same_start(&self, other: &SourceLocation) -> bool {
        self.file_name == other.file_name
            && self.start_line == other.start_line
            && self.start_column == other.start_column
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.file_name,
            self.start_line + 1,
            self.start_column + 1,
            self.end_line + 1,
            self.end_column + 1
        )
    }
}

fn coordinate(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |digits: &str| digits.parse::<usize>())(input)
}

fn position(input: &str) -> IResult<&str, (usize, usize)> {
    separated_pair(coordinate, char(':'), coordinate)(input)
}

fn location(input: &str) -> IResult<&str, (&str, (usize, usize), (usize, usize))> {
    tuple((
        take_till1(|c: char| c == ':'),
        preceded(char(':'), position),
        preceded(char('-'), position),
    ))(input)
}

impl FromStr for SourceLocation {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (file_name, (start_line, start_column), (end_line, end_column))) =
            all_consuming(location)(s).map_err(|_| LocationParseError::Malformed(s.to_owned()))?;
        let zero_based = |coordinate: usize| {
            coordinate
                .checked_sub(1)
                .ok_or_else(|| LocationParseError::ZeroCoordinate(s.to_owned()))
        };
        Ok(Self::new(
            file_name,
            zero_based(start_line)?,
            zero_based(start_column)?,
            zero_based(end_line)?,
            zero_based(end_column)?,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nom::bytes::complete::tag;

    #[test]
    fn display_is_one_based() {
        assert_eq!(
            SourceLocation::new("f.txt", 1, 2, 3, 4).to_string(),
            "f.txt:2:3-4:5"
        );
        assert_eq!(SourceLocation::unknown().to_string(), "<unknown>:2:2-2:2");
    }

    #[test]
    fn after_collapses_to_end() {
        let after = SourceLocation::new("f.txt", 1, 2, 3, 4).after();
        assert_eq!(after, SourceLocation::new("f.txt", 3, 4, 3, 4));
    }

    #[test]
    fn extend_end() {
        let location = SourceLocation::new("f.txt", 1, 2, 3, 4);
        assert_eq!(
            location.plus_columns(3),
            SourceLocation::new("f.txt", 1, 2, 3, 7)
        );
        assert_eq!(
            location.plus_lines(2),
            SourceLocation::new("f.txt", 1, 2, 5, 0)
        );
    }

    #[test]
    fn further_compares_ends() {
        let short = SourceLocation::new("f.txt", 0, 0, 1, 5);
        let long = SourceLocation::new("f.txt", 0, 0, 1, 6);
        let next_line = SourceLocation::new("f.txt", 0, 0, 2, 0);
        assert!(long.is_further(&short));
        assert!(!short.is_further(&long));
        assert!(!short.is_further(&short));
        assert!(next_line.is_further(&long));
    }

    #[test]
    fn same_start_ignores_end() {
        let a = SourceLocation::new("f.txt", 4, 2, 4, 9);
        let b = SourceLocation::new("f.txt", 4, 2, 7, 1);
        let c = SourceLocation::new("g.txt", 4, 2, 4, 9);
        assert!(a.same_start(&b));
        assert!(!a.same_start(&c));
    }

    #[test]
    fn parse_display_form() {
        let location: SourceLocation = "lib/x.flbgst:10:3-12:1"
            .parse()
            .expect("should parse location");
        assert_eq!(location, SourceLocation::new("lib/x.flbgst", 9, 2, 11, 0));
        assert_eq!(
            "x:0:1-1:1".parse::<SourceLocation>(),
            Err(LocationParseError::ZeroCoordinate("x:0:1-1:1".to_owned()))
        );
        assert!(matches!(
            "x:1:1".parse::<SourceLocation>(),
            Err(LocationParseError::Malformed(_))
        ));
    }

    #[test]
    fn from_nom_spans() {
        let start = LocatedSpan::new("abc\ndef");
        let (rest, _) = tag::<_, _, nom::error::Error<_>>("abc\nd")(start)
            .expect("should consume prefix");
        let location = SourceLocation::from_spans("t.txt", &start, &rest);
        assert_eq!(location, SourceLocation::new("t.txt", 0, 0, 1, 1));
    }
}

//! Parser for the parenthesized world-description records.
//!
//! ```text
//! (has block1 color red)
//! (has block1 location 0 0 0)
//! (is block2 on-top-of block1)
//! (is block3 side-by-side block1)
//! ```
//!
//! A `has` record that cannot be read is fatal. Unrecognized `is` relations
//! are reported through [`Description::skipped`] and otherwise ignored.

use crate::block::BlockId;
use crate::error::ParseError;
use crate::geom::Point3;

/// One parsed record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Color { block: BlockId, color: String },
    Location { block: BlockId, at: Point3 },
    OnTopOf { upper: BlockId, lower: BlockId },
    SideBySide { a: BlockId, b: BlockId },
}

impl Record {
    /// Every block id mentioned by the record.
    pub fn ids(&self) -> impl Iterator<Item = &BlockId> {
        let (a, b) = match self {
            Record::Color { block, .. } | Record::Location { block, .. } => (block, None),
            Record::OnTopOf { upper, lower } => (upper, Some(lower)),
            Record::SideBySide { a, b } => (a, Some(b)),
        };
        std::iter::once(a).chain(b)
    }
}

/// A parsed file: records with their 1-based line numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Description {
    pub records: Vec<(usize, Record)>,
    /// Lines that were recognized as records but not understood.
    pub skipped: Vec<(usize, String)>,
}

impl Description {
    /// Every mentioned block id, in first-mention order, without repeats.
    pub fn ids(&self) -> Vec<BlockId> {
        let mut out: Vec<BlockId> = Vec::new();
        for (_, r) in &self.records {
            for id in r.ids() {
                if !out.contains(id) {
                    out.push(id.clone());
                }
            }
        }
        out
    }

    /// Records without line numbers.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().map(|(_, r)| r)
    }
}

/// Parse a whole description.
pub fn parse(text: &str) -> Result<Description, ParseError> {
    let mut desc = Description::default();
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_line(line, trimmed)? {
            Some(r) => desc.records.push((line, r)),
            None => desc.skipped.push((line, trimmed.to_owned())),
        }
    }
    Ok(desc)
}

fn parse_line(line: usize, text: &str) -> Result<Option<Record>, ParseError> {
    let malformed = || ParseError::Malformed {
        line,
        text: text.to_owned(),
    };
    let inner = text
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let words: Vec<&str> = inner.split_whitespace().collect();
    match words.as_slice() {
        ["has", id, "color", color] => Ok(Some(Record::Color {
            block: BlockId::new(id),
            color: (*color).to_owned(),
        })),
        ["has", id, "location", x, y, z] => Ok(Some(Record::Location {
            block: BlockId::new(id),
            at: Point3::new(int(line, x)?, int(line, y)?, int(line, z)?),
        })),
        ["has", _, "color" | "location", ..] => Err(malformed()),
        ["has", _, property, ..] => Err(ParseError::UnsupportedProperty {
            line,
            property: (*property).to_owned(),
        }),
        ["is", upper, rel, lower] if rel.eq_ignore_ascii_case("on-top-of") => {
            Ok(Some(Record::OnTopOf {
                upper: BlockId::new(upper),
                lower: BlockId::new(lower),
            }))
        }
        ["is", a, rel, b] if rel.eq_ignore_ascii_case("side-by-side") => {
            Ok(Some(Record::SideBySide {
                a: BlockId::new(a),
                b: BlockId::new(b),
            }))
        }
        ["is", ..] => Ok(None),
        _ => Err(malformed()),
    }
}

fn int(line: usize, w: &str) -> Result<i32, ParseError> {
    w.parse().map_err(|_| ParseError::BadInteger {
        line,
        value: w.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
(has block1 color red)
(has block1 location 0 0 0)

(has block2 location 0 0 1)
(is block2 on-top-of block1)
(is block3 side-by-side block1)
(is block3 near block1)
";

    #[test]
    fn parses_all_record_kinds() {
        let d = parse(SAMPLE).unwrap();
        assert_eq!(d.records.len(), 5);
        assert_eq!(d.records[0].0, 2);
        assert_eq!(
            d.records[2].1,
            Record::Location {
                block: BlockId::new("block2"),
                at: Point3::new(0, 0, 1)
            }
        );
        assert_eq!(d.skipped, vec![(8, "(is block3 near block1)".to_owned())]);
        let ids: Vec<_> = d.ids().into_iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, ["block1", "block2", "block3"]);
    }

    #[test]
    fn bad_location_is_fatal_with_line() {
        let err = parse("(has b location 1 two 0)").unwrap_err();
        assert_eq!(
            err,
            ParseError::BadInteger {
                line: 1,
                value: "two".into()
            }
        );
        let err = parse("\n(has b location 1 2)").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { line: 2, .. }));
    }

    #[test]
    fn unknown_property_is_fatal() {
        let err = parse("(has b weight 3)").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedProperty { line: 1, .. }));
    }

    #[test]
    fn missing_parens_is_fatal() {
        assert!(parse("has b color red").is_err());
    }
}

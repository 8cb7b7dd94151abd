//! Catalog id space: a list of disjoint inclusive ranges and a uniform pick over their union.

use std::fmt;

use rand::Rng;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdRange {
    pub start: u64,
    pub end: u64,
}

impl IdRange {
    pub fn new(start: u64, end: u64) -> Result<Self, RangeParseError> {
        if start > end {
            return Err(RangeParseError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of ids in the range (both bounds inclusive).
    pub fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.start <= id && id <= self.end
    }

    fn overlaps(&self, other: &IdRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("no ranges given")]
    Empty,
    #[error("malformed range {0:?}, expected start-end")]
    Malformed(String),
    #[error("range {start}-{end} has start after end")]
    Reversed { start: u64, end: u64 },
    #[error("ranges {0} and {1} overlap")]
    Overlap(IdRange, IdRange),
}

/// Parses `start-end[,start-end...]`, keeping the given order.
pub fn parse_ranges(s: &str) -> Result<Vec<IdRange>, RangeParseError> {
    let mut out: Vec<IdRange> = Vec::new();
    for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        let (start, end) = item
            .split_once('-')
            .ok_or_else(|| RangeParseError::Malformed(item.to_string()))?;
        let start: u64 = start.trim().parse().map_err(|_| RangeParseError::Malformed(item.to_string()))?;
        let end: u64 = end.trim().parse().map_err(|_| RangeParseError::Malformed(item.to_string()))?;
        let range = IdRange::new(start, end)?;
        if let Some(prev) = out.iter().find(|r| r.overlaps(&range)) {
            return Err(RangeParseError::Overlap(*prev, range));
        }
        out.push(range);
    }
    if out.is_empty() { return Err(RangeParseError::Empty); }
    Ok(out)
}

pub fn total_count(ranges: &[IdRange]) -> u64 {
    ranges.iter().fold(0u64, |acc, r| acc.saturating_add(r.len()))
}

/// Maps a draw in `[0, total_count)` onto an id, walking the ranges in order.
/// Draws past the addressable space map to `None`.
pub fn pick_with_draw(ranges: &[IdRange], draw: u64) -> Option<u64> {
    let mut index = draw;
    for r in ranges {
        if index < r.len() {
            return Some(r.start + index);
        }
        index -= r.len();
    }
    None
}

pub fn pick_random<R: Rng + ?Sized>(ranges: &[IdRange], rng: &mut R) -> Option<u64> {
    let total = total_count(ranges);
    if total == 0 { return None; }
    pick_with_draw(ranges, rng.random_range(0..total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn draws_map_to_expected_ids() {
        let cases = [
            ("1-5,10-15", 3, 4),
            ("1-5,10-15", 7, 12),
            ("0-1000,2000-3000", 1500, 2499),
            ("0-1000,2000-3000", 2001, 3000),
        ];
        for (ranges, draw, expected) in cases {
            let ranges = parse_ranges(ranges).unwrap();
            assert_eq!(pick_with_draw(&ranges, draw), Some(expected), "draw={draw}");
        }
    }

    #[test]
    fn boundary_draws_cross_into_next_range() {
        let ranges = parse_ranges("1-5,10-15").unwrap();
        // index 4 is the last of 1-5
        assert_eq!(pick_with_draw(&ranges, 4), Some(5));
        assert_eq!(pick_with_draw(&ranges, 5), Some(10));
        assert_eq!(pick_with_draw(&ranges, 10), Some(15));
    }

    #[test]
    fn draw_past_space_is_none() {
        let ranges = parse_ranges("1-5,10-15").unwrap();
        assert_eq!(total_count(&ranges), 11);
        assert_eq!(pick_with_draw(&ranges, 11), None);
    }

    #[test]
    fn mapping_is_order_preserving_bijection() {
        let ranges = parse_ranges("3-4, 20-22, 7-7").unwrap();
        let ids: Vec<u64> = (0..total_count(&ranges))
            .map(|d| pick_with_draw(&ranges, d).unwrap())
            .collect();
        assert_eq!(ids, vec![3, 4, 20, 21, 22, 7]);
        for id in &ids {
            assert_eq!(ranges.iter().filter(|r| r.contains(*id)).count(), 1);
        }
    }

    #[test]
    fn random_pick_stays_in_ranges() {
        let ranges = parse_ranges("1-5,10-15").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let id = pick_random(&ranges, &mut rng).unwrap();
            assert!(ranges.iter().any(|r| r.contains(id)), "id {id} outside ranges");
        }
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(parse_ranges(""), Err(RangeParseError::Empty));
        assert_eq!(parse_ranges("1-"), Err(RangeParseError::Malformed("1-".into())));
        assert_eq!(parse_ranges("abc"), Err(RangeParseError::Malformed("abc".into())));
        assert_eq!(parse_ranges("9-3"), Err(RangeParseError::Reversed { start: 9, end: 3 }));
        assert!(matches!(parse_ranges("1-10,5-20"), Err(RangeParseError::Overlap(_, _))));
    }

    #[test]
    fn single_id_range() {
        let ranges = parse_ranges("42-42").unwrap();
        assert_eq!(total_count(&ranges), 1);
        assert_eq!(pick_with_draw(&ranges, 0), Some(42));
    }
}

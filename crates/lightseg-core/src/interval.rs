#![forbid(unsafe_code)]

//! Sparse integer sets stored as coalesced closed intervals.
//!
//! An [`IntervalSet`] represents an arbitrary subset of the integers as an
//! ordered list of disjoint closed [`Interval`]s. The list is kept in
//! canonical form after every mutation:
//!
//! 1. Intervals are sorted ascending by `from`.
//! 2. No two intervals overlap (`a.to < b.from`).
//! 3. No two intervals touch (`b.from - a.to >= 2`); touching runs are merged.
//! 4. Every interval is non-empty (`from <= to`; a single point is `from == to`).
//!
//! Because the form is canonical, two sets with the same members always have
//! identical interval lists, and the list can be sent over the wire as-is.
//!
//! # Example
//!
//! ```
//! use lightseg_core::interval::{Interval, IntervalSet};
//!
//! let mut set = IntervalSet::new();
//! set.insert(3);
//! set.insert(1);
//! set.insert(2);
//! assert_eq!(set.intervals(), &[Interval::new(1, 3)]);
//!
//! set.remove(2);
//! assert_eq!(set.to_string(), "1, 3");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// An addressable position (a light index on the strip).
pub type Point = i64;

/// Text rendered for a set with no members.
pub const EMPTY_TOKEN: &str = "empty";

/// Separator placed between intervals in the display form.
pub const SEPARATOR: &str = ", ";

/// A closed range `[from, to]` of points.
///
/// Serialized as `{"from": a, "to": b}`, which is the record the persistence
/// layer writes and reads back as a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    /// First member (inclusive).
    pub from: Point,
    /// Last member (inclusive).
    pub to: Point,
}

impl Interval {
    /// Create an interval.
    ///
    /// # Panics
    ///
    /// Panics if `from > to`.
    #[must_use]
    pub const fn new(from: Point, to: Point) -> Self {
        assert!(from <= to, "interval bounds are inverted");
        Self { from, to }
    }

    /// Create an interval, returning `None` if `from > to`.
    #[must_use]
    pub const fn try_new(from: Point, to: Point) -> Option<Self> {
        if from <= to {
            Some(Self { from, to })
        } else {
            None
        }
    }

    /// Create the single-point interval `[point, point]`.
    #[inline]
    #[must_use]
    pub const fn point(point: Point) -> Self {
        Self {
            from: point,
            to: point,
        }
    }

    /// Check if `point` lies inside this interval.
    #[inline]
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        self.from <= point && point <= self.to
    }

    /// Whether the interval holds exactly one point.
    #[inline]
    #[must_use]
    pub const fn is_point(&self) -> bool {
        self.from == self.to
    }

    /// Number of members.
    ///
    /// Saturates at `u64::MAX` for the full `i64` range.
    #[inline]
    #[must_use]
    pub const fn member_count(&self) -> u64 {
        self.to.abs_diff(self.from).saturating_add(1)
    }

    /// Whether `next` starts exactly one past the end of `self`.
    #[inline]
    #[must_use]
    pub const fn is_adjacent_to(&self, next: &Interval) -> bool {
        matches!(self.to.checked_add(1), Some(after) if after == next.from)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_point() {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// Intent for [`IntervalSet::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// Make the point a member.
    On,
    /// Make the point a non-member.
    Off,
}

impl From<bool> for Mark {
    fn from(on: bool) -> Self {
        if on { Mark::On } else { Mark::Off }
    }
}

/// A seed (or a mutated set) that breaks canonical form.
///
/// `index` is the position of the offending interval in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedError {
    /// `from > to`.
    Inverted {
        /// Position of the interval.
        index: usize,
        /// Its lower bound.
        from: Point,
        /// Its upper bound.
        to: Point,
    },
    /// The interval starts at or before the end of its predecessor
    /// (overlapping or out of order).
    Overlapping {
        /// Position of the later interval.
        index: usize,
    },
    /// The interval starts right after its predecessor and should have been merged.
    Adjacent {
        /// Position of the later interval.
        index: usize,
    },
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedError::Inverted { index, from, to } => {
                write!(f, "interval {index} is inverted ({from} > {to})")
            }
            SeedError::Overlapping { index } => {
                write!(f, "interval {index} overlaps or precedes interval {}", index - 1)
            }
            SeedError::Adjacent { index } => {
                write!(f, "interval {index} touches interval {} and is not merged", index - 1)
            }
        }
    }
}

impl std::error::Error for SeedError {}

/// Validate that `intervals` is in canonical form.
fn check_canonical(intervals: &[Interval]) -> Result<(), SeedError> {
    for (index, r) in intervals.iter().enumerate() {
        if r.from > r.to {
            return Err(SeedError::Inverted {
                index,
                from: r.from,
                to: r.to,
            });
        }
        if index == 0 {
            continue;
        }
        let prev = &intervals[index - 1];
        if r.from <= prev.to {
            return Err(SeedError::Overlapping { index });
        }
        if prev.is_adjacent_to(r) {
            return Err(SeedError::Adjacent { index });
        }
    }
    Ok(())
}

/// A set of points kept as sorted, disjoint, non-touching intervals.
///
/// Mutations scan the list once from the left and restore canonical form
/// inline, so their cost is proportional to the number of intervals before
/// the touched point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntervalSet {
    ranges: Vec<Interval>,
}

impl IntervalSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Create a set from previously saved intervals.
    ///
    /// The seed must already be canonical (sorted, disjoint, non-touching,
    /// non-empty). Malformed seeds are rejected rather than repaired.
    pub fn from_seed(seed: Vec<Interval>) -> Result<Self, SeedError> {
        if let Err(err) = check_canonical(&seed) {
            crate::warn!(error = %err, "rejecting non-canonical seed");
            return Err(err);
        }
        crate::debug!(intervals = seed.len(), "seeded interval set");
        Ok(Self { ranges: seed })
    }

    /// Check if `point` is a member.
    #[doc(alias = "get")]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        for r in &self.ranges {
            if point > r.to {
                continue;
            }
            // In or before r; nothing later can hold it.
            return point >= r.from;
        }
        false
    }

    /// Mark `point` on or off.
    ///
    /// Returns `true` if membership changed.
    pub fn set(&mut self, point: Point, mark: Mark) -> bool {
        match mark {
            Mark::On => self.insert(point),
            Mark::Off => self.remove(point),
        }
    }

    /// Make `point` a member, extending or merging neighbours as needed.
    ///
    /// Returns `true` if the point was not already a member.
    pub fn insert(&mut self, point: Point) -> bool {
        let changed = self.insert_inner(point);
        self.debug_check();
        changed
    }

    fn insert_inner(&mut self, point: Point) -> bool {
        let Some(i) = self.ranges.iter().position(|r| r.to >= point) else {
            // Past every interval (or empty).
            if let Some(last) = self.ranges.last_mut()
                && last.to.checked_add(1) == Some(point)
            {
                last.to = point;
            } else {
                self.ranges.push(Interval::point(point));
            }
            return true;
        };

        let next = self.ranges[i];
        if point >= next.from {
            return false;
        }

        let touches_next = point.checked_add(1) == Some(next.from);
        if i > 0 && self.ranges[i - 1].to.checked_add(1) == Some(point) {
            if touches_next {
                // Bridges prev and next.
                self.ranges[i - 1].to = next.to;
                self.ranges.remove(i);
            } else {
                self.ranges[i - 1].to = point;
            }
            return true;
        }

        if touches_next {
            self.ranges[i].from = point;
        } else {
            self.ranges.insert(i, Interval::point(point));
        }
        true
    }

    /// Make `point` a non-member, shrinking or splitting its interval.
    ///
    /// Returns `true` if the point was a member.
    pub fn remove(&mut self, point: Point) -> bool {
        let changed = self.remove_inner(point);
        self.debug_check();
        changed
    }

    fn remove_inner(&mut self, point: Point) -> bool {
        let Some(i) = self.ranges.iter().position(|r| r.to >= point) else {
            return false;
        };

        let r = self.ranges[i];
        if point < r.from {
            return false;
        }

        if r.is_point() {
            self.ranges.remove(i);
        } else if point == r.from {
            self.ranges[i].from = point + 1;
        } else if point == r.to {
            self.ranges[i].to = point - 1;
        } else {
            // Strictly interior: split in two.
            crate::trace!(point, from = r.from, to = r.to, "splitting interval");
            self.ranges[i].to = point - 1;
            self.ranges.insert(i + 1, Interval::new(point + 1, r.to));
        }
        true
    }

    /// The intervals in ascending order.
    #[inline]
    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.ranges
    }

    /// Owned copy of the intervals for serialization.
    #[doc(alias = "to_transport_form")]
    #[must_use]
    pub fn to_transport(&self) -> Vec<Interval> {
        self.ranges.clone()
    }

    /// Iterate over the intervals in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.ranges.iter()
    }

    /// Number of intervals (not members).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the set has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of member points, saturating at `u64::MAX`.
    #[must_use]
    pub fn member_count(&self) -> u64 {
        self.ranges
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.member_count()))
    }

    /// Remove every member.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Verify canonical form.
    ///
    /// Always `Ok` for sets built through this API.
    pub fn check_canonical(&self) -> Result<(), SeedError> {
        check_canonical(&self.ranges)
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert!(
            self.check_canonical().is_ok(),
            "interval set lost canonical form: {:?}",
            self.ranges
        );
    }
}

impl TryFrom<Vec<Interval>> for IntervalSet {
    type Error = SeedError;

    fn try_from(seed: Vec<Interval>) -> Result<Self, Self::Error> {
        Self::from_seed(seed)
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl FromIterator<Point> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut set = IntervalSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Point> for IntervalSet {
    fn extend<I: IntoIterator<Item = Point>>(&mut self, iter: I) {
        for point in iter {
            self.insert(point);
        }
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ranges.is_empty() {
            return f.write_str(EMPTY_TOKEN);
        }
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(SEPARATOR)?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(from: Point, to: Point) -> Interval {
        Interval::new(from, to)
    }

    fn inserted(points: &[Point]) -> IntervalSet {
        points.iter().copied().collect()
    }

    fn seeded(seed: &[(Point, Point)]) -> IntervalSet {
        IntervalSet::from_seed(seed.iter().map(|&(a, b)| iv(a, b)).collect()).unwrap()
    }

    // --- insert ---

    #[test]
    fn insert_single() {
        assert_eq!(inserted(&[3]).intervals(), &[iv(3, 3)]);
    }

    #[test]
    fn insert_extends_left() {
        assert_eq!(inserted(&[3, 2]).intervals(), &[iv(2, 3)]);
    }

    #[test]
    fn insert_isolated_before() {
        assert_eq!(inserted(&[3, 1]).intervals(), &[iv(1, 1), iv(3, 3)]);
    }

    #[test]
    fn insert_bridges_two_intervals() {
        assert_eq!(inserted(&[3, 1, 2]).intervals(), &[iv(1, 3)]);
    }

    #[test]
    fn insert_extends_right() {
        assert_eq!(inserted(&[3, 4]).intervals(), &[iv(3, 4)]);
    }

    #[test]
    fn insert_isolated_between() {
        assert_eq!(
            inserted(&[3, 10, 5]).intervals(),
            &[iv(3, 3), iv(5, 5), iv(10, 10)]
        );
    }

    #[test]
    fn insert_extends_predecessor_without_bridging() {
        let mut set = seeded(&[(1, 2), (6, 8)]);
        assert!(set.insert(3));
        assert_eq!(set.intervals(), &[iv(1, 3), iv(6, 8)]);
    }

    #[test]
    fn insert_existing_is_noop() {
        let mut set = seeded(&[(1, 5)]);
        assert!(!set.insert(1));
        assert!(!set.insert(3));
        assert!(!set.insert(5));
        assert_eq!(set.intervals(), &[iv(1, 5)]);
    }

    #[test]
    fn insert_negative_points() {
        let set = inserted(&[-1, -3, -2, 0]);
        assert_eq!(set.intervals(), &[iv(-3, 0)]);
    }

    #[test]
    fn insert_at_integer_extremes() {
        let mut set = IntervalSet::new();
        set.insert(Point::MAX);
        set.insert(Point::MIN);
        set.insert(Point::MAX - 1);
        set.insert(Point::MIN + 1);
        assert_eq!(
            set.intervals(),
            &[iv(Point::MIN, Point::MIN + 1), iv(Point::MAX - 1, Point::MAX)]
        );
        assert!(set.remove(Point::MAX));
        assert!(set.remove(Point::MIN));
        assert_eq!(
            set.intervals(),
            &[iv(Point::MIN + 1, Point::MIN + 1), iv(Point::MAX - 1, Point::MAX - 1)]
        );
    }

    // --- remove ---

    #[test]
    fn remove_singleton() {
        let mut set = seeded(&[(3, 3)]);
        assert!(set.remove(3));
        assert!(set.is_empty());
    }

    #[test]
    fn remove_shrinks_left() {
        let mut set = seeded(&[(3, 4)]);
        set.remove(3);
        assert_eq!(set.intervals(), &[iv(4, 4)]);
    }

    #[test]
    fn remove_shrinks_right() {
        let mut set = seeded(&[(3, 4)]);
        set.remove(4);
        assert_eq!(set.intervals(), &[iv(3, 3)]);
    }

    #[test]
    fn remove_splits_interior() {
        let mut set = seeded(&[(3, 5)]);
        set.remove(4);
        assert_eq!(set.intervals(), &[iv(3, 3), iv(5, 5)]);
    }

    #[test]
    fn remove_middle_singleton() {
        let mut set = seeded(&[(3, 3), (5, 5), (7, 7)]);
        set.remove(5);
        assert_eq!(set.intervals(), &[iv(3, 3), iv(7, 7)]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut set = seeded(&[(3, 5), (9, 9)]);
        assert!(!set.remove(1));
        assert!(!set.remove(7));
        assert!(!set.remove(100));
        assert_eq!(set.intervals(), &[iv(3, 5), iv(9, 9)]);

        let mut empty = IntervalSet::new();
        assert!(!empty.remove(0));
    }

    // --- contains ---

    #[test]
    fn contains_empty_is_false() {
        assert!(!IntervalSet::new().contains(0));
    }

    #[test]
    fn contains_past_last_is_false() {
        let set = seeded(&[(1, 2), (5, 6)]);
        assert!(!set.contains(7));
        assert!(!set.contains(Point::MAX));
    }

    #[test]
    fn contains_gap_and_members() {
        let set = seeded(&[(1, 2), (5, 6)]);
        assert!(!set.contains(0));
        assert!(set.contains(1));
        assert!(set.contains(2));
        assert!(!set.contains(3));
        assert!(!set.contains(4));
        assert!(set.contains(5));
        assert!(set.contains(6));
    }

    // --- set ---

    #[test]
    fn set_dispatches_on_mark() {
        let mut set = IntervalSet::new();
        assert!(set.set(4, Mark::On));
        assert!(set.contains(4));
        assert!(set.set(4, Mark::from(false)));
        assert!(!set.contains(4));
        assert!(!set.set(4, Mark::Off));
    }

    // --- display ---

    #[test]
    fn display_empty() {
        assert_eq!(IntervalSet::new().to_string(), "empty");
    }

    #[test]
    fn display_mixed() {
        let set = seeded(&[(1, 1), (3, 7), (10, 10)]);
        assert_eq!(set.to_string(), "1, 3-7, 10");
    }

    #[test]
    fn display_negative_range() {
        let set = seeded(&[(-4, -2)]);
        assert_eq!(set.to_string(), "-4--2");
    }

    // --- seeds ---

    #[test]
    fn seed_accepts_canonical() {
        let set = seeded(&[(0, 4), (6, 6), (10, 12)]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.member_count(), 9);
    }

    #[test]
    fn seed_rejects_inverted() {
        let err = IntervalSet::from_seed(vec![Interval { from: 5, to: 2 }]).unwrap_err();
        assert_eq!(
            err,
            SeedError::Inverted {
                index: 0,
                from: 5,
                to: 2
            }
        );
    }

    #[test]
    fn seed_rejects_overlap_and_disorder() {
        let err = IntervalSet::from_seed(vec![iv(0, 5), iv(5, 8)]).unwrap_err();
        assert_eq!(err, SeedError::Overlapping { index: 1 });

        let err = IntervalSet::from_seed(vec![iv(10, 12), iv(0, 1)]).unwrap_err();
        assert_eq!(err, SeedError::Overlapping { index: 1 });
    }

    #[test]
    fn seed_rejects_adjacent() {
        let err = IntervalSet::try_from(vec![iv(0, 2), iv(3, 4)]).unwrap_err();
        assert_eq!(err, SeedError::Adjacent { index: 1 });
        assert!(err.to_string().contains("not merged"));
    }

    #[test]
    fn transport_serializes_from_to_records() {
        let set = seeded(&[(1, 3), (7, 7)]);
        let json = serde_json::to_string(&set.to_transport()).unwrap();
        assert_eq!(json, r#"[{"from":1,"to":3},{"from":7,"to":7}]"#);
    }

    #[test]
    fn interval_helpers() {
        assert_eq!(Interval::try_new(3, 1), None);
        assert_eq!(Interval::try_new(1, 3), Some(iv(1, 3)));
        assert_eq!(iv(1, 3).member_count(), 3);
        assert_eq!(iv(Point::MIN, Point::MAX).member_count(), u64::MAX);
        assert!(iv(1, 3).is_adjacent_to(&iv(4, 9)));
        assert!(!iv(1, 3).is_adjacent_to(&iv(5, 9)));
        assert!(!iv(0, Point::MAX).is_adjacent_to(&iv(Point::MIN, 0)));
    }

    #[test]
    #[should_panic(expected = "inverted")]
    fn interval_new_panics_when_inverted() {
        let _ = Interval::new(2, 1);
    }
}

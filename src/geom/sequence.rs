//! Segment ordering: greedy nearest-neighbor sequencing, gap-based splitting
//! and start-point utilities.
//!
//! Sequencing and splitting share one walk ([`NearestWalk`]): starting from a
//! seed segment, repeatedly take the remaining segment whose entry point is
//! closest to the current exit point. This is a heuristic with O(n²)
//! comparisons, meant for tens to low hundreds of segments. It is not a tour
//! solver.

use super::point::{Curve, CurvePoint, CurveSet};
use super::vector::distance;

// ============================================================================
// Walk
// ============================================================================

/// One placement made by [`NearestWalk`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkStep {
    /// Index of the placed segment in the input slice.
    pub index: usize,
    /// The segment is traversed last point first.
    pub reversed: bool,
    /// Distance from the previous exit point to this segment's entry point.
    /// Zero when there was no previous exit point.
    pub gap: f64,
}

/// Greedy nearest-successor walk over a segment set.
///
/// The seed (`start`, or the first segment) is not yielded: it is available
/// through [`NearestWalk::seed`]. The first input segment equal to the seed
/// is removed from the pool. Ties go to the segment that comes first in the
/// input, which makes the walk deterministic.
#[derive(Debug, Clone)]
pub struct NearestWalk<'a> {
    segments: &'a [Curve],
    seed: &'a [CurvePoint],
    remaining: Vec<usize>,
    exit: Option<[f64; 3]>,
    allow_reverse: bool,
}

impl<'a> NearestWalk<'a> {
    #[must_use]
    pub fn new(segments: &'a [Curve], start: Option<&'a [CurvePoint]>, allow_reverse: bool) -> Self {
        let seed = seed_segment(segments, start);

        let mut remaining: Vec<usize> = (0..segments.len()).collect();
        if let Some(pos) = segments.iter().position(|s| s.as_slice() == seed) {
            remaining.remove(pos);
        }

        Self {
            segments,
            seed,
            remaining,
            exit: seed.last().map(|p| p.position),
            allow_reverse,
        }
    }

    /// The segment the walk starts from.
    #[must_use]
    pub fn seed(&self) -> &'a [CurvePoint] {
        self.seed
    }

    /// Number of segments still to be placed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Distance to enter `segment` from the current exit, and whether it is
    /// entered through its last point. Empty segments sort last.
    fn entry_cost(&self, segment: &[CurvePoint]) -> (f64, bool) {
        let (Some(first), Some(last)) = (segment.first(), segment.last()) else {
            return (f64::INFINITY, false);
        };
        let Some(exit) = self.exit else {
            return (0.0, false);
        };

        let to_first = distance(exit, first.position);
        if !self.allow_reverse {
            return (to_first, false);
        }
        let to_last = distance(exit, last.position);
        if to_last < to_first {
            (to_last, true)
        } else {
            (to_first, false)
        }
    }
}

impl Iterator for NearestWalk<'_> {
    type Item = WalkStep;

    fn next(&mut self) -> Option<WalkStep> {
        let mut best: Option<(usize, f64, bool)> = None;
        for (slot, &index) in self.remaining.iter().enumerate() {
            let (cost, reversed) = self.entry_cost(&self.segments[index]);
            if best.is_none_or(|(_, best_cost, _)| cost < best_cost) {
                best = Some((slot, cost, reversed));
            }
        }

        let (slot, gap, reversed) = best?;
        let index = self.remaining.remove(slot);
        let segment = &self.segments[index];
        let exit = if reversed { segment.first() } else { segment.last() };
        if let Some(exit) = exit {
            self.exit = Some(exit.position);
        }

        Some(WalkStep {
            index,
            reversed,
            gap: if gap.is_finite() { gap } else { 0.0 },
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining.len(), Some(self.remaining.len()))
    }
}

/// `start`, or the first segment.
fn seed_segment<'a>(segments: &'a [Curve], start: Option<&'a [CurvePoint]>) -> &'a [CurvePoint] {
    match start {
        Some(start) => start,
        None => segments.first().map(Vec::as_slice).unwrap_or_default(),
    }
}

fn placed(segments: &[Curve], step: WalkStep) -> Curve {
    let mut segment = segments[step.index].clone();
    if step.reversed {
        segment.reverse();
    }
    segment
}

// ============================================================================
// Sequencer
// ============================================================================

/// Strategy that turns an unordered segment set into a travel order.
///
/// Implementors only choose the placements. Sorting and gap splitting are
/// built on top of [`SegmentSequencer::walk`].
pub trait SegmentSequencer {
    /// Placements after the seed segment (`start`, or the first segment),
    /// in travel order. Every other segment is placed exactly once.
    fn walk(&self, segments: &[Curve], start: Option<&[CurvePoint]>) -> Vec<WalkStep>;

    /// Order `segments`, starting from `start` (default: the first segment).
    fn sequence(&self, segments: &[Curve], start: Option<&[CurvePoint]>) -> CurveSet {
        if segments.is_empty() {
            return Vec::new();
        }

        let steps = self.walk(segments, start);
        let reversed = steps.iter().filter(|step| step.reversed).count();
        let mut ordered = Vec::with_capacity(steps.len() + 1);
        ordered.push(seed_segment(segments, start).to_vec());
        ordered.extend(steps.into_iter().map(|step| placed(segments, step)));

        log::debug!(
            "sort_segments: {} segments ordered, {} reversed",
            ordered.len(),
            reversed
        );
        ordered
    }
}

/// Greedy nearest-neighbor ordering, optionally reversing segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreedyNearestNeighbor {
    pub allow_reverse: bool,
}

impl GreedyNearestNeighbor {
    #[must_use]
    pub const fn new(allow_reverse: bool) -> Self {
        Self { allow_reverse }
    }
}

impl SegmentSequencer for GreedyNearestNeighbor {
    fn walk(&self, segments: &[Curve], start: Option<&[CurvePoint]>) -> Vec<WalkStep> {
        NearestWalk::new(segments, start, self.allow_reverse).collect()
    }
}

/// Order segments by greedy nearest neighbor.
///
/// The output begins with `start` (default `segments[0]`). Each following
/// segment is the remaining one whose first point (or either end point when
/// `allow_reverse`) is closest to the last point placed so far. A segment
/// entered through its last point is reversed. An empty input gives an empty
/// output.
#[must_use]
pub fn sort_segments(
    segments: &[Curve],
    start: Option<&[CurvePoint]>,
    allow_reverse: bool,
) -> CurveSet {
    GreedyNearestNeighbor::new(allow_reverse).sequence(segments, start)
}

// ============================================================================
// Splitter
// ============================================================================

/// Partition segments into connected groups, in walk order.
///
/// Runs the greedy walk without reversal. Whenever the gap to the chosen
/// segment exceeds `gap_tol`, the current group is closed and the chosen
/// segment starts a new one. Grouping follows the walk, not true distance
/// connectivity, so equidistant candidates can change the result.
#[must_use]
pub fn split_discontinuous(
    segments: &[Curve],
    gap_tol: f64,
    start: Option<&[CurvePoint]>,
) -> Vec<CurveSet> {
    split_with(&GreedyNearestNeighbor::new(false), segments, gap_tol, start)
}

/// [`split_discontinuous`] over the walk of any sequencer.
#[must_use]
pub fn split_with<S: SegmentSequencer + ?Sized>(
    sequencer: &S,
    segments: &[Curve],
    gap_tol: f64,
    start: Option<&[CurvePoint]>,
) -> Vec<CurveSet> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut groups = Vec::new();
    let mut current = vec![seed_segment(segments, start).to_vec()];
    for step in sequencer.walk(segments, start) {
        if step.gap > gap_tol {
            groups.push(std::mem::take(&mut current));
        }
        current.push(placed(segments, step));
    }
    groups.push(current);

    log::debug!(
        "split_discontinuous: {} segments -> {} groups (gap {})",
        segments.len(),
        groups.len(),
        gap_tol
    );
    groups
}

// ============================================================================
// Curve utilities
// ============================================================================

/// Concatenate curves in order.
#[must_use]
pub fn merge_curves(curves: &[Curve]) -> Curve {
    curves.iter().flatten().copied().collect()
}

/// Index of the point of `curve` closest to `target` (first on ties).
#[must_use]
pub fn closest_point_index(curve: &[CurvePoint], target: [f64; 3]) -> Option<usize> {
    curve
        .iter()
        .enumerate()
        .map(|(i, p)| (i, distance(p.position, target)))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

/// Locate the curve point nearest to `target` across a set.
///
/// An exact position match wins immediately. Returns `(curve index, point
/// index)`.
#[must_use]
pub fn nearest_curve_point(curves: &[Curve], target: [f64; 3]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for (ci, curve) in curves.iter().enumerate() {
        if let Some(pi) = curve.iter().position(|p| p.position == target) {
            return Some((ci, pi));
        }
        let Some(pi) = closest_point_index(curve, target) else {
            continue;
        };
        let d = distance(curve[pi].position, target);
        if best.is_none_or(|(_, _, bd)| d < bd) {
            best = Some((ci, pi, d));
        }
    }
    best.map(|(ci, pi, _)| (ci, pi))
}

/// Rotate a curve so it begins at `index`. The points that preceded it are
/// appended at the end, which suits closed contours.
#[must_use]
pub fn rotate_start(curve: &[CurvePoint], index: usize) -> Curve {
    if index == 0 || index >= curve.len() {
        return curve.to_vec();
    }
    let mut rotated = curve.to_vec();
    rotated.rotate_left(index);
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(a: [f64; 2], b: [f64; 2]) -> Curve {
        vec![CurvePoint::xyz(a[0], a[1], 0.0), CurvePoint::xyz(b[0], b[1], 0.0)]
    }

    #[test]
    fn walk_prefers_earliest_segment_on_ties() {
        let segments = vec![
            seg([0.0, 0.0], [1.0, 0.0]),
            seg([1.0, 1.0], [2.0, 1.0]),
            seg([1.0, -1.0], [2.0, -1.0]),
        ];
        let steps: Vec<_> = NearestWalk::new(&segments, None, false).collect();
        assert_eq!(steps[0].index, 1);
        assert!((steps[0].gap - 1.0).abs() < 1e-12);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn walk_seed_outside_input_keeps_all_segments() {
        let segments = vec![seg([0.0, 0.0], [1.0, 0.0])];
        let seed = seg([5.0, 5.0], [6.0, 6.0]);
        let walk = NearestWalk::new(&segments, Some(&seed), false);
        assert_eq!(walk.remaining(), 1);
        assert_eq!(walk.seed(), seed.as_slice());
    }

    #[test]
    fn sort_single_segment_unchanged() {
        let segments = vec![seg([0.0, 0.0], [1.0, 0.0])];
        assert_eq!(sort_segments(&segments, None, true), segments);
        assert!(sort_segments(&[], None, true).is_empty());
    }

    #[test]
    fn sort_reverses_when_last_point_is_nearer() {
        let segments = vec![seg([0.0, 0.0], [1.0, 0.0]), seg([5.0, 0.0], [1.1, 0.0])];
        let ordered = sort_segments(&segments, None, true);
        assert_eq!(ordered[1], seg([1.1, 0.0], [5.0, 0.0]));

        let ordered = sort_segments(&segments, None, false);
        assert_eq!(ordered[1], segments[1]);
    }

    #[test]
    fn split_closes_group_on_large_gap() {
        let segments = vec![
            seg([0.0, 0.0], [1.0, 0.0]),
            seg([1.0, 0.0], [2.0, 0.0]),
            seg([100.0, 0.0], [101.0, 0.0]),
        ];
        let groups = split_discontinuous(&segments, 5.0, None);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![segments[0].clone(), segments[1].clone()]);
        assert_eq!(groups[1], vec![segments[2].clone()]);
    }

    /// Keeps the input order and reports the real gaps.
    struct InputOrder;

    impl SegmentSequencer for InputOrder {
        fn walk(&self, segments: &[Curve], _start: Option<&[CurvePoint]>) -> Vec<WalkStep> {
            segments
                .windows(2)
                .enumerate()
                .map(|(k, pair)| WalkStep {
                    index: k + 1,
                    reversed: false,
                    gap: distance(pair[0][pair[0].len() - 1].position, pair[1][0].position),
                })
                .collect()
        }
    }

    #[test]
    fn split_follows_the_given_sequencer() {
        let segments = vec![
            seg([0.0, 0.0], [1.0, 0.0]),
            seg([100.0, 0.0], [101.0, 0.0]),
            seg([1.0, 0.0], [2.0, 0.0]),
        ];
        let groups = split_with(&InputOrder, &segments, 5.0, None);
        assert_eq!(groups.len(), 3);
        assert_eq!(InputOrder.sequence(&segments, None), segments);

        let greedy = split_discontinuous(&segments, 5.0, None);
        assert_eq!(greedy, vec![vec![segments[0].clone(), segments[2].clone()], vec![segments[1].clone()]]);
    }

    #[test]
    fn closest_point_and_rotation() {
        let curve = vec![
            CurvePoint::xyz(0.0, 0.0, 0.0),
            CurvePoint::xyz(1.0, 0.0, 0.0),
            CurvePoint::xyz(2.0, 0.0, 0.0),
        ];
        assert_eq!(closest_point_index(&curve, [1.2, 0.3, 0.0]), Some(1));
        assert_eq!(closest_point_index(&[], [0.0; 3]), None);

        let rotated = rotate_start(&curve, 1);
        assert_eq!(rotated, vec![curve[1], curve[2], curve[0]]);
    }

    #[test]
    fn nearest_curve_point_prefers_exact_match() {
        let curves = vec![seg([0.0, 0.0], [10.0, 0.0]), seg([3.0, 0.0], [4.0, 0.0])];
        assert_eq!(nearest_curve_point(&curves, [3.0, 0.0, 0.0]), Some((1, 0)));
        assert_eq!(nearest_curve_point(&curves, [9.0, 0.5, 0.0]), Some((0, 1)));
        assert_eq!(merge_curves(&curves).len(), 4);
    }
}

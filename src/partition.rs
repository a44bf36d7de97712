use std::collections::BTreeSet;
use crate::{
	ast::{Ast, NodeId},
	charset::{Range, MAX_CODEPOINT},
	Result,
};

/// Partition of the codepoint space induced by the leaves of a tree.
///
/// Every leaf range is a union of consecutive intervals of the partition.
/// Anchors are kept apart: each one is its own interval.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Partition {
	points: Vec<u32>,
	anchors: Vec<u32>,
}

impl Partition {
	pub fn new(ast: &Ast, root: NodeId) -> Result<Partition> {
		let mut ranges = Vec::new();
		ast.visit(root, |_, id, _, _| {
			if let Some(node) = ast.get(id) {
				if node.is_leaf() {
					ranges.extend(node.ranges())
				}
			}

			true
		})?;

		Ok(Partition::from_ranges(ranges))
	}

	pub fn from_ranges<I: IntoIterator<Item = Range>>(ranges: I) -> Partition {
		let mut points = BTreeSet::new();
		let mut anchors = BTreeSet::new();
		points.insert(0);

		for range in ranges {
			if range.is_anchor() {
				anchors.insert(range.first());
			} else {
				points.insert(range.first());
				if range.last() < MAX_CODEPOINT {
					points.insert(range.last() + 1);
				}
			}
		}

		Partition {
			points: points.into_iter().collect(),
			anchors: anchors.into_iter().collect(),
		}
	}

	/// Sorted lower bounds of the intervals.
	pub fn points(&self) -> &[u32] {
		&self.points
	}

	pub fn anchors(&self) -> &[u32] {
		&self.anchors
	}

	/// Intervals in ascending order, followed by the anchors.
	pub fn intervals(&self) -> impl Iterator<Item = Range> + '_ {
		let points = &self.points;
		points
			.iter()
			.enumerate()
			.map(move |(i, first)| {
				let last = match points.get(i + 1) {
					Some(next) => next - 1,
					None => MAX_CODEPOINT,
				};

				Range::new(*first, last)
			})
			.chain(self.anchors.iter().map(|a| Range::single(*a)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::charset::{LINE_START, TEXT_END};

	fn cp(c: char) -> u32 {
		c as u32
	}

	#[test]
	fn points() {
		let mut ast = Ast::new();
		let az = ast.charset(vec![crate::ast::CharsetEntry::Range(Range::new(cp('a'), cp('z')))], false);
		let m = ast.literal('m');
		let root = ast.or(az, m);
		let partition = Partition::new(&ast, root).unwrap();
		assert_eq!(partition.points(), &[0, cp('a'), cp('m'), cp('n'), cp('{')]);

		let intervals: Vec<_> = partition.intervals().collect();
		assert_eq!(intervals.len(), 5);
		assert_eq!(intervals[0], Range::new(0, cp('a') - 1));
		assert_eq!(intervals[2], Range::single(cp('m')));
		assert_eq!(intervals[4], Range::new(cp('{'), MAX_CODEPOINT));
	}

	#[test]
	fn full_range_has_no_upper_point() {
		let partition = Partition::from_ranges(vec![Range::new(10, MAX_CODEPOINT)]);
		assert_eq!(partition.points(), &[0, 10]);
	}

	#[test]
	fn degenerate() {
		let mut ast = Ast::new();
		let empty = ast.empty();
		let partition = Partition::new(&ast, empty).unwrap();
		assert_eq!(partition.points(), &[0]);
		assert_eq!(partition.intervals().collect::<Vec<_>>(), vec![Range::new(0, MAX_CODEPOINT)]);
	}

	#[test]
	fn anchors_are_separate_intervals() {
		let partition = Partition::from_ranges(vec![Range::text_end(), Range::single(cp('a')), Range::line_start()]);
		assert_eq!(partition.points(), &[0, cp('a'), cp('b')]);
		assert_eq!(partition.anchors(), &[LINE_START, TEXT_END]);
		let intervals: Vec<_> = partition.intervals().collect();
		assert_eq!(intervals[3], Range::line_start());
		assert_eq!(intervals[4], Range::text_end());
	}
}

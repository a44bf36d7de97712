use crate::{
	ast::{Ast, Node, NodeId},
	position::{FollowPos, Position, PositionSet, Positions},
	Result,
};

/// Non-greedy attribution of positions.
///
/// A position is inherently lazy when one of its ancestors is a lazy
/// repetition. Its lazy parent is the innermost such repetition.
pub struct LazyAttribution {
	lazy: Vec<bool>,
	parent: Vec<Option<NodeId>>,
}

impl LazyAttribution {
	/// Attribution where no position is lazy.
	pub fn greedy(positions: &Positions) -> LazyAttribution {
		LazyAttribution {
			lazy: vec![false; positions.len()],
			parent: vec![None; positions.len()],
		}
	}

	pub fn new(ast: &Ast, root: NodeId, positions: &Positions) -> Result<LazyAttribution> {
		let mut attribution = LazyAttribution::greedy(positions);
		let mut stack = vec![(root, None)];

		while let Some((id, lazy_parent)) = stack.pop() {
			let node = ast.node(id)?;
			let lazy_parent = match node {
				Node::Repeat { lazy: true, .. } => Some(id),
				_ => lazy_parent,
			};

			if node.is_leaf() {
				if let (Some(p), Some(parent)) = (positions.of_node(id), lazy_parent) {
					log::debug!("position {} is lazy (parent {})", p, parent);
					let i = p.0 as usize - 1;
					attribution.lazy[i] = true;
					attribution.parent[i] = Some(parent);
				}
			}

			for child in node.children() {
				stack.push((child, lazy_parent))
			}
		}

		Ok(attribution)
	}

	pub fn is_lazy(&self, p: Position) -> bool {
		p.0 > 0 && self.lazy.get(p.0 as usize - 1).cloned().unwrap_or(false)
	}

	/// Innermost lazy repetition containing the position.
	pub fn lazy_parent(&self, p: Position) -> Option<NodeId> {
		if p.0 > 0 {
			self.parent.get(p.0 as usize - 1).cloned().flatten()
		} else {
			None
		}
	}

	/// Inherently lazy positions of the given set.
	pub fn inherent(&self, set: &PositionSet) -> PositionSet {
		set.iter().filter(|p| self.is_lazy(**p)).cloned().collect()
	}

	/// Lazy subset of `next`, reached from `group` through followpos.
	///
	/// A target is lazy if it is inherently lazy, or if it follows a source of
	/// the group that is itself lazy, either inherently or because it belongs
	/// to `current_lazy`.
	pub fn contagion(
		&self,
		group: &PositionSet,
		next: &PositionSet,
		current_lazy: &PositionSet,
		follow: &FollowPos,
	) -> Result<PositionSet> {
		let mut result = self.inherent(next);

		for s in group {
			if self.is_lazy(*s) || current_lazy.contains(s) {
				for t in follow.get(*s)? {
					if next.contains(t) {
						result.insert(*t);
					}
				}
			}
		}

		Ok(result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::position::Properties;

	fn set(positions: &[u32]) -> PositionSet {
		positions.iter().map(|p| Position(*p)).collect()
	}

	/// `(a|b)*?bb#`
	fn lazy_tree() -> (Ast, NodeId, NodeId) {
		let mut ast = Ast::new();
		let a = ast.literal('a');
		let b = ast.literal('b');
		let or = ast.or(a, b);
		let star = ast.repeat(or, 0, -1, true);
		let bb = ast.string("bb");
		let body = ast.concat(star, bb);
		let end = ast.terminator(0);
		let root = ast.concat(body, end);
		(ast, root, star)
	}

	#[test]
	fn inherent_laziness() {
		let (ast, root, star) = lazy_tree();
		let positions = Positions::new(&ast, root).unwrap();
		let lazy = LazyAttribution::new(&ast, root, &positions).unwrap();

		assert!(lazy.is_lazy(Position(1)));
		assert!(lazy.is_lazy(Position(2)));
		assert!(!lazy.is_lazy(Position(3)));
		assert!(!lazy.is_lazy(Position(5)));
		assert_eq!(lazy.lazy_parent(Position(1)), Some(star));
		assert_eq!(lazy.lazy_parent(Position(4)), None);
		assert_eq!(lazy.inherent(&set(&[1, 2, 3])), set(&[1, 2]));
	}

	#[test]
	fn innermost_lazy_parent() {
		let mut ast = Ast::new();
		let a = ast.literal('a');
		let inner = ast.repeat(a, 0, -1, true);
		let b = ast.literal('b');
		let body = ast.concat(inner, b);
		let outer = ast.repeat(body, 1, -1, true);

		let positions = Positions::new(&ast, outer).unwrap();
		let lazy = LazyAttribution::new(&ast, outer, &positions).unwrap();
		assert_eq!(lazy.lazy_parent(Position(1)), Some(inner));
		assert_eq!(lazy.lazy_parent(Position(2)), Some(outer));
	}

	#[test]
	fn laziness_dominates_nested_greedy_repeats() {
		let mut ast = Ast::new();
		let a = ast.literal('a');
		let greedy = ast.star(a);
		let lazy_repeat = ast.repeat(greedy, 0, -1, true);

		let positions = Positions::new(&ast, lazy_repeat).unwrap();
		let lazy = LazyAttribution::new(&ast, lazy_repeat, &positions).unwrap();
		assert!(lazy.is_lazy(Position(1)));
		assert_eq!(lazy.lazy_parent(Position(1)), Some(lazy_repeat));
	}

	#[test]
	fn contagion() {
		let (ast, root, _) = lazy_tree();
		let positions = Positions::new(&ast, root).unwrap();
		let props = Properties::new(&ast, root, &positions).unwrap();
		let follow = FollowPos::new(&ast, root, &positions, &props).unwrap();
		let lazy = LazyAttribution::new(&ast, root, &positions).unwrap();

		// reading `b` from {1, 2, 3}.
		let group = set(&[2, 3]);
		let next = follow.union(&group).unwrap();
		assert_eq!(next, set(&[1, 2, 3, 4]));
		assert_eq!(lazy.contagion(&group, &next, &set(&[]), &follow).unwrap(), set(&[1, 2, 3]));

		// reading `b` from {1, 2, 3, 4} where 3 is tainted.
		let group = set(&[2, 3, 4]);
		let next = follow.union(&group).unwrap();
		assert_eq!(next, set(&[1, 2, 3, 4, 5]));
		assert_eq!(lazy.contagion(&group, &next, &set(&[3]), &follow).unwrap(), set(&[1, 2, 3, 4]));
		assert_eq!(lazy.contagion(&group, &next, &set(&[]), &follow).unwrap(), set(&[1, 2, 3]));

		let greedy = LazyAttribution::greedy(&positions);
		assert!(greedy.contagion(&group, &next, &set(&[]), &follow).unwrap().is_empty());
	}
}

//! Leaf positions and the position-based dataflow.
//!
//! Every table here is scoped to one build: it is computed from a tree and
//! indexed by the tree's node ids, never attached to the nodes themselves.
use std::{collections::BTreeSet, fmt};
use crate::{
	ast::{self, AcceptSymbol, Ast, Node, NodeId},
	charset::Range,
	Error, Result,
};

/// Leaf position.
///
/// Positions are numbered from 1, in pre-order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Position(pub u32);

impl Position {
	fn index(&self) -> usize {
		self.0 as usize - 1
	}
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.0.fmt(f)
	}
}

pub type PositionSet = BTreeSet<Position>;

/// Leaf occurrence.
pub struct Leaf {
	node: NodeId,
	ranges: Vec<Range>,
	terminator: Option<AcceptSymbol>,
}

impl Leaf {
	pub fn node(&self) -> NodeId {
		self.node
	}

	/// Ranges matched by this leaf.
	pub fn ranges(&self) -> &[Range] {
		&self.ranges
	}

	/// Accept symbol, if the leaf is a terminator.
	pub fn terminator(&self) -> Option<AcceptSymbol> {
		self.terminator
	}

	pub fn matches(&self, range: &Range) -> bool {
		self.ranges.iter().any(|r| r.intersects(range))
	}
}

/// Position assignment.
pub struct Positions {
	leaves: Vec<Leaf>,
	of_node: Vec<Option<Position>>,
}

impl Positions {
	pub fn new(ast: &Ast, root: NodeId) -> Result<Positions> {
		let mut leaves = Vec::new();
		let mut of_node = vec![None; ast.len()];

		ast.visit(root, |_, id, _, _| {
			if let Some(node) = ast.get(id) {
				if node.is_leaf() {
					let p = Position(leaves.len() as u32 + 1);
					log::debug!("position {} is `{}`", p, ast.display(id));
					of_node[id.index()] = Some(p);
					leaves.push(Leaf {
						node: id,
						ranges: node.ranges(),
						terminator: match node {
							Node::Terminator(symbol) => Some(*symbol),
							_ => None,
						},
					})
				}
			}

			true
		})?;

		Ok(Positions { leaves, of_node })
	}

	pub fn len(&self) -> usize {
		self.leaves.len()
	}

	pub fn is_empty(&self) -> bool {
		self.leaves.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = Position> {
		(1..=self.leaves.len() as u32).map(Position)
	}

	pub fn leaf(&self, p: Position) -> Result<&Leaf> {
		if p.0 == 0 {
			return Err(Error::UnknownPosition(p))
		}

		self.leaves.get(p.index()).ok_or(Error::UnknownPosition(p))
	}

	pub fn of_node(&self, id: NodeId) -> Option<Position> {
		self.of_node.get(id.index()).cloned().flatten()
	}

	/// Highest precedence accept symbol among the terminators of the set.
	pub fn accept_symbol(&self, set: &PositionSet) -> Result<Option<AcceptSymbol>> {
		let mut result: Option<AcceptSymbol> = None;
		for p in set {
			if let Some(symbol) = self.leaf(*p)?.terminator {
				result = Some(result.map_or(symbol, |s| s.min(symbol)))
			}
		}

		Ok(result)
	}
}

/// Nullable, firstpos and lastpos of every node of a tree.
pub struct Properties {
	nullable: Vec<bool>,
	first: Vec<PositionSet>,
	last: Vec<PositionSet>,
}

impl Properties {
	pub fn new(ast: &Ast, root: NodeId, positions: &Positions) -> Result<Properties> {
		let mut order = Vec::new();
		ast.visit(root, |_, id, _, _| {
			order.push(id);
			true
		})?;

		let mut props = Properties {
			nullable: vec![false; ast.len()],
			first: vec![PositionSet::new(); ast.len()],
			last: vec![PositionSet::new(); ast.len()],
		};

		// Reversed pre-order: children are solved before their parent.
		for id in order.into_iter().rev() {
			let i = id.index();
			match ast.node(id)? {
				Node::Literal(None) => props.nullable[i] = true,
				Node::Literal(_) | Node::Charset { .. } | Node::Terminator(_) => {
					let p = positions.of_node(id).ok_or(Error::UnknownNode(id))?;
					props.first[i].insert(p);
					props.last[i].insert(p);
				}
				Node::Concat(l, r) => {
					let (l, r) = (l.index(), r.index());
					props.nullable[i] = props.nullable[l] && props.nullable[r];

					let mut first = props.first[l].clone();
					if props.nullable[l] {
						first.extend(props.first[r].iter().cloned())
					}

					let mut last = props.last[r].clone();
					if props.nullable[r] {
						last.extend(props.last[l].iter().cloned())
					}

					props.first[i] = first;
					props.last[i] = last;
				}
				Node::Or(l, r) => {
					let (l, r) = (l.index(), r.index());
					props.nullable[i] = props.nullable[l] || props.nullable[r];
					props.first[i] = props.first[l].union(&props.first[r]).cloned().collect();
					props.last[i] = props.last[l].union(&props.last[r]).cloned().collect();
				}
				Node::Repeat { inner, min, .. } => {
					let inner = inner.index();
					props.nullable[i] = *min <= 0 || props.nullable[inner];
					props.first[i] = props.first[inner].clone();
					props.last[i] = props.last[inner].clone();
				}
				Node::Capture { inner, .. } => {
					let inner = inner.index();
					props.nullable[i] = props.nullable[inner];
					props.first[i] = props.first[inner].clone();
					props.last[i] = props.last[inner].clone();
				}
			}
		}

		Ok(props)
	}

	pub fn nullable(&self, id: NodeId) -> Result<bool> {
		self.nullable.get(id.index()).cloned().ok_or(Error::UnknownNode(id))
	}

	pub fn first(&self, id: NodeId) -> Result<&PositionSet> {
		self.first.get(id.index()).ok_or(Error::UnknownNode(id))
	}

	pub fn last(&self, id: NodeId) -> Result<&PositionSet> {
		self.last.get(id.index()).ok_or(Error::UnknownNode(id))
	}
}

/// Followpos table.
pub struct FollowPos {
	follow: Vec<PositionSet>,
}

impl FollowPos {
	pub fn new(ast: &Ast, root: NodeId, positions: &Positions, props: &Properties) -> Result<FollowPos> {
		let mut follow = vec![PositionSet::new(); positions.len()];
		let mut nodes = Vec::new();
		ast.visit(root, |_, id, _, _| {
			nodes.push(id);
			true
		})?;

		for id in nodes {
			match ast.node(id)? {
				Node::Concat(l, r) => {
					let first = props.first(*r)?;
					for p in props.last(*l)? {
						positions.leaf(*p)?;
						follow[p.index()].extend(first.iter().cloned())
					}
				}
				Node::Repeat { inner, max, .. } => {
					if ast::can_repeat(*max) && !ast.node(*inner)?.is_empty_literal() {
						let first = props.first(*inner)?;
						for p in props.last(*inner)? {
							positions.leaf(*p)?;
							follow[p.index()].extend(first.iter().cloned())
						}
					}
				}
				_ => (),
			}
		}

		Ok(FollowPos { follow })
	}

	pub fn get(&self, p: Position) -> Result<&PositionSet> {
		if p.0 == 0 {
			return Err(Error::UnknownPosition(p))
		}

		self.follow.get(p.index()).ok_or(Error::UnknownPosition(p))
	}

	/// Union of the followpos of the given positions.
	pub fn union<'a, I: IntoIterator<Item = &'a Position>>(&self, set: I) -> Result<PositionSet> {
		let mut result = PositionSet::new();
		for p in set {
			result.extend(self.get(*p)?.iter().cloned())
		}

		Ok(result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn set(positions: &[u32]) -> PositionSet {
		positions.iter().map(|p| Position(*p)).collect()
	}

	/// `(a|b)*abb#`, the textbook example.
	fn textbook() -> (Ast, NodeId) {
		let mut ast = Ast::new();
		let a = ast.literal('a');
		let b = ast.literal('b');
		let or = ast.or(a, b);
		let star = ast.star(or);
		let abb = ast.string("abb");
		let body = ast.concat(star, abb);
		let end = ast.terminator(0);
		let root = ast.concat(body, end);
		(ast, root)
	}

	#[test]
	fn textbook_followpos() {
		let (ast, root) = textbook();
		let positions = Positions::new(&ast, root).unwrap();
		assert_eq!(positions.len(), 6);

		let props = Properties::new(&ast, root, &positions).unwrap();
		assert!(!props.nullable(root).unwrap());
		assert_eq!(props.first(root).unwrap(), &set(&[1, 2, 3]));
		assert_eq!(props.last(root).unwrap(), &set(&[6]));

		let follow = FollowPos::new(&ast, root, &positions, &props).unwrap();
		assert_eq!(follow.get(Position(1)).unwrap(), &set(&[1, 2, 3]));
		assert_eq!(follow.get(Position(2)).unwrap(), &set(&[1, 2, 3]));
		assert_eq!(follow.get(Position(3)).unwrap(), &set(&[4]));
		assert_eq!(follow.get(Position(4)).unwrap(), &set(&[5]));
		assert_eq!(follow.get(Position(5)).unwrap(), &set(&[6]));
		assert!(follow.get(Position(6)).unwrap().is_empty());
		assert_eq!(follow.get(Position(7)).unwrap_err(), Error::UnknownPosition(Position(7)));
	}

	#[test]
	fn optional_has_no_loop_back() {
		let mut ast = Ast::new();
		let a = ast.literal('a');
		let opt = ast.optional(a);
		let end = ast.terminator(0);
		let root = ast.concat(opt, end);

		let positions = Positions::new(&ast, root).unwrap();
		let props = Properties::new(&ast, root, &positions).unwrap();
		assert!(props.nullable(opt).unwrap());
		assert_eq!(props.first(root).unwrap(), &set(&[1, 2]));

		let follow = FollowPos::new(&ast, root, &positions, &props).unwrap();
		assert_eq!(follow.get(Position(1)).unwrap(), &set(&[2]));
	}

	#[test]
	fn empty_literal() {
		let mut ast = Ast::new();
		let empty = ast.empty();
		let star = ast.star(empty);
		let a = ast.literal('a');
		let root = ast.concat(star, a);

		let positions = Positions::new(&ast, root).unwrap();
		let props = Properties::new(&ast, root, &positions).unwrap();
		assert!(props.nullable(empty).unwrap());
		assert!(props.first(empty).unwrap().is_empty());
		assert_eq!(props.first(root).unwrap(), &set(&[2]));

		let follow = FollowPos::new(&ast, root, &positions, &props).unwrap();
		assert!(follow.get(Position(1)).unwrap().is_empty());
	}

	#[test]
	fn accept_symbol_precedence() {
		let mut ast = Ast::new();
		let t2 = ast.terminator(2);
		let t0 = ast.terminator(0);
		let root = ast.or(t2, t0);
		let positions = Positions::new(&ast, root).unwrap();
		assert_eq!(positions.accept_symbol(&set(&[1, 2])).unwrap(), Some(0));
		assert_eq!(positions.accept_symbol(&set(&[1])).unwrap(), Some(2));
		assert_eq!(positions.accept_symbol(&set(&[])).unwrap(), None);
	}
}

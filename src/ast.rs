use std::fmt;
use crate::{
	charset::{self, Class, Range, DisplayChar, LINE_START, TEXT_END},
	Error, Result,
};

/// Accept symbol attached to a terminator.
///
/// Lower symbols have higher precedence.
pub type AcceptSymbol = u32;

/// Repetition bound meaning "no bound".
pub const UNBOUNDED: i32 = -1;

/// Node index in an [`Ast`] arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(u32);

impl NodeId {
	pub fn index(&self) -> usize {
		self.0 as usize
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "n{}", self.0)
	}
}

/// Charset entry.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum CharsetEntry {
	Char(u32),
	Range(Range),

	/// Known class, possibly negated.
	Class(Class, bool),
}

impl fmt::Display for CharsetEntry {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			CharsetEntry::Char(c) => Range::single(*c).fmt(f),
			CharsetEntry::Range(r) => r.fmt(f),
			CharsetEntry::Class(class, false) => class.fmt(f),
			CharsetEntry::Class(class, true) => write!(f, "[:^{}:]", class.name()),
		}
	}
}

/// Regular expression node.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Node {
	/// Single codepoint (or anchor).
	///
	/// `None` is the empty literal, which matches the empty string.
	Literal(Option<u32>),

	Charset {
		entries: Vec<CharsetEntry>,
		negated: bool,
	},

	Concat(NodeId, NodeId),

	Or(NodeId, NodeId),

	/// Repetition.
	///
	/// Bounds of `-1` (or a maximum of `0`) are unbounded.
	Repeat {
		inner: NodeId,
		min: i32,
		max: i32,
		lazy: bool,
	},

	Capture {
		inner: NodeId,
		group: u32,
		name: Option<String>,
	},

	/// End marker of an accepted alternative.
	Terminator(AcceptSymbol),
}

impl Node {
	/// Leaves are the only nodes holding a position.
	pub fn is_leaf(&self) -> bool {
		matches!(self, Node::Literal(_) | Node::Charset { .. } | Node::Terminator(_))
	}

	pub fn is_empty_literal(&self) -> bool {
		matches!(self, Node::Literal(None))
	}

	pub fn children(&self) -> std::iter::Chain<std::option::IntoIter<NodeId>, std::option::IntoIter<NodeId>> {
		let (a, b) = match self {
			Node::Concat(l, r) | Node::Or(l, r) => (Some(*l), Some(*r)),
			Node::Repeat { inner, .. } | Node::Capture { inner, .. } => (Some(*inner), None),
			_ => (None, None),
		};

		a.into_iter().chain(b)
	}

	/// Ranges matched by a leaf.
	///
	/// Classes are expanded and negation is resolved.
	pub fn ranges(&self) -> Vec<Range> {
		match self {
			Node::Literal(Some(c)) => vec![Range::single(*c)],
			Node::Charset { entries, negated } => {
				let mut ranges = Vec::new();
				for entry in entries {
					match entry {
						CharsetEntry::Char(c) => ranges.push(Range::single(*c)),
						CharsetEntry::Range(r) => ranges.push(*r),
						CharsetEntry::Class(class, false) => ranges.extend(class.ranges()),
						CharsetEntry::Class(class, true) => {
							let class_ranges: Vec<_> = class.ranges().collect();
							ranges.extend(charset::invert_ranges(&class_ranges))
						}
					}
				}

				if *negated {
					charset::invert_ranges(&ranges)
				} else {
					charset::merge_sorted(ranges)
				}
			}
			_ => Vec::new(),
		}
	}
}

/// Checks if a maximum bound denotes an unbounded repetition.
pub fn is_unbounded(max: i32) -> bool {
	max <= 0
}

/// Checks if the repetition may match its inner expression more than once.
pub fn can_repeat(max: i32) -> bool {
	is_unbounded(max) || max > 1
}

/// Regular expression tree, stored as an arena.
///
/// A node only references nodes created before it, so the arena order is a
/// valid post-order of any tree it holds.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Ast {
	nodes: Vec<Node>,
	root: Option<NodeId>,
}

impl Ast {
	pub fn new() -> Ast {
		Ast {
			nodes: Vec::new(),
			root: None,
		}
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn root(&self) -> Option<NodeId> {
		self.root
	}

	pub fn set_root(&mut self, id: NodeId) {
		self.root = Some(id)
	}

	pub fn get(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.index())
	}

	pub fn node(&self, id: NodeId) -> Result<&Node> {
		self.get(id).ok_or(Error::UnknownNode(id))
	}

	pub fn ids(&self) -> impl Iterator<Item = NodeId> {
		(0..self.nodes.len() as u32).map(NodeId)
	}

	pub fn add(&mut self, node: Node) -> NodeId {
		let id = NodeId(self.nodes.len() as u32);
		debug_assert!(node.children().all(|c| c < id));
		self.nodes.push(node);
		id
	}

	pub fn codepoint(&mut self, c: u32) -> NodeId {
		self.add(Node::Literal(Some(c)))
	}

	pub fn literal(&mut self, c: char) -> NodeId {
		self.codepoint(c as u32)
	}

	pub fn empty(&mut self) -> NodeId {
		self.add(Node::Literal(None))
	}

	pub fn line_start(&mut self) -> NodeId {
		self.codepoint(LINE_START)
	}

	pub fn text_end(&mut self) -> NodeId {
		self.codepoint(TEXT_END)
	}

	/// Concatenation of the characters of the given string.
	pub fn string(&mut self, s: &str) -> NodeId {
		let chars: Vec<_> = s.chars().map(|c| self.literal(c)).collect();
		self.concat_chain(&chars)
	}

	pub fn charset(&mut self, entries: Vec<CharsetEntry>, negated: bool) -> NodeId {
		self.add(Node::Charset { entries, negated })
	}

	pub fn class(&mut self, class: Class) -> NodeId {
		self.charset(vec![CharsetEntry::Class(class, false)], false)
	}

	/// Any character but a line feed.
	pub fn any_char(&mut self) -> NodeId {
		self.charset(vec![CharsetEntry::Char('\n' as u32)], true)
	}

	pub fn concat(&mut self, left: NodeId, right: NodeId) -> NodeId {
		self.add(Node::Concat(left, right))
	}

	pub fn or(&mut self, left: NodeId, right: NodeId) -> NodeId {
		self.add(Node::Or(left, right))
	}

	/// Left associative concatenation chain.
	///
	/// An empty chain is the empty literal.
	pub fn concat_chain(&mut self, items: &[NodeId]) -> NodeId {
		match items.split_first() {
			Some((first, rest)) => rest.iter().fold(*first, |acc, item| self.concat(acc, *item)),
			None => self.empty(),
		}
	}

	/// Left associative alternation chain.
	pub fn or_chain(&mut self, items: &[NodeId]) -> NodeId {
		match items.split_first() {
			Some((first, rest)) => rest.iter().fold(*first, |acc, item| self.or(acc, *item)),
			None => self.empty(),
		}
	}

	pub fn repeat(&mut self, inner: NodeId, min: i32, max: i32, lazy: bool) -> NodeId {
		self.add(Node::Repeat { inner, min, max, lazy })
	}

	pub fn star(&mut self, inner: NodeId) -> NodeId {
		self.repeat(inner, 0, UNBOUNDED, false)
	}

	pub fn plus(&mut self, inner: NodeId) -> NodeId {
		self.repeat(inner, 1, UNBOUNDED, false)
	}

	pub fn optional(&mut self, inner: NodeId) -> NodeId {
		self.repeat(inner, 0, 1, false)
	}

	pub fn capture(&mut self, inner: NodeId, group: u32, name: Option<String>) -> NodeId {
		self.add(Node::Capture { inner, group, name })
	}

	pub fn terminator(&mut self, symbol: AcceptSymbol) -> NodeId {
		self.add(Node::Terminator(symbol))
	}

	/// Pre-order traversal.
	///
	/// The callback receives the parent, the node, its index among the parent's
	/// children and its depth. Returning `false` skips the node's children.
	pub fn visit<F>(&self, root: NodeId, mut f: F) -> Result<()>
	where
		F: FnMut(Option<NodeId>, NodeId, usize, usize) -> bool,
	{
		let mut stack = vec![(None, root, 0, 0)];

		while let Some((parent, id, index, level)) = stack.pop() {
			let node = self.node(id)?;
			if f(parent, id, index, level) {
				let children: Vec<_> = node.children().collect();
				for (i, child) in children.into_iter().enumerate().rev() {
					stack.push((Some(id), child, i, level + 1))
				}
			}
		}

		Ok(())
	}

	/// Copies the subtree rooted at `id` into `target`.
	///
	/// Shared nodes are duplicated, so the copy is always a tree.
	pub fn copy_into(&self, id: NodeId, target: &mut Ast) -> Result<NodeId> {
		let node = match self.node(id)? {
			Node::Concat(l, r) => {
				let (l, r) = (*l, *r);
				self.check_child(id, l)?;
				self.check_child(id, r)?;
				Node::Concat(self.copy_into(l, target)?, self.copy_into(r, target)?)
			}
			Node::Or(l, r) => {
				let (l, r) = (*l, *r);
				self.check_child(id, l)?;
				self.check_child(id, r)?;
				Node::Or(self.copy_into(l, target)?, self.copy_into(r, target)?)
			}
			Node::Repeat { inner, min, max, lazy } => {
				self.check_child(id, *inner)?;
				check_bounds(id, *min, *max)?;
				Node::Repeat {
					inner: self.copy_into(*inner, target)?,
					min: *min,
					max: *max,
					lazy: *lazy,
				}
			}
			Node::Capture { inner, group, name } => {
				self.check_child(id, *inner)?;
				Node::Capture {
					inner: self.copy_into(*inner, target)?,
					group: *group,
					name: name.clone(),
				}
			}
			leaf => leaf.clone(),
		};

		Ok(target.add(node))
	}

	/// Children must precede their parent, which rules out cycles.
	fn check_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
		if child < parent && child.index() < self.nodes.len() {
			Ok(())
		} else {
			Err(Error::UnknownNode(child))
		}
	}

	/// Deep copy of the tree reachable from the root.
	pub fn deep_copy(&self) -> Result<Ast> {
		let root = self.root.ok_or(Error::MissingRoot)?;
		let mut result = Ast::new();
		let root = self.copy_into(root, &mut result)?;
		result.set_root(root);
		Ok(result)
	}

	/// Flattened list of alternatives under the given node.
	///
	/// Nested alternations are flattened recursively.
	pub fn alternatives(&self, id: NodeId) -> Result<Vec<NodeId>> {
		let mut result = Vec::new();
		let mut stack = vec![id];

		while let Some(id) = stack.pop() {
			match self.node(id)? {
				Node::Or(l, r) => {
					stack.push(*r);
					stack.push(*l)
				}
				_ => result.push(id),
			}
		}

		Ok(result)
	}

	/// Copy of the tree where bounded repetitions are unrolled.
	///
	/// `e{n}` becomes a chain of `n` copies, `e{m,n}` an alternation of the
	/// chains of `m` to `n` copies and `e{m,}` a chain of `m-1` copies followed
	/// by `e+`.
	///
	/// Lazy repetitions keep their laziness on the optional part: `e{m,n}?`
	/// becomes `m` copies followed by `n-m` copies of `e??`, and `e{m,}?` a
	/// chain of `m-1` copies followed by `e+?`.
	pub fn expand_repeats(&self) -> Result<Ast> {
		let root = self.root.ok_or(Error::MissingRoot)?;
		let mut result = Ast::new();
		let root = self.expand_into(root, &mut result)?;
		result.set_root(root);
		Ok(result)
	}

	/// Copies the subtree rooted at `id` into `target`, unrolling bounded
	/// repetitions.
	pub fn expand_into(&self, id: NodeId, target: &mut Ast) -> Result<NodeId> {
		let node = match self.node(id)? {
			Node::Concat(l, r) => {
				let (l, r) = (*l, *r);
				self.check_child(id, l)?;
				self.check_child(id, r)?;
				Node::Concat(self.expand_into(l, target)?, self.expand_into(r, target)?)
			}
			Node::Or(l, r) => {
				let (l, r) = (*l, *r);
				self.check_child(id, l)?;
				self.check_child(id, r)?;
				Node::Or(self.expand_into(l, target)?, self.expand_into(r, target)?)
			}
			Node::Repeat { inner, min, max, lazy } => {
				let (inner, min, max, lazy) = (*inner, *min, *max, *lazy);
				self.check_child(id, inner)?;
				check_bounds(id, min, max)?;

				let expandable = !self.node(inner)?.is_empty_literal()
					&& if is_unbounded(max) { min > 1 } else { max > 1 };

				if !expandable {
					Node::Repeat {
						inner: self.expand_into(inner, target)?,
						min,
						max,
						lazy,
					}
				} else if is_unbounded(max) {
					let mut items = Vec::new();
					for _ in 1..min {
						items.push(self.expand_into(inner, target)?)
					}
					let last = self.expand_into(inner, target)?;
					items.push(target.repeat(last, 1, UNBOUNDED, lazy));
					return Ok(target.concat_chain(&items))
				} else if min == max {
					let mut items = Vec::new();
					for _ in 0..min {
						items.push(self.expand_into(inner, target)?)
					}
					return Ok(target.concat_chain(&items))
				} else if lazy {
					let mut items = Vec::new();
					for _ in 0..min.max(0) {
						items.push(self.expand_into(inner, target)?)
					}
					for _ in min.max(0)..max {
						let optional = self.expand_into(inner, target)?;
						items.push(target.repeat(optional, 0, 1, true))
					}
					return Ok(target.concat_chain(&items))
				} else {
					let mut alternatives = Vec::new();
					for count in min.max(0)..=max {
						let mut items = Vec::new();
						for _ in 0..count {
							items.push(self.expand_into(inner, target)?)
						}
						alternatives.push(target.concat_chain(&items))
					}
					return Ok(target.or_chain(&alternatives))
				}
			}
			Node::Capture { inner, group, name } => {
				self.check_child(id, *inner)?;
				Node::Capture {
					inner: self.expand_into(*inner, target)?,
					group: *group,
					name: name.clone(),
				}
			}
			leaf => leaf.clone(),
		};

		Ok(target.add(node))
	}

	pub fn display(&self, id: NodeId) -> DisplayNode {
		DisplayNode(self, id)
	}
}

/// Bounded repetitions need `min <= max`.
fn check_bounds(id: NodeId, min: i32, max: i32) -> Result<()> {
	if !is_unbounded(max) && min > max {
		Err(Error::InvalidRepeat(id))
	} else {
		Ok(())
	}
}

/// Regexp-like rendering of a subtree.
pub struct DisplayNode<'a>(&'a Ast, NodeId);

impl<'a> DisplayNode<'a> {
	fn sub(&self, id: NodeId) -> DisplayNode<'a> {
		DisplayNode(self.0, id)
	}

	/// Writes the node, wrapped in a non-capturing group if needed.
	fn fmt_grouped(&self, id: NodeId, f: &mut fmt::Formatter, single: bool) -> fmt::Result {
		let wrap = match self.0.get(id) {
			Some(Node::Or(_, _)) => true,
			Some(Node::Concat(_, _)) | Some(Node::Repeat { .. }) => single,
			_ => false,
		};

		if wrap {
			write!(f, "(?:{})", self.sub(id))
		} else {
			fmt::Display::fmt(&self.sub(id), f)
		}
	}
}

fn fmt_literal(c: u32, f: &mut fmt::Formatter) -> fmt::Result {
	match c {
		LINE_START => write!(f, "^"),
		TEXT_END => write!(f, "$"),
		_ => match std::char::from_u32(c) {
			Some(c) => {
				if "\\.[]()|{}?*+^$".contains(c) {
					write!(f, "\\{}", c)
				} else {
					fmt::Display::fmt(&DisplayChar(c), f)
				}
			}
			None => write!(f, "\\u{:04x}", c),
		},
	}
}

impl<'a> fmt::Display for DisplayNode<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.0.get(self.1) {
			Some(Node::Literal(Some(c))) => fmt_literal(*c, f),
			Some(Node::Literal(None)) => Ok(()),
			Some(Node::Charset { entries, negated }) => {
				write!(f, "[")?;
				if *negated {
					write!(f, "^")?
				}
				for entry in entries {
					entry.fmt(f)?
				}
				write!(f, "]")
			}
			Some(Node::Concat(l, r)) => {
				self.fmt_grouped(*l, f, false)?;
				self.fmt_grouped(*r, f, false)
			}
			Some(Node::Or(l, r)) => write!(f, "{}|{}", self.sub(*l), self.sub(*r)),
			Some(Node::Repeat { inner, min, max, lazy }) => {
				self.fmt_grouped(*inner, f, true)?;
				match (*min, *max) {
					(min, max) if min <= 0 && is_unbounded(max) => write!(f, "*")?,
					(min, 1) if min <= 0 => write!(f, "?")?,
					(1, max) if is_unbounded(max) => write!(f, "+")?,
					(min, max) if min == max => write!(f, "{{{}}}", min)?,
					(min, max) if is_unbounded(max) => write!(f, "{{{},}}", min)?,
					(min, max) => write!(f, "{{{},{}}}", min.max(0), max)?,
				}
				if *lazy {
					write!(f, "?")?
				}
				Ok(())
			}
			Some(Node::Capture { inner, name, .. }) => match name {
				Some(name) => write!(f, "(?<{}>{})", name, self.sub(*inner)),
				None => write!(f, "({})", self.sub(*inner)),
			},
			Some(Node::Terminator(_)) => write!(f, "<<END>>"),
			None => write!(f, "<{}?>", self.1),
		}
	}
}

impl fmt::Display for Ast {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.root {
			Some(root) => self.display(root).fmt(f),
			None => Ok(()),
		}
	}
}

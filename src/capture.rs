use std::fmt;
use crate::{
	ast::{Ast, Node, NodeId},
	position::{Position, PositionSet, Positions, Properties},
	Result,
};

/// Capture group boundary, fired when entering a state.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CaptureEvent {
	pub group: u32,
	pub is_start: bool,
	pub name: Option<String>,
}

impl CaptureEvent {
	fn same_event(&self, group: u32, is_start: bool) -> bool {
		self.group == group && self.is_start == is_start
	}
}

impl fmt::Display for CaptureEvent {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let kind = if self.is_start { "start" } else { "end" };
		match &self.name {
			Some(name) => write!(f, "{}({}, {})", kind, self.group, name),
			None => write!(f, "{}({})", kind, self.group),
		}
	}
}

/// Capture events carried by each position.
pub struct CaptureEvents {
	events: Vec<Vec<CaptureEvent>>,
}

impl CaptureEvents {
	/// No position carries any event.
	pub fn none(positions: &Positions) -> CaptureEvents {
		CaptureEvents {
			events: vec![Vec::new(); positions.len()],
		}
	}

	/// Start events go on the firstpos of each group, end events on its lastpos.
	pub fn new(ast: &Ast, root: NodeId, positions: &Positions, props: &Properties) -> Result<CaptureEvents> {
		let mut result = CaptureEvents::none(positions);
		let mut groups = Vec::new();
		ast.visit(root, |_, id, _, _| {
			groups.push(id);
			true
		})?;

		for id in groups {
			if let Node::Capture { inner, group, name } = ast.node(id)? {
				for p in props.first(*inner)? {
					positions.leaf(*p)?;
					result.add(*p, *group, name, true)
				}

				for p in props.last(*inner)? {
					positions.leaf(*p)?;
					result.add(*p, *group, name, false)
				}
			}
		}

		Ok(result)
	}

	fn add(&mut self, p: Position, group: u32, name: &Option<String>, is_start: bool) {
		let events = &mut self.events[p.0 as usize - 1];
		if !events.iter().any(|e| e.same_event(group, is_start)) {
			log::debug!("position {} {} group {}", p, if is_start { "starts" } else { "ends" }, group);
			events.push(CaptureEvent {
				group,
				is_start,
				name: name.clone(),
			})
		}
	}

	pub fn of(&self, p: Position) -> &[CaptureEvent] {
		if p.0 == 0 {
			return &[]
		}

		match self.events.get(p.0 as usize - 1) {
			Some(events) => events,
			None => &[],
		}
	}

	/// Events of a state made of the given positions.
	///
	/// Sorted by group, start events first.
	pub fn for_positions(&self, set: &PositionSet) -> Vec<CaptureEvent> {
		let mut result: Vec<CaptureEvent> = Vec::new();
		for p in set {
			for event in self.of(*p) {
				if !result.iter().any(|e| e.same_event(event.group, event.is_start)) {
					result.push(event.clone())
				}
			}
		}

		result.sort_by(|a, b| a.group.cmp(&b.group).then(b.is_start.cmp(&a.is_start)));
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn set(positions: &[u32]) -> PositionSet {
		positions.iter().map(|p| Position(*p)).collect()
	}

	#[test]
	fn group_boundaries() {
		// (?<baz>foo|fubar)+
		let mut ast = Ast::new();
		let foo = ast.string("foo");
		let fubar = ast.string("fubar");
		let or = ast.or(foo, fubar);
		let capture = ast.capture(or, 1, Some("baz".to_string()));
		let root = ast.plus(capture);

		let positions = Positions::new(&ast, root).unwrap();
		let props = Properties::new(&ast, root, &positions).unwrap();
		let events = CaptureEvents::new(&ast, root, &positions, &props).unwrap();

		let start = CaptureEvent {
			group: 1,
			is_start: true,
			name: Some("baz".to_string()),
		};
		let end = CaptureEvent {
			group: 1,
			is_start: false,
			name: Some("baz".to_string()),
		};

		// f(1) o(2) o(3) f(4) u(5) b(6) a(7) r(8)
		assert_eq!(events.of(Position(1)), &[start.clone()]);
		assert_eq!(events.of(Position(4)), &[start.clone()]);
		assert_eq!(events.of(Position(3)), &[end.clone()]);
		assert_eq!(events.of(Position(8)), &[end.clone()]);
		assert!(events.of(Position(2)).is_empty());

		assert_eq!(events.for_positions(&set(&[3, 1, 4])), vec![start.clone(), end]);
		assert_eq!(start.to_string(), "start(1, baz)");
	}

	#[test]
	fn single_leaf_group_is_deduplicated() {
		let mut ast = Ast::new();
		let a = ast.literal('a');
		let inner = ast.capture(a, 2, None);
		let outer = ast.capture(inner, 1, None);

		let positions = Positions::new(&ast, outer).unwrap();
		let props = Properties::new(&ast, outer, &positions).unwrap();
		let events = CaptureEvents::new(&ast, outer, &positions, &props).unwrap();

		let groups: Vec<_> = events.of(Position(1)).iter().map(|e| (e.group, e.is_start)).collect();
		assert_eq!(groups, vec![(1, true), (1, false), (2, true), (2, false)]);
		assert_eq!(events.for_positions(&set(&[1])).len(), 4);
	}
}

use std::collections::{BTreeSet, HashSet};
use crate::{
	ast::AcceptSymbol,
	capture::CaptureEvent,
	charset::{self, Range, LINE_START, TEXT_END},
};

/// State index.
pub type StateId = usize;

/// Labelled transition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Transition {
	pub range: Range,
	pub target: StateId,
}

/// Automaton state.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct State {
	transitions: Vec<Transition>,
	accept: Option<AcceptSymbol>,
	captures: Vec<CaptureEvent>,
}

impl State {
	pub fn new(accept: Option<AcceptSymbol>, captures: Vec<CaptureEvent>) -> State {
		State {
			transitions: Vec::new(),
			accept,
			captures,
		}
	}

	pub fn transitions(&self) -> &[Transition] {
		&self.transitions
	}

	pub fn accept_symbol(&self) -> Option<AcceptSymbol> {
		self.accept
	}

	pub fn is_accepting(&self) -> bool {
		self.accept.is_some()
	}

	/// Capture events fired when entering the state.
	pub fn captures(&self) -> &[CaptureEvent] {
		&self.captures
	}

	pub fn capture_starts(&self) -> impl Iterator<Item = &CaptureEvent> {
		self.captures.iter().filter(|e| e.is_start)
	}

	pub fn capture_ends(&self) -> impl Iterator<Item = &CaptureEvent> {
		self.captures.iter().filter(|e| !e.is_start)
	}

	/// Adds a transition, unless the same one already exists.
	pub fn add_transition(&mut self, range: Range, target: StateId) {
		let transition = Transition { range, target };
		if !self.transitions.contains(&transition) {
			self.transitions.push(transition)
		}
	}

	/// Target of the transition reading the given codepoint.
	pub fn next(&self, c: u32) -> Option<StateId> {
		self.transitions
			.iter()
			.find(|t| !t.range.is_anchor() && t.range.contains(c))
			.map(|t| t.target)
	}

	pub fn successors(&self) -> impl Iterator<Item = StateId> + '_ {
		self.transitions.iter().map(|t| t.target)
	}

	/// Transition ranges grouped by destination.
	///
	/// Destinations are listed in the order they first appear, ranges are
	/// sorted and merged.
	pub fn grouped_transitions(&self) -> Vec<(StateId, Vec<Range>)> {
		let mut groups: Vec<(StateId, Vec<Range>)> = Vec::new();
		for t in &self.transitions {
			match groups.iter_mut().find(|(target, _)| *target == t.target) {
				Some((_, ranges)) => ranges.push(t.range),
				None => groups.push((t.target, vec![t.range])),
			}
		}

		groups
			.into_iter()
			.map(|(target, ranges)| (target, charset::merge_sorted(ranges)))
			.collect()
	}
}

/// Deterministic automaton.
///
/// States reference each other by index; the automaton owns all of them.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Dfa {
	states: Vec<State>,
	start: StateId,
}

impl Default for Dfa {
	fn default() -> Dfa {
		Dfa::new()
	}
}

impl Dfa {
	/// Automaton with a single non-accepting state.
	pub fn new() -> Dfa {
		Dfa {
			states: vec![State::default()],
			start: 0,
		}
	}

	pub(crate) fn from_states(states: Vec<State>, start: StateId) -> Dfa {
		Dfa { states, start }
	}

	pub fn start(&self) -> StateId {
		self.start
	}

	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	pub fn state(&self, q: StateId) -> Option<&State> {
		self.states.get(q)
	}

	pub fn states(&self) -> &[State] {
		&self.states
	}

	pub fn add_state(&mut self, state: State) -> StateId {
		let q = self.states.len();
		self.states.push(state);
		q
	}

	/// Adds a transition. Unknown source states are ignored.
	pub fn add_transition(&mut self, source: StateId, range: Range, target: StateId) {
		if let Some(state) = self.states.get_mut(source) {
			state.add_transition(range, target)
		}
	}

	pub fn accept_symbol(&self, q: StateId) -> Option<AcceptSymbol> {
		self.states.get(q).and_then(State::accept_symbol)
	}

	pub fn is_accepting(&self, q: StateId) -> bool {
		self.accept_symbol(q).is_some()
	}

	pub fn accepting_states(&self) -> impl Iterator<Item = StateId> + '_ {
		(0..self.states.len()).filter(move |q| self.is_accepting(*q))
	}

	pub fn successors(&self, q: StateId) -> impl Iterator<Item = StateId> + '_ {
		self.states.get(q).into_iter().flat_map(State::successors)
	}

	pub fn reachable_states_from(&self, q: StateId) -> ReachableStates {
		ReachableStates::new(self, q)
	}

	/// States reachable from `q`, in depth-first pre-order.
	pub fn closure(&self, q: StateId) -> Vec<StateId> {
		self.reachable_states_from(q).collect()
	}

	/// Removes every transition whose target cannot reach an accepting state.
	///
	/// Every transition is evaluated against the automaton as it is before the
	/// call, then the flagged ones are removed. Returns the number of removed
	/// transitions.
	pub fn prune_dead_transitions(&mut self) -> usize {
		let mut predecessors = vec![Vec::new(); self.states.len()];
		for (q, state) in self.states.iter().enumerate() {
			for r in state.successors() {
				predecessors[r].push(q)
			}
		}

		let mut live = vec![false; self.states.len()];
		let mut stack: Vec<StateId> = self.accepting_states().collect();
		while let Some(q) = stack.pop() {
			if !live[q] {
				live[q] = true;
				stack.extend(predecessors[q].iter().cloned())
			}
		}

		let mut count = 0;
		for (q, state) in self.states.iter_mut().enumerate() {
			let before = state.transitions.len();
			state.transitions.retain(|t| live[t.target]);
			let removed = before - state.transitions.len();
			if removed > 0 {
				log::debug!("pruned {} dead transitions from q{}", removed, q);
			}
			count += removed
		}

		count
	}

	/// Keeps only the transitions of `q` satisfying the predicate.
	pub fn retain_transitions<F>(&mut self, q: StateId, f: F) -> usize
	where
		F: FnMut(&Transition) -> bool,
	{
		match self.states.get_mut(q) {
			Some(state) => {
				let before = state.transitions.len();
				state.transitions.retain(f);
				before - state.transitions.len()
			}
			None => 0,
		}
	}

	/// Drops the states unreachable from the start state.
	///
	/// The remaining states are renumbered in closure order, so the start
	/// state becomes `0`.
	pub fn retain_reachable(&mut self) {
		let order = self.closure(self.start);
		let mut map = vec![None; self.states.len()];
		for (i, q) in order.iter().enumerate() {
			map[*q] = Some(i)
		}

		let mut states = Vec::with_capacity(order.len());
		for q in order {
			let mut state = std::mem::take(&mut self.states[q]);
			for t in &mut state.transitions {
				if let Some(target) = map[t.target] {
					t.target = target
				}
			}
			states.push(state)
		}

		self.states = states;
		self.start = 0;
	}

	/// Checks if an anchor transition can be taken at the given offset.
	fn anchor_holds(range: &Range, input: &[char], i: usize) -> bool {
		(range.contains(LINE_START) && (i == 0 || input[i - 1] == '\n'))
			|| (range.contains(TEXT_END) && i == input.len())
	}

	/// States reached through anchors valid at the given offset.
	fn anchor_closure(&self, states: &mut BTreeSet<StateId>, input: &[char], i: usize) {
		let mut stack: Vec<StateId> = states.iter().cloned().collect();
		while let Some(q) = stack.pop() {
			for t in self.states[q].transitions() {
				if Self::anchor_holds(&t.range, input, i) && states.insert(t.target) {
					stack.push(t.target)
				}
			}
		}
	}

	fn best_accept(&self, states: &BTreeSet<StateId>) -> Option<AcceptSymbol> {
		states.iter().filter_map(|q| self.accept_symbol(*q)).min()
	}

	/// Matches the whole input.
	///
	/// Returns the accept symbol of the match, if any.
	pub fn run(&self, input: &str) -> Option<AcceptSymbol> {
		let input: Vec<char> = input.chars().collect();
		let mut current = BTreeSet::new();
		current.insert(self.start);
		self.anchor_closure(&mut current, &input, 0);

		for (i, c) in input.iter().enumerate() {
			let mut next: BTreeSet<StateId> = current.iter().filter_map(|q| self.states[*q].next(*c as u32)).collect();
			if next.is_empty() {
				return None
			}

			self.anchor_closure(&mut next, &input, i + 1);
			current = next
		}

		self.best_accept(&current)
	}

	pub fn accepts(&self, input: &str) -> bool {
		self.run(input).is_some()
	}

	/// Longest prefix of the input accepted by the automaton.
	///
	/// Returns the accept symbol and the length of the prefix, in bytes.
	pub fn longest_match(&self, input: &str) -> Option<(AcceptSymbol, usize)> {
		let chars: Vec<char> = input.chars().collect();
		let mut current = BTreeSet::new();
		current.insert(self.start);
		self.anchor_closure(&mut current, &chars, 0);

		let mut result = self.best_accept(&current).map(|symbol| (symbol, 0));
		for (i, (offset, c)) in input.char_indices().enumerate() {
			let mut next: BTreeSet<StateId> = current.iter().filter_map(|q| self.states[*q].next(c as u32)).collect();
			if next.is_empty() {
				break
			}

			self.anchor_closure(&mut next, &chars, i + 1);
			if let Some(symbol) = self.best_accept(&next) {
				result = Some((symbol, offset + c.len_utf8()))
			}

			current = next
		}

		result
	}

	/// Path of an accepting run over the whole input.
	///
	/// Each state comes with the number of characters read before entering it.
	/// Anchor transitions are taken without consuming input. The path ends in
	/// a state carrying the symbol returned by [`Dfa::run`]. Returns `None` if
	/// the input is rejected.
	pub fn trace(&self, input: &str) -> Option<Vec<(usize, StateId)>> {
		let symbol = self.run(input)?;
		let input: Vec<char> = input.chars().collect();
		let mut path = vec![(0, self.start)];
		let mut visited = HashSet::new();

		if self.trace_from(&input, symbol, &mut path, &mut visited) {
			Some(path)
		} else {
			None
		}
	}

	/// Depth-first search for the rest of an accepting path.
	///
	/// Whether a path exists only depends on the current state and offset, so
	/// failed pairs are never visited twice.
	fn trace_from(
		&self,
		input: &[char],
		symbol: AcceptSymbol,
		path: &mut Vec<(usize, StateId)>,
		visited: &mut HashSet<(usize, StateId)>,
	) -> bool {
		let (i, q) = match path.last() {
			Some(last) => *last,
			None => return false,
		};

		if !visited.insert((i, q)) {
			return false
		}

		if i == input.len() && self.accept_symbol(q) == Some(symbol) {
			return true
		}

		for t in self.states[q].transitions() {
			let next = if t.range.is_anchor() {
				if Self::anchor_holds(&t.range, input, i) {
					Some(i)
				} else {
					None
				}
			} else if i < input.len() && t.range.contains(input[i] as u32) {
				Some(i + 1)
			} else {
				None
			};

			if let Some(j) = next {
				path.push((j, t.target));
				if self.trace_from(input, symbol, path, visited) {
					return true
				}
				path.pop();
			}
		}

		false
	}

	/// Capture events fired while matching the whole input.
	///
	/// Each event comes with the number of characters read before entering the
	/// state carrying it. Returns `None` if the input is rejected.
	pub fn captures(&self, input: &str) -> Option<Vec<(usize, &CaptureEvent)>> {
		let path = self.trace(input)?;

		let mut events = Vec::new();
		for (i, q) in path {
			for event in self.states[q].captures() {
				events.push((i, event))
			}
		}

		Some(events)
	}
}

/// Depth-first pre-order iterator over the states reachable from a state.
pub struct ReachableStates<'a> {
	aut: &'a Dfa,
	visited: HashSet<StateId>,
	stack: Vec<StateId>,
}

impl<'a> ReachableStates<'a> {
	fn new(aut: &'a Dfa, q: StateId) -> Self {
		Self {
			aut,
			visited: HashSet::new(),
			stack: if q < aut.len() { vec![q] } else { Vec::new() },
		}
	}
}

impl<'a> Iterator for ReachableStates<'a> {
	type Item = StateId;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			match self.stack.pop() {
				Some(q) => {
					if self.visited.insert(q) {
						let transitions = self.aut.states[q].transitions();
						for t in transitions.iter().rev() {
							if !self.visited.contains(&t.target) {
								self.stack.push(t.target)
							}
						}

						break Some(q);
					}
				}
				None => break None,
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn r(c: char) -> Range {
		Range::single(c as u32)
	}

	/// q0 -a-> q1 (accepting) -b-> q2 -c-> q3 ; q1 -d-> q1
	fn sample() -> Dfa {
		let mut aut = Dfa::new();
		let q1 = aut.add_state(State::new(Some(0), Vec::new()));
		let q2 = aut.add_state(State::default());
		let q3 = aut.add_state(State::default());
		aut.add_transition(0, r('a'), q1);
		aut.add_transition(q1, r('b'), q2);
		aut.add_transition(q2, r('c'), q3);
		aut.add_transition(q1, r('d'), q1);
		aut
	}

	#[test]
	fn closure_order() {
		let aut = sample();
		assert_eq!(aut.closure(0), vec![0, 1, 2, 3]);
		assert_eq!(aut.closure(2), vec![2, 3]);
	}

	#[test]
	fn duplicate_transitions_are_ignored() {
		let mut aut = sample();
		aut.add_transition(0, r('a'), 1);
		assert_eq!(aut.state(0).unwrap().transitions().len(), 1);
	}

	#[test]
	fn prune() {
		let mut aut = sample();
		assert_eq!(aut.prune_dead_transitions(), 2);
		assert!(aut.state(1).unwrap().next('b' as u32).is_none());
		assert_eq!(aut.state(1).unwrap().next('d' as u32), Some(1));

		aut.retain_reachable();
		assert_eq!(aut.len(), 2);
		for q in aut.closure(aut.start()) {
			for t in aut.state(q).unwrap().transitions() {
				assert!(aut.closure(t.target).into_iter().any(|s| aut.is_accepting(s)))
			}
		}
	}

	#[test]
	fn run() {
		let aut = sample();
		assert_eq!(aut.run("a"), Some(0));
		assert_eq!(aut.run("addd"), Some(0));
		assert_eq!(aut.run(""), None);
		assert_eq!(aut.run("ab"), None);
		assert_eq!(aut.longest_match("addbc"), Some((0, 3)));
		assert_eq!(aut.trace("add"), Some(vec![(0, 0), (1, 1), (2, 1), (3, 1)]));
		assert_eq!(aut.trace("ab"), None);
	}

	#[test]
	fn anchors() {
		// ^a$
		let mut aut = Dfa::new();
		let q1 = aut.add_state(State::default());
		let q2 = aut.add_state(State::default());
		let q3 = aut.add_state(State::new(Some(0), Vec::new()));
		aut.add_transition(0, Range::line_start(), q1);
		aut.add_transition(q1, r('a'), q2);
		aut.add_transition(q2, Range::text_end(), q3);
		assert!(aut.accepts("a"));
		assert!(!aut.accepts("aa"));
		assert!(!aut.accepts(""));
		assert_eq!(aut.trace("a"), Some(vec![(0, 0), (0, 1), (1, 2), (1, 3)]));
	}

	#[test]
	fn unknown_states_are_ignored() {
		let mut aut = sample();
		aut.add_transition(7, r('z'), 0);
		assert_eq!(aut.len(), 4);
		assert_eq!(aut.retain_transitions(7, |_| false), 0);
		assert_eq!(aut.retain_transitions(1, |t| t.target != 1), 1);
	}

	#[test]
	fn grouped_transitions() {
		let mut state = State::default();
		state.add_transition(Range::new('c' as u32, 'd' as u32), 1);
		state.add_transition(r('x'), 2);
		state.add_transition(Range::new('a' as u32, 'b' as u32), 1);
		assert_eq!(
			state.grouped_transitions(),
			vec![(1, vec![Range::new('a' as u32, 'd' as u32)]), (2, vec![r('x')])]
		);
	}
}

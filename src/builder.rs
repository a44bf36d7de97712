//! DFA construction.
//!
//! The input tree is copied, augmented with terminators, and analyzed
//! (positions, nullable/firstpos/lastpos, followpos, partition, lazy
//! attribution, capture events). States are then synthesized from sets of
//! positions with a worklist. Dead transitions are pruned and lazy edges
//! trimmed on the finished graph.
use std::collections::{HashMap, VecDeque};
use itertools::Itertools;
use crate::{
	ast::{AcceptSymbol, Ast, Node, NodeId},
	automaton::{Dfa, State, StateId},
	capture::CaptureEvents,
	lazy::LazyAttribution,
	partition::Partition,
	position::{FollowPos, Position, PositionSet, Positions, Properties},
	Error, Result,
};

/// Construction options.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
	/// Every top-level alternative gets its own accept symbol.
	pub lexer: bool,

	/// Attach capture events to states.
	pub captures: bool,

	/// Honor non-greedy repetitions.
	///
	/// When disabled, lazy repetitions are treated as greedy ones.
	pub lazy: bool,

	/// Unroll bounded repetitions before the analysis.
	pub expand_repeats: bool,

	/// Remove transitions that cannot lead to an accepting state.
	pub prune: bool,

	/// Remove the loop-back edges of lazy repetitions out of accepting states.
	pub trim: bool,
}

impl Default for Config {
	fn default() -> Config {
		Config {
			lexer: false,
			captures: true,
			lazy: true,
			expand_repeats: true,
			prune: true,
			trim: true,
		}
	}
}

impl Config {
	pub fn lexer() -> Config {
		Config {
			lexer: true,
			..Config::default()
		}
	}
}

/// Identity of a state during construction.
///
/// Two position sets that only differ by their lazy subset are distinct
/// states.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct StateKey {
	positions: Vec<Position>,
	lazy: Vec<Position>,
	accept: Option<AcceptSymbol>,
}

impl StateKey {
	pub fn new(positions: &PositionSet, lazy: &PositionSet, accept: Option<AcceptSymbol>) -> StateKey {
		StateKey {
			positions: positions.iter().cloned().collect(),
			lazy: lazy.iter().cloned().collect(),
			accept,
		}
	}

	pub fn positions(&self) -> &[Position] {
		&self.positions
	}

	pub fn lazy(&self) -> &[Position] {
		&self.lazy
	}

	pub fn accept_symbol(&self) -> Option<AcceptSymbol> {
		self.accept
	}
}

/// Positions a state was made of.
struct Provenance {
	positions: PositionSet,
	lazy: PositionSet,
}

/// Augmented tree and the tables computed from it.
pub struct Analysis {
	ast: Ast,
	root: NodeId,
	positions: Positions,
	props: Properties,
	follow: FollowPos,
	partition: Partition,
	lazy: LazyAttribution,
	captures: CaptureEvents,
}

impl Analysis {
	pub fn ast(&self) -> &Ast {
		&self.ast
	}

	pub fn root(&self) -> NodeId {
		self.root
	}

	pub fn positions(&self) -> &Positions {
		&self.positions
	}

	pub fn properties(&self) -> &Properties {
		&self.props
	}

	pub fn follow(&self) -> &FollowPos {
		&self.follow
	}

	pub fn partition(&self) -> &Partition {
		&self.partition
	}

	pub fn lazy(&self) -> &LazyAttribution {
		&self.lazy
	}

	pub fn captures(&self) -> &CaptureEvents {
		&self.captures
	}
}

/// DFA builder.
#[derive(Clone, Copy, Default, Debug)]
pub struct Builder {
	config: Config,
}

impl Builder {
	pub fn new(config: Config) -> Builder {
		Builder { config }
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Builds the automaton recognizing the given tree.
	///
	/// The input tree is left untouched.
	pub fn build(&self, ast: &Ast) -> Result<Dfa> {
		let analysis = self.analyze(ast)?;
		let (mut dfa, provenance) = self.synthesize(&analysis)?;
		log::info!("synthesized {} states", dfa.len());

		if self.config.prune {
			let count = dfa.prune_dead_transitions();
			log::info!("pruned {} dead transitions", count);
		}

		if self.config.trim && self.config.lazy {
			let count = trim_lazy_edges(&mut dfa, &provenance, &analysis)?;
			log::info!("trimmed {} lazy edges", count);
		}

		dfa.retain_reachable();
		log::info!("automaton has {} reachable states", dfa.len());
		Ok(dfa)
	}

	/// Augments a copy of the tree and computes its tables.
	pub fn analyze(&self, ast: &Ast) -> Result<Analysis> {
		let (ast, root) = self.augment(ast)?;
		log::debug!("augmented tree: {}", ast.display(root));

		let positions = Positions::new(&ast, root)?;
		let props = Properties::new(&ast, root, &positions)?;
		let follow = FollowPos::new(&ast, root, &positions, &props)?;
		let partition = Partition::new(&ast, root)?;
		log::info!(
			"{} positions, {} intervals",
			positions.len(),
			partition.points().len() + partition.anchors().len()
		);

		let lazy = if self.config.lazy {
			LazyAttribution::new(&ast, root, &positions)?
		} else {
			LazyAttribution::greedy(&positions)
		};

		let captures = if self.config.captures {
			CaptureEvents::new(&ast, root, &positions, &props)?
		} else {
			CaptureEvents::none(&positions)
		};

		Ok(Analysis {
			ast,
			root,
			positions,
			props,
			follow,
			partition,
			lazy,
			captures,
		})
	}

	fn copy(&self, ast: &Ast, id: NodeId, target: &mut Ast) -> Result<NodeId> {
		if self.config.expand_repeats {
			ast.expand_into(id, target)
		} else {
			ast.copy_into(id, target)
		}
	}

	/// Copy of the tree where each alternative (or the whole tree) is
	/// followed by a terminator.
	fn augment(&self, ast: &Ast) -> Result<(Ast, NodeId)> {
		let root = ast.root().ok_or(Error::MissingRoot)?;
		let mut result = Ast::new();

		let root = if self.config.lexer {
			match ast.node(root)? {
				Node::Or(_, _) => (),
				_ => return Err(Error::LexerRequiresAlternation),
			}

			let mut items = Vec::new();
			for (i, alternative) in ast.alternatives(root)?.into_iter().enumerate() {
				let alternative = self.copy(ast, alternative, &mut result)?;
				let end = result.terminator(i as AcceptSymbol);
				items.push(result.concat(alternative, end))
			}

			result.or_chain(&items)
		} else {
			let root = self.copy(ast, root, &mut result)?;
			let end = result.terminator(0);
			result.concat(root, end)
		};

		result.set_root(root);
		Ok((result, root))
	}

	fn synthesize(&self, analysis: &Analysis) -> Result<(Dfa, Vec<Provenance>)> {
		let mut synthesis = Synthesis {
			analysis,
			states: Vec::new(),
			provenance: Vec::new(),
			map: HashMap::new(),
			queue: VecDeque::new(),
		};

		let start = analysis.props.first(analysis.root)?.clone();
		let start_lazy = analysis.lazy.inherent(&start);
		let start = synthesis.get_or_insert(start, start_lazy)?;

		while let Some(q) = synthesis.queue.pop_front() {
			synthesis.expand(q)?
		}

		Ok((Dfa::from_states(synthesis.states, start), synthesis.provenance))
	}
}

/// Worklist state.
struct Synthesis<'a> {
	analysis: &'a Analysis,
	states: Vec<State>,
	provenance: Vec<Provenance>,
	map: HashMap<StateKey, StateId>,
	queue: VecDeque<StateId>,
}

impl<'a> Synthesis<'a> {
	fn get_or_insert(&mut self, positions: PositionSet, lazy: PositionSet) -> Result<StateId> {
		let accept = self.analysis.positions.accept_symbol(&positions)?;
		let key = StateKey::new(&positions, &lazy, accept);

		match self.map.get(&key) {
			Some(q) => Ok(*q),
			None => {
				let q = self.states.len();
				log::debug!(
					"new state q{} {{{}}} lazy {{{}}}",
					q,
					key.positions().iter().format(", "),
					key.lazy().iter().format(", ")
				);
				let captures = self.analysis.captures.for_positions(&positions);
				self.states.push(State::new(accept, captures));
				self.provenance.push(Provenance { positions, lazy });
				self.map.insert(key, q);
				self.queue.push_back(q);
				Ok(q)
			}
		}
	}

	fn expand(&mut self, q: StateId) -> Result<()> {
		let analysis = self.analysis;
		let current = self.provenance[q].positions.clone();
		let current_lazy = self.provenance[q].lazy.clone();

		for interval in analysis.partition.intervals() {
			let mut group = PositionSet::new();
			for p in &current {
				let leaf = analysis.positions.leaf(*p)?;
				if leaf.terminator().is_none() && leaf.matches(&interval) {
					group.insert(*p);
				}
			}

			if group.is_empty() {
				continue
			}

			let next = analysis.follow.union(&group)?;
			if next.is_empty() {
				continue
			}

			let next_lazy = analysis.lazy.contagion(&group, &next, &current_lazy, &analysis.follow)?;
			let target = self.get_or_insert(next, next_lazy)?;
			log::debug!("q{} --{}--> q{}", q, interval, target);
			self.states[q].add_transition(interval, target)
		}

		Ok(())
	}
}

/// Removes, from every accepting state, the transitions re-entering a lazy
/// repetition that state is part of.
fn trim_lazy_edges(dfa: &mut Dfa, provenance: &[Provenance], analysis: &Analysis) -> Result<usize> {
	let mut count = 0;

	for q in 0..dfa.len() {
		if !dfa.is_accepting(q) {
			continue
		}

		let mut loop_starts = PositionSet::new();
		for p in &provenance[q].lazy {
			if let Some(parent) = analysis.lazy.lazy_parent(*p) {
				loop_starts.extend(analysis.props.first(parent)?.iter().cloned())
			}
		}

		if loop_starts.is_empty() {
			continue
		}

		let removed = dfa.retain_transitions(q, |t| provenance[t.target].positions.is_disjoint(&loop_starts));
		if removed > 0 {
			log::debug!("trimmed {} lazy edges from q{}", removed, q);
		}

		count += removed
	}

	Ok(count)
}

/// Builds the automaton of a tree with the default configuration.
pub fn build(ast: &Ast) -> Result<Dfa> {
	Builder::default().build(ast)
}

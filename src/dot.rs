//! Graphviz output.
use std::{fmt, io};
use crate::{
	automaton::Dfa,
	charset::{self, Range},
};

/// Longest rendered range list before it is cut.
const MAX_LABEL_LEN: usize = 16;

/// Transition label of a group of ranges.
///
/// Anchors are rendered first. The remaining ranges are rendered as is, or
/// as their complement (`^...`) when it is shorter.
pub struct DisplayLabel<'a>(pub &'a [Range]);

impl<'a> fmt::Display for DisplayLabel<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let (anchors, ranges): (Vec<Range>, Vec<Range>) = self.0.iter().cloned().partition(|r| r.is_anchor());
		for anchor in &anchors {
			anchor.fmt(f)?
		}

		if ranges.is_empty() {
			return Ok(())
		}

		let ranges = charset::merge_sorted(ranges);
		let complement = charset::invert_ranges(&ranges);
		let mut label = String::new();
		if complement.is_empty() {
			label.push('.')
		} else if complement.len() < ranges.len() {
			label.push('^');
			for range in &complement {
				label.push_str(&range.to_string())
			}
		} else {
			for range in &ranges {
				label.push_str(&range.to_string())
			}
		}

		if label.chars().count() > MAX_LABEL_LEN {
			let cut: String = label.chars().take(MAX_LABEL_LEN).collect();
			write!(f, "[{}...]", cut)
		} else if label.chars().count() > 1 || label == "." || label == "^" {
			write!(f, "[{}]", label)
		} else {
			write!(f, "{}", label)
		}
	}
}

/// Escapes a DOT string literal.
fn escape(s: &str) -> String {
	let mut result = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'"' => result.push_str("\\\""),
			'\\' => result.push_str("\\\\"),
			c => result.push(c),
		}
	}

	result
}

impl Dfa {
	/// Writes the automaton in the DOT format.
	///
	/// States are numbered in closure order. Accepting states are double
	/// circles labelled with their accept symbol. Non-accepting states
	/// without transitions are gray.
	pub fn dot_write<W: io::Write>(&self, f: &mut W) -> io::Result<()> {
		let closure = self.closure(self.start());
		let mut index = vec![0; self.len()];
		for (i, q) in closure.iter().enumerate() {
			index[*q] = i
		}

		writeln!(f, "digraph FA {{")?;
		writeln!(f, "\trankdir=LR")?;
		writeln!(f, "\tnode [shape=circle]")?;

		for (i, q) in closure.iter().enumerate() {
			let state = match self.state(*q) {
				Some(state) => state,
				None => continue,
			};

			for (target, ranges) in state.grouped_transitions() {
				let label = DisplayLabel(&ranges).to_string();
				writeln!(f, "\tq{} -> q{} [ label=\"{}\" ]", i, index[target], escape(&label))?
			}
		}

		for (i, q) in closure.iter().enumerate() {
			let state = match self.state(*q) {
				Some(state) => state,
				None => continue,
			};

			write!(f, "\tq{} [ label=<<TABLE BORDER=\"0\"><TR><TD>q<SUB>{}</SUB></TD></TR>", i, i)?;
			if let Some(symbol) = state.accept_symbol() {
				write!(f, "<TR><TD>{}</TD></TR>", symbol)?
			}

			for event in state.captures() {
				write!(f, "<TR><TD>{}</TD></TR>", event)?
			}

			write!(f, "</TABLE>>")?;
			if state.is_accepting() {
				write!(f, ", shape=doublecircle")?
			} else if state.transitions().is_empty() {
				write!(f, ", color=gray")?
			}

			writeln!(f, " ]")?
		}

		write!(f, "}}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::automaton::State;

	fn cp(c: char) -> u32 {
		c as u32
	}

	#[test]
	fn labels() {
		assert_eq!(DisplayLabel(&[Range::single(cp('a'))]).to_string(), "a");
		assert_eq!(DisplayLabel(&[Range::new(cp('a'), cp('z'))]).to_string(), "[a-z]");
		assert_eq!(DisplayLabel(&[Range::new(0, charset::MAX_CODEPOINT)]).to_string(), "[.]");
		assert_eq!(
			DisplayLabel(&[Range::new(0, 9), Range::new(11, charset::MAX_CODEPOINT)]).to_string(),
			"[^\\n]"
		);
		assert_eq!(DisplayLabel(&[Range::line_start(), Range::single(cp('a'))]).to_string(), "{^}a");

		let many: Vec<Range> = "acegikmoqsuwy".chars().map(|c| Range::single(cp(c))).collect();
		assert_eq!(DisplayLabel(&many).to_string(), "[acegikmoqsuwy]");
		let more: Vec<Range> = "acegikmoqsuwyACEGI".chars().map(|c| Range::single(cp(c))).collect();
		assert_eq!(DisplayLabel(&more).to_string(), "[ACEGIacegikmoqsu...]");
	}

	#[test]
	fn dot() {
		let mut dfa = Dfa::new();
		let q1 = dfa.add_state(State::new(Some(2), Vec::new()));
		dfa.add_transition(0, Range::single(cp('"')), q1);

		let mut out = Vec::new();
		dfa.dot_write(&mut out).unwrap();
		let out = String::from_utf8(out).unwrap();
		assert!(out.starts_with("digraph FA {\n"));
		assert!(out.contains("\tq0 -> q1 [ label=\"\\\"\" ]\n"));
		assert!(out.contains("<TR><TD>2</TD></TR></TABLE>>, shape=doublecircle ]"));
		assert!(out.ends_with('}'));
	}
}

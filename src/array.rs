//! Packed integer encoding of an automaton.
//!
//! Each state, in closure order from the start state, is laid out as:
//!
//! ```text
//! accept  groups  (target  count  data...)*
//! ```
//!
//! where `accept` is the accept symbol or `-1`, `groups` the number of
//! destination groups, `target` the offset of the destination state in the
//! array and `data` either `count` pairs of `min max` (range form) or `count`
//! individual codepoints (codepoint form). The start state is at offset 0.
//!
//! Range arrays always have an even length. Codepoint arrays are padded with a
//! trailing `-1` to an odd length, so the two can be told apart.
//!
//! Capture events are not encoded.
use std::collections::HashMap;
use crate::{
	automaton::{Dfa, State, StateId},
	charset::{self, Range, LINE_START, TEXT_END},
	Error, Result,
};

/// Accept value of a non-accepting state.
pub const NO_ACCEPT: i32 = -1;

/// Padding of codepoint arrays.
pub const PADDING: i32 = -1;

/// Encoding of the line start anchor.
pub const LINE_START_CODE: i32 = -2;

/// Encoding of the text end anchor.
pub const TEXT_END_CODE: i32 = -3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Encoding {
	/// `min max` pairs.
	Ranges,

	/// Individual codepoints.
	Codepoints,
}

/// Checks if the array uses the range form.
pub fn is_range_array(array: &[i32]) -> bool {
	array.len() % 2 == 0
}

fn encode_codepoint(c: u32) -> i32 {
	match c {
		LINE_START => LINE_START_CODE,
		TEXT_END => TEXT_END_CODE,
		c => c as i32,
	}
}

fn decode_codepoint(value: i32, offset: usize) -> Result<u32> {
	match value {
		LINE_START_CODE => Ok(LINE_START),
		TEXT_END_CODE => Ok(TEXT_END),
		v if v >= 0 && v as u32 <= charset::MAX_CODEPOINT => Ok(v as u32),
		_ => Err(Error::MalformedArray(offset)),
	}
}

fn read(array: &[i32], offset: usize) -> Result<i32> {
	array.get(offset).cloned().ok_or(Error::MalformedArray(offset))
}

fn read_count(array: &[i32], offset: usize) -> Result<usize> {
	let value = read(array, offset)?;
	if value < 0 {
		Err(Error::MalformedArray(offset))
	} else {
		Ok(value as usize)
	}
}

impl Dfa {
	/// Number of integers needed to encode the state's groups.
	fn packed_groups_len(groups: &[(StateId, Vec<Range>)], encoding: Encoding) -> usize {
		groups
			.iter()
			.map(|(_, ranges)| {
				2 + match encoding {
					Encoding::Ranges => 2 * ranges.len(),
					Encoding::Codepoints => ranges.iter().map(|r| r.len() as usize).sum(),
				}
			})
			.sum()
	}

	fn packed_layout(&self) -> (Vec<StateId>, Vec<Vec<(StateId, Vec<Range>)>>) {
		let order = self.closure(self.start());
		let groups = order
			.iter()
			.map(|q| match self.state(*q) {
				Some(state) => state.grouped_transitions(),
				None => Vec::new(),
			})
			.collect();
		(order, groups)
	}

	/// Length of the array in the given encoding, without building it.
	pub fn packed_len(&self, encoding: Encoding) -> usize {
		let (_, groups) = self.packed_layout();
		let len: usize = groups.iter().map(|g| 2 + Self::packed_groups_len(g, encoding)).sum();
		match encoding {
			Encoding::Codepoints if len % 2 == 0 => len + 1,
			_ => len,
		}
	}

	pub fn to_packed_array(&self, encoding: Encoding) -> Vec<i32> {
		let (order, groups) = self.packed_layout();

		let mut offsets = HashMap::new();
		let mut len = 0;
		for (q, g) in order.iter().zip(&groups) {
			offsets.insert(*q, len);
			len += 2 + Self::packed_groups_len(g, encoding)
		}

		let mut result = Vec::with_capacity(len + 1);
		for (q, g) in order.iter().zip(&groups) {
			result.push(self.accept_symbol(*q).map_or(NO_ACCEPT, |symbol| symbol as i32));
			result.push(g.len() as i32);
			for (target, ranges) in g {
				result.push(offsets[target] as i32);
				match encoding {
					Encoding::Ranges => {
						result.push(ranges.len() as i32);
						for range in ranges {
							result.push(encode_codepoint(range.first()));
							result.push(encode_codepoint(range.last()));
						}
					}
					Encoding::Codepoints => {
						let count: u32 = ranges.iter().map(Range::len).sum();
						result.push(count as i32);
						for range in ranges {
							result.extend(range.codepoints().map(encode_codepoint))
						}
					}
				}
			}
		}

		if encoding == Encoding::Codepoints && result.len() % 2 == 0 {
			result.push(PADDING)
		}

		result
	}

	pub fn to_range_array(&self) -> Vec<i32> {
		self.to_packed_array(Encoding::Ranges)
	}

	pub fn to_non_range_array(&self) -> Vec<i32> {
		self.to_packed_array(Encoding::Codepoints)
	}

	/// Shortest of the two encodings.
	///
	/// On a tie, the codepoint form is used.
	pub fn to_array(&self) -> Vec<i32> {
		if self.packed_len(Encoding::Ranges) < self.packed_len(Encoding::Codepoints) {
			self.to_range_array()
		} else {
			self.to_non_range_array()
		}
	}

	/// Decodes an array produced by one of the `to_*array` functions.
	///
	/// The encoding is detected from the array length. An empty array gives
	/// an automaton with a single non-accepting state.
	pub fn from_array(array: &[i32]) -> Result<Dfa> {
		if array.is_empty() {
			return Ok(Dfa::new())
		}

		let encoding = if is_range_array(array) {
			Encoding::Ranges
		} else {
			Encoding::Codepoints
		};

		// A lone trailing padding element is not a state.
		let end = match encoding {
			Encoding::Codepoints if array[array.len() - 1] == PADDING && Self::ends_with_padding(array)? => {
				array.len() - 1
			}
			_ => array.len(),
		};

		// First pass: state offsets.
		let mut offsets = HashMap::new();
		let mut starts = Vec::new();
		let mut i = 0;
		while i < end {
			offsets.insert(i, starts.len());
			starts.push(i);
			i = Self::skip_state(array, i, encoding)?;
		}

		if i > end {
			return Err(Error::MalformedArray(end))
		}

		// Second pass: transitions.
		let mut states = Vec::with_capacity(starts.len());
		for start in starts {
			let accept = read(array, start)?;
			let mut state = State::new(if accept < 0 { None } else { Some(accept as u32) }, Vec::new());

			let mut i = start + 1;
			let group_count = read_count(array, i)?;
			i += 1;
			for _ in 0..group_count {
				let target_offset = read_count(array, i)?;
				let target = *offsets.get(&target_offset).ok_or(Error::MalformedArray(i))?;
				let count = read_count(array, i + 1)?;
				i += 2;

				let mut ranges = Vec::with_capacity(count);
				for _ in 0..count {
					match encoding {
						Encoding::Ranges => {
							let first = decode_codepoint(read(array, i)?, i)?;
							let last = decode_codepoint(read(array, i + 1)?, i + 1)?;
							if first > last {
								return Err(Error::MalformedArray(i))
							}

							ranges.push(Range::new(first, last));
							i += 2
						}
						Encoding::Codepoints => {
							ranges.push(Range::single(decode_codepoint(read(array, i)?, i)?));
							i += 1
						}
					}
				}

				for range in charset::merge_sorted(ranges) {
					state.add_transition(range, target)
				}
			}

			states.push(state)
		}

		Ok(Dfa::from_states(states, 0))
	}

	/// Checks if the last element of a codepoint array is padding rather than
	/// part of the last state.
	fn ends_with_padding(array: &[i32]) -> Result<bool> {
		let mut i = 0;
		while i < array.len() - 1 {
			i = Self::skip_state(array, i, Encoding::Codepoints)?;
		}

		Ok(i == array.len() - 1)
	}

	/// Offset of the state following the one at `i`.
	fn skip_state(array: &[i32], i: usize, encoding: Encoding) -> Result<usize> {
		let group_count = read_count(array, i + 1)?;
		let mut i = i + 2;
		for _ in 0..group_count {
			let count = read_count(array, i + 1)?;
			i += 2 + match encoding {
				Encoding::Ranges => 2 * count,
				Encoding::Codepoints => count,
			};
		}

		Ok(i)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cp(c: char) -> u32 {
		c as u32
	}

	/// q0 -[a-c]-> q1 (accepting 0) -x-> q1
	fn sample() -> Dfa {
		let mut dfa = Dfa::new();
		let q1 = dfa.add_state(State::new(Some(0), Vec::new()));
		dfa.add_transition(0, Range::new(cp('a'), cp('c')), q1);
		dfa.add_transition(q1, Range::single(cp('x')), q1);
		dfa
	}

	#[test]
	fn range_array() {
		let array = sample().to_range_array();
		let a = cp('a') as i32;
		let x = cp('x') as i32;
		assert_eq!(array, vec![-1, 1, 6, 1, a, a + 2, 0, 1, 6, 1, x, x]);
		assert!(is_range_array(&array));
		assert_eq!(sample().packed_len(Encoding::Ranges), array.len());
	}

	#[test]
	fn non_range_array() {
		let array = sample().to_non_range_array();
		let a = cp('a') as i32;
		let x = cp('x') as i32;
		assert_eq!(array, vec![-1, 1, 7, 3, a, a + 1, a + 2, 0, 1, 7, 1, x, PADDING]);
		assert!(!is_range_array(&array));
		assert_eq!(sample().packed_len(Encoding::Codepoints), array.len());
	}

	#[test]
	fn shortest_encoding() {
		assert_eq!(sample().to_array(), sample().to_range_array());

		let mut dfa = Dfa::new();
		let q1 = dfa.add_state(State::new(Some(3), Vec::new()));
		dfa.add_transition(0, Range::single(cp('a')), q1);
		// range: 2 + 4 + 2 = 8, codepoints: 2 + 3 + 2 = 7.
		assert_eq!(dfa.to_array(), vec![-1, 1, 5, 1, cp('a') as i32, 3, 0]);
	}

	#[test]
	fn decode() {
		for array in vec![sample().to_range_array(), sample().to_non_range_array()] {
			let dfa = Dfa::from_array(&array).unwrap();
			assert_eq!(dfa.len(), 2);
			assert!(dfa.accepts("bxx"));
			assert!(!dfa.accepts("x"));
			assert_eq!(dfa.to_range_array(), sample().to_range_array());
		}
	}

	#[test]
	fn trailing_padding_is_not_a_state() {
		// single accepting state without transitions: [0, 0, -1]
		let dfa = Dfa::from_array(&[0, 0, PADDING]).unwrap();
		assert_eq!(dfa.len(), 1);
		assert!(dfa.accepts(""));
	}

	#[test]
	fn anchors() {
		let mut dfa = Dfa::new();
		let q1 = dfa.add_state(State::new(Some(0), Vec::new()));
		dfa.add_transition(0, Range::line_start(), q1);
		dfa.add_transition(0, Range::text_end(), q1);
		let array = dfa.to_range_array();
		assert_eq!(array, vec![-1, 1, 8, 2, LINE_START_CODE, LINE_START_CODE, TEXT_END_CODE, TEXT_END_CODE, 0, 0]);
		assert_eq!(Dfa::from_array(&array).unwrap().to_range_array(), array);
	}

	#[test]
	fn empty() {
		let dfa = Dfa::from_array(&[]).unwrap();
		assert_eq!(dfa.len(), 1);
		assert!(!dfa.accepts(""));
	}

	#[test]
	fn malformed() {
		assert_eq!(Dfa::from_array(&[-1, 1, 40, 1, 97, 97]).unwrap_err(), Error::MalformedArray(2));
		assert!(Dfa::from_array(&[-1, 1, 0, 3]).is_err());
		assert!(Dfa::from_array(&[-1, -4]).is_err());
	}
}

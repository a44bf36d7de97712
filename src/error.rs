use std::fmt;
use crate::{ast::NodeId, position::Position};

/// Construction error.
///
/// These are contract violations: the build is aborted and no partial
/// automaton is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// The AST has no root node.
	MissingRoot,

	/// A node references a node that does not exist (or that is not one of its
	/// predecessors in the arena).
	UnknownNode(NodeId),

	/// A bounded repetition whose minimum exceeds its maximum.
	InvalidRepeat(NodeId),

	/// A position is not part of the augmented tree.
	UnknownPosition(Position),

	/// Lexer mode was requested on a tree that is not a top-level alternation.
	LexerRequiresAlternation,

	/// Packed array is truncated or references a non-existent state.
	///
	/// The parameter is the offending offset in the array.
	MalformedArray(usize),
}

impl Error {
	pub fn title(&self) -> String {
		match self {
			Error::MissingRoot => "missing root".to_string(),
			Error::UnknownNode(_) => "dangling node reference".to_string(),
			Error::InvalidRepeat(_) => "invalid repetition bounds".to_string(),
			Error::UnknownPosition(_) => "unknown position".to_string(),
			Error::LexerRequiresAlternation => "invalid lexer".to_string(),
			Error::MalformedArray(_) => "malformed packed array".to_string(),
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Error::*;
		match self {
			MissingRoot => write!(f, "the tree has no root node"),
			UnknownNode(id) => write!(f, "reference to unknown node {}", id),
			InvalidRepeat(id) => write!(f, "repetition {} has a minimum greater than its maximum", id),
			UnknownPosition(p) => write!(f, "position {} is not part of the tree", p),
			LexerRequiresAlternation => write!(f, "lexer mode requires a top-level alternation"),
			MalformedArray(i) => write!(f, "malformed packed array at offset {}", i),
		}
	}
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

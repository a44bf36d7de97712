//! Regular expression to DFA compiler.
//!
//! Trees are turned directly into deterministic automata by the position
//! (followpos) construction, without an intermediate NFA. Beyond plain
//! regular expressions the construction supports:
//!
//! - a lexer mode, where every top-level alternative gets its own accept
//!   symbol, lower symbols taking precedence;
//! - capture groups, whose boundaries are reported as events on states;
//! - non-greedy repetitions;
//! - line start and text end anchors.
//!
//! ```
//! use posdfa::{syntax, Builder, Config};
//!
//! let ast = syntax::parse_str("(or \"foo\" \"fubar\")").unwrap();
//! let dfa = Builder::new(Config::lexer()).build(&ast).unwrap();
//! assert_eq!(dfa.run("fubar"), Some(1));
//! assert_eq!(dfa.longest_match("foobar"), Some((0, 3)));
//! ```
pub mod charset;
pub mod ast;
pub mod syntax;
pub mod position;
pub mod partition;
pub mod lazy;
pub mod capture;
pub mod builder;
pub mod automaton;
pub mod array;
pub mod dot;
pub mod out;
mod error;

pub use error::{Error, Result};
pub use charset::{Class, Range};
pub use ast::{AcceptSymbol, Ast, Node, NodeId};
pub use automaton::{Dfa, State, StateId, Transition};
pub use builder::{build, Builder, Config};
pub use capture::CaptureEvent;

//! S-expression reader for regular expression trees.
//!
//! ```text
//! (cat "if" (star [a-z\d]))      # concatenation
//! (or "foo" "fubar")             # alternation
//! (repeat 2 4 "ab")              # bounded repetition, -1 is unbounded
//! (lazy (star .))                # non-greedy repetition
//! (capture name (plus [0-9]))    # named capture group
//! (cat ^ (class word) $)         # anchors and named classes
//! ```
//!
//! Strings are concatenations of literals, the empty string (or `(empty)`)
//! is the empty literal and `.` matches any character but `\n`. Capture
//! groups are numbered from 1 in reading order. A document holding several
//! expressions denotes their alternation, in order.
use std::io;

mod error;
pub mod lexer;

pub use source_span::{Loc, Position, Span};
pub use error::{Error, Result};
pub use lexer::Lexer;
use lexer::Token;
use crate::{
	ast::{Ast, CharsetEntry, NodeId, UNBOUNDED},
	charset::Class,
};

/// Reads a tree from a string.
pub fn parse_str(input: &str) -> Result<Ast> {
	parse(input.chars().map(Ok))
}

/// Reads a tree from a character stream.
pub fn parse<I: Iterator<Item = io::Result<char>>>(input: I) -> Result<Ast> {
	let mut reader = Reader::new();
	let mut alternatives = Vec::new();
	let mut span = Span::default();

	for token in Lexer::new(input, source_span::DEFAULT_METRICS) {
		let token = token.map_err(error::lexer_error)?;
		span.append(token.span());
		alternatives.push(reader.read(&token)?)
	}

	if alternatives.is_empty() {
		return Err(Loc::new(Error::Empty, span))
	}

	let mut ast = reader.ast;
	let root = ast.or_chain(&alternatives);
	ast.set_root(root);
	Ok(ast)
}

struct Reader {
	ast: Ast,
	groups: u32,
}

impl Reader {
	fn new() -> Reader {
		Reader {
			ast: Ast::new(),
			groups: 0,
		}
	}

	fn read(&mut self, token: &Loc<Token>) -> Result<NodeId> {
		match token.as_ref() {
			Token::String(s) => Ok(self.ast.string(s)),
			Token::CharSet(entries, negated) => Ok(self.ast.charset(entries.clone(), *negated)),
			Token::Ident(id) => match id.as_str() {
				"^" => Ok(self.ast.line_start()),
				"$" => Ok(self.ast.text_end()),
				"." => Ok(self.ast.any_char()),
				_ => Err(Loc::new(Error::UnexpectedToken(token.as_ref().clone()), token.span())),
			},
			Token::Group(tokens) => {
				let (name, args) = form(token, tokens)?;
				self.read_form(token, name, args, false)
			}
		}
	}

	fn read_form(&mut self, token: &Loc<Token>, name: &str, args: &[Loc<Token>], lazy: bool) -> Result<NodeId> {
		match name {
			"star" | "plus" | "opt" | "repeat" => (),
			_ if lazy => return Err(Loc::new(Error::NotARepetition, token.span())),
			_ => (),
		}

		match name {
			"cat" => {
				let items = self.read_all(args)?;
				Ok(self.ast.concat_chain(&items))
			}
			"or" => {
				if args.is_empty() {
					return Err(Loc::new(Error::Arity(name.to_string(), 1), token.span()))
				}

				let items = self.read_all(args)?;
				Ok(self.ast.or_chain(&items))
			}
			"star" | "plus" | "opt" => {
				let inner = self.read(single(token, name, args)?)?;
				let (min, max) = match name {
					"star" => (0, UNBOUNDED),
					"plus" => (1, UNBOUNDED),
					_ => (0, 1),
				};

				Ok(self.ast.repeat(inner, min, max, lazy))
			}
			"repeat" => {
				if args.len() != 3 {
					return Err(Loc::new(Error::Arity(name.to_string(), 3), token.span()))
				}

				let min = bound(&args[0])?;
				let max = bound(&args[1])?;
				let inner = self.read(&args[2])?;
				Ok(self.ast.repeat(inner, min, max, lazy))
			}
			"lazy" => {
				let arg = single(token, name, args)?;
				match arg.as_ref() {
					Token::Group(tokens) => {
						let (name, args) = form(arg, tokens)?;
						self.read_form(arg, name, args, true)
					}
					_ => Err(Loc::new(Error::NotARepetition, arg.span())),
				}
			}
			"capture" => {
				self.groups += 1;
				let group = self.groups;
				match args {
					[inner] => {
						let inner = self.read(inner)?;
						Ok(self.ast.capture(inner, group, None))
					}
					[capture_name, inner] => {
						let capture_name = ident(capture_name)?.to_string();
						let inner = self.read(inner)?;
						Ok(self.ast.capture(inner, group, Some(capture_name)))
					}
					_ => Err(Loc::new(Error::Arity(name.to_string(), 2), token.span())),
				}
			}
			"class" => {
				let arg = single(token, name, args)?;
				let class_name = ident(arg)?;
				match Class::from_name(class_name) {
					Some((class, negated)) => Ok(self.ast.charset(vec![CharsetEntry::Class(class, negated)], false)),
					None => Err(Loc::new(Error::UnknownClass(class_name.to_string()), arg.span())),
				}
			}
			"empty" => {
				if !args.is_empty() {
					return Err(Loc::new(Error::Arity(name.to_string(), 0), token.span()))
				}

				Ok(self.ast.empty())
			}
			_ => Err(Loc::new(Error::UnknownForm(name.to_string()), token.span())),
		}
	}

	fn read_all(&mut self, args: &[Loc<Token>]) -> Result<Vec<NodeId>> {
		let mut items = Vec::with_capacity(args.len());
		for arg in args {
			items.push(self.read(arg)?)
		}

		Ok(items)
	}
}

/// Splits a group into its form name and arguments.
fn form<'a>(token: &Loc<Token>, tokens: &'a [Loc<Token>]) -> Result<(&'a str, &'a [Loc<Token>])> {
	match tokens.split_first() {
		Some((head, args)) => match head.as_ref() {
			Token::Ident(name) => Ok((name.as_str(), args)),
			t => Err(Loc::new(Error::UnexpectedToken(t.clone()), head.span())),
		},
		None => Err(Loc::new(Error::Empty, token.span())),
	}
}

fn single<'a>(token: &Loc<Token>, name: &str, args: &'a [Loc<Token>]) -> Result<&'a Loc<Token>> {
	match args {
		[arg] => Ok(arg),
		_ => Err(Loc::new(Error::Arity(name.to_string(), 1), token.span())),
	}
}

fn ident(token: &Loc<Token>) -> Result<&str> {
	match token.as_ref() {
		Token::Ident(id) => Ok(id.as_str()),
		t => Err(Loc::new(Error::UnexpectedToken(t.clone()), token.span())),
	}
}

fn bound(token: &Loc<Token>) -> Result<i32> {
	let id = ident(token)?;
	id.parse().map_err(|_| Loc::new(Error::InvalidBound(id.to_string()), token.span()))
}

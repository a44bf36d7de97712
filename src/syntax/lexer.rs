use crate::{
	ast::CharsetEntry,
	charset::{Class, DisplayString},
};
use itertools::Itertools;
use source_span::{Loc, Metrics, Span};
use std::convert::TryFrom;
use std::fmt;
use std::io;
use std::iter::Peekable;

pub enum Error {
	IO(io::Error),
	MissingCloser,
	InvalidChar,
	InvalidRange,
	IncompleteString,
	IncompleteCharSet,
	UnknownClass(String),
	Unexpected(char),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Error::*;
		match self {
			IO(e) => write!(f, "I/O: {}", e),
			MissingCloser => write!(f, "missing `)`"),
			InvalidChar => write!(f, "invalid char"),
			InvalidRange => write!(f, "invalid character range"),
			IncompleteString => write!(f, "incomplete string"),
			IncompleteCharSet => write!(f, "incomplete character set"),
			UnknownClass(name) => write!(f, "unknown character class `{}`", name),
			Unexpected(c) => write!(f, "unexpected character `{}`", c),
		}
	}
}

impl fmt::Debug for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

pub type Result<T> = std::result::Result<T, Loc<Error>>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
	/// Parenthesized list.
	Group(Vec<Loc<Token>>),
	String(String),
	CharSet(Vec<CharsetEntry>, bool),
	Ident(String),
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Token::*;
		match self {
			Group(tokens) => write!(f, "({})", tokens.iter().map(|t| t.as_ref()).format(" ")),
			String(s) => write!(f, "\"{}\"", DisplayString(s)),
			CharSet(entries, negate) => {
				write!(f, "[")?;
				if *negate {
					write!(f, "^")?
				}
				for entry in entries {
					entry.fmt(f)?
				}
				write!(f, "]")
			}
			Ident(id) => id.fmt(f),
		}
	}
}

fn is_space(c: char) -> bool {
	c.is_whitespace() || c.is_control()
}

fn is_separator(c: char) -> bool {
	is_space(c) || c == '(' || c == ')' || c == '[' || c == ']' || c == '"' || c == '#'
}

pub struct Lexer<I: Iterator<Item = io::Result<char>>, M: Metrics> {
	input: Peekable<I>,
	metrics: M,
	span: Span,
}

impl<I: Iterator<Item = io::Result<char>>, M: Metrics> Lexer<I, M> {
	pub fn new(input: I, metrics: M) -> Lexer<I, M> {
		Lexer {
			input: input.peekable(),
			metrics,
			span: Span::default(),
		}
	}

	fn peek(&mut self) -> Result<Option<char>> {
		match self.input.peek() {
			Some(Ok(c)) => Ok(Some(*c)),
			Some(Err(_)) => self.consume(),
			None => Ok(None),
		}
	}

	fn consume(&mut self) -> Result<Option<char>> {
		match self.input.next() {
			Some(Ok(c)) => {
				self.span.push(c, &self.metrics);
				Ok(Some(c))
			}
			Some(Err(e)) => Err(Loc::new(Error::IO(e), self.span.end().into())),
			None => Ok(None),
		}
	}

	fn expect(&mut self, error: Error) -> Result<char> {
		match self.consume()? {
			Some(c) => Ok(c),
			None => Err(Loc::new(error, self.span)),
		}
	}

	fn parse_group(&mut self) -> Result<Loc<Token>> {
		self.consume()?;
		let mut span = self.span;
		let mut tokens = Vec::new();

		loop {
			self.skip_whitespaces()?;

			match self.peek()? {
				Some(')') => {
					self.span.clear();
					self.consume()?;
					span.append(self.span);
					return Ok(Loc::new(Token::Group(tokens), span))
				}
				Some(_) => {
					if let Some(token) = self.parse_token()? {
						span.append(token.span());
						tokens.push(token)
					}
				}
				None => return Err(Loc::new(Error::MissingCloser, span)),
			}
		}
	}

	fn parse_hex_char(&mut self, n: usize) -> Result<char> {
		let mut codepoint = 0;

		for _ in 0..n {
			let c = self.expect(Error::InvalidChar)?;
			match c.to_digit(16) {
				Some(d) => codepoint = (codepoint << 4) | d,
				None => return Err(Loc::new(Error::InvalidChar, self.span)),
			}
		}

		match char::try_from(codepoint) {
			Ok(c) => Ok(c),
			Err(_) => Err(Loc::new(Error::InvalidChar, self.span)),
		}
	}

	/// Parses the character following a `\`.
	fn parse_escaped_char(&mut self, error: Error) -> Result<char> {
		match self.expect(error)? {
			'r' => Ok('\r'),
			'n' => Ok('\n'),
			's' => Ok(' '),
			't' => Ok('\t'),
			'x' => self.parse_hex_char(2),
			'u' => self.parse_hex_char(4),
			'U' => self.parse_hex_char(8),
			c => Ok(c),
		}
	}

	fn parse_string(&mut self) -> Result<Loc<Token>> {
		self.consume()?;

		let mut string = String::new();
		loop {
			match self.expect(Error::IncompleteString)? {
				'"' => break,
				'\\' => string.push(self.parse_escaped_char(Error::IncompleteString)?),
				c => string.push(c),
			}
		}

		Ok(Loc::new(Token::String(string), self.span))
	}

	/// Parses a character of a charset, after its first char `c` has been
	/// consumed.
	fn parse_charset_char(&mut self, c: char) -> Result<char> {
		match c {
			'\\' => self.parse_escaped_char(Error::IncompleteCharSet),
			c => Ok(c),
		}
	}

	fn parse_posix_class(&mut self) -> Result<CharsetEntry> {
		let mut name = String::new();
		loop {
			match self.expect(Error::IncompleteCharSet)? {
				':' => break,
				c => name.push(c),
			}
		}

		match self.expect(Error::IncompleteCharSet)? {
			']' => (),
			c => return Err(Loc::new(Error::Unexpected(c), self.span)),
		}

		match Class::from_name(&name) {
			Some((class, negated)) => Ok(CharsetEntry::Class(class, negated)),
			None => Err(Loc::new(Error::UnknownClass(name), self.span)),
		}
	}

	fn parse_charset(&mut self) -> Result<Loc<Token>> {
		self.consume()?;

		let negate = if let Some('^') = self.peek()? {
			self.consume()?;
			true
		} else {
			false
		};

		let mut entries = Vec::new();
		loop {
			let first = match self.expect(Error::IncompleteCharSet)? {
				']' => break,
				'[' => {
					if let Some(':') = self.peek()? {
						self.consume()?;
						entries.push(self.parse_posix_class()?);
						continue
					}

					'['
				}
				'\\' => {
					let class = match self.peek()? {
						Some('d') => Some((Class::Digit, false)),
						Some('D') => Some((Class::Digit, true)),
						Some('w') => Some((Class::Word, false)),
						Some('W') => Some((Class::Word, true)),
						Some('s') => Some((Class::Space, false)),
						Some('S') => Some((Class::Space, true)),
						_ => None,
					};

					match class {
						Some((class, negated)) => {
							self.consume()?;
							entries.push(CharsetEntry::Class(class, negated));
							continue
						}
						None => self.parse_charset_char('\\')?,
					}
				}
				c => c,
			};

			if let Some('-') = self.peek()? {
				self.consume()?;
				match self.expect(Error::IncompleteCharSet)? {
					']' => {
						entries.push(CharsetEntry::Char(first as u32));
						entries.push(CharsetEntry::Char('-' as u32));
						break
					}
					c => {
						let last = self.parse_charset_char(c)?;
						if last < first {
							return Err(Loc::new(Error::InvalidRange, self.span))
						}

						entries.push(CharsetEntry::Range(crate::charset::Range::new(first as u32, last as u32)))
					}
				}
			} else {
				entries.push(CharsetEntry::Char(first as u32))
			}
		}

		Ok(Loc::new(Token::CharSet(entries, negate), self.span))
	}

	fn parse_ident(&mut self) -> Result<Loc<Token>> {
		let mut id = String::new();

		while let Some(c) = self.peek()? {
			if is_separator(c) {
				break
			}

			self.consume()?;
			id.push(c);
		}

		Ok(Loc::new(Token::Ident(id), self.span))
	}

	fn skip_whitespaces(&mut self) -> Result<()> {
		loop {
			match self.peek()? {
				Some(c) if is_space(c) => {
					self.consume()?;
				}
				Some('#') => loop {
					match self.consume()? {
						Some('\n') => break,
						None => break,
						_ => (),
					}
				},
				_ => break,
			}
		}

		Ok(())
	}

	fn parse_token(&mut self) -> Result<Option<Loc<Token>>> {
		self.skip_whitespaces()?;
		self.span.clear();
		match self.peek()? {
			Some('(') => Ok(Some(self.parse_group()?)),
			Some(c) if c == ')' || c == ']' => {
				self.consume()?;
				Err(Loc::new(Error::Unexpected(c), self.span))
			}
			Some('[') => Ok(Some(self.parse_charset()?)),
			Some('"') => Ok(Some(self.parse_string()?)),
			Some(_) => Ok(Some(self.parse_ident()?)),
			None => Ok(None),
		}
	}
}

impl<I: Iterator<Item = io::Result<char>>, M: Metrics> Iterator for Lexer<I, M> {
	type Item = Result<Loc<Token>>;

	fn next(&mut self) -> Option<Result<Loc<Token>>> {
		self.parse_token().transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::charset::Range;

	fn tokens(input: &str) -> Vec<Token> {
		Lexer::new(input.chars().map(Ok), source_span::DEFAULT_METRICS).map(|t| t.unwrap().into_inner()).collect()
	}

	#[test]
	fn groups() {
		let tokens = tokens("(cat \"ab\" x) # comment\n$");
		assert_eq!(tokens.len(), 2);
		assert_eq!(tokens[0].to_string(), "(cat \"ab\" x)");
		assert_eq!(tokens[1], Token::Ident("$".to_string()));
	}

	#[test]
	fn strings() {
		assert_eq!(tokens(r#""a\"\n\x41""#), vec![Token::String("a\"\nA".to_string())]);
	}

	#[test]
	fn charsets() {
		assert_eq!(
			tokens(r"[^a-c\d[:^alpha:]-]"),
			vec![Token::CharSet(
				vec![
					CharsetEntry::Range(Range::new('a' as u32, 'c' as u32)),
					CharsetEntry::Class(Class::Digit, false),
					CharsetEntry::Class(Class::Alpha, true),
					CharsetEntry::Char('-' as u32)
				],
				true
			)]
		);

		assert_eq!(
			tokens(r"[\]x-]"),
			vec![Token::CharSet(
				vec![
					CharsetEntry::Char(']' as u32),
					CharsetEntry::Char('x' as u32),
					CharsetEntry::Char('-' as u32)
				],
				false
			)]
		);
	}

	#[test]
	fn errors() {
		let mut lexer = Lexer::new("(cat \"a\"".chars().map(Ok), source_span::DEFAULT_METRICS);
		assert!(matches!(lexer.next(), Some(Err(e)) if matches!(e.as_ref(), Error::MissingCloser)));

		let mut lexer = Lexer::new("\n  [z-a]".chars().map(Ok), source_span::DEFAULT_METRICS);
		match lexer.next() {
			Some(Err(e)) => {
				assert!(matches!(e.as_ref(), Error::InvalidRange));
				assert_eq!(e.span().start().line, 1);
				assert_eq!(e.span().start().column, 2);
			}
			_ => panic!("expected an error"),
		}

		let mut lexer = Lexer::new("[[:nope:]]".chars().map(Ok), source_span::DEFAULT_METRICS);
		assert!(matches!(lexer.next(), Some(Err(e)) if matches!(e.as_ref(), Error::UnknownClass(_))));
	}
}

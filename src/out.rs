//! Diagnostic output.
use std::fmt;
use source_span::{Metrics, Span};
use yansi::Paint;

pub enum Type {
	Warning,
	Error
}

impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Warning => write!(f, "{}", Paint::yellow("warning").bold()),
			Self::Error => write!(f, "{}", Paint::red("error").bold())
		}
	}
}

pub struct Block {
	ty: Type,
	title: String,
	source: Option<String>,
	span: Option<Span>,
	highlights: source_span::fmt::Formatter,
	notes: Vec<Note>
}

impl Block {
	pub fn new<S: ToString>(ty: Type, title: S) -> Block {
		Block {
			ty,
			title: title.to_string(),
			source: None,
			span: None,
			highlights: source_span::fmt::Formatter::new(),
			notes: Vec::new()
		}
	}

	pub fn source(&self) -> Option<&str> {
		self.source.as_deref()
	}

	pub fn set_source<S: ToString>(&mut self, source: S) {
		self.source = Some(source.to_string())
	}

	/// Region covered by the highlights.
	pub fn span(&self) -> Option<Span> {
		self.span
	}

	/// Highlights a region of the input, with an optional label.
	pub fn highlight(&mut self, span: Span, label: Option<String>) {
		self.span = Some(match self.span {
			Some(mut current) => {
				current.append(span);
				current
			}
			None => span
		});
		self.highlights.add(span, label, source_span::fmt::Style::Error)
	}

	pub fn add_note<S: ToString>(&mut self, ty: NoteType, content: S) {
		self.notes.push(Note {
			ty,
			content: content.to_string()
		})
	}

	/// Renders the block.
	///
	/// `input` must start at the beginning of `span`.
	pub fn render<E, I: Iterator<Item = Result<char, E>>, M: Metrics>(&self, input: I, span: Span, metrics: &M) -> Result<Formatted, E> {
		let (margin_len, highlights) = match self.span {
			Some(_) => (self.highlights.margin_len(&span), Some(self.highlights.render(input, span, metrics)?)),
			None => (0, None)
		};

		Ok(Formatted {
			block: self,
			margin_len,
			highlights
		})
	}
}

pub struct Formatted<'a> {
	block: &'a Block,
	margin_len: usize,
	highlights: Option<source_span::fmt::Formatted>
}

impl<'a> fmt::Display for Formatted<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let tab: String = std::iter::repeat(' ').take(self.margin_len.saturating_sub(2)).collect();

		writeln!(f, "{}{} {}", self.block.ty, Paint::new(':').bold(), Paint::new(&self.block.title).bold())?;

		if let Some(source) = &self.block.source {
			match self.block.span {
				Some(span) => {
					let start = span.start();
					writeln!(f, "{}{} {}:{}:{}", tab, Paint::blue("-->").bold(), source, start.line + 1, start.column + 1)?
				}
				None => writeln!(f, "{}{} {}", tab, Paint::blue("-->").bold(), source)?
			}
		}

		if let Some(highlights) = &self.highlights {
			write!(f, "{}{}", tab, Paint::blue('|').bold())?;
			highlights.fmt(f)?;
			writeln!(f, "{}{}", tab, Paint::blue('|').bold())?;
		}

		for note in &self.block.notes {
			for (i, line) in note.content.lines().enumerate() {
				if i == 0 {
					writeln!(f, "{}= {}: {}", tab, note.ty, line)?;
				} else {
					writeln!(f, "{}  {}", tab, line)?
				}
			}
		}

		Ok(())
	}
}

pub enum NoteType {
	Note,
	Help
}

impl fmt::Display for NoteType {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Note => write!(f, "{}", Paint::new("note").bold()),
			Self::Help => write!(f, "{}", Paint::green("help").bold())
		}
	}
}

pub struct Note {
	ty: NoteType,
	content: String
}

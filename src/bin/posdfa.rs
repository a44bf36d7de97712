#[macro_use]
extern crate clap;

use itertools::Itertools;
use source_span::{Loc, Span};
use std::{
	convert::Infallible,
	fs::File,
	io::{self, Read, Write},
	path::Path,
};

use posdfa::{
	array::Encoding,
	out,
	syntax,
	Builder, Config, Dfa,
};

fn main() {
	// Parse options.
	let yaml = load_yaml!("posdfa.yml");
	let matches = clap::App::from_yaml(yaml).get_matches();

	// Init logger.
	let verbosity = matches.occurrences_of("verbose") as usize;
	if let Err(e) = stderrlog::new().verbosity(verbosity).init() {
		eprintln!("unable to initialize the logger: {}", e)
	}

	let filename = matches.value_of("FILE").unwrap_or("-");
	let input = match read_input(filename) {
		Ok(input) => input,
		Err(e) => {
			Error::IO(e).format(filename, "");
			std::process::exit(1)
		}
	};

	if let Err(e) = run(&matches, &input) {
		e.format(filename, &input);
		std::process::exit(1)
	}
}

fn read_input(filename: &str) -> io::Result<String> {
	let mut input = String::new();
	if filename == "-" {
		io::stdin().read_to_string(&mut input)?;
	} else {
		File::open(filename)?.read_to_string(&mut input)?;
	}

	Ok(input)
}

fn config(matches: &clap::ArgMatches) -> Config {
	Config {
		lexer: matches.is_present("lexer"),
		captures: !matches.is_present("no-captures"),
		lazy: !matches.is_present("no-lazy"),
		expand_repeats: !matches.is_present("no-expand"),
		prune: !matches.is_present("no-prune"),
		trim: !matches.is_present("no-trim"),
	}
}

fn run(matches: &clap::ArgMatches, input: &str) -> Result<(), Error> {
	log::info!("reading expression...");
	let ast = syntax::parse_str(input)?;
	log::info!("expression: {}", ast);

	log::info!("building automaton...");
	let dfa = Builder::new(config(matches)).build(&ast)?;

	match matches.subcommand() {
		("dot", Some(m)) => {
			let mut output = Output::from_option(m.value_of("output"))?;
			dfa.dot_write(&mut output.lock())?;
			Ok(())
		}
		("array", Some(m)) => {
			let array = match m.value_of("encoding") {
				Some("ranges") => dfa.to_range_array(),
				Some("codepoints") => dfa.to_packed_array(Encoding::Codepoints),
				_ => dfa.to_array(),
			};

			let mut output = Output::from_option(m.value_of("output"))?;
			writeln!(output.lock(), "{}", array.iter().format(", "))?;
			Ok(())
		}
		("match", Some(m)) => {
			let mut output = Output::std()?;
			let mut out = output.lock();
			for text in m.values_of("INPUT").into_iter().flatten() {
				if m.is_present("longest") {
					match dfa.longest_match(text) {
						Some((symbol, len)) => writeln!(out, "{:?}: {} ({:?})", text, symbol, &text[..len])?,
						None => writeln!(out, "{:?}: no match", text)?,
					}
				} else {
					match_whole(&dfa, text, &mut out)?
				}
			}

			Ok(())
		}
		(name, _) => Err(Error::UnknownCommand(name.to_string())),
	}
}

fn match_whole<W: Write>(dfa: &Dfa, text: &str, out: &mut W) -> io::Result<()> {
	match dfa.run(text) {
		Some(symbol) => {
			write!(out, "{:?}: {}", text, symbol)?;
			if let Some(events) = dfa.captures(text) {
				if !events.is_empty() {
					write!(
						out,
						" [{}]",
						events.iter().map(|(offset, event)| format!("{}@{}", event, offset)).format(", ")
					)?
				}
			}

			writeln!(out)
		}
		None => writeln!(out, "{:?}: no match", text),
	}
}

enum Error {
	UnknownCommand(String),
	IO(io::Error),
	Syntax(Loc<syntax::Error>),
	Build(posdfa::Error),
}

impl Error {
	fn format(&self, filename: &str, input: &str) {
		match self {
			Self::UnknownCommand(name) => {
				eprintln!("unknown command `{}`", name)
			}
			Self::IO(e) => {
				let block = out::Block::new(out::Type::Error, e);
				render(&block, input)
			}
			Self::Syntax(e) => {
				let mut block = out::Block::new(out::Type::Error, e.as_ref());
				block.set_source(filename);
				block.highlight(e.span(), None);
				render(&block, input)
			}
			Self::Build(e) => {
				let mut block = out::Block::new(out::Type::Error, e.title());
				block.set_source(filename);
				block.add_note(out::NoteType::Note, e);
				if let posdfa::Error::LexerRequiresAlternation = e {
					block.add_note(out::NoteType::Help, "use `(or ...)` or list several expressions")
				}
				render(&block, input)
			}
		}
	}
}

fn render(block: &out::Block, input: &str) {
	let metrics = source_span::DEFAULT_METRICS;
	let mut span = Span::default();
	for c in input.chars() {
		span.push(c, &metrics)
	}

	match block.render(input.chars().map(Ok::<char, Infallible>), span, &metrics) {
		Ok(formatted) => eprint!("{}", formatted),
		Err(e) => match e {},
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		Self::IO(e)
	}
}

impl From<Loc<syntax::Error>> for Error {
	fn from(e: Loc<syntax::Error>) -> Self {
		Self::Syntax(e)
	}
}

impl From<posdfa::Error> for Error {
	fn from(e: posdfa::Error) -> Self {
		Self::Build(e)
	}
}

pub enum Output {
	Std(std::io::Stdout),
	File(std::fs::File),
}

impl Output {
	fn std() -> io::Result<Self> {
		Ok(Self::Std(std::io::stdout()))
	}

	fn file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
		if let Some(parent) = path.as_ref().parent() {
			if !parent.as_os_str().is_empty() {
				std::fs::create_dir_all(parent)?
			}
		}

		Ok(Self::File(File::create(path)?))
	}

	fn from_option(path: Option<&str>) -> io::Result<Self> {
		match path {
			Some(path) => Self::file(path),
			None => Self::std(),
		}
	}

	fn lock(&mut self) -> LockedOutput {
		match self {
			Output::Std(stdout) => LockedOutput::Std(stdout.lock()),
			Output::File(ref mut file) => LockedOutput::File(file),
		}
	}
}

pub enum LockedOutput<'a> {
	Std(std::io::StdoutLock<'a>),
	File(&'a mut std::fs::File),
}

impl<'a> io::Write for LockedOutput<'a> {
	fn write(&mut self, data: &[u8]) -> io::Result<usize> {
		match self {
			Self::Std(o) => o.write(data),
			Self::File(o) => o.write(data),
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self {
			Self::Std(o) => o.flush(),
			Self::File(o) => o.flush(),
		}
	}
}

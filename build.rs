use proc_macro2::TokenStream;
use quote::quote;
use std::{
	fs::{self, File},
	io::{self, BufReader, Read, Write},
	path::{Path, PathBuf},
};

#[derive(Debug)]
pub enum Error {
	IO(io::Error),
	Toml(toml::de::Error),
	Data(DataError),
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		Self::IO(e)
	}
}

impl From<toml::de::Error> for Error {
	fn from(e: toml::de::Error) -> Self {
		Self::Toml(e)
	}
}

impl From<DataError> for Error {
	fn from(e: DataError) -> Self {
		Self::Data(e)
	}
}

#[derive(Debug)]
pub enum DataError {
	DocumentNotATable,
	ExpressionNotString,
	FlagNotBool(String),
	ChallengeNotArray,
	ChallengeNotTable,
	ChallengeNoName,
	NameNotString,
	ChallengeNoInput,
	InputNotString,
	ChallengeNoResult,
	AcceptNotInteger,
	LengthNotInteger,
	RejectNotBool,
}

fn main() -> Result<(), Error> {
	println!("cargo:rerun-if-changed=tests");

	foreach_toml_file("tests", |path| {
		let stem = path.file_stem().unwrap().to_string_lossy();
		let mut output = path.parent().unwrap().to_path_buf();
		output.push(&*stem);
		output.set_extension("rs");

		if should_generate(&output, &path)? {
			let contents = read_file(&path)?;
			let toml: toml::Value = contents.parse()?;
			let test = Test::from_toml(&stem, toml)?;
			let code = test.generate("tests");
			write_file(output, format!("{}", code))?
		}

		Ok(())
	})
}

fn should_generate(output: &Path, source: &Path) -> io::Result<bool> {
	if output.exists() {
		let source_metadata = fs::metadata(source)?;
		let output_metadata = fs::metadata(output)?;
		let source_modified = source_metadata.modified()?;
		let output_modified = output_metadata.modified()?;
		Ok(source_modified > output_modified)
	} else {
		Ok(true)
	}
}

fn foreach_toml_file<P: AsRef<Path>, F>(dir: P, f: F) -> Result<(), Error>
where
	F: Fn(PathBuf) -> Result<(), Error>,
{
	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();
		if path.is_file() {
			if let Some(ext) = path.extension() {
				if ext == "toml" {
					f(path)?
				}
			}
		}
	}

	Ok(())
}

fn read_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
	let file = fs::File::open(path)?;
	let mut buf_reader = BufReader::new(file);
	let mut contents = String::new();
	buf_reader.read_to_string(&mut contents)?;
	Ok(contents)
}

fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
	let mut file = File::create(path)?;
	file.write_all(contents.as_ref())
}

fn get_flag(table: &toml::value::Table, name: &str, default: bool) -> Result<bool, DataError> {
	match table.get(name) {
		Some(value) => value.as_bool().ok_or_else(|| DataError::FlagNotBool(name.to_string())),
		None => Ok(default),
	}
}

/// Test description.
pub struct Test {
	/// Expression file basename.
	expression: String,

	/// Gives each top-level alternative its own accept symbol.
	lexer: bool,

	/// Honor non-greedy repetitions.
	lazy: bool,

	/// Unroll bounded repetitions.
	expand_repeats: bool,

	/// Challenges.
	challenges: Vec<Challenge>,
}

impl Test {
	fn from_toml(stem: &str, toml: toml::Value) -> Result<Self, DataError> {
		let table = toml.as_table().ok_or(DataError::DocumentNotATable)?;
		let expression = table
			.get("expression")
			.map(|n| n.as_str().ok_or(DataError::ExpressionNotString))
			.transpose()?
			.unwrap_or(stem);

		let lexer = get_flag(table, "lexer", false)?;
		let lazy = get_flag(table, "lazy", true)?;
		let expand_repeats = get_flag(table, "expand", true)?;

		let mut challenges = Vec::new();
		if let Some(value) = table.get("challenge") {
			let values = value.as_array().ok_or(DataError::ChallengeNotArray)?;
			for challenge in values {
				challenges.push(Challenge::from_toml(challenge)?)
			}
		}

		Ok(Self {
			expression: expression.to_string(),
			lexer,
			lazy,
			expand_repeats,
			challenges,
		})
	}

	fn generate<P: AsRef<Path>>(&self, root: P) -> TokenStream {
		let mut expression_path = root.as_ref().to_path_buf();
		expression_path.push(&self.expression);
		expression_path.set_extension("re");
		let expression_path_string = expression_path.to_string_lossy();

		let lexer = self.lexer;
		let lazy = self.lazy;
		let expand_repeats = self.expand_repeats;

		let challenges = self.challenges.iter().map(|c| c.generate());

		quote! {
			use posdfa::{syntax, Builder, Config, Dfa};

			lazy_static::lazy_static! {
				static ref DFA: Dfa = {
					let input = match std::fs::read_to_string(#expression_path_string) {
						Ok(input) => input,
						Err(e) => panic!("unable to read the expression: {}", e)
					};

					let ast = match syntax::parse_str(&input) {
						Ok(ast) => ast,
						Err(e) => panic!("syntax error: {}", e.as_ref())
					};

					let config = Config {
						lexer: #lexer,
						lazy: #lazy,
						expand_repeats: #expand_repeats,
						..Config::default()
					};

					match Builder::new(config).build(&ast) {
						Ok(dfa) => dfa,
						Err(e) => panic!("build error: {}", e)
					}
				};
			}

			#(#challenges)*
		}
	}
}

/// Challenge result.
pub enum ChallengeResult {
	/// The whole input is accepted with the given symbol.
	Accept(u32),

	/// The longest accepted prefix has the given symbol and byte length.
	Longest(u32, usize),

	/// The input is rejected.
	Reject,
}

/// Test challenge.
pub struct Challenge {
	/// Challenge name.
	name: String,

	/// Input phrase.
	input: String,

	/// Expected outcome.
	result: ChallengeResult,
}

impl Challenge {
	fn from_toml(toml: &toml::Value) -> Result<Self, DataError> {
		let table = toml.as_table().ok_or(DataError::ChallengeNotTable)?;
		let name = table
			.get("name")
			.ok_or(DataError::ChallengeNoName)?
			.as_str()
			.ok_or(DataError::NameNotString)?;
		let input = table
			.get("input")
			.ok_or(DataError::ChallengeNoInput)?
			.as_str()
			.ok_or(DataError::InputNotString)?;

		let result = match (table.get("accept"), table.get("longest"), table.get("reject")) {
			(Some(symbol), None, None) => {
				ChallengeResult::Accept(symbol.as_integer().ok_or(DataError::AcceptNotInteger)? as u32)
			}
			(None, Some(symbol), None) => {
				let symbol = symbol.as_integer().ok_or(DataError::AcceptNotInteger)? as u32;
				let len = table
					.get("length")
					.and_then(toml::Value::as_integer)
					.ok_or(DataError::LengthNotInteger)? as usize;
				ChallengeResult::Longest(symbol, len)
			}
			(None, None, Some(reject)) => {
				if reject.as_bool().ok_or(DataError::RejectNotBool)? {
					ChallengeResult::Reject
				} else {
					return Err(DataError::ChallengeNoResult)
				}
			}
			_ => return Err(DataError::ChallengeNoResult),
		};

		Ok(Self {
			name: name.to_string(),
			input: input.to_string(),
			result,
		})
	}

	fn generate(&self) -> TokenStream {
		let id = quote::format_ident!("{}", self.name);
		let input = &self.input;

		match &self.result {
			ChallengeResult::Accept(symbol) => {
				quote! {
					#[test]
					fn #id() {
						assert_eq!(DFA.run(#input), Some(#symbol))
					}
				}
			}
			ChallengeResult::Longest(symbol, len) => {
				quote! {
					#[test]
					fn #id() {
						assert_eq!(DFA.longest_match(#input), Some((#symbol, #len)))
					}
				}
			}
			ChallengeResult::Reject => {
				quote! {
					#[test]
					fn #id() {
						assert_eq!(DFA.run(#input), None)
					}
				}
			}
		}
	}
}

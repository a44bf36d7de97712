use posdfa::{syntax, Builder, Config, Dfa};

lazy_static::lazy_static! {
	static ref DFA: Dfa = {
		let input = match std::fs::read_to_string("tests/anchors.re") {
			Ok(input) => input,
			Err(e) => panic!("unable to read the expression: {}", e)
		};

		let ast = match syntax::parse_str(&input) {
			Ok(ast) => ast,
			Err(e) => panic!("syntax error: {}", e.as_ref())
		};

		let config = Config {
			lexer: false,
			lazy: true,
			expand_repeats: true,
			..Config::default()
		};

		match Builder::new(config).build(&ast) {
			Ok(dfa) => dfa,
			Err(e) => panic!("build error: {}", e)
		}
	};
}

#[test]
fn word() {
	assert_eq!(DFA.run("abc"), Some(0u32))
}

#[test]
fn empty() {
	assert_eq!(DFA.run(""), None)
}

#[test]
fn trailing_digit() {
	assert_eq!(DFA.run("abc1"), None)
}

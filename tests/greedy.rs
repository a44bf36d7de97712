use posdfa::{syntax, Builder, Config, Dfa};

lazy_static::lazy_static! {
	static ref DFA: Dfa = {
		let input = match std::fs::read_to_string("tests/lazy.re") {
			Ok(input) => input,
			Err(e) => panic!("unable to read the expression: {}", e)
		};

		let ast = match syntax::parse_str(&input) {
			Ok(ast) => ast,
			Err(e) => panic!("syntax error: {}", e.as_ref())
		};

		let config = Config {
			lexer: false,
			lazy: false,
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
fn shortest() {
	assert_eq!(DFA.run("bb"), Some(0u32))
}

#[test]
fn single_match() {
	assert_eq!(DFA.run("aaabababb"), Some(0u32))
}

#[test]
fn continues_after_match() {
	assert_eq!(DFA.run("abbabb"), Some(0u32))
}

#[test]
fn overlap() {
	assert_eq!(DFA.run("bbb"), Some(0u32))
}

#[test]
fn longest() {
	assert_eq!(DFA.longest_match("abbabba"), Some((0u32, 6usize)))
}

use posdfa::{syntax, Builder, Config, Dfa};

lazy_static::lazy_static! {
	static ref DFA: Dfa = {
		let input = match std::fs::read_to_string("tests/lazy_bounded.re") {
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
fn once() {
	assert_eq!(DFA.run("ab"), None)
}

#[test]
fn twice() {
	assert_eq!(DFA.run("aab"), Some(0u32))
}

#[test]
fn three_times() {
	assert_eq!(DFA.run("aaab"), Some(0u32))
}

#[test]
fn four_times() {
	assert_eq!(DFA.run("aaaab"), None)
}

#[test]
fn six_times() {
	assert_eq!(DFA.run("aaaaaab"), None)
}

#[test]
fn no_end() {
	assert_eq!(DFA.run("aa"), None)
}

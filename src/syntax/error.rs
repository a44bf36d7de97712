use std::fmt;
use source_span::Loc;
use super::lexer;

pub enum Error {
    Lexer(lexer::Error),
    UnexpectedToken(lexer::Token),
    UnknownForm(String),
    Arity(String, usize),
    InvalidBound(String),
    UnknownClass(String),
    NotARepetition,
    Empty
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Error::*;
        match self {
            Lexer(e) => write!(f, "{}", e),
            UnexpectedToken(t) => write!(f, "unexpected `{}`", t),
            UnknownForm(name) => write!(f, "unknown form `{}`", name),
            Arity(name, 1) => write!(f, "`{}` expects 1 argument", name),
            Arity(name, n) => write!(f, "`{}` expects {} arguments", name, n),
            InvalidBound(b) => write!(f, "invalid repetition bound `{}`", b),
            UnknownClass(name) => write!(f, "unknown character class `{}`", name),
            NotARepetition => write!(f, "only repetitions can be lazy"),
            Empty => write!(f, "no expression")
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

pub type Result<T> = std::result::Result<T, Loc<Error>>;

/// Lifts a located lexer error.
pub fn lexer_error(e: Loc<lexer::Error>) -> Loc<Error> {
    let span = e.span();
    Loc::new(Error::Lexer(e.into_inner()), span)
}

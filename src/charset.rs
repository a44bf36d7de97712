use std::fmt;
use std::cmp::{min, max};

/// Greatest valid Unicode codepoint.
pub const MAX_CODEPOINT: u32 = 0x10ffff;

/// Start of line anchor (`^`).
///
/// Anchors live outside of the codepoint space and are never merged with
/// other ranges.
pub const LINE_START: u32 = 0x110000;

/// End of input anchor (`$`).
pub const TEXT_END: u32 = 0x110001;

/// Closed interval of codepoints (or a single anchor).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Range {
    first: u32,
    last: u32
}

impl Range {
    pub fn new(first: u32, last: u32) -> Range {
        debug_assert!(first <= last);
        Range {
            first,
            last
        }
    }

    pub fn single(c: u32) -> Range {
        Range {
            first: c,
            last: c
        }
    }

    pub fn line_start() -> Range {
        Range::single(LINE_START)
    }

    pub fn text_end() -> Range {
        Range::single(TEXT_END)
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    /// Number of codepoints in the range.
    pub fn len(&self) -> u32 {
        self.last - self.first + 1
    }

    pub fn is_anchor(&self) -> bool {
        self.first > MAX_CODEPOINT
    }

    pub fn contains(&self, c: u32) -> bool {
        self.first <= c && c <= self.last
    }

    pub fn intersects(&self, other: &Range) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// Checks if the two ranges can be merged into one.
    fn touches(&self, other: &Range) -> bool {
        if self.is_anchor() || other.is_anchor() {
            self == other
        } else {
            self.first <= other.last.saturating_add(1) && other.first <= self.last.saturating_add(1)
        }
    }

    fn union(&self, other: &Range) -> Range {
        Range {
            first: min(self.first, other.first),
            last: max(self.last, other.last)
        }
    }

    pub fn codepoints(&self) -> std::ops::RangeInclusive<u32> {
        self.first..=self.last
    }
}

pub struct DisplayChar(pub char);

impl fmt::Display for DisplayChar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let c = self.0;
        match c {
            '\\' => write!(f, "\\\\"),
            '\r' => write!(f, "\\r"),
            '\n' => write!(f, "\\n"),
            '\t' => write!(f, "\\t"),
            _ if c.is_control() => {
                let d = c as u32;
                if d <= 0xff {
                    write!(f, "\\x{:02x}", d)
                } else if d <= 0xffff {
                    write!(f, "\\u{:04x}", d)
                } else {
                    write!(f, "\\U{:08x}", d)
                }
            },
            _ => c.fmt(f)
        }
    }
}

/// Displays a codepoint, anchor or unpaired surrogate.
pub struct DisplayCodepoint(pub u32);

impl fmt::Display for DisplayCodepoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            LINE_START => write!(f, "{{^}}"),
            TEXT_END => write!(f, "{{$}}"),
            cp => match std::char::from_u32(cp) {
                Some(c) => DisplayChar(c).fmt(f),
                None => write!(f, "\\u{:04x}", cp)
            }
        }
    }
}

pub struct DisplayString<'a>(pub &'a str);

impl<'a> fmt::Display for DisplayString<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for c in self.0.chars() {
            DisplayChar(c).fmt(f)?;
        }

        Ok(())
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.first == self.last {
            DisplayCodepoint(self.first).fmt(f)
        } else if self.first + 1 == self.last {
            write!(f, "{}{}", DisplayCodepoint(self.first), DisplayCodepoint(self.last))
        } else {
            write!(f, "{}-{}", DisplayCodepoint(self.first), DisplayCodepoint(self.last))
        }
    }
}

/// Sorts the given ranges and coalesces the overlapping or adjacent ones.
pub fn merge_sorted(mut ranges: Vec<Range>) -> Vec<Range> {
    ranges.sort();
    let mut result: Vec<Range> = Vec::with_capacity(ranges.len());

    for range in ranges {
        match result.last_mut() {
            Some(last) if last.touches(&range) => *last = last.union(&range),
            _ => result.push(range)
        }
    }

    result
}

/// Complement of the given ranges over `[0, MAX_CODEPOINT]`.
///
/// Anchors are ignored.
pub fn invert_ranges<'a, I: IntoIterator<Item = &'a Range>>(ranges: I) -> Vec<Range> {
    let ranges = merge_sorted(ranges.into_iter().cloned().filter(|r| !r.is_anchor()).collect());
    let mut result = Vec::new();
    let mut next = 0;

    for range in &ranges {
        if range.first > next {
            result.push(Range::new(next, range.first - 1))
        }

        if range.last >= MAX_CODEPOINT {
            return result
        }

        next = max(next, range.last + 1);
    }

    result.push(Range::new(next, MAX_CODEPOINT));
    result
}

/// Known character classes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Class {
    Digit,
    Space,
    Word,
    Alpha,
    Alnum,
    Upper,
    Lower,
    XDigit,
    Punct,
    Cntrl,
    Blank,
    Print,
    Graph,
    Ascii
}

impl Class {
    /// Finds a class by name.
    ///
    /// The `^name` spelling denotes the negated class, which is signaled by the
    /// returned boolean.
    pub fn from_name(name: &str) -> Option<(Class, bool)> {
        let (name, negated) = match name.strip_prefix('^') {
            Some(name) => (name, true),
            None => (name, false)
        };

        let class = match name {
            "digit" => Class::Digit,
            "space" => Class::Space,
            "word" => Class::Word,
            "alpha" => Class::Alpha,
            "alnum" => Class::Alnum,
            "upper" => Class::Upper,
            "lower" => Class::Lower,
            "xdigit" => Class::XDigit,
            "punct" => Class::Punct,
            "cntrl" => Class::Cntrl,
            "blank" => Class::Blank,
            "print" => Class::Print,
            "graph" => Class::Graph,
            "ascii" => Class::Ascii,
            _ => return None
        };

        Some((class, negated))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Class::Digit => "digit",
            Class::Space => "space",
            Class::Word => "word",
            Class::Alpha => "alpha",
            Class::Alnum => "alnum",
            Class::Upper => "upper",
            Class::Lower => "lower",
            Class::XDigit => "xdigit",
            Class::Punct => "punct",
            Class::Cntrl => "cntrl",
            Class::Blank => "blank",
            Class::Print => "print",
            Class::Graph => "graph",
            Class::Ascii => "ascii"
        }
    }

    fn bounds(&self) -> &'static [(u32, u32)] {
        match self {
            Class::Digit => &[(0x30, 0x39)],
            Class::Space => &[(0x09, 0x0d), (0x20, 0x20)],
            Class::Word => &[(0x30, 0x39), (0x41, 0x5a), (0x5f, 0x5f), (0x61, 0x7a)],
            Class::Alpha => &[(0x41, 0x5a), (0x61, 0x7a)],
            Class::Alnum => &[(0x30, 0x39), (0x41, 0x5a), (0x61, 0x7a)],
            Class::Upper => &[(0x41, 0x5a)],
            Class::Lower => &[(0x61, 0x7a)],
            Class::XDigit => &[(0x30, 0x39), (0x41, 0x46), (0x61, 0x66)],
            Class::Punct => &[(0x21, 0x2f), (0x3a, 0x40), (0x5b, 0x60), (0x7b, 0x7e)],
            Class::Cntrl => &[(0x00, 0x1f), (0x7f, 0x7f)],
            Class::Blank => &[(0x09, 0x09), (0x20, 0x20)],
            Class::Print => &[(0x20, 0x7e)],
            Class::Graph => &[(0x21, 0x7e)],
            Class::Ascii => &[(0x00, 0x7f)]
        }
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range> {
        self.bounds().iter().map(|(first, last)| Range::new(*first, *last))
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[:{}:]", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(first: char, last: char) -> Range {
        Range::new(first as u32, last as u32)
    }

    #[test]
    fn merge_adjacent_ranges() {
        let ranges = merge_sorted(vec![r('d', 'f'), r('a', 'b'), r('c', 'c'), r('x', 'z')]);
        assert_eq!(ranges, vec![r('a', 'f'), r('x', 'z')]);
        assert_eq!(merge_sorted(vec![r('a', 'a'), r('e', 'e'), r('c', 'c'), r('b', 'd')]), vec![r('a', 'e')]);
    }

    #[test]
    fn anchors_are_never_merged() {
        let ranges = merge_sorted(vec![Range::text_end(), Range::single(MAX_CODEPOINT), Range::line_start()]);
        assert_eq!(ranges, vec![Range::single(MAX_CODEPOINT), Range::line_start(), Range::text_end()]);
    }

    #[test]
    fn invert() {
        assert_eq!(invert_ranges(Vec::<Range>::new().iter()), vec![Range::new(0, MAX_CODEPOINT)]);
        assert_eq!(
            invert_ranges(&[r('b', 'c'), r('a', 'a')]),
            vec![Range::new(0, 'a' as u32 - 1), Range::new('d' as u32, MAX_CODEPOINT)]
        );
        assert_eq!(invert_ranges(&[Range::new(0, 10), Range::new(20, MAX_CODEPOINT)]), vec![Range::new(11, 19)]);
        assert!(invert_ranges(&[Range::new(0, MAX_CODEPOINT)]).is_empty());
    }

    #[test]
    fn negated_class() {
        let digits: Vec<Range> = Class::Digit.ranges().collect();
        let negated = invert_ranges(&digits);
        assert!(!negated.iter().any(|r| r.contains('5' as u32)));
        assert!(negated.iter().any(|r| r.contains('a' as u32)));
        assert!(negated.iter().any(|r| r.contains(MAX_CODEPOINT)));
        assert_eq!(invert_ranges(&negated), digits);
    }

    #[test]
    fn class_names() {
        assert_eq!(Class::from_name("word"), Some((Class::Word, false)));
        assert_eq!(Class::from_name("^space"), Some((Class::Space, true)));
        assert_eq!(Class::from_name("nope"), None);
    }

    #[test]
    fn display() {
        assert_eq!(r('a', 'z').to_string(), "a-z");
        assert_eq!(Range::single('\n' as u32).to_string(), "\\n");
        assert_eq!(Range::line_start().to_string(), "{^}");
    }
}

//! Reading Büchi automata from text.
//!
//! # Format
//!
//! ```text
//! anything before the header is ignored
//! BUECHI
//! # comment lines start with '#'
//! <state count>
//! <alphabet size>
//! <transition count>
//! <from> -- <symbol> -> <to>    # one line per transition
//! <initial states>
//! <final states>
//! ```
//!
//! States and symbols are 1-based. A transition line needs at least five
//! whitespace-separated fields; only fields 0, 2 and 4 are read. The initial
//! and final lines are space-separated state lists and may be empty or
//! missing at the end of input.

use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use log::debug;

use crate::automaton::{Automaton, Transition};
use crate::bitset::BitSet;

pub const HEADER: &str = "BUECHI";

/// Error type for I/O operations.
#[derive(Debug)]
pub enum IoError {
    /// File I/O error.
    Io(io::Error),
    /// Malformed input at the given 1-based line.
    Parse { line: usize, message: String },
}

impl From<io::Error> for IoError {
    fn from(e: io::Error) -> Self {
        IoError::Io(e)
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::Io(e) => write!(f, "I/O error: {}", e),
            IoError::Parse { line, message } => write!(f, "Parse error at line {}: {}", line, message),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::Io(e) => Some(e),
            IoError::Parse { .. } => None,
        }
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> IoError {
    IoError::Parse {
        line,
        message: message.into(),
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Section {
    Preamble,
    StateCount,
    AlphabetSize,
    TransitionCount,
    Transitions(usize),
    Initial,
    Finals,
    Done,
}

fn parse_number<T: FromStr>(token: &str, line: usize, what: &str) -> Result<T, IoError> {
    token
        .parse()
        .map_err(|_| parse_error(line, format!("expected {}, found '{}'", what, token)))
}

/// Parse a 1-based index in `1..=bound` and shift it to 0-based.
fn parse_index(token: &str, bound: usize, line: usize, what: &str) -> Result<usize, IoError> {
    let index: usize = parse_number(token, line, what)?;
    if index == 0 || index > bound {
        return Err(parse_error(line, format!("{} {} is outside 1..={}", what, index, bound)));
    }
    Ok(index - 1)
}

fn parse_states(text: &str, state_count: usize, line: usize) -> Result<BitSet, IoError> {
    text.split_whitespace()
        .map(|token| parse_index(token, state_count, line, "state"))
        .collect()
}

struct Reader {
    section: Section,
    state_count: usize,
    alphabet_size: usize,
    transitions: Vec<Transition>,
    initial: BitSet,
    finals: BitSet,
}

impl Reader {
    fn new() -> Self {
        Self {
            section: Section::Preamble,
            state_count: 0,
            alphabet_size: 0,
            transitions: Vec::new(),
            initial: BitSet::empty(),
            finals: BitSet::empty(),
        }
    }

    fn feed(&mut self, text: &str, line: usize) -> Result<(), IoError> {
        let text = text.trim();
        if self.section == Section::Preamble {
            if text == HEADER {
                self.section = Section::StateCount;
            }
            return Ok(());
        }
        if text.starts_with('#') {
            return Ok(());
        }

        match self.section {
            Section::StateCount | Section::AlphabetSize | Section::TransitionCount | Section::Transitions(_)
                if text.is_empty() =>
            {
                return Ok(());
            }
            _ => {}
        }

        self.section = match self.section {
            Section::Preamble | Section::Done => Section::Done,
            Section::StateCount => {
                self.state_count = parse_number(text, line, "state count")?;
                Section::AlphabetSize
            }
            Section::AlphabetSize => {
                self.alphabet_size = parse_number(text, line, "alphabet size")?;
                Section::TransitionCount
            }
            Section::TransitionCount => {
                let count: usize = parse_number(text, line, "transition count")?;
                self.transitions.reserve(count);
                if count == 0 {
                    Section::Initial
                } else {
                    Section::Transitions(count)
                }
            }
            Section::Transitions(remaining) => {
                let fields: Vec<&str> = text.split_whitespace().collect();
                if fields.len() < 5 {
                    return Err(parse_error(
                        line,
                        format!("transition needs 5 fields, found {}", fields.len()),
                    ));
                }
                let from = parse_index(fields[0], self.state_count, line, "state")?;
                let symbol = parse_index(fields[2], self.alphabet_size, line, "symbol")? + 1;
                let to = parse_index(fields[4], self.state_count, line, "state")?;
                self.transitions.push(Transition::new(from, to, symbol));
                if remaining > 1 {
                    Section::Transitions(remaining - 1)
                } else {
                    Section::Initial
                }
            }
            Section::Initial => {
                self.initial = parse_states(text, self.state_count, line)?;
                Section::Finals
            }
            Section::Finals => {
                self.finals = parse_states(text, self.state_count, line)?;
                Section::Done
            }
        };
        Ok(())
    }

    fn finish(self, lines: usize) -> Result<Automaton, IoError> {
        match self.section {
            Section::Preamble => Err(parse_error(lines, format!("missing '{}' header", HEADER))),
            Section::StateCount | Section::AlphabetSize | Section::TransitionCount => {
                Err(parse_error(lines, "unexpected end of input in the header"))
            }
            Section::Transitions(remaining) => Err(parse_error(
                lines,
                format!("unexpected end of input, {} transitions missing", remaining),
            )),
            Section::Initial | Section::Finals | Section::Done => Ok(Automaton::new(
                self.state_count,
                self.initial,
                self.finals,
                self.alphabet_size,
                self.transitions,
            )),
        }
    }
}

/// Read an automaton from `reader`.
pub fn read_automaton(reader: impl BufRead) -> Result<Automaton, IoError> {
    let mut parser = Reader::new();
    let mut count = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        count = i + 1;
        parser.feed(&line, count)?;
        if parser.section == Section::Done {
            break;
        }
    }
    debug!("read {} lines, stopped in {:?}", count, parser.section);
    parser.finish(count)
}

/// Parse an automaton from a string.
pub fn parse_automaton(text: &str) -> Result<Automaton, IoError> {
    read_automaton(text.as_bytes())
}

/// Load an automaton from a file.
pub fn load_automaton<P: AsRef<Path>>(path: P) -> Result<Automaton, IoError> {
    let file = File::open(path)?;
    read_automaton(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn set(xs: &[usize]) -> BitSet {
        xs.iter().copied().collect()
    }

    const SAMPLE: &str = "\
produced by some tool
BUECHI
# states
3
2

3
1 -- 1 -> 2
2 -- 2 -> 3
# a self loop
3 -- 1 -> 3
1
2 3
";

    #[test]
    fn test_parse() {
        let a = parse_automaton(SAMPLE).unwrap();
        assert_eq!(a.state_count(), 3);
        assert_eq!(a.alphabet_size(), 2);
        assert_eq!(a.transitions().len(), 3);
        assert_eq!(a.under(1).get(0), &set(&[1]));
        assert_eq!(a.under(2).get(1), &set(&[2]));
        assert_eq!(a.under(1).get(2), &set(&[2]));
        assert_eq!(a.initial(), &set(&[0]));
        assert_eq!(a.finals(), &set(&[1, 2]));
    }

    #[test]
    fn test_missing_finals_line() {
        let a = parse_automaton("BUECHI\n1\n1\n1\n1 -- 1 -> 1\n1\n").unwrap();
        assert_eq!(a.initial(), &set(&[0]));
        assert!(a.finals().is_empty());
    }

    #[test]
    fn test_empty_initial_line() {
        let a = parse_automaton("BUECHI\n2\n1\n0\n\n1 2\n").unwrap();
        assert!(a.initial().is_empty());
        assert_eq!(a.finals(), &set(&[0, 1]));
        assert!(a.transitions().is_empty());
    }

    #[test]
    fn test_trailing_lines_are_ignored() {
        let a = parse_automaton("BUECHI\n1\n1\n0\n1\n1\ngarbage\n").unwrap();
        assert_eq!(a.finals(), &set(&[0]));
    }

    #[test]
    fn test_missing_header() {
        let err = parse_automaton("3\n2\n").unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 2, .. }), "{}", err);
    }

    #[test]
    fn test_bad_number() {
        let err = parse_automaton("BUECHI\nthree\n").unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 2, .. }), "{}", err);
        assert!(err.to_string().contains("state count"));
    }

    #[test]
    fn test_short_transition() {
        let err = parse_automaton("BUECHI\n2\n1\n1\n1 -- 1\n").unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 5, .. }), "{}", err);
    }

    #[test]
    fn test_state_out_of_range() {
        let err = parse_automaton("BUECHI\n2\n1\n1\n1 -- 1 -> 3\n").unwrap_err();
        assert!(err.to_string().contains("outside 1..=2"), "{}", err);

        let err = parse_automaton("BUECHI\n2\n1\n0\n0\n").unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 5, .. }), "{}", err);
    }

    #[test]
    fn test_symbol_out_of_range() {
        let err = parse_automaton("BUECHI\n2\n1\n1\n1 -- 2 -> 2\n").unwrap_err();
        assert!(err.to_string().contains("symbol 2"), "{}", err);
    }

    #[test]
    fn test_truncated_transitions() {
        let err = parse_automaton("BUECHI\n2\n1\n2\n1 -- 1 -> 2\n").unwrap_err();
        assert!(err.to_string().contains("1 transitions missing"), "{}", err);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_automaton("/nonexistent/automaton.ba").unwrap_err();
        assert!(matches!(err, IoError::Io(_)));
    }
}

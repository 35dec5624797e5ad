//! A conceptually unbounded tape.
//!
//! Cells are addressed by signed positions; the input is written from position 0 and every
//! other cell holds the blank symbol. Storage grows on demand in both directions, so reads,
//! writes and head movements never go out of bounds.

use crate::types::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

/// A doubly-infinite tape of symbols.
///
/// Equality and hashing only consider the non-blank region, so two tapes that differ only in
/// how far they have been materialized compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tape {
    /// Position of `cells[0]`.
    offset: i64,
    cells: VecDeque<Symbol>,
    blank: Symbol,
}

impl Tape {
    /// Creates a tape holding `input` left-aligned at position 0.
    pub fn new(input: &str, blank: Symbol) -> Self {
        Self {
            offset: 0,
            cells: input.chars().collect(),
            blank,
        }
    }

    /// Creates a tape holding only blanks.
    pub fn blank(blank: Symbol) -> Self {
        Self::new("", blank)
    }

    /// Reads the symbol at `position`.
    pub fn read(&self, position: i64) -> Symbol {
        self.index(position)
            .and_then(|i| self.cells.get(i).copied())
            .unwrap_or(self.blank)
    }

    /// Writes `symbol` at `position`, growing the storage if needed.
    pub fn write(&mut self, position: i64, symbol: Symbol) {
        if self.cells.is_empty() {
            self.offset = position;
        }

        while position < self.offset {
            self.cells.push_front(self.blank);
            self.offset -= 1;
        }

        let index = (position - self.offset) as usize;
        if index >= self.cells.len() {
            self.cells.resize(index + 1, self.blank);
        }

        self.cells[index] = symbol;
    }

    /// The non-blank region as (position of its first cell, symbols).
    /// A fully blank tape yields `(0, [])`.
    pub fn span(&self) -> (i64, Vec<Symbol>) {
        let first = self.cells.iter().position(|&c| c != self.blank);
        let last = self.cells.iter().rposition(|&c| c != self.blank);

        match (first, last) {
            (Some(first), Some(last)) => (
                self.offset + first as i64,
                self.cells.range(first..=last).copied().collect(),
            ),
            _ => (0, Vec::new()),
        }
    }

    /// The tape contents with leading and trailing blanks removed.
    pub fn contents(&self) -> String {
        self.span().1.into_iter().collect()
    }

    /// The `2 * radius + 1` cells centred on `head`, as (position, symbol) pairs.
    pub fn window(&self, head: i64, radius: usize) -> Vec<(i64, Symbol)> {
        let radius = radius as i64;
        (head - radius..=head + radius)
            .map(|position| (position, self.read(position)))
            .collect()
    }

    fn index(&self, position: i64) -> Option<usize> {
        usize::try_from(position - self.offset).ok()
    }
}

impl PartialEq for Tape {
    fn eq(&self, other: &Self) -> bool {
        self.blank == other.blank && self.span() == other.span()
    }
}

impl Eq for Tape {}

impl Hash for Tape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.blank.hash(state);
        self.span().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tape_is_left_aligned() {
        let tape = Tape::new("abc", '_');
        assert_eq!(tape.read(0), 'a');
        assert_eq!(tape.read(2), 'c');
        assert_eq!(tape.read(3), '_');
        assert_eq!(tape.read(-1), '_');
    }

    #[test]
    fn test_write_grows_both_directions() {
        let mut tape = Tape::new("1", '_');
        tape.write(-3, 'x');
        tape.write(4, 'y');

        assert_eq!(tape.read(-3), 'x');
        assert_eq!(tape.read(-2), '_');
        assert_eq!(tape.read(0), '1');
        assert_eq!(tape.read(4), 'y');
        assert_eq!(tape.contents(), "x__1___y");
        assert_eq!(tape.span().0, -3);
    }

    #[test]
    fn test_write_on_empty_tape_far_away() {
        let mut tape = Tape::blank('_');
        tape.write(-1000, 'z');
        assert_eq!(tape.read(-1000), 'z');
        assert_eq!(tape.contents(), "z");
    }

    #[test]
    fn test_contents_trims_blanks() {
        let mut tape = Tape::new("_1_", '_');
        tape.write(5, '_');
        assert_eq!(tape.contents(), "1");
        assert_eq!(Tape::blank('_').contents(), "");
    }

    #[test]
    fn test_equality_ignores_materialized_blanks() {
        let mut grown = Tape::new("11", '_');
        grown.write(10, '_');
        grown.write(-10, '_');

        assert_eq!(grown, Tape::new("11", '_'));
        assert_ne!(Tape::new("11", '_'), Tape::new("1", '_'));
        assert_ne!(Tape::new("_1", '_'), Tape::new("1", '_'));
    }

    #[test]
    fn test_window_centred_on_head() {
        let tape = Tape::new("abc", '_');
        let window = tape.window(0, 2);
        assert_eq!(
            window,
            vec![(-2, '_'), (-1, '_'), (0, 'a'), (1, 'b'), (2, 'c')]
        );
    }
}

//! Control alphabet and input sequences.
//!
//! An [`InputSequence`] is the unit of test input: a fixed-length list of
//! control [`Symbol`]s pressed one per step. Sequences are immutable values;
//! every mutation builds a new sequence.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One atomic control input, stored as a dense index into a [`ControlAlphabet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(u8);

impl Symbol {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Position of this symbol in its alphabet.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Buttons on the TinyBoy control pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    /// All buttons, in symbol order.
    pub const ALL: [Button; 4] = [Button::Up, Button::Down, Button::Left, Button::Right];

    pub const fn symbol(self) -> Symbol {
        Symbol(self as u8)
    }

    pub fn from_symbol(symbol: Symbol) -> Option<Button> {
        Self::ALL.get(symbol.index()).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
        }
    }
}

/// The finite set of symbols available at every step of a sequence.
///
/// Fixed for the whole session. Symbols are `0..len()`; each carries a
/// display name used only for logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAlphabet {
    names: Vec<String>,
}

impl ControlAlphabet {
    /// Largest alphabet a [`Symbol`] can index.
    pub const MAX_SYMBOLS: usize = u8::MAX as usize + 1;

    /// Build an alphabet from symbol names. Validation (non-empty, at most
    /// [`Self::MAX_SYMBOLS`]) happens in
    /// [`GeneratorConfig::validate`](crate::config::GeneratorConfig::validate).
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// An alphabet of `size` anonymous symbols named `S0`, `S1`, ...
    pub fn with_size(size: usize) -> Self {
        Self::new((0..size).map(|i| format!("S{}", i)))
    }

    /// The four-button TinyBoy control pad.
    pub fn control_pad() -> Self {
        Self::new(Button::ALL.iter().map(|b| b.name()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over every symbol in index order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..self.names.len().min(Self::MAX_SYMBOLS)).map(|i| Symbol(i as u8))
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        symbol.index() < self.names.len()
    }

    pub fn name(&self, symbol: Symbol) -> Option<&str> {
        self.names.get(symbol.index()).map(String::as_str)
    }

    /// Look a symbol up by name (case-insensitive).
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .filter(|&i| i < Self::MAX_SYMBOLS)
            .map(|i| Symbol(i as u8))
    }

    /// Draw a uniformly random symbol. The alphabet must be non-empty.
    pub fn random_symbol(&self, rng: &mut impl Rng) -> Symbol {
        Symbol(rng.gen_range(0..self.names.len()) as u8)
    }

    /// Draw a random symbol different from `current`.
    ///
    /// With a single-symbol alphabet there is no alternative and `current`
    /// is returned.
    pub fn random_other(&self, current: Symbol, rng: &mut impl Rng) -> Symbol {
        let size = self.names.len();
        if size < 2 {
            return current;
        }
        // Draw from size - 1 values and skip over `current`.
        let pick = rng.gen_range(0..size - 1);
        if pick >= current.index() {
            Symbol((pick + 1) as u8)
        } else {
            Symbol(pick as u8)
        }
    }
}

impl Default for ControlAlphabet {
    fn default() -> Self {
        Self::control_pad()
    }
}

/// An immutable, fixed-length sequence of control symbols.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputSequence {
    symbols: Box<[Symbol]>,
}

impl InputSequence {
    pub fn new(symbols: impl Into<Box<[Symbol]>>) -> Self {
        Self {
            symbols: symbols.into(),
        }
    }

    /// A sequence of `length` uniformly random symbols.
    pub fn random(alphabet: &ControlAlphabet, length: usize, rng: &mut impl Rng) -> Self {
        (0..length).map(|_| alphabet.random_symbol(rng)).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().copied()
    }

    /// True if the sequence has exactly `length` symbols, all in `alphabet`.
    pub fn is_valid_for(&self, alphabet: &ControlAlphabet, length: usize) -> bool {
        self.len() == length && self.iter().all(|s| alphabet.contains(s))
    }

    /// Render with the alphabet's symbol names, e.g. `[UP, UP, LEFT]`.
    pub fn display<'a>(&'a self, alphabet: &'a ControlAlphabet) -> SequenceDisplay<'a> {
        SequenceDisplay {
            sequence: self,
            alphabet,
        }
    }
}

impl From<Vec<Symbol>> for InputSequence {
    fn from(symbols: Vec<Symbol>) -> Self {
        Self::new(symbols)
    }
}

impl FromIterator<Symbol> for InputSequence {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect::<Vec<_>>())
    }
}

impl From<&[Button]> for InputSequence {
    fn from(buttons: &[Button]) -> Self {
        buttons.iter().map(|b| b.symbol()).collect()
    }
}

/// Helper returned by [`InputSequence::display`].
pub struct SequenceDisplay<'a> {
    sequence: &'a InputSequence,
    alphabet: &'a ControlAlphabet,
}

impl fmt::Display for SequenceDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, symbol) in self.sequence.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match self.alphabet.name(symbol) {
                Some(name) => f.write_str(name)?,
                None => write!(f, "?{}", symbol.index())?,
            }
        }
        f.write_str("]")
    }
}

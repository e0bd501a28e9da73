//! Words extracted from a single G-code line.

use crate::Axis;
use std::fmt;

/// A `G` or `M` command code. `G00` and `G0` compare equal; decimal
/// variants such as `G38.2` keep their sub-number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code {
    pub letter: char,
    pub number: u16,
    pub sub: Option<u8>,
}

impl Code {
    pub const fn g(number: u16) -> Self {
        Self { letter: 'G', number, sub: None }
    }

    pub const fn g_sub(number: u16, sub: u8) -> Self {
        Self { letter: 'G', number, sub: Some(sub) }
    }

    pub const fn m(number: u16) -> Self {
        Self { letter: 'M', number, sub: None }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub {
            Some(sub) => write!(f, "{}{}.{}", self.letter, self.number, sub),
            None => write!(f, "{}{}", self.letter, self.number),
        }
    }
}

/// Result of tokenizing one line. Every word is optional and independent;
/// when a letter repeats, the first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLine {
    pub codes: Vec<Code>,
    pub axes: [Option<f64>; 3],
    pub f: Option<f64>,
    pub s: Option<f64>,
    pub i: Option<f64>,
    pub j: Option<f64>,
    pub k: Option<f64>,
    pub r: Option<f64>,
    pub p: Option<f64>,
    pub l: Option<f64>,
    pub t: Option<f64>,
}

impl ParsedLine {
    pub fn axis(&self, axis: Axis) -> Option<f64> {
        self.axes[axis.index()]
    }

    pub fn has_axis_words(&self) -> bool {
        self.axes.iter().any(Option::is_some)
    }

    pub fn has_code(&self, code: Code) -> bool {
        self.codes.contains(&code)
    }

    /// Arc center offset word for an axis (I for X, J for Y, K for Z).
    pub fn offset(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.i,
            Axis::Y => self.j,
            Axis::Z => self.k,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ParsedLine::default()
    }
}

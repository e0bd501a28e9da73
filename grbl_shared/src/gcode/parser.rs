//! Line-level G-code tokenizer.

use super::types::{Code, ParsedLine};
use crate::error::GrblError;
use regex::Regex;
use std::sync::LazyLock;

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([GM])\s*(\d+)(?:\.(\d+))?").expect("Invalid code regex"));

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([XYZFSIJKRPLT])\s*([-+]?(?:\d+\.?\d*|\.\d+))").expect("Invalid word regex")
});

/// Drops `( ... )` comments and everything after `;`.
pub fn strip_comments(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;
    for c in line.chars() {
        match c {
            ';' if depth == 0 => break,
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Case-normalizes a line and extracts its codes and words.
pub fn parse_line(line: &str) -> Result<ParsedLine, GrblError> {
    let text = strip_comments(line).to_ascii_uppercase();
    let mut parsed = ParsedLine::default();

    for caps in CODE_RE.captures_iter(&text) {
        let letter = if &caps[1] == "G" { 'G' } else { 'M' };
        let number: u16 = caps[2].parse().map_err(|_| GrblError::InvalidStatement)?;
        let sub = match caps.get(3) {
            Some(m) => {
                let digits = m.as_str().trim_end_matches('0');
                if digits.is_empty() {
                    None
                } else {
                    Some(digits.parse::<u8>().map_err(|_| GrblError::InvalidStatement)?)
                }
            }
            None => None,
        };
        parsed.codes.push(Code { letter, number, sub });
    }

    for caps in WORD_RE.captures_iter(&text) {
        let value: f64 = caps[2].parse().map_err(|_| GrblError::InvalidStatement)?;
        let slot = match &caps[1] {
            "X" => &mut parsed.axes[0],
            "Y" => &mut parsed.axes[1],
            "Z" => &mut parsed.axes[2],
            "F" => &mut parsed.f,
            "S" => &mut parsed.s,
            "I" => &mut parsed.i,
            "J" => &mut parsed.j,
            "K" => &mut parsed.k,
            "R" => &mut parsed.r,
            "P" => &mut parsed.p,
            "L" => &mut parsed.l,
            _ => &mut parsed.t,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    Ok(parsed)
}

//! Roman numeral conversion and chapter identifier normalisation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CorpusError, Result};

fn symbol_value(symbol: char) -> Option<u32> {
    match symbol {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

/// Convert an uppercase Roman numeral to an integer.
///
/// Single left-to-right scan with one symbol of lookahead: a smaller symbol
/// before a larger one is taken as a subtractive pair, everything else is
/// added. Malformed but scannable input such as `IIV` is not rejected; use
/// [`is_canonical_roman`] to detect it.
///
/// # Examples
/// ```
/// use constitution_corpus::roman::roman_to_int;
///
/// assert_eq!(roman_to_int("XIV").unwrap(), 14);
/// assert_eq!(roman_to_int("MCMXCIV").unwrap(), 1994);
/// assert!(roman_to_int("X1").is_err());
/// ```
pub fn roman_to_int(numeral: &str) -> Result<u32> {
    let values = numeral
        .chars()
        .map(|c| {
            symbol_value(c).ok_or_else(|| CorpusError::InvalidRomanNumeral(numeral.to_string()))
        })
        .collect::<Result<Vec<u32>>>()?;

    if values.is_empty() {
        return Err(CorpusError::InvalidRomanNumeral(numeral.to_string()));
    }

    let mut total = 0;
    let mut i = 0;
    while i < values.len() {
        match values.get(i + 1) {
            Some(&next) if values[i] < next => {
                total += next - values[i];
                i += 2;
            }
            _ => {
                total += values[i];
                i += 1;
            }
        }
    }

    Ok(total)
}

/// Canonical Roman numeral for `1..=3999`.
///
/// # Examples
/// ```
/// use constitution_corpus::roman::int_to_roman;
///
/// assert_eq!(int_to_roman(1994).as_deref(), Some("MCMXCIV"));
/// assert_eq!(int_to_roman(0), None);
/// ```
pub fn int_to_roman(mut value: u32) -> Option<String> {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    if value == 0 || value > 3999 {
        return None;
    }

    let mut numeral = String::new();
    for (amount, symbols) in TABLE {
        while value >= amount {
            numeral.push_str(symbols);
            value -= amount;
        }
    }
    Some(numeral)
}

/// Whether `numeral` is the canonical spelling of the value it scans to.
pub fn is_canonical_roman(numeral: &str) -> bool {
    roman_to_int(numeral)
        .ok()
        .and_then(int_to_roman)
        .is_some_and(|canonical| canonical == numeral)
}

/// Chapter identifier: an integer with an optional letter for inserted
/// chapters, e.g. `10` or `10A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ChapterId {
    pub number: u32,
    pub suffix: Option<char>,
}

impl ChapterId {
    #[must_use]
    pub fn new(number: u32, suffix: Option<char>) -> Self {
        Self { number, suffix }
    }

    /// Normalise a chapter designator such as `X` or `XA`.
    ///
    /// A trailing uppercase letter that is not a Roman symbol is kept as the
    /// suffix; the rest must be a Roman numeral.
    ///
    /// # Examples
    /// ```
    /// use constitution_corpus::roman::ChapterId;
    ///
    /// assert_eq!(ChapterId::from_numeral("X").unwrap().to_string(), "10");
    /// assert_eq!(ChapterId::from_numeral("XA").unwrap().to_string(), "10A");
    /// ```
    pub fn from_numeral(designator: &str) -> Result<Self> {
        let designator = designator.trim();
        let invalid = || CorpusError::InvalidChapterId(designator.to_string());

        let (numeral, suffix) = match designator.chars().last() {
            Some(last) if last.is_ascii_uppercase() && symbol_value(last).is_none() => {
                (&designator[..designator.len() - 1], Some(last))
            }
            Some(_) => (designator, None),
            None => return Err(invalid()),
        };

        let number = roman_to_int(numeral).map_err(|_| invalid())?;
        Ok(Self { number, suffix })
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)?;
        if let Some(suffix) = self.suffix {
            write!(f, "{suffix}")?;
        }
        Ok(())
    }
}

impl FromStr for ChapterId {
    type Err = CorpusError;

    /// Parse the normalised form (`"10"`, `"10A"`).
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CorpusError::InvalidChapterId(s.to_string());
        let digits_end = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        let number = s[..digits_end].parse::<u32>().map_err(|_| invalid())?;

        let mut rest = s[digits_end..].chars();
        let suffix = match (rest.next(), rest.next()) {
            (None, _) => None,
            (Some(c), None) if c.is_ascii_uppercase() => Some(c),
            _ => return Err(invalid()),
        };

        Ok(Self { number, suffix })
    }
}

impl From<ChapterId> for String {
    fn from(id: ChapterId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ChapterId {
    type Error = CorpusError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

use crate::encoders::algorithms::errors::{CodecError, Result, SymbolFault};
use std::collections::HashMap;
use std::fmt;

/// Symbols of the Base64 alphabet, the default output charset.
pub const BASE64: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Printable ASCII, the default charset for string values.
pub const PRINTABLE: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

const MAX_UNICODE: u32 = 0x10FFFF;
const SURROGATE_START: u32 = 0xD800;
const SURROGATE_END: u32 = 0xDFFF;

/// An ordered set of symbols used either to render packed digits or to
/// restrict the characters of a string value.
///
/// Two shapes are supported: an explicit list of unique characters, where a
/// symbol's value is its index, and a contiguous code-point range `[lo, hi]`,
/// where a symbol's value is its offset from `lo`. Either way the size is at
/// least 2.
#[derive(Clone, PartialEq, Eq)]
pub struct Charset {
    repr: Repr,
}

#[derive(Clone, PartialEq, Eq)]
enum Repr {
    Symbols {
        chars: Vec<char>,
        char_to_index: HashMap<char, u64>,
    },
    Range {
        lo: u32,
        hi: u32,
    },
}

impl Charset {
    /// Creates a charset from an explicit, duplicate-free symbol list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAlphabet` if fewer than two symbols are given or a
    /// symbol repeats.
    pub fn from_symbols(symbols: &str) -> Result<Self> {
        let chars: Vec<char> = symbols.chars().collect();
        if chars.len() < 2 {
            return Err(CodecError::InvalidAlphabet(format!(
                "needs at least 2 symbols, got {}",
                chars.len()
            )));
        }

        let mut char_to_index = HashMap::with_capacity(chars.len());
        for (i, &c) in chars.iter().enumerate() {
            if char_to_index.insert(c, i as u64).is_some() {
                return Err(CodecError::InvalidAlphabet(format!(
                    "duplicate symbol '{}'",
                    c.escape_debug()
                )));
            }
        }

        Ok(Charset {
            repr: Repr::Symbols {
                chars,
                char_to_index,
            },
        })
    }

    /// Creates a charset covering the code points `lo..=hi`.
    ///
    /// Reversed bounds are swapped. The range must hold at least two code
    /// points, stay within U+10FFFF and not cross the surrogate gap.
    pub fn range(lo: u32, hi: u32) -> Result<Self> {
        let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };

        if hi == lo {
            return Err(CodecError::InvalidAlphabet(format!(
                "range U+{:X}..U+{:X} holds fewer than 2 code points",
                lo, hi
            )));
        }
        if hi > MAX_UNICODE {
            return Err(CodecError::InvalidAlphabet(format!(
                "range end U+{:X} exceeds maximum Unicode codepoint U+{:X}",
                hi, MAX_UNICODE
            )));
        }
        if lo <= SURROGATE_END && hi >= SURROGATE_START {
            return Err(CodecError::InvalidAlphabet(format!(
                "range U+{:X}..U+{:X} crosses surrogate gap (U+D800..U+DFFF)",
                lo, hi
            )));
        }

        Ok(Charset {
            repr: Repr::Range { lo, hi },
        })
    }

    /// Creates the range charset `[0, size - 1]`.
    pub fn binary(size: u32) -> Result<Self> {
        if size < 2 {
            return Err(CodecError::InvalidAlphabet(format!(
                "binary range needs size of at least 2, got {}",
                size
            )));
        }
        Self::range(0, size - 1)
    }

    /// Number of distinct symbols.
    pub fn size(&self) -> u64 {
        match &self.repr {
            Repr::Symbols { chars, .. } => chars.len() as u64,
            Repr::Range { lo, hi } => u64::from(hi - lo) + 1,
        }
    }

    /// Returns the `(lo, hi)` code points of a range charset.
    pub fn bounds(&self) -> Option<(u32, u32)> {
        match self.repr {
            Repr::Range { lo, hi } => Some((lo, hi)),
            Repr::Symbols { .. } => None,
        }
    }

    /// Maps a value in `0..size` to its symbol.
    pub fn symbol(&self, value: u64) -> Option<char> {
        match &self.repr {
            Repr::Symbols { chars, .. } => chars.get(usize::try_from(value).ok()?).copied(),
            Repr::Range { lo, hi } => {
                let cp = u64::from(*lo).checked_add(value)?;
                if cp > u64::from(*hi) {
                    return None;
                }
                char::from_u32(cp as u32)
            }
        }
    }

    /// Maps a symbol back to its value, or `None` if it is not part of the set.
    pub fn index_of(&self, c: char) -> Option<u64> {
        self.lookup(c).ok()
    }

    /// Like [`Charset::index_of`] but says why a symbol was refused.
    pub fn lookup(&self, c: char) -> std::result::Result<u64, SymbolFault> {
        match &self.repr {
            Repr::Symbols { char_to_index, .. } => char_to_index
                .get(&c)
                .copied()
                .ok_or(SymbolFault::NotInCharset(c)),
            Repr::Range { lo, hi } => {
                let cp = c as u32;
                if cp < *lo || cp > *hi {
                    return Err(SymbolFault::OutOfRange(cp));
                }
                Ok(u64::from(cp - lo))
            }
        }
    }

    /// Short human-readable preview of the first few symbols.
    pub fn preview(&self, count: usize) -> String {
        (0..self.size().min(count as u64))
            .filter_map(|i| self.symbol(i))
            .map(|c| if c.is_control() { '·' } else { c })
            .collect()
    }
}

impl Default for Charset {
    fn default() -> Self {
        Charset {
            repr: Repr::Symbols {
                chars: BASE64.chars().collect(),
                char_to_index: BASE64
                    .chars()
                    .enumerate()
                    .map(|(i, c)| (c, i as u64))
                    .collect(),
            },
        }
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Symbols { chars, .. } => f
                .debug_tuple("Charset::Symbols")
                .field(&chars.iter().collect::<String>())
                .finish(),
            Repr::Range { lo, hi } => write!(f, "Charset::Range(U+{:04X}..=U+{:04X})", lo, hi),
        }
    }
}

use std::fmt;

/// Why a symbol in packed text could not be turned back into digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolFault {
    /// The character is not part of a symbol-list charset
    NotInCharset(char),
    /// The code point falls outside a range charset
    OutOfRange(u32),
    /// The symbol holds capacity that no digit claimed, or yields a digit
    /// outside the requested radix
    Oversaturated,
}

/// Errors raised while validating, encoding or decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Charset is too small, has duplicates, or describes a malformed range
    InvalidAlphabet(String),
    /// Unknown, missing or ill-typed option field, or a bad template
    InvalidOptions(String),
    /// More items were written than the `limit` option allows
    ItemCountExceeded { count: usize, limit: u64 },
    /// Value of the wrong runtime shape for the target module (strict only)
    TypeMismatch { expected: &'static str, found: String },
    /// Value outside its bounds or off its step grid (strict only)
    RangeOrStepViolation(String),
    /// Character that the string charset cannot represent
    CharsetViolation { ch: char, position: usize },
    /// Required template field absent, or base records do not match the count
    MissingField(String),
    /// Packed text holds a symbol that cannot be decoded
    DecodeSymbol { position: usize, fault: SymbolFault },
    /// Decoding needed more symbols than the text has
    UnexpectedEndOfInput { position: usize },
    /// A decoded payload cannot be materialised as a value
    InvalidValue(String),
    /// Strict finish found symbols or capacity that were never read
    TrailingInput { position: usize },
}

impl CodecError {
    /// Shorthand for a strict-mode type rejection.
    pub fn type_mismatch(expected: &'static str, found: impl fmt::Debug) -> Self {
        CodecError::TypeMismatch {
            expected,
            found: format!("{:?}", found),
        }
    }

    /// True for the two kinds a lenient session is allowed to paper over.
    pub fn is_coercible(&self) -> bool {
        matches!(
            self,
            CodecError::TypeMismatch { .. } | CodecError::RangeOrStepViolation(_)
        )
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InvalidAlphabet(msg) => write!(f, "invalid character set: {}", msg),
            CodecError::InvalidOptions(msg) => write!(f, "invalid options: {}", msg),
            CodecError::ItemCountExceeded { count, limit } => {
                write!(f, "item count {} exceeds limit {}", count, limit)
            }
            CodecError::TypeMismatch { expected, found } => {
                write!(f, "expected {}, got {}", expected, found)
            }
            CodecError::RangeOrStepViolation(msg) => write!(f, "{}", msg),
            CodecError::CharsetViolation { ch, position } => write!(
                f,
                "character '{}' at position {} is not in the string character set",
                ch.escape_debug(),
                position
            ),
            CodecError::MissingField(msg) => write!(f, "missing field: {}", msg),
            CodecError::DecodeSymbol { position, fault } => match fault {
                SymbolFault::NotInCharset(c) => write!(
                    f,
                    "symbol '{}' at position {} not found in character set",
                    c.escape_debug(),
                    position
                ),
                SymbolFault::OutOfRange(cp) => write!(
                    f,
                    "symbol U+{:04X} at position {} does not fit binary range",
                    cp, position
                ),
                SymbolFault::Oversaturated => {
                    write!(f, "oversaturated symbol at position {}", position)
                }
            },
            CodecError::UnexpectedEndOfInput { position } => {
                write!(f, "unexpected end of input at position {}", position)
            }
            CodecError::InvalidValue(msg) => write!(f, "invalid decoded value: {}", msg),
            CodecError::TrailingInput { position } => {
                write!(f, "unread input remains at position {}", position)
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Error when a named charset is not in the registry
#[derive(Debug)]
pub struct CharsetNotFoundError {
    pub name: String,
    pub suggestion: Option<String>,
}

impl CharsetNotFoundError {
    pub fn new(name: impl Into<String>, suggestion: Option<String>) -> Self {
        Self {
            name: name.into(),
            suggestion,
        }
    }
}

impl fmt::Display for CharsetNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: charset '{}' not found", self.name)?;

        if let Some(suggestion) = &self.suggestion {
            writeln!(f)?;
            writeln!(f, "hint: did you mean '{}'?", suggestion)?;
        }

        write!(f, "      run `radixpack charsets` to see all charsets")
    }
}

impl std::error::Error for CharsetNotFoundError {}

/// Calculate Levenshtein distance between two strings
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut prev_row: Vec<usize> = (0..=len2).collect();
    let mut curr_row = vec![0; len2 + 1];

    for (i, c1) in s1.chars().enumerate() {
        curr_row[0] = i + 1;

        for (j, c2) in s2.chars().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };
            curr_row[j + 1] = (curr_row[j] + 1)
                .min(prev_row[j + 1] + 1)
                .min(prev_row[j] + cost);
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[len2]
}

/// Find the closest matching charset name
pub fn find_closest_charset(name: &str, available: &[String]) -> Option<String> {
    let threshold = if name.len() < 5 { 2 } else { 3 };

    available
        .iter()
        .map(|candidate| (levenshtein_distance(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.clone())
}

//! Error types and source span tracking for diagnostics.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
use core::fmt;

/// Location of a token inside one instruction line.
///
/// Instructions are a single line, so only the column is tracked alongside
/// the byte offset and length of the spanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// 1-based column number (byte offset within the line).
    pub col: u32,
    /// 0-based byte offset from start of the input.
    pub offset: usize,
    /// Byte length of the spanned region.
    pub len: usize,
}

impl Span {
    /// Create a span starting at `offset` and covering `len` bytes.
    #[must_use]
    pub fn new(offset: usize, len: usize) -> Self {
        Self {
            col: u32::try_from(offset).map_or(u32::MAX, |c| c.saturating_add(1)),
            offset,
            len,
        }
    }

    /// A dummy span for constructs that have no source text.
    #[must_use]
    pub fn dummy() -> Self {
        Self {
            col: 0,
            offset: 0,
            len: 0,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col {}", self.col)
    }
}

/// Mapping error with a descriptive message.
///
/// None of these ever reach the plain-text boundary of [`Mapper::map`]:
/// tokenizer errors collapse into [`ILLEGAL_INPUT`], registry errors are
/// reported when a dataset is loaded or validated.
///
/// [`Mapper::map`]: crate::Mapper::map
/// [`ILLEGAL_INPUT`]: crate::ILLEGAL_INPUT
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapError {
    /// The input contained no tokens at all.
    EmptyInput,

    /// An operand token does not follow the operand grammar.
    MalformedOperand {
        /// The offending token text.
        token: String,
        /// Why the token was rejected.
        detail: String,
        /// Location of the token.
        span: Span,
    },

    /// The input exceeded the configured byte limit.
    InputTooLarge {
        /// Length of the rejected input.
        len: usize,
        /// The configured limit.
        limit: usize,
    },

    /// A registry dataset could not be parsed.
    Registry {
        /// The parser's message.
        msg: String,
    },

    /// A registry record cannot be interpreted by the binder.
    InvalidSignature {
        /// Mnemonic the record is registered under.
        mnemonic: String,
        /// Position of the record in the mnemonic's candidate list.
        index: usize,
        /// What is wrong with the record.
        detail: String,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::EmptyInput => write!(f, "empty instruction"),
            MapError::MalformedOperand {
                token,
                detail,
                span,
            } => {
                write!(f, "{}: malformed operand '{}': {}", span, token, detail)
            }
            MapError::InputTooLarge { len, limit } => {
                write!(f, "input of {} bytes exceeds limit of {} bytes", len, limit)
            }
            MapError::Registry { msg } => write!(f, "invalid registry: {}", msg),
            MapError::InvalidSignature {
                mnemonic,
                index,
                detail,
            } => {
                write!(f, "{}[{}]: {}", mnemonic, index, detail)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MapError {}

//! Error types for the front end and semantic model
// (c) Bakelite Contributors

use std::fmt;

/// A 1-based (line, column) position in a `.bakelite` source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Line number, starting at 1
    pub line: u32,
    /// Column number, starting at 1
    pub column: u32,
}

impl Span {
    /// Constructs a new span
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors raised while tokenizing or parsing a `.bakelite` source file
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// An unrecognised character was encountered
    #[error("{span}: unexpected character {found:?}")]
    UnexpectedChar {
        /// location of the offending character
        span: Span,
        /// the character itself
        found: char,
    },
    /// A token was expected but something else (or end of file) was found
    #[error("{span}: expected {expected}, found {found}")]
    UnexpectedToken {
        /// location of the offending token
        span: Span,
        /// a description of what was expected
        expected: String,
        /// a description of what was actually found
        found: String,
    },
    /// An integer literal could not be parsed
    #[error("{span}: invalid integer literal {text:?}")]
    InvalidInteger {
        /// location of the literal
        span: Span,
        /// the offending text
        text: String,
    },
    /// The file ended mid-declaration
    #[error("{span}: unexpected end of file, expected {expected}")]
    UnexpectedEof {
        /// location at which end of file was hit
        span: Span,
        /// a description of what was expected
        expected: String,
    },
}

impl ParseError {
    /// The span at which this error occurred
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedChar { span, .. }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::InvalidInteger { span, .. }
            | ParseError::UnexpectedEof { span, .. } => *span,
        }
    }
}

/// Errors raised while resolving and validating the semantic model
#[derive(Debug, thiserror::Error)]
pub enum SemanticError {
    /// Two top-level declarations share a name
    #[error("{span}: '{name}' is declared more than once")]
    DuplicateDeclaration {
        /// location of the second (offending) declaration
        span: Span,
        /// the repeated name
        name: String,
    },
    /// A field or enum underlying type referenced a name that was never declared
    #[error("{span}: unresolved type reference '{name}'")]
    UnresolvedReference {
        /// location of the reference
        span: Span,
        /// the unresolved name
        name: String,
    },
    /// A struct (possibly transitively) contains itself
    #[error("{span}: struct '{name}' is cyclic: {cycle}")]
    CyclicAggregate {
        /// location of the struct declaration
        span: Span,
        /// the struct at the head of the cycle
        name: String,
        /// a human-readable rendering of the cycle, e.g. "A -> B -> A"
        cycle: String,
    },
    /// A declared capacity did not fit the 1-byte length prefix (> 255)
    #[error("{span}: capacity {capacity} exceeds the maximum of 255")]
    CapacityOverflow {
        /// location of the offending declaration
        span: Span,
        /// the declared capacity
        capacity: u32,
    },
    /// An enum value did not fit its underlying primitive type
    #[error("{span}: value {value} does not fit in {underlying}")]
    EnumValueOutOfRange {
        /// location of the offending member
        span: Span,
        /// the out-of-range value
        value: i128,
        /// the underlying primitive type's name
        underlying: String,
    },
    /// Two members of the same enum share a value
    #[error("{span}: enum member value {value} is used more than once in '{enum_name}'")]
    DuplicateEnumValue {
        /// location of the offending member
        span: Span,
        /// the enum's name
        enum_name: String,
        /// the repeated value
        value: i128,
    },
    /// Two messages in a protocol block were assigned the same id
    #[error("{span}: message id {id} is already assigned to '{other}'")]
    DuplicateMessageId {
        /// location of the offending assignment
        span: Span,
        /// the repeated id
        id: u8,
        /// the message that already owns this id
        other: String,
    },
    /// A message id of zero was used (0 is reserved for the COBS delimiter)
    #[error("{span}: message id 0 is reserved for the COBS frame delimiter")]
    ReservedMessageId {
        /// location of the offending assignment
        span: Span,
    },
    /// A protocol assigned an id to something that isn't a declared struct
    #[error("{span}: '{name}' is not a declared struct")]
    MessageNotAStruct {
        /// location of the offending assignment
        span: Span,
        /// the referenced name
        name: String,
    },
    /// A message's maximum wire size exceeds the protocol's `max_length`
    #[error(
        "{span}: message '{name}' has maximum encoded size {size} (+{crc_width} byte CRC), exceeding max_length {max_length}"
    )]
    MessageTooLarge {
        /// location of the offending assignment
        span: Span,
        /// the message's name
        name: String,
        /// the message's maximum payload size
        size: u32,
        /// the protocol's configured CRC width
        crc_width: u32,
        /// the protocol's configured max_length
        max_length: u32,
    },
}

impl SemanticError {
    /// The span at which this error occurred
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            SemanticError::DuplicateDeclaration { span, .. }
            | SemanticError::UnresolvedReference { span, .. }
            | SemanticError::CyclicAggregate { span, .. }
            | SemanticError::CapacityOverflow { span, .. }
            | SemanticError::EnumValueOutOfRange { span, .. }
            | SemanticError::DuplicateEnumValue { span, .. }
            | SemanticError::DuplicateMessageId { span, .. }
            | SemanticError::ReservedMessageId { span }
            | SemanticError::MessageNotAStruct { span, .. }
            | SemanticError::MessageTooLarge { span, .. } => *span,
        }
    }
}

/// Convenience alias for parser results
pub type ParseResult<T> = Result<T, ParseError>;
/// Convenience alias for semantic-analysis results
pub type SemanticResult<T> = Result<T, SemanticError>;

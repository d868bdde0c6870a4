//! Error types for nestscan-classfile
//!
//! Every decode error is fatal for the run; there is no per-unit
//! skip-and-continue policy.

use thiserror::Error;

/// Main error type for class-file decoding and corpus enumeration
#[derive(Debug, Error)]
pub enum ClassfileError {
    /// IO error while enumerating or reading a unit
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unit ended before a required field could be read
    #[error("truncated class file: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    /// First four bytes are not 0xCAFEBABE
    #[error("bad magic number: 0x{found:08X}")]
    BadMagic { found: u32 },

    /// Constant pool entry with a tag this decoder does not know
    #[error("unsupported constant pool tag {tag} at entry {index}")]
    UnsupportedConstantTag { tag: u8, index: u16 },

    /// Constant pool index out of range or of the wrong kind
    #[error("bad constant pool index {index}: {expected} expected")]
    BadConstantIndex { index: u16, expected: &'static str },

    /// Structurally invalid unit (bad attribute layout, bad opcode, ...)
    #[error("malformed class file: {0}")]
    Malformed(String),
}

impl ClassfileError {
    /// Create a malformed-unit error
    pub fn malformed(msg: impl Into<String>) -> Self {
        ClassfileError::Malformed(msg.into())
    }
}

/// Result type alias for class-file operations
pub type Result<T> = std::result::Result<T, ClassfileError>;

//! nestscan-classfile - JVM class unit decoding for nestscan
//!
//! Reusable reader side of the analyzer:
//!
//! - **corpus**: enumeration of `.class` units under a directory tree
//! - **reader**: bounds-checked big-endian byte cursor
//! - **constant_pool**: constant pool parse and typed accessors
//! - **decoder**: two visitation modes over one unit - declarations only,
//!   or instruction-level member references
//! - **events**: the tagged event streams both modes deliver
//!
//! The decoder never interprets visibility or nests; it only reports what
//! the bytes declare and reference. All decode errors are fatal.

pub mod constant_pool;
pub mod corpus;
pub mod decoder;
pub mod errors;
pub mod events;
pub mod reader;

pub use corpus::ClassCorpus;
pub use decoder::ClassUnit;
pub use errors::{ClassfileError, Result};
pub use events::{access, InstructionEvent, MemberHandle, ReferenceKind, StructuralEvent};

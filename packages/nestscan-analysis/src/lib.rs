//! nestscan-analysis - whole-corpus nest-visibility analysis
//!
//! Finds package-restricted class members that are only ever referenced
//! from inside their own nest and could therefore be declared private.
//!
//! Three sequential passes over one registry:
//!
//! 1. **registry**: structural pass, one sealed descriptor per class unit
//! 2. **resolver**: cross-reference pass, attributes every instruction-level
//!    reference (direct or via method handles) to the caller's nest host
//! 3. **report**: read-only scan emitting one advisory finding per member
//!    whose callers all share the member's own nest host
//!
//! The analysis is offline and read-only; inputs are never modified.

pub mod errors;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod resolver;

pub use errors::{AnalysisError, Result};
pub use pipeline::AnalysisPipeline;
pub use registry::{ClassDescriptor, ClassRegistry, DescriptorBuilder, MemberKey, MemberUsage};
pub use report::{findings, Finding};
pub use resolver::CrossReferenceResolver;

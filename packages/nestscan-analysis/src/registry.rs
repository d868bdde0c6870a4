//! Class registry and descriptors
//!
//! The registry is the single unit of truth for the analysis: pass 1 seals
//! one `ClassDescriptor` per unit, pass 2 only grows the caller sets inside
//! `MemberUsage`, pass 3 reads the final state. Entries are never removed.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::fmt;

use nestscan_classfile::access::{ACC_PRIVATE, ACC_PROTECTED, ACC_PUBLIC};
use nestscan_classfile::StructuralEvent;

/// Member key, unique within one class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemberKey {
    pub name: String,
    pub descriptor: String,
}

impl MemberKey {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self { name: name.into(), descriptor: descriptor.into() }
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.descriptor)
    }
}

/// Accumulated cross-reference state of one tracked member
///
/// The caller set grows monotonically during pass 2 and never shrinks.
#[derive(Debug, Default, Clone)]
pub struct MemberUsage {
    observed_caller_nest_hosts: FxHashSet<String>,
}

impl MemberUsage {
    pub fn record_caller_nest_host(&mut self, nest_host: &str) {
        if !self.observed_caller_nest_hosts.contains(nest_host) {
            self.observed_caller_nest_hosts.insert(nest_host.to_string());
        }
    }

    pub fn caller_nest_hosts(&self) -> &FxHashSet<String> {
        &self.observed_caller_nest_hosts
    }

    /// True iff the accumulated set is exactly `{nest_host}`
    ///
    /// An empty set does not qualify: a member nobody references is dead
    /// code, not an over-visible one.
    pub fn is_confined_to(&self, nest_host: &str) -> bool {
        self.observed_caller_nest_hosts.len() == 1
            && self.observed_caller_nest_hosts.contains(nest_host)
    }
}

/// Sealed structural record of one class unit
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    identity: String,
    same_package_supertype: Option<String>,
    nest_host: String,
    source_label: String,
    members: FxHashMap<MemberKey, MemberUsage>,
}

impl ClassDescriptor {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Supertype link, present only when the supertype shares this class's
    /// namespace prefix
    pub fn same_package_supertype(&self) -> Option<&str> {
        self.same_package_supertype.as_deref()
    }

    pub fn nest_host(&self) -> &str {
        &self.nest_host
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    pub fn members(&self) -> &FxHashMap<MemberKey, MemberUsage> {
        &self.members
    }

    pub fn member(&self, key: &MemberKey) -> Option<&MemberUsage> {
        self.members.get(key)
    }

    pub(crate) fn member_mut(&mut self, key: &MemberKey) -> Option<&mut MemberUsage> {
        self.members.get_mut(key)
    }
}

/// Folds one unit's structural event stream into a sealed descriptor
///
/// Tracks a declared member iff it is package-restricted; ignores
/// everything public, private or protected.
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    identity: Option<String>,
    same_package_supertype: Option<String>,
    nest_host: Option<String>,
    source_label: Option<String>,
    members: FxHashMap<MemberKey, MemberUsage>,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: StructuralEvent) {
        match event {
            StructuralEvent::Header { identity, superclass, nest_host } => {
                self.same_package_supertype =
                    superclass.filter(|superclass| same_namespace(&identity, superclass));
                self.identity = Some(identity);
                self.nest_host = Some(nest_host);
            }
            StructuralEvent::SourceLabel(label) => self.source_label = Some(label),
            StructuralEvent::Field { name, descriptor, access }
            | StructuralEvent::Method { name, descriptor, access } => {
                if is_package_restricted(access) {
                    self.members.insert(MemberKey::new(name, descriptor), MemberUsage::default());
                }
            }
            StructuralEvent::End => {}
        }
    }

    /// Seal the descriptor; `None` if no header event was seen
    pub fn finish(self) -> Option<ClassDescriptor> {
        let identity = self.identity?;
        let nest_host = self.nest_host.unwrap_or_else(|| identity.clone());
        let source_label = self.source_label.unwrap_or_else(|| identity.clone());
        Some(ClassDescriptor {
            identity,
            same_package_supertype: self.same_package_supertype,
            nest_host,
            source_label,
            members: self.members,
        })
    }
}

/// Identity -> descriptor table for the whole corpus
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, ClassDescriptor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ClassDescriptor) {
        self.classes.insert(descriptor.identity.clone(), descriptor);
    }

    /// An unknown identity is not an error: references can leave the
    /// scanned corpus.
    pub fn lookup(&self, identity: &str) -> Option<&ClassDescriptor> {
        self.classes.get(identity)
    }

    pub(crate) fn lookup_mut(&mut self, identity: &str) -> Option<&mut ClassDescriptor> {
        self.classes.get_mut(identity)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }
}

/// Package-restricted: none of public/private/protected is set
pub fn is_package_restricted(access: u16) -> bool {
    access & (ACC_PUBLIC | ACC_PRIVATE | ACC_PROTECTED) == 0
}

/// Namespace prefix of an internal-form class name, up to the last `/`
pub fn namespace_of(identity: &str) -> &str {
    identity.rfind('/').map_or("", |index| &identity[..index])
}

pub fn same_namespace(first: &str, second: &str) -> bool {
    namespace_of(first) == namespace_of(second)
}

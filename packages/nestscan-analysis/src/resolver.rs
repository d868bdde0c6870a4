//! Cross-reference resolver (pass 2)
//!
//! Routes every instruction-level reference onto the registry and records
//! the referencing class's nest host against the declaring member.
//!
//! Resolution rules:
//! - unknown owner: the reference leaves the scanned corpus, silent no-op
//! - exact member hit: record the caller's nest host
//! - field miss: stop (field references name their exact declaring owner)
//! - method miss: walk the same-package supertype chain until a hit or the
//!   chain ends

use nestscan_classfile::{InstructionEvent, MemberHandle};
use tracing::trace;

use crate::errors::{AnalysisError, Result};
use crate::registry::{ClassRegistry, MemberKey};

impl ClassRegistry {
    /// Attribute one reference from a caller with the given nest host
    pub fn attribute(
        &mut self,
        caller_nest_host: &str,
        owner: &str,
        member_key: &MemberKey,
        is_field_reference: bool,
    ) {
        let Some(declaring) = self.resolve_declaring(owner, member_key, is_field_reference) else {
            return;
        };
        // resolve_declaring only returns registered identities with the
        // member present, so both lookups hit
        if let Some(usage) = self
            .lookup_mut(&declaring)
            .and_then(|descriptor| descriptor.member_mut(member_key))
        {
            usage.record_caller_nest_host(caller_nest_host);
        }
    }

    /// Walk to the class that declares the referenced member, if any
    fn resolve_declaring(
        &self,
        owner: &str,
        member_key: &MemberKey,
        is_field_reference: bool,
    ) -> Option<String> {
        let mut current = owner;
        loop {
            let descriptor = self.lookup(current)?;
            if descriptor.member(member_key).is_some() {
                return Some(current.to_string());
            }
            if is_field_reference {
                // a field reference that misses the exact owner targets a
                // member this analysis does not track
                return None;
            }
            current = descriptor.same_package_supertype()?;
        }
    }
}

/// Adapts one caller class's instruction events onto the registry
#[derive(Debug)]
pub struct CrossReferenceResolver<'r> {
    registry: &'r mut ClassRegistry,
    caller_nest_host: String,
}

impl<'r> CrossReferenceResolver<'r> {
    /// Bind the resolver to one caller class
    ///
    /// The caller must have been registered by the structural pass; a miss
    /// here means the two-pass ordering guarantee was broken.
    pub fn for_caller(registry: &'r mut ClassRegistry, caller_identity: &str) -> Result<Self> {
        let caller_nest_host = registry
            .lookup(caller_identity)
            .ok_or_else(|| {
                AnalysisError::internal(format!(
                    "caller {caller_identity} missing from registry before cross-reference pass"
                ))
            })?
            .nest_host()
            .to_string();
        Ok(Self { registry, caller_nest_host })
    }

    pub fn observe(&mut self, event: InstructionEvent) {
        match event {
            InstructionEvent::FieldAccess { owner, name, descriptor } => {
                self.observe_member(&owner, MemberKey::new(name, descriptor), true);
            }
            InstructionEvent::MethodInvocation { owner, name, descriptor } => {
                self.observe_member(&owner, MemberKey::new(name, descriptor), false);
            }
            InstructionEvent::ConstantHandle(handle) => self.observe_handle(handle),
            InstructionEvent::DynamicCallSite { bootstrap, static_handles } => {
                self.observe_handle(bootstrap);
                for handle in static_handles {
                    self.observe_handle(handle);
                }
            }
        }
    }

    /// Indirect references are field-like exactly when the handle kind is
    /// a field getter or setter
    fn observe_handle(&mut self, handle: MemberHandle) {
        let is_field = handle.kind.is_field_access();
        self.observe_member(&handle.owner, MemberKey::new(handle.name, handle.descriptor), is_field);
    }

    fn observe_member(&mut self, owner: &str, member_key: MemberKey, is_field_reference: bool) {
        trace!(
            caller_nest = %self.caller_nest_host,
            owner,
            member = %member_key,
            field = is_field_reference,
            "cross-reference"
        );
        self.registry
            .attribute(&self.caller_nest_host, owner, &member_key, is_field_reference);
    }
}

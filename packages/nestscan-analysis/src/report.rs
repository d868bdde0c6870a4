//! Visibility reporter (pass 3)
//!
//! Stateless, restartable scan over the final registry. A member is
//! reported when every observed caller shares the member's own nest host;
//! a member nobody references is excluded (the empty set is not the
//! singleton set).
//!
//! Output order is deterministic: class identity, then member name, then
//! member descriptor.

use serde::Serialize;
use std::fmt;

use crate::registry::{ClassRegistry, MemberKey};

/// One advisory finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub class_identity: String,
    pub source_label: String,
    pub member: MemberKey,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {}, {} should be declared private",
            self.class_identity, self.source_label, self.member
        )
    }
}

/// Lazily yield every over-visible member, in sorted order
pub fn findings(registry: &ClassRegistry) -> impl Iterator<Item = Finding> + '_ {
    let mut descriptors: Vec<_> = registry.descriptors().collect();
    descriptors.sort_by(|a, b| a.identity().cmp(b.identity()));

    descriptors.into_iter().flat_map(|descriptor| {
        let mut keys: Vec<&MemberKey> = descriptor
            .members()
            .iter()
            .filter(|(_, usage)| usage.is_confined_to(descriptor.nest_host()))
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys.into_iter().map(move |key| Finding {
            class_identity: descriptor.identity().to_string(),
            source_label: descriptor.source_label().to_string(),
            member: key.clone(),
        })
    })
}

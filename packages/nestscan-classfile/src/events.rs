//! Decode events delivered to the analysis core
//!
//! The decoder emits plain tagged-union events instead of a visitor
//! hierarchy; consumers match on the event kind.

/// Member access flags relevant to visibility classification
pub mod access {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
}

/// Method-handle reference kind (JVMS table 5.4.3.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl ReferenceKind {
    /// Decode the numeric kind tag of a CONSTANT_MethodHandle entry
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => ReferenceKind::GetField,
            2 => ReferenceKind::GetStatic,
            3 => ReferenceKind::PutField,
            4 => ReferenceKind::PutStatic,
            5 => ReferenceKind::InvokeVirtual,
            6 => ReferenceKind::InvokeStatic,
            7 => ReferenceKind::InvokeSpecial,
            8 => ReferenceKind::NewInvokeSpecial,
            9 => ReferenceKind::InvokeInterface,
            _ => return None,
        })
    }

    /// True exactly for the static/instance field getter and setter kinds
    pub fn is_field_access(self) -> bool {
        matches!(
            self,
            ReferenceKind::GetField
                | ReferenceKind::GetStatic
                | ReferenceKind::PutField
                | ReferenceKind::PutStatic
        )
    }
}

/// A member reference carried inside a loadable constant or a bootstrap
/// specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHandle {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub kind: ReferenceKind,
}

/// Structural event stream (decode mode A, code skipped)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralEvent {
    /// Class header; `nest_host` is the class itself when the unit
    /// declares no nest host
    Header {
        identity: String,
        superclass: Option<String>,
        nest_host: String,
    },
    /// Debug source-file name
    SourceLabel(String),
    Field {
        name: String,
        descriptor: String,
        access: u16,
    },
    Method {
        name: String,
        descriptor: String,
        access: u16,
    },
    End,
}

/// Instruction event stream (decode mode B, frames skipped)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionEvent {
    /// getstatic / putstatic / getfield / putfield
    FieldAccess {
        owner: String,
        name: String,
        descriptor: String,
    },
    /// invokevirtual / invokespecial / invokestatic / invokeinterface
    MethodInvocation {
        owner: String,
        name: String,
        descriptor: String,
    },
    /// ldc / ldc_w of a CONSTANT_MethodHandle
    ConstantHandle(MemberHandle),
    /// invokedynamic, resolved through the BootstrapMethods attribute;
    /// `static_handles` holds every MethodHandle-typed static argument
    DynamicCallSite {
        bootstrap: MemberHandle,
        static_handles: Vec<MemberHandle>,
    },
}

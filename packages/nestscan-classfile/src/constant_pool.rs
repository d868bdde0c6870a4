//! Constant pool model
//!
//! One-pass parse of the pool followed by typed, index-checked accessors.
//! Indices are 1-based; Long and Double entries occupy two slots.

use crate::errors::{ClassfileError, Result};
use crate::events::{MemberHandle, ReferenceKind};
use crate::reader::ByteCursor;

/// One parsed constant pool entry
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    /// Slot 0 and the trailing slot of Long/Double entries
    Unusable,
}

/// Parsed constant pool with 1-based indexing
#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Parse `constant_pool_count` and all entries from the cursor
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let count = cursor.read_u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);

        let mut index: u16 = 1;
        while index < count {
            let tag = cursor.read_u8()?;
            let (entry, wide) = Self::parse_entry(tag, index, cursor)?;
            entries.push(entry);
            index += 1;
            if wide {
                entries.push(Constant::Unusable);
                index += 1;
            }
        }
        Ok(Self { entries })
    }

    fn parse_entry(tag: u8, index: u16, cursor: &mut ByteCursor<'_>) -> Result<(Constant, bool)> {
        let entry = match tag {
            1 => {
                let len = cursor.read_u16()? as usize;
                let bytes = cursor.read_bytes(len)?;
                // Modified UTF-8 in theory; member and class names are
                // plain UTF-8 in practice.
                Constant::Utf8(String::from_utf8_lossy(bytes).into_owned())
            }
            3 => Constant::Integer(cursor.read_i32()?),
            4 => Constant::Float(f32::from_bits(cursor.read_u32()?)),
            5 => return Ok((Constant::Long(cursor.read_u64()? as i64), true)),
            6 => return Ok((Constant::Double(f64::from_bits(cursor.read_u64()?)), true)),
            7 => Constant::Class { name_index: cursor.read_u16()? },
            8 => Constant::String { string_index: cursor.read_u16()? },
            9 => Constant::FieldRef {
                class_index: cursor.read_u16()?,
                name_and_type_index: cursor.read_u16()?,
            },
            10 => Constant::MethodRef {
                class_index: cursor.read_u16()?,
                name_and_type_index: cursor.read_u16()?,
            },
            11 => Constant::InterfaceMethodRef {
                class_index: cursor.read_u16()?,
                name_and_type_index: cursor.read_u16()?,
            },
            12 => Constant::NameAndType {
                name_index: cursor.read_u16()?,
                descriptor_index: cursor.read_u16()?,
            },
            15 => Constant::MethodHandle {
                kind: cursor.read_u8()?,
                reference_index: cursor.read_u16()?,
            },
            16 => Constant::MethodType { descriptor_index: cursor.read_u16()? },
            17 => Constant::Dynamic {
                bootstrap_method_attr_index: cursor.read_u16()?,
                name_and_type_index: cursor.read_u16()?,
            },
            18 => Constant::InvokeDynamic {
                bootstrap_method_attr_index: cursor.read_u16()?,
                name_and_type_index: cursor.read_u16()?,
            },
            19 => Constant::Module { name_index: cursor.read_u16()? },
            20 => Constant::Package { name_index: cursor.read_u16()? },
            _ => return Err(ClassfileError::UnsupportedConstantTag { tag, index }),
        };
        Ok((entry, false))
    }

    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.entries.get(index as usize)
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index) {
            Some(Constant::Utf8(s)) => Ok(s),
            _ => Err(ClassfileError::BadConstantIndex { index, expected: "Utf8" }),
        }
    }

    /// Internal-form class name behind a CONSTANT_Class entry
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(ClassfileError::BadConstantIndex { index, expected: "Class" }),
        }
    }

    /// (name, descriptor) behind a CONSTANT_NameAndType entry
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.get(index) {
            Some(Constant::NameAndType { name_index, descriptor_index }) => {
                Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?))
            }
            _ => Err(ClassfileError::BadConstantIndex { index, expected: "NameAndType" }),
        }
    }

    /// (owner, name, descriptor) behind a Fieldref/Methodref/InterfaceMethodref
    pub fn member_ref(&self, index: u16) -> Result<(&str, &str, &str)> {
        let (class_index, name_and_type_index) = match self.get(index) {
            Some(Constant::FieldRef { class_index, name_and_type_index })
            | Some(Constant::MethodRef { class_index, name_and_type_index })
            | Some(Constant::InterfaceMethodRef { class_index, name_and_type_index }) => {
                (*class_index, *name_and_type_index)
            }
            _ => {
                return Err(ClassfileError::BadConstantIndex {
                    index,
                    expected: "Fieldref/Methodref",
                })
            }
        };
        let owner = self.class_name(class_index)?;
        let (name, descriptor) = self.name_and_type(name_and_type_index)?;
        Ok((owner, name, descriptor))
    }

    /// Fully resolved CONSTANT_MethodHandle entry
    pub fn method_handle(&self, index: u16) -> Result<MemberHandle> {
        let (kind, reference_index) = match self.get(index) {
            Some(Constant::MethodHandle { kind, reference_index }) => (*kind, *reference_index),
            _ => {
                return Err(ClassfileError::BadConstantIndex {
                    index,
                    expected: "MethodHandle",
                })
            }
        };
        let kind = ReferenceKind::from_tag(kind).ok_or(ClassfileError::BadConstantIndex {
            index,
            expected: "MethodHandle reference kind",
        })?;
        let (owner, name, descriptor) = self.member_ref(reference_index)?;
        Ok(MemberHandle {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            kind,
        })
    }

    /// Bootstrap-table index behind a CONSTANT_InvokeDynamic entry
    pub fn invoke_dynamic(&self, index: u16) -> Result<u16> {
        match self.get(index) {
            Some(Constant::InvokeDynamic { bootstrap_method_attr_index, .. }) => {
                Ok(*bootstrap_method_attr_index)
            }
            _ => Err(ClassfileError::BadConstantIndex { index, expected: "InvokeDynamic" }),
        }
    }
}

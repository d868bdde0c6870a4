//! Class unit decoder
//!
//! One `ClassUnit` wraps a parsed header and constant pool and offers two
//! visitation modes over the same bytes:
//!
//! - `visit_structure`: declarations only, method bodies skipped wholesale
//! - `visit_instructions`: every `Code` attribute is walked opcode by
//!   opcode and member references are resolved through the constant pool

use tracing::trace;

use crate::constant_pool::{Constant, ConstantPool};
use crate::errors::{ClassfileError, Result};
use crate::events::{InstructionEvent, MemberHandle, StructuralEvent};
use crate::reader::ByteCursor;

const MAGIC: u32 = 0xCAFE_BABE;

/// One compiled class unit, parsed up to the class header
#[derive(Debug)]
pub struct ClassUnit<'a> {
    data: &'a [u8],
    pool: ConstantPool,
    identity: String,
    superclass: Option<String>,
    /// Offset of `interfaces_count`, where both visitation modes resume
    body_offset: usize,
}

/// One entry of the BootstrapMethods class attribute
struct BootstrapMethod {
    method_ref: u16,
    arguments: Vec<u16>,
}

impl<'a> ClassUnit<'a> {
    /// Parse magic, version, constant pool and class header
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let magic = cursor.read_u32()?;
        if magic != MAGIC {
            return Err(ClassfileError::BadMagic { found: magic });
        }
        cursor.skip(4)?; // minor_version, major_version
        let pool = ConstantPool::parse(&mut cursor)?;
        cursor.skip(2)?; // access_flags
        let this_class = cursor.read_u16()?;
        let super_class = cursor.read_u16()?;

        let identity = pool.class_name(this_class)?.to_string();
        let superclass = if super_class == 0 {
            None
        } else {
            Some(pool.class_name(super_class)?.to_string())
        };

        Ok(Self {
            data,
            pool,
            identity,
            superclass,
            body_offset: cursor.position(),
        })
    }

    /// Internal-form class name of this unit
    pub fn identity(&self) -> &str {
        &self.identity
    }

    fn body_cursor(&self) -> ByteCursor<'a> {
        // body_offset was reached by parse(), so it is in bounds
        ByteCursor::new(&self.data[self.body_offset..])
    }

    fn skip_interfaces(cursor: &mut ByteCursor<'_>) -> Result<()> {
        let count = cursor.read_u16()?;
        cursor.skip(count as usize * 2)
    }

    /// Decode mode A: declarations only
    ///
    /// Emits `Header`, `SourceLabel`, one event per field and method, then
    /// `End`. Nest host and source label default to the class identity when
    /// the corresponding attributes are absent.
    pub fn visit_structure(&self, sink: &mut dyn FnMut(StructuralEvent)) -> Result<()> {
        let mut cursor = self.body_cursor();
        Self::skip_interfaces(&mut cursor)?;

        let mut members = Vec::new();
        for is_field in [true, false] {
            let count = cursor.read_u16()?;
            for _ in 0..count {
                let access = cursor.read_u16()?;
                let name = self.pool.utf8(cursor.read_u16()?)?.to_string();
                let descriptor = self.pool.utf8(cursor.read_u16()?)?.to_string();
                self.skip_attributes(&mut cursor)?;
                members.push((is_field, name, descriptor, access));
            }
        }

        let mut nest_host = self.identity.clone();
        let mut source_label = self.identity.clone();
        let attr_count = cursor.read_u16()?;
        for _ in 0..attr_count {
            let name_index = cursor.read_u16()?;
            let length = cursor.read_u32()? as usize;
            match self.pool.utf8(name_index)? {
                "NestHost" => {
                    let mut attr = ByteCursor::new(cursor.read_bytes(length)?);
                    nest_host = self.pool.class_name(attr.read_u16()?)?.to_string();
                }
                "SourceFile" => {
                    let mut attr = ByteCursor::new(cursor.read_bytes(length)?);
                    source_label = self.pool.utf8(attr.read_u16()?)?.to_string();
                }
                _ => cursor.skip(length)?,
            }
        }

        sink(StructuralEvent::Header {
            identity: self.identity.clone(),
            superclass: self.superclass.clone(),
            nest_host,
        });
        sink(StructuralEvent::SourceLabel(source_label));
        for (is_field, name, descriptor, access) in members {
            sink(if is_field {
                StructuralEvent::Field { name, descriptor, access }
            } else {
                StructuralEvent::Method { name, descriptor, access }
            });
        }
        sink(StructuralEvent::End);
        Ok(())
    }

    /// Decode mode B: instruction-level references
    ///
    /// Walks every method's `Code` attribute and emits one event per
    /// field access, method invocation, loaded method handle and dynamic
    /// call site.
    pub fn visit_instructions(&self, sink: &mut dyn FnMut(InstructionEvent)) -> Result<()> {
        let mut cursor = self.body_cursor();
        Self::skip_interfaces(&mut cursor)?;

        // fields carry no code
        let field_count = cursor.read_u16()?;
        for _ in 0..field_count {
            cursor.skip(6)?;
            self.skip_attributes(&mut cursor)?;
        }

        // The BootstrapMethods table lives in the class attributes after
        // the method section, so code slices are collected first.
        let mut code_slices: Vec<&[u8]> = Vec::new();
        let method_count = cursor.read_u16()?;
        for _ in 0..method_count {
            cursor.skip(6)?;
            let attr_count = cursor.read_u16()?;
            for _ in 0..attr_count {
                let name_index = cursor.read_u16()?;
                let length = cursor.read_u32()? as usize;
                if self.pool.utf8(name_index)? == "Code" {
                    let mut attr = ByteCursor::new(cursor.read_bytes(length)?);
                    attr.skip(4)?; // max_stack, max_locals
                    let code_length = attr.read_u32()? as usize;
                    code_slices.push(attr.read_bytes(code_length)?);
                } else {
                    cursor.skip(length)?;
                }
            }
        }

        let bootstrap_methods = self.parse_bootstrap_methods(&mut cursor)?;
        trace!(
            class = %self.identity,
            methods = code_slices.len(),
            bootstrap_methods = bootstrap_methods.len(),
            "scanning code"
        );

        for code in code_slices {
            self.scan_code(code, &bootstrap_methods, sink)?;
        }
        Ok(())
    }

    fn parse_bootstrap_methods(&self, cursor: &mut ByteCursor<'a>) -> Result<Vec<BootstrapMethod>> {
        let mut table = Vec::new();
        let attr_count = cursor.read_u16()?;
        for _ in 0..attr_count {
            let name_index = cursor.read_u16()?;
            let length = cursor.read_u32()? as usize;
            if self.pool.utf8(name_index)? != "BootstrapMethods" {
                cursor.skip(length)?;
                continue;
            }
            let mut attr = ByteCursor::new(cursor.read_bytes(length)?);
            let count = attr.read_u16()?;
            for _ in 0..count {
                let method_ref = attr.read_u16()?;
                let arg_count = attr.read_u16()?;
                let mut arguments = Vec::with_capacity(arg_count as usize);
                for _ in 0..arg_count {
                    arguments.push(attr.read_u16()?);
                }
                table.push(BootstrapMethod { method_ref, arguments });
            }
        }
        Ok(table)
    }

    fn scan_code(
        &self,
        code: &[u8],
        bootstrap_methods: &[BootstrapMethod],
        sink: &mut dyn FnMut(InstructionEvent),
    ) -> Result<()> {
        let mut pc = 0usize;
        while pc < code.len() {
            let opcode = code[pc];
            match opcode {
                // getstatic, putstatic, getfield, putfield
                0xB2..=0xB5 => {
                    let (owner, name, descriptor) = self.pool.member_ref(read_u16_at(code, pc + 1)?)?;
                    sink(InstructionEvent::FieldAccess {
                        owner: owner.to_string(),
                        name: name.to_string(),
                        descriptor: descriptor.to_string(),
                    });
                    pc += 3;
                }
                // invokevirtual, invokespecial, invokestatic
                0xB6..=0xB8 => {
                    let (owner, name, descriptor) = self.pool.member_ref(read_u16_at(code, pc + 1)?)?;
                    sink(InstructionEvent::MethodInvocation {
                        owner: owner.to_string(),
                        name: name.to_string(),
                        descriptor: descriptor.to_string(),
                    });
                    pc += 3;
                }
                // invokeinterface (index, count, 0)
                0xB9 => {
                    let (owner, name, descriptor) = self.pool.member_ref(read_u16_at(code, pc + 1)?)?;
                    sink(InstructionEvent::MethodInvocation {
                        owner: owner.to_string(),
                        name: name.to_string(),
                        descriptor: descriptor.to_string(),
                    });
                    pc += 5;
                }
                // invokedynamic (index, 0, 0)
                0xBA => {
                    let bsm_index = self.pool.invoke_dynamic(read_u16_at(code, pc + 1)?)?;
                    let bsm = bootstrap_methods.get(bsm_index as usize).ok_or_else(|| {
                        ClassfileError::malformed(format!(
                            "invokedynamic names bootstrap method {bsm_index} of {}",
                            bootstrap_methods.len()
                        ))
                    })?;
                    let bootstrap = self.pool.method_handle(bsm.method_ref)?;
                    let mut static_handles = Vec::new();
                    for &arg in &bsm.arguments {
                        if let Some(Constant::MethodHandle { .. }) = self.pool.get(arg) {
                            static_handles.push(self.pool.method_handle(arg)?);
                        }
                    }
                    sink(InstructionEvent::DynamicCallSite { bootstrap, static_handles });
                    pc += 5;
                }
                // ldc
                0x12 => {
                    let index = *code.get(pc + 1).ok_or_else(truncated_code)? as u16;
                    self.emit_loaded_handle(index, sink)?;
                    pc += 2;
                }
                // ldc_w
                0x13 => {
                    self.emit_loaded_handle(read_u16_at(code, pc + 1)?, sink)?;
                    pc += 3;
                }
                // ldc2_w
                0x14 => pc += 3,
                // wide
                0xC4 => {
                    let widened = *code.get(pc + 1).ok_or_else(truncated_code)?;
                    pc += if widened == 0x84 { 6 } else { 4 };
                }
                // tableswitch
                0xAA => {
                    let mut offset = pc + 1 + pad_to_four(pc + 1);
                    offset += 4; // default
                    let low = read_i32_at(code, offset)?;
                    let high = read_i32_at(code, offset + 4)?;
                    if high < low {
                        return Err(ClassfileError::malformed("tableswitch high < low"));
                    }
                    let jumps = (i64::from(high) - i64::from(low) + 1) as usize;
                    pc = offset + 8 + jumps * 4;
                }
                // lookupswitch
                0xAB => {
                    let mut offset = pc + 1 + pad_to_four(pc + 1);
                    offset += 4; // default
                    let npairs = read_i32_at(code, offset)?;
                    if npairs < 0 {
                        return Err(ClassfileError::malformed("lookupswitch negative npairs"));
                    }
                    pc = offset + 4 + npairs as usize * 8;
                }
                _ => pc += 1 + fixed_operand_len(opcode)?,
            }
        }
        Ok(())
    }

    fn emit_loaded_handle(&self, index: u16, sink: &mut dyn FnMut(InstructionEvent)) -> Result<()> {
        if let Some(Constant::MethodHandle { .. }) = self.pool.get(index) {
            sink(InstructionEvent::ConstantHandle(self.pool.method_handle(index)?));
        }
        Ok(())
    }

    /// Skip an attribute table without inspecting its entries
    fn skip_attributes(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        let count = cursor.read_u16()?;
        for _ in 0..count {
            cursor.skip(2)?; // attribute_name_index
            let length = cursor.read_u32()? as usize;
            cursor.skip(length)?;
        }
        Ok(())
    }
}

fn truncated_code() -> ClassfileError {
    ClassfileError::malformed("code attribute ends mid-instruction")
}

fn read_u16_at(code: &[u8], at: usize) -> Result<u16> {
    let bytes = code.get(at..at + 2).ok_or_else(truncated_code)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_i32_at(code: &[u8], at: usize) -> Result<i32> {
    let bytes = code.get(at..at + 4).ok_or_else(truncated_code)?;
    Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Padding to the next 4-byte boundary relative to the start of code[]
fn pad_to_four(offset: usize) -> usize {
    (4 - offset % 4) % 4
}

/// Operand byte count of fixed-length opcodes without member references
fn fixed_operand_len(opcode: u8) -> Result<usize> {
    Ok(match opcode {
        // constants, loads/stores by slot shorthand, stack ops, arithmetic,
        // conversions, comparisons, returns, array ops, monitors
        0x00..=0x0F
        | 0x1A..=0x35
        | 0x3B..=0x83
        | 0x85..=0x98
        | 0xAC..=0xB1
        | 0xBE
        | 0xBF
        | 0xC2
        | 0xC3 => 0,
        // bipush, load/store with slot index, newarray, ret
        0x10 | 0x15..=0x19 | 0x36..=0x3A | 0xA9 | 0xBC => 1,
        // sipush, iinc, branches, new, anewarray, checkcast, instanceof,
        // ifnull, ifnonnull
        0x11 | 0x84 | 0x99..=0xA8 | 0xBB | 0xBD | 0xC0 | 0xC1 | 0xC6 | 0xC7 => 2,
        // multianewarray
        0xC5 => 3,
        // goto_w, jsr_w
        0xC8 | 0xC9 => 4,
        _ => {
            return Err(ClassfileError::malformed(format!(
                "unknown opcode 0x{opcode:02X}"
            )))
        }
    })
}

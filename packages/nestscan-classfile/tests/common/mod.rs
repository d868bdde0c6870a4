//! Test-only class file writer
//!
//! Emits just enough of the class file format to exercise the decoder:
//! constant pool, fields, methods with optional bytecode, and the
//! SourceFile / NestHost / BootstrapMethods attributes.

use std::collections::HashMap;

#[derive(Default)]
pub struct ClassFileBuilder {
    constants: Vec<Vec<u8>>,
    utf8_cache: HashMap<String, u16>,
    this_class: u16,
    super_class: u16,
    fields: Vec<MemberDecl>,
    methods: Vec<MemberDecl>,
    source_file: Option<u16>,
    nest_host: Option<u16>,
    bootstrap_methods: Vec<(u16, Vec<u16>)>,
}

struct MemberDecl {
    access: u16,
    name_index: u16,
    descriptor_index: u16,
    code: Option<Vec<u8>>,
}

impl ClassFileBuilder {
    pub fn new(class_name: &str, super_name: Option<&str>) -> Self {
        let mut builder = Self::default();
        builder.this_class = builder.class(class_name);
        builder.super_class = super_name.map_or(0, |name| builder.class(name));
        builder
    }

    fn push(&mut self, entry: Vec<u8>) -> u16 {
        self.constants.push(entry);
        self.constants.len() as u16
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8_cache.get(value) {
            return index;
        }
        let mut entry = vec![1u8];
        entry.extend_from_slice(&(value.len() as u16).to_be_bytes());
        entry.extend_from_slice(value.as_bytes());
        let index = self.push(entry);
        self.utf8_cache.insert(value.to_string(), index);
        index
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        let mut entry = vec![7u8];
        entry.extend_from_slice(&name_index.to_be_bytes());
        self.push(entry)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut entry = vec![12u8];
        entry.extend_from_slice(&name_index.to_be_bytes());
        entry.extend_from_slice(&descriptor_index.to_be_bytes());
        self.push(entry)
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let nat_index = self.name_and_type(name, descriptor);
        let mut entry = vec![tag];
        entry.extend_from_slice(&class_index.to_be_bytes());
        entry.extend_from_slice(&nat_index.to_be_bytes());
        self.push(entry)
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(9, owner, name, descriptor)
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(10, owner, name, descriptor)
    }

    pub fn method_handle(&mut self, kind: u8, reference_index: u16) -> u16 {
        let mut entry = vec![15u8, kind];
        entry.extend_from_slice(&reference_index.to_be_bytes());
        self.push(entry)
    }

    pub fn invoke_dynamic(&mut self, bootstrap_index: u16, name: &str, descriptor: &str) -> u16 {
        let nat_index = self.name_and_type(name, descriptor);
        let mut entry = vec![18u8];
        entry.extend_from_slice(&bootstrap_index.to_be_bytes());
        entry.extend_from_slice(&nat_index.to_be_bytes());
        self.push(entry)
    }

    pub fn add_bootstrap_method(&mut self, method_handle_index: u16, arguments: Vec<u16>) -> u16 {
        self.bootstrap_methods.push((method_handle_index, arguments));
        (self.bootstrap_methods.len() - 1) as u16
    }

    pub fn field(&mut self, access: u16, name: &str, descriptor: &str) -> &mut Self {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.fields.push(MemberDecl { access, name_index, descriptor_index, code: None });
        self
    }

    pub fn method(&mut self, access: u16, name: &str, descriptor: &str) -> &mut Self {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.methods.push(MemberDecl { access, name_index, descriptor_index, code: None });
        self
    }

    pub fn method_with_code(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        code: Vec<u8>,
    ) -> &mut Self {
        self.utf8("Code");
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.methods.push(MemberDecl { access, name_index, descriptor_index, code: Some(code) });
        self
    }

    pub fn source_file(&mut self, name: &str) -> &mut Self {
        self.utf8("SourceFile");
        self.source_file = Some(self.utf8(name));
        self
    }

    pub fn nest_host(&mut self, class_name: &str) -> &mut Self {
        self.utf8("NestHost");
        self.nest_host = Some(self.class(class_name));
        self
    }

    pub fn build(&mut self) -> Vec<u8> {
        if !self.bootstrap_methods.is_empty() {
            self.utf8("BootstrapMethods");
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&[0, 0, 0, 55]); // minor, major (Java 11)
        out.extend_from_slice(&((self.constants.len() + 1) as u16).to_be_bytes());
        for entry in &self.constants {
            out.extend_from_slice(entry);
        }
        out.extend_from_slice(&0x0020u16.to_be_bytes()); // ACC_SUPER
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces_count

        for section in [&self.fields, &self.methods] {
            out.extend_from_slice(&(section.len() as u16).to_be_bytes());
            for member in section.iter() {
                out.extend_from_slice(&member.access.to_be_bytes());
                out.extend_from_slice(&member.name_index.to_be_bytes());
                out.extend_from_slice(&member.descriptor_index.to_be_bytes());
                match &member.code {
                    None => out.extend_from_slice(&0u16.to_be_bytes()),
                    Some(code) => {
                        out.extend_from_slice(&1u16.to_be_bytes());
                        out.extend_from_slice(&self.utf8_cache["Code"].to_be_bytes());
                        let length = 2 + 2 + 4 + code.len() + 2 + 2;
                        out.extend_from_slice(&(length as u32).to_be_bytes());
                        out.extend_from_slice(&8u16.to_be_bytes()); // max_stack
                        out.extend_from_slice(&8u16.to_be_bytes()); // max_locals
                        out.extend_from_slice(&(code.len() as u32).to_be_bytes());
                        out.extend_from_slice(code);
                        out.extend_from_slice(&0u16.to_be_bytes()); // exception table
                        out.extend_from_slice(&0u16.to_be_bytes()); // attributes
                    }
                }
            }
        }

        let mut class_attrs: Vec<(u16, Vec<u8>)> = Vec::new();
        if let Some(index) = self.source_file {
            class_attrs.push((self.utf8_cache["SourceFile"], index.to_be_bytes().to_vec()));
        }
        if let Some(index) = self.nest_host {
            class_attrs.push((self.utf8_cache["NestHost"], index.to_be_bytes().to_vec()));
        }
        if !self.bootstrap_methods.is_empty() {
            let mut payload = Vec::new();
            payload.extend_from_slice(&(self.bootstrap_methods.len() as u16).to_be_bytes());
            for (handle, args) in &self.bootstrap_methods {
                payload.extend_from_slice(&handle.to_be_bytes());
                payload.extend_from_slice(&(args.len() as u16).to_be_bytes());
                for arg in args {
                    payload.extend_from_slice(&arg.to_be_bytes());
                }
            }
            class_attrs.push((self.utf8_cache["BootstrapMethods"], payload));
        }

        out.extend_from_slice(&(class_attrs.len() as u16).to_be_bytes());
        for (name_index, payload) in class_attrs {
            out.extend_from_slice(&name_index.to_be_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(&payload);
        }
        out
    }
}

/// Bytecode helpers for the handful of opcodes the tests exercise
pub mod code {
    pub fn invoke_virtual(index: u16) -> Vec<u8> {
        with_u16(0xB6, index)
    }

    pub fn invoke_static(index: u16) -> Vec<u8> {
        with_u16(0xB8, index)
    }

    pub fn get_field(index: u16) -> Vec<u8> {
        with_u16(0xB4, index)
    }

    pub fn put_static(index: u16) -> Vec<u8> {
        with_u16(0xB3, index)
    }

    pub fn ldc(index: u8) -> Vec<u8> {
        vec![0x12, index]
    }

    pub fn invoke_dynamic(index: u16) -> Vec<u8> {
        let mut bytes = with_u16(0xBA, index);
        bytes.extend_from_slice(&[0, 0]);
        bytes
    }

    pub fn vreturn() -> Vec<u8> {
        vec![0xB1]
    }

    fn with_u16(opcode: u8, index: u16) -> Vec<u8> {
        let mut bytes = vec![opcode];
        bytes.extend_from_slice(&index.to_be_bytes());
        bytes
    }
}

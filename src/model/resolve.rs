//! Two-pass name resolution and invariant checking
// (c) Bakelite Contributors

use std::collections::HashMap;

use crate::ast::{self, Decl, TypeExpr};
use crate::error::{SemanticError, SemanticResult, Span};

use super::types::{
    CrcKind, EnumId, EnumMember, EnumType, Field, Framing, Message, PrimitiveType, Protocol,
    Schema, StructId, StructType, WireType,
};

/// A top-level name, registered during pass 1
#[derive(Debug, Clone, Copy)]
enum Symbol {
    Enum(EnumId),
    Struct(StructId),
}

/// Resolves a parsed file into a validated [`Schema`].
///
/// # Errors
/// Returns the first [`SemanticError`] encountered; analysis does not continue past it.
pub fn resolve(file: &ast::File) -> SemanticResult<Schema> {
    let mut symbols: HashMap<String, Symbol> = HashMap::new();
    let mut enum_decls = Vec::new();
    let mut struct_decls = Vec::new();
    let mut protocol_decls = Vec::new();

    // Pass 1: register every top-level name.
    for decl in &file.decls {
        match decl {
            Decl::Enum(e) => {
                register(&mut symbols, &e.name, e.span, Symbol::Enum(EnumId(enum_decls.len())))?;
                enum_decls.push(e);
            }
            Decl::Struct(s) => {
                register(
                    &mut symbols,
                    &s.name,
                    s.span,
                    Symbol::Struct(StructId(struct_decls.len())),
                )?;
                struct_decls.push(s);
            }
            Decl::Protocol(p) => protocol_decls.push(p),
        }
    }

    // Pass 2a: resolve enums (no forward dependency on structs).
    let mut enums = Vec::with_capacity(enum_decls.len());
    for e in &enum_decls {
        enums.push(resolve_enum(e)?);
    }

    // Pass 2b: resolve struct field types (shapes only; struct max_size filled in below).
    let mut structs = Vec::with_capacity(struct_decls.len());
    for s in &struct_decls {
        let mut fields = Vec::with_capacity(s.fields.len());
        for f in &s.fields {
            let ty = resolve_type_expr(&f.type_expr, &symbols, f.span)?;
            fields.push(Field {
                name: f.name.clone(),
                ty,
                span: f.span,
            });
        }
        structs.push(StructType {
            name: s.name.clone(),
            fields,
            span: s.span,
            max_size: 0,
        });
    }

    check_acyclic(&structs)?;
    compute_struct_sizes(&mut structs, &enums);

    // Pass 3: protocol blocks, now that struct sizes are known.
    let mut protocols = Vec::with_capacity(protocol_decls.len());
    for p in &protocol_decls {
        protocols.push(resolve_protocol(p, &symbols, &structs)?);
    }

    Ok(Schema {
        enums,
        structs,
        protocols,
    })
}

fn register(
    symbols: &mut HashMap<String, Symbol>,
    name: &str,
    span: Span,
    symbol: Symbol,
) -> SemanticResult<()> {
    if symbols.contains_key(name) {
        return Err(SemanticError::DuplicateDeclaration {
            span,
            name: name.to_string(),
        });
    }
    symbols.insert(name.to_string(), symbol);
    Ok(())
}

fn resolve_enum(decl: &ast::EnumDecl) -> SemanticResult<EnumType> {
    let underlying = PrimitiveType::from_name(&decl.underlying).ok_or_else(|| {
        SemanticError::UnresolvedReference {
            span: decl.span,
            name: decl.underlying.clone(),
        }
    })?;
    if !underlying.is_integer() {
        return Err(SemanticError::UnresolvedReference {
            span: decl.span,
            name: decl.underlying.clone(),
        });
    }
    let (lo, hi) = underlying.range();
    let mut members = Vec::with_capacity(decl.members.len());
    let mut seen = HashMap::new();
    for m in &decl.members {
        if m.value < lo || m.value > hi {
            return Err(SemanticError::EnumValueOutOfRange {
                span: m.span,
                value: m.value,
                underlying: decl.underlying.clone(),
            });
        }
        if seen.insert(m.value, &m.name).is_some() {
            return Err(SemanticError::DuplicateEnumValue {
                span: m.span,
                enum_name: decl.name.clone(),
                value: m.value,
            });
        }
        members.push(EnumMember {
            name: m.name.clone(),
            value: m.value,
        });
    }
    Ok(EnumType {
        name: decl.name.clone(),
        underlying,
        members,
        span: decl.span,
    })
}

fn resolve_type_expr(
    expr: &TypeExpr,
    symbols: &HashMap<String, Symbol>,
    span: Span,
) -> SemanticResult<WireType> {
    match expr {
        TypeExpr::Named(name) => {
            if let Some(prim) = PrimitiveType::from_name(name) {
                return Ok(WireType::Primitive(prim));
            }
            match symbols.get(name) {
                Some(Symbol::Enum(id)) => Ok(WireType::Enum(*id)),
                Some(Symbol::Struct(id)) => Ok(WireType::Struct(*id)),
                None => Err(SemanticError::UnresolvedReference {
                    span,
                    name: name.clone(),
                }),
            }
        }
        TypeExpr::Bytes { capacity, array_len } => {
            check_capacity(*capacity, span)?;
            let inner = WireType::Bytes { capacity: *capacity };
            wrap_array(inner, *array_len, span)
        }
        TypeExpr::StringT { capacity, array_len } => {
            check_capacity(*capacity, span)?;
            let inner = WireType::StringT { capacity: *capacity };
            wrap_array(inner, *array_len, span)
        }
        TypeExpr::Array { element, len } => {
            check_capacity(*len, span)?;
            let element = resolve_type_expr(element, symbols, span)?;
            Ok(WireType::Array {
                element: Box::new(element),
                len: *len,
            })
        }
    }
}

fn wrap_array(inner: WireType, array_len: Option<u32>, span: Span) -> SemanticResult<WireType> {
    match array_len {
        Some(len) => {
            check_capacity(len, span)?;
            Ok(WireType::Array {
                element: Box::new(inner),
                len,
            })
        }
        None => Ok(inner),
    }
}

fn check_capacity(capacity: u32, span: Span) -> SemanticResult<()> {
    if capacity > 255 {
        Err(SemanticError::CapacityOverflow { span, capacity })
    } else {
        Ok(())
    }
}

/// Collects the struct ids a field type directly or transitively (through arrays) embeds
fn referenced_structs(ty: &WireType, out: &mut Vec<StructId>) {
    match ty {
        WireType::Struct(id) => out.push(*id),
        WireType::Array { element, .. } => referenced_structs(element, out),
        WireType::Primitive(_) | WireType::Enum(_) | WireType::Bytes { .. } | WireType::StringT { .. } => {}
    }
}

fn check_acyclic(structs: &[StructType]) -> SemanticResult<()> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }
    let mut marks = vec![Mark::Unvisited; structs.len()];
    let mut stack = Vec::new();

    fn visit(
        id: usize,
        structs: &[StructType],
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
    ) -> SemanticResult<()> {
        match marks[id] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let start = stack.iter().position(|&s| s == id).unwrap_or(0);
                let mut names: Vec<&str> = stack[start..].iter().map(|&i| structs[i].name.as_str()).collect();
                names.push(structs[id].name.as_str());
                return Err(SemanticError::CyclicAggregate {
                    span: structs[id].span,
                    name: structs[id].name.clone(),
                    cycle: names.join(" -> "),
                });
            }
            Mark::Unvisited => {}
        }
        marks[id] = Mark::InProgress;
        stack.push(id);
        let mut deps = Vec::new();
        for field in &structs[id].fields {
            referenced_structs(&field.ty, &mut deps);
        }
        for dep in deps {
            visit(dep.0, structs, marks, stack)?;
        }
        stack.pop();
        marks[id] = Mark::Done;
        Ok(())
    }

    for id in 0..structs.len() {
        visit(id, structs, &mut marks, &mut stack)?;
    }
    Ok(())
}

/// Fills in every struct's `max_size` in dependency order. Safe to call only once
/// [`check_acyclic`] has confirmed there are no cycles.
fn compute_struct_sizes(structs: &mut [StructType], enums: &[EnumType]) {
    let mut done = vec![false; structs.len()];
    let mut order = Vec::with_capacity(structs.len());

    fn visit(id: usize, structs: &[StructType], done: &mut [bool], order: &mut Vec<usize>) {
        if done[id] {
            return;
        }
        done[id] = true;
        let mut deps = Vec::new();
        for field in &structs[id].fields {
            referenced_structs(&field.ty, &mut deps);
        }
        for dep in deps {
            visit(dep.0, structs, done, order);
        }
        order.push(id);
    }

    for id in 0..structs.len() {
        visit(id, structs, &mut done, &mut order);
    }

    for id in order {
        let size = {
            let schema_view = PartialSchema { enums, structs };
            structs[id]
                .fields
                .iter()
                .map(|f| schema_view.wire_type_max_size(&f.ty))
                .sum()
        };
        structs[id].max_size = size;
    }
}

/// A read-only view used while struct sizes are still being filled in, mirroring
/// [`Schema::wire_type_max_size`] without requiring a fully-built `Schema`.
struct PartialSchema<'a> {
    enums: &'a [EnumType],
    structs: &'a [StructType],
}

impl PartialSchema<'_> {
    fn wire_type_max_size(&self, ty: &WireType) -> u32 {
        match ty {
            WireType::Primitive(p) => p.width(),
            WireType::Enum(id) => self.enums[id.0].underlying.width(),
            WireType::Struct(id) => self.structs[id.0].max_size,
            WireType::Bytes { capacity } => 1 + capacity,
            WireType::StringT { capacity } => *capacity,
            WireType::Array { element, len } => 1 + len * self.wire_type_max_size(element),
        }
    }
}

fn resolve_protocol(
    decl: &ast::ProtocolDecl,
    symbols: &HashMap<String, Symbol>,
    structs: &[StructType],
) -> SemanticResult<Protocol> {
    let max_length = decl.max_length.map_or(255, |(v, _)| v);
    let framing = decl
        .framing
        .as_ref()
        .map_or(Framing::default(), |(s, _)| Framing::from_name(s));
    let crc = decl
        .crc
        .as_ref()
        .map_or(CrcKind::default(), |(s, _)| CrcKind::from_name(s));

    let mut messages = Vec::with_capacity(decl.messages.len());
    let mut seen_ids: HashMap<u8, String> = HashMap::new();
    for assignment in &decl.messages {
        if assignment.id == 0 {
            return Err(SemanticError::ReservedMessageId {
                span: assignment.span,
            });
        }
        let id = u8::try_from(assignment.id).map_err(|_| SemanticError::CapacityOverflow {
            span: assignment.span,
            capacity: assignment.id,
        })?;
        let struct_id = match symbols.get(&assignment.name) {
            Some(Symbol::Struct(id)) => *id,
            _ => {
                return Err(SemanticError::MessageNotAStruct {
                    span: assignment.span,
                    name: assignment.name.clone(),
                });
            }
        };
        if let Some(other) = seen_ids.insert(id, assignment.name.clone()) {
            return Err(SemanticError::DuplicateMessageId {
                span: assignment.span,
                id,
                other,
            });
        }

        let payload_size = structs[struct_id.0].max_size;
        let total = 1 + payload_size + crc.width();
        if total > max_length {
            return Err(SemanticError::MessageTooLarge {
                span: assignment.span,
                name: assignment.name.clone(),
                size: 1 + payload_size,
                crc_width: crc.width(),
                max_length,
            });
        }

        messages.push(Message {
            id,
            struct_id,
            name: assignment.name.clone(),
            span: assignment.span,
        });
    }

    Ok(Protocol {
        name: decl.name.clone(),
        max_length,
        framing,
        crc,
        messages,
        span: decl.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn schema(src: &str) -> Schema {
        resolve(&parse(src).unwrap()).unwrap()
    }

    #[test]
    fn resolves_ack_protocol() {
        let src = "struct Ack {\n  code: uint8\n}\nprotocol P {\n  max_length = 64\n  framing = COBS\n  crc = CRC8\n  message Ack = 2\n}\n";
        let s = schema(src);
        assert_eq!(s.structs[0].max_size, 1);
        assert_eq!(s.protocols[0].messages[0].id, 2);
        assert_eq!(s.protocols[0].crc, CrcKind::Crc8);
    }

    #[test]
    fn rejects_unresolved_reference() {
        let src = "struct S {\n  a: Nope\n}\n";
        let err = resolve(&parse(src).unwrap()).unwrap_err();
        assert!(matches!(err, SemanticError::UnresolvedReference { .. }));
    }

    #[test]
    fn rejects_cyclic_struct() {
        let src = "struct A {\n  b: B\n}\nstruct B {\n  a: A\n}\n";
        let err = resolve(&parse(src).unwrap()).unwrap_err();
        assert!(matches!(err, SemanticError::CyclicAggregate { .. }));
    }

    #[test]
    fn rejects_capacity_over_255() {
        let src = "struct S {\n  a: bytes[256]\n}\n";
        let err = resolve(&parse(src).unwrap()).unwrap_err();
        assert!(matches!(err, SemanticError::CapacityOverflow { .. }));
    }

    #[test]
    fn rejects_duplicate_message_id() {
        let src = "struct A { x: uint8 }\nstruct B { y: uint8 }\nprotocol P {\n  max_length = 64\n  message A = 1\n  message B = 1\n}\n";
        let err = resolve(&parse(src).unwrap()).unwrap_err();
        assert!(matches!(err, SemanticError::DuplicateMessageId { .. }));
    }

    #[test]
    fn rejects_reserved_message_id_zero() {
        let src = "struct A { x: uint8 }\nprotocol P {\n  max_length = 64\n  message A = 0\n}\n";
        let err = resolve(&parse(src).unwrap()).unwrap_err();
        assert!(matches!(err, SemanticError::ReservedMessageId { .. }));
    }

    #[test]
    fn rejects_message_too_large() {
        let src = "struct Big { a: bytes[200] }\nprotocol P {\n  max_length = 8\n  crc = CRC8\n  message Big = 1\n}\n";
        let err = resolve(&parse(src).unwrap()).unwrap_err();
        assert!(matches!(err, SemanticError::MessageTooLarge { .. }));
    }

    #[test]
    fn computes_nested_struct_size() {
        let src = "struct Inner { a: uint8\n  b: uint16 }\nstruct Outer { i: Inner\n  arr: uint8[4] }\n";
        let s = schema(src);
        let inner = s.structs.iter().find(|st| st.name == "Inner").unwrap();
        let outer = s.structs.iter().find(|st| st.name == "Outer").unwrap();
        assert_eq!(inner.max_size, 3);
        assert_eq!(outer.max_size, 3 + 1 + 4);
    }

    #[test]
    fn enum_value_out_of_range_is_rejected() {
        let src = "enum E : uint8 {\n  A = 300\n}\n";
        let err = resolve(&parse(src).unwrap()).unwrap_err();
        assert!(matches!(err, SemanticError::EnumValueOutOfRange { .. }));
    }
}

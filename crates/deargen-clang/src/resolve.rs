//! Classification of AST types into the [`TypeDescriptor`] taxonomy.

use crate::ast::{AstNode, AstType, CursorKind, NodeId, TranslationUnit, TypeKind};
use crate::types::{Primitive, TypeDescriptor, OPAQUE_CONTAINER};
use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::trace;

/// Fatal resolution failures; either one aborts the generation run.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum ResolveError {
    /// The type kind is outside the supported taxonomy.
    #[error("unknown type `{spelling}` ({kind:?}) at {location}")]
    #[diagnostic(
        code(deargen::resolve::unrecognized_type),
        help("add a taxonomy variant for this type kind or exclude the declaration")
    )]
    UnrecognizedType {
        kind: TypeKind,
        spelling: String,
        location: String,
    },

    /// A record or typedef type whose declaration is not reachable from the
    /// declaring cursor.
    #[error("no declaration for `{spelling}` reachable from `{cursor}` at {location}")]
    #[diagnostic(code(deargen::resolve::missing_definition))]
    MissingDefinition {
        spelling: String,
        cursor: String,
        location: String,
    },
}

/// A function, constructor or method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    /// Raw source spelling of the parameter type.
    pub spelling: String,
    pub ty: TypeDescriptor,
}

/// Resolves types against one translation unit.
///
/// Nothing is cached: each call builds a fresh descriptor.
pub struct TypeResolver<'tu> {
    tu: &'tu TranslationUnit,
}

impl<'tu> TypeResolver<'tu> {
    pub fn new(tu: &'tu TranslationUnit) -> Self {
        Self { tu }
    }

    /// Classify `ty`, declared by `cursor`.
    pub fn resolve(&self, ty: &AstType, cursor: NodeId) -> Result<TypeDescriptor, ResolveError> {
        let container_prefix = format!("{}<", OPAQUE_CONTAINER);
        if ty.unqualified_spelling().starts_with(&container_prefix) {
            return Ok(TypeDescriptor::OpaqueContainer);
        }

        let is_const = ty.is_const;
        let descriptor = match &ty.kind {
            TypeKind::Void => TypeDescriptor::primitive(Primitive::Void, is_const),
            TypeKind::Bool => TypeDescriptor::primitive(Primitive::Bool, is_const),
            TypeKind::CharS | TypeKind::SChar => {
                TypeDescriptor::primitive(Primitive::Int8, is_const)
            }
            TypeKind::Short => TypeDescriptor::primitive(Primitive::Int16, is_const),
            TypeKind::Int => TypeDescriptor::primitive(Primitive::Int32, is_const),
            TypeKind::LongLong => TypeDescriptor::primitive(Primitive::Int64, is_const),
            TypeKind::CharU | TypeKind::UChar => {
                TypeDescriptor::primitive(Primitive::UInt8, is_const)
            }
            TypeKind::UShort => TypeDescriptor::primitive(Primitive::UInt16, is_const),
            TypeKind::UInt => TypeDescriptor::primitive(Primitive::UInt32, is_const),
            TypeKind::ULongLong => TypeDescriptor::primitive(Primitive::UInt64, is_const),
            TypeKind::Float => TypeDescriptor::primitive(Primitive::Float, is_const),
            TypeKind::Double => TypeDescriptor::primitive(Primitive::Double, is_const),

            TypeKind::Pointer => {
                let pointee = self.inner(ty, cursor)?;
                if pointee.kind == TypeKind::FunctionProto {
                    // callback signatures are not modelled
                    TypeDescriptor::void_pointer(is_const)
                } else {
                    let base = self.resolve(pointee, cursor)?;
                    match base {
                        TypeDescriptor::Struct { .. } => TypeDescriptor::PointerToStruct {
                            base: Box::new(base),
                            is_const,
                        },
                        _ => TypeDescriptor::Pointer {
                            base: Box::new(base),
                            is_const,
                        },
                    }
                }
            }

            TypeKind::LValueReference => {
                let referent = self.inner(ty, cursor)?;
                TypeDescriptor::Reference {
                    base: Box::new(self.resolve(referent, cursor)?),
                    is_const,
                }
            }

            TypeKind::ConstantArray => {
                let element = self.inner(ty, cursor)?;
                TypeDescriptor::Array {
                    base: Box::new(self.resolve(element, cursor)?),
                    len: ty.array_size.unwrap_or_default(),
                    is_const,
                }
            }

            TypeKind::Typedef => self.resolve_typedef(ty, cursor)?,

            TypeKind::Record => {
                let decl = self
                    .tu
                    .type_ref(cursor)
                    .filter(|decl| {
                        matches!(decl.kind, CursorKind::StructDecl | CursorKind::ClassDecl)
                    })
                    .ok_or_else(|| self.missing_definition(ty, cursor))?;
                TypeDescriptor::Struct {
                    name: decl.spelling.clone(),
                    is_const,
                }
            }

            TypeKind::FunctionProto => TypeDescriptor::void_pointer(is_const),

            _ => {
                return Err(ResolveError::UnrecognizedType {
                    kind: ty.kind.clone(),
                    spelling: ty.spelling.clone(),
                    location: self.tu.node(cursor).location.to_string(),
                })
            }
        };

        trace!(spelling = %ty.spelling, resolved = %descriptor.c_type(), "resolved type");
        Ok(descriptor)
    }

    /// Collapse a typedef chain down to its base.
    ///
    /// Primitive and `void *` bases replace the alias; anything else keeps the
    /// first alias name around the collapsed base.
    fn resolve_typedef(
        &self,
        ty: &AstType,
        cursor: NodeId,
    ) -> Result<TypeDescriptor, ResolveError> {
        let mut alias: Option<String> = None;
        let mut seen = FxHashSet::default();
        let mut current_ty = ty.clone();
        let mut current_cursor = cursor;

        while current_ty.kind == TypeKind::Typedef {
            let decl = self
                .tu
                .type_ref(current_cursor)
                .filter(|decl| decl.kind == CursorKind::TypedefDecl)
                .ok_or_else(|| self.missing_definition(&current_ty, current_cursor))?;
            if !seen.insert(decl.id) {
                return Err(self.missing_definition(&current_ty, current_cursor));
            }
            let underlying = decl
                .underlying_type
                .clone()
                .ok_or_else(|| self.missing_definition(&current_ty, current_cursor))?;

            alias.get_or_insert_with(|| decl.spelling.clone());
            current_ty = underlying;
            current_cursor = decl.id;
        }

        let base = self.resolve(&current_ty, current_cursor)?;
        if base.is_primitive() || base.is_void_pointer() {
            return Ok(base);
        }
        Ok(TypeDescriptor::Typedef {
            name: alias.unwrap_or_else(|| ty.unqualified_spelling().to_string()),
            base: Box::new(base),
            is_const: ty.is_const,
        })
    }

    /// Resolve the declared type of a cursor (field, parameter).
    pub fn resolve_cursor(&self, cursor: NodeId) -> Result<TypeDescriptor, ResolveError> {
        let node = self.tu.node(cursor);
        let ty = node
            .ty
            .as_ref()
            .ok_or_else(|| self.untyped(node))?;
        self.resolve(ty, cursor)
    }

    /// Resolve the return type of a function or method cursor.
    pub fn function_result(&self, function: NodeId) -> Result<TypeDescriptor, ResolveError> {
        let node = self.tu.node(function);
        let ty = node
            .result_type
            .as_ref()
            .ok_or_else(|| self.untyped(node))?;
        self.resolve(ty, function)
    }

    /// Resolve every parameter of a function, constructor or method, in
    /// declaration order.
    pub fn function_params(&self, function: NodeId) -> Result<Vec<Param>, ResolveError> {
        self.tu
            .children_of_kind(function, CursorKind::ParmDecl)
            .map(|param| {
                Ok(Param {
                    name: param.spelling.clone(),
                    spelling: param
                        .ty
                        .as_ref()
                        .map(|t| t.spelling.clone())
                        .unwrap_or_default(),
                    ty: self.resolve_cursor(param.id)?,
                })
            })
            .collect()
    }

    fn inner<'a>(&self, ty: &'a AstType, cursor: NodeId) -> Result<&'a AstType, ResolveError> {
        ty.inner.as_deref().ok_or_else(|| ResolveError::UnrecognizedType {
            kind: ty.kind.clone(),
            spelling: ty.spelling.clone(),
            location: self.tu.node(cursor).location.to_string(),
        })
    }

    fn missing_definition(&self, ty: &AstType, cursor: NodeId) -> ResolveError {
        let node = self.tu.node(cursor);
        ResolveError::MissingDefinition {
            spelling: ty.spelling.clone(),
            cursor: node.spelling.clone(),
            location: node.location.to_string(),
        }
    }

    fn untyped(&self, node: &AstNode) -> ResolveError {
        ResolveError::UnrecognizedType {
            kind: TypeKind::Other("<untyped>".to_string()),
            spelling: node.spelling.clone(),
            location: node.location.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `struct ImVec2 { float x, y; };` plus a cursor referencing it.
    fn with_vec2() -> (TranslationUnit, NodeId) {
        let mut tu = TranslationUnit::new();
        let vec2 = tu.add_child(NodeId::ROOT, CursorKind::StructDecl, "ImVec2");
        tu.node_mut(vec2).definition = Some(vec2);
        (tu, vec2)
    }

    fn param_referencing(tu: &mut TranslationUnit, target: NodeId, ty: AstType) -> NodeId {
        let func = tu.add_child(NodeId::ROOT, CursorKind::FunctionDecl, "f");
        let param = tu.add_child(func, CursorKind::ParmDecl, "p");
        tu.node_mut(param).ty = Some(ty);
        let r = tu.add_child(param, CursorKind::TypeRef, "");
        tu.node_mut(r).referenced = Some(target);
        param
    }

    #[test]
    fn test_const_struct_pointer() {
        let (mut tu, vec2) = with_vec2();
        let ty = AstType::pointer_to(AstType::new(TypeKind::Record, "ImVec2").constant());
        let param = param_referencing(&mut tu, vec2, ty);

        let resolved = TypeResolver::new(&tu).resolve_cursor(param).unwrap();
        assert_eq!(
            resolved,
            TypeDescriptor::PointerToStruct {
                base: Box::new(TypeDescriptor::Struct {
                    name: "ImVec2".to_string(),
                    is_const: true,
                }),
                is_const: false,
            }
        );
    }

    #[test]
    fn test_typedef_to_primitive_drops_alias() {
        let mut tu = TranslationUnit::new();
        let id = tu.add_child(NodeId::ROOT, CursorKind::TypedefDecl, "ImGuiID");
        tu.node_mut(id).underlying_type = Some(AstType::builtin(TypeKind::UInt));
        let param = param_referencing(&mut tu, id, AstType::new(TypeKind::Typedef, "ImGuiID"));

        let resolved = TypeResolver::new(&tu).resolve_cursor(param).unwrap();
        assert_eq!(resolved, TypeDescriptor::primitive(Primitive::UInt32, false));
    }

    #[test]
    fn test_typedef_chain_collapses() {
        // typedef unsigned short ImWchar16; typedef ImWchar16 ImWchar;
        let mut tu = TranslationUnit::new();
        let wchar16 = tu.add_child(NodeId::ROOT, CursorKind::TypedefDecl, "ImWchar16");
        tu.node_mut(wchar16).underlying_type = Some(AstType::builtin(TypeKind::UShort));
        let wchar = tu.add_child(NodeId::ROOT, CursorKind::TypedefDecl, "ImWchar");
        tu.node_mut(wchar).underlying_type = Some(AstType::new(TypeKind::Typedef, "ImWchar16"));
        let r = tu.add_child(wchar, CursorKind::TypeRef, "ImWchar16");
        tu.node_mut(r).referenced = Some(wchar16);
        let param = param_referencing(&mut tu, wchar, AstType::new(TypeKind::Typedef, "ImWchar"));

        let resolved = TypeResolver::new(&tu).resolve_cursor(param).unwrap();
        assert_eq!(resolved, TypeDescriptor::primitive(Primitive::UInt16, false));
        assert!(resolved.depth() < 3);
    }

    #[test]
    fn test_typedef_to_struct_keeps_alias() {
        let (mut tu, vec2) = with_vec2();
        let alias = tu.add_child(NodeId::ROOT, CursorKind::TypedefDecl, "Point");
        tu.node_mut(alias).underlying_type = Some(AstType::new(TypeKind::Record, "ImVec2"));
        let r = tu.add_child(alias, CursorKind::TypeRef, "struct ImVec2");
        tu.node_mut(r).referenced = Some(vec2);
        let param = param_referencing(&mut tu, alias, AstType::new(TypeKind::Typedef, "Point"));

        let resolved = TypeResolver::new(&tu).resolve_cursor(param).unwrap();
        assert_eq!(
            resolved,
            TypeDescriptor::Typedef {
                name: "Point".to_string(),
                base: Box::new(TypeDescriptor::Struct {
                    name: "ImVec2".to_string(),
                    is_const: false,
                }),
                is_const: false,
            }
        );
    }

    #[test]
    fn test_function_pointer_typedef_collapses_to_void_pointer() {
        let mut tu = TranslationUnit::new();
        let cb = tu.add_child(NodeId::ROOT, CursorKind::TypedefDecl, "ImGuiSizeCallback");
        tu.node_mut(cb).underlying_type = Some(AstType::pointer_to(AstType::new(
            TypeKind::FunctionProto,
            "void (ImGuiSizeCallbackData *)",
        )));
        let param = param_referencing(
            &mut tu,
            cb,
            AstType::new(TypeKind::Typedef, "ImGuiSizeCallback"),
        );

        let resolved = TypeResolver::new(&tu).resolve_cursor(param).unwrap();
        assert!(resolved.is_void_pointer());
    }

    #[test]
    fn test_self_referencing_typedef_is_rejected() {
        let mut tu = TranslationUnit::new();
        let a = tu.add_child(NodeId::ROOT, CursorKind::TypedefDecl, "A");
        tu.node_mut(a).underlying_type = Some(AstType::new(TypeKind::Typedef, "A"));
        let r = tu.add_child(a, CursorKind::TypeRef, "A");
        tu.node_mut(r).referenced = Some(a);
        let param = param_referencing(&mut tu, a, AstType::new(TypeKind::Typedef, "A"));

        let err = TypeResolver::new(&tu).resolve_cursor(param).unwrap_err();
        assert!(matches!(err, ResolveError::MissingDefinition { .. }));
    }

    #[test]
    fn test_container_short_circuits() {
        let mut tu = TranslationUnit::new();
        let field = tu.add_child(NodeId::ROOT, CursorKind::FieldDecl, "CmdBuffer");
        tu.node_mut(field).ty = Some(AstType::new(TypeKind::Record, "ImVector<ImDrawCmd>"));

        let resolved = TypeResolver::new(&tu).resolve_cursor(field).unwrap();
        assert_eq!(resolved, TypeDescriptor::OpaqueContainer);
    }

    #[test]
    fn test_record_without_reference_is_fatal() {
        let mut tu = TranslationUnit::new();
        let field = tu.add_child(NodeId::ROOT, CursorKind::FieldDecl, "Pos");
        tu.node_mut(field).ty = Some(AstType::new(TypeKind::Record, "ImVec2"));

        let err = TypeResolver::new(&tu).resolve_cursor(field).unwrap_err();
        assert!(matches!(err, ResolveError::MissingDefinition { .. }));
    }

    #[test]
    fn test_unknown_kind_is_fatal() {
        let mut tu = TranslationUnit::new();
        let field = tu.add_child(NodeId::ROOT, CursorKind::FieldDecl, "w");
        tu.node_mut(field).ty = Some(AstType::builtin(TypeKind::Long));

        let err = TypeResolver::new(&tu).resolve_cursor(field).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnrecognizedType { kind: TypeKind::Long, .. }
        ));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (mut tu, vec2) = with_vec2();
        let ty = AstType::lvalue_ref_to(AstType::new(TypeKind::Record, "ImVec2").constant());
        let param = param_referencing(&mut tu, vec2, ty);

        let resolver = TypeResolver::new(&tu);
        assert_eq!(
            resolver.resolve_cursor(param).unwrap(),
            resolver.resolve_cursor(param).unwrap()
        );
    }

    #[test]
    fn test_array_of_primitives() {
        let mut tu = TranslationUnit::new();
        let field = tu.add_child(NodeId::ROOT, CursorKind::FieldDecl, "MouseDown");
        tu.node_mut(field).ty = Some(AstType::array_of(AstType::builtin(TypeKind::Bool), 5));

        let resolved = TypeResolver::new(&tu).resolve_cursor(field).unwrap();
        assert_eq!(resolved.c_type_with_name("MouseDown"), "bool MouseDown[5]");
    }
}

//! Structs, classes and class templates.

use crate::filters::{is_anonymous, sanitize_identifier, type_name};
use crate::function::{pxd_constructor, pxd_method, Signature};
use crate::wrap_flags::WrapTable;
use crate::writer::{PxdWriter, PyxWriter};
use crate::{EmitContext, GeneratorOptions};
use deargen_clang::{
    AccessSpecifier, AstNode, CursorKind, NodeId, ResolveError, StructDecl, TranslationUnit,
    TypedefOrStruct,
};
use rustc_hash::FxHashSet;
use tracing::debug;

/// How a record is declared on the declaration surface.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RecordForm {
    Struct,
    CppClass,
    /// Class template with its type parameter names.
    Template(Vec<String>),
}

fn record_form(ctx: &EmitContext<'_>, cursor: NodeId) -> RecordForm {
    let tu = ctx.tu;
    let node = tu.node(cursor);
    if node.kind == CursorKind::ClassTemplate {
        let mut params: Vec<String> = tu
            .children_of_kind(cursor, CursorKind::TemplateTypeParameter)
            .map(|p| p.spelling.clone())
            .filter(|p| !p.is_empty())
            .collect();
        if params.is_empty() {
            params.push("T".to_string());
        }
        return RecordForm::Template(params);
    }

    let declares_constructor =
        |id: NodeId| tu.children_of_kind(id, CursorKind::Constructor).next().is_some();
    if declares_constructor(cursor) || node.definition.map_or(false, declares_constructor) {
        RecordForm::CppClass
    } else {
        RecordForm::Struct
    }
}

fn is_public(node: &AstNode) -> bool {
    node.access == AccessSpecifier::Public
}

/// Methods that get declarations and wrappers.
fn exposed_methods<'a>(ctx: &EmitContext<'a>, name: &str, cursor: NodeId) -> Vec<&'a AstNode> {
    ctx.tu
        .children_of_kind(cursor, CursorKind::CxxMethod)
        .filter(|m| is_public(m) && !m.spelling.starts_with("operator"))
        .filter(|m| ctx.wrap.method_exposed(name, &m.spelling))
        .collect()
}

/// Name of the record, or `None` when it gets no entries at all.
fn emitted_name<'a>(
    wrap: &WrapTable,
    options: &GeneratorOptions,
    node: &'a AstNode,
) -> Option<&'a str> {
    let name = node.spelling.as_str();
    if is_anonymous(name) {
        debug!("skipping anonymous record");
        return None;
    }
    if wrap.is_skipped(name) || options.excludes.iter().any(|e| e == name) {
        debug!(name, "skipping record");
        return None;
    }
    Some(name)
}

/// Name of the `cdef class` generated for this sighting, if any.
fn wrapper_class<'a>(
    tu: &'a TranslationUnit,
    wrap: &WrapTable,
    options: &GeneratorOptions,
    cursor: NodeId,
) -> Option<&'a str> {
    let node = tu.node(cursor);
    let name = emitted_name(wrap, options, node)?;
    if node.kind == CursorKind::ClassTemplate {
        return None;
    }
    // the defining sighting gets the class
    if node.definition.is_some_and(|d| d != cursor) {
        return None;
    }
    Some(name)
}

/// Every struct that gets a `cdef class`; other structs are passed as
/// raw addresses.
pub(crate) fn wrapper_classes(
    tu: &TranslationUnit,
    entries: &[TypedefOrStruct],
    wrap: &WrapTable,
    options: &GeneratorOptions,
) -> FxHashSet<String> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            TypedefOrStruct::Struct(decl) => wrapper_class(tu, wrap, options, decl.cursor()),
            TypedefOrStruct::Typedef(_) => None,
        })
        .map(str::to_string)
        .collect()
}

pub(crate) fn write_pxd(
    ctx: &EmitContext<'_>,
    pxd: &mut PxdWriter,
    decl: &StructDecl,
) -> Result<(), ResolveError> {
    let cursor = decl.cursor();
    let node = ctx.tu.node(cursor);
    let Some(name) = emitted_name(ctx.wrap, ctx.options, node) else {
        return Ok(());
    };

    let form = record_form(ctx, cursor);
    let mut body = Vec::new();

    if form == RecordForm::CppClass {
        for ctor in ctx
            .tu
            .children_of_kind(cursor, CursorKind::Constructor)
            .filter(|c| is_public(c))
        {
            body.push(pxd_constructor(ctx, name, ctor.id)?);
        }
    }

    for field in ctx.tu.children_of_kind(cursor, CursorKind::FieldDecl) {
        if field.spelling.is_empty() {
            continue;
        }
        let spelling = field.ty.as_ref().map(|t| t.spelling.as_str()).unwrap_or_default();
        let declared = sanitize_identifier(&field.spelling);
        let mut line = type_name(&ctx.filter.pxd(spelling), &declared);
        if declared != field.spelling {
            line.push_str(&format!(" \"{}\"", field.spelling));
        }
        body.push(line);
    }

    if form == RecordForm::CppClass {
        for method in exposed_methods(ctx, name, cursor) {
            let signature = Signature::resolve(ctx, method.id)?;
            body.extend(pxd_method(ctx, &signature));
        }
    }

    let head = match &form {
        RecordForm::Template(params) => format!("cppclass {}[{}]", name, params.join(", ")),
        RecordForm::CppClass => format!("cppclass {}", name),
        RecordForm::Struct => format!("struct {}", name),
    };

    let header = ctx.header_of(&decl.path);
    let namespace = decl.path.namespace(ctx.tu);
    let w = pxd.enter(&header, namespace.as_deref());
    if body.is_empty() {
        w.writeln(&head);
    } else {
        w.writeln(&format!("{}:", head));
        w.indent();
        w.write_lines(&body);
        w.dedent();
    }
    w.blank();
    Ok(())
}

pub(crate) fn write_pyx(
    ctx: &EmitContext<'_>,
    pyx: &mut PyxWriter,
    decl: &StructDecl,
) -> Result<(), ResolveError> {
    let cursor = decl.cursor();
    let Some(name) = wrapper_class(ctx.tu, ctx.wrap, ctx.options, cursor) else {
        return Ok(());
    };

    let native = ctx.filter.pyx(name);
    let w = pyx.writer();
    w.writeln(&format!("cdef class {}:", name));
    w.indent();
    w.writeln(&format!("cdef {} *_ptr", native));
    w.blank();
    w.writeln("@staticmethod");
    w.writeln(&format!("cdef from_ptr({} *ptr):", native));
    w.indent();
    w.writeln("if ptr == NULL:");
    w.writeln("    return None");
    w.writeln(&format!("cdef {} instance = {}.__new__({})", name, name, name));
    w.writeln("instance._ptr = ptr");
    w.writeln("return instance");
    w.dedent();
    w.blank();

    if ctx.wrap.fields_exposed(name) {
        for field in ctx
            .tu
            .children_of_kind(cursor, CursorKind::FieldDecl)
            .filter(|f| is_public(f) && !f.spelling.is_empty())
        {
            let ty = ctx.resolver.resolve_cursor(field.id)?;
            let declared = sanitize_identifier(&field.spelling);
            w.writeln("@property");
            w.writeln(&format!("def {}(self) -> {}:", declared, ty.field_typing(&ctx.filter)));
            w.indent();
            let lvalue = format!("self._ptr.{}", declared);
            w.writeln(&format!("return {}", ty.to_py(&ctx.filter, &lvalue)));
            w.dedent();
            w.blank();
        }
    }

    if record_form(ctx, cursor) == RecordForm::CppClass {
        for method in exposed_methods(ctx, name, cursor) {
            let signature = Signature::resolve(ctx, method.id)?;
            if signature.is_static || signature.is_variadic {
                debug!(method = %signature.name, "no wrapper");
                continue;
            }
            let target = format!("self._ptr.{}", signature.name);
            signature.write_pyx(ctx, w, &target, true);
        }
    }

    for custom in ctx.wrap.custom_methods(name) {
        w.write_block(custom);
        w.blank();
    }

    w.dedent();
    w.blank();
    Ok(())
}

//! Free functions, constructors and methods.

use crate::filters::{param_names, type_name};
use crate::writer::{CodeWriter, PxdWriter, PyxWriter};
use crate::EmitContext;
use deargen_clang::{FunctionDecl, NodeId, Param, ResolveError, TypeDescriptor, OPAQUE_CONTAINER};
use tracing::debug;

/// A resolved callable.
pub(crate) struct Signature {
    pub name: String,
    pub result: TypeDescriptor,
    pub params: Vec<Param>,
    /// Host-side parameter names, sanitized.
    pub names: Vec<String>,
    pub is_variadic: bool,
    pub is_static: bool,
}

impl Signature {
    pub fn resolve(ctx: &EmitContext<'_>, cursor: NodeId) -> Result<Self, ResolveError> {
        let node = ctx.tu.node(cursor);
        let result = ctx.resolver.function_result(cursor)?;
        let params = ctx.resolver.function_params(cursor)?;
        let names = param_names(params.iter().map(|p| p.name.as_str()));
        Ok(Self {
            name: node.spelling.clone(),
            result,
            params,
            names,
            is_variadic: node.is_variadic,
            is_static: node.is_static,
        })
    }

    /// `(float x, const char *label, ...)`
    pub fn pxd_params(&self, ctx: &EmitContext<'_>) -> String {
        let mut params: Vec<String> = self
            .params
            .iter()
            .zip(&self.names)
            .map(|(param, name)| {
                // the erased container keeps its template argument on this surface
                if param.spelling.contains(OPAQUE_CONTAINER) {
                    type_name(&ctx.filter.pxd(&param.spelling), name)
                } else {
                    param.ty.c_type_with_name(name)
                }
            })
            .collect();
        if self.is_variadic {
            params.push("...".to_string());
        }
        format!("({})", params.join(", "))
    }

    /// `RESULT NAME(PARAMS)`
    pub fn pxd_declaration(&self, ctx: &EmitContext<'_>) -> String {
        format!("{} {}{}", self.result.c_type(), self.name, self.pxd_params(ctx))
    }

    /// `def NAME(params) -> typing:`
    pub fn pyx_header(&self, ctx: &EmitContext<'_>, with_self: bool) -> String {
        let mut params = Vec::new();
        if with_self {
            params.push("self".to_string());
        }
        for (param, name) in self.params.iter().zip(&self.names) {
            match ctx.wrap.value_type(&param.ty) {
                Some(value) => params.push(format!("{}: {}", name, value.param_typing())),
                None => params.push(param.ty.param(&ctx.filter, name)),
            }
        }
        format!(
            "def {}({}) -> {}:",
            self.name,
            params.join(", "),
            self.result_typing(ctx)
        )
    }

    fn result_typing(&self, ctx: &EmitContext<'_>) -> String {
        match self.by_value_result(ctx) {
            Some(value) => value.typing(),
            None => self.result.result_typing(&ctx.filter),
        }
    }

    fn by_value_result(&self, ctx: &EmitContext<'_>) -> Option<&'static crate::ValueType> {
        match self.result {
            TypeDescriptor::Struct { .. } => ctx.wrap.value_type(&self.result),
            _ => None,
        }
    }

    /// Conversion statements, the native call through `target`, and the
    /// returned host value.
    pub fn pyx_body(&self, ctx: &EmitContext<'_>, target: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut args = Vec::new();
        for (i, (param, name)) in self.params.iter().zip(&self.names).enumerate() {
            match ctx.wrap.value_type(&param.ty) {
                Some(value) => {
                    let native = ctx.filter.pyx(value.name);
                    lines.push(format!(
                        "cdef {} p{} = {}",
                        native,
                        i,
                        value.from_host(&native, name)
                    ));
                    args.push(format!("p{}", i));
                }
                None => {
                    lines.extend(param.ty.cdef_param(&ctx.filter, i, name));
                    args.push(param.ty.call_arg(i));
                }
            }
        }

        let call = format!("{}({})", target, args.join(", "));
        match self.by_value_result(ctx) {
            Some(value) => {
                lines.push(format!("cdef {} value = {}", ctx.filter.pyx(value.name), call));
                lines.push(format!("return {}", value.to_host("value")));
            }
            None => lines.extend(self.result.cdef_result(&ctx.filter, &call)),
        }
        lines
    }

    /// Python-side wrapper: header plus indented body.
    pub fn write_pyx(&self, ctx: &EmitContext<'_>, w: &mut CodeWriter, target: &str, with_self: bool) {
        w.writeln(&self.pyx_header(ctx, with_self));
        w.indent();
        w.write_lines(self.pyx_body(ctx, target));
        w.dedent();
        w.blank();
    }
}

/// Whether a free function is dropped because of its return type.
fn excluded_by_result(ctx: &EmitContext<'_>, cursor: NodeId) -> bool {
    let spelling = ctx
        .tu
        .node(cursor)
        .result_type
        .as_ref()
        .map(|t| t.spelling.as_str())
        .unwrap_or_default();
    ctx.is_excluded(spelling) || ctx.is_excluded(spelling.trim_start_matches("const "))
}

/// Resolve a free function, or `None` when it is excluded.
pub(crate) fn resolve_function(
    ctx: &EmitContext<'_>,
    decl: &FunctionDecl,
) -> Result<Option<Signature>, ResolveError> {
    let cursor = decl.cursor();
    if excluded_by_result(ctx, cursor) {
        debug!(function = %ctx.tu.node(cursor).spelling, "excluded by return spelling");
        return Ok(None);
    }
    let signature = Signature::resolve(ctx, cursor)?;
    if ctx.is_excluded(&signature.result.name()) || ctx.is_excluded(&signature.result.c_type()) {
        debug!(function = %signature.name, "excluded by return type");
        return Ok(None);
    }
    Ok(Some(signature))
}

pub(crate) fn write_pxd_function(
    ctx: &EmitContext<'_>,
    pxd: &mut PxdWriter,
    decl: &FunctionDecl,
    signature: &Signature,
) {
    let header = ctx.header_of(&decl.path);
    let namespace = decl.path.namespace(ctx.tu);
    pxd.enter(&header, namespace.as_deref())
        .writeln(&signature.pxd_declaration(ctx));
}

pub(crate) fn write_pyx_function(ctx: &EmitContext<'_>, pyx: &mut PyxWriter, signature: &Signature) {
    if signature.is_variadic {
        debug!(function = %signature.name, "variadic, no wrapper");
        return;
    }
    let target = format!("{}.{}", ctx.options.module, signature.name);
    signature.write_pyx(ctx, pyx.writer(), &target, false);
}

/// `NAME(PARAMS)` inside a `cppclass` body.
pub(crate) fn pxd_constructor(
    ctx: &EmitContext<'_>,
    class_name: &str,
    constructor: NodeId,
) -> Result<String, ResolveError> {
    let params = ctx.resolver.function_params(constructor)?;
    let names = param_names(params.iter().map(|p| p.name.as_str()));
    let rendered: Vec<String> = params
        .iter()
        .zip(&names)
        .map(|(param, name)| param.ty.c_type_with_name(name))
        .collect();
    Ok(format!("{}({})", class_name, rendered.join(", ")))
}

/// Method declaration lines (a static method is preceded by its decorator).
pub(crate) fn pxd_method(ctx: &EmitContext<'_>, signature: &Signature) -> Vec<String> {
    let mut lines = Vec::new();
    if signature.is_static {
        lines.push("@staticmethod".to_string());
    }
    lines.push(signature.pxd_declaration(ctx));
    lines
}

//! Enumerations.

use crate::filters::{is_anonymous, sanitize_identifier};
use crate::writer::{PxdWriter, PyxWriter};
use crate::EmitContext;
use deargen_clang::{AstNode, CursorKind, EnumDecl};
use tracing::debug;

fn constants<'a>(ctx: &EmitContext<'a>, decl: &EnumDecl) -> Vec<&'a AstNode> {
    ctx.tu
        .children_of_kind(decl.cursor(), CursorKind::EnumConstantDecl)
        .collect()
}

/// `ImGuiWindowFlags_NoTitleBar` in `ImGuiWindowFlags_` becomes `NoTitleBar`.
pub(crate) fn host_constant_name(enum_name: &str, constant: &str) -> String {
    let stem = enum_name.trim_end_matches('_');
    let stripped = constant
        .strip_prefix(stem)
        .map(|rest| rest.trim_start_matches('_'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(constant);
    sanitize_identifier(stripped)
}

pub(crate) fn write_pxd(ctx: &EmitContext<'_>, pxd: &mut PxdWriter, decl: &EnumDecl) {
    let node = ctx.tu.node(decl.cursor());
    if ctx.is_excluded(&node.spelling) {
        return;
    }
    let constants = constants(ctx, decl);
    if constants.is_empty() {
        debug!(name = %node.spelling, "enum without constants");
        return;
    }

    let header = ctx.header_of(&decl.path);
    let namespace = decl.path.namespace(ctx.tu);
    let w = pxd.enter(&header, namespace.as_deref());
    if is_anonymous(&node.spelling) {
        w.writeln("enum:");
    } else {
        w.writeln(&format!("ctypedef enum {}:", node.spelling));
    }
    w.indent();
    for constant in constants {
        w.writeln(&constant.spelling);
    }
    w.dedent();
    w.blank();
}

pub(crate) fn write_pyx(ctx: &EmitContext<'_>, pyx: &mut PyxWriter, decl: &EnumDecl) {
    let node = ctx.tu.node(decl.cursor());
    if is_anonymous(&node.spelling) || ctx.is_excluded(&node.spelling) {
        return;
    }
    let constants = constants(ctx, decl);
    if constants.is_empty() {
        return;
    }

    let w = pyx.writer();
    w.writeln(&format!(
        "class {}(IntEnum):",
        node.spelling.trim_end_matches('_')
    ));
    w.indent();
    for constant in constants {
        w.writeln(&format!(
            "{} = {}",
            host_constant_name(&node.spelling, &constant.spelling),
            constant.enum_value.unwrap_or_default()
        ));
    }
    w.dedent();
    w.blank();
    w.blank();
}

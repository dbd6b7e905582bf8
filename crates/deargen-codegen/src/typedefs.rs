//! Type aliases. These only appear on the declaration surface.

use crate::filters::{is_anonymous, type_name};
use crate::writer::PxdWriter;
use crate::EmitContext;
use deargen_clang::TypedefDecl;
use tracing::debug;

/// Spelling without an elaborated-type keyword (`struct ImFont` is `ImFont`).
fn strip_elaboration(spelling: &str) -> &str {
    ["struct ", "class ", "union ", "enum "]
        .iter()
        .find_map(|keyword| spelling.strip_prefix(keyword))
        .unwrap_or(spelling)
}

pub(crate) fn write_pxd(ctx: &EmitContext<'_>, pxd: &mut PxdWriter, decl: &TypedefDecl) {
    let node = ctx.tu.node(decl.cursor());
    let name = node.spelling.as_str();
    if ctx.is_excluded(name) {
        return;
    }
    let Some(underlying) = node.underlying_type.as_ref() else {
        return;
    };

    let spelling = strip_elaboration(&underlying.spelling);
    if spelling == name || is_anonymous(spelling) {
        debug!(name, "skipping self-named or anonymous typedef");
        return;
    }

    let header = ctx.header_of(&decl.path);
    let namespace = decl.path.namespace(ctx.tu);
    pxd.enter(&header, namespace.as_deref())
        .writeln(&format!("ctypedef {}", type_name(&ctx.filter.pxd(spelling), name)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_elaboration() {
        assert_eq!(strip_elaboration("struct ImGuiContext"), "ImGuiContext");
        assert_eq!(strip_elaboration("unsigned int"), "unsigned int");
    }
}

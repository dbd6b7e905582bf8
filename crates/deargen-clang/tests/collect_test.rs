//! Integration tests for header collection and type resolution.

use deargen_clang::{
    AstType, ClangParser, Collector, CursorKind, NodeId, Primitive, TranslationUnit,
    TypeDescriptor, TypeKind, TypeResolver,
};
use std::fs;
use std::path::PathBuf;

fn in_file(tu: &mut TranslationUnit, id: NodeId, file: &str) {
    tu.node_mut(id).location.file = Some(PathBuf::from(file));
}

/// N top-level functions come back complete and in source order.
#[test]
fn test_functions_in_source_order() {
    let mut tu = TranslationUnit::new();
    let ns = tu.add_child(NodeId::ROOT, CursorKind::Namespace, "ImGui");
    in_file(&mut tu, ns, "imgui.h");
    let names = ["CreateContext", "NewFrame", "Render", "EndFrame", "GetIO"];
    let mut ids = Vec::new();
    for name in names {
        let id = tu.add_child(ns, CursorKind::FunctionDecl, name);
        in_file(&mut tu, id, "imgui.h");
        ids.push(id);
    }

    let decls = Collector::new(&[PathBuf::from("imgui.h")]).traverse(&tu);
    let collected: Vec<_> = decls.functions.iter().map(|f| f.cursor()).collect();
    assert_eq!(collected, ids);
}

#[test]
fn test_foreign_header_declarations_are_skipped() {
    let mut tu = TranslationUnit::new();
    let ours = tu.add_child(NodeId::ROOT, CursorKind::StructDecl, "ImVec2");
    let theirs = tu.add_child(NodeId::ROOT, CursorKind::StructDecl, "Other");
    let func = tu.add_child(NodeId::ROOT, CursorKind::FunctionDecl, "helper");
    let no_file = tu.add_child(NodeId::ROOT, CursorKind::FunctionDecl, "builtin");
    in_file(&mut tu, ours, "include/imgui.h");
    in_file(&mut tu, theirs, "include/other.h");
    in_file(&mut tu, func, "include/other.h");

    let decls = Collector::new(&[PathBuf::from("include/imgui.h")]).traverse(&tu);
    assert_eq!(decls.structs().map(|s| s.cursor()).collect::<Vec<_>>(), vec![ours]);
    assert!(decls.functions.iter().all(|f| f.cursor() != no_file));
    assert!(decls.functions.is_empty());
    assert!(decls.skipped_headers.contains(&PathBuf::from("include/other.h")));
    assert!(!decls.used_headers.contains(&PathBuf::from("include/other.h")));
}

#[test]
fn test_resolver_on_collected_function() {
    // ImGuiID GetID(const char* str_id);
    let mut tu = TranslationUnit::new();
    let id_decl = tu.add_child(NodeId::ROOT, CursorKind::TypedefDecl, "ImGuiID");
    tu.node_mut(id_decl).underlying_type = Some(AstType::builtin(TypeKind::UInt));
    let func = tu.add_child(NodeId::ROOT, CursorKind::FunctionDecl, "GetID");
    tu.node_mut(func).result_type = Some(AstType::new(TypeKind::Typedef, "ImGuiID"));
    let r = tu.add_child(func, CursorKind::TypeRef, "ImGuiID");
    tu.node_mut(r).referenced = Some(id_decl);
    let param = tu.add_child(func, CursorKind::ParmDecl, "str_id");
    tu.node_mut(param).ty = Some(AstType::pointer_to(
        AstType::builtin(TypeKind::CharS).constant(),
    ));
    for id in [id_decl, func] {
        in_file(&mut tu, id, "imgui.h");
    }

    let decls = Collector::new(&[PathBuf::from("imgui.h")]).traverse(&tu);
    assert_eq!(decls.functions.len(), 1);

    let resolver = TypeResolver::new(&tu);
    let cursor = decls.functions[0].cursor();
    assert_eq!(
        resolver.function_result(cursor).unwrap(),
        TypeDescriptor::primitive(Primitive::UInt32, false)
    );
    let params = resolver.function_params(cursor).unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name, "str_id");
    assert!(params[0].ty.is_c_string());
}

/// Parses real headers from disk; skipped when libclang is not installed.
#[test]
fn test_parse_headers_from_disk() {
    let parser = match ClangParser::new() {
        Ok(parser) => parser,
        Err(e) => {
            eprintln!("skipping: {}", e);
            return;
        }
    };

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("other.h"), "struct Other { int v; };\n").unwrap();
    fs::write(
        dir.path().join("mini.h"),
        r#"
        #include "other.h"
        typedef unsigned int ImGuiID;
        struct ImVec2 { float x, y; ImVec2() {} };
        namespace ImGui {
            ImGuiID GetID(const char* str_id);
            void SetCursorPos(const ImVec2* pos);
            bool operator==(const ImVec2&, const ImVec2&);
        }
        "#,
    )
    .unwrap();
    let header = dir.path().join("mini.h");

    let tu = parser
        .parse_headers(&[header.clone()], &[], &["-DNOMINMAX".to_string()])
        .unwrap();
    let decls = Collector::new(&[header]).traverse(&tu);

    assert_eq!(decls.functions.len(), 2);
    assert_eq!(decls.typedefs().count(), 1);
    assert_eq!(decls.structs().count(), 1);
    assert!(decls
        .skipped_headers
        .iter()
        .any(|h| h.file_name().map_or(false, |n| n == "other.h")));

    let resolver = TypeResolver::new(&tu);
    let get_id = decls.functions[0].cursor();
    assert_eq!(decls.functions[0].path.namespace(&tu).as_deref(), Some("ImGui"));
    assert_eq!(
        resolver.function_result(get_id).unwrap(),
        TypeDescriptor::primitive(Primitive::UInt32, false)
    );

    let set_pos = decls.functions[1].cursor();
    let params = resolver.function_params(set_pos).unwrap();
    assert_eq!(
        params[0].ty,
        TypeDescriptor::PointerToStruct {
            base: Box::new(TypeDescriptor::Struct {
                name: "ImVec2".to_string(),
                is_const: true,
            }),
            is_const: false,
        }
    );
}

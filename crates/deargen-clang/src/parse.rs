//! Header parsing using libclang.
//!
//! The parser walks every cursor of the translation unit once and copies it
//! into a [`TranslationUnit`] snapshot. Definitions and references are linked
//! in a second pass while the libclang translation unit is still alive.

use crate::ast::{
    AccessSpecifier, AstType, CursorKind, NodeId, SourceLocation, TranslationUnit, TypeKind,
};
use miette::{miette, Result};
use rustc_hash::FxHashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::ptr;
use tracing::debug;

/// Name of the in-memory header that includes every requested header.
const SYNTHETIC_HEADER: &str = "deargen_headers.h";

/// Parser that uses libclang to snapshot C++ headers.
pub struct ClangParser {
    index: clang_sys::CXIndex,
}

impl ClangParser {
    /// Load libclang (if needed) and create an index.
    pub fn new() -> Result<Self> {
        if !clang_sys::is_loaded() {
            clang_sys::load().map_err(|e| miette!("Failed to load libclang: {}", e))?;
        }
        unsafe {
            let index = clang_sys::clang_createIndex(0, 0);
            if index.is_null() {
                return Err(miette!("Failed to create clang index"));
            }
            Ok(Self { index })
        }
    }

    /// Parse `headers` through a synthetic header that includes each of them.
    ///
    /// The parent directory of every header is added to the include path,
    /// followed by `include_dirs` and the raw `flags`.
    pub fn parse_headers(
        &self,
        headers: &[PathBuf],
        include_dirs: &[PathBuf],
        flags: &[String],
    ) -> Result<TranslationUnit> {
        let mut source = String::new();
        for header in headers {
            let name = header
                .file_name()
                .ok_or_else(|| miette!("Header path has no file name: {}", header.display()))?;
            source.push_str(&format!("#include \"{}\"\n", name.to_string_lossy()));
        }

        let search_dirs = headers
            .iter()
            .filter_map(|h| h.parent())
            .chain(include_dirs.iter().map(PathBuf::as_path));
        let mut args = Vec::new();
        for dir in search_dirs {
            let dir = if dir.as_os_str().is_empty() {
                Path::new(".")
            } else {
                dir
            };
            args.push(format!("-I{}", dir.display()));
        }
        args.extend(flags.iter().cloned());

        debug!(headers = headers.len(), ?args, "parsing headers");
        self.parse_unsaved(&source, SYNTHETIC_HEADER, &args)
    }

    /// Parse C++ source code from a string.
    pub fn parse_string(&self, source: &str, filename: &str) -> Result<TranslationUnit> {
        self.parse_unsaved(source, filename, &[])
    }

    fn parse_unsaved(
        &self,
        source: &str,
        filename: &str,
        extra_args: &[String],
    ) -> Result<TranslationUnit> {
        let c_filename =
            CString::new(filename).map_err(|_| miette!("Invalid file name: {}", filename))?;
        let c_source =
            CString::new(source).map_err(|_| miette!("Source contains a NUL byte: {}", filename))?;

        let unsaved_file = clang_sys::CXUnsavedFile {
            Filename: c_filename.as_ptr(),
            Contents: c_source.as_ptr(),
            Length: source.len() as _,
        };

        // Compiler arguments; later flags win, so a configured -std overrides this one
        let mut args = vec!["-x".to_string(), "c++".to_string(), "-std=c++17".to_string()];
        args.extend(extra_args.iter().cloned());
        let args = args
            .into_iter()
            .map(|arg| CString::new(arg).map_err(|e| miette!("Invalid compiler argument: {}", e)))
            .collect::<Result<Vec<_>>>()?;
        let c_args: Vec<*const c_char> = args.iter().map(|s| s.as_ptr()).collect();

        unsafe {
            let tu = clang_sys::clang_parseTranslationUnit(
                self.index,
                c_filename.as_ptr(),
                c_args.as_ptr(),
                c_args.len() as i32,
                &unsaved_file as *const _ as *mut _,
                1,
                clang_sys::CXTranslationUnit_SkipFunctionBodies,
            );

            if tu.is_null() {
                return Err(miette!("Failed to parse: {}", filename));
            }

            // Check for errors
            let num_diagnostics = clang_sys::clang_getNumDiagnostics(tu);
            for i in 0..num_diagnostics {
                let diag = clang_sys::clang_getDiagnostic(tu, i);
                let severity = clang_sys::clang_getDiagnosticSeverity(diag);

                if severity >= clang_sys::CXDiagnostic_Error {
                    let formatted = clang_sys::clang_formatDiagnostic(
                        diag,
                        clang_sys::clang_defaultDiagnosticDisplayOptions(),
                    );
                    let msg = cx_string_to_string(formatted);
                    clang_sys::clang_disposeDiagnostic(diag);
                    clang_sys::clang_disposeTranslationUnit(tu);
                    return Err(miette!("Clang error: {}", msg));
                }
                clang_sys::clang_disposeDiagnostic(diag);
            }

            let mut builder = SnapshotBuilder::new();
            let root = clang_sys::clang_getTranslationUnitCursor(tu);
            builder.cursors.push(root);
            builder.visit_children(NodeId::ROOT, root);
            builder.link();

            clang_sys::clang_disposeTranslationUnit(tu);

            debug!(nodes = builder.tu.len(), "snapshot taken");
            Ok(builder.tu)
        }
    }
}

impl Drop for ClangParser {
    fn drop(&mut self) {
        unsafe {
            clang_sys::clang_disposeIndex(self.index);
        }
    }
}

/// Accumulates the snapshot while the libclang cursors are valid.
struct SnapshotBuilder {
    tu: TranslationUnit,
    /// Live cursor of every node, indexed like the arena.
    cursors: Vec<clang_sys::CXCursor>,
    by_hash: FxHashMap<u32, Vec<NodeId>>,
}

/// Client data of the child visitor.
struct VisitState<'a> {
    builder: &'a mut SnapshotBuilder,
    parent: NodeId,
}

impl SnapshotBuilder {
    fn new() -> Self {
        Self {
            tu: TranslationUnit::new(),
            cursors: Vec::new(),
            by_hash: FxHashMap::default(),
        }
    }

    fn visit_children(&mut self, parent: NodeId, cursor: clang_sys::CXCursor) {
        extern "C" fn visitor(
            child: clang_sys::CXCursor,
            _parent: clang_sys::CXCursor,
            data: clang_sys::CXClientData,
        ) -> clang_sys::CXChildVisitResult {
            unsafe {
                let state = &mut *(data as *mut VisitState);

                // Skip null cursors
                if clang_sys::clang_Cursor_isNull(child) != 0 {
                    return clang_sys::CXChildVisit_Continue;
                }

                let id = state.builder.record(state.parent, child);
                state.builder.visit_children(id, child);
                clang_sys::CXChildVisit_Continue
            }
        }

        let mut state = VisitState {
            builder: self,
            parent,
        };
        unsafe {
            clang_sys::clang_visitChildren(
                cursor,
                visitor,
                &mut state as *mut VisitState as clang_sys::CXClientData,
            );
        }
    }

    /// Copy one cursor into the arena.
    fn record(&mut self, parent: NodeId, cursor: clang_sys::CXCursor) -> NodeId {
        unsafe {
            let raw_kind = clang_sys::clang_getCursorKind(cursor);
            let kind = convert_cursor_kind(raw_kind);
            let id = self.tu.add_child(parent, kind.clone(), cursor_spelling(cursor));
            self.cursors.push(cursor);
            self.by_hash
                .entry(clang_sys::clang_hashCursor(cursor))
                .or_default()
                .push(id);

            let node = self.tu.node_mut(id);
            node.location = get_location(cursor);

            match kind {
                CursorKind::FunctionDecl
                | CursorKind::CxxMethod
                | CursorKind::Constructor
                | CursorKind::Destructor => {
                    let ty = clang_sys::clang_getCursorType(cursor);
                    node.ty = Some(convert_type(ty));
                    node.result_type = Some(convert_type(clang_sys::clang_getCursorResultType(cursor)));
                    node.is_variadic = clang_sys::clang_isFunctionTypeVariadic(ty) != 0;
                    node.is_static = kind == CursorKind::CxxMethod
                        && clang_sys::clang_CXXMethod_isStatic(cursor) != 0;
                }
                CursorKind::ParmDecl | CursorKind::FieldDecl | CursorKind::VarDecl => {
                    node.ty = Some(convert_type(clang_sys::clang_getCursorType(cursor)));
                }
                CursorKind::TypedefDecl => {
                    node.ty = Some(convert_type(clang_sys::clang_getCursorType(cursor)));
                    node.underlying_type = Some(convert_type(
                        clang_sys::clang_getTypedefDeclUnderlyingType(cursor),
                    ));
                }
                CursorKind::EnumConstantDecl => {
                    node.enum_value = Some(clang_sys::clang_getEnumConstantDeclValue(cursor));
                }
                _ => {}
            }

            node.access = get_access_specifier(cursor);
            id
        }
    }

    /// Resolve definition and reference links between recorded cursors.
    fn link(&mut self) {
        for index in 1..self.cursors.len() {
            let cursor = self.cursors[index];
            let id = NodeId::from_index(index);
            let kind = self.tu.node(id).kind.clone();
            unsafe {
                match kind {
                    CursorKind::StructDecl
                    | CursorKind::ClassDecl
                    | CursorKind::ClassTemplate
                    | CursorKind::UnionDecl
                    | CursorKind::EnumDecl
                    | CursorKind::TypedefDecl
                    | CursorKind::FunctionDecl
                    | CursorKind::CxxMethod
                    | CursorKind::Constructor => {
                        let definition = clang_sys::clang_getCursorDefinition(cursor);
                        self.tu.node_mut(id).definition = self.lookup(definition);
                    }
                    CursorKind::TypeRef | CursorKind::TemplateRef | CursorKind::NamespaceRef => {
                        let referenced = clang_sys::clang_getCursorReferenced(cursor);
                        self.tu.node_mut(id).referenced = self.lookup(referenced);
                    }
                    _ => {}
                }
            }
        }
    }

    /// Node recorded for a live cursor, if it was visited.
    fn lookup(&self, cursor: clang_sys::CXCursor) -> Option<NodeId> {
        unsafe {
            if clang_sys::clang_Cursor_isNull(cursor) != 0 {
                return None;
            }
            let candidates = self.by_hash.get(&clang_sys::clang_hashCursor(cursor))?;
            candidates
                .iter()
                .copied()
                .find(|id| clang_sys::clang_equalCursors(self.cursors[id.index()], cursor) != 0)
        }
    }
}

fn convert_cursor_kind(kind: clang_sys::CXCursorKind) -> CursorKind {
    match kind {
        clang_sys::CXCursor_TranslationUnit => CursorKind::TranslationUnit,
        clang_sys::CXCursor_Namespace => CursorKind::Namespace,
        clang_sys::CXCursor_MacroDefinition => CursorKind::MacroDefinition,
        clang_sys::CXCursor_MacroExpansion => CursorKind::MacroExpansion,
        clang_sys::CXCursor_InclusionDirective => CursorKind::InclusionDirective,
        clang_sys::CXCursor_FunctionTemplate => CursorKind::FunctionTemplate,
        clang_sys::CXCursor_FunctionDecl => CursorKind::FunctionDecl,
        clang_sys::CXCursor_EnumDecl => CursorKind::EnumDecl,
        clang_sys::CXCursor_EnumConstantDecl => CursorKind::EnumConstantDecl,
        clang_sys::CXCursor_TypedefDecl => CursorKind::TypedefDecl,
        clang_sys::CXCursor_StructDecl => CursorKind::StructDecl,
        clang_sys::CXCursor_ClassDecl => CursorKind::ClassDecl,
        clang_sys::CXCursor_ClassTemplate => CursorKind::ClassTemplate,
        clang_sys::CXCursor_UnionDecl => CursorKind::UnionDecl,
        clang_sys::CXCursor_FieldDecl => CursorKind::FieldDecl,
        clang_sys::CXCursor_Constructor => CursorKind::Constructor,
        clang_sys::CXCursor_Destructor => CursorKind::Destructor,
        clang_sys::CXCursor_CXXMethod => CursorKind::CxxMethod,
        clang_sys::CXCursor_ParmDecl => CursorKind::ParmDecl,
        clang_sys::CXCursor_VarDecl => CursorKind::VarDecl,
        clang_sys::CXCursor_TypeRef => CursorKind::TypeRef,
        clang_sys::CXCursor_TemplateRef => CursorKind::TemplateRef,
        clang_sys::CXCursor_NamespaceRef => CursorKind::NamespaceRef,
        clang_sys::CXCursor_TemplateTypeParameter => CursorKind::TemplateTypeParameter,
        other => unsafe {
            CursorKind::Other(cx_string_to_string(clang_sys::clang_getCursorKindSpelling(other)))
        },
    }
}

/// Convert a libclang type, unwrapping elaborated types.
fn convert_type(ty: clang_sys::CXType) -> AstType {
    unsafe {
        let spelling = cx_string_to_string(clang_sys::clang_getTypeSpelling(ty));
        let is_const = clang_sys::clang_isConstQualifiedType(ty) != 0;

        let mut converted = match ty.kind {
            clang_sys::CXType_Elaborated => {
                // `const ImVec2` keeps its qualifier on the elaborated layer
                convert_type(clang_sys::clang_Type_getNamedType(ty))
            }
            clang_sys::CXType_Pointer
            | clang_sys::CXType_LValueReference
            | clang_sys::CXType_RValueReference => {
                let pointee = convert_type(clang_sys::clang_getPointeeType(ty));
                AstType {
                    inner: Some(Box::new(pointee)),
                    ..AstType::new(convert_type_kind(ty.kind), String::new())
                }
            }
            clang_sys::CXType_ConstantArray | clang_sys::CXType_IncompleteArray => {
                let element = convert_type(clang_sys::clang_getArrayElementType(ty));
                let size = clang_sys::clang_getArraySize(ty);
                AstType {
                    inner: Some(Box::new(element)),
                    array_size: usize::try_from(size).ok(),
                    ..AstType::new(convert_type_kind(ty.kind), String::new())
                }
            }
            kind => AstType::new(convert_type_kind(kind), String::new()),
        };

        converted.spelling = spelling;
        converted.is_const = is_const;
        converted
    }
}

fn convert_type_kind(kind: clang_sys::CXTypeKind) -> TypeKind {
    match kind {
        clang_sys::CXType_Void => TypeKind::Void,
        clang_sys::CXType_Bool => TypeKind::Bool,
        clang_sys::CXType_Char_S => TypeKind::CharS,
        clang_sys::CXType_SChar => TypeKind::SChar,
        clang_sys::CXType_Char_U => TypeKind::CharU,
        clang_sys::CXType_UChar => TypeKind::UChar,
        clang_sys::CXType_Short => TypeKind::Short,
        clang_sys::CXType_UShort => TypeKind::UShort,
        clang_sys::CXType_Int => TypeKind::Int,
        clang_sys::CXType_UInt => TypeKind::UInt,
        clang_sys::CXType_Long => TypeKind::Long,
        clang_sys::CXType_ULong => TypeKind::ULong,
        clang_sys::CXType_LongLong => TypeKind::LongLong,
        clang_sys::CXType_ULongLong => TypeKind::ULongLong,
        clang_sys::CXType_Float => TypeKind::Float,
        clang_sys::CXType_Double => TypeKind::Double,
        clang_sys::CXType_Pointer => TypeKind::Pointer,
        clang_sys::CXType_LValueReference => TypeKind::LValueReference,
        clang_sys::CXType_RValueReference => TypeKind::RValueReference,
        clang_sys::CXType_ConstantArray => TypeKind::ConstantArray,
        clang_sys::CXType_IncompleteArray => TypeKind::IncompleteArray,
        clang_sys::CXType_Typedef => TypeKind::Typedef,
        clang_sys::CXType_Record => TypeKind::Record,
        clang_sys::CXType_Enum => TypeKind::Enum,
        clang_sys::CXType_FunctionProto => TypeKind::FunctionProto,
        clang_sys::CXType_FunctionNoProto => TypeKind::FunctionNoProto,
        other => unsafe {
            TypeKind::Other(cx_string_to_string(clang_sys::clang_getTypeKindSpelling(other)))
        },
    }
}

/// Get source location from cursor.
fn get_location(cursor: clang_sys::CXCursor) -> SourceLocation {
    unsafe {
        let loc = clang_sys::clang_getCursorLocation(cursor);
        let mut file: clang_sys::CXFile = ptr::null_mut();
        let mut line: u32 = 0;
        let mut column: u32 = 0;

        clang_sys::clang_getSpellingLocation(loc, &mut file, &mut line, &mut column, ptr::null_mut());

        let file = if !file.is_null() {
            let name = cx_string_to_string(clang_sys::clang_getFileName(file));
            if name.is_empty() {
                None
            } else {
                Some(PathBuf::from(name))
            }
        } else {
            None
        };

        SourceLocation { file, line, column }
    }
}

/// Access specifier of a class member; public for everything else.
fn get_access_specifier(cursor: clang_sys::CXCursor) -> AccessSpecifier {
    unsafe {
        match clang_sys::clang_getCXXAccessSpecifier(cursor) {
            clang_sys::CX_CXXProtected => AccessSpecifier::Protected,
            clang_sys::CX_CXXPrivate => AccessSpecifier::Private,
            _ => AccessSpecifier::Public,
        }
    }
}

/// Convert a CXString to a Rust String.
fn cx_string_to_string(cx_string: clang_sys::CXString) -> String {
    unsafe {
        let c_str = clang_sys::clang_getCString(cx_string);
        let result = if c_str.is_null() {
            String::new()
        } else {
            CStr::from_ptr(c_str).to_string_lossy().into_owned()
        };
        clang_sys::clang_disposeString(cx_string);
        result
    }
}

/// Get the spelling of a cursor.
fn cursor_spelling(cursor: clang_sys::CXCursor) -> String {
    unsafe {
        let spelling = clang_sys::clang_getCursorSpelling(cursor);
        cx_string_to_string(spelling)
    }
}

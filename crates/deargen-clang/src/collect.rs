//! Declaration collection over a translation unit snapshot.
//!
//! A single walk classifies every top-level declaration of the requested
//! headers, descending only into namespaces. Records keep the ancestor path
//! to their cursor so emitters can recover the enclosing namespace later.

use crate::ast::{CursorKind, NodeId, TranslationUnit, WalkAction};
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Toolchain locations that are never reported as skipped headers.
pub const DEFAULT_SYSTEM_PREFIXES: &[&str] = &["/usr/", "/opt/", "/Library/", "C:"];

/// Ancestor path from the translation unit root to a declaration cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclPath(Vec<NodeId>);

impl DeclPath {
    pub fn new(path: &[NodeId]) -> Self {
        Self(path.to_vec())
    }

    /// The declaration cursor itself.
    pub fn cursor(&self) -> NodeId {
        self.0.last().copied().unwrap_or(NodeId::ROOT)
    }

    /// Enclosing namespace as `A::B`, or `None` at global scope.
    pub fn namespace(&self, tu: &TranslationUnit) -> Option<String> {
        let parts: Vec<&str> = self.0[..self.0.len().saturating_sub(1)]
            .iter()
            .map(|&id| tu.node(id))
            .filter(|node| node.kind == CursorKind::Namespace)
            .map(|node| node.spelling.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("::"))
        }
    }

    /// File declaring the cursor.
    pub fn file<'a>(&self, tu: &'a TranslationUnit) -> Option<&'a Path> {
        tu.node(self.cursor()).file()
    }
}

macro_rules! decl_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub path: DeclPath,
        }

        impl $name {
            pub fn cursor(&self) -> NodeId {
                self.path.cursor()
            }
        }
    };
}

decl_record!(
    /// A free function.
    FunctionDecl
);
decl_record!(EnumDecl);
decl_record!(TypedefDecl);
decl_record!(
    /// A struct, class or class template.
    StructDecl
);

/// Typedefs and structs share one list to keep their relative order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedefOrStruct {
    Typedef(TypedefDecl),
    Struct(StructDecl),
}

impl TypedefOrStruct {
    pub fn path(&self) -> &DeclPath {
        match self {
            TypedefOrStruct::Typedef(decl) => &decl.path,
            TypedefOrStruct::Struct(decl) => &decl.path,
        }
    }
}

/// Everything one traversal found, in source order.
#[derive(Debug, Clone, Default)]
pub struct CollectedDecls {
    pub functions: Vec<FunctionDecl>,
    pub enums: Vec<EnumDecl>,
    pub typedef_structs: Vec<TypedefOrStruct>,
    pub used_headers: IndexSet<PathBuf>,
    pub skipped_headers: IndexSet<PathBuf>,
}

impl CollectedDecls {
    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.typedef_structs.iter().filter_map(|entry| match entry {
            TypedefOrStruct::Struct(decl) => Some(decl),
            TypedefOrStruct::Typedef(_) => None,
        })
    }

    pub fn typedefs(&self) -> impl Iterator<Item = &TypedefDecl> {
        self.typedef_structs.iter().filter_map(|entry| match entry {
            TypedefOrStruct::Typedef(decl) => Some(decl),
            TypedefOrStruct::Struct(_) => None,
        })
    }
}

/// Walks a snapshot and buffers the declarations of the requested headers.
#[derive(Debug, Clone)]
pub struct Collector {
    headers: Vec<PathBuf>,
    system_prefixes: Vec<String>,
}

impl Collector {
    pub fn new(headers: &[PathBuf]) -> Self {
        Self {
            headers: headers.iter().map(|h| normalize(h)).collect(),
            system_prefixes: DEFAULT_SYSTEM_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Replace the toolchain prefixes excluded from `skipped_headers`.
    pub fn with_system_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.system_prefixes = prefixes;
        self
    }

    pub fn traverse(&self, tu: &TranslationUnit) -> CollectedDecls {
        let mut decls = CollectedDecls::default();
        let mut requested: FxHashMap<PathBuf, bool> = FxHashMap::default();

        tu.walk(|path| {
            let node = tu.node(path[path.len() - 1]);
            let Some(file) = node.file() else {
                return WalkAction::Skip;
            };

            let is_requested = *requested
                .entry(file.to_path_buf())
                .or_insert_with(|| self.headers.contains(&normalize(file)));

            if !is_requested {
                if !self.is_system(file) && decls.skipped_headers.insert(file.to_path_buf()) {
                    debug!(header = %file.display(), "unknown header");
                }
                return WalkAction::Skip;
            }

            if decls.used_headers.insert(file.to_path_buf()) {
                debug!(header = %file.display(), "header");
            }

            match node.kind {
                CursorKind::Namespace => {
                    info!(namespace = %node.spelling, "entering namespace");
                    return WalkAction::Descend;
                }
                CursorKind::MacroDefinition
                | CursorKind::MacroExpansion
                | CursorKind::InclusionDirective
                | CursorKind::FunctionTemplate => {}
                CursorKind::FunctionDecl => {
                    if node.spelling.starts_with("operator") {
                        debug!(name = %node.spelling, "skipping operator");
                    } else {
                        decls.functions.push(FunctionDecl {
                            path: DeclPath::new(path),
                        });
                    }
                }
                CursorKind::EnumDecl => decls.enums.push(EnumDecl {
                    path: DeclPath::new(path),
                }),
                CursorKind::TypedefDecl => {
                    decls
                        .typedef_structs
                        .push(TypedefOrStruct::Typedef(TypedefDecl {
                            path: DeclPath::new(path),
                        }))
                }
                ref kind if kind.is_record() => {
                    decls.typedef_structs.push(TypedefOrStruct::Struct(StructDecl {
                        path: DeclPath::new(path),
                    }))
                }
                ref other => debug!(kind = ?other, name = %node.spelling, "ignoring cursor"),
            }
            WalkAction::Skip
        });

        info!(
            functions = decls.functions.len(),
            enums = decls.enums.len(),
            typedef_structs = decls.typedef_structs.len(),
            skipped_headers = decls.skipped_headers.len(),
            "collected declarations"
        );
        decls
    }

    fn is_system(&self, file: &Path) -> bool {
        let file = file.to_string_lossy();
        self.system_prefixes
            .iter()
            .any(|prefix| file.starts_with(prefix.as_str()))
    }
}

/// Canonical form of a path for header comparison, or the path itself when
/// it does not exist on disk.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

//! C++ header analysis for the deargen binding generator.
//!
//! This crate provides:
//! - header parsing via libclang into an owned AST snapshot
//! - a single-pass collector for top-level declarations
//! - the closed type taxonomy used at the binding boundary
//! - the resolver classifying AST types into that taxonomy
//!
//! # Architecture
//!
//! ```text
//! Headers → libclang → TranslationUnit → Collector → CollectedDecls
//!                                      ↘ TypeResolver → TypeDescriptor
//! ```

mod ast;
mod collect;
mod parse;
mod resolve;
mod types;

pub use ast::{
    AccessSpecifier, AstNode, AstType, CursorKind, NodeId, SourceLocation, TranslationUnit,
    TypeKind, WalkAction,
};
pub use collect::{
    CollectedDecls, Collector, DeclPath, EnumDecl, FunctionDecl, StructDecl, TypedefDecl,
    TypedefOrStruct, DEFAULT_SYSTEM_PREFIXES,
};
pub use parse::ClangParser;
pub use resolve::{Param, ResolveError, TypeResolver};
pub use types::{NativeNames, Primitive, TypeDescriptor, Unqualified, OPAQUE_CONTAINER};


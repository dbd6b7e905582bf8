//! AST snapshot of a parsed translation unit.
//!
//! libclang cursors are only valid while their translation unit is alive, so
//! the parser copies what the generator needs into an arena of [`AstNode`]s.
//! Cursor identity is index identity: two cursors are the same declaration
//! position iff their [`NodeId`]s are equal.

use std::fmt;
use std::path::PathBuf;

/// Index of a node inside a [`TranslationUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The translation unit cursor itself.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }
}

/// Cursor kinds the generator distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorKind {
    TranslationUnit,
    Namespace,
    MacroDefinition,
    MacroExpansion,
    InclusionDirective,
    FunctionTemplate,
    FunctionDecl,
    EnumDecl,
    EnumConstantDecl,
    TypedefDecl,
    StructDecl,
    ClassDecl,
    ClassTemplate,
    UnionDecl,
    FieldDecl,
    Constructor,
    Destructor,
    CxxMethod,
    ParmDecl,
    VarDecl,
    TypeRef,
    TemplateRef,
    NamespaceRef,
    TemplateTypeParameter,
    /// Any other kind, kept by its libclang spelling for diagnostics.
    Other(String),
}

impl CursorKind {
    /// Struct, class or class template declaration.
    pub fn is_record(&self) -> bool {
        matches!(
            self,
            CursorKind::StructDecl | CursorKind::ClassDecl | CursorKind::ClassTemplate
        )
    }
}

/// Type kinds as reported by libclang (elaborated types are unwrapped by the
/// parser, so `ImVec2` arrives as `Record` and `ImGuiID` as `Typedef`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    Bool,
    CharS,
    SChar,
    CharU,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    Pointer,
    LValueReference,
    RValueReference,
    ConstantArray,
    IncompleteArray,
    Typedef,
    Record,
    Enum,
    FunctionProto,
    FunctionNoProto,
    Other(String),
}

impl TypeKind {
    /// Source spelling of a builtin kind.
    pub fn builtin_spelling(&self) -> Option<&'static str> {
        let spelling = match self {
            TypeKind::Void => "void",
            TypeKind::Bool => "bool",
            TypeKind::CharS | TypeKind::CharU => "char",
            TypeKind::SChar => "signed char",
            TypeKind::UChar => "unsigned char",
            TypeKind::Short => "short",
            TypeKind::UShort => "unsigned short",
            TypeKind::Int => "int",
            TypeKind::UInt => "unsigned int",
            TypeKind::Long => "long",
            TypeKind::ULong => "unsigned long",
            TypeKind::LongLong => "long long",
            TypeKind::ULongLong => "unsigned long long",
            TypeKind::Float => "float",
            TypeKind::Double => "double",
            _ => return None,
        };
        Some(spelling)
    }
}

/// A type as seen by libclang, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstType {
    pub kind: TypeKind,
    pub spelling: String,
    pub is_const: bool,
    /// Pointee for pointers and references, element for arrays.
    pub inner: Option<Box<AstType>>,
    /// Length of a constant array.
    pub array_size: Option<usize>,
}

impl AstType {
    pub fn new(kind: TypeKind, spelling: impl Into<String>) -> Self {
        Self {
            kind,
            spelling: spelling.into(),
            is_const: false,
            inner: None,
            array_size: None,
        }
    }

    /// A builtin type spelled the way clang spells it.
    pub fn builtin(kind: TypeKind) -> Self {
        let spelling = kind.builtin_spelling().unwrap_or_default();
        Self::new(kind, spelling)
    }

    /// Const-qualify this type (`const T`).
    pub fn constant(mut self) -> Self {
        if !self.is_const {
            self.is_const = true;
            self.spelling = format!("const {}", self.spelling);
        }
        self
    }

    /// `T *`
    pub fn pointer_to(pointee: AstType) -> Self {
        let spelling = format!("{} *", pointee.spelling);
        Self {
            inner: Some(Box::new(pointee)),
            ..Self::new(TypeKind::Pointer, spelling)
        }
    }

    /// `T &`
    pub fn lvalue_ref_to(referent: AstType) -> Self {
        let spelling = format!("{} &", referent.spelling);
        Self {
            inner: Some(Box::new(referent)),
            ..Self::new(TypeKind::LValueReference, spelling)
        }
    }

    /// `T [N]`
    pub fn array_of(element: AstType, size: usize) -> Self {
        let spelling = format!("{} [{}]", element.spelling, size);
        Self {
            inner: Some(Box::new(element)),
            array_size: Some(size),
            ..Self::new(TypeKind::ConstantArray, spelling)
        }
    }

    pub fn pointee(&self) -> Option<&AstType> {
        match self.kind {
            TypeKind::Pointer | TypeKind::LValueReference | TypeKind::RValueReference => {
                self.inner.as_deref()
            }
            _ => None,
        }
    }

    /// Spelling without a leading `const `.
    pub fn unqualified_spelling(&self) -> &str {
        self.spelling.trim_start_matches("const ")
    }
}

/// C++ access specifier for class members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessSpecifier {
    /// Public access, also used for cursors that are not class members
    #[default]
    Public,
    /// Private access - accessible only from within the class
    Private,
    /// Protected access - accessible from class and derived classes
    Protected,
}

/// Source location of a cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file.display(), self.line, self.column),
            None => f.write_str("<no file>"),
        }
    }
}

/// One cursor of the snapshot.
#[derive(Debug, Clone)]
pub struct AstNode {
    pub id: NodeId,
    pub kind: CursorKind,
    pub spelling: String,
    pub location: SourceLocation,
    /// `clang_getCursorType`, kept for declarations that carry a type.
    pub ty: Option<AstType>,
    /// Return type of functions and methods.
    pub result_type: Option<AstType>,
    /// Underlying type of a typedef declaration.
    pub underlying_type: Option<AstType>,
    /// Target of a reference cursor (`TypeRef`, `TemplateRef`, ...).
    pub referenced: Option<NodeId>,
    /// Defining cursor of a declaration, when the definition was parsed.
    pub definition: Option<NodeId>,
    /// Value of an enum constant.
    pub enum_value: Option<i64>,
    pub access: AccessSpecifier,
    pub is_static: bool,
    pub is_variadic: bool,
    pub children: Vec<NodeId>,
}

impl AstNode {
    fn new(id: NodeId, kind: CursorKind, spelling: String) -> Self {
        Self {
            id,
            kind,
            spelling,
            location: SourceLocation::default(),
            ty: None,
            result_type: None,
            underlying_type: None,
            referenced: None,
            definition: None,
            enum_value: None,
            access: AccessSpecifier::default(),
            is_static: false,
            is_variadic: false,
            children: Vec::new(),
        }
    }

    pub fn file(&self) -> Option<&std::path::Path> {
        self.location.file.as_deref()
    }
}

/// Decision returned by a [`TranslationUnit::walk`] visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Visit the children of the current cursor.
    Descend,
    /// Continue with the next sibling.
    Skip,
}

/// Arena of cursors rooted at the translation unit cursor.
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    nodes: Vec<AstNode>,
}

impl TranslationUnit {
    /// An empty translation unit holding only its root cursor.
    pub fn new() -> Self {
        Self {
            nodes: vec![AstNode::new(
                NodeId::ROOT,
                CursorKind::TranslationUnit,
                String::new(),
            )],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn nodes(&self) -> impl Iterator<Item = &AstNode> {
        self.nodes.iter()
    }

    /// Append a cursor as the last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: CursorKind,
        spelling: impl Into<String>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AstNode::new(id, kind, spelling.into()));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &AstNode> {
        self.nodes[id.0].children.iter().map(move |&c| &self.nodes[c.0])
    }

    pub fn children_of_kind(
        &self,
        id: NodeId,
        kind: CursorKind,
    ) -> impl Iterator<Item = &AstNode> {
        self.children(id).filter(move |c| c.kind == kind)
    }

    /// Declaration referenced by the first `TypeRef` child of `id`.
    pub fn type_ref(&self, id: NodeId) -> Option<&AstNode> {
        self.children_of_kind(id, CursorKind::TypeRef)
            .next()
            .and_then(|r| r.referenced)
            .map(|target| self.node(target))
    }

    /// A cursor is a forward declaration when no definition was parsed or
    /// the definition is a different cursor.
    pub fn is_forward_declaration(&self, id: NodeId) -> bool {
        match self.node(id).definition {
            None => true,
            Some(definition) => definition != id,
        }
    }

    /// Depth-first walk over the cursors below the root.
    ///
    /// The visitor receives the ancestor path from the root to the current
    /// cursor (inclusive) and decides whether its children are visited.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&[NodeId]) -> WalkAction,
    {
        let mut path = vec![self.root()];
        let mut stack: Vec<(usize, NodeId)> = self
            .node(self.root())
            .children
            .iter()
            .rev()
            .map(|&child| (1, child))
            .collect();

        while let Some((depth, id)) = stack.pop() {
            path.truncate(depth);
            path.push(id);
            if visit(&path) == WalkAction::Descend {
                stack.extend(
                    self.node(id)
                        .children
                        .iter()
                        .rev()
                        .map(|&child| (depth + 1, child)),
                );
            }
        }
    }
}

impl Default for TranslationUnit {
    fn default() -> Self {
        Self::new()
    }
}

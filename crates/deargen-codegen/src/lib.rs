//! Cython binding emission for collected C++ declarations.
//!
//! Every collected declaration is rendered onto two surfaces: the
//! declaration surface (`.pxd`, `cdef extern` blocks mirroring the headers)
//! and the wrapper surface (`.pyx`, Python-callable functions and
//! `cdef class` wrappers). Types are resolved on demand while rendering; the
//! first resolution failure aborts the run before any text is returned.
//!
//! # Architecture
//!
//! ```text
//! CollectedDecls → typedefs/structs → enums → functions
//!                        ↓                ↓          ↓
//!                   PxdWriter / PyxWriter → Bindings
//! ```

mod enums;
mod filters;
mod function;
mod structs;
mod typedefs;
mod wrap_flags;
mod writer;

pub use filters::{is_anonymous, param_names, sanitize_identifier, type_name, TypeFilter};
pub use wrap_flags::{MethodSelection, ValueType, WrapFlags, WrapTable, LEGACY_SKIP, VALUE_TYPES};
pub use writer::{CodeWriter, PxdWriter, PyxWriter};

use deargen_clang::{
    CollectedDecls, DeclPath, ResolveError, TranslationUnit, TypeResolver, TypedefOrStruct,
};
use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that abort generation.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerateError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error("invalid type prefix `{prefix}`")]
    #[diagnostic(code(deargen::codegen::invalid_prefix))]
    InvalidPrefix {
        prefix: String,
        #[source]
        source: regex::Error,
    },
}

/// Naming and filtering knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Name under which the wrapper surface cimports the declarations.
    pub module: String,
    /// Prefix of library identifiers qualified on the wrapper surface.
    pub type_prefix: String,
    /// Library identifiers never qualified.
    pub exempt: Vec<String>,
    /// Return types and declaration names that drop an entry entirely.
    pub excludes: Vec<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            module: "cpp_imgui".to_string(),
            type_prefix: "Im".to_string(),
            exempt: vec!["ImGuiTextRange".to_string()],
            excludes: Vec::new(),
        }
    }
}

/// Both rendered surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    pub pxd: String,
    pub pyx: String,
}

/// State shared by the emitters for one run.
pub(crate) struct EmitContext<'a> {
    pub tu: &'a TranslationUnit,
    pub resolver: TypeResolver<'a>,
    pub filter: TypeFilter,
    pub wrap: &'a WrapTable,
    pub options: &'a GeneratorOptions,
}

impl EmitContext<'_> {
    pub fn is_excluded(&self, name: &str) -> bool {
        self.options.excludes.iter().any(|e| e == name)
    }

    /// File name used in `cdef extern from`.
    pub fn header_of(&self, path: &DeclPath) -> String {
        path.file(self.tu)
            .and_then(|f| f.file_name())
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Renders collected declarations into [`Bindings`].
pub struct Generator<'a> {
    tu: &'a TranslationUnit,
    decls: &'a CollectedDecls,
    wrap: WrapTable,
    options: GeneratorOptions,
}

impl<'a> Generator<'a> {
    pub fn new(tu: &'a TranslationUnit, decls: &'a CollectedDecls) -> Self {
        Self {
            tu,
            decls,
            wrap: WrapTable::default(),
            options: GeneratorOptions::default(),
        }
    }

    pub fn with_wrap_table(mut self, wrap: WrapTable) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Render both surfaces in collection order.
    pub fn generate(&self) -> Result<Bindings, GenerateError> {
        let filter = TypeFilter::new(
            &self.options.module,
            &self.options.type_prefix,
            &self.options.exempt,
        )
        .map_err(|source| GenerateError::InvalidPrefix {
            prefix: self.options.type_prefix.clone(),
            source,
        })?
        .with_wrappers(structs::wrapper_classes(
            self.tu,
            &self.decls.typedef_structs,
            &self.wrap,
            &self.options,
        ));
        let ctx = EmitContext {
            tu: self.tu,
            resolver: TypeResolver::new(self.tu),
            filter,
            wrap: &self.wrap,
            options: &self.options,
        };

        let mut pxd = PxdWriter::new();
        let mut pyx = PyxWriter::new(&self.options.module);

        for entry in &self.decls.typedef_structs {
            match entry {
                TypedefOrStruct::Typedef(decl) => typedefs::write_pxd(&ctx, &mut pxd, decl),
                TypedefOrStruct::Struct(decl) => {
                    structs::write_pxd(&ctx, &mut pxd, decl)?;
                    structs::write_pyx(&ctx, &mut pyx, decl)?;
                }
            }
        }

        for decl in &self.decls.enums {
            enums::write_pxd(&ctx, &mut pxd, decl);
            enums::write_pyx(&ctx, &mut pyx, decl);
        }

        let mut emitted = 0;
        for decl in &self.decls.functions {
            let Some(signature) = function::resolve_function(&ctx, decl)? else {
                continue;
            };
            debug!(function = %signature.name, "emitting");
            function::write_pxd_function(&ctx, &mut pxd, decl, &signature);
            function::write_pyx_function(&ctx, &mut pyx, &signature);
            emitted += 1;
        }

        info!(
            functions = emitted,
            typedef_structs = self.decls.typedef_structs.len(),
            enums = self.decls.enums.len(),
            "generated bindings"
        );
        Ok(Bindings {
            pxd: pxd.finish(),
            pyx: pyx.finish(),
        })
    }
}

//! Spelling filters shared by the emitters.

use deargen_clang::NativeNames;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rustc_hash::FxHashSet;

/// Names that cannot be used as Python or Cython identifiers.
static RESERVED: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        // Python
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
        "return", "try", "while", "with", "yield",
        // Cython
        "cdef", "cpdef", "ctypedef", "cimport", "extern", "struct", "union", "enum", "include",
        "inline", "public", "readonly", "api", "gil", "nogil", "NULL", "sizeof", "print",
        "exec", "property",
    ]
    .into_iter()
    .collect()
});

/// Rewrites C++ spellings for both output surfaces.
///
/// The declaration surface only swaps template brackets (`ImVector<T>` to
/// `ImVector[T]`). The wrapper surface additionally qualifies every library
/// identifier with the native module name.
#[derive(Debug, Clone)]
pub struct TypeFilter {
    template_args: Regex,
    library_ident: Regex,
    module: String,
    exempt: Vec<String>,
    /// Structs with a generated `cdef class`; `None` assumes every struct.
    wrappers: Option<FxHashSet<String>>,
}

impl TypeFilter {
    /// `prefix` selects library identifiers (`Im` matches `\bIm\w+`);
    /// `exempt` names are never qualified.
    pub fn new(module: &str, prefix: &str, exempt: &[String]) -> Result<Self, regex::Error> {
        Ok(Self {
            template_args: Regex::new(r"<([^<>]+)>")?,
            library_ident: Regex::new(&format!(r"\b{}\w+", regex::escape(prefix)))?,
            module: module.to_string(),
            exempt: exempt.to_vec(),
            wrappers: None,
        })
    }

    /// Restrict wrapper classes to `names`.
    pub fn with_wrappers(mut self, names: FxHashSet<String>) -> Self {
        self.wrappers = Some(names);
        self
    }

    /// Declaration-surface spelling.
    pub fn pxd(&self, src: &str) -> String {
        self.template_args.replace_all(src, "[$1]").into_owned()
    }

    /// Wrapper-surface spelling.
    pub fn pyx(&self, src: &str) -> String {
        let qualified = self.library_ident.replace_all(src, |caps: &Captures| {
            let ident = &caps[0];
            if self.exempt.iter().any(|e| e == ident) {
                ident.to_string()
            } else {
                format!("{}.{}", self.module, ident)
            }
        });
        self.pxd(&qualified)
    }
}

impl NativeNames for TypeFilter {
    fn native(&self, c_type: &str) -> String {
        self.pyx(c_type)
    }

    fn has_wrapper(&self, name: &str) -> bool {
        self.wrappers.as_ref().map_or(true, |w| w.contains(name))
    }
}

/// Combine a type spelling and a declarator name.
///
/// Array extents and function-pointer declarators wrap the name the way C
/// spells them: `float [4]` + `col` is `float col[4]`.
pub fn type_name(spelling: &str, name: &str) -> String {
    if let Some(pos) = spelling.find("(*)") {
        return format!("{}(*{}){}", &spelling[..pos], name, &spelling[pos + 3..]);
    }
    if let Some(pos) = spelling.find('[') {
        return format!("{} {}{}", spelling[..pos].trim_end(), name, &spelling[pos..]);
    }
    if spelling.ends_with('*') || spelling.ends_with('&') {
        format!("{}{}", spelling, name)
    } else {
        format!("{} {}", spelling, name)
    }
}

/// Unnamed records and enums (`(unnamed enum at imgui.h:12:1)`).
pub fn is_anonymous(spelling: &str) -> bool {
    spelling.is_empty() || spelling.contains("(unnamed") || spelling.contains("(anonymous")
}

/// A usable Python identifier for a C++ name.
pub fn sanitize_identifier(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    let mut result = name.to_string();
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    if RESERVED.contains(result.as_str()) {
        result.push('_');
    }
    result
}

/// Parameter names for a signature, filling in unnamed parameters.
pub fn param_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                format!("arg{}", i)
            } else {
                sanitize_identifier(name)
            }
        })
        .collect()
}

//! Type taxonomy for the binding boundary.
//!
//! Every foreign type reaching the generator is classified into exactly one
//! [`TypeDescriptor`]. A descriptor knows how it is spelled on the declaration
//! surface (`.pxd`), how it is stored in a `ctypes` structure, how it appears
//! as a host-facing parameter, and how values cross the boundary in both
//! directions inside the wrapper surface (`.pyx`).

/// Name of the one container template whose element type is erased.
pub const OPAQUE_CONTAINER: &str = "ImVector";

/// Spells native types as they are referenced from the wrapper module.
pub trait NativeNames {
    fn native(&self, c_type: &str) -> String;

    /// Whether a `cdef class` wrapper exists for struct `name`. Structs
    /// without one cross the boundary as raw `ctypes.c_void_p` addresses.
    fn has_wrapper(&self, _name: &str) -> bool {
        true
    }
}

/// Native types spelled verbatim, for wrappers sharing the native namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unqualified;

impl NativeNames for Unqualified {
    fn native(&self, c_type: &str) -> String {
        c_type.to_string()
    }
}

/// Fixed-size scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
}

impl Primitive {
    /// C spelling.
    pub fn c_name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Bool => "bool",
            Primitive::Int8 => "char",
            Primitive::Int16 => "short",
            Primitive::Int32 => "int",
            Primitive::Int64 => "long long",
            Primitive::UInt8 => "unsigned char",
            Primitive::UInt16 => "unsigned short",
            Primitive::UInt32 => "unsigned int",
            Primitive::UInt64 => "unsigned long long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// `ctypes` field type.
    pub fn ctypes(self) -> &'static str {
        match self {
            Primitive::Void => "None",
            Primitive::Bool => "ctypes.c_bool",
            Primitive::Int8 => "ctypes.c_int8",
            Primitive::Int16 => "ctypes.c_int16",
            Primitive::Int32 => "ctypes.c_int32",
            Primitive::Int64 => "ctypes.c_int64",
            Primitive::UInt8 => "ctypes.c_uint8",
            Primitive::UInt16 => "ctypes.c_uint16",
            Primitive::UInt32 => "ctypes.c_uint32",
            Primitive::UInt64 => "ctypes.c_uint64",
            Primitive::Float => "ctypes.c_float",
            Primitive::Double => "ctypes.c_double",
        }
    }

    /// Python type hint.
    pub fn py_type(self) -> &'static str {
        match self {
            Primitive::Void => "None",
            Primitive::Bool => "bool",
            Primitive::Float | Primitive::Double => "float",
            _ => "int",
        }
    }
}

/// A classified foreign type.
///
/// Non-leaf variants own their underlying descriptor exclusively; every chain
/// ends in a primitive, a struct or the opaque container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Primitive {
        prim: Primitive,
        is_const: bool,
    },
    /// Pointer to anything that is not a struct, including `void *`.
    Pointer {
        base: Box<TypeDescriptor>,
        is_const: bool,
    },
    /// Pointer to a struct, passed as an opaque handle.
    PointerToStruct {
        base: Box<TypeDescriptor>,
        is_const: bool,
    },
    /// Lvalue reference; never null at the boundary.
    Reference {
        base: Box<TypeDescriptor>,
        is_const: bool,
    },
    Array {
        base: Box<TypeDescriptor>,
        len: usize,
        is_const: bool,
    },
    /// Named alias over a non-trivial base; conversions follow the base.
    Typedef {
        name: String,
        base: Box<TypeDescriptor>,
        is_const: bool,
    },
    Struct {
        name: String,
        is_const: bool,
    },
    /// `ImVector<T>` with `T` erased.
    OpaqueContainer,
}

impl TypeDescriptor {
    pub fn primitive(prim: Primitive, is_const: bool) -> Self {
        TypeDescriptor::Primitive { prim, is_const }
    }

    /// Untyped `void *`.
    pub fn void_pointer(is_const: bool) -> Self {
        TypeDescriptor::Pointer {
            base: Box::new(Self::primitive(Primitive::Void, false)),
            is_const,
        }
    }

    pub fn is_const(&self) -> bool {
        match self {
            TypeDescriptor::Primitive { is_const, .. }
            | TypeDescriptor::Pointer { is_const, .. }
            | TypeDescriptor::PointerToStruct { is_const, .. }
            | TypeDescriptor::Reference { is_const, .. }
            | TypeDescriptor::Array { is_const, .. }
            | TypeDescriptor::Typedef { is_const, .. }
            | TypeDescriptor::Struct { is_const, .. } => *is_const,
            TypeDescriptor::OpaqueContainer => false,
        }
    }

    /// The descriptor this one wraps, if any.
    pub fn underlying(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Pointer { base, .. }
            | TypeDescriptor::PointerToStruct { base, .. }
            | TypeDescriptor::Reference { base, .. }
            | TypeDescriptor::Array { base, .. }
            | TypeDescriptor::Typedef { base, .. } => Some(base),
            _ => None,
        }
    }

    /// Number of descriptors in the underlying chain, this one included.
    pub fn depth(&self) -> usize {
        1 + self.underlying().map_or(0, TypeDescriptor::depth)
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Primitive {
                prim: Primitive::Void,
                ..
            }
        )
    }

    /// A scalar other than `void`.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive { .. }) && !self.is_void()
    }

    /// `void *` with any qualification.
    pub fn is_void_pointer(&self) -> bool {
        matches!(self, TypeDescriptor::Pointer { base, .. } if base.is_void())
    }

    /// `const char *`, converted from and to Python strings.
    pub fn is_c_string(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Pointer { base, .. }
                if matches!(**base, TypeDescriptor::Primitive { prim: Primitive::Int8, is_const: true })
        )
    }

    /// Name of the struct this descriptor is, points to or refers to.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Struct { name, .. } => Some(name),
            TypeDescriptor::PointerToStruct { base, .. }
            | TypeDescriptor::Reference { base, .. } => base.struct_name(),
            TypeDescriptor::Typedef { base, .. } => match **base {
                TypeDescriptor::Struct { .. } => base.struct_name(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Wrapper class for the struct behind this descriptor, when generated.
    fn wrapper<'a>(&'a self, names: &dyn NativeNames) -> Option<&'a str> {
        self.struct_name().filter(|name| names.has_wrapper(name))
    }

    /// Canonical name, without constness.
    pub fn name(&self) -> String {
        match self {
            TypeDescriptor::Primitive { prim, .. } => prim.c_name().to_string(),
            TypeDescriptor::Pointer { base, .. } | TypeDescriptor::PointerToStruct { base, .. } => {
                format!("{} *", base.name())
            }
            TypeDescriptor::Reference { base, .. } => format!("{} &", base.name()),
            TypeDescriptor::Array { base, len, .. } => format!("{}[{}]", base.name(), len),
            TypeDescriptor::Typedef { name, .. } | TypeDescriptor::Struct { name, .. } => {
                name.clone()
            }
            TypeDescriptor::OpaqueContainer => OPAQUE_CONTAINER.to_string(),
        }
    }

    /// Declaration-surface spelling.
    pub fn c_type(&self) -> String {
        match self {
            TypeDescriptor::Primitive { prim, is_const } => with_const(*is_const, prim.c_name()),
            TypeDescriptor::Pointer { base, is_const }
            | TypeDescriptor::PointerToStruct { base, is_const } => {
                // `char *const`: the pointer's own qualifier trails the star
                with_trailing_const(*is_const, format!("{} *", base.c_type()))
            }
            TypeDescriptor::Reference { base, .. } => format!("{} &", base.c_type()),
            // array constness is the element's and is spelled by it
            TypeDescriptor::Array { base, len, .. } => format!("{}[{}]", base.c_type(), len),
            TypeDescriptor::Typedef { name, is_const, .. }
            | TypeDescriptor::Struct { name, is_const } => with_const(*is_const, name),
            TypeDescriptor::OpaqueContainer => OPAQUE_CONTAINER.to_string(),
        }
    }

    /// Spelling of a mutable local holding this value in the wrapper surface.
    fn local_c_type(&self) -> String {
        match self {
            TypeDescriptor::Pointer { base, .. } | TypeDescriptor::PointerToStruct { base, .. } => {
                format!("{} *", base.c_type())
            }
            _ => self.c_type(),
        }
    }

    /// Declaration-surface spelling of a named parameter or field.
    pub fn c_type_with_name(&self, name: &str) -> String {
        if name.is_empty() {
            return self.c_type();
        }
        match self {
            TypeDescriptor::Array { base, len, .. } => {
                base.c_type_with_name(&format!("{}[{}]", name, len))
            }
            _ => {
                let c_type = self.c_type();
                if c_type.ends_with('*') || c_type.ends_with('&') {
                    format!("{}{}", c_type, name)
                } else {
                    format!("{} {}", c_type, name)
                }
            }
        }
    }

    /// `ctypes` structure field representation.
    pub fn storage(&self) -> String {
        match self {
            TypeDescriptor::Primitive { prim, .. } => prim.ctypes().to_string(),
            TypeDescriptor::Pointer { .. }
            | TypeDescriptor::PointerToStruct { .. }
            | TypeDescriptor::Reference { .. } => "ctypes.c_void_p".to_string(),
            TypeDescriptor::Array { base, len, .. } => format!("{} * {}", base.storage(), len),
            TypeDescriptor::Typedef { base, .. } => base.storage(),
            TypeDescriptor::Struct { name, .. } => name.clone(),
            TypeDescriptor::OpaqueContainer => OPAQUE_CONTAINER.to_string(),
        }
    }

    /// Host-facing type of a parameter.
    pub fn py_type(&self, names: &dyn NativeNames) -> String {
        match self {
            TypeDescriptor::Primitive { prim, .. } => prim.py_type().to_string(),
            TypeDescriptor::Pointer { .. } if self.is_c_string() => "Union[bytes, str]".to_string(),
            TypeDescriptor::Pointer { .. } | TypeDescriptor::OpaqueContainer => {
                "ctypes.c_void_p".to_string()
            }
            TypeDescriptor::PointerToStruct { .. } => match self.wrapper(names) {
                Some(wrapper) => format!("Optional[{}]", wrapper),
                None => "ctypes.c_void_p".to_string(),
            },
            TypeDescriptor::Reference { .. } | TypeDescriptor::Struct { .. } => {
                match self.wrapper(names) {
                    Some(wrapper) => wrapper.to_string(),
                    None => "ctypes.c_void_p".to_string(),
                }
            }
            TypeDescriptor::Array { .. } => "ctypes.Array".to_string(),
            TypeDescriptor::Typedef { base, .. } => base.py_type(names),
        }
    }

    /// Host-facing parameter declaration.
    pub fn param(&self, names: &dyn NativeNames, name: &str) -> String {
        format!("{}: {}", name, self.py_type(names))
    }

    /// Host-facing return annotation.
    pub fn result_typing(&self, names: &dyn NativeNames) -> String {
        match self {
            TypeDescriptor::Pointer { .. } if self.is_c_string() => "bytes".to_string(),
            TypeDescriptor::Array { .. } => "ctypes.c_void_p".to_string(),
            TypeDescriptor::Typedef { base, .. } => base.result_typing(names),
            // copied out of the native value
            TypeDescriptor::Struct { .. } => "bytes".to_string(),
            _ => self.py_type(names),
        }
    }

    /// Host-facing type of a field read through [`TypeDescriptor::to_py`].
    pub fn field_typing(&self, names: &dyn NativeNames) -> String {
        match self {
            TypeDescriptor::Array { .. } => "list".to_string(),
            TypeDescriptor::Typedef { base, .. } => base.field_typing(names),
            TypeDescriptor::Struct { .. } => self.py_type(names),
            _ => self.result_typing(names),
        }
    }

    /// Statements converting host argument `name` into native local `p{i}`.
    pub fn cdef_param(&self, names: &dyn NativeNames, i: usize, name: &str) -> Vec<String> {
        match self {
            TypeDescriptor::Primitive { prim, .. } => {
                vec![format!("cdef {} p{} = {}", prim.c_name(), i, name)]
            }
            TypeDescriptor::Pointer { .. } if self.is_c_string() => vec![
                format!("cdef const char *p{} = NULL", i),
                format!("if isinstance({}, bytes):", name),
                format!("    p{} = <const char *>{}", i, name),
                format!("if isinstance({}, str):", name),
                format!("    pp{} = {}.encode('utf-8')", i, name),
                format!("    p{} = <const char *>pp{}", i, i),
            ],
            TypeDescriptor::Pointer { .. } if self.is_void_pointer() => {
                let t = names.native(&self.local_c_type());
                vec![format!(
                    "cdef {t} p{i} = <{t}><uintptr_t>ctypes.cast({name}, ctypes.c_void_p).value if {name} else NULL"
                )]
            }
            TypeDescriptor::Pointer { .. } => {
                let t = names.native(&self.local_c_type());
                vec![format!(
                    "cdef {t} p{i} = <{t}><uintptr_t>ctypes.addressof({name}) if {name} else NULL"
                )]
            }
            TypeDescriptor::PointerToStruct { .. } => {
                let t = names.native(&self.local_c_type());
                match self.wrapper(names) {
                    Some(wrapper) => vec![format!(
                        "cdef {t} p{i} = (<{wrapper}>{name})._ptr if {name} else NULL"
                    )],
                    None => vec![format!(
                        "cdef {t} p{i} = <{t}><uintptr_t>ctypes.cast({name}, ctypes.c_void_p).value if {name} else NULL"
                    )],
                }
            }
            TypeDescriptor::Reference { base, .. } => {
                let t = names.native(&base.c_type());
                match (base.struct_name(), self.wrapper(names)) {
                    (_, Some(wrapper)) => vec![format!("cdef {t} *p{i} = (<{wrapper}>{name})._ptr")],
                    (Some(_), None) => vec![format!(
                        "cdef {t} *p{i} = <{t} *><uintptr_t>ctypes.cast({name}, ctypes.c_void_p).value"
                    )],
                    (None, None) => vec![format!(
                        "cdef {t} *p{i} = <{t} *><uintptr_t>ctypes.addressof({name})"
                    )],
                }
            }
            TypeDescriptor::Array { base, .. } => {
                let t = names.native(&base.c_type());
                vec![format!(
                    "cdef {t} *p{i} = <{t} *><uintptr_t>ctypes.addressof({name})"
                )]
            }
            TypeDescriptor::Typedef { base, .. } => base.cdef_param(names, i, name),
            TypeDescriptor::Struct { .. } => {
                let t = names.native(&self.c_type());
                match self.wrapper(names) {
                    Some(wrapper) => vec![format!("cdef {t} *p{i} = (<{wrapper}>{name})._ptr")],
                    None => vec![format!(
                        "cdef {t} *p{i} = <{t} *><uintptr_t>ctypes.cast({name}, ctypes.c_void_p).value"
                    )],
                }
            }
            TypeDescriptor::OpaqueContainer => vec![format!(
                "cdef void *p{i} = <void *><uintptr_t>ctypes.addressof({name})"
            )],
        }
    }

    /// Expression passing native local `p{i}` to the native call.
    pub fn call_arg(&self, i: usize) -> String {
        match self {
            TypeDescriptor::Reference { .. } | TypeDescriptor::Struct { .. } => format!("p{}[0]", i),
            TypeDescriptor::Typedef { base, .. } => base.call_arg(i),
            _ => format!("p{}", i),
        }
    }

    /// Statements evaluating the native `call` and returning its host value.
    pub fn cdef_result(&self, names: &dyn NativeNames, call: &str) -> Vec<String> {
        match self {
            TypeDescriptor::Primitive { .. } if self.is_void() => vec![call.to_string()],
            TypeDescriptor::Primitive { .. } => vec![format!("return {}", call)],
            TypeDescriptor::Pointer { .. } if self.is_c_string() => {
                vec![format!("return {}", call)]
            }
            TypeDescriptor::Pointer { .. } | TypeDescriptor::PointerToStruct { .. } => {
                let t = names.native(&self.local_c_type());
                let returned = match self.wrapper(names) {
                    Some(wrapper) => wrap_struct_pointer(names, wrapper, "value"),
                    None => "ctypes.c_void_p(<uintptr_t>value)".to_string(),
                };
                vec![
                    format!("cdef {} value = {}", t, call),
                    format!("return {}", returned),
                ]
            }
            TypeDescriptor::Reference { base, .. } => {
                let t = names.native(&base.c_type());
                let returned = match self.wrapper(names) {
                    Some(wrapper) => wrap_struct_pointer(names, wrapper, "value"),
                    None => "ctypes.c_void_p(<uintptr_t>value)".to_string(),
                };
                vec![
                    format!("cdef {} *value = &{}", t, call),
                    format!("return {}", returned),
                ]
            }
            TypeDescriptor::Array { base, .. } => {
                let t = names.native(&base.c_type());
                vec![
                    format!("cdef {} *value = {}", t, call),
                    "return ctypes.c_void_p(<uintptr_t>value)".to_string(),
                ]
            }
            TypeDescriptor::Typedef { base, .. } => base.cdef_result(names, call),
            TypeDescriptor::Struct { name, .. } => {
                let t = names.native(name);
                vec![
                    format!("cdef {} value = {}", t, call),
                    format!("return ctypes.string_at(<uintptr_t>&value, sizeof({}))", t),
                ]
            }
            TypeDescriptor::OpaqueContainer => vec![
                call.to_string(),
                format!("raise NotImplementedError('{} is not returned by value')", OPAQUE_CONTAINER),
            ],
        }
    }

    /// Host value of the native lvalue `expr`, used by field accessors.
    pub fn to_py(&self, names: &dyn NativeNames, expr: &str) -> String {
        match self {
            TypeDescriptor::Primitive { .. } => expr.to_string(),
            TypeDescriptor::Pointer { .. } if self.is_c_string() => {
                format!("{expr} if {expr} != NULL else None")
            }
            TypeDescriptor::Pointer { .. } => format!("ctypes.c_void_p(<uintptr_t>{})", expr),
            TypeDescriptor::PointerToStruct { .. } => match self.wrapper(names) {
                Some(wrapper) => wrap_struct_pointer(names, wrapper, expr),
                None => format!("ctypes.c_void_p(<uintptr_t>{})", expr),
            },
            TypeDescriptor::Reference { .. } | TypeDescriptor::Struct { .. } => {
                match self.wrapper(names) {
                    Some(wrapper) => wrap_struct_pointer(names, wrapper, &format!("&{}", expr)),
                    None => format!("ctypes.c_void_p(<uintptr_t>&{})", expr),
                }
            }
            TypeDescriptor::Array { base, len, .. } => format!(
                "[{} for i in range({})]",
                base.to_py(names, &format!("{}[i]", expr)),
                len
            ),
            TypeDescriptor::Typedef { base, .. } => base.to_py(names, expr),
            TypeDescriptor::OpaqueContainer => format!("ctypes.c_void_p(<uintptr_t>&{})", expr),
        }
    }

}

/// `Wrapper.from_ptr(<native *>ptr)`, dropping constness for the wrapper.
fn wrap_struct_pointer(names: &dyn NativeNames, wrapper: &str, ptr: &str) -> String {
    format!("{}.from_ptr(<{} *>{})", wrapper, names.native(wrapper), ptr)
}

fn with_const(is_const: bool, name: &str) -> String {
    if is_const {
        format!("const {}", name)
    } else {
        name.to_string()
    }
}

fn with_trailing_const(is_const: bool, spelling: String) -> String {
    if is_const {
        format!("{} const", spelling)
    } else {
        spelling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(is_const: bool) -> TypeDescriptor {
        TypeDescriptor::Struct {
            name: "ImVec2".to_string(),
            is_const,
        }
    }

    struct Qualified;

    impl NativeNames for Qualified {
        fn native(&self, c_type: &str) -> String {
            c_type.replace("Im", "cpp_imgui.Im")
        }
    }

    /// Qualified names where only `ImVec2` has a wrapper class.
    struct OnlyVec2;

    impl NativeNames for OnlyVec2 {
        fn native(&self, c_type: &str) -> String {
            Qualified.native(c_type)
        }

        fn has_wrapper(&self, name: &str) -> bool {
            name == "ImVec2"
        }
    }

    fn storage_struct() -> TypeDescriptor {
        TypeDescriptor::Struct {
            name: "ImGuiStorage".to_string(),
            is_const: false,
        }
    }

    #[test]
    fn test_primitive_renderings() {
        let float = TypeDescriptor::primitive(Primitive::Float, false);
        assert_eq!(float.c_type(), "float");
        assert_eq!(float.storage(), "ctypes.c_float");
        assert_eq!(float.param(&Unqualified, "v"), "v: float");
        assert_eq!(float.cdef_param(&Unqualified, 0, "v"), vec!["cdef float p0 = v"]);
        assert_eq!(float.cdef_result(&Unqualified, "f()"), vec!["return f()"]);

        let void = TypeDescriptor::primitive(Primitive::Void, false);
        assert_eq!(void.result_typing(&Unqualified), "None");
        assert_eq!(void.cdef_result(&Unqualified, "f()"), vec!["f()"]);
        assert!(!void.is_primitive());
    }

    #[test]
    fn test_pointer_to_struct_is_nullable_handle() {
        let ptr = TypeDescriptor::PointerToStruct {
            base: Box::new(vec2(true)),
            is_const: false,
        };
        assert_eq!(ptr.c_type(), "const ImVec2 *");
        assert_eq!(ptr.c_type_with_name("pos"), "const ImVec2 *pos");
        assert_eq!(ptr.storage(), "ctypes.c_void_p");
        assert_eq!(ptr.param(&Unqualified, "pos"), "pos: Optional[ImVec2]");
        assert_eq!(
            ptr.cdef_param(&Qualified, 1, "pos"),
            vec!["cdef const cpp_imgui.ImVec2 * p1 = (<ImVec2>pos)._ptr if pos else NULL"]
        );
        assert_eq!(
            ptr.to_py(&Qualified, "self._ptr.pos"),
            "ImVec2.from_ptr(<cpp_imgui.ImVec2 *>self._ptr.pos)"
        );
    }

    #[test]
    fn test_reference_result_takes_address() {
        let io = TypeDescriptor::Reference {
            base: Box::new(TypeDescriptor::Struct {
                name: "ImGuiIO".to_string(),
                is_const: false,
            }),
            is_const: false,
        };
        let lines = io.cdef_result(&Qualified, "cpp_imgui.GetIO()");
        assert_eq!(lines[0], "cdef cpp_imgui.ImGuiIO *value = &cpp_imgui.GetIO()");
        assert_eq!(lines[1], "return ImGuiIO.from_ptr(<cpp_imgui.ImGuiIO *>value)");
        assert_eq!(io.call_arg(3), "p3[0]");
        assert_eq!(io.result_typing(&Unqualified), "ImGuiIO");
    }

    #[test]
    fn test_c_string_conversion() {
        let s = TypeDescriptor::Pointer {
            base: Box::new(TypeDescriptor::primitive(Primitive::Int8, true)),
            is_const: false,
        };
        assert!(s.is_c_string());
        assert_eq!(s.c_type(), "const char *");
        assert_eq!(s.param(&Unqualified, "label"), "label: Union[bytes, str]");
        assert_eq!(s.result_typing(&Unqualified), "bytes");
        let lines = s.cdef_param(&Unqualified, 0, "label");
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "cdef const char *p0 = NULL");
    }

    #[test]
    fn test_array_spelling_and_storage() {
        let arr = TypeDescriptor::Array {
            base: Box::new(TypeDescriptor::primitive(Primitive::Float, false)),
            len: 4,
            is_const: false,
        };
        assert_eq!(arr.c_type_with_name("col"), "float col[4]");
        assert_eq!(arr.storage(), "ctypes.c_float * 4");
        assert_eq!(arr.to_py(&Unqualified, "self._ptr.col"), "[self._ptr.col[i] for i in range(4)]");
        assert_eq!(arr.field_typing(&Unqualified), "list");
    }

    #[test]
    fn test_typedef_follows_base() {
        let alias = TypeDescriptor::Typedef {
            name: "ImFontGlyphRef".to_string(),
            base: Box::new(vec2(false)),
            is_const: false,
        };
        assert_eq!(alias.c_type(), "ImFontGlyphRef");
        assert_eq!(alias.storage(), "ImVec2");
        assert_eq!(alias.call_arg(0), "p0[0]");
        assert_eq!(alias.struct_name(), Some("ImVec2"));
        assert_eq!(alias.depth(), 2);
    }

    #[test]
    fn test_void_pointer() {
        let p = TypeDescriptor::void_pointer(false);
        assert!(p.is_void_pointer());
        assert_eq!(p.c_type(), "void *");
        assert_eq!(p.py_type(&Unqualified), "ctypes.c_void_p");
        assert_eq!(p.name(), "void *");
    }

    #[test]
    fn test_struct_without_wrapper_crosses_as_address() {
        let ptr = TypeDescriptor::PointerToStruct {
            base: Box::new(storage_struct()),
            is_const: false,
        };
        assert_eq!(ptr.param(&OnlyVec2, "storage"), "storage: ctypes.c_void_p");
        assert_eq!(
            ptr.cdef_param(&OnlyVec2, 0, "storage"),
            vec!["cdef cpp_imgui.ImGuiStorage * p0 = <cpp_imgui.ImGuiStorage *><uintptr_t>ctypes.cast(storage, ctypes.c_void_p).value if storage else NULL"]
        );
        assert_eq!(
            ptr.cdef_result(&OnlyVec2, "cpp_imgui.GetStateStorage()"),
            vec![
                "cdef cpp_imgui.ImGuiStorage * value = cpp_imgui.GetStateStorage()",
                "return ctypes.c_void_p(<uintptr_t>value)",
            ]
        );
        assert_eq!(ptr.to_py(&OnlyVec2, "self._ptr.s"), "ctypes.c_void_p(<uintptr_t>self._ptr.s)");

        let by_ref = TypeDescriptor::Reference {
            base: Box::new(storage_struct()),
            is_const: false,
        };
        assert_eq!(by_ref.result_typing(&OnlyVec2), "ctypes.c_void_p");
        assert_eq!(
            by_ref.cdef_param(&OnlyVec2, 1, "s"),
            vec!["cdef cpp_imgui.ImGuiStorage *p1 = <cpp_imgui.ImGuiStorage *><uintptr_t>ctypes.cast(s, ctypes.c_void_p).value"]
        );
        assert_eq!(
            storage_struct().to_py(&OnlyVec2, "self._ptr.s"),
            "ctypes.c_void_p(<uintptr_t>&self._ptr.s)"
        );
        assert_eq!(storage_struct().field_typing(&OnlyVec2), "ctypes.c_void_p");

        // wrapped structs keep the class conventions
        assert_eq!(vec2(false).field_typing(&OnlyVec2), "ImVec2");
    }

    #[test]
    fn test_const_pointer_keeps_its_qualifier() {
        let p = TypeDescriptor::Pointer {
            base: Box::new(TypeDescriptor::primitive(Primitive::Int8, false)),
            is_const: true,
        };
        assert_eq!(p.c_type(), "char * const");
        assert_eq!(p.c_type_with_name("buf"), "char * const buf");
        assert_eq!(p.name(), "char *");
        // wrapper locals are assigned, so they drop the qualifier
        assert_eq!(
            p.cdef_param(&Unqualified, 0, "buf"),
            vec!["cdef char * p0 = <char *><uintptr_t>ctypes.addressof(buf) if buf else NULL"]
        );
    }
}

//! Per-struct exposure tables.
//!
//! A [`WrapTable`] is built once before emission and handed to the emitters
//! by reference; nothing mutates it afterwards.

use deargen_clang::TypeDescriptor;
use indexmap::IndexMap;

/// Structs whose nested types are not supported; never emitted.
pub const LEGACY_SKIP: &[&str] = &["ImGuiTextFilter", "ImGuiStorage"];

/// Which methods of a struct get declarations and wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MethodSelection {
    All,
    #[default]
    None,
    Named(Vec<String>),
}

impl MethodSelection {
    pub fn exposes(&self, method: &str) -> bool {
        match self {
            MethodSelection::All => true,
            MethodSelection::None => false,
            MethodSelection::Named(names) => names.iter().any(|n| n == method),
        }
    }
}

/// Exposure settings of one struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapFlags {
    pub name: String,
    pub fields: bool,
    pub methods: MethodSelection,
    /// Verbatim wrapper-surface methods, written at class indentation.
    pub custom_methods: Vec<String>,
}

impl WrapFlags {
    /// An entry exposing neither fields nor methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: false,
            methods: MethodSelection::None,
            custom_methods: Vec::new(),
        }
    }

    pub fn with_fields(mut self) -> Self {
        self.fields = true;
        self
    }

    pub fn with_methods(mut self, methods: MethodSelection) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_custom_method(mut self, source: impl Into<String>) -> Self {
        self.custom_methods.push(source.into());
        self
    }
}

/// A small struct passed from a tuple (or wrapper) and returned as a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueType {
    pub name: &'static str,
    pub components: &'static [&'static str],
}

pub const VALUE_TYPES: &[ValueType] = &[
    ValueType {
        name: "ImVec2",
        components: &["x", "y"],
    },
    ValueType {
        name: "ImVec4",
        components: &["x", "y", "z", "w"],
    },
];

impl ValueType {
    /// Native value built from host `arg`; `native` is the qualified type.
    pub fn from_host(&self, native: &str, arg: &str) -> String {
        let from_tuple: Vec<String> = (0..self.components.len())
            .map(|i| format!("{}[{}]", arg, i))
            .collect();
        let from_object: Vec<String> = self
            .components
            .iter()
            .map(|c| format!("{}.{}", arg, c))
            .collect();
        format!(
            "{native}({}) if isinstance({arg}, tuple) else {native}({})",
            from_tuple.join(", "),
            from_object.join(", ")
        )
    }

    /// Host tuple read from the native value `expr`.
    pub fn to_host(&self, expr: &str) -> String {
        let parts: Vec<String> = self
            .components
            .iter()
            .map(|c| format!("{}.{}", expr, c))
            .collect();
        format!("({})", parts.join(", "))
    }

    /// Host type of the returned tuple.
    pub fn typing(&self) -> String {
        format!("Tuple[{}]", vec!["float"; self.components.len()].join(", "))
    }

    /// Host type accepted as a parameter.
    pub fn param_typing(&self) -> String {
        format!("Union[{}, {}]", self.typing(), self.name)
    }
}

/// Immutable name-keyed exposure table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapTable {
    entries: IndexMap<String, WrapFlags>,
}

impl WrapTable {
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// The built-in Dear ImGui table.
    pub fn builtin() -> Self {
        let entries = [
            WrapFlags::new("ImVec2")
                .with_fields()
                .with_custom_method(iter_method(&["x", "y"])),
            WrapFlags::new("ImVec4")
                .with_fields()
                .with_custom_method(iter_method(&["x", "y", "z", "w"])),
            WrapFlags::new("ImFont"),
            WrapFlags::new("ImFontConfig").with_fields(),
            WrapFlags::new("ImFontAtlasCustomRect").with_fields(),
            WrapFlags::new("ImFontAtlas")
                .with_fields()
                .with_methods(MethodSelection::All),
            WrapFlags::new("ImGuiIO").with_fields(),
            WrapFlags::new("ImGuiContext"),
            WrapFlags::new("ImDrawCmd").with_fields(),
            WrapFlags::new("ImDrawData").with_fields(),
            WrapFlags::new("ImDrawListSplitter").with_fields(),
            WrapFlags::new("ImDrawCmdHeader").with_fields(),
            WrapFlags::new("ImDrawList").with_fields(),
            WrapFlags::new("ImGuiStyle"),
            WrapFlags::new("ImGuiViewport").with_fields(),
            WrapFlags::new("ImGuiWindowClass"),
        ];
        Self::empty().merge(entries)
    }

    /// Add entries; an entry replaces any existing one of the same name.
    pub fn merge(mut self, overrides: impl IntoIterator<Item = WrapFlags>) -> Self {
        for flags in overrides {
            self.entries.insert(flags.name.clone(), flags);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&WrapFlags> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Structs without an entry expose their fields.
    pub fn fields_exposed(&self, name: &str) -> bool {
        self.get(name).map_or(true, |flags| flags.fields)
    }

    /// Structs without an entry expose no methods.
    pub fn method_exposed(&self, name: &str, method: &str) -> bool {
        self.get(name).map_or(false, |flags| flags.methods.exposes(method))
    }

    pub fn custom_methods(&self, name: &str) -> &[String] {
        self.get(name)
            .map(|flags| flags.custom_methods.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        LEGACY_SKIP.contains(&name)
    }

    /// Value-type override for a by-value or const-reference struct.
    pub fn value_type(&self, ty: &TypeDescriptor) -> Option<&'static ValueType> {
        let name = match ty {
            TypeDescriptor::Struct { name, .. } => name,
            TypeDescriptor::Reference { base, .. } => match base.as_ref() {
                TypeDescriptor::Struct {
                    name,
                    is_const: true,
                } => name,
                _ => return None,
            },
            _ => return None,
        };
        VALUE_TYPES.iter().find(|v| v.name == name.as_str())
    }
}

impl Default for WrapTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn iter_method(components: &[&str]) -> String {
    let mut source = String::from("def __iter__(self):\n");
    for c in components {
        source.push_str(&format!("    yield self.{}\n", c));
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let table = WrapTable::default();
        assert_eq!(table.len(), 16);
        assert!(table.fields_exposed("ImGuiIO"));
        assert!(!table.fields_exposed("ImGuiStyle"));
        assert!(table.method_exposed("ImFontAtlas", "Build"));
        assert!(!table.method_exposed("ImDrawList", "AddLine"));
        // no entry: fields yes, methods no
        assert!(table.fields_exposed("ImGuiPayload"));
        assert!(!table.method_exposed("ImGuiPayload", "Clear"));
        assert_eq!(table.custom_methods("ImVec4").len(), 1);
        assert!(table.custom_methods("ImVec4")[0].contains("yield self.w"));
    }

    #[test]
    fn test_merge_replaces_by_name() {
        let table = WrapTable::builtin().merge([
            WrapFlags::new("ImGuiStyle").with_fields(),
            WrapFlags::new("ImDrawList")
                .with_fields()
                .with_methods(MethodSelection::Named(vec!["AddLine".to_string()])),
        ]);
        assert_eq!(table.len(), 16);
        assert!(table.fields_exposed("ImGuiStyle"));
        assert!(table.method_exposed("ImDrawList", "AddLine"));
        assert!(!table.method_exposed("ImDrawList", "AddRect"));
    }

    #[test]
    fn test_value_type_override() {
        let table = WrapTable::default();
        let vec2 = TypeDescriptor::Struct {
            name: "ImVec2".to_string(),
            is_const: false,
        };
        let v = table.value_type(&vec2).unwrap();
        assert_eq!(
            v.from_host("cpp_imgui.ImVec2", "size"),
            "cpp_imgui.ImVec2(size[0], size[1]) if isinstance(size, tuple) else cpp_imgui.ImVec2(size.x, size.y)"
        );
        assert_eq!(v.to_host("value"), "(value.x, value.y)");
        assert_eq!(v.typing(), "Tuple[float, float]");

        let mutable_ref = TypeDescriptor::Reference {
            base: Box::new(vec2),
            is_const: false,
        };
        assert!(table.value_type(&mutable_ref).is_none());
    }

    #[test]
    fn test_legacy_skip() {
        let table = WrapTable::empty();
        assert!(table.is_skipped("ImGuiTextFilter"));
        assert!(!table.is_skipped("ImGuiIO"));
    }
}

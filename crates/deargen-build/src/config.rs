//! Generator configuration types (deargen.toml format).

use crate::error::{ConfigError, Result};
use deargen_codegen::{GeneratorOptions, MethodSelection, WrapFlags, WrapTable};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Project metadata.
    pub project: ProjectConfig,

    /// Return types and declaration names dropped from both surfaces.
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Header parsing.
    #[serde(default)]
    pub parse: ParseConfig,

    /// Output artifacts.
    #[serde(default)]
    pub output: OutputConfig,

    /// Wrapper-surface naming.
    #[serde(default)]
    pub naming: NamingConfig,

    /// Struct exposure entries, merged over the built-in table.
    #[serde(rename = "wrap", default)]
    pub wraps: Vec<WrapConfig>,
}

/// Project metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    pub name: String,

    /// Project root directory (default: config file directory).
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// How headers are handed to libclang.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Headers whose declarations are collected.
    pub headers: Vec<PathBuf>,

    /// Include directories.
    pub includes: Vec<PathBuf>,

    /// Preprocessor definitions.
    pub defines: Vec<String>,

    /// Additional compiler flags.
    pub cflags: Vec<String>,

    /// C++ standard (e.g., "c++17").
    pub std: String,

    /// Toolchain prefixes not reported as skipped headers.
    pub system_prefixes: Option<Vec<String>>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            includes: Vec::new(),
            defines: vec!["NOMINMAX".to_string()],
            cflags: Vec::new(),
            std: "c++17".to_string(),
            system_prefixes: None,
        }
    }
}

/// Where the two surfaces are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Declaration surface (default: `{module}.pxd`).
    pub pxd: Option<PathBuf>,

    /// Wrapper surface (default: `{project.name}.pyx`).
    pub pyx: Option<PathBuf>,

    /// Module name of the declaration surface.
    pub module: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pxd: None,
            pyx: None,
            module: "cpp_imgui".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Prefix of library identifiers qualified with the module name.
    pub type_prefix: String,

    /// Library identifiers never qualified.
    pub exempt: Vec<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            type_prefix: "Im".to_string(),
            exempt: vec!["ImGuiTextRange".to_string()],
        }
    }
}

/// `[[wrap]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapConfig {
    /// Struct name.
    pub name: String,

    /// Expose field accessors.
    #[serde(default)]
    pub fields: bool,

    /// `true` for every method, or a list of method names.
    #[serde(default)]
    pub methods: MethodsConfig,

    /// Verbatim wrapper-surface methods.
    #[serde(default)]
    pub custom_methods: Vec<String>,
}

/// `methods = true` or `methods = ["Build", "Clear"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodsConfig {
    All(bool),
    Named(Vec<String>),
}

impl Default for MethodsConfig {
    fn default() -> Self {
        MethodsConfig::All(false)
    }
}

impl From<&MethodsConfig> for MethodSelection {
    fn from(methods: &MethodsConfig) -> Self {
        match methods {
            MethodsConfig::All(true) => MethodSelection::All,
            MethodsConfig::All(false) => MethodSelection::None,
            MethodsConfig::Named(names) => MethodSelection::Named(names.clone()),
        }
    }
}

impl From<&WrapConfig> for WrapFlags {
    fn from(entry: &WrapConfig) -> Self {
        let mut flags = WrapFlags::new(entry.name.clone()).with_methods((&entry.methods).into());
        flags.fields = entry.fields;
        for source in &entry.custom_methods {
            flags = flags.with_custom_method(source.clone());
        }
        flags
    }
}

impl GeneratorConfig {
    /// Configuration with every default and no headers.
    pub fn new(name: &str) -> Self {
        Self {
            project: ProjectConfig {
                name: name.to_string(),
                root: None,
            },
            excludes: Vec::new(),
            parse: ParseConfig::default(),
            output: OutputConfig::default(),
            naming: NamingConfig::default(),
            wraps: Vec::new(),
        }
    }

    /// Load configuration from a TOML file; relative paths resolve against
    /// the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base)
    }

    /// Parse configuration text, resolving relative paths against `base`.
    pub fn parse(content: &str, base: &Path) -> Result<Self> {
        let mut config: GeneratorConfig = toml::from_str(content)?;
        config.resolve_paths(base);
        let root = config.root();
        debug!(project = %config.project.name, root = %root.display(), "loaded config");
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let root = match &self.project.root {
            Some(root) => base.join(root),
            None => base.to_path_buf(),
        };
        for path in self.parse.headers.iter_mut().chain(self.parse.includes.iter_mut()) {
            *path = root.join(&*path);
        }
        for path in [&mut self.output.pxd, &mut self.output.pyx].into_iter().flatten() {
            *path = root.join(&*path);
        }
        self.project.root = Some(root);
    }

    /// Project root directory.
    pub fn root(&self) -> PathBuf {
        self.project.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn pxd_path(&self) -> PathBuf {
        self.output
            .pxd
            .clone()
            .unwrap_or_else(|| self.root().join(format!("{}.pxd", self.output.module)))
    }

    pub fn pyx_path(&self) -> PathBuf {
        self.output
            .pyx
            .clone()
            .unwrap_or_else(|| self.root().join(format!("{}.pyx", self.project.name)))
    }

    /// Extra libclang arguments: the standard, definitions, then raw flags.
    pub fn clang_flags(&self) -> Vec<String> {
        let mut flags = vec![format!("-std={}", self.parse.std)];
        flags.extend(self.parse.defines.iter().map(|d| format!("-D{}", d)));
        flags.extend(self.parse.cflags.iter().cloned());
        flags
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            module: self.output.module.clone(),
            type_prefix: self.naming.type_prefix.clone(),
            exempt: self.naming.exempt.clone(),
            excludes: self.excludes.clone(),
        }
    }

    /// Built-in table with the `[[wrap]]` entries merged over it.
    pub fn wrap_table(&self) -> WrapTable {
        WrapTable::builtin().merge(self.wraps.iter().map(WrapFlags::from))
    }

    /// Check that a run can be started with this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(ConfigError::Validation("project name is empty".to_string()));
        }
        if self.parse.headers.is_empty() {
            return Err(ConfigError::Validation("no headers to parse".to_string()));
        }
        if !is_identifier(&self.output.module) {
            return Err(ConfigError::Validation(format!(
                "module `{}` is not a valid identifier",
                self.output.module
            )));
        }
        if self.naming.type_prefix.is_empty() {
            return Err(ConfigError::Validation("type prefix is empty".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        for entry in &self.wraps {
            if entry.name.is_empty() {
                return Err(ConfigError::Validation("wrap entry without a name".to_string()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate wrap entry `{}`",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
excludes = ["ImDrawListSharedData *"]

[project]
name = "imgui"
root = "vendor"

[parse]
headers = ["imgui/imgui.h"]
includes = ["imgui", "/usr/local/include"]
defines = ["NOMINMAX", "IMGUI_DISABLE_OBSOLETE_FUNCTIONS"]
std = "c++20"

[output]
module = "native_imgui"

[[wrap]]
name = "ImGuiStyle"
fields = true
methods = ["ScaleAllSizes"]

[[wrap]]
name = "ImDrawList"
methods = true
        "#;

        let config = GeneratorConfig::parse(toml, Path::new("/work")).unwrap();

        assert_eq!(config.project.name, "imgui");
        assert_eq!(config.root(), PathBuf::from("/work/vendor"));
        assert_eq!(config.parse.headers, vec![PathBuf::from("/work/vendor/imgui/imgui.h")]);
        assert_eq!(
            config.parse.includes,
            vec![PathBuf::from("/work/vendor/imgui"), PathBuf::from("/usr/local/include")]
        );
        assert_eq!(config.excludes, vec!["ImDrawListSharedData *"]);
        assert_eq!(config.pxd_path(), PathBuf::from("/work/vendor/native_imgui.pxd"));
        assert_eq!(config.pyx_path(), PathBuf::from("/work/vendor/imgui.pyx"));

        assert_eq!(
            config.wraps[0].methods,
            MethodsConfig::Named(vec!["ScaleAllSizes".to_string()])
        );
        assert_eq!(config.wraps[1].methods, MethodsConfig::All(true));
        assert!(!config.wraps[1].fields);
    }

    #[test]
    fn test_defaults() {
        let toml = r#"
[project]
name = "imgui"
        "#;

        let config = GeneratorConfig::parse(toml, Path::new(".")).unwrap();
        assert_eq!(config.parse.std, "c++17");
        assert_eq!(config.parse.defines, vec!["NOMINMAX"]);
        assert_eq!(config.output.module, "cpp_imgui");
        assert_eq!(config.naming.type_prefix, "Im");
        assert_eq!(config.naming.exempt, vec!["ImGuiTextRange"]);
        assert!(config.parse.system_prefixes.is_none());
        assert_eq!(config.generator_options(), GeneratorOptions::default());
    }

    #[test]
    fn test_clang_flags() {
        let mut config = GeneratorConfig::new("imgui");
        config.parse.cflags = vec!["-Wno-everything".to_string()];
        assert_eq!(
            config.clang_flags(),
            vec!["-std=c++17", "-DNOMINMAX", "-Wno-everything"]
        );
    }

    #[test]
    fn test_wrap_table_overrides_builtin() {
        let mut config = GeneratorConfig::new("imgui");
        config.wraps.push(WrapConfig {
            name: "ImGuiStyle".to_string(),
            fields: true,
            methods: MethodsConfig::Named(vec!["ScaleAllSizes".to_string()]),
            custom_methods: vec![],
        });
        config.wraps.push(WrapConfig {
            name: "ImGuiListClipper".to_string(),
            fields: false,
            methods: MethodsConfig::All(true),
            custom_methods: vec!["def __len__(self):\n    return self._ptr.ItemsCount\n".to_string()],
        });

        let table = config.wrap_table();
        assert_eq!(table.len(), WrapTable::builtin().len() + 1);
        assert!(table.fields_exposed("ImGuiStyle"));
        assert!(table.method_exposed("ImGuiStyle", "ScaleAllSizes"));
        assert!(!table.method_exposed("ImGuiStyle", "Other"));
        assert!(table.method_exposed("ImGuiListClipper", "Step"));
        assert_eq!(table.custom_methods("ImGuiListClipper").len(), 1);
        // untouched built-in entries survive
        assert!(table.method_exposed("ImFontAtlas", "Build"));
    }

    #[test]
    fn test_validation() {
        let mut config = GeneratorConfig::new("imgui");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.parse.headers.push(PathBuf::from("imgui.h"));
        assert!(config.validate().is_ok());

        config.output.module = "cpp-imgui".to_string();
        assert!(config.validate().is_err());
        config.output.module = "cpp_imgui".to_string();

        let entry = WrapConfig {
            name: "ImFont".to_string(),
            fields: true,
            methods: MethodsConfig::default(),
            custom_methods: vec![],
        };
        config.wraps = vec![entry.clone(), entry];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = GeneratorConfig::parse("[project", Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml(_)));

        // `methods` must be a bool or a list of names
        let toml = r#"
[project]
name = "imgui"

[[wrap]]
name = "ImFont"
methods = 3
        "#;
        assert!(GeneratorConfig::parse(toml, Path::new(".")).is_err());
    }
}

//! Configuration for deargen runs.
//!
//! A `deargen.toml` names the headers to parse, the flags handed to libclang,
//! where the two surfaces are written, and how structs are exposed.
//!
//! # Example
//!
//! ```toml
//! # deargen.toml
//! excludes = ["ImDrawListSharedData *"]
//!
//! [project]
//! name = "imgui"
//!
//! [parse]
//! headers = ["imgui/imgui.h"]
//! includes = ["imgui"]
//! defines = ["NOMINMAX"]
//!
//! [output]
//! pxd = "cimgui/cpp_imgui.pxd"
//! pyx = "cimgui/imgui.pyx"
//!
//! [[wrap]]
//! name = "ImGuiStyle"
//! fields = true
//! methods = ["ScaleAllSizes"]
//! ```

mod config;
mod error;

pub use config::{
    GeneratorConfig, MethodsConfig, NamingConfig, OutputConfig, ParseConfig, ProjectConfig,
    WrapConfig,
};
pub use error::{ConfigError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_basic_config() {
        let toml = r#"
[project]
name = "imgui"

[parse]
headers = ["imgui.h"]
        "#;

        let config = GeneratorConfig::parse(toml, Path::new("")).expect("Failed to parse config");
        assert_eq!(config.project.name, "imgui");
        assert_eq!(config.parse.headers.len(), 1);
        assert!(config.validate().is_ok());
    }
}

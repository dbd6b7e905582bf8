use clap::{Args, Parser, Subcommand};
use deargen_build::GeneratorConfig;
use deargen_clang::{ClangParser, CollectedDecls, Collector, TranslationUnit, TypedefOrStruct};
use deargen_codegen::{Bindings, Generator};
use miette::{miette, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file picked up from the working directory.
const DEFAULT_CONFIG: &str = "deargen.toml";

#[derive(Parser)]
#[command(name = "deargen")]
#[command(author, version, about = "Cython binding generator for Dear ImGui headers")]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse headers and write the .pxd and .pyx files
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Declaration surface output path
        #[arg(long)]
        pxd: Option<PathBuf>,

        /// Wrapper surface output path
        #[arg(long)]
        pyx: Option<PathBuf>,
    },

    /// Parse headers and resolve every signature without writing output
    Check {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print the collected declarations and the headers they came from
    Dump {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args, Debug, Default)]
struct InputArgs {
    /// Configuration file (default: ./deargen.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Header to parse; replaces the configured headers
    #[arg(long = "header")]
    headers: Vec<PathBuf>,

    /// Include directory, added after the configured ones
    #[arg(short = 'I', long = "include")]
    includes: Vec<PathBuf>,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    match cli.command {
        Commands::Generate { input, pxd, pyx } => {
            let mut config = load_config(&input)?;
            if let Some(pxd) = pxd {
                config.output.pxd = Some(pxd);
            }
            if let Some(pyx) = pyx {
                config.output.pyx = Some(pyx);
            }

            let (tu, decls) = analyze(&config)?;
            let bindings = render(&config, &tu, &decls)?;

            // nothing is written unless both surfaces rendered
            let pxd_path = config.pxd_path();
            let pyx_path = config.pyx_path();
            write_outputs(&[
                (pxd_path.as_path(), bindings.pxd.as_str()),
                (pyx_path.as_path(), bindings.pyx.as_str()),
            ])?;
            if !cli.quiet {
                println!("Wrote {}", pxd_path.display());
                println!("Wrote {}", pyx_path.display());
            }
        }

        Commands::Check { input } => {
            let config = load_config(&input)?;
            let (tu, decls) = analyze(&config)?;
            render(&config, &tu, &decls)?;
            if !cli.quiet {
                println!(
                    "OK: {} functions, {} enums, {} typedefs and structs",
                    decls.functions.len(),
                    decls.enums.len(),
                    decls.typedef_structs.len()
                );
            }
        }

        Commands::Dump { input } => {
            let config = load_config(&input)?;
            let (tu, decls) = analyze(&config)?;
            print!("{}", dump(&tu, &decls));
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("DEARGEN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| miette!("Failed to initialize tracing subscriber: {}", e))
}

/// Configuration file (explicit or default) with command-line overrides.
fn load_config(input: &InputArgs) -> Result<GeneratorConfig> {
    let mut config = match &input.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            GeneratorConfig::from_file(Path::new(DEFAULT_CONFIG))?
        }
        None => GeneratorConfig::new("imgui"),
    };
    apply_overrides(&mut config, input);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut GeneratorConfig, input: &InputArgs) {
    if !input.headers.is_empty() {
        config.parse.headers = input.headers.clone();
    }
    config.parse.includes.extend(input.includes.iter().cloned());
}

/// Parse the configured headers and collect their declarations.
fn analyze(config: &GeneratorConfig) -> Result<(TranslationUnit, CollectedDecls)> {
    let tu = {
        let parser = ClangParser::new()?;
        parser.parse_headers(
            &config.parse.headers,
            &config.parse.includes,
            &config.clang_flags(),
        )?
    };

    let mut collector = Collector::new(&config.parse.headers);
    if let Some(prefixes) = &config.parse.system_prefixes {
        collector = collector.with_system_prefixes(prefixes.clone());
    }
    let decls = collector.traverse(&tu);

    if decls.used_headers.is_empty() {
        warn!("no declarations found in the requested headers");
    }
    for header in &decls.skipped_headers {
        info!(header = %header.display(), "skipped foreign header");
    }
    Ok((tu, decls))
}

fn render(config: &GeneratorConfig, tu: &TranslationUnit, decls: &CollectedDecls) -> Result<Bindings> {
    let bindings = Generator::new(tu, decls)
        .with_wrap_table(config.wrap_table())
        .with_options(config.generator_options())
        .generate()?;
    Ok(bindings)
}

/// Write every file or leave all targets untouched.
///
/// Contents go to temporary siblings first; targets are replaced only once
/// every temporary file has been written.
fn write_outputs(outputs: &[(&Path, &str)]) -> Result<()> {
    let mut staged = Vec::with_capacity(outputs.len());
    for (path, contents) in outputs {
        staged.push((*path, stage_output(path, contents)?));
    }
    for (path, file) in staged {
        file.persist(path)
            .map_err(|e| miette!("Failed to write {}: {}", path.display(), e.error))?;
    }
    Ok(())
}

fn stage_output(path: &Path, contents: &str) -> Result<tempfile::NamedTempFile> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)
                .map_err(|e| miette!("Failed to create {}: {}", parent.display(), e))?;
            parent
        }
        None => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| miette!("Failed to stage {}: {}", path.display(), e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| miette!("Failed to write {}: {}", path.display(), e))?;
    Ok(file)
}

/// Human-readable listing of a collection run.
fn dump(tu: &TranslationUnit, decls: &CollectedDecls) -> String {
    let qualified = |path: &deargen_clang::DeclPath| {
        let name = &tu.node(path.cursor()).spelling;
        match path.namespace(tu) {
            Some(ns) => format!("{}::{}", ns, name),
            None => name.clone(),
        }
    };

    let mut out = String::new();
    for header in &decls.used_headers {
        out.push_str(&format!("header {}\n", header.display()));
    }
    for header in &decls.skipped_headers {
        out.push_str(&format!("skipped {}\n", header.display()));
    }
    for entry in &decls.typedef_structs {
        let kind = match entry {
            TypedefOrStruct::Typedef(_) => "typedef",
            TypedefOrStruct::Struct(_) => "struct",
        };
        out.push_str(&format!("{} {}\n", kind, qualified(entry.path())));
    }
    for decl in &decls.enums {
        out.push_str(&format!("enum {}\n", qualified(&decl.path)));
    }
    for decl in &decls.functions {
        out.push_str(&format!("function {}\n", qualified(&decl.path)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use deargen_clang::{CursorKind, NodeId};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_arguments() {
        let cli = Cli::try_parse_from([
            "deargen",
            "generate",
            "--header",
            "imgui.h",
            "-I",
            "vendor",
            "--pyx",
            "out/imgui.pyx",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Generate { input, pxd, pyx } = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(input.headers, vec![PathBuf::from("imgui.h")]);
        assert_eq!(input.includes, vec![PathBuf::from("vendor")]);
        assert!(pxd.is_none());
        assert_eq!(pyx, Some(PathBuf::from("out/imgui.pyx")));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["deargen", "check", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = GeneratorConfig::new("imgui");
        config.parse.headers = vec![PathBuf::from("a.h")];
        config.parse.includes = vec![PathBuf::from("inc")];

        apply_overrides(&mut config, &InputArgs::default());
        assert_eq!(config.parse.headers, vec![PathBuf::from("a.h")]);

        let input = InputArgs {
            config: None,
            headers: vec![PathBuf::from("b.h")],
            includes: vec![PathBuf::from("more")],
        };
        apply_overrides(&mut config, &input);
        assert_eq!(config.parse.headers, vec![PathBuf::from("b.h")]);
        assert_eq!(
            config.parse.includes,
            vec![PathBuf::from("inc"), PathBuf::from("more")]
        );
    }

    #[test]
    fn test_outputs_written_together() {
        let dir = tempfile::tempdir().unwrap();
        let pxd = dir.path().join("out/imgui.pxd");
        let pyx = dir.path().join("out/imgui.pyx");

        write_outputs(&[(pxd.as_path(), "pxd"), (pyx.as_path(), "pyx")]).unwrap();
        assert_eq!(std::fs::read_to_string(&pxd).unwrap(), "pxd");
        assert_eq!(std::fs::read_to_string(&pyx).unwrap(), "pyx");
        // no temporary siblings left behind
        assert_eq!(std::fs::read_dir(dir.path().join("out")).unwrap().count(), 2);
    }

    #[test]
    fn test_failed_output_keeps_previous_files() {
        let dir = tempfile::tempdir().unwrap();
        let pxd = dir.path().join("imgui.pxd");
        std::fs::write(&pxd, "old").unwrap();
        // a regular file where the pyx directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();
        let pyx = blocker.join("imgui.pyx");

        assert!(write_outputs(&[(pxd.as_path(), "new"), (pyx.as_path(), "pyx")]).is_err());
        assert_eq!(std::fs::read_to_string(&pxd).unwrap(), "old");
        assert!(!pyx.exists());
    }

    #[test]
    fn test_dump_lists_declarations() {
        let mut tu = TranslationUnit::new();
        let ns = tu.add_child(NodeId::ROOT, CursorKind::Namespace, "ImGui");
        let f = tu.add_child(ns, CursorKind::FunctionDecl, "NewFrame");
        let s = tu.add_child(NodeId::ROOT, CursorKind::StructDecl, "ImVec2");
        for id in [ns, f, s] {
            tu.node_mut(id).location.file = Some(PathBuf::from("imgui.h"));
        }

        let decls = Collector::new(&[PathBuf::from("imgui.h")]).traverse(&tu);
        assert_eq!(
            dump(&tu, &decls),
            "header imgui.h\nstruct ImVec2\nfunction ImGui::NewFrame\n"
        );
    }
}

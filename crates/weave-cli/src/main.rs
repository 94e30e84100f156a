//! `weave` — generate a project from an archetype, validate one, or
//! enumerate its input variations.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use weave_ast::Script;
use weave_cli::archive::FilesystemArchive;
use weave_cli::colors::{bold, green, red, status_label};
use weave_cli::config::{load_answers, load_project_config, AnswersFile, ProjectConfig};
use weave_cli::diagnostics::{format_invocation_error, format_validation_errors};
use weave_cli::generator::{generate, GeneratorVisitor};
use weave_cli::json_parser::JsonScriptParser;
use weave_cli::prompt::TerminalPrompter;
use weave_context::Context;
use weave_engine::{build_input_tree, compile, variations, CompileMode, Invoker};
use weave_loader::Loader;
use weave_value::Expression;

#[derive(Parser)]
#[command(
    name = "weave",
    version,
    about = "Generate, validate, and explore project-scaffolding archetypes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a project from an archetype
    Generate {
        /// Path to weave.toml
        #[arg(long, default_value = "weave.toml")]
        manifest: PathBuf,
        /// Path to a TOML answers file (externalValues/externalDefaults)
        #[arg(long)]
        answers: Option<PathBuf>,
        /// Prompt on the terminal for any input the answers file doesn't resolve
        #[arg(long)]
        interactive: bool,
        /// Output directory, overriding weave.toml's [output] section
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate an archetype without generating anything
    Validate {
        #[arg(long, default_value = "weave.toml")]
        manifest: PathBuf,
    },
    /// Enumerate every admissible input combination
    Variations {
        #[arg(long, default_value = "weave.toml")]
        manifest: PathBuf,
        /// Exclude combinations matching this expression (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Generate { manifest, answers, interactive, output } => cmd_generate(&manifest, answers.as_deref(), interactive, output),
        Commands::Validate { manifest } => cmd_validate(&manifest),
        Commands::Variations { manifest, filters } => cmd_variations(&manifest, &filters),
    };

    if let Err(message) = result {
        eprintln!("{} {message}", red("error:"));
        std::process::exit(1);
    }
}

fn load_entry(manifest: &Path) -> Result<(ProjectConfig, PathBuf, Loader<FilesystemArchive, JsonScriptParser>, Arc<Script>), String> {
    let config = load_project_config(manifest).map_err(|e| e.to_string())?;
    let manifest_dir = manifest.parent().unwrap_or_else(|| Path::new("."));
    let archive_root = manifest_dir.join(&config.archetype.root);
    let archive = FilesystemArchive::new(&archive_root);
    let mut loader = Loader::new(archive, JsonScriptParser);
    let (_, script) = loader.load(&config.archetype.entry).map_err(|e| e.to_string())?;
    Ok((config, archive_root, loader, script))
}

fn cmd_generate(manifest: &Path, answers_path: Option<&Path>, interactive: bool, output_override: Option<PathBuf>) -> Result<(), String> {
    let (config, archive_root, mut loader, script) = load_entry(manifest)?;

    println!("{} {}", status_label("Generating"), bold(&config.archetype.entry));

    let mut ctx = Context::new();
    let answers = match answers_path {
        Some(path) => Some(load_answers(path).map_err(|e| e.to_string())?),
        None => None,
    };
    if let Some(answers) = &answers {
        install_answers(&mut ctx, answers)?;
    }

    let mut visitor = GeneratorVisitor::new(archive_root);
    let mut prompter = TerminalPrompter;
    let mut invoker = Invoker::new(&mut loader);
    let prompter_ref: Option<&mut dyn weave_engine::Prompter> = if interactive { Some(&mut prompter) } else { None };

    invoker
        .invoke(&script, &script.root, &mut ctx, prompter_ref, &mut visitor)
        .map_err(|e| format_invocation_error(&e))?;

    let model = invoker.into_model();
    let output_dir = output_override.unwrap_or_else(|| manifest.parent().unwrap_or_else(|| Path::new(".")).join(&config.output.directory));
    std::fs::create_dir_all(&output_dir).map_err(|e| format!("could not create '{}': {e}", output_dir.display()))?;

    let written = generate(&mut visitor, &model, &output_dir).map_err(|e| e.to_string())?;
    println!("{} {} file(s) written to {}", green("done:"), written.len(), bold(&output_dir.display().to_string()));
    Ok(())
}

fn install_answers(ctx: &mut Context, answers: &AnswersFile) -> Result<(), String> {
    ctx.external_values(&answers.external_values()).map_err(|e| e.to_string())?;
    ctx.external_defaults(&answers.external_defaults()).map_err(|e| e.to_string())?;
    Ok(())
}

fn cmd_validate(manifest: &Path) -> Result<(), String> {
    let (_, _, _, script) = load_entry(manifest)?;
    let result = compile(&script.root, CompileMode::Full);
    if result.is_valid() {
        println!("{} archetype is valid", green("✓"));
        Ok(())
    } else {
        eprint!("{}", format_validation_errors(&result.errors));
        Err("validation failed".to_string())
    }
}

fn cmd_variations(manifest: &Path, filter_sources: &[String]) -> Result<(), String> {
    let (_, _, _, script) = load_entry(manifest)?;
    let tree = build_input_tree(&script.root);
    let filters = filter_sources
        .iter()
        .map(|s| Expression::parse(s).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    let combos = variations(&tree, &filters).map_err(|e| e.to_string())?;
    for combo in &combos {
        let rendered: Vec<String> = combo.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("{}", rendered.join(", "));
    }
    println!("{} {} combination(s)", status_label("Total"), combos.len());
    Ok(())
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tomato_codegen::output::WriteOutcome;
use tomato_codegen::{CompileError, GeneratorOptions, Language, RunConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tomato")]
#[command(about = "Compiles .htmto view templates into TypeScript view classes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile every template and write the views and stylesheet
    Build(BuildArgs),

    /// Compile every template without writing any output
    Check(BuildArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Folder searched recursively for .htmto templates
    #[arg(long, default_value = "views")]
    tomato_in: PathBuf,

    /// File the generated views are written to; the stylesheet goes next to it
    #[arg(long, default_value = "gen/views.ts")]
    tomato_out: PathBuf,

    /// Language of the generated views
    #[arg(long, default_value = "ts")]
    language: String,

    /// Runtime base class the generated views extend
    #[arg(long, default_value = "View")]
    base_class: String,

    /// Runtime function that creates generic element views
    #[arg(long, default_value = "q")]
    factory: String,

    /// Module the base class and factory are imported from
    #[arg(long, default_value = "../ts/util/q")]
    import_location: String,

    /// Give every generated view a debug-id attribute
    #[arg(long)]
    debug_ids: bool,
}

impl BuildArgs {
    fn into_config(self) -> Result<RunConfig, CompileError> {
        Ok(RunConfig {
            input_dir: self.tomato_in,
            output_file: self.tomato_out,
            language: self.language.parse::<Language>()?,
            options: GeneratorOptions {
                view_base_class: self.base_class,
                view_factory: self.factory,
                import_location: self.import_location,
            },
            force_debug_ids: self.debug_ids,
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Build(args) => cmd_build(args),
        Command::Check(args) => cmd_check(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_build(args: BuildArgs) -> Result<(), CompileError> {
    let config = args.into_config()?;
    let report = tomato_codegen::generate_tomatoes(&config)?;

    match report.outcome {
        WriteOutcome::Written => eprintln!(
            "Built: {} ({} views)",
            config.output_file.display(),
            report.views
        ),
        WriteOutcome::Unchanged => eprintln!(
            "Up to date: {} ({} views)",
            config.output_file.display(),
            report.views
        ),
    }
    Ok(())
}

fn cmd_check(args: BuildArgs) -> Result<(), CompileError> {
    let config = args.into_config()?;
    let views = tomato_codegen::check_tomatoes(&config)?;
    eprintln!("OK: {views} views in {}", config.input_dir.display());
    Ok(())
}

//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use addon_forge_adapters::{JsonLogger, StderrLogSink};
use addon_forge_ports::{LogLevel, LoggerPort};
use addon_forge_shared::{ErrorCode, ErrorEnvelope};
use clap::{Parser, Subcommand};
use commands::{
    AssembleCommandInput, GenerateCommandInput, MergeCommandInput, run_assemble, run_config_show,
    run_generate, run_info, run_merge,
};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "adforge",
    version,
    about = "AI-assisted addon bundle generator and packager",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build and version details.
    Info,
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate an addon bundle from a prompt and package it.
    Generate {
        /// Addon name (drives the archive file name).
        #[arg(long)]
        name: String,
        /// Prompt describing the addon to generate.
        #[arg(long)]
        prompt: String,
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Optional system instruction file overriding the built-in one.
        #[arg(long)]
        instruction: Option<PathBuf>,
        /// Input files forwarded as context (textures, sounds, packs).
        #[arg(long = "input")]
        inputs: Vec<PathBuf>,
        /// Output directory for the archive (defaults to the current directory).
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// First-pass sampling temperature override.
        #[arg(long)]
        temperature: Option<f32>,
        /// Save the generation draft JSON next to the archive.
        #[arg(long)]
        save_draft: Option<PathBuf>,
    },
    /// Package a previously saved draft without regeneration.
    Assemble {
        /// Addon name (drives the archive file name).
        #[arg(long)]
        name: String,
        /// Draft JSON produced by `generate --save-draft`.
        #[arg(long)]
        draft: PathBuf,
        /// Input files available for relocation.
        #[arg(long = "input")]
        inputs: Vec<PathBuf>,
        /// Output directory for the archive (defaults to the current directory).
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Combine up to two pre-built containers into one archive.
    Merge {
        /// Addon name (drives the archive file name).
        #[arg(long)]
        name: String,
        /// Container files (.mcpack/.mcaddon/.zip), at most two.
        #[arg(required = true, num_args = 1..=2)]
        containers: Vec<PathBuf>,
        /// Output directory for the archive (defaults to the current directory).
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config after env overrides.
    Show {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Rendered output of one command run.
pub struct CliOutput {
    /// Text written to standard output.
    pub stdout: String,
    /// Text written to standard error.
    pub stderr: String,
    /// Resulting process exit code.
    pub exit_code: ExitCode,
}

/// Map an error envelope to a process exit code.
#[must_use]
pub fn envelope_exit_code(error: &ErrorEnvelope) -> ExitCode {
    if error.code == ErrorCode::io() || error.code == ErrorCode::not_found() {
        ExitCode::Io
    } else if matches!(
        error.kind,
        addon_forge_shared::ErrorKind::Expected | addon_forge_shared::ErrorKind::Invariant
    ) {
        ExitCode::InvalidInput
    } else {
        ExitCode::Internal
    }
}

/// Render an error envelope for the selected output mode.
#[must_use]
pub fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let exit_code = envelope_exit_code(error);
    let stdout = if mode.is_json() {
        serde_json::to_string_pretty(&serde_json::json!({
            "status": "error",
            "code": error.code.to_string(),
            "message": error.message,
            "metadata": error.metadata,
        }))
        .map_or_else(
            |_| format!("{{\"status\":\"error\",\"message\":\"{}\"}}\n", error.code),
            |mut out| {
                out.push('\n');
                out
            },
        )
    } else {
        format!("error [{}]: {}\n", error.code, error.message)
    };

    CliOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    }
}

/// Build the stderr logger for command runs.
#[must_use]
pub fn build_logger(mode: OutputMode) -> Option<Arc<dyn LoggerPort>> {
    let min_level = if mode.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    Some(Arc::new(
        JsonLogger::new(Arc::new(StderrLogSink)).with_min_level(min_level),
    ))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    let result: Result<CliOutput, CliError> = match &cli.command {
        Commands::Info => run_info(mode),
        Commands::Config {
            command: ConfigCommands::Show { config },
        } => run_config_show(mode, config.as_deref()),
        Commands::Generate {
            name,
            prompt,
            config,
            instruction,
            inputs,
            out,
            temperature,
            save_draft,
        } => {
            run_generate(
                mode,
                &GenerateCommandInput {
                    config_path: config.as_deref(),
                    name,
                    prompt,
                    instruction_path: instruction.as_deref(),
                    input_paths: inputs,
                    out_dir: out,
                    temperature: *temperature,
                    save_draft: save_draft.as_deref(),
                },
            )
            .await
        },
        Commands::Assemble {
            name,
            draft,
            inputs,
            out,
        } => {
            run_assemble(
                mode,
                &AssembleCommandInput {
                    name,
                    draft_path: draft,
                    input_paths: inputs,
                    out_dir: out,
                },
            )
            .await
        },
        Commands::Merge {
            name,
            containers,
            out,
        } => {
            run_merge(
                mode,
                &MergeCommandInput {
                    name,
                    containers,
                    out_dir: out,
                },
            )
            .await
        },
    };

    let exit_code = match result {
        Ok(output) => {
            print!("{}", output.stdout);
            eprint!("{}", output.stderr);
            output.exit_code
        },
        Err(error) => {
            eprintln!("{error}");
            error.exit_code()
        },
    };

    std::process::exit(i32::from(exit_code.as_u8()));
}

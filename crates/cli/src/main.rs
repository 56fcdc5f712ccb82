//! MIC-1 toolchain CLI.
//!
//! This binary provides a single entry point for the toolchain. It performs:
//! 1. **Assemble:** Compile a `.mal` source file into a binary control store.
//! 2. **Run:** Execute an IJVM macro-program against a control store (binary
//!    or textual MAL), wiring the machine's I/O ports to stdin/stdout.
//! 3. **Dump:** Render a binary control store as human-readable field groups.

use std::io;
use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mic1_core::mic::{dump, loader, StreamMemory};
use mic1_core::Config;

#[derive(Parser, Debug)]
#[command(
    name = "mic1",
    author,
    version,
    about = "MAL micro-assembler and MIC-1 simulator",
    long_about = "Assemble MAL microcode into a 2304-byte control store, run IJVM \
                  macro-programs against it cycle by cycle, or dump a control store \
                  as readable field groups.\n\nExamples:\n  \
                  mic1 assemble microcode.mal microcode.mic1\n  \
                  mic1 run program.ijvm microcode.mic1\n  \
                  mic1 run program.ijvm microcode.mal --text-mal\n  \
                  mic1 dump microcode.mic1"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble a textual MAL file into a binary control store.
    Assemble {
        /// The MAL source file (.mal).
        file: PathBuf,

        /// The output binary control store (.mic1).
        output: PathBuf,
    },

    /// Run a compiled IJVM macro-program until the machine halts.
    Run {
        /// The compiled IJVM program to execute (.ijvm).
        program: PathBuf,

        /// The control store to load (binary, or textual MAL with --text-mal).
        control_store: PathBuf,

        /// Treat CONTROL_STORE as textual MAL and assemble it first.
        #[arg(long = "text-mal", short = 'm')]
        text_mal: bool,

        /// JSON file overriding the initial SP/CPP/LV register bases.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a binary control store as one line per address.
    Dump {
        /// The binary control store (.mic1).
        input: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Assemble { file, output } => cmd_assemble(&file, &output),
        Commands::Run {
            program,
            control_store,
            text_mal,
            config,
        } => cmd_run(&program, &control_store, text_mal, config.as_deref()),
        Commands::Dump { input } => cmd_dump(&input),
    }
}

fn cmd_assemble(file: &Path, output: &Path) {
    println!("Assembling {}...", file.display());

    let source = read_text(file);
    let image = compile(&source);

    if let Err(error) = fs::write(output, &image) {
        fail(&format!("writing {}: {error}", output.display()));
    }
    println!("Generated control store binary at {}", output.display());
}

fn cmd_run(program: &Path, control_store: &Path, text_mal: bool, config: Option<&Path>) {
    let program_bytes = read_bytes(program);
    let microcode = if text_mal {
        compile(&read_text(control_store))
    } else {
        read_bytes(control_store)
    };

    let config = config.map_or_else(Config::default, load_config);
    debug!(?config, "machine configuration");

    let memory = StreamMemory::new(io::stdin(), io::stdout());
    let mut machine = loader::boot(memory, &program_bytes, &microcode, &config)
        .unwrap_or_else(|error| {
            fail(&format!("loading {}: {error}", program.display()));
        });

    machine.run();
    debug!(mpc = machine.mpc(), "machine halted");
}

fn cmd_dump(input: &Path) {
    let image = read_bytes(input);
    match dump::render(&image) {
        Ok(rendered) => println!("{rendered}"),
        Err(error) => fail(&format!("{}: {error}", input.display())),
    }
}

/// Compiles MAL source text into a control-store image, exiting on error.
fn compile(source: &str) -> Vec<u8> {
    let program = mic1_core::parse(source).unwrap_or_else(|error| {
        fail(&format!("compiling MAL: {error}"));
    });
    mic1_core::assemble(&program).unwrap_or_else(|error| {
        fail(&format!("assembling: {error}"));
    })
}

fn load_config(path: &Path) -> Config {
    let text = read_text(path);
    serde_json::from_str(&text).unwrap_or_else(|error| {
        fail(&format!("parsing config {}: {error}", path.display()));
    })
}

fn read_text(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|error| {
        fail(&format!("reading {}: {error}", path.display()));
    })
}

fn read_bytes(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|error| {
        fail(&format!("reading {}: {error}", path.display()));
    })
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

use {
    crate::{errorfmt::ErrorFmt, logger::Logger},
    clap::{Parser, ValueEnum},
    log::Level,
    std::{io, path::PathBuf},
    thiserror::Error,
    westfield_scanner::{
        CompilerOptions, ProtocolCompiler,
        error::{CompileError, WriteError},
        parser::{DocumentError, parse},
        write_units,
    },
};

#[path = "../../src/utils/errorfmt.rs"]
mod errorfmt;
mod logger;

/// Compiles Wayland protocol descriptions into westfield proxies.
#[derive(Parser, Debug)]
struct Cli {
    /// The log level.
    #[arg(value_enum, long, default_value_t)]
    log_level: CliLogLevel,
    /// The directory that receives the generated modules.
    #[arg(short, long)]
    out_dir: PathBuf,
    /// The path under which the generated code refers to the westfield runtime.
    #[arg(long, default_value = "westfield")]
    runtime_path: String,
    /// The interface whose bind request creates objects of any interface.
    #[arg(long, default_value = "wl_registry")]
    registry_interface: String,
    /// An interface whose proxy is generated elsewhere into the same module tree.
    #[arg(long = "extern-interface")]
    extern_interfaces: Vec<String>,
    /// The protocol files to compile.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(ValueEnum, Debug, Copy, Clone, Hash, Default)]
enum CliLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Trace => Level::Trace,
            CliLogLevel::Debug => Level::Debug,
            CliLogLevel::Info => Level::Info,
            CliLogLevel::Warn => Level::Warn,
            CliLogLevel::Error => Level::Error,
        }
    }
}

#[derive(Debug, Error)]
enum MainError {
    #[error("Could not read {0}")]
    ReadFile(String, #[source] io::Error),
    #[error("Could not parse {0}")]
    ParseFile(String, #[source] DocumentError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

fn main() {
    let cli = Cli::parse();
    Logger::install_stderr(cli.log_level.into());
    if let Err(e) = run(cli) {
        log::error!("{:#}", ErrorFmt(e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), MainError> {
    let mut documents = vec![];
    for input in &cli.inputs {
        let display = input.display().to_string();
        let data = std::fs::read(input).map_err(|e| MainError::ReadFile(display.clone(), e))?;
        let document = parse(&data).map_err(|e| MainError::ParseFile(display, e))?;
        documents.push(document);
    }
    let compiler = ProtocolCompiler::new(CompilerOptions {
        runtime_path: cli.runtime_path,
        registry_interface: cli.registry_interface,
        extern_interfaces: cli.extern_interfaces,
    });
    let units = compiler.compile_all(&documents)?;
    write_units(&cli.out_dir, &units)?;
    log::info!(
        "Wrote {} modules to {}",
        units.len() + 1,
        cli.out_dir.display()
    );
    Ok(())
}

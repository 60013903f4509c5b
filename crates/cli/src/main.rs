//! kit - interpreter for the kit control language
//!
//! Usage:
//!   kit                 # Read from the terminal (or piped stdin)
//!   kit script.kit      # Run a script
//!
//! Extension lexicons are loaded on demand with `lex-sequence`,
//! `lex-records` and `lex-trees`. Set RUST_LOG=kit_core=debug to trace
//! definitions and reported errors.

mod prompt;

use clap::Parser as ClapParser;
use kit_core::config::DEFAULT_MAX_CALL_DEPTH;
use kit_core::{Interpreter, InterpreterConfig, ReaderSource, TokenSource};
use kit_lexicons::hook_up_extensions;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

#[derive(ClapParser)]
#[command(name = "kit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kit control language interpreter", long_about = None)]
struct Cli {
    /// Script to run (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Deepest nesting of word calls before execution is refused
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = InterpreterConfig::new().with_max_call_depth(cli.max_call_depth);
    let mut interp = Interpreter::with_config(config);
    hook_up_extensions(&mut interp);
    interp.set_interactive_source(prompt::interactive);

    let source: Box<dyn TokenSource> = match &cli.file {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(ReaderSource::new(BufReader::new(file))),
            Err(e) => {
                debug!(error = %e, "open failed");
                eprintln!("Unable to open file: {}", path.display());
                process::exit(1);
            }
        },
        None if io::stdin().is_terminal() => prompt::interactive(interp.config()),
        None => Box::new(ReaderSource::new(io::stdin().lock())),
    };

    interp.push_source(source);
    interp.run();
    interp.shutdown();
}

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "kit=warn".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

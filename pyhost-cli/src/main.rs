//! pyhost CLI - call into an embedded Python interpreter

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pyhost_core::RuntimeConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use commands::invoke::InvokeOptions;
use commands::{call, eval, invoke};

#[derive(Parser)]
#[command(name = "pyhost")]
#[command(about = "Call Python modules, classes and functions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON configuration file (defaults to $PYHOST_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory to add to the Python search path
    #[arg(short = 'p', long = "path", global = true)]
    paths: Vec<PathBuf>,

    /// More output (-v, -vv, -vvv); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a module level function
    Call {
        /// Module to import
        module: String,

        /// Function name
        function: String,

        /// Arguments, one JSON document each
        args: Vec<String>,
    },

    /// Construct an instance of a class and call a method on it
    Invoke {
        /// Module to import
        module: String,

        /// Class name
        class: String,

        /// Method name
        method: String,

        /// Constructor arguments as a JSON array
        #[arg(long)]
        init: Option<String>,

        /// Named method arguments as a JSON object
        #[arg(long)]
        kwargs: Option<String>,

        /// Arguments, one JSON document each
        args: Vec<String>,
    },

    /// Pass a JSON value to Python and print what comes back
    EvalJson {
        /// JSON document
        json: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args::log_filter(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration and start the interpreter
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::from_env()?,
    };
    for path in cli.paths {
        config = config.with_search_path(path);
    }
    pyhost::initialize(config).context("cannot start the python interpreter")?;

    let result = match cli.command {
        Commands::Call {
            module,
            function,
            args,
        } => call::call_function(&module, &function, &args),

        Commands::Invoke {
            module,
            class,
            method,
            init,
            kwargs,
            args,
        } => invoke::invoke_method(InvokeOptions {
            module: &module,
            class: &class,
            method: &method,
            init: init.as_deref(),
            kwargs: kwargs.as_deref(),
            args: &args,
        }),

        Commands::EvalJson { json } => eval::eval_json(&json),
    };

    pyhost::terminate()?;
    result
}

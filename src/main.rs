use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use loxwood as lox;

use anyhow::Context;
use clap::Parser as ClapParser;
use log::info;

use lox::error::LoxError;
use lox::interpreter::Interpreter;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to run; omit it to start an interactive session.
    script: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    let mut lox = Lox::new();

    match args.script.as_slice() {
        [] => lox.run_prompt()?,

        [path] => lox.run_file(path)?,

        _ => {
            eprintln!("Usage: loxwood [script]");
            std::process::exit(64);
        }
    }

    Ok(())
}

/// Driver owning the persistent interpreter.  One instance serves a whole
/// REPL session so globals and recorded scope depths carry across lines.
struct Lox {
    interpreter: Interpreter,
}

impl Lox {
    fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(),
        }
    }

    fn run_file(&mut self, path: &Path) -> anyhow::Result<()> {
        info!("Running script {}", path.display());

        let source: String = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let errors = self.interpreter.run(&source);
        if errors.is_empty() {
            return Ok(());
        }

        let fatal = errors.iter().any(LoxError::is_fatal);

        for error in &errors {
            eprintln!("{}", error);
        }

        std::process::exit(if fatal { 70 } else { 65 });
    }

    fn run_prompt(&mut self) -> anyhow::Result<()> {
        info!("Starting interactive session");

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            write!(stdout, "> ")?;
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                // EOF ends the session.
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // Errors are reported and forgotten; the session continues
            // with its global state intact.
            for error in self.interpreter.run(line) {
                eprintln!("{}", error);
            }
        }

        Ok(())
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lotus::{printer, Interpreter, LotusError, Repl, Value};

#[derive(Parser)]
#[command(author, version, about = "Lotus Lisp interpreter")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Lotus script file
    Run {
        script: PathBuf,
        /// Arguments exposed to the script as *ARGV*
        args: Vec<String>,
    },
    /// Start an interactive REPL session
    Repl,
    /// Evaluate a snippet of Lotus code and print the result
    Eval { source: String },
}

fn main() -> Result<(), LotusError> {
    let args = Args::parse();
    match args.command.unwrap_or(Command::Repl) {
        Command::Run { script, args } => run_script(script, args),
        Command::Repl => {
            let mut repl = Repl::new();
            repl.run()
        }
        Command::Eval { source } => {
            let mut interpreter = Interpreter::new();
            let output = interpreter.rep(&source)?;
            println!("{output}");
            Ok(())
        }
    }
}

fn run_script(script: PathBuf, args: Vec<String>) -> Result<(), LotusError> {
    let mut interpreter = Interpreter::with_args(args);
    // File loading is the `(do <forms> nil)` textual composition performed
    // by the prelude's `load-file`.
    let path = printer::pr_str(&Value::string(script.to_string_lossy()), true);
    interpreter.rep(&format!("(load-file {path})"))?;
    Ok(())
}

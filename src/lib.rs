//! Core library for the Lotus Lisp interpreter. Implements scanning,
//! reading, printing, and a tail-call-optimized evaluator, plus the REPL
//! utilities the `lotus` binary is built from.

pub mod diagnostics;
pub mod environment;
pub mod lexer;
pub mod printer;
pub mod reader;
pub mod repl;
pub mod runtime;
pub mod stdlib;
pub mod value;

pub use diagnostics::{Diagnostic, DiagnosticKind, LotusError, SourceSpan};
pub use repl::Repl;
pub use runtime::Interpreter;
pub use value::{Value, ValueKind};

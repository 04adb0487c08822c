//! Core library for the Thistle expression language: lexing, parsing,
//! evaluation over a lexically scoped environment chain, and REPL utilities.

pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod stdlib;
pub mod value;

pub use diagnostics::{Diagnostic, DiagnosticKind, SourceSpan, ThistleError};
pub use repl::Repl;
pub use runtime::{interpret, Interpreter};

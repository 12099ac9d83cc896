//! astmate: AST code models and TextMate grammars from ANTLR4 grammars.
//!
//! # Example
//!
//! ```
//! use astmate_lib::Generator;
//!
//! let mut analyzed = Generator::from_source(
//!     "grammar Hello;
//!      greeting : 'hello' ID ;
//!      ID : [a-z]+ ;",
//! )
//! .parse()
//! .expect("in-memory sources always load")
//! .analyze();
//!
//! assert!(!analyzed.diagnostics().has_errors());
//! let textmate = analyzed.textmate_grammar();
//! assert_eq!(textmate.scope_name, "source.hello");
//! ```

pub mod analyze;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod grammar;
pub mod model;
pub mod pipeline;
pub mod textmate;

#[cfg(test)]
mod pipeline_tests;

pub use config::GeneratorConfig;
pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use pipeline::{Generator, GrammarAnalyzed, GrammarParsed};

use std::path::PathBuf;

/// Errors that abort a generation run. Everything recoverable surfaces as a
/// diagnostic instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The grammar cannot feed the requested derivation (wrong kind, parse
    /// failure); details are in the run's diagnostics.
    #[error("invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("invalid configuration")]
    Config(#[from] serde_json::Error),
}

/// Result type for generator operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Generation pipeline facade.
//!
//! One generation run flows `Generator` → [`GrammarParsed`] →
//! [`GrammarAnalyzed`], accumulating diagnostics across stages. The run is
//! single-threaded and owns all of its state; derived models are produced on
//! demand from the analyzed stage and discarded after emission.

use std::path::{Path, PathBuf};

use crate::analyze::{Analysis, analyze};
use crate::config::GeneratorConfig;
use crate::diagnostics::Diagnostics;
use crate::emit::typescript;
use crate::grammar::{self, Grammar};
use crate::model::{AstCodeModel, build};
use crate::textmate::{TextMateGrammar, generate};
use crate::Result;

pub struct Generator {
    input: Input,
    config: GeneratorConfig,
}

enum Input {
    Source(String),
    Path(PathBuf),
}

impl Generator {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            input: Input::Source(source.into()),
            config: GeneratorConfig::default(),
        }
    }

    /// Loads from a `.g4` file; a `tokenVocab` option resolves against
    /// sibling files of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            input: Input::Path(path.as_ref().to_path_buf()),
            config: GeneratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn parse(self) -> Result<GrammarParsed> {
        let mut diag = Diagnostics::new();
        let (grammar, source, path) = match self.input {
            Input::Source(source) => {
                let grammar = grammar::parse(&source, &mut diag);
                (grammar, source, None)
            }
            Input::Path(path) => {
                let (grammar, source) = grammar::load(&path, &mut diag)?;
                (grammar, source, Some(path))
            }
        };
        Ok(GrammarParsed {
            grammar,
            source,
            path,
            config: self.config,
            diag,
        })
    }
}

pub struct GrammarParsed {
    grammar: Grammar,
    source: String,
    path: Option<PathBuf>,
    config: GeneratorConfig,
    diag: Diagnostics,
}

impl GrammarParsed {
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    /// Runs element-index analysis. Happens exactly once per run, before any
    /// downstream traversal.
    pub fn analyze(mut self) -> GrammarAnalyzed {
        let analysis = analyze(&self.grammar, &mut self.diag);
        GrammarAnalyzed {
            grammar: self.grammar,
            source: self.source,
            path: self.path,
            config: self.config,
            analysis,
            diag: self.diag,
        }
    }
}

pub struct GrammarAnalyzed {
    grammar: Grammar,
    source: String,
    path: Option<PathBuf>,
    config: GeneratorConfig,
    analysis: Analysis,
    diag: Diagnostics,
}

impl GrammarAnalyzed {
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    /// Derives the AST code model. Fails for grammars without parser rules.
    pub fn ast_model(&mut self) -> Result<AstCodeModel> {
        build(&self.grammar, &self.analysis, &self.config, &mut self.diag)
    }

    /// Derives the model and renders it to TypeScript.
    pub fn typescript(&mut self) -> Result<String> {
        let model = self.ast_model()?;
        Ok(typescript::emit(&model))
    }

    /// Synthesizes the TextMate grammar document.
    pub fn textmate_grammar(&mut self) -> TextMateGrammar {
        generate(&self.grammar, &self.config, &mut self.diag)
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

#[derive(Parser)]
#[command(name = "astmate", bin_name = "astmate")]
#[command(about = "Generate AST code models and TextMate grammars from ANTLR4 grammars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate the AST code unit and the TextMate grammar
    #[command(after_help = r#"EXAMPLES:
  astmate generate MyLang.g4
  astmate generate MyLang.g4 --config astmate.json
  astmate generate MyLang.g4 --ast-out src/ast.ts --no-textmate"#)]
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Where to write the AST code unit (default: `<Grammar>.ast.ts`)
        #[arg(long, value_name = "FILE")]
        ast_out: Option<PathBuf>,

        /// Where to write the TextMate grammar (default: `<Grammar>.tmLanguage.json`)
        #[arg(long, value_name = "FILE")]
        textmate_out: Option<PathBuf>,

        /// Skip the AST code unit
        #[arg(long)]
        no_ast: bool,

        /// Skip the TextMate grammar
        #[arg(long)]
        no_textmate: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Parse and analyze a grammar, reporting diagnostics only
    #[command(after_help = r#"EXAMPLES:
  astmate check MyLang.g4
  astmate check MyLang.g4 --config astmate.json"#)]
    Check {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
pub struct InputArgs {
    /// ANTLR4 grammar file (`.g4`)
    pub grammar: PathBuf,

    /// Configuration file (`astmate.json`)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct OutputArgs {
    /// When to color diagnostic output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

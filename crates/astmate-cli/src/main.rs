mod cli;
mod commands;

use clap::Parser;

use cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Command::Generate {
            input,
            ast_out,
            textmate_out,
            no_ast,
            no_textmate,
            output,
        } => commands::generate::run(input, ast_out, textmate_out, no_ast, no_textmate, output),
        Command::Check { input, output } => commands::check::run(input, output),
    };

    std::process::exit(code);
}

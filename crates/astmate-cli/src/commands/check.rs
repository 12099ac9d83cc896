use astmate_lib::Generator;

use crate::cli::{InputArgs, OutputArgs};

use super::{EXIT_OK, EXIT_USAGE, load_config, report};

pub fn run(input: InputArgs, output: OutputArgs) -> i32 {
    let config = match load_config(&input) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let parsed = match Generator::from_path(&input.grammar).with_config(config).parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_USAGE;
        }
    };
    let mut analyzed = parsed.analyze();

    // Run the derivations for their diagnostics; results are discarded. A
    // lexer-only grammar legitimately has no AST model.
    if analyzed.grammar().has_parser_rules() {
        let _ = analyzed.ast_model();
    }
    let _ = analyzed.textmate_grammar();

    let code = report(
        analyzed.diagnostics(),
        analyzed.source(),
        &input.grammar,
        &output,
    );
    if code == EXIT_OK {
        eprintln!("ok: {}", input.grammar.display());
    }
    code
}

use std::path::PathBuf;

use astmate_lib::Generator;

use crate::cli::{InputArgs, OutputArgs};

use super::{EXIT_USAGE, load_config, report, write_output};

pub fn run(
    input: InputArgs,
    ast_out: Option<PathBuf>,
    textmate_out: Option<PathBuf>,
    no_ast: bool,
    no_textmate: bool,
    output: OutputArgs,
) -> i32 {
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

    let stem = input
        .grammar
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "grammar".to_string());

    if !no_ast && !analyzed.grammar().has_parser_rules() {
        eprintln!("note: `{stem}` has no parser rules; skipping the AST code unit");
    } else if !no_ast {
        match analyzed.typescript() {
            Ok(code) => {
                let path =
                    ast_out.unwrap_or_else(|| input.grammar.with_file_name(format!("{stem}.ast.ts")));
                if let Err(code) = write_output(&path, &code) {
                    return code;
                }
                eprintln!("wrote {}", path.display());
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    if !no_textmate {
        let document = analyzed.textmate_grammar();
        let path = textmate_out
            .unwrap_or_else(|| input.grammar.with_file_name(format!("{stem}.tmLanguage.json")));
        if let Err(code) = write_output(&path, &document.to_json()) {
            return code;
        }
        eprintln!("wrote {}", path.display());
    }

    report(
        analyzed.diagnostics(),
        analyzed.source(),
        &input.grammar,
        &output,
    )
}

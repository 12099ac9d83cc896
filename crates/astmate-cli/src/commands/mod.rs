pub mod check;
pub mod generate;

use std::path::Path;

use astmate_lib::{Diagnostics, GeneratorConfig, Severity};

use crate::cli::{InputArgs, OutputArgs};

pub const EXIT_OK: i32 = 0;
pub const EXIT_DIAGNOSTICS: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// Loads the configuration file named in `input`, or defaults.
pub(crate) fn load_config(input: &InputArgs) -> Result<GeneratorConfig, i32> {
    let Some(path) = &input.config else {
        return Ok(GeneratorConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read config `{}`: {e}", path.display());
        EXIT_USAGE
    })?;
    GeneratorConfig::from_json(&text).map_err(|e| {
        eprintln!("error: invalid config `{}`: {e}", path.display());
        EXIT_USAGE
    })
}

/// Renders accumulated diagnostics to stderr and picks the exit code from the
/// highest severity.
pub(crate) fn report(
    diagnostics: &Diagnostics,
    source: &str,
    path: &Path,
    output: &OutputArgs,
) -> i32 {
    if !diagnostics.is_empty() {
        let rendered = diagnostics
            .printer()
            .source(source)
            .path(&path.display().to_string())
            .colored(output.color.should_colorize())
            .render();
        eprintln!("{rendered}");
    }
    match diagnostics.max_severity() {
        Some(Severity::Error) => EXIT_DIAGNOSTICS,
        _ => EXIT_OK,
    }
}

pub(crate) fn write_output(path: &Path, contents: &str) -> Result<(), i32> {
    std::fs::write(path, contents).map_err(|e| {
        eprintln!("error: cannot write `{}`: {e}", path.display());
        EXIT_USAGE
    })
}

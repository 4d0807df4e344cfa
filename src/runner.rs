use crate::error::FoxError;
use crate::evaluator::Interpreter;
use std::fs;
use std::path::Path;

/// Runs a whole script, reporting any error to stderr before returning it.
pub fn run(
    source: &str,
    path: Option<&Path>,
    interpreter: &mut Interpreter,
) -> Result<(), FoxError> {
    let result = interpreter.run_source(source, path);

    if let Err(ref error) = result {
        let filename = path.map(|p| p.display().to_string());
        error.report(source, filename.as_deref());
    }

    result
}

/// Why a script file did not run to completion.
#[derive(Debug)]
pub enum RunFailure {
    Unreadable(std::io::Error),
    Script(FoxError),
}

/// Reads and runs the script at `path`, seeding `random()` when asked to.
pub fn run_file(path: &Path, seed: Option<u64>) -> Result<(), RunFailure> {
    let source = fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: Could not open file '{}': {}", path.display(), e);
        RunFailure::Unreadable(e)
    })?;

    let mut interpreter = Interpreter::new();
    if let Some(seed) = seed {
        interpreter = interpreter.with_seed(seed);
    }

    run(&source, Some(path), &mut interpreter).map_err(RunFailure::Script)
}

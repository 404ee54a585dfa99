use std::fs;
use std::path::Path;

use geophylo::error::{Error, Result};

/// Write the JSON payload to a file, or to stdout when no path was given.
pub fn write_output(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        None => {
            println!("{json}");
            Ok(())
        }
        Some(path) => fs::write(path, json).map_err(|e| Error::ConfigInvalid {
            field: "output",
            message: format!("cannot write {}: {e}", path.display()),
        }),
    }
}

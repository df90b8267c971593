// SPDX-License-Identifier: MIT

//! Output formatting, grounded on `oj`'s own `OutputFormat` enum
//! (`cli/src/output.rs`): every command prints either plain text or a
//! single JSON value, selected by a global `--format` flag.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints `value` as pretty JSON when `format` is `Json`, otherwise runs
/// `text` to print the human-readable rendering.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("error: failed to encode response as JSON: {e}"),
        },
        OutputFormat::Text => text(value),
    }
}

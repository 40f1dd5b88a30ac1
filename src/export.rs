//! CSV export of recorded sessions
//!
//! One header line, then one row per session in recording order. Every
//! field is quoted, with embedded quotes doubled, so the description
//! column is quoted no matter what the caller wrote and survives a
//! standard CSV reader.

use chrono::SecondsFormat;
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use std::io;
use tokencost_core::error::{Result, TokenCostError};
use tokencost_core::types::Session;

/// Column names, in row order
pub const CSV_COLUMNS: [&str; 11] = [
    "id",
    "model",
    "description",
    "prompt_tokens",
    "completion_tokens",
    "total_tokens",
    "input_cost",
    "output_cost",
    "total_cost",
    "response_time_ms",
    "timestamp",
];

fn csv_writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

/// Fields of one session, in [`CSV_COLUMNS`] order
pub fn session_record(session: &Session) -> [String; 11] {
    [
        session.id.to_string(),
        session.model.to_string(),
        session.description.clone(),
        session.usage.prompt_tokens.to_string(),
        session.usage.completion_tokens.to_string(),
        session.usage.total_tokens.to_string(),
        format!("{:.6}", session.costs.input_cost),
        format!("{:.6}", session.costs.output_cost),
        format!("{:.6}", session.costs.total_cost),
        session.response_time_ms.to_string(),
        session
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    ]
}

/// Render sessions as a CSV document with no trailing newline
///
/// # Errors
///
/// Only fails if the in-memory writer does, which surfaces as `Io`.
pub fn sessions_to_csv(sessions: &[Session]) -> Result<String> {
    let mut writer = csv_writer();
    writer.write_record(CSV_COLUMNS).map_err(io::Error::from)?;
    for session in sessions {
        writer
            .write_record(session_record(session))
            .map_err(io::Error::from)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TokenCostError::Io(e.into_error()))?;
    let mut document =
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    // Drop the final record's terminator.
    if document.ends_with('\n') {
        document.pop();
    }
    Ok(document)
}

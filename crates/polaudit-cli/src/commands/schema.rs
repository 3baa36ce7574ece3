//! Schema command implementation.

use crate::cli::SchemaArgs;
use crate::error::Result;
use polaudit_domain::DocType;
use polaudit_extractor::{details_schema, response_schema};
use std::io::Write;

/// Execute the schema command.
pub fn execute_schema(args: SchemaArgs, out: &mut impl Write) -> Result<()> {
    let doc_type = DocType::from(args.doc_type);
    let schema = if args.details_only {
        details_schema(doc_type)
    } else {
        response_schema(doc_type)
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&schema)?)?;
    Ok(())
}

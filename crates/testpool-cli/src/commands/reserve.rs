//! Reservation command.

use clap::Args;
use serde::Serialize;

use testpool_core::error::AppError;
use testpool_store::{IdentifierAllocator, Record, RequestKind, Tag};

use crate::output::{self, OutputFormat};

/// Arguments for the reserve command
#[derive(Debug, Args)]
pub struct ReserveArgs {
    /// Identifier kind: premise or device
    #[arg(short, long)]
    pub kind: RequestKind,
    /// Tag to store with the reservation (will prompt if not provided)
    #[arg(short, long)]
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReservationOutput<'a> {
    kind: RequestKind,
    requested_id: &'a str,
    record: &'a Record,
}

/// Reserve one identifier and print the reserved row
pub async fn execute(
    args: &ReserveArgs,
    allocator: &dyn IdentifierAllocator,
    format: OutputFormat,
) -> Result<(), AppError> {
    let tag = match &args.tag {
        Some(t) => Tag::new(t)?,
        None => prompt_tag()?,
    };

    let record = allocator.reserve(args.kind, tag).await?.into_record()?;
    let requested_id = record.identifier(args.kind);

    match format {
        OutputFormat::Json => output::print_json(&ReservationOutput {
            kind: args.kind,
            requested_id,
            record: &record,
        }),
        OutputFormat::Table => {
            output::print_success(&format!(
                "Reserved {} '{}' for '{}'",
                args.kind.label(),
                requested_id,
                record.tag
            ));
            println!("{}", output::record_table(&record.columns, &record.values));
        }
    }

    Ok(())
}

fn prompt_tag() -> Result<Tag, AppError> {
    let input: String = dialoguer::Input::new()
        .with_prompt("Tag (e.g. test case ID)")
        .validate_with(|s: &String| Tag::new(s).map(|_| ()).map_err(|e| e.message))
        .interact_text()
        .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;
    Tag::new(input)
}

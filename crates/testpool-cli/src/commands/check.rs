//! Pool check command.

use testpool_core::error::AppError;
use testpool_store::{IdentifierAllocator, RequestKind};

use crate::output::{self, OutputFormat};

/// Run `initialize` and report pool state
pub async fn execute(
    allocator: &dyn IdentifierAllocator,
    format: OutputFormat,
) -> Result<(), AppError> {
    let report = allocator.initialize().await?;

    if format == OutputFormat::Json {
        output::print_json(&report);
        return Ok(());
    }

    output::print_success(&format!("Pool '{}' is ready", report.location.display()));
    output::print_kv("Records", &report.rows.to_string());
    for kind in RequestKind::ALL {
        output::print_kv(&format!("Free {}s", kind.label()), &report.free(kind).to_string());
    }
    if !report.added_columns.is_empty() {
        output::print_warning(&format!(
            "Added missing columns: {}",
            report.added_columns.join(", ")
        ));
    }
    if !report.missing_descriptive.is_empty() {
        output::print_warning(&format!(
            "Missing descriptive columns: {}",
            report.missing_descriptive.join(", ")
        ));
    }

    Ok(())
}

//! Record model: request kinds, reservation flags, tags and claimed rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use testpool_core::error::AppError;

use crate::error::PoolResult;
use crate::schema::{self, ResolvedColumns};
use crate::table::PoolTable;

/// Longest tag accepted from a requester.
pub const MAX_TAG_LEN: usize = 128;

/// Which identifier a requester wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// A premise ID (with its address details).
    Premise,
    /// A dummy device ID.
    Device,
}

impl RequestKind {
    /// All kinds, in display order.
    pub const ALL: [RequestKind; 2] = [RequestKind::Premise, RequestKind::Device];

    /// Human-readable name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Premise => "premise ID",
            Self::Device => "dummy device ID",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Premise => write!(f, "premise"),
            Self::Device => write!(f, "device"),
        }
    }
}

impl FromStr for RequestKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "premise" => Ok(Self::Premise),
            "device" => Ok(Self::Device),
            other => Err(AppError::validation(format!(
                "Unknown request kind '{other}'; expected 'premise' or 'device'"
            ))),
        }
    }
}

/// Reservation state of one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Flag {
    /// Handed out to a requester; never returns to `Free`.
    Reserved,
    /// Available for the next request.
    Free,
}

impl Flag {
    /// Parse a flag cell. Accepts `Yes`/`No` in any case, surrounded by
    /// whitespace. Anything else, including a blank cell, is rejected.
    pub fn parse(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.eq_ignore_ascii_case("yes") {
            Some(Self::Reserved)
        } else if cell.eq_ignore_ascii_case("no") {
            Some(Self::Free)
        } else {
            None
        }
    }

    /// Cell text written to the pool file.
    pub fn as_cell(&self) -> &'static str {
        match self {
            Self::Reserved => "Yes",
            Self::Free => "No",
        }
    }

    /// Whether the identifier can still be handed out.
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }
}

/// A requester-supplied label, such as a test case reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Validate and wrap a tag. Surrounding whitespace is trimmed.
    pub fn new(value: impl AsRef<str>) -> Result<Self, AppError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(AppError::validation(
                "A tag (e.g. the test case ID) is required before reserving",
            ));
        }
        if value.chars().count() > MAX_TAG_LEN {
            return Err(AppError::validation(format!(
                "Tag is longer than {MAX_TAG_LEN} characters"
            )));
        }
        if value.contains(['\r', '\n']) {
            return Err(AppError::validation("Tag must be a single line"));
        }
        Ok(Self(value.to_string()))
    }

    /// The tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tag {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// One row of the pool, as returned to the caller after a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Zero-based position of the row among the data rows.
    pub row: usize,
    /// Premise identifier (empty when the pool has no premise column).
    pub id_premise: String,
    /// Device identifier (empty when the pool has no device column).
    pub id_device: String,
    /// Reservation state of the premise identifier.
    pub reserved_premise: Flag,
    /// Reservation state of the device identifier.
    pub reserved_device: Flag,
    /// Tag written at reservation time.
    pub tag: String,
    /// Every header, in stored order.
    pub columns: Vec<String>,
    /// Every cell of the row, aligned with `columns`.
    pub values: Vec<String>,
}

impl Record {
    /// Build a record from a table row whose flags already passed validation.
    pub fn from_row(table: &PoolTable, row: usize, resolved: &ResolvedColumns) -> PoolResult<Self> {
        let optional = |col: Option<usize>| {
            col.map(|c| table.cell(row, c).to_string())
                .unwrap_or_default()
        };

        Ok(Self {
            row,
            id_premise: optional(resolved.premise_id),
            id_device: optional(resolved.device_id),
            reserved_premise: schema::flag_at(table, row, resolved.premise_flag)?,
            reserved_device: schema::flag_at(table, row, resolved.device_flag)?,
            tag: table.cell(row, resolved.tag).to_string(),
            columns: table.headers().to_vec(),
            values: table.row(row).to_vec(),
        })
    }

    /// The identifier handed out for `kind`.
    pub fn identifier(&self, kind: RequestKind) -> &str {
        match kind {
            RequestKind::Premise => &self.id_premise,
            RequestKind::Device => &self.id_device,
        }
    }

    /// Reservation state for `kind`.
    pub fn flag(&self, kind: RequestKind) -> Flag {
        match kind {
            RequestKind::Premise => self.reserved_premise,
            RequestKind::Device => self.reserved_device,
        }
    }

    /// Cell value by header name.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i].as_str())
    }
}

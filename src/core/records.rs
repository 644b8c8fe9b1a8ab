//! Record Parser
//!
//! Turns raw tabular input into lifecycle records. The parsing policy is
//! row-level tolerance: a bad row is carried forward flagged invalid so the
//! orchestrator can report it, and only a structurally unreadable file fails
//! the whole parse.

use crate::core::action::UserAction;
use crate::utils::error::{Result, SyncError};

/// Required CSV header columns
pub const REQUIRED_COLUMNS: [&str; 4] = ["name", "email", "org", "role"];

/// UTF-8 BOM bytes
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One row of batch input
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LifecycleRecord {
    /// 1-based line number (header = 1, first data row = 2)
    pub line: usize,
    pub name: String,
    pub email: String,
    pub org: String,
    /// Role name; required only for Invite
    pub role: Option<String>,
    /// Row-level validation failure, if any
    pub invalid: Option<String>,
}

impl LifecycleRecord {
    /// Whether this row passed validation
    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }

    fn unreadable(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            name: String::new(),
            email: String::new(),
            org: String::new(),
            role: None,
            invalid: Some(reason.into()),
        }
    }
}

/// Column positions resolved from the header row
struct HeaderIndex {
    name: usize,
    email: usize,
    org: usize,
    role: usize,
}

impl HeaderIndex {
    fn new(headers: &csv::StringRecord) -> Result<Self> {
        let position = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(column))
        };

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| position(column).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::MalformedInput(format!(
                "Missing required column(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            name: position("name").unwrap(),
            email: position("email").unwrap(),
            org: position("org").unwrap(),
            role: position("role").unwrap(),
        })
    }

    /// Minimum row width covering every required column
    fn required_width(&self) -> usize {
        [self.name, self.email, self.org, self.role]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Parse raw CSV bytes into lifecycle records.
///
/// Fails with `MalformedInput` only when the file itself is unreadable: not
/// UTF-8, or missing the required header columns. Individual bad rows come
/// back flagged invalid.
pub fn parse_records(raw: &[u8], action: UserAction) -> Result<Vec<LifecycleRecord>> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let text = std::str::from_utf8(raw)
        .map_err(|e| SyncError::MalformedInput(format!("Input is not valid UTF-8: {}", e)))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SyncError::MalformedInput(format!("Unreadable header row: {}", e)))?
        .clone();
    let index = HeaderIndex::new(&headers)?;

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let line = i + 2;
        match row {
            Ok(row) => records.push(parse_row(&index, &row, line, action)),
            Err(e) => {
                records.push(LifecycleRecord::unreadable(
                    line,
                    format!("Unparseable row: {}", e),
                ));
            }
        }
    }
    Ok(records)
}

fn parse_row(
    index: &HeaderIndex,
    row: &csv::StringRecord,
    line: usize,
    action: UserAction,
) -> LifecycleRecord {
    let field = |i: usize| row.get(i).unwrap_or("").to_string();

    let role = field(index.role);
    let mut record = LifecycleRecord {
        line,
        name: field(index.name),
        email: field(index.email),
        org: field(index.org),
        role: if role.is_empty() { None } else { Some(role) },
        invalid: None,
    };

    if row.len() < index.required_width() {
        record.invalid = Some(format!(
            "Expected at least {} columns, found {}",
            index.required_width(),
            row.len()
        ));
        return record;
    }

    if record.email.is_empty() {
        record.invalid = Some("Missing email".to_string());
    } else if let Err(reason) = validate_email(&record.email) {
        record.invalid = Some(format!("Invalid email '{}': {}", record.email, reason));
    } else if record.org.is_empty() {
        record.invalid = Some("Missing org".to_string());
    } else if action == UserAction::Invite && record.role.is_none() {
        record.invalid = Some("Missing role".to_string());
    }

    // An empty display name falls back to the email address for invites
    if record.invalid.is_none() && action == UserAction::Invite && record.name.is_empty() {
        record.name = record.email.clone();
    }

    record
}

/// Practical structural check: one '@', non-empty local part, dotted domain
fn validate_email(email: &str) -> std::result::Result<(), &'static str> {
    if email.contains(char::is_whitespace) {
        return Err("contains whitespace");
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err("must contain '@'");
    };
    if local.is_empty() {
        return Err("empty local part");
    }
    if domain.is_empty() || domain.contains('@') {
        return Err("invalid domain");
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("invalid domain");
    }
    Ok(())
}

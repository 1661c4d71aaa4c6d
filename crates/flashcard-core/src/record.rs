//! Parser for `index;front;back` import lines.
//!
//! Fields are split on the first two `;`. A third `;` belongs to the back
//! text: the format has no escape sequence for the delimiter.

/// Characters stripped from both ends of every field.
const FIELD_WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];

const DELIMITER: char = ';';

/// Which card field a parse error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Front,
    Back,
}

impl Field {
    pub const fn label(self) -> &'static str {
        match self {
            Field::Front => "front",
            Field::Back => "back",
        }
    }
}

/// Import line parse errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// The line lacks the first or second `;`
    MalformedRecord,
    /// A field is empty after trimming
    EmptyField(Field),
}

impl core::fmt::Display for RecordError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordError::MalformedRecord => write!(f, "Malformed record: expected index;front;back"),
            RecordError::EmptyField(field) => write!(f, "Empty {} field", field.label()),
        }
    }
}

impl core::error::Error for RecordError {}

/// One parsed line, borrowing from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Leading index field, trimmed. Not validated.
    pub index: &'a str,
    pub front: &'a str,
    pub back: &'a str,
}

fn trim_field(field: &str) -> &str {
    field.trim_matches(&FIELD_WHITESPACE[..])
}

/// Parse a line into its index, front and back fields.
pub fn parse_record_line(line: &str) -> Result<Record<'_>, RecordError> {
    let first = line.find(DELIMITER).ok_or(RecordError::MalformedRecord)?;
    let rest = &line[first + 1..];
    let second = rest.find(DELIMITER).ok_or(RecordError::MalformedRecord)?;

    let front = trim_field(&rest[..second]);
    let back = trim_field(&rest[second + 1..]);

    if front.is_empty() {
        return Err(RecordError::EmptyField(Field::Front));
    }
    if back.is_empty() {
        return Err(RecordError::EmptyField(Field::Back));
    }

    Ok(Record {
        index: trim_field(&line[..first]),
        front,
        back,
    })
}

/// Parse a line into its trimmed `(front, back)` pair.
///
/// # Example
/// ```
/// use flashcard_core::parse_record;
///
/// assert_eq!(parse_record("1;café;coffee"), Ok(("café", "coffee")));
/// ```
pub fn parse_record(line: &str) -> Result<(&str, &str), RecordError> {
    parse_record_line(line).map(|record| (record.front, record.back))
}

use std::fmt;

use crate::model::Side;

/// Fatal errors: the run aborts before any matching happens.
#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad timezone, empty field, vocabulary clash, etc.).
    ConfigValidation(String),
    /// A source references a schema the registry doesn't know.
    UnknownSchema { side: Side, schema: String },
    /// Input document could not be parsed as records at all.
    Parse(String),
    /// IO error (file read, export write, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownSchema { side, schema } => {
                write!(f, "{side} source: unknown schema '{schema}'")
            }
            Self::Parse(msg) => write!(f, "input parse error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

/// Per-record errors. The record is excluded from matching and listed
/// in the report's unprocessable section; the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Required field absent or carrying a type the schema can't accept.
    Mapping(MappingError),
    /// Value present but outside the canonical domain.
    Normalization(NormalizationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    MissingField { field: &'static str, source_field: String },
    WrongType { field: &'static str, source_field: String, found: &'static str },
    EmptyId { source_field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    MalformedAmount(String),
    NegativeAmount(String),
    BadCurrency(String),
    EmptyStatus,
    BadTimestamp(String),
}

impl RecordError {
    /// Stable machine-readable kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mapping(_) => "mapping_error",
            Self::Normalization(_) => "normalization_error",
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mapping(e) => write!(f, "mapping error: {e}"),
            Self::Normalization(e) => write!(f, "normalization error: {e}"),
        }
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field, source_field } => {
                write!(f, "required field '{field}' (source '{source_field}') is missing")
            }
            Self::WrongType { field, source_field, found } => {
                write!(f, "field '{field}' (source '{source_field}') has unusable type {found}")
            }
            Self::EmptyId { source_field } => {
                write!(f, "transaction id (source '{source_field}') is empty")
            }
        }
    }
}

impl fmt::Display for NormalizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedAmount(v) => write!(f, "cannot parse amount '{v}'"),
            Self::NegativeAmount(v) => write!(f, "amount '{v}' is negative"),
            Self::BadCurrency(v) => write!(f, "invalid currency code '{v}'"),
            Self::EmptyStatus => write!(f, "status is empty"),
            Self::BadTimestamp(v) => write!(f, "cannot parse timestamp '{v}'"),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<MappingError> for RecordError {
    fn from(e: MappingError) -> Self {
        Self::Mapping(e)
    }
}

impl From<NormalizationError> for RecordError {
    fn from(e: NormalizationError) -> Self {
        Self::Normalization(e)
    }
}

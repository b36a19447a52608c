//! Load and query error types.
//!
//! A `LoadError` aborts the load that raised it; no partially built schedule
//! is ever returned alongside one. A `QueryError` is an ordinary "no such
//! thing" answer from a loaded schedule and leaves it untouched.

/// Errors that abort loading a feed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A mandatory table is absent from the archive
    #[error("missing required table {table}")]
    MissingRequiredTable { table: &'static str },

    /// A file that is not a known table, with unknown files disallowed
    #[error("unknown file {file} in feed")]
    UnknownFile { file: String },

    /// A column that is not in the table's schema, with unknown fields disallowed
    #[error("unknown field {field} in {table}")]
    UnknownField { table: &'static str, field: String },

    /// A required column is absent from the table header
    #[error("missing column {field} in {table}")]
    MissingColumn {
        table: &'static str,
        field: &'static str,
    },

    /// A row with the wrong shape or an unparsable value
    #[error("malformed row {table}:{row} field {field}: {reason}")]
    MalformedRow {
        table: &'static str,
        row: usize,
        field: String,
        reason: String,
    },

    /// A primary key that appears more than once in a table
    #[error("duplicate key {key} in {table}")]
    DuplicateKey { table: &'static str, key: String },

    /// A foreign key with no matching target
    #[error("{table} {id} references unknown {target} {target_id} via {field}")]
    DanglingReference {
        table: &'static str,
        id: String,
        field: &'static str,
        target: &'static str,
        target_id: String,
    },

    /// Sequence numbers or times that do not progress within a trip or shape
    #[error("invalid sequence in {table} {id}: {reason}")]
    InvalidSequence {
        table: &'static str,
        id: String,
        reason: String,
    },

    /// The CSV layer could not read a table
    #[error("cannot read {table}: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    /// Two archive members share a base name
    #[error("duplicate file {file} in archive")]
    DuplicateFile { file: String },

    /// The zip archive could not be opened or read
    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub(crate) fn malformed(
        table: &'static str,
        row: usize,
        field: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        LoadError::MalformedRow {
            table,
            row,
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn duplicate(table: &'static str, key: impl Into<String>) -> Self {
        LoadError::DuplicateKey {
            table,
            key: key.into(),
        }
    }
}

/// Errors from looking things up in a loaded schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// No entity of this kind has the id
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A name search matched more than one stop
    #[error("stop name {query:?} matches {} stops: {}", matches.len(), matches.join(", "))]
    AmbiguousName { query: String, matches: Vec<String> },

    /// A blank id or name
    #[error("empty query")]
    EmptyQuery,
}

impl QueryError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        QueryError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

//! Error types for KestrelDB

use thiserror::Error;

/// Result type alias using KestrelDB's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for KestrelDB
#[derive(Error, Debug)]
pub enum Error {
    // Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // Transaction errors
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    // SQL errors
    #[error("SQL error: {0}")]
    Sql(#[from] SqlError),

    // Query errors
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Internal errors: a broken invariant upstream, never user-correctable
    #[error("Internal error: {0}")]
    Internal(String),

    // Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    RecordNotFound(u64),

    #[error("Record arity mismatch: expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    IoError(String),
}

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Transaction already committed: {0}")]
    AlreadyCommitted(u64),
}

#[derive(Error, Debug)]
pub enum SqlError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Field missing: {0}")]
    FieldMissing(String),
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Out of memory")]
    OutOfMemory,
}

impl Error {
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// True for invariant violations that indicate a defect in an upstream component.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }

    /// Return a PostgreSQL-compatible SQLSTATE code for this error.
    ///
    /// Codes follow the PostgreSQL convention:
    /// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
    pub fn sqlstate(&self) -> &'static str {
        match self {
            Error::Storage(se) => match se {
                StorageError::RecordNotFound(_) => "02000", // no_data
                StorageError::ArityMismatch { .. } => "XX000",
                StorageError::IoError(_) => "58030",        // io_error
            },
            Error::Transaction(TransactionError::AlreadyCommitted(_)) => "25000", // invalid_transaction_state
            Error::Sql(se) => match se {
                SqlError::TableNotFound(_) => "42P01",       // undefined_table
                SqlError::FieldMissing(_) => "42703",        // undefined_column
            },
            Error::Query(QueryError::OutOfMemory) => "53200", // out_of_memory
            Error::Io(_) => "58030",
            Error::Config(_) => "F0000",           // config_file_error
            Error::Internal(_) => "XX000",         // internal_error
            Error::InvalidArgument(_) => "22023",  // invalid_parameter_value
        }
    }
}

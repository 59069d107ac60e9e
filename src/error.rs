use thiserror::Error;

/// Errors surfaced by [`crate::connections::ConnectionsDb`] and its wire format.
///
/// Storage never panics on a missing or malformed record; these are returned
/// from the handful of operations that can fail (mostly I/O at load time).
#[derive(Error, Debug)]
pub enum StorageError {
    /// The packed slot at this internal id was never written (storage returned
    /// its `0xFF`-filled sentinel).
    #[error("record {0} is unwritten (bad record)")]
    BadRecord(u32),
    /// The wire format's version byte does not match the version this build
    /// knows how to read.
    #[error("incompatible wire format version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: u8, found: u8 },
    /// A `sized_blob` declared more bytes than remained in the reader.
    #[error("truncated wire format: expected {expected} bytes, found {found}")]
    Truncated { expected: u64, found: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced while building a scan (`QueryBuilder`) before it runs.
///
/// The scanner itself never returns an error: a scan with no journeys just
/// yields an empty frontier. Only malformed *settings* are rejected, and they
/// are rejected up front so the caller never pays for a doomed scan.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown stop id in scan settings")]
    UnknownStop,
    #[error("time window end ({window_end:?}) is before window start ({window_start:?})")]
    InvalidTimeWindow {
        window_start: crate::shared::Time,
        window_end: crate::shared::Time,
    },
    #[error("origin and destination must differ")]
    OriginEqualsDestination,
}

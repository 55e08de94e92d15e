//! Error types for Plantwatch
//!
//! This module defines all error types used throughout the library.

use crate::registry::SensorKind;
use thiserror::Error;

/// Result type alias for Plantwatch operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for Plantwatch operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Snapshot contents cannot be reduced
    #[error("Data quality error: {0}")]
    DataQuality(#[from] DataQualityError),

    /// Reading source failure
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Reduction requested over an empty record buffer
    #[error("No data: record buffer is empty")]
    NoData,

    /// Chart requested with no input series
    #[error("Cannot render {0}: input series is empty")]
    EmptySeries(&'static str),

    /// Chart backend failure
    #[error("Chart error: {0}")]
    Chart(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while reducing a snapshot
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataQualityError {
    /// A sensor group is absent from the snapshot
    #[error("Missing sensor group: {0}")]
    MissingGroup(SensorKind),

    /// A sensor group has no readings, so its mean is undefined
    #[error("Sensor group {0} has no readings")]
    EmptyGroup(SensorKind),

    /// Efficiency would divide a nonzero flow by zero power
    #[error("Zero total power with nonzero flow ({flow})")]
    ZeroPower { flow: f64 },
}

/// Errors raised by a reading source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    /// The source has no value for this sensor right now
    #[error("No reading available for sensor {0}")]
    Unavailable(String),

    /// A replayed recording reached its end
    #[error("Reading source exhausted")]
    Exhausted,

    /// Underlying source failure
    #[error("Source failure: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::from(DataQualityError::MissingGroup(SensorKind::FlowMeter));
        assert_eq!(
            err.to_string(),
            "Data quality error: Missing sensor group: flow_meter"
        );

        let err = MonitorError::from(ReadError::Unavailable("PM001".to_string()));
        assert!(err.to_string().contains("PM001"));
    }

    #[test]
    fn test_io_conversion() {
        let err: MonitorError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, MonitorError::Io(_)));
    }
}

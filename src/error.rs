//! Error handling module for clusterspec
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Parameter problems are carried as a structured [`ValidationReport`] so the
//! binary can print them in machine-readable form.

use thiserror::Error;

use crate::params::ValidationReport;

/// Main error type for clusterspec
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Parameter binding or verification failed
    #[error("Parameter validation failed: {0}")]
    Validation(ValidationReport),

    /// Address allocation outside the cluster subnet
    #[error("Address error: {0}")]
    Address(String),

    /// RSpec serialization errors
    #[error("XML error: {0}")]
    Xml(String),
}

/// Result type alias for clusterspec operations
pub type Result<T> = std::result::Result<T, ProfileError>;

// Convenient error constructors
impl ProfileError {
    /// Create an address allocation error
    pub fn address(msg: impl Into<String>) -> Self {
        Self::Address(msg.into())
    }

    /// Create an XML serialization error
    pub fn xml(msg: impl Into<String>) -> Self {
        Self::Xml(msg.into())
    }

    /// The structured report, if this is a validation failure
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(report) => Some(report),
            _ => None,
        }
    }
}

impl From<ValidationReport> for ProfileError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}

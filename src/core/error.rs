//! Error taxonomy shared by the validator, the rate engine and the HTTP layer.

use thiserror::Error;

use crate::core::context::Interrupted;
use crate::core::provider::ProviderError;
use crate::core::store::StoreError;

/// Every externally visible failure maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    NegativeAmount,
    InvalidRate,
    NonPositiveRate,
    EmptyCode,
    InvalidCodeLength,
    InvalidCodeCharacters,
    AlreadyExists,
    CurrencyNotFound,
    ProviderUnavailable,
    Cancelled,
    DeadlineExceeded,
    Storage,
}

/// Rejections produced while turning raw input into domain values.
///
/// The display strings are part of the API contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid amount")]
    InvalidAmount,

    #[error("amount must be non-negative")]
    NegativeAmount,

    #[error("invalid rate: {0}")]
    InvalidRate(String),

    #[error("rate must be positive")]
    NonPositiveRate,

    #[error("invalid currency code")]
    EmptyCode,

    #[error("invalid currency code, must be 3 characters long following ISO 4217")]
    InvalidCodeLength,

    #[error("invalid currency code, must contain only letters A-Z")]
    InvalidCodeCharacters,
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount => ErrorKind::InvalidAmount,
            Self::NegativeAmount => ErrorKind::NegativeAmount,
            Self::InvalidRate(_) => ErrorKind::InvalidRate,
            Self::NonPositiveRate => ErrorKind::NonPositiveRate,
            Self::EmptyCode => ErrorKind::EmptyCode,
            Self::InvalidCodeLength => ErrorKind::InvalidCodeLength,
            Self::InvalidCodeCharacters => ErrorKind::InvalidCodeCharacters,
        }
    }
}

/// Failures of rate resolution, conversion and currency administration.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("currency {0} already exists")]
    AlreadyExists(String),

    #[error("currency {0} not found")]
    CurrencyNotFound(String),

    #[error("rate provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl RateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::CurrencyNotFound(_) => ErrorKind::CurrencyNotFound,
            Self::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Self::Store(_) => ErrorKind::Storage,
        }
    }
}

impl From<Interrupted> for RateError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

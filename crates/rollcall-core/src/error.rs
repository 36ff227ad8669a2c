use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("display name is required")]
    EmptyDisplayName,
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("invalid country calling code: {0}")]
    InvalidCountryCode(String),
    #[error("invalid trunk prefix: {0}")]
    InvalidTrunkPrefix(String),
    #[error("invalid national number length: {0}")]
    InvalidNationalLength(usize),
    #[error("invalid tier: {0}")]
    InvalidTier(String),
    #[error("invalid color tag: {0}")]
    InvalidColorTag(String),
    #[error("invalid direction: {0}")]
    InvalidDirection(String),
    #[error("invalid minimum sender length: {0}")]
    InvalidSenderLength(usize),
    #[error("invalid source tag")]
    InvalidSourceTag,
}

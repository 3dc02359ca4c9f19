use crate::codec::CodecError;
use crate::crypto::SignatureError;
use crate::host::ExternalCallError;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// The class of a [`MicropayError`], without the reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Malformed,
    Auth,
    State,
    Sig,
    Math,
    External,
    NotFound,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Malformed => write!(f, "ErrMalformed"),
            ErrorKind::Auth => write!(f, "ErrAuth"),
            ErrorKind::State => write!(f, "ErrState"),
            ErrorKind::Sig => write!(f, "ErrSig"),
            ErrorKind::Math => write!(f, "ErrMath"),
            ErrorKind::External => write!(f, "ErrExternal"),
            ErrorKind::NotFound => write!(f, "ErrNotFound"),
        }
    }
}

/// Every way an operation can fail. Any error aborts the whole invocation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MicropayError {
    #[error("Malformed input: {0}")]
    Malformed(String),
    #[error("Missing witness: {0}")]
    Auth(String),
    #[error("The channel state does not allow this operation: {0}")]
    State(String),
    #[error("Signature verification failed: {0}")]
    Sig(String),
    #[error("Arithmetic precondition failed: {0}")]
    Math(String),
    #[error("Asset transfer failed: {0}")]
    External(String),
    #[error("Record not found: {0}")]
    NotFound(String),
}

impl MicropayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MicropayError::Malformed(_) => ErrorKind::Malformed,
            MicropayError::Auth(_) => ErrorKind::Auth,
            MicropayError::State(_) => ErrorKind::State,
            MicropayError::Sig(_) => ErrorKind::Sig,
            MicropayError::Math(_) => ErrorKind::Math,
            MicropayError::External(_) => ErrorKind::External,
            MicropayError::NotFound(_) => ErrorKind::NotFound,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        MicropayError::Malformed(reason.into())
    }

    pub fn state(reason: impl Into<String>) -> Self {
        MicropayError::State(reason.into())
    }

    pub fn math(reason: impl Into<String>) -> Self {
        MicropayError::Math(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        MicropayError::NotFound(reason.into())
    }
}

impl From<CodecError> for MicropayError {
    fn from(err: CodecError) -> Self {
        MicropayError::Malformed(err.to_string())
    }
}

impl From<SignatureError> for MicropayError {
    fn from(err: SignatureError) -> Self {
        MicropayError::Sig(err.to_string())
    }
}

impl From<ExternalCallError> for MicropayError {
    fn from(err: ExternalCallError) -> Self {
        MicropayError::External(err.to_string())
    }
}

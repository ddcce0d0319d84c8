//! Error type

use std::io;

#[derive(Debug, thiserror::Error)]
///Error of any operation in this crate
pub enum Error {
    ///Malformed call arguments: empty required sequence, non-positive size, wrong mode.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    ///Unknown or out of bounds tuning parameter, or capability missing from this zstd build.
    #[error("{0}")]
    Configuration(String),
    ///Buffer is too short to answer, supplying more bytes may help.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    ///Structurally invalid compressed data, including dictionary mismatch.
    ///
    ///`partial_output` holds output decoded during the failing call before the bad bytes were
    ///reached.
    #[error("{message}")]
    Data {
        ///Description of failure.
        message: String,
        ///Valid output produced by the failing call.
        partial_output: Vec<u8>,
    },
    ///Capability requires newer zstd library.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    ///Instance is in terminal or incompatible state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    ///Content cannot be used as dictionary.
    #[error("invalid dictionary: {0}")]
    InvalidDictionary(String),
    ///zstd failed to train, finalize or load dictionary.
    #[error("{0}")]
    Dictionary(String),
    ///Underlying source or sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

///Result alias
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    #[inline]
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    #[inline]
    pub(crate) fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
            partial_output: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn zstd(context: &str, code: usize) -> Self {
        Self::data(format!("{context}: {}", crate::utils::error_name(code)))
    }

    ///Unwraps error that passed through `io::Error`, keeping other I/O errors as they are.
    pub(crate) fn from_io(error: io::Error) -> Self {
        let is_own = error.get_ref().is_some_and(|inner| inner.is::<Error>());
        if !is_own {
            return Self::Io(error);
        }

        let kind = error.kind();
        match error.into_inner() {
            Some(inner) => match inner.downcast::<Error>() {
                Ok(error) => *error,
                Err(inner) => Self::Io(io::Error::new(kind, inner)),
            },
            None => Self::Io(kind.into()),
        }
    }

    #[inline]
    ///Returns output decoded before failure, if this is data error.
    pub fn partial_output(&self) -> &[u8] {
        match self {
            Self::Data { partial_output, .. } => partial_output,
            _ => &[],
        }
    }

    #[inline]
    ///Returns whether error is caused by corrupted input
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(error) => error,
            Error::Data { .. } | Error::InsufficientData(_) => io::Error::new(io::ErrorKind::InvalidData, error),
            Error::InvalidArgument(_) | Error::Configuration(_) => io::Error::new(io::ErrorKind::InvalidInput, error),
            Error::UnsupportedOperation(_) => io::Error::new(io::ErrorKind::Unsupported, error),
            error => io::Error::new(io::ErrorKind::Other, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_into_io_error() {
        let error = io::Error::from(Error::data("broken frame"));
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
        let inner = error.into_inner().expect("to have inner").downcast::<Error>().expect("to be crate error");
        assert!(inner.is_data());

        let error = io::Error::from(Error::Io(io::Error::new(io::ErrorKind::NotFound, "missing")));
        assert_eq!(error.kind(), io::ErrorKind::NotFound);

        let error = io::Error::from(Error::InvalidState("closed"));
        assert_eq!(error.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn should_restore_error_from_io_error() {
        let error = Error::from_io(io::Error::from(Error::data("broken frame")));
        assert!(error.is_data());
        assert_eq!(error.to_string(), "broken frame");

        let error = Error::from_io(io::Error::from(Error::InvalidState("closed")));
        assert!(matches!(error, Error::InvalidState("closed")));

        let error = Error::from_io(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(matches!(&error, Error::Io(error) if error.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn should_keep_partial_output() {
        let error = Error::Data {
            message: "bad header".to_owned(),
            partial_output: vec![1, 2, 3],
        };
        assert_eq!(error.partial_output(), &[1, 2, 3]);
        assert_eq!(error.to_string(), "bad header");
        assert!(Error::invalid_argument("x").partial_output().is_empty());
    }
}

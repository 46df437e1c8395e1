use crate::backup::pipeline::Stage;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use std::path::PathBuf;
use thiserror::Error;
use thiserror_ext::Construct;

#[derive(Error, Debug, Construct)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Source directory does not exist: {0:?}")]
    NotFound(PathBuf),
    #[error("Archive failed: {0}")]
    Archive(String),
    #[error("Encryption failed: {0}")]
    Encryption(String),
    #[error("Delivery rejected: {0}")]
    Delivery(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    AgeDecrypt(#[from] age::DecryptError),
    #[construct(skip)]
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[construct(skip)]
    #[error("{} failed:\n{}", fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithFnName { fn_name: String, error: Box<Error> },
    #[construct(skip)]
    #[error("{} stage failed:\n{}", stage, indent::indent_all_with("  ", error.to_string()))]
    Stage { stage: Stage, error: Box<Error> },
}

impl<S: Into<String>> AddMsg<S> for Error {
    fn add_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl<S: Into<String>> AddFunctionName<S> for Error {
    fn add_fn_name(self, fn_name: S) -> Self {
        Self::WithFnName {
            fn_name: fn_name.into(),
            error: Box::new(self),
        }
    }
}

impl Error {
    pub fn with_stage(self, stage: Stage) -> Self {
        Self::Stage {
            stage,
            error: Box::new(self),
        }
    }

    /// Outermost pipeline stage this error was annotated with.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            Error::WithMsg { error, .. } | Error::WithFnName { error, .. } => error.failed_stage(),
            _ => None,
        }
    }

    /// Strips annotation layers down to the underlying cause.
    pub fn root(&self) -> &Error {
        match self {
            Error::WithMsg { error, .. }
            | Error::WithFnName { error, .. }
            | Error::Stage { error, .. } => error.root(),
            e => e,
        }
    }

    /// Replaces a transport-level root cause (`Io`, `Reqwest`, `AgeDecrypt`)
    /// with `kind(cause)`, keeping every annotation layer above it.
    pub fn classify_as<F: FnOnce(String) -> Error>(self, kind: F) -> Self {
        match self {
            Error::WithMsg { msg, error } => Error::WithMsg {
                msg,
                error: Box::new(error.classify_as(kind)),
            },
            Error::WithFnName { fn_name, error } => Error::WithFnName {
                fn_name,
                error: Box::new(error.classify_as(kind)),
            },
            Error::Stage { stage, error } => Error::Stage {
                stage,
                error: Box::new(error.classify_as(kind)),
            },
            e @ (Error::Io(_) | Error::Reqwest(_) | Error::AgeDecrypt(_)) => kind(e.to_string()),
            e => e,
        }
    }
}

use std::fmt;

use failure::{Error, Fail};

#[derive(Debug, Fail)]
pub enum SnipsNluError {
    #[fail(display = "Unable to load nlu engine: {}", _0)]
    ModelLoad(String),
    #[fail(display = "Expected model version {} but found {}", runner, model)]
    WrongModelVersion { model: String, runner: &'static str },
    #[fail(display = "Unknown intent: '{}'", _0)]
    UnknownIntent(String),
    #[fail(display = "Internal error: {}", _0)]
    InternalError(String),
}

pub type Result<T> = ::std::result::Result<T, ::failure::Error>;

/// Renders a failure together with its whole chain of causes, one per line
pub struct PrettyFail<'a>(&'a dyn Fail);

impl<'a> fmt::Display for PrettyFail<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", &self.0)?;
        let mut current: &dyn Fail = self.0;
        while let Some(cause) = current.cause() {
            write!(fmt, "\n -> caused by: {}", &cause)?;
            current = cause;
        }
        Ok(())
    }
}

pub trait ErrorExt {
    fn pretty(&self) -> PrettyFail;
}

impl ErrorExt for Error {
    fn pretty(&self) -> PrettyFail {
        PrettyFail(self.as_fail())
    }
}

/// Wraps any loading failure into a `SnipsNluError::ModelLoad` carrying the full diagnostic
pub(crate) fn into_model_load_error(error: Error) -> Error {
    if let Some(SnipsNluError::ModelLoad(_)) = error.downcast_ref::<SnipsNluError>() {
        return error;
    }
    SnipsNluError::ModelLoad(error.pretty().to_string()).into()
}

use thiserror::Error;

// Every failure the lookup can run into. Only `InvalidSelection` is
// recoverable; the rest end the run with their message printed.
#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Incorrect data format, should be YYYY-MM-DD")]
    InvalidDateFormat,

    #[error("Please correct date parameters and try again.")]
    UserAborted,

    #[error("Status code: {status}\nError: {message}\n\nPlease retry your query.")]
    ApiError { status: u16, message: String },

    #[error("\nNo results. Please alter date parameters and try again.")]
    EmptyResults,

    #[error("Please make a valid selection.")]
    InvalidSelection(String),

    #[error("Input closed before a selection was made")]
    InputClosed,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AvailabilityError {
    fn from(err: reqwest::Error) -> Self {
        AvailabilityError::Network(err.to_string())
    }
}

impl From<::config::ConfigError> for AvailabilityError {
    fn from(err: ::config::ConfigError) -> Self {
        AvailabilityError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AvailabilityError>;

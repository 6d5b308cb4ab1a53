// Availability lookup against the Redeam Booking API

pub mod cli;
pub mod client;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod presenter;
pub mod prompt;

// Re-export key types for convenience
pub use cli::Cli;
pub use client::{
    check_response, parse_availabilities, AvailabilityApi, RawResponse, RedeamClient,
};
pub use crate::config::{ApiSettings, Credentials, Settings};
pub use dates::{format_display, sanitize, DateRange};
pub use error::{AvailabilityError, Result};
pub use models::{Availability, AvailabilityResponse, Rate};
pub use presenter::{present, AvailabilityQuery, MenuEntry};
pub use prompt::{ConsolePrompt, Prompt, ScriptedPrompt};

use thiserror::Error;

/// Failure of a single data-source call.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No API key configured.\nHint: run `weatherview configure` or set OPENWEATHER_API_KEY.")]
    MissingCredential,

    #[error("Location not found: {0}")]
    NotFound(String),

    #[error("Failed to reach weather service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Weather service returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed weather response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Whether this failure should leave the current view untouched.
    pub fn is_terminal_before_request(&self) -> bool {
        matches!(self, FetchError::MissingCredential)
    }
}

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("Geolocation denied")]
    Denied,

    #[error("Geolocation unavailable: {0}")]
    Unavailable(String),

    #[error("Geolocation request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The controller task has stopped and no longer accepts commands.
#[derive(Debug, Error)]
#[error("Weather view controller has shut down")]
pub struct ControllerClosed;

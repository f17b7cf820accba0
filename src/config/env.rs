use super::{ServerConfig, merge, validation};

impl ServerConfig {
    /// Load configuration from environment variables only
    ///
    /// Unset variables fall back to defaults. Provider selectors are parsed here,
    /// so an unknown provider name fails startup rather than the first session.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format, a provider name is
    /// unsupported, or validation fails.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

use std::env::VarError;

#[derive(thiserror::Error, Debug)]
pub enum FromEnvError {
  #[error("Invalid value for environment variable {0}: {1}")]
  InvalidKey(String, #[source] anyhow::Error),
  #[error("Environment variable {0} is not valid unicode")]
  NotUnicode(String),
}

/// Reads an environment variable, treating empty values as unset.
pub fn optional_var(key: &str) -> Result<Option<String>, FromEnvError> {
  match std::env::var(key) {
    Ok(value) if value.trim().is_empty() => Ok(None),
    Ok(value) => Ok(Some(value)),
    Err(VarError::NotPresent) => Ok(None),
    Err(VarError::NotUnicode(_)) => Err(FromEnvError::NotUnicode(key.to_string())),
  }
}

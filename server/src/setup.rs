use std::env;
use std::env::VarError;
use std::fmt::{Display, Formatter};

const DEFAULT_SESSION_MAX_AGE_DAYS: u64 = 7;

/// Get the database URL from the environment variable.
pub fn get_database_url_from_env() -> Result<String, SetupError> {
    env::var("DATABASE_URL").map_err(|e| SetupError::from_env_error(e, "DATABASE_URL"))
}

/// Get the cryptographic application secret for signing session tokens from the environment
/// variable.
pub fn get_secret_from_env() -> Result<String, SetupError> {
    let secret = env::var("SECRET").map_err(|e| SetupError::from_env_error(e, "SECRET"))?;
    if secret.len() < 16 {
        return Err(SetupError::EnvVariableInvalid {
            variable_name: "SECRET",
            problem: "Must be at least 16 characters long",
        });
    }
    Ok(secret)
}

/// Get the web server TCP listening port from the environment variable
pub fn get_listen_port_from_env() -> Result<u16, SetupError> {
    env::var("LISTEN_PORT")
        .map_err(|e| SetupError::from_env_error(e, "LISTEN_PORT"))
        .and_then(|v| {
            v.parse().map_err(|_| SetupError::EnvVariableInvalid {
                variable_name: "LISTEN_PORT",
                problem: "Not a valid uint16",
            })
        })
}

/// Get the web server TCP listening interface address from the environment variable
pub fn get_listen_address_from_env() -> Result<String, SetupError> {
    env::var("LISTEN_ADDRESS").map_err(|e| SetupError::from_env_error(e, "LISTEN_ADDRESS"))
}

/// Get the maximum age of session tokens from the environment variable. Defaults to 7 days, if
/// the variable is not set.
pub fn get_session_max_age_from_env() -> Result<std::time::Duration, SetupError> {
    match env::var("SESSION_MAX_AGE_DAYS") {
        Ok(v) => parse_session_max_age(&v),
        Err(VarError::NotPresent) => Ok(std::time::Duration::from_secs(
            DEFAULT_SESSION_MAX_AGE_DAYS * 86400,
        )),
        Err(e) => Err(SetupError::from_env_error(e, "SESSION_MAX_AGE_DAYS")),
    }
}

fn parse_session_max_age(value: &str) -> Result<std::time::Duration, SetupError> {
    value
        .parse::<u64>()
        .ok()
        .and_then(|days| days.checked_mul(86400))
        .map(std::time::Duration::from_secs)
        .ok_or(SetupError::EnvVariableInvalid {
            variable_name: "SESSION_MAX_AGE_DAYS",
            problem: "Not a valid number of days",
        })
}

#[derive(Debug)]
pub enum SetupError {
    EnvVariableMissing {
        variable_name: &'static str,
    },
    EnvVariableInvalid {
        variable_name: &'static str,
        problem: &'static str,
    },
}

impl SetupError {
    fn from_env_error(error: VarError, variable_name: &'static str) -> Self {
        match error {
            VarError::NotPresent => Self::EnvVariableMissing { variable_name },
            VarError::NotUnicode(_) => Self::EnvVariableInvalid {
                variable_name,
                problem: "no valid unicode",
            },
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::EnvVariableMissing { variable_name } => {
                write!(f, "Environment variable {} must be defined", variable_name)
            }
            SetupError::EnvVariableInvalid {
                variable_name,
                problem,
            } => write!(
                f,
                "Value of environment variable {} is invalid: {}",
                variable_name, problem
            ),
        }
    }
}

impl std::error::Error for SetupError {}

use crate::data_store::StoreError;
use crate::setup::SetupError;
use diesel::ConnectionError;

#[derive(Debug)]
pub enum CliError {
    /// The environment variables are incomplete or invalid
    SetupError(String),
    CouldNotConnectToDatabase(String),
    /// Any other failure of the data store, e.g. a failing query
    UnexpectedStoreError(String),
    /// Binding the web server to the requested port failed
    BindError(std::io::Error),
    /// Running the web server failed with an io error
    ServerError(std::io::Error),
    DatabaseMigrationError(String),
    /// Cannot start because one or more database schema migrations are pending
    DatabaseMigrationRequired {
        /// The names of the pending database schema migrations
        missing_migrations: Vec<String>,
    },
    /// The user given on the command line does not exist or has not been approved yet
    UserNotActive { pending_approval: bool },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SetupError(_) | CliError::UserNotActive { .. } => 1,
            CliError::UnexpectedStoreError(_) => 2,
            CliError::BindError(_) | CliError::ServerError(_) => 3,
            CliError::CouldNotConnectToDatabase(_) | CliError::DatabaseMigrationError(_) => 4,
            CliError::DatabaseMigrationRequired { .. } => 5,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::SetupError(e) => write!(f, "Setup invalid: {}", e),
            CliError::CouldNotConnectToDatabase(e) => {
                write!(f, "Could not connect to database: {}", e)
            }
            CliError::UnexpectedStoreError(e) => write!(f, "Unexpected error in data store: {}", e),
            CliError::BindError(e) => {
                write!(f, "Could not bind web server socket to TCP port: {}", e)
            }
            CliError::ServerError(e) => write!(f, "Web server failed: {}", e),
            CliError::DatabaseMigrationError(e) => {
                write!(f, "Error while applying database migrations: {}", e)
            }
            CliError::DatabaseMigrationRequired { missing_migrations } => write!(
                f,
                "Database migration required. Missing migrations: {}",
                missing_migrations.join(", ")
            ),
            CliError::UserNotActive {
                pending_approval: true,
            } => f.write_str("The user has not been approved yet."),
            CliError::UserNotActive {
                pending_approval: false,
            } => f.write_str("The user does not exist."),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(e) => Self::CouldNotConnectToDatabase(e),
            StoreError::UserNotActive { pending_approval } => {
                Self::UserNotActive { pending_approval }
            }
            // The cli's auth token holds all privileges and it does not modify entities, so
            // anything else is unexpected
            e => Self::UnexpectedStoreError(e.to_string()),
        }
    }
}

impl From<SetupError> for CliError {
    fn from(value: SetupError) -> Self {
        Self::SetupError(value.to_string())
    }
}

impl From<ConnectionError> for CliError {
    fn from(value: ConnectionError) -> Self {
        Self::CouldNotConnectToDatabase(value.to_string())
    }
}

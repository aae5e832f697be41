//! Implementation of the command line subcommands, besides serving the web application
pub mod database_migration;
pub mod manage_events;
pub mod manage_sessions;

/// Key for creating an [crate::data_store::auth_token::AuthToken] with admin privileges for cli
/// functions. It can only be constructed here, so web code cannot obtain such a token by
/// accident.
pub struct CliAuthTokenKey {
    _private: (),
}

impl CliAuthTokenKey {
    #[allow(clippy::new_without_default)] // We always want to explicitly create these objects
    pub fn new() -> Self {
        Self { _private: () }
    }
}

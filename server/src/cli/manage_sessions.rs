use crate::auth_session::SessionToken;
use crate::cli_error::CliError;
use crate::data_store::{get_store_from_env, GroupPlanStore, UserId};
use crate::setup::get_secret_from_env;
use log::info;

/// Issue a new session token for the given user and print it to stdout.
///
/// The user must exist and must have been approved. The token is signed with the application
/// secret from the environment, so it is accepted by a server running with the same
/// configuration.
pub fn create_session_token(user_id: UserId) -> Result<(), CliError> {
    let secret = get_secret_from_env()?;
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let session_token = SessionToken::new(user_id);
    let auth_token = data_store.get_auth_token_for_session(&session_token)?;
    info!(
        "Creating session token for user {} (member of {} groups)",
        user_id,
        auth_token.group_ids().len()
    );

    println!("{}", session_token.as_string(&secret));
    Ok(())
}

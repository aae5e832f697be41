use crate::web::api::APIError;
use log::{error, warn};

/// Log failed API requests. Client-caused permission and session failures are logged as
/// warnings with the client's address, internal failures as errors with their cause. Expected
/// business outcomes (full event, missing entity, invalid data) are not logged.
pub async fn error_logging_middleware<B: actix_web::body::MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<B>, actix_web::Error> {
    let response = next.call(req).await?;

    if let Some(error) = response.response().error() {
        if let Some(api_error) = error.as_error::<APIError>() {
            let client_address = response
                .request()
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_owned();
            match api_error {
                APIError::PermissionDenied { required_privilege } => {
                    warn!(
                        "HTTP {} permission denied at <{}>. Client: <{}> Requires privilege: {:?}",
                        response.response().status(),
                        response.request().uri(),
                        client_address,
                        required_privilege,
                    );
                }
                APIError::NoSessionToken => {
                    warn!(
                        "HTTP {} permission denied at <{}>. Client: <{}> Cause: No session token",
                        response.response().status(),
                        response.request().uri(),
                        client_address,
                    );
                }
                APIError::InvalidSessionToken => {
                    warn!(
                        "HTTP {} invalid session token. Client: <{}>",
                        response.response().status(),
                        client_address,
                    );
                }
                APIError::UserNotActive { pending_approval } => {
                    warn!(
                        "HTTP {} session of inactive user at <{}>. Client: <{}>{}",
                        response.response().status(),
                        response.request().uri(),
                        client_address,
                        if *pending_approval {
                            " User is pending approval."
                        } else {
                            " User does not exist."
                        }
                    );
                }
                APIError::NotExisting
                | APIError::ReservationNotExisting
                | APIError::AlreadyExisting
                | APIError::InvalidJson(_)
                | APIError::InvalidData(_)
                | APIError::EventFull { .. }
                | APIError::AlreadyReserved
                | APIError::EventInPast
                | APIError::CapacityBelowReservationCount { .. }
                | APIError::TransactionConflict => {}
                APIError::InternalError(e) => {
                    error!(
                        "HTTP {} internal server error at <{}>: {}",
                        response.response().status(),
                        response.request().uri(),
                        e
                    );
                }
            }
        } else {
            error!(
                "HTTP {} unexpected error at <{}>: {:?}",
                response.response().status(),
                response.request().uri(),
                error
            );
        }
    }
    Ok(response)
}

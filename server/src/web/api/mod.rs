use std::fmt::Display;

mod endpoints_event;
mod endpoints_reservation;
#[cfg(test)]
mod tests;

use crate::auth_session::SessionToken;
use crate::data_store::auth_token::Privilege;
use crate::data_store::StoreError;
use crate::recurrence::RecurrenceError;
use actix_web::error::JsonPayloadError;
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    web, HttpResponse,
};
use serde_json::json;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(get_api_service());
}

fn get_api_service() -> actix_web::Scope {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| APIError::InvalidJson(err).into());
    web::scope("/api/v1")
        .app_data(json_config)
        .service(endpoints_event::list_upcoming_events)
        .service(endpoints_event::list_reserved_events)
        .service(endpoints_event::list_all_events)
        .service(endpoints_event::get_event)
        .service(endpoints_event::update_event)
        .service(endpoints_event::delete_event)
        .service(endpoints_event::clone_event)
        .service(endpoints_event::list_group_events)
        .service(endpoints_event::create_event)
        .service(endpoints_event::create_recurring_events)
        .service(endpoints_reservation::reserve)
        .service(endpoints_reservation::cancel_reservation)
        .service(endpoints_reservation::list_reservations)
}

/// The server's current calendar date, used for deciding if an event lies in the past
fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug)]
pub enum APIError {
    NotExisting,
    ReservationNotExisting,
    AlreadyExisting,
    PermissionDenied {
        required_privilege: Privilege,
    },
    NoSessionToken,
    InvalidSessionToken,
    UserNotActive {
        pending_approval: bool,
    },
    InvalidJson(actix_web::error::JsonPayloadError),
    InvalidData(String),
    EventFull {
        capacity: i32,
    },
    AlreadyReserved,
    EventInPast,
    CapacityBelowReservationCount {
        reservation_count: i64,
    },
    TransactionConflict,
    /// Unexpected failure. The string describes the cause for the log, but is not sent to the
    /// client.
    InternalError(String),
}

impl Display for APIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotExisting => f.write_str("Element does not exist")?,
            Self::ReservationNotExisting => {
                f.write_str("You do not have a reservation for this event.")?
            }
            Self::AlreadyExisting => {
                f.write_str("Element already exists")?;
            },
            Self::PermissionDenied{required_privilege} => {
                write!(f, "Client is not authorized to perform this action. Authentication as {} is required.",
                       required_privilege
                           .qualifying_roles()
                           .iter()
                           .map(|role| role.name().to_owned())
                           .collect::<Vec<String>>()
                           .join(" or "))?;
            },
            Self::NoSessionToken => {
                f.write_str("This action requires authentication, but client did not send authentication session token.")?
            },
            Self::InvalidSessionToken => {
                f.write_str("This action requires authentication, but client authentication session given by the client is not valid.")?
            },
            Self::UserNotActive { pending_approval: true } => {
                f.write_str("Your account has not been approved by an administrator yet.")?
            },
            Self::UserNotActive { pending_approval: false } => {
                f.write_str("The account of this session does not exist.")?
            },
            Self::InternalError(_) => {
                f.write_str("Internal server error. Please try again later.")?;
            },
            Self::InvalidJson(e) => {
                write!(f, "Invalid JSON request data: {}", e)?;
            },
            Self::InvalidData(e) => {
                write!(f, "Invalid request data: {}", e)?;
            },
            Self::EventFull { capacity } => {
                write!(f, "This event is full. All {} spots are taken.", capacity)?;
            },
            Self::AlreadyReserved => {
                f.write_str("You already have a reservation for this event.")?;
            },
            Self::EventInPast => {
                f.write_str("Cannot reserve spots for past events.")?;
            },
            Self::CapacityBelowReservationCount { reservation_count } => {
                write!(f, "Cannot reduce capacity below current reservation count ({}).", reservation_count)?;
            },
            Self::TransactionConflict => {
                f.write_str("Concurrent database transaction conflict. Please retry request.")?;
            },
        };
        Ok(())
    }
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse {
        let message = format!("{}", self);

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({
                "httpCode": self.status_code().as_u16(),
                "message": message
            }))
    }
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotExisting => StatusCode::NOT_FOUND,
            Self::ReservationNotExisting => StatusCode::NOT_FOUND,
            Self::AlreadyExisting => StatusCode::BAD_REQUEST,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::NoSessionToken => StatusCode::FORBIDDEN,
            Self::InvalidSessionToken => StatusCode::FORBIDDEN,
            Self::UserNotActive { .. } => StatusCode::FORBIDDEN,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidJson(e) => match e {
                JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidData(_)
            | Self::EventFull { .. }
            | Self::AlreadyReserved
            | Self::EventInPast
            | Self::CapacityBelowReservationCount { .. } => StatusCode::BAD_REQUEST,
            Self::TransactionConflict => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => {
                Self::InternalError(format!("Could not connect to database: {}", error))
            }
            StoreError::QueryError(diesel_error) => Self::InternalError(format!(
                "Error while executing database query: {}",
                diesel_error
            )),
            StoreError::TransactionConflict => Self::TransactionConflict,
            StoreError::NotExisting => Self::NotExisting,
            StoreError::ReservationNotExisting => Self::ReservationNotExisting,
            StoreError::ConflictEntityExists => Self::AlreadyExisting,
            StoreError::EventFull { capacity } => Self::EventFull { capacity },
            StoreError::AlreadyReserved => Self::AlreadyReserved,
            StoreError::EventInPast => Self::EventInPast,
            StoreError::CapacityBelowReservationCount { reservation_count } => {
                Self::CapacityBelowReservationCount { reservation_count }
            }
            StoreError::PermissionDenied {
                required_privilege,
                group_id: _,
            } => Self::PermissionDenied { required_privilege },
            StoreError::UserNotActive { pending_approval } => {
                Self::UserNotActive { pending_approval }
            }
            StoreError::InvalidInputData(e) => Self::InvalidData(e),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
        }
    }
}

impl From<RecurrenceError> for APIError {
    fn from(e: RecurrenceError) -> Self {
        APIError::InvalidData(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for APIError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        APIError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}

impl From<crate::auth_session::SessionError> for APIError {
    fn from(_e: crate::auth_session::SessionError) -> Self {
        APIError::InvalidSessionToken
    }
}

struct SessionTokenHeader(String);

impl SessionTokenHeader {
    fn session_token(
        &self,
        secret: &str,
        max_age: std::time::Duration,
    ) -> Result<SessionToken, crate::auth_session::SessionError> {
        SessionToken::from_string(&self.0, secret, max_age)
    }
}

impl actix_web::http::header::TryIntoHeaderValue for SessionTokenHeader {
    type Error = actix_web::http::header::InvalidHeaderValue;

    fn try_into_value(self) -> Result<actix_web::http::header::HeaderValue, Self::Error> {
        self.0.parse()
    }
}

impl actix_web::http::header::Header for SessionTokenHeader {
    fn name() -> actix_web::http::header::HeaderName {
        actix_web::http::header::HeaderName::from_static("x-session-token")
    }

    fn parse<M: actix_web::HttpMessage>(msg: &M) -> Result<Self, actix_web::error::ParseError> {
        Ok(Self(
            msg.headers()
                .get(Self::name())
                .ok_or(actix_web::error::ParseError::Header)?
                .to_str()
                .unwrap_or("")
                .to_owned(),
        ))
    }
}

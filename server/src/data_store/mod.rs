//! The backend part of the backend: the database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [GroupPlanStore] trait. This object can be shared between threads in a
//! global application state and be used to create [GroupPlanStoreFacade] instances for interaction
//! with the database. These provide the operations of the event catalog and the reservation
//! engine, using the data models from the [models] module.
//!
//! The primary implementation of [GroupPlanStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [GroupPlanStoreFacade] objects
//! ([postgres::PgDataStoreFacade]) hold a reference to one pooled connection each, using the Diesel
//! query DSL for implementing the database interaction.
//!
//! There is also a mock implementation for unittests. Both implementations share the business
//! rules from the [rules] module, so they only differ in how they achieve atomicity.

use crate::auth_session::SessionToken;
use crate::cli_error::CliError;
use crate::setup;
use auth_token::{AuthToken, Privilege};

pub mod auth_token;
pub mod models;
mod postgres;
pub mod rules;
mod schema;

/// Get a [GroupPlanStore] instance, according the "DATABASE_URL" environment variable.
///
/// The DATABASE_URL must be a PosgreSQL connection url, following the schema
/// "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl GroupPlanStore, CliError> {
    Ok(postgres::PgDataStore::new(
        &setup::get_database_url_from_env()?,
    )?)
}

pub use setup::get_database_url_from_env;

pub type EventId = i32;
pub type GroupId = i32;
pub type UserId = i32;
pub type LocationId = i32;
pub type ReservationId = i32;

pub trait GroupPlanStoreFacade {
    /// Get an [AuthToken] instance for a client, representing the user identified by the session
    /// together with the user's role and group memberships.
    ///
    /// Fails with [StoreError::UserNotActive] if the user does not exist (anymore) or has not been
    /// approved yet.
    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError>;

    fn get_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<models::FullEvent, StoreError>;

    /// Get a filtered list of events.
    ///
    /// The required privilege depends on the filter: Listing the events of a single group requires
    /// the [Privilege::ShowEvents] privilege for that group, filtering for the user's own groups or
    /// reservations only requires a user identity. All other queries require
    /// [Privilege::ListAllEvents].
    ///
    /// Events are returned in chronological order, i.e. sorted by (date, start time), or in reverse
    /// chronological order, if [EventFilter::newest_first] is set.
    fn get_events(
        &mut self,
        auth_token: &AuthToken,
        filter: EventFilter,
    ) -> Result<Vec<models::FullEvent>, StoreError>;

    /// Create a single new event. The event's creator is set to the user of the auth_token.
    fn create_event(
        &mut self,
        auth_token: &AuthToken,
        event: models::NewEvent,
    ) -> Result<models::FullEvent, StoreError>;

    /// Create a batch of new events (typically a recurring series) in the given group.
    ///
    /// The events are created within a single transaction: Either all of them are created or none.
    /// The events' creator is set to the user of the auth_token. The result contains the created
    /// events in the order of the input.
    fn create_event_series(
        &mut self,
        auth_token: &AuthToken,
        group_id: GroupId,
        events: Vec<models::NewEvent>,
    ) -> Result<Vec<models::FullEvent>, StoreError>;

    /// Update the attributes of an event.
    ///
    /// The event is locked while checking the number of its current reservations. If the new
    /// capacity is lower than that number, the update is rejected with
    /// [StoreError::CapacityBelowReservationCount] and the event stays unchanged.
    fn update_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        event: models::EventPatch,
    ) -> Result<models::FullEvent, StoreError>;

    /// Delete an event together with all of its reservations
    fn delete_event(&mut self, auth_token: &AuthToken, event_id: EventId)
        -> Result<(), StoreError>;

    /// Create a copy of an existing event on a different date.
    ///
    /// Group, location, title, time window and capacity are copied. The copy is authored by the
    /// auth_token's user and starts without reservations.
    fn clone_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        new_date: chrono::NaiveDate,
    ) -> Result<models::FullEvent, StoreError>;

    /// Reserve a spot of the event for the auth_token's user.
    ///
    /// Capacity check and insertion are executed atomically with respect to other reservations
    /// of the same event. `today` is the current date of the server, used to reject reservations
    /// for past events.
    ///
    /// # return value
    /// - `Ok(reservation)` if the spot has been reserved, successfully
    /// - `Err(StoreError::NotExisting)` if the event does not exist
    /// - `Err(StoreError::EventInPast)` if the event's date is before `today`
    /// - `Err(StoreError::AlreadyReserved)` if the user holds a reservation for the event already
    /// - `Err(StoreError::EventFull)` if all spots of the event are taken
    /// - `Err(_)` if something different went wrong, as usual
    fn reserve(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        today: chrono::NaiveDate,
    ) -> Result<models::Reservation, StoreError>;

    /// Cancel the auth_token's user's reservation for the event and return the deleted
    /// reservation.
    ///
    /// Fails with [StoreError::ReservationNotExisting] if there is no such reservation, even if
    /// the user has cancelled the same reservation just before.
    fn cancel_reservation(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<models::Reservation, StoreError>;

    /// Get the list of attendees of the event in registration order
    fn get_reservations(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<Vec<models::Attendee>, StoreError>;
}

/// Filter options for retrieving events from the store via GroupPlanStoreFacade::get_events()
///
/// Can be constructed through the EventFilterBuilder
#[derive(Default, Debug, Clone)]
pub struct EventFilter {
    /// Filter for events of the given group
    pub group: Option<GroupId>,
    /// Filter for events on or after the given date
    pub from_date: Option<chrono::NaiveDate>,
    /// If true, filter for events of the groups the requesting user is a member of
    pub member_groups_only: bool,
    /// If true, filter for events the requesting user holds a reservation for
    pub reserved_only: bool,
    /// Sort in reverse chronological order
    pub newest_first: bool,
}

impl EventFilter {
    /// Checks if a given event matches the filter
    ///
    /// Usually, filtering should be done by the database. This function can be used for separate
    /// checks of individual events in software.
    pub fn matches(&self, event: &models::FullEvent, auth_token: &AuthToken) -> bool {
        if let Some(group) = self.group {
            if event.event.group_id != group {
                return false;
            }
        }
        if let Some(from_date) = self.from_date {
            if event.event.event_date < from_date {
                return false;
            }
        }
        if self.member_groups_only && !auth_token.group_ids().contains(&event.event.group_id) {
            return false;
        }
        if self.reserved_only && !event.is_reserved {
            return false;
        }
        true
    }

    /// The privilege required for querying events with this filter, or None if only a user
    /// identity is required.
    pub fn required_privilege(&self) -> Option<Privilege> {
        if self.group.is_some() {
            Some(Privilege::ShowEvents)
        } else if self.member_groups_only || self.reserved_only {
            None
        } else {
            Some(Privilege::ListAllEvents)
        }
    }
}

/// Builder for constructing EventFilter objects
pub struct EventFilterBuilder {
    result: EventFilter,
}

impl EventFilterBuilder {
    pub fn new() -> Self {
        Self {
            result: EventFilter::default(),
        }
    }

    /// Add filter to only include events of the given group
    pub fn in_group(&mut self, group_id: GroupId) -> &mut Self {
        self.result.group = Some(group_id);
        self
    }

    /// Add filter to only include events that take place on or after the given date
    pub fn from_date(&mut self, date: chrono::NaiveDate) -> &mut Self {
        self.result.from_date = Some(date);
        self
    }

    /// Add filter to only include events of the requesting user's groups
    pub fn in_member_groups(&mut self) -> &mut Self {
        self.result.member_groups_only = true;
        self
    }

    /// Add filter to only include events reserved by the requesting user
    pub fn reserved_by_user(&mut self) -> &mut Self {
        self.result.reserved_only = true;
        self
    }

    pub fn newest_first(&mut self) -> &mut Self {
        self.result.newest_first = true;
        self
    }

    /// Create the EventFilter object
    pub fn build(&self) -> EventFilter {
        self.result.clone()
    }
}

pub trait GroupPlanStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn GroupPlanStoreFacade + 'a>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    /// Connection the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be commited due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The user does not hold a reservation for the event to be cancelled
    ReservationNotExisting,
    /// The entity could not be created because it already exists, but cannot be updated with the
    /// provided data.
    ConflictEntityExists,
    /// All spots of the event are reserved already
    EventFull { capacity: i32 },
    /// The user holds a reservation for this event already
    AlreadyReserved,
    /// The event's date has passed, so it cannot be reserved anymore
    EventInPast,
    /// The event's capacity cannot be reduced below the number of its current reservations
    CapacityBelowReservationCount { reservation_count: i64 },
    /// The client is not authorized for this action. It would need to hold an access role
    /// qualifying for the `required_privilege` within the `group` (or globally if `group_id` is
    /// None).
    PermissionDenied {
        required_privilege: Privilege,
        group_id: Option<GroupId>,
    },
    /// The session's user does not exist (anymore) or has not been approved by an admin yet
    UserNotActive { pending_approval: bool },
    /// The provided data is invalid, i.e. it does not match the expected ranges or violates a
    /// SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::ConflictEntityExists,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::TransactionConflict,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | diesel::result::DatabaseErrorKind::CheckViolation,
                info,
            ) => Self::InvalidInputData(
                info.constraint_name()
                    .and_then(postgres::description_for_postgres_constraint)
                    .map(|s| s.to_owned())
                    .unwrap_or_else(|| info.message().to_owned()),
            ),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str("Database transaction could not be commited due to a conflicting concurrent transaction"),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::ReservationNotExisting => f.write_str("No reservation exists for this user and event."),
            Self::ConflictEntityExists => f.write_str("Database record exists already."),
            Self::EventFull { capacity } => write!(f, "Event is full. All {} spots are reserved.", capacity),
            Self::AlreadyReserved => f.write_str("User has a reservation for this event already."),
            Self::EventInPast => f.write_str("Cannot reserve spots for past events."),
            Self::CapacityBelowReservationCount { reservation_count } => write!(
                f,
                "Cannot reduce capacity below current reservation count ({}).",
                reservation_count
            ),
            Self::PermissionDenied {
                required_privilege,
                group_id: Some(group_id),
            } => {
                write!(f, "Client is not authorized to perform this action. {:?} privilege in group {} required.", required_privilege, group_id)
            }
            Self::PermissionDenied {
                required_privilege,
                group_id: None,
            } => {
                write!(f, "Client is not authorized to perform this action. Global {:?} privilege required.", required_privilege)
            }
            Self::UserNotActive { pending_approval: true } => {
                f.write_str("User account has not been approved yet.")
            }
            Self::UserNotActive { pending_approval: false } => {
                f.write_str("User account does not exist.")
            }
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            StoreError::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            },
        }
    }
}

impl std::error::Error for StoreError {}

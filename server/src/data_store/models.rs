use crate::data_store::{EventId, GroupId, LocationId, ReservationId, UserId};
use chrono::{naive::NaiveDate, DateTime, NaiveTime, Utc};
use diesel::prelude::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::events)]
pub struct Event {
    pub id: EventId,
    pub group_id: GroupId,
    pub creator_id: Option<UserId>,
    pub location_id: Option<LocationId>,
    pub title: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::events)]
pub struct NewEvent {
    pub group_id: GroupId,
    pub creator_id: Option<UserId>,
    pub location_id: Option<LocationId>,
    pub title: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
}

impl NewEvent {
    /// Create a new event for the group from the client-provided data. The creator is filled in by
    /// the data store.
    pub fn from_api(value: groupplan_api_types::EventData, group_id: GroupId) -> Self {
        Self {
            group_id,
            creator_id: None,
            location_id: value.location_id,
            title: value.title,
            event_date: value.event_date,
            start_time: value.start_time,
            end_time: value.end_time,
            capacity: value.capacity,
        }
    }

    /// Copy all attributes of an existing event, except for the date and the creator
    pub fn copy_of(source: &Event, event_date: NaiveDate) -> Self {
        Self {
            group_id: source.group_id,
            creator_id: None,
            location_id: source.location_id,
            title: source.title.clone(),
            event_date,
            start_time: source.start_time,
            end_time: source.end_time,
            capacity: source.capacity,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_event_fields(&self.title, self.capacity)
    }
}

/// Changed attributes of an existing event. Group and creator of an event can not be changed.
#[derive(Clone, Debug, AsChangeset)]
#[diesel(table_name=super::schema::events)]
#[diesel(treat_none_as_null = true)]
pub struct EventPatch {
    pub location_id: Option<LocationId>,
    pub title: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
}

impl From<groupplan_api_types::EventData> for EventPatch {
    fn from(value: groupplan_api_types::EventData) -> Self {
        Self {
            location_id: value.location_id,
            title: value.title,
            event_date: value.event_date,
            start_time: value.start_time,
            end_time: value.end_time,
            capacity: value.capacity,
        }
    }
}

impl EventPatch {
    pub fn validate(&self) -> Result<(), String> {
        validate_event_fields(&self.title, self.capacity)
    }
}

/// Checks shared by event creation and update. The end time is not compared to the start time, as
/// events may end after midnight.
fn validate_event_fields(title: &str, capacity: i32) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Event's title must not be empty.".to_owned());
    }
    if capacity < 1 {
        return Err("Event's capacity must be at least 1.".to_owned());
    }
    Ok(())
}

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name=super::schema::locations)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub address: String,
}

/// An event together with the names of the referenced entities and its reservation summary, from
/// the point of view of the requesting user
#[derive(Clone, Debug)]
pub struct FullEvent {
    pub event: Event,
    pub group_name: String,
    pub creator_name: Option<String>,
    pub location: Option<Location>,
    pub reservation_count: i64,
    pub is_reserved: bool,
}

impl FullEvent {
    pub fn available_spots(&self) -> i64 {
        (self.event.capacity as i64 - self.reservation_count).max(0)
    }
}

impl From<FullEvent> for groupplan_api_types::Event {
    fn from(value: FullEvent) -> Self {
        Self {
            id: value.event.id,
            group_id: value.event.group_id,
            group_name: value.group_name,
            creator_id: value.event.creator_id,
            creator_name: value.creator_name,
            location_id: value.event.location_id,
            location_name: value.location.as_ref().map(|l| l.name.clone()),
            location_address: value.location.map(|l| l.address),
            title: value.event.title,
            event_date: value.event.event_date,
            start_time: value.event.start_time,
            end_time: value.event.end_time,
            capacity: value.event.capacity,
            reservation_count: value.reservation_count,
            is_reserved: value.is_reserved,
        }
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name=super::schema::reservations)]
#[diesel(belongs_to(Event))]
pub struct Reservation {
    pub id: ReservationId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for groupplan_api_types::Reservation {
    fn from(value: Reservation) -> Self {
        Self {
            id: value.id,
            event_id: value.event_id,
            user_id: value.user_id,
            created_at: value.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name=super::schema::reservations)]
pub struct NewReservation {
    pub event_id: EventId,
    pub user_id: UserId,
}

/// A reservation joined with name and email address of the reserving user
#[derive(Clone, Debug)]
pub struct Attendee {
    pub reservation: Reservation,
    pub user_name: String,
    pub user_email: String,
}

impl From<Attendee> for groupplan_api_types::Attendee {
    fn from(value: Attendee) -> Self {
        Self {
            reservation_id: value.reservation.id,
            user_id: value.reservation.user_id,
            user_name: value.user_name,
            user_email: value.user_email,
            created_at: value.reservation.created_at,
        }
    }
}

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name=super::schema::users)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: String,
}

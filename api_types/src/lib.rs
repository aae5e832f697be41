use chrono::{naive::NaiveDate, DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled event of a group, as delivered to clients
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub group_id: i32,
    pub group_name: String,
    pub creator_id: Option<i32>,
    pub creator_name: Option<String>,
    pub location_id: Option<i32>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    pub title: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub reservation_count: i64,
    /// True, if the requesting user holds a reservation for this event
    pub is_reserved: bool,
}

/// Client-provided data for creating or updating a single event
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub title: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub location_id: Option<i32>,
    #[serde(alias = "maxSpots")]
    pub capacity: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

/// Request for creating a recurring series of events
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecurringEventsRequest {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub location_id: Option<i32>,
    #[serde(alias = "maxSpots")]
    pub capacity: i32,
    pub frequency: Frequency,
    /// Weekday indices (Sunday = 0). Only evaluated for daily and weekly series.
    #[serde(default)]
    pub days_of_week: Option<Vec<u8>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RecurringEventsResponse {
    pub events: Vec<Event>,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CloneEventRequest {
    pub new_date: NaiveDate,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i32,
    pub event_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

/// One attendee of an event, in registration order
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub reservation_id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

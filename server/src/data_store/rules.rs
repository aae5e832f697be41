//! Business rules of the event catalog and the reservation engine, shared by all
//! [super::GroupPlanStoreFacade] implementations.
//!
//! The functions in this module are pure decisions on data that the caller has loaded within its
//! atomic scope (e.g. a database transaction holding a lock on the event row). They do not access
//! the database themselves.

use super::auth_token::{AccessContext, AuthToken, Privilege};
use super::{models, StoreError, UserId};
use chrono::NaiveDate;

/// Decide whether the auth_token's user may reserve a spot of the given event.
///
/// Checks are executed in a fixed order, so that the first failing one determines the error:
/// privilege, event date, existing reservation of the user, remaining capacity. Thus, a user
/// holding a reservation for a full event is told about the reservation.
///
/// Returns the id of the user to create the reservation for.
pub fn check_reservation(
    auth_token: &AuthToken,
    event: &models::Event,
    today: NaiveDate,
    reservation_count: i64,
    already_reserved: bool,
) -> Result<UserId, StoreError> {
    let user_id = auth_token.require_user_id(Privilege::ReserveSpot)?;
    auth_token.check_privilege(AccessContext::of_event(event), Privilege::ReserveSpot)?;
    if event.event_date < today {
        return Err(StoreError::EventInPast);
    }
    if already_reserved {
        return Err(StoreError::AlreadyReserved);
    }
    if reservation_count >= event.capacity as i64 {
        return Err(StoreError::EventFull {
            capacity: event.capacity,
        });
    }
    Ok(user_id)
}

/// Decide whether an event's capacity may be changed, given its current number of reservations
pub fn check_capacity_change(new_capacity: i32, reservation_count: i64) -> Result<(), StoreError> {
    if (new_capacity as i64) < reservation_count {
        Err(StoreError::CapacityBelowReservationCount { reservation_count })
    } else {
        Ok(())
    }
}

/// Validate a batch of new events for creation in the given group and assign the creator.
///
/// All events must belong to `group_id`. The auth_token must have the
/// [Privilege::CreateEvents] privilege in this group.
pub fn prepare_new_events(
    auth_token: &AuthToken,
    group_id: super::GroupId,
    events: &mut [models::NewEvent],
) -> Result<(), StoreError> {
    auth_token.check_privilege(AccessContext::Group(group_id), Privilege::CreateEvents)?;
    for event in events.iter_mut() {
        if event.group_id != group_id {
            return Err(StoreError::InvalidInputData(
                "All events of a series must belong to the same group.".to_owned(),
            ));
        }
        prepare_event(auth_token, event)?;
    }
    Ok(())
}

/// Validate a single new event and make the auth_token's user its creator.
///
/// Does not check any privilege. For copies of existing events, the caller checks
/// [Privilege::EditEvent] on the source event instead of group membership, so that the creator of
/// an event can still copy it after leaving the group.
pub fn prepare_event(
    auth_token: &AuthToken,
    event: &mut models::NewEvent,
) -> Result<(), StoreError> {
    event.validate().map_err(StoreError::InvalidInputData)?;
    event.creator_id = auth_token.user_id();
    Ok(())
}

/// Check the privilege for querying events with the given filter
pub fn check_event_filter(
    auth_token: &AuthToken,
    filter: &super::EventFilter,
) -> Result<(), StoreError> {
    let context = match filter.group {
        Some(group_id) => AccessContext::Group(group_id),
        None => AccessContext::Global,
    };
    match filter.required_privilege() {
        Some(privilege) => auth_token.check_privilege(context, privilege),
        None => auth_token
            .require_user_id(Privilege::ShowEvents)
            .map(|_| ()),
    }
}

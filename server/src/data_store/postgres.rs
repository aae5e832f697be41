use super::{
    models, rules, schema, EventFilter, EventId, GroupId, GroupPlanStore, GroupPlanStoreFacade,
    LocationId, StoreError, UserId,
};
use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AccessContext, AuthToken, Privilege, UserRole};
use chrono::NaiveDate;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl GroupPlanStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn GroupPlanStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

impl GroupPlanStoreFacade for PgDataStoreFacade {
    fn get_auth_token_for_session(
        &mut self,
        session_token: &SessionToken,
    ) -> Result<AuthToken, StoreError> {
        let the_user_id = session_token.user_id();
        let user = schema::users::table
            .filter(schema::users::id.eq(the_user_id))
            .select(models::User::as_select())
            .first::<models::User>(&mut self.connection)
            .optional()?
            .ok_or(StoreError::UserNotActive {
                pending_approval: false,
            })?;
        let role = UserRole::try_from(user.role.as_str())
            .map_err(|e| StoreError::InvalidDataInDatabase(e.to_string()))?;
        if role == UserRole::Pending {
            return Err(StoreError::UserNotActive {
                pending_approval: true,
            });
        }

        let group_ids = schema::user_groups::table
            .filter(schema::user_groups::user_id.eq(the_user_id))
            .select(schema::user_groups::group_id)
            .load::<GroupId>(&mut self.connection)?;

        Ok(AuthToken::create_for_session(the_user_id, role, group_ids))
    }

    fn get_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<models::FullEvent, StoreError> {
        use schema::events::dsl::*;

        let event = events
            .filter(id.eq(event_id))
            .select(models::Event::as_select())
            .first::<models::Event>(&mut self.connection)?;
        auth_token.check_privilege(AccessContext::of_event(&event), Privilege::ShowEvents)?;

        load_full_event(event, auth_token.user_id(), &mut self.connection)
    }

    fn get_events(
        &mut self,
        auth_token: &AuthToken,
        filter: EventFilter,
    ) -> Result<Vec<models::FullEvent>, StoreError> {
        use schema::events::dsl::*;
        rules::check_event_filter(auth_token, &filter)?;

        let mut query = events.select(models::Event::as_select()).into_boxed();
        if let Some(the_group_id) = filter.group {
            query = query.filter(group_id.eq(the_group_id));
        }
        if let Some(from_date) = filter.from_date {
            query = query.filter(event_date.ge(from_date));
        }
        if filter.member_groups_only {
            query = query.filter(group_id.eq_any(auth_token.group_ids().to_vec()));
        }
        if filter.reserved_only {
            let the_user_id = auth_token.require_user_id(Privilege::ShowEvents)?;
            query = query.filter(
                id.eq_any(
                    schema::reservations::table
                        .filter(schema::reservations::user_id.eq(the_user_id))
                        .select(schema::reservations::event_id),
                ),
            );
        }
        query = if filter.newest_first {
            query.order_by((event_date.desc(), start_time.desc(), id.desc()))
        } else {
            query.order_by((event_date.asc(), start_time.asc(), id.asc()))
        };

        let result = query.load::<models::Event>(&mut self.connection)?;
        load_full_events(result, auth_token.user_id(), &mut self.connection)
    }

    fn create_event(
        &mut self,
        auth_token: &AuthToken,
        event: models::NewEvent,
    ) -> Result<models::FullEvent, StoreError> {
        let group_id = event.group_id;
        self.create_event_series(auth_token, group_id, vec![event])?
            .pop()
            .ok_or(StoreError::InvalidDataInDatabase(
                "Event creation returned no row".to_owned(),
            ))
    }

    fn create_event_series(
        &mut self,
        auth_token: &AuthToken,
        group_id: GroupId,
        mut new_events: Vec<models::NewEvent>,
    ) -> Result<Vec<models::FullEvent>, StoreError> {
        rules::prepare_new_events(auth_token, group_id, &mut new_events)?;
        if new_events.is_empty() {
            return Ok(vec![]);
        }

        self.connection.transaction(|connection| {
            let created = diesel::insert_into(schema::events::table)
                .values(&new_events)
                .returning(models::Event::as_returning())
                .get_results::<models::Event>(connection)?;
            load_full_events(created, auth_token.user_id(), connection)
        })
    }

    fn update_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        patch: models::EventPatch,
    ) -> Result<models::FullEvent, StoreError> {
        use schema::events::dsl::*;
        patch.validate().map_err(StoreError::InvalidInputData)?;

        self.connection.transaction(|connection| {
            let event = events
                .filter(id.eq(event_id))
                .select(models::Event::as_select())
                .for_update()
                .get_result::<models::Event>(connection)?;
            auth_token.check_privilege(AccessContext::of_event(&event), Privilege::EditEvent)?;

            // Reservations lock the event row as well, so the count cannot change until commit
            let reservation_count = count_reservations(event_id, connection)?;
            rules::check_capacity_change(patch.capacity, reservation_count)?;

            let updated = diesel::update(events)
                .filter(id.eq(event_id))
                .set(&patch)
                .returning(models::Event::as_returning())
                .get_result::<models::Event>(connection)?;
            load_full_event(updated, auth_token.user_id(), connection)
        })
    }

    fn delete_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<(), StoreError> {
        use schema::events::dsl::*;

        self.connection.transaction(|connection| {
            let event = events
                .filter(id.eq(event_id))
                .select(models::Event::as_select())
                .for_update()
                .get_result::<models::Event>(connection)?;
            auth_token.check_privilege(AccessContext::of_event(&event), Privilege::EditEvent)?;

            // Reservations are removed by the database via ON DELETE CASCADE
            diesel::delete(events.filter(id.eq(event_id))).execute(connection)?;
            Ok(())
        })
    }

    fn clone_event(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        new_date: NaiveDate,
    ) -> Result<models::FullEvent, StoreError> {
        use schema::events::dsl::*;

        self.connection.transaction(|connection| {
            let source = events
                .filter(id.eq(event_id))
                .select(models::Event::as_select())
                .first::<models::Event>(connection)?;
            auth_token.check_privilege(AccessContext::of_event(&source), Privilege::EditEvent)?;

            let mut copy = models::NewEvent::copy_of(&source, new_date);
            rules::prepare_event(auth_token, &mut copy)?;
            let created = diesel::insert_into(events)
                .values(&copy)
                .returning(models::Event::as_returning())
                .get_result::<models::Event>(connection)?;
            load_full_event(created, auth_token.user_id(), connection)
        })
    }

    fn reserve(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
        today: NaiveDate,
    ) -> Result<models::Reservation, StoreError> {
        use schema::reservations;

        self.connection.transaction(|connection| {
            // Lock the event row to serialize all reservation attempts for this event
            let event = schema::events::table
                .filter(schema::events::id.eq(event_id))
                .select(models::Event::as_select())
                .for_update()
                .get_result::<models::Event>(connection)?;

            let reservation_count = count_reservations(event_id, connection)?;
            let already_reserved = match auth_token.user_id() {
                Some(the_user_id) => diesel::select(exists(
                    reservations::table
                        .filter(reservations::event_id.eq(event_id))
                        .filter(reservations::user_id.eq(the_user_id)),
                ))
                .get_result::<bool>(connection)?,
                None => false,
            };
            let the_user_id = rules::check_reservation(
                auth_token,
                &event,
                today,
                reservation_count,
                already_reserved,
            )?;

            diesel::insert_into(reservations::table)
                .values(&models::NewReservation {
                    event_id,
                    user_id: the_user_id,
                })
                .returning(models::Reservation::as_returning())
                .get_result::<models::Reservation>(connection)
                .map_err(|e| match StoreError::from(e) {
                    StoreError::ConflictEntityExists => StoreError::AlreadyReserved,
                    e => e,
                })
        })
    }

    fn cancel_reservation(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<models::Reservation, StoreError> {
        use schema::reservations;
        let the_user_id = auth_token.require_user_id(Privilege::ReserveSpot)?;

        self.connection.transaction(|connection| {
            schema::events::table
                .filter(schema::events::id.eq(event_id))
                .select(schema::events::id)
                .first::<EventId>(connection)?;

            diesel::delete(
                reservations::table
                    .filter(reservations::event_id.eq(event_id))
                    .filter(reservations::user_id.eq(the_user_id)),
            )
            .returning(models::Reservation::as_returning())
            .get_result::<models::Reservation>(connection)
            .optional()?
            .ok_or(StoreError::ReservationNotExisting)
        })
    }

    fn get_reservations(
        &mut self,
        auth_token: &AuthToken,
        event_id: EventId,
    ) -> Result<Vec<models::Attendee>, StoreError> {
        use schema::reservations;

        let event = schema::events::table
            .filter(schema::events::id.eq(event_id))
            .select(models::Event::as_select())
            .first::<models::Event>(&mut self.connection)?;
        auth_token.check_privilege(AccessContext::of_event(&event), Privilege::ShowEvents)?;

        Ok(reservations::table
            .inner_join(schema::users::table)
            .filter(reservations::event_id.eq(event_id))
            .order_by((reservations::created_at.asc(), reservations::id.asc()))
            .select((
                models::Reservation::as_select(),
                schema::users::name,
                schema::users::email,
            ))
            .load::<(models::Reservation, String, String)>(&mut self.connection)?
            .into_iter()
            .map(|(reservation, user_name, user_email)| models::Attendee {
                reservation,
                user_name,
                user_email,
            })
            .collect())
    }
}

fn count_reservations(event_id: EventId, connection: &mut PgConnection) -> QueryResult<i64> {
    schema::reservations::table
        .filter(schema::reservations::event_id.eq(event_id))
        .count()
        .get_result::<i64>(connection)
}

fn load_full_event(
    event: models::Event,
    user_id: Option<UserId>,
    connection: &mut PgConnection,
) -> Result<models::FullEvent, StoreError> {
    load_full_events(vec![event], user_id, connection)?
        .pop()
        .ok_or(StoreError::NotExisting)
}

/// Add group name, creator name, location, reservation count and the user's reservation state to
/// each of the given events. The number of queries does not depend on the number of events.
fn load_full_events(
    events: Vec<models::Event>,
    user_id: Option<UserId>,
    connection: &mut PgConnection,
) -> Result<Vec<models::FullEvent>, StoreError> {
    use schema::reservations;

    let group_ids: Vec<GroupId> = events.iter().map(|e| e.group_id).collect();
    let group_names: HashMap<GroupId, String> = schema::groups::table
        .filter(schema::groups::id.eq_any(&group_ids))
        .select((schema::groups::id, schema::groups::name))
        .load::<(GroupId, String)>(connection)?
        .into_iter()
        .collect();
    let creator_ids: Vec<UserId> = events.iter().filter_map(|e| e.creator_id).collect();
    let creator_names: HashMap<UserId, String> = schema::users::table
        .filter(schema::users::id.eq_any(&creator_ids))
        .select((schema::users::id, schema::users::name))
        .load::<(UserId, String)>(connection)?
        .into_iter()
        .collect();
    let location_ids: Vec<LocationId> = events.iter().filter_map(|e| e.location_id).collect();
    let locations: HashMap<LocationId, models::Location> = schema::locations::table
        .filter(schema::locations::id.eq_any(&location_ids))
        .select(models::Location::as_select())
        .load::<models::Location>(connection)?
        .into_iter()
        .map(|location| (location.id, location))
        .collect();

    let event_ids: Vec<EventId> = events.iter().map(|e| e.id).collect();
    let counts: HashMap<EventId, i64> = reservations::table
        .filter(reservations::event_id.eq_any(&event_ids))
        .group_by(reservations::event_id)
        .select((reservations::event_id, diesel::dsl::count_star()))
        .load::<(EventId, i64)>(connection)?
        .into_iter()
        .collect();
    let reserved: HashSet<EventId> = match user_id {
        Some(the_user_id) => reservations::table
            .filter(reservations::event_id.eq_any(&event_ids))
            .filter(reservations::user_id.eq(the_user_id))
            .select(reservations::event_id)
            .load::<EventId>(connection)?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    Ok(events
        .into_iter()
        .map(|event| models::FullEvent {
            group_name: group_names.get(&event.group_id).cloned().unwrap_or_default(),
            creator_name: event
                .creator_id
                .and_then(|creator_id| creator_names.get(&creator_id).cloned()),
            location: event
                .location_id
                .and_then(|location_id| locations.get(&location_id).cloned()),
            reservation_count: counts.get(&event.id).copied().unwrap_or(0),
            is_reserved: reserved.contains(&event.id),
            event,
        })
        .collect())
}

/// Get a human-readable description of the consistency expectation that is checked by a specific
/// constraint in our Postgres database schema by the constraint's name.
///
/// These are visible to the user when creating or updating entities inconsistently via the REST
/// API.
///
/// Returns None, when no human-readable description is present of the given constraint name. This
/// may be the case when we don't expect this constraint to be violated by a user interaction.
pub fn description_for_postgres_constraint(constraint_name: &str) -> Option<&'static str> {
    match constraint_name {
        "events_group_id_fkey" => Some("Event's group must reference an existing group."),
        "events_location_id_fkey" => Some("Event's location must be null or reference an existing location."),
        "event_title_not_empty" => Some("Event's title must not be empty."),
        "event_capacity_positive" => Some("Event's capacity must be at least 1."),
        "reservations_user_id_fkey" => Some("Reservation's user must reference an existing user."),
        _ => None,
    }
}

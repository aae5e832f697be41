use crate::data_store::auth_token::{AccessContext, Privilege};
use crate::data_store::models::{EventPatch, NewEvent};
use crate::data_store::{EventFilterBuilder, EventId, GroupId};
use crate::recurrence;
use crate::web::api::{today, APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupEventsQuery {
    #[serde(default)]
    include_past: bool,
}

#[get("/groups/{group_id}/events")]
async fn list_group_events(
    path: web::Path<GroupId>,
    query: web::Query<GroupEventsQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let group_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let mut filter = EventFilterBuilder::new();
    filter.in_group(group_id);
    if query.include_past {
        filter.newest_first();
    } else {
        filter.from_date(today());
    }
    let filter = filter.build();
    let events: Vec<groupplan_api_types::Event> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_events(&auth, filter)?)
    })
    .await??
    .into_iter()
    .map(|e| e.into())
    .collect();

    Ok(web::Json(events))
}

#[get("/events/user/upcoming")]
async fn list_upcoming_events(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let filter = EventFilterBuilder::new()
        .in_member_groups()
        .from_date(today())
        .build();
    let events: Vec<groupplan_api_types::Event> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_events(&auth, filter)?)
    })
    .await??
    .into_iter()
    .map(|e| e.into())
    .collect();

    Ok(web::Json(events))
}

#[get("/events/user/reserved")]
async fn list_reserved_events(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let filter = EventFilterBuilder::new()
        .reserved_by_user()
        .from_date(today())
        .build();
    let events: Vec<groupplan_api_types::Event> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_events(&auth, filter)?)
    })
    .await??
    .into_iter()
    .map(|e| e.into())
    .collect();

    Ok(web::Json(events))
}

#[get("/events")]
async fn list_all_events(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let events: Vec<groupplan_api_types::Event> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_events(&auth, EventFilterBuilder::new().newest_first().build())?)
    })
    .await??
    .into_iter()
    .map(|e| e.into())
    .collect();

    Ok(web::Json(events))
}

#[get("/events/{event_id}")]
async fn get_event(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let event: groupplan_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_event(&auth, event_id)?)
    })
    .await??
    .into();

    Ok(web::Json(event))
}

#[post("/groups/{group_id}/events")]
async fn create_event(
    path: web::Path<GroupId>,
    data: web::Json<groupplan_api_types::EventData>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let group_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let event = NewEvent::from_api(data.into_inner(), group_id);
    let created: groupplan_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.create_event(&auth, event)?)
    })
    .await??
    .into();

    Ok(HttpResponse::Created().json(created))
}

#[post("/groups/{group_id}/events/recurring")]
async fn create_recurring_events(
    path: web::Path<GroupId>,
    data: web::Json<groupplan_api_types::RecurringEventsRequest>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let group_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let request = data.into_inner();
    let created: Vec<groupplan_api_types::Event> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        // Report missing permissions before complaining about the series definition
        auth.check_privilege(AccessContext::Group(group_id), Privilege::CreateEvents)?;
        let events = recurrence::build_series(request, group_id)?;
        Ok(store.create_event_series(&auth, group_id, events)?)
    })
    .await??
    .into_iter()
    .map(|e| e.into())
    .collect();

    Ok(
        HttpResponse::Created().json(groupplan_api_types::RecurringEventsResponse {
            count: created.len(),
            events: created,
        }),
    )
}

#[put("/events/{event_id}")]
async fn update_event(
    path: web::Path<EventId>,
    data: web::Json<groupplan_api_types::EventData>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let patch = EventPatch::from(data.into_inner());
    let updated: groupplan_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.update_event(&auth, event_id, patch)?)
    })
    .await??
    .into();

    Ok(web::Json(updated))
}

#[delete("/events/{event_id}")]
async fn delete_event(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        store.delete_event(&auth, event_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}

#[post("/events/{event_id}/clone")]
async fn clone_event(
    path: web::Path<EventId>,
    data: web::Json<groupplan_api_types::CloneEventRequest>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let new_date = data.into_inner().new_date;
    let created: groupplan_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.clone_event(&auth, event_id, new_date)?)
    })
    .await??
    .into();

    Ok(HttpResponse::Created().json(created))
}

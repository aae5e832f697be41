use crate::data_store::EventId;
use crate::web::api::{today, APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{delete, get, post, web, HttpResponse, Responder};

#[post("/events/{event_id}/reserve")]
async fn reserve(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let today = today();
    let reservation: groupplan_api_types::Reservation =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            let auth = store.get_auth_token_for_session(&session_token)?;
            Ok(store.reserve(&auth, event_id, today)?)
        })
        .await??
        .into();

    Ok(HttpResponse::Created().json(reservation))
}

#[delete("/events/{event_id}/reserve")]
async fn cancel_reservation(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let reservation: groupplan_api_types::Reservation =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            let auth = store.get_auth_token_for_session(&session_token)?;
            Ok(store.cancel_reservation(&auth, event_id)?)
        })
        .await??
        .into();

    Ok(web::Json(reservation))
}

#[get("/events/{event_id}/reservations")]
async fn list_reservations(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret, state.session_max_age)?;
    let attendees: Vec<groupplan_api_types::Attendee> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            let auth = store.get_auth_token_for_session(&session_token)?;
            Ok(store.get_reservations(&auth, event_id)?)
        })
        .await??
        .into_iter()
        .map(|a| a.into())
        .collect();

    Ok(web::Json(attendees))
}


use super::*;
use crate::data_store::store_mock::StoreMock;
use crate::web::AppState;
use actix_web::{http, test, web, App};
use sample_data::*;
use serde_json::Value;
use std::sync::Arc;

const APP_SECRET: &str = "0123456789abcdef";

fn app_state(store: Arc<StoreMock>) -> AppState {
    AppState {
        store,
        secret: APP_SECRET.to_string(),
        session_max_age: std::time::Duration::from_secs(86400),
    }
}

fn session_header(user_id: i32) -> (&'static str, String) {
    (
        "X-SESSION-TOKEN",
        SessionToken::new(user_id).as_string(APP_SECRET),
    )
}

#[actix_web::test]
async fn test_reserve_and_cancel() {
    let store = Arc::new(StoreMock::default());
    let events = fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;
    let reserve_uri = format!("/api/v1/events/{}/reserve", events.rehearsal);

    let req = test::TestRequest::post()
        .uri(&reserve_uri)
        .append_header(session_header(MEMBER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let reservation: groupplan_api_types::Reservation = test::read_body_json(res).await;
    assert_eq!(reservation.event_id, events.rehearsal);
    assert_eq!(reservation.user_id, MEMBER);

    let req = test::TestRequest::post()
        .uri(&reserve_uri)
        .append_header(session_header(MEMBER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["message"],
        "You already have a reservation for this event."
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}/reservations", events.rehearsal))
        .append_header(session_header(ORGANIZER))
        .to_request();
    let attendees: Vec<groupplan_api_types::Attendee> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0].user_name, "Cleo");
    assert_eq!(attendees[0].user_email, "cleo@example.com");

    let req = test::TestRequest::delete()
        .uri(&reserve_uri)
        .append_header(session_header(MEMBER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let cancelled: groupplan_api_types::Reservation = test::read_body_json(res).await;
    assert_eq!(cancelled.id, reservation.id);

    let req = test::TestRequest::delete()
        .uri(&reserve_uri)
        .append_header(session_header(MEMBER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
    assert!(store.data.lock().unwrap().reservations.is_empty());

    let req = test::TestRequest::post()
        .uri(&reserve_uri)
        .append_header(session_header(MEMBER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let second: groupplan_api_types::Reservation = test::read_body_json(res).await;
    assert_ne!(second.id, reservation.id);
    assert_eq!(second.user_id, MEMBER);
}

#[actix_web::test]
async fn test_reserve_full_event() {
    let store = Arc::new(StoreMock::default());
    let events = fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;
    let reserve_uri = format!("/api/v1/events/{}/reserve", events.rehearsal);

    for user_id in [ORGANIZER, MEMBER] {
        let req = test::TestRequest::post()
            .uri(&reserve_uri)
            .append_header(session_header(user_id))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::CREATED);
    }

    let req = test::TestRequest::post()
        .uri(&reserve_uri)
        .append_header(session_header(ADMIN))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["httpCode"], 400);
    assert_eq!(
        body["message"],
        "This event is full. All 2 spots are taken."
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}", events.rehearsal))
        .append_header(session_header(MEMBER))
        .to_request();
    let event: groupplan_api_types::Event = test::call_and_read_body_json(&app, req).await;
    assert_eq!(event.reservation_count, 2);
    assert!(event.is_reserved);
    assert_eq!(event.group_name, "Chamber choir");
    assert_eq!(event.creator_name.as_deref(), Some("Ben"));
    assert_eq!(event.location_id, Some(CHURCH_HALL));
    assert_eq!(event.location_name.as_deref(), Some("Church hall"));
    assert_eq!(event.location_address.as_deref(), Some("Market square 3"));
}

#[actix_web::test]
async fn test_reserve_rejections() {
    let store = Arc::new(StoreMock::default());
    let events = fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;

    let cases = [
        (events.rehearsal, Some(OTHER_GROUP_MEMBER), http::StatusCode::FORBIDDEN),
        (events.rehearsal, Some(PENDING_USER), http::StatusCode::FORBIDDEN),
        (events.rehearsal, Some(99), http::StatusCode::FORBIDDEN),
        (events.rehearsal, None, http::StatusCode::FORBIDDEN),
        (events.past_concert, Some(MEMBER), http::StatusCode::BAD_REQUEST),
        (4711, Some(MEMBER), http::StatusCode::NOT_FOUND),
    ];
    for (event_id, user_id, expected_status) in cases {
        let mut req = test::TestRequest::post().uri(&format!("/api/v1/events/{}/reserve", event_id));
        if let Some(user_id) = user_id {
            req = req.append_header(session_header(user_id));
        }
        let res = test::call_service(&app, req.to_request()).await;
        assert_eq!(
            res.status(),
            expected_status,
            "event {} user {:?}",
            event_id,
            user_id
        );
    }
    assert!(store.data.lock().unwrap().reservations.is_empty());
}

#[actix_web::test]
async fn test_invalid_session_token() {
    let store = Arc::new(StoreMock::default());
    let events = fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;

    let forged = SessionToken::new(ADMIN).as_string("some other secret value");
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}", events.rehearsal))
        .append_header(("X-SESSION-TOKEN", forged))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_create_recurring_events() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/groups/{}/events/recurring", CHOIR_GROUP))
        .append_header(session_header(MEMBER))
        .set_json(serde_json::json!({
            "title": "Sectional rehearsal",
            "startDate": "2024-01-01",
            "endDate": "2024-01-14",
            "startTime": "18:00:00",
            "endTime": "19:30:00",
            "maxSpots": 12,
            "frequency": "weekly",
            "daysOfWeek": [1, 3]
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let result: groupplan_api_types::RecurringEventsResponse = test::read_body_json(res).await;
    assert_eq!(result.count, 4);
    let dates: Vec<String> = result
        .events
        .iter()
        .map(|e| e.event_date.to_string())
        .collect();
    assert_eq!(
        dates,
        vec!["2024-01-01", "2024-01-03", "2024-01-08", "2024-01-10"]
    );
    assert!(result
        .events
        .iter()
        .all(|e| e.capacity == 12 && e.reservation_count == 0 && e.creator_id == Some(MEMBER)));
}

#[actix_web::test]
async fn test_create_recurring_events_invalid() {
    let store = Arc::new(StoreMock::default());
    fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;
    let event_count = store.data.lock().unwrap().events.len();

    let request = |days_of_week: Value, capacity: i32| {
        test::TestRequest::post()
            .uri(&format!("/api/v1/groups/{}/events/recurring", CHOIR_GROUP))
            .append_header(session_header(MEMBER))
            .set_json(serde_json::json!({
                "title": "Sectional rehearsal",
                "startDate": "2024-01-01",
                "endDate": "2024-01-14",
                "startTime": "18:00:00",
                "endTime": "19:30:00",
                "capacity": capacity,
                "frequency": "daily",
                "daysOfWeek": days_of_week
            }))
            .to_request()
    };

    let res = test::call_service(&app, request(serde_json::json!([]), 10)).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
    let res = test::call_service(&app, request(serde_json::json!([1]), 0)).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
    assert_eq!(store.data.lock().unwrap().events.len(), event_count);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/groups/{}/events/recurring", CHOIR_GROUP))
        .append_header(session_header(OTHER_GROUP_MEMBER))
        .set_json(serde_json::json!({
            "title": "Sectional rehearsal",
            "startDate": "2024-01-01",
            "endDate": "2024-01-14",
            "startTime": "18:00:00",
            "endTime": "19:30:00",
            "capacity": 10,
            "frequency": "daily",
            "daysOfWeek": [9]
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let res = test::call_service(&app, request(Value::Null, 10)).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let result: groupplan_api_types::RecurringEventsResponse = test::read_body_json(res).await;
    assert_eq!(result.count, 14);
}

#[actix_web::test]
async fn test_clone_event() {
    let store = Arc::new(StoreMock::default());
    let events = fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/events/{}/reserve", events.rehearsal))
        .append_header(session_header(MEMBER))
        .to_request();
    test::call_service(&app, req).await;

    let clone_uri = format!("/api/v1/events/{}/clone", events.rehearsal);
    let req = test::TestRequest::post()
        .uri(&clone_uri)
        .append_header(session_header(MEMBER))
        .set_json(serde_json::json!({"newDate": "2099-05-13"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&clone_uri)
        .append_header(session_header(ADMIN))
        .set_json(serde_json::json!({"newDate": "2099-05-13"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let copy: groupplan_api_types::Event = test::read_body_json(res).await;
    assert_ne!(copy.id, events.rehearsal);
    assert_eq!(copy.event_date.to_string(), "2099-05-13");
    assert_eq!(copy.title, "Choir rehearsal");
    assert_eq!(copy.location_id, Some(7));
    assert_eq!(copy.capacity, 2);
    assert_eq!(copy.creator_id, Some(ADMIN));
    assert_eq!(copy.reservation_count, 0);

    let req = test::TestRequest::post()
        .uri("/api/v1/events/4711/clone")
        .append_header(session_header(ADMIN))
        .set_json(serde_json::json!({"newDate": "2099-05-13"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_update_event_capacity_guard() {
    let store = Arc::new(StoreMock::default());
    let events = fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;
    for user_id in [ORGANIZER, MEMBER] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/events/{}/reserve", events.rehearsal))
            .append_header(session_header(user_id))
            .to_request();
        test::call_service(&app, req).await;
    }

    let update = |capacity: i32| {
        test::TestRequest::put()
            .uri(&format!("/api/v1/events/{}", events.rehearsal))
            .append_header(session_header(ORGANIZER))
            .set_json(serde_json::json!({
                "title": "Choir rehearsal",
                "eventDate": "2099-05-06",
                "startTime": "19:30:00",
                "endTime": "21:30:00",
                "locationId": 7,
                "capacity": capacity
            }))
            .to_request()
    };

    let res = test::call_service(&app, update(1)).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["message"],
        "Cannot reduce capacity below current reservation count (2)."
    );

    let res = test::call_service(&app, update(5)).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let event: groupplan_api_types::Event = test::read_body_json(res).await;
    assert_eq!(event.capacity, 5);
    assert_eq!(event.start_time.to_string(), "19:30:00");
}

#[actix_web::test]
async fn test_list_events() {
    let store = Arc::new(StoreMock::default());
    let events = fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/groups/{}/events", CHOIR_GROUP))
        .append_header(session_header(MEMBER))
        .to_request();
    let upcoming: Vec<groupplan_api_types::Event> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, events.rehearsal);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/groups/{}/events?includePast=true", CHOIR_GROUP))
        .append_header(session_header(MEMBER))
        .to_request();
    let all: Vec<groupplan_api_types::Event> = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i32> = all.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![events.rehearsal, events.past_concert]);

    let req = test::TestRequest::get()
        .uri("/api/v1/events/user/upcoming")
        .append_header(session_header(OTHER_GROUP_MEMBER))
        .to_request();
    let upcoming: Vec<groupplan_api_types::Event> = test::call_and_read_body_json(&app, req).await;
    assert!(upcoming.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/v1/events")
        .append_header(session_header(MEMBER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/events")
        .append_header(session_header(ADMIN))
        .to_request();
    let all: Vec<groupplan_api_types::Event> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.len(), 2);
}

#[actix_web::test]
async fn test_storage_failure_is_reported_generically() {
    let store = Arc::new(StoreMock::default());
    let events = fill_sample_data(&store);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(app_state(store.clone()))),
    )
    .await;
    store.data.lock().unwrap().next_error = Some(StoreError::ConnectionError(
        "connection refused by db.internal:5432".to_owned(),
    ));

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/events/{}/reserve", events.rehearsal))
        .append_header(session_header(MEMBER))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(res).await;
    assert!(!body["message"]
        .as_str()
        .unwrap()
        .contains("db.internal"));
}

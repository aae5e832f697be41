use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::AuthToken;
use crate::data_store::get_store_from_env;
use crate::data_store::{EventFilterBuilder, GroupId, GroupPlanStore};

/// Print all events, optionally restricted to a single group, with their reservation state as a
/// table to stdout.
pub fn print_event_list(group_id: Option<GroupId>) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let auth_token = AuthToken::create_for_cli(&CliAuthTokenKey::new());

    let mut filter = EventFilterBuilder::new();
    if let Some(group_id) = group_id {
        filter.in_group(group_id);
    }
    let events = data_store.get_events(&auth_token, filter.build())?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "group", "date", "time", "reserved", "free", "title"])
        .add_rows(events.into_iter().map(|event| {
            [
                event.event.id.to_string(),
                event.event.group_id.to_string(),
                event.event.event_date.to_string(),
                format!(
                    "{}-{}",
                    event.event.start_time.format("%H:%M"),
                    event.event.end_time.format("%H:%M")
                ),
                format!("{}/{}", event.reservation_count, event.event.capacity),
                event.available_spots().to_string(),
                event.event.title,
            ]
        }));

    println!("{table}");
    Ok(())
}

use chrono::{DateTime, Utc};
use parkwatch_client::{exclude_historical, OccupancyClient};
use parkwatch_store::FacilityStore;

use crate::context::Runtime;

/// List facilities the occupancy API currently reports.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the request fails.
pub(crate) async fn run_facilities(runtime: &Runtime) -> anyhow::Result<()> {
    let client = runtime.client()?;
    let facilities = exclude_historical(client.fetch_all().await?);

    if facilities.is_empty() {
        println!("the occupancy API returned no facilities");
        return Ok(());
    }

    println!("{:<8}NAME", "ID");
    for (id, name) in &facilities {
        println!("{id:<8}{name}");
    }
    println!("{} facilities", facilities.len());

    Ok(())
}

/// Show stored facilities with their cached availability.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub(crate) async fn run_status(runtime: &Runtime) -> anyhow::Result<()> {
    let now = Utc::now();
    let records = runtime.store.fetch_all().await?;

    if records.is_empty() {
        println!("store is empty; run `parkwatch run` or `parkwatch reset` first");
        return Ok(());
    }

    let here = runtime.location.current_coordinate();
    println!(
        "{:<6}{:<28}{:<10}{:<14}{:<10}{:<10}{:<9}REFRESHED",
        "ID", "NAME", "CADENCE", "STATUS", "FREE", "KM", "FAILS"
    );
    for record in &records {
        let marker = if record.is_favourite() { "*" } else { "" };
        let name = format!("{marker}{}", record.info.display_name());
        let free = record.available_spots(now).map_or_else(
            || "\u{2014}".to_string(),
            |spots| format!("{spots}/{}", record.info.total_spaces),
        );
        println!(
            "{:<6}{:<28}{:<10}{:<14}{:<10}{:<10.1}{:<9}{}",
            record.facility_id(),
            truncate(&name, 26),
            record.cadence(),
            record.availability_status(now),
            free,
            record.distance_km(&here),
            record.consecutive_failures(),
            fmt_age(record.last_refreshed_at(), now),
        );
    }

    println!();
    println!("{}", runtime.store.stats(now).await?);
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max - 3).collect::<String>())
    } else {
        text.to_string()
    }
}

/// `"never"` or a rough age such as `"42s ago"` / `"7m ago"`.
fn fmt_age(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return "never".to_string();
    };
    let secs = (now - at).num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3_599 => format!("{}m ago", secs / 60),
        _ => format!("{}h ago", secs / 3_600),
    }
}

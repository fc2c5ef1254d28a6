//! Store-mutating commands: reset, single refresh, favourites.

use chrono::Utc;
use parkwatch_scheduler::{reload_static_facilities, RefreshOutcome, SeedOutcome};
use parkwatch_store::FacilityStore;

use crate::context::Runtime;

/// Drop every stored record and reseed from the catalogue.
///
/// # Errors
///
/// Returns an error if clearing, inserting, or committing fails.
pub(crate) async fn run_reset(runtime: &Runtime) -> anyhow::Result<()> {
    let outcome = reload_static_facilities(
        runtime.store.as_ref(),
        &runtime.catalogue,
        runtime.location.as_ref(),
    )
    .await?;

    match outcome {
        SeedOutcome::Seeded { inserted } => {
            println!("reset complete; {inserted} facilities loaded from catalogue");
        }
        SeedOutcome::AlreadySeeded { existing } => {
            anyhow::bail!("store still holds {existing} facilities after clearing");
        }
    }
    Ok(())
}

/// Fetch one facility now, mark it visited, and print its availability.
///
/// With `if_stale`, a reading that is still fresh is left alone.
///
/// # Errors
///
/// Returns an error if the facility is unknown or the fetch failed.
pub(crate) async fn run_refresh(
    runtime: &Runtime,
    facility_id: &str,
    if_stale: bool,
) -> anyhow::Result<()> {
    runtime.seed_if_needed().await?;
    let scheduler = runtime.scheduler()?;

    let outcome = if if_stale {
        scheduler.refresh_facility_if_needed(facility_id).await
    } else {
        scheduler.refresh_single_facility(facility_id).await
    };

    match outcome {
        RefreshOutcome::NotFound => anyhow::bail!("facility '{facility_id}' not found"),
        RefreshOutcome::Completed { failed, .. } if failed > 0 => {
            anyhow::bail!("refresh of facility '{facility_id}' failed; see log for details")
        }
        RefreshOutcome::UpToDate => println!("facility {facility_id} is already up to date"),
        _ => {}
    }

    let now = Utc::now();
    let record = runtime
        .store
        .modify(facility_id, &|r| r.mark_visited(now))
        .await?;
    runtime.store.commit().await?;

    let free = record
        .available_spots(now)
        .map_or_else(|| "unknown".to_string(), |n| n.to_string());
    println!(
        "{}: {} ({free} of {} free)",
        record.info.display_name(),
        record.availability_status(now),
        record.info.total_spaces
    );
    Ok(())
}

/// Set or clear the favourite flag on a stored facility.
///
/// # Errors
///
/// Returns an error if the facility is unknown or the store cannot be written.
pub(crate) async fn run_favourite(
    runtime: &Runtime,
    facility_id: &str,
    favourite: bool,
) -> anyhow::Result<()> {
    runtime.seed_if_needed().await?;

    let current = runtime
        .store
        .get(facility_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("facility '{facility_id}' not found"))?;
    if current.is_favourite() == favourite {
        println!("no change; {} is already set", current.info.display_name());
        return Ok(());
    }

    let record = runtime
        .store
        .modify(facility_id, &|r| r.set_favourite(favourite))
        .await?;
    runtime.store.commit().await?;

    let name = record.info.display_name();
    if favourite {
        println!("added {name} to favourites");
    } else {
        println!("removed {name} from favourites");
    }
    Ok(())
}

//! Pending job descriptor storage for the platform stand-in.

mod read;
mod write;

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::types::{JobDescriptor, JobExtras, NetworkType};

const SELECT_COLUMNS: &str =
    "job_id, network, requires_charging, extras_json, not_before, scheduled_at, generation";

fn descriptor_from_row(row: &SqliteRow) -> Result<JobDescriptor> {
    let network: String = row.get("network");
    let requires_charging: i64 = row.get("requires_charging");
    let extras_json: String = row.get("extras_json");
    let extras = if extras_json.is_empty() {
        JobExtras::default()
    } else {
        serde_json::from_str::<JobExtras>(&extras_json)?
    };
    Ok(JobDescriptor {
        job_id: row.get("job_id"),
        network: NetworkType::parse_stored(&network),
        requires_charging: requires_charging != 0,
        extras,
        not_before: row.get("not_before"),
        generation: row.get("generation"),
        scheduled_at: row.get("scheduled_at"),
    })
}

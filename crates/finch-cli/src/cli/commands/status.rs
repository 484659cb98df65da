//! `finch status` – stamp age, pending job and last job metrics.

use anyhow::Result;
use finch_core::clock::elapsed_millis;
use finch_core::fetcher::SEED_FETCH_JOB_ID;
use finch_core::platform::JobScheduler;

use super::Context;

fn format_age(ms: i64) -> String {
    let secs = ms / 1000;
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m{}s", s / 60, s % 60),
        s => format!("{}h{}m", s / 3600, (s % 3600) / 60),
    }
}

pub async fn run_status(ctx: &Context) -> Result<()> {
    let now = ctx.clock.now_millis();
    match ctx.stamp.modified_millis()? {
        Some(t) => println!("stamp:   {} ago", format_age(elapsed_millis(t, now))),
        None => println!("stamp:   never fetched"),
    }

    match ctx.scheduler.get_pending(SEED_FETCH_JOB_ID).await? {
        Some(d) => {
            let when = match d.not_before {
                Some(t) if t > now => format!("in {}", format_age(t - now)),
                _ => "when charging".to_string(),
            };
            println!(
                "pending: job {} attempt {} ({}), network {}, queued {} ago",
                d.job_id,
                d.extras.request_count,
                when,
                d.network.as_str(),
                format_age(elapsed_millis(d.scheduled_at, now))
            );
        }
        None => println!("pending: none"),
    }

    let metrics = ctx.db.read_metrics().await?;
    if metrics.is_empty() {
        println!("metrics: none");
    } else {
        println!("metrics:");
        for (key, value) in metrics.entries() {
            if let Some(v) = value {
                println!("  {:<32} {}", key, v);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::format_age;

    #[test]
    fn ages_are_compact() {
        assert_eq!(format_age(5_000), "5s");
        assert_eq!(format_age(125_000), "2m5s");
        assert_eq!(format_age(3 * 3_600_000 + 120_000), "3h2m");
    }
}

//! Budget server - video jobs from a mix of free and premium users
//!
//! Each user submits a few transcode jobs of varying length. Free users
//! share a cumulative budget; premium users are never limited. Jobs for
//! one user run concurrently and draw on the same counter.
//!
//! Usage: budget-server [resolution-ms]
//!
//! The limit and policy come from `WARDEN_BUDGET_LIMIT` and
//! `WARDEN_BUDGET_POLICY`. The resolution defaults to 100ms here so a
//! run finishes in a few seconds.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};
use warden::{BudgetConfig, BudgetGuard, CancellationToken, Principal, Verdict};

const FRAME_TIME: Duration = Duration::from_millis(10);

/// Simulated transcode: `frames` frames, stopping at the first cancelled poll
fn transcode(job: &'static str, frames: u32, token: &CancellationToken) {
    for frame in 0..frames {
        if token.is_cancelled() {
            info!(job, frame, frames, "transcode aborted");
            return;
        }
        thread::sleep(FRAME_TIME);
    }
}

struct Job {
    name: &'static str,
    frames: u32,
}

const JOBS: &[Job] = &[
    Job { name: "intro.mp4", frames: 20 },
    Job { name: "lecture.mp4", frames: 150 },
    Job { name: "clip.mp4", frames: 40 },
];

fn main() {
    warden::init_logging();

    let resolution_ms: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);

    let config = BudgetConfig::from_env().resolution(Duration::from_millis(resolution_ms));
    let guard = match BudgetGuard::new(config) {
        Ok(guard) => Arc::new(guard),
        Err(e) => {
            error!(error = %e, "bad budget configuration");
            std::process::exit(1);
        }
    };

    let users = vec![
        Arc::new(Principal::standard(1)),
        Arc::new(Principal::premium(2)),
        Arc::new(Principal::standard(3)),
        Arc::new(Principal::with_time_used(4, false, guard.config().limit)),
    ];

    println!("=== Warden Budget Server ===\n");
    println!("Limit:      {} units ({})", guard.config().limit, guard.config().policy);
    println!("Resolution: {:?}\n", guard.config().resolution);

    let start = Instant::now();
    let mut handles = Vec::new();
    for user in &users {
        for job in JOBS {
            let guard = Arc::clone(&guard);
            let user = Arc::clone(user);
            let name = job.name;
            let frames = job.frames;
            handles.push(thread::spawn(move || {
                let verdict = guard.run_bounded_default(
                    move |token| transcode(name, frames, token),
                    &user,
                );
                (user.id(), name, verdict)
            }));
        }
    }

    for h in handles {
        match h.join() {
            Ok((id, name, verdict)) => {
                let marker = match verdict {
                    Verdict::Completed => "ok",
                    Verdict::TimedOut => "CUT",
                    Verdict::Rejected => "--",
                };
                println!("[{:>3}] user {} {:<12} {}", marker, id, name, verdict);
            }
            Err(_) => error!("job thread panicked"),
        }
    }

    guard.shutdown();

    println!("\n=== Usage ===");
    for user in &users {
        let tier = if user.is_premium() { "premium" } else { "free" };
        println!("user {} ({:<7}) used {} units", user.id(), tier, user.time_used());
    }

    let stats = guard.stats();
    println!("\n=== Results ===");
    println!("Completed:        {}", stats.completed);
    println!("Timed out:        {}", stats.timed_out);
    println!("Rejected:         {}", stats.rejected);
    println!("Premium bypasses: {}", stats.premium_bypasses);
    println!("Units charged:    {}", stats.units_charged);
    println!("Elapsed:          {:?}", start.elapsed());
}

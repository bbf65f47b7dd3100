//! # Example: Random Game
//!
//! Three computer players press random slots until the deck runs dry or Ctrl-C.
//! A small custom subscriber keeps a tally next to the built-in [`LogWriter`].
//!
//! ```bash
//! cargo run --example random_game --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use setvisor::{Config, Event, EventKind, LogWriter, Session, Subscribe};

/// Counts verdicts as they happen.
#[derive(Default)]
struct Tally {
    points: AtomicU32,
    penalties: AtomicU32,
}

#[async_trait]
impl Subscribe for Tally {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::SelectionAccepted => {
                self.points.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::SelectionPenalized => {
                self.penalties.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "tally"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config {
        computer_players: 3,
        turn_timeout_ms: 5_000,
        turn_timeout_warning: Duration::from_secs(2),
        point_freeze: Duration::from_millis(200),
        penalty_freeze: Duration::from_millis(600),
        table_delay: Duration::from_millis(5),
        hints: true,
        ..Config::default()
    };

    let tally = Arc::new(Tally::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), tally.clone()];
    let session = Session::builder(cfg).with_subscribers(subs).build()?;

    let outcome = session.run_until_signal().await?;

    println!(
        "winners={:?} top={} scores={:?} (points={}, penalties={})",
        outcome.winners,
        outcome.top_score(),
        outcome.scores,
        tally.points.load(Ordering::Relaxed),
        tally.penalties.load(Ordering::Relaxed),
    );
    Ok(())
}

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use brewpos_core::Clock;
use brewpos_inventory::{ReservationManager, ReservationStore, StockStore};
use brewpos_menu::RecipeStore;

/// Config for the background expiry sweep.
#[derive(Debug, Clone)]
pub struct ExpirySweeper {
    pub interval: Duration,
}

impl Default for ExpirySweeper {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Handle for the running sweeper (shutdown + trigger hook).
#[derive(Debug)]
pub struct ExpirySweeperHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ExpirySweeperHandle {
    /// Ask for a sweep ahead of the next tick.
    ///
    /// Backpressure: triggers are coalesced (bounded queue). If a sweep is
    /// already pending, this becomes a no-op.
    pub fn trigger(&self) {
        // Coalesce: channel capacity=1; ignore if already full.
        let _ = self.trigger.try_send(());
    }

    /// Gracefully stop the sweeper thread.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl ExpirySweeper {
    /// Spawn the sweep thread.
    ///
    /// - Schedule: runs every `interval`, first pass at startup
    /// - Event-trigger: call `handle.trigger()` to sweep sooner
    /// - Failures: logged; the next pass retries from scratch
    ///
    /// Each pass runs `expire_due`, which takes the same per-order and
    /// per-item locks as the foreground lifecycle operations.
    pub fn spawn<S, V, R>(
        &self,
        name: &'static str,
        manager: Arc<ReservationManager<S, V, R>>,
        clock: Arc<dyn Clock>,
    ) -> ExpirySweeperHandle
    where
        S: StockStore + 'static,
        V: ReservationStore + 'static,
        R: RecipeStore + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let interval = self.interval;
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || sweeper_loop(name, interval, shutdown_rx, trigger_rx, manager, clock))
            .expect("failed to spawn expiry sweeper thread");

        ExpirySweeperHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        }
    }
}

fn sweeper_loop<S, V, R>(
    name: &'static str,
    interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    manager: Arc<ReservationManager<S, V, R>>,
    clock: Arc<dyn Clock>,
) where
    S: StockStore + 'static,
    V: ReservationStore + 'static,
    R: RecipeStore + 'static,
{
    info!(sweeper = name, "expiry sweeper started");

    let mut next_tick = Instant::now() + interval;
    let mut pending = true; // sweep once on startup

    loop {
        // Shutdown has priority. A dropped handle counts as shutdown.
        match shutdown_rx.try_recv() {
            Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
            Err(mpsc::TryRecvError::Empty) => {}
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            // Keep a stable cadence even if we were delayed.
            while next_tick <= now {
                next_tick += interval;
            }
        }

        // Event-trigger: non-blocking drain to coalesce multiple triggers.
        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        if !pending {
            // Wait until next tick or trigger or shutdown.
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(250));
            thread::sleep(sleep_for);
            continue;
        }

        pending = false;

        match manager.expire_due(clock.now()) {
            Ok(0) => {}
            Ok(expired) => {
                info!(sweeper = name, expired, "expired stale reservations");
            }
            Err(err) => {
                warn!(sweeper = name, error = %err, "sweep pass failed");
            }
        }
    }

    info!(sweeper = name, "expiry sweeper stopped");
}

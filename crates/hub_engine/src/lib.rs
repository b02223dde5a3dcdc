//! Simulation driver for the station store.
//!
//! Runs the background loops that stand in for the passage of time at the
//! station: charging progress ticks, random truck arrivals and the pump that
//! applies deferred actions (auto-start of charging, auto-assignment).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use hub_core::{SimulationConfig, StationStore};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Store shared between the driver and its consumers. Each tick holds the
/// lock for one synchronous operation only.
pub type SharedStore = Arc<Mutex<StationStore>>;

pub fn shared(store: StationStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Stop signal shared by every loop of one driver.
#[derive(Clone)]
struct Shutdown {
    sender: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Shutdown {
            sender,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            let _ = self.sender.send(());
        }
    }

    fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        if self.is_triggered() {
            return;
        }
        let _ = receiver.recv().await;
    }
}

pub struct SimulationDriver {
    store: SharedStore,
    config: SimulationConfig,
}

impl SimulationDriver {
    pub fn new(store: SharedStore, config: SimulationConfig) -> Self {
        SimulationDriver { store, config }
    }

    /// Spawn the progress, arrival and scheduler loops on the current runtime.
    pub fn start(self) -> DriverHandle {
        let shutdown = Shutdown::new();
        let rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        tracing::info!(
            "Starting simulation driver (progress every {}ms, arrivals every {}-{}s)",
            self.config.progress_interval_ms,
            self.config.arrival_min_secs,
            self.config.arrival_max_secs
        );

        let tasks = vec![
            tokio::spawn(progress_loop(
                self.store.clone(),
                Duration::from_millis(self.config.progress_interval_ms),
                shutdown.clone(),
            )),
            tokio::spawn(arrival_loop(
                self.store.clone(),
                self.config.clone(),
                rng,
                shutdown.clone(),
            )),
            tokio::spawn(scheduler_loop(
                self.store,
                Duration::from_millis(self.config.scheduler_poll_ms),
                shutdown.clone(),
            )),
        ];

        DriverHandle { shutdown, tasks }
    }
}

/// Owns the running loops. Stopping (or dropping) the handle ends all of
/// them together; no loop touches the store afterwards.
pub struct DriverHandle {
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
}

impl DriverHandle {
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_triggered() && self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Signal every loop and wait for them to exit.
    pub async fn stop(mut self) {
        self.shutdown.trigger();
        for task in self.tasks.drain(..) {
            if let Err(error) = task.await {
                tracing::warn!("Simulation task ended abnormally: {}", error);
            }
        }
        tracing::info!("Simulation driver stopped");
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn interval(period: Duration) -> tokio::time::Interval {
    let start = tokio::time::Instant::now() + period;
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval
}

async fn progress_loop(store: SharedStore, period: Duration, shutdown: Shutdown) {
    let mut ticks = interval(period);
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                if shutdown.is_triggered() {
                    break;
                }
                let finished = store.lock().advance_simulation();
                if !finished.is_empty() {
                    tracing::debug!("Slots {:?} finished charging", finished);
                }
            }
            _ = shutdown.wait() => break,
        }
    }
}

async fn arrival_loop(
    store: SharedStore,
    config: SimulationConfig,
    mut rng: ChaCha8Rng,
    shutdown: Shutdown,
) {
    loop {
        let wait = next_arrival_delay(&config, &mut rng);
        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                if shutdown.is_triggered() {
                    break;
                }
                if rng.gen_bool(config.arrival_probability) {
                    let truck = store.lock().simulate_arrival();
                    tracing::info!("Simulated arrival of truck {}", truck.plate);
                } else {
                    tracing::debug!("No arrival this cycle");
                }
            }
            _ = shutdown.wait() => break,
        }
    }
}

async fn scheduler_loop(store: SharedStore, period: Duration, shutdown: Shutdown) {
    let mut ticks = interval(period);
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                if shutdown.is_triggered() {
                    break;
                }
                let applied = store.lock().run_due_tasks();
                if applied > 0 {
                    tracing::debug!("Applied {} deferred station actions", applied);
                }
            }
            _ = shutdown.wait() => break,
        }
    }
}

/// Delay before the next arrival attempt, uniform over the configured window.
fn next_arrival_delay(config: &SimulationConfig, rng: &mut impl Rng) -> Duration {
    let min = config.arrival_min_secs as f64;
    let max = config.arrival_max_secs as f64;
    if max <= min {
        return Duration::from_secs_f64(min);
    }
    Duration::from_secs_f64(rng.gen_range(min..max))
}

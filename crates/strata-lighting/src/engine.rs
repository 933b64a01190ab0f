use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded, select, unbounded};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flood::{Flood, FloodStats};
use crate::terrain::{Pos, Terrain};

#[derive(Debug, Error)]
pub enum LightingError {
    #[error("lighting engine has been disposed")]
    Disposed,
    #[error("failed to spawn lighting worker: {0}")]
    Spawn(#[from] io::Error),
}

/// What the worker does with updates still queued when the engine is disposed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Process everything already queued, then exit.
    #[default]
    Drain,
    /// Exit immediately and drop queued updates.
    Discard,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub shutdown: ShutdownPolicy,
    pub thread_name: String,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            shutdown: ShutdownPolicy::Drain,
            thread_name: "strata-light".into(),
        }
    }
}

/// Totals reported by the worker when it exits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineReport {
    pub processed: u64,
    pub discarded: u64,
    pub block: FloodStats,
    pub sun: FloodStats,
}

#[derive(Debug, Default)]
struct Counters {
    pending: AtomicUsize,
    processed: AtomicUsize,
    // Producers between their closed check and the end of their send.
    submitting: AtomicUsize,
}

/// Cloneable producer handle. Any thread may submit updates through it.
#[derive(Clone, Debug)]
pub struct LightQueue {
    tx: Sender<Pos>,
    closed: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl LightQueue {
    /// Queue `(x, y, z)` for relighting. Never blocks.
    ///
    /// An `Ok` return means the update is in the queue before the worker sees
    /// the shutdown signal, so a draining dispose always settles it.
    pub fn update_light(&self, x: i32, y: i32, z: i32) -> Result<(), LightingError> {
        let c = &self.counters;
        c.submitting.fetch_add(1, Ordering::SeqCst);
        let sent = if self.closed.load(Ordering::SeqCst) {
            false
        } else {
            c.pending.fetch_add(1, Ordering::Relaxed);
            let ok = self.tx.send((x, y, z)).is_ok();
            if !ok {
                c.pending.fetch_sub(1, Ordering::Relaxed);
            }
            ok
        };
        c.submitting.fetch_sub(1, Ordering::SeqCst);
        if sent { Ok(()) } else { Err(LightingError::Disposed) }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // Refuse new updates and wait out producers already past the closed check.
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        while self.counters.submitting.load(Ordering::SeqCst) != 0 {
            thread::yield_now();
        }
    }

    /// Updates queued but not yet settled.
    pub fn pending(&self) -> usize {
        self.counters.pending.load(Ordering::Relaxed)
    }
}

/// Owns the lighting worker thread.
///
/// The worker is the only writer of light values. It sleeps until an update or
/// the shutdown signal arrives, and settles each dequeued position (block pass,
/// then sun pass) before looking at the queue again.
pub struct LightingEngine {
    queue: LightQueue,
    shutdown_tx: Sender<()>,
    worker: Option<JoinHandle<EngineReport>>,
}

impl LightingEngine {
    pub fn spawn<T: Terrain + 'static>(terrain: Arc<T>, config: LightingConfig) -> Result<Self, LightingError> {
        let (tx, rx) = unbounded::<Pos>();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let counters = Arc::new(Counters::default());
        let policy = config.shutdown;
        let worker = {
            let counters = counters.clone();
            thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || run_worker(terrain.as_ref(), rx, shutdown_rx, policy, &counters))?
        };
        log::debug!(target: "lighting", "worker '{}' started (shutdown={:?})", config.thread_name, policy);
        Ok(Self {
            queue: LightQueue {
                tx,
                closed: Arc::new(AtomicBool::new(false)),
                counters,
            },
            shutdown_tx,
            worker: Some(worker),
        })
    }

    /// Queue `(x, y, z)` for relighting. Fails once the engine is disposed.
    pub fn update_light(&self, x: i32, y: i32, z: i32) -> Result<(), LightingError> {
        self.queue.update_light(x, y, z)
    }

    pub fn queue(&self) -> LightQueue {
        self.queue.clone()
    }

    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Updates settled so far.
    pub fn processed(&self) -> usize {
        self.queue.counters.processed.load(Ordering::Relaxed)
    }

    /// Stop accepting updates, signal the worker, and join it.
    pub fn dispose(mut self) -> EngineReport {
        self.shutdown()
    }

    fn shutdown(&mut self) -> EngineReport {
        self.queue.close();
        let Some(worker) = self.worker.take() else {
            return EngineReport::default();
        };
        let _ = self.shutdown_tx.send(());
        match worker.join() {
            Ok(report) => {
                log::debug!(
                    target: "lighting",
                    "worker stopped: processed={} discarded={} block_changed={} sun_changed={}",
                    report.processed,
                    report.discarded,
                    report.block.changed,
                    report.sun.changed
                );
                report
            }
            Err(_) => {
                log::error!(target: "lighting", "lighting worker panicked");
                EngineReport::default()
            }
        }
    }
}

impl Drop for LightingEngine {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shutdown();
        }
    }
}

fn settle_one<T: Terrain + ?Sized>(
    terrain: &T,
    flood: &mut Flood,
    pos: Pos,
    counters: &Counters,
    report: &mut EngineReport,
) {
    let t0 = Instant::now();
    let (block, sun) = flood.settle(terrain, pos);
    report.processed += 1;
    report.block.accumulate(block);
    report.sun.accumulate(sun);
    counters.pending.fetch_sub(1, Ordering::Relaxed);
    counters.processed.fetch_add(1, Ordering::Relaxed);
    log::trace!(
        target: "lighting",
        "settled {:?} in {}us: block rounds={} changed={}, sun rounds={} changed={}",
        pos,
        t0.elapsed().as_micros(),
        block.rounds,
        block.changed,
        sun.rounds,
        sun.changed
    );
}

fn run_worker<T: Terrain + ?Sized>(
    terrain: &T,
    rx: Receiver<Pos>,
    shutdown_rx: Receiver<()>,
    policy: ShutdownPolicy,
    counters: &Counters,
) -> EngineReport {
    let mut flood = Flood::new();
    let mut report = EngineReport::default();
    loop {
        select! {
            recv(rx) -> res => match res {
                Ok(pos) => settle_one(terrain, &mut flood, pos, counters, &mut report),
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => {
                match policy {
                    ShutdownPolicy::Drain => {
                        while let Ok(pos) = rx.try_recv() {
                            settle_one(terrain, &mut flood, pos, counters, &mut report);
                        }
                    }
                    ShutdownPolicy::Discard => {
                        let dropped = rx.try_iter().count();
                        counters.pending.fetch_sub(dropped, Ordering::Relaxed);
                        report.discarded = dropped as u64;
                    }
                }
                break;
            },
        }
    }
    report
}

//! Message-passing funnel into a single aggregator thread
//!
//! Shutdown follows a fixed protocol per run:
//!
//! ```text
//! Sending --(all producer handles dropped)--> Draining --(aggregator reports)--> Done
//! ```
//!
//! The channel is closed only once the producer count reaches zero, so no
//! send can race the close. The aggregator owns the running total and hands
//! it back over a one-shot completion channel after it has drained every
//! buffered message. `total()` blocks until the run reaches `Done`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use super::{pause, Accumulator, IncrementHandle};
use crate::utils::{AccumulatorError, BenchmarkError, Result};
use crate::workload::AccumulationStrategy;

/// Shutdown phase of a funnel run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelPhase {
    /// Producers may still send
    Sending,
    /// Channel closed, aggregator draining what is buffered
    Draining,
    /// Aggregator finished; total is final
    Done,
}

struct FunnelState {
    phase: FunnelPhase,
    /// Live producer handles (the counted barrier)
    producers: usize,
    /// Master sender; producers clone it only while `Sending`
    sender: Option<Sender<u64>>,
    total: Option<u64>,
}

struct FunnelShared {
    state: Mutex<FunnelState>,
    changed: Condvar,
}

impl FunnelShared {
    fn set_done(&self, total: Option<u64>) {
        let mut state = self.state.lock();
        state.phase = FunnelPhase::Done;
        state.total = total;
        self.changed.notify_all();
    }

    fn wait_done(&self) -> Option<u64> {
        let mut state = self.state.lock();
        while state.phase != FunnelPhase::Done {
            self.changed.wait(&mut state);
        }
        state.total
    }
}

pub struct ChannelFunnelAccumulator {
    shared: Arc<FunnelShared>,
    /// One-shot completion signal from the aggregator
    completion: Mutex<Option<Receiver<u64>>>,
    aggregator: Mutex<Option<JoinHandle<()>>>,
    send_timeout: Option<Duration>,
    delay: Duration,
}

impl ChannelFunnelAccumulator {
    /// Create the funnel and start its aggregator
    ///
    /// `capacity == 0` selects an unbounded channel. `send_timeout` only
    /// applies to bounded channels.
    pub fn new(capacity: usize, send_timeout: Option<Duration>, delay: Duration) -> Result<Self> {
        let (tx, rx) = if capacity == 0 {
            channel::unbounded::<u64>()
        } else {
            channel::bounded::<u64>(capacity)
        };
        let (done_tx, done_rx) = channel::bounded::<u64>(1);

        let aggregator = thread::Builder::new()
            .name("funnel-aggregator".to_string())
            .spawn(move || {
                let mut total = 0u64;
                let mut messages = 0u64;
                for increment in rx.iter() {
                    total += increment;
                    messages += 1;
                }
                debug!("Aggregator drained {} messages", messages);
                // Receiver is gone only if the accumulator was dropped unsealed
                let _ = done_tx.send(total);
            })
            .map_err(|e| BenchmarkError::Worker(format!("Failed to spawn aggregator: {}", e)))?;

        Ok(Self {
            shared: Arc::new(FunnelShared {
                state: Mutex::new(FunnelState {
                    phase: FunnelPhase::Sending,
                    producers: 0,
                    sender: Some(tx),
                    total: None,
                }),
                changed: Condvar::new(),
            }),
            completion: Mutex::new(Some(done_rx)),
            aggregator: Mutex::new(Some(aggregator)),
            send_timeout: if capacity == 0 { None } else { send_timeout },
            delay,
        })
    }

    /// Current shutdown phase
    pub fn phase(&self) -> FunnelPhase {
        self.shared.state.lock().phase
    }

    /// Number of producer handles still alive
    pub fn producers(&self) -> usize {
        self.shared.state.lock().producers
    }

    /// Total if the run is `Done`, without blocking
    pub fn try_total(&self) -> Option<u64> {
        let state = self.shared.state.lock();
        match state.phase {
            FunnelPhase::Done => state.total,
            _ => None,
        }
    }
}

struct FunnelProducer {
    worker_id: usize,
    sender: Option<Sender<u64>>,
    shared: Arc<FunnelShared>,
    send_timeout: Option<Duration>,
    delay: Duration,
}

impl IncrementHandle for FunnelProducer {
    fn increment(&mut self) -> std::result::Result<(), AccumulatorError> {
        let worker_id = self.worker_id;
        let sender = self
            .sender
            .as_ref()
            .ok_or(AccumulatorError::Disconnected { worker_id })?;

        match self.send_timeout {
            Some(timeout) => sender.send_timeout(1, timeout).map_err(|e| match e {
                SendTimeoutError::Timeout(_) => AccumulatorError::Timeout {
                    worker_id,
                    timeout,
                },
                SendTimeoutError::Disconnected(_) => AccumulatorError::Disconnected { worker_id },
            })?,
            None => sender
                .send(1)
                .map_err(|_| AccumulatorError::Disconnected { worker_id })?,
        }

        pause(self.delay);
        Ok(())
    }
}

impl Drop for FunnelProducer {
    fn drop(&mut self) {
        // Release the sender before arriving at the barrier
        if self.sender.take().is_some() {
            let mut state = self.shared.state.lock();
            state.producers -= 1;
            self.shared.changed.notify_all();
        }
    }
}

impl Accumulator for ChannelFunnelAccumulator {
    fn strategy(&self) -> AccumulationStrategy {
        AccumulationStrategy::ChannelFunnel
    }

    /// Register a producer. Handles created once `seal()` has left `Sending`
    /// are disconnected.
    fn handle(&self, worker_id: usize) -> Box<dyn IncrementHandle> {
        let sender = {
            let mut state = self.shared.state.lock();
            match (state.phase, state.sender.clone()) {
                (FunnelPhase::Sending, Some(sender)) => {
                    state.producers += 1;
                    Some(sender)
                }
                _ => None,
            }
        };
        Box::new(FunnelProducer {
            worker_id,
            sender,
            shared: Arc::clone(&self.shared),
            send_timeout: self.send_timeout,
            delay: self.delay,
        })
    }

    /// Wait for every producer handle to drop, close the channel, then wait
    /// for the aggregator to drain and report.
    fn seal(&self) -> Result<()> {
        let master = {
            let mut state = self.shared.state.lock();
            if state.phase != FunnelPhase::Sending {
                drop(state);
                self.shared.wait_done();
                return Ok(());
            }
            while state.producers > 0 {
                self.shared.changed.wait(&mut state);
            }
            state.phase = FunnelPhase::Draining;
            state.sender.take()
        };
        drop(master);

        let completion = self.completion.lock().take();
        let reported = completion.and_then(|rx| rx.recv().ok());
        let joined = match self.aggregator.lock().take() {
            Some(handle) => handle.join().is_ok(),
            None => true,
        };

        self.shared.set_done(reported);

        match (reported, joined) {
            (Some(_), true) => Ok(()),
            (_, false) => Err(BenchmarkError::Worker("Aggregator thread panicked".to_string())),
            (None, true) => Err(BenchmarkError::Worker(
                "Aggregator exited without reporting a total".to_string(),
            )),
        }
    }

    /// Blocks until the aggregator has reported (see `seal`)
    fn total(&self) -> u64 {
        self.shared.wait_done().unwrap_or(0)
    }
}

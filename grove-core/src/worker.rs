//! Runs a [`Simulation`] on its own thread.
//!
//! The host posts [`Command`]s and the thread answers each `update` with a
//! [`Reply::Draw`]; the two sides never share simulation state. When several commands are queued the thread can
//! collapse them with [`coalesce_updates`], so a slow tick never builds a
//! backlog of stale updates.

use crate::config::Config;
use crate::error::GroveError;
use crate::protocol::{Command, Frame, Reply};
use crate::simulation::Simulation;
use crossbeam_channel::{Receiver, Sender, unbounded};
use rand::Rng;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

pub struct SimulationWorker {
    commands: Option<Sender<Command>>,
    replies: Receiver<Reply>,
    handle: Option<JoinHandle<()>>,
}

impl SimulationWorker {
    /// Builds a simulation from `cfg` and starts its thread on a canvas of
    /// the given size.
    pub fn spawn(cfg: Config, width: f32, height: f32) -> Result<Self, GroveError> {
        let coalesce = cfg.coalesce_updates;
        let mut sim = Simulation::new(cfg, width, height)?;
        let (tx_cmd, rx_cmd) = unbounded();
        let (tx_reply, rx_reply) = unbounded();

        let handle = thread::Builder::new()
            .name("grove-sim".into())
            .spawn(move || serve(&mut sim, &rx_cmd, &tx_reply, coalesce))
            .map_err(GroveError::Thread)?;

        info!(width, height, "simulation thread started");
        Ok(Self {
            commands: Some(tx_cmd),
            replies: rx_reply,
            handle: Some(handle),
        })
    }

    /// Queues a command. Returns `false` once the thread has stopped.
    pub fn send(&self, cmd: Command) -> bool {
        self.commands
            .as_ref()
            .is_some_and(|tx| tx.send(cmd).is_ok())
    }

    pub fn init(&self, width: f32, height: f32) -> bool {
        self.send(Command::Init { width, height })
    }

    pub fn resize(&self, width: f32, height: f32) -> bool {
        self.send(Command::Resize { width, height })
    }

    pub fn update(&self, timestamp: f64) -> bool {
        self.send(Command::Update { timestamp })
    }

    /// Drains every unread reply and keeps the newest frame.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.replies.try_iter().last().map(Reply::into_frame)
    }

    pub fn recv_frame_timeout(&self, timeout: Duration) -> Option<Frame> {
        self.replies.recv_timeout(timeout).ok().map(Reply::into_frame)
    }

    /// Closes the command channel and waits for the thread to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.commands = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("simulation thread panicked");
            } else {
                debug!("simulation thread stopped");
            }
        }
    }
}

impl Drop for SimulationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Applies commands from `commands` until the channel closes, answering
/// every produced frame with a `draw` reply on `replies`.
///
/// With `coalesce` set, each batch of queued commands is reduced with
/// [`coalesce_updates`] before it is applied.
pub fn serve<R: Rng>(
    sim: &mut Simulation<R>,
    commands: &Receiver<Command>,
    replies: &Sender<Reply>,
    coalesce: bool,
) {
    while let Ok(first) = commands.recv() {
        let batch: Vec<Command> = if coalesce {
            let queued: Vec<Command> = std::iter::once(first).chain(commands.try_iter()).collect();
            let total = queued.len();
            let kept = coalesce_updates(queued);
            if kept.len() < total {
                debug!(dropped = total - kept.len(), "coalesced queued commands");
            }
            kept
        } else {
            vec![first]
        };

        for cmd in batch {
            if let Some(frame) = sim.handle(cmd)
                && replies.send(Reply::Draw(frame)).is_err()
            {
                return;
            }
        }
    }
}

/// Reduces a queue of commands to the newest reset followed by the newest
/// update after it.
///
/// A reset discards everything before it, and only the newest update's
/// frame is worth drawing.
pub fn coalesce_updates(batch: impl IntoIterator<Item = Command>) -> Vec<Command> {
    let mut reset = None;
    let mut update = None;
    for cmd in batch {
        if cmd.is_reset() {
            reset = Some(cmd);
            update = None;
        } else {
            update = Some(cmd);
        }
    }
    reset.into_iter().chain(update).collect()
}

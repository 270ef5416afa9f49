//! Real-time driver: runs a [`Session`] on a tokio task.
//!
//! The task owns the session. Commands arrive over an mpsc channel and are
//! answered over oneshot channels; a periodic tick advances the session's
//! virtual clock by the wall time that actually passed. Every state change
//! is published on a watch channel.

use std::time::Duration;

use derive_more::{Display, Error};
use square_game_core::{
    CardShuffler, GameMode, GridError, Session, Snapshot, StateObserver, TapOutcome,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

const COMMAND_QUEUE: usize = 64;

/// Requests sent to the driver task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Start a fresh attempt.
    StartNewGame {
        /// Level to play.
        level: u32,
        /// Explicit mode, or the level default.
        mode: Option<GameMode>,
        /// Receives the deal result.
        reply: oneshot::Sender<Result<(), GridError>>,
    },
    /// Tap a card.
    SelectCard {
        /// Grid index.
        index: usize,
        /// Receives what the tap did.
        reply: oneshot::Sender<TapOutcome>,
    },
    /// Move on to the next level.
    AdvanceToNextLevel {
        /// Receives the deal result.
        reply: oneshot::Sender<Result<(), GridError>>,
    },
    /// Replay the current level.
    RestartCurrentLevel {
        /// Receives the deal result.
        reply: oneshot::Sender<Result<(), GridError>>,
    },
    /// Leave the round.
    ReturnToMenu {
        /// Acknowledgement.
        reply: oneshot::Sender<()>,
    },
    /// Freeze the round.
    Pause {
        /// Whether the session paused.
        reply: oneshot::Sender<bool>,
    },
    /// Unfreeze the round.
    Resume {
        /// Whether the session resumed.
        reply: oneshot::Sender<bool>,
    },
    /// Stop the round-end countdown.
    CancelAutoProgress {
        /// Acknowledgement.
        reply: oneshot::Sender<()>,
    },
    /// Record the pending high score.
    SubmitHighScore {
        /// Player name.
        name: String,
        /// Whether a score was pending.
        reply: oneshot::Sender<bool>,
    },
    /// Skip the pending high score.
    DismissHighScore {
        /// Whether a score was pending.
        reply: oneshot::Sender<bool>,
    },
    /// Stop the driver and hand the session back.
    Shutdown,
}

/// Publishes snapshots on a watch channel.
#[derive(Debug)]
pub struct WatchObserver {
    snapshots: watch::Sender<Snapshot>,
}

impl WatchObserver {
    /// Wraps the sending half of a watch channel.
    pub fn new(snapshots: watch::Sender<Snapshot>) -> Self {
        Self { snapshots }
    }
}

impl StateObserver for WatchObserver {
    fn on_state_changed(&mut self, snapshot: &Snapshot) {
        self.snapshots.send_replace(snapshot.clone());
    }
}

/// Spawns session tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionDriver;

impl SessionDriver {
    /// Moves `session` onto a new task that advances it every `tick`.
    #[instrument(skip(session))]
    pub fn spawn<S>(mut session: Session<S>, tick: Duration) -> SessionHandle<S>
    where
        S: CardShuffler + Send + 'static,
    {
        let (snapshot_tx, snapshots) = watch::channel(session.snapshot());
        session.add_observer(WatchObserver::new(snapshot_tx));
        let (commands, rx) = mpsc::channel(COMMAND_QUEUE);
        let task = tokio::spawn(run(session, rx, tick));
        info!("Session driver started");
        SessionHandle {
            commands,
            snapshots,
            task,
        }
    }
}

async fn run<S: CardShuffler>(
    mut session: Session<S>,
    mut commands: mpsc::Receiver<SessionCommand>,
    tick: Duration,
) -> Session<S> {
    let mut interval = tokio::time::interval(tick.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        tokio::select! {
            command = commands.recv() => {
                let now = Instant::now();
                session.advance_time(now.duration_since(last));
                last = now;
                match command {
                    None | Some(SessionCommand::Shutdown) => break,
                    Some(command) => apply(&mut session, command),
                }
            }
            _ = interval.tick() => {
                let now = Instant::now();
                session.advance_time(now.duration_since(last));
                last = now;
            }
        }
    }

    info!("Session driver stopped");
    session
}

fn apply<S: CardShuffler>(session: &mut Session<S>, command: SessionCommand) {
    debug!(?command, "Applying command");
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        SessionCommand::StartNewGame { level, mode, reply } => {
            let _ = reply.send(session.start_new_game(level, mode));
        }
        SessionCommand::SelectCard { index, reply } => {
            let _ = reply.send(session.select_card(index));
        }
        SessionCommand::AdvanceToNextLevel { reply } => {
            let _ = reply.send(session.advance_to_next_level());
        }
        SessionCommand::RestartCurrentLevel { reply } => {
            let _ = reply.send(session.restart_current_level());
        }
        SessionCommand::ReturnToMenu { reply } => {
            session.return_to_menu();
            let _ = reply.send(());
        }
        SessionCommand::Pause { reply } => {
            let _ = reply.send(session.pause());
        }
        SessionCommand::Resume { reply } => {
            let _ = reply.send(session.resume());
        }
        SessionCommand::CancelAutoProgress { reply } => {
            session.cancel_auto_progress();
            let _ = reply.send(());
        }
        SessionCommand::SubmitHighScore { name, reply } => {
            let _ = reply.send(session.submit_high_score(&name));
        }
        SessionCommand::DismissHighScore { reply } => {
            let _ = reply.send(session.dismiss_high_score());
        }
        SessionCommand::Shutdown => {}
    }
}

/// Client side of a running driver.
#[derive(Debug)]
pub struct SessionHandle<S: CardShuffler> {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<Session<S>>,
}

impl<S: CardShuffler> SessionHandle<S> {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, DriverError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| DriverError::new("Session driver is not running"))?;
        response
            .await
            .map_err(|_| DriverError::new("Session driver dropped the request"))
    }

    /// Starts a fresh attempt at `level`.
    #[instrument(skip(self))]
    pub async fn start_new_game(&self, level: u32, mode: Option<GameMode>) -> Result<(), DriverError> {
        self.request(|reply| SessionCommand::StartNewGame { level, mode, reply })
            .await?
            .map_err(DriverError::from_grid)
    }

    /// Taps the card at `index`.
    #[instrument(skip(self))]
    pub async fn select_card(&self, index: usize) -> Result<TapOutcome, DriverError> {
        self.request(|reply| SessionCommand::SelectCard { index, reply })
            .await
    }

    /// Starts the next level.
    #[instrument(skip(self))]
    pub async fn advance_to_next_level(&self) -> Result<(), DriverError> {
        self.request(|reply| SessionCommand::AdvanceToNextLevel { reply })
            .await?
            .map_err(DriverError::from_grid)
    }

    /// Replays the current level.
    #[instrument(skip(self))]
    pub async fn restart_current_level(&self) -> Result<(), DriverError> {
        self.request(|reply| SessionCommand::RestartCurrentLevel { reply })
            .await?
            .map_err(DriverError::from_grid)
    }

    /// Leaves the round.
    #[instrument(skip(self))]
    pub async fn return_to_menu(&self) -> Result<(), DriverError> {
        self.request(|reply| SessionCommand::ReturnToMenu { reply })
            .await
    }

    /// Pauses a round in play.
    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<bool, DriverError> {
        self.request(|reply| SessionCommand::Pause { reply }).await
    }

    /// Resumes a paused round.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> Result<bool, DriverError> {
        self.request(|reply| SessionCommand::Resume { reply }).await
    }

    /// Stops the round-end countdown.
    #[instrument(skip(self))]
    pub async fn cancel_auto_progress(&self) -> Result<(), DriverError> {
        self.request(|reply| SessionCommand::CancelAutoProgress { reply })
            .await
    }

    /// Records the pending high score under `name`.
    #[instrument(skip(self))]
    pub async fn submit_high_score(&self, name: &str) -> Result<bool, DriverError> {
        let name = name.to_string();
        self.request(|reply| SessionCommand::SubmitHighScore { name, reply })
            .await
    }

    /// Skips the pending high score.
    #[instrument(skip(self))]
    pub async fn dismiss_high_score(&self) -> Result<bool, DriverError> {
        self.request(|reply| SessionCommand::DismissHighScore { reply })
            .await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that sees every published snapshot from now on.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Waits until a published snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&Snapshot) -> bool,
    ) -> Result<Snapshot, DriverError> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(predicate)
            .await
            .map_err(|_| DriverError::new("Session driver stopped publishing"))?;
        Ok(snapshot.clone())
    }

    /// Stops the driver and returns the session.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> Result<Session<S>, DriverError> {
        // The task also stops when the command channel closes, so a failed
        // send is not an error here.
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        self.task
            .await
            .map_err(|e| DriverError::new(format!("Session driver task failed: {}", e)))
    }
}

/// Driver error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Driver error: {} at {}:{}", message, file, line)]
pub struct DriverError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DriverError {
    /// Creates a new driver error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    #[track_caller]
    fn from_grid(error: GridError) -> Self {
        Self::new(format!("Could not deal a round: {}", error))
    }
}

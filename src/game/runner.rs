//! Frame-driven match loop

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::protocol::{Command, MatchUpdate};
use crate::util::time::frame_duration;

use super::session::{Session, SessionError};
use super::snapshot::SnapshotBuilder;

/// Handle to a running match loop
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub command_tx: mpsc::Sender<Command>,
    pub update_tx: broadcast::Sender<MatchUpdate>,
}

impl MatchHandle {
    /// Queue a command for the next frame
    pub async fn send(&self, command: Command) -> Result<(), mpsc::error::SendError<Command>> {
        self.command_tx.send(command).await
    }

    /// Receive events, snapshots and rejections
    pub fn subscribe(&self) -> broadcast::Receiver<MatchUpdate> {
        self.update_tx.subscribe()
    }
}

/// Owns the session and is the only place it is mutated
pub struct GameMatch {
    id: Uuid,
    session: Session,
    frame_rate: u32,
    command_rx: mpsc::Receiver<Command>,
    update_tx: broadcast::Sender<MatchUpdate>,
    snapshot_builder: SnapshotBuilder,
    /// Set by `Finish`; the loop exits once the session waits on the player
    finish_when_idle: bool,
}

impl GameMatch {
    /// Create a new match loop
    pub fn new(config: &Config) -> Result<(Self, MatchHandle), SessionError> {
        Ok(Self::with_session(Session::new(config.game)?, config))
    }

    /// Drive an already prepared session
    pub fn with_session(session: Session, config: &Config) -> (Self, MatchHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (update_tx, _) = broadcast::channel(256);
        let id = Uuid::new_v4();

        let handle = MatchHandle {
            id,
            command_tx,
            update_tx: update_tx.clone(),
        };

        let game_match = Self {
            id,
            session,
            frame_rate: config.frame_rate,
            command_rx,
            update_tx,
            snapshot_builder: SnapshotBuilder::new(config.snapshot_every),
            finish_when_idle: false,
        };

        (game_match, handle)
    }

    /// Run the frame loop until shutdown, until a finish request finds the
    /// session waiting on the player, or until every handle is dropped
    pub async fn run(mut self) {
        info!(loop_id = %self.id, frame_rate = self.frame_rate, "Match loop started");

        let mut frame = interval(frame_duration(self.frame_rate));
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            frame.tick().await;

            if !self.process_commands() {
                break;
            }

            let events = self.session.tick();
            let tick = self.session.game().tick();

            if !events.is_empty() {
                self.snapshot_builder.force_next();
                let _ = self.update_tx.send(MatchUpdate::Events { tick, events });
            }

            if self.snapshot_builder.should_send() {
                let snapshot = self.snapshot_builder.build(&self.session);
                let _ = self.update_tx.send(MatchUpdate::Snapshot {
                    snapshot: Box::new(snapshot),
                });
            }

            if self.finish_when_idle && self.session.is_waiting_for_player() {
                break;
            }
        }

        info!(loop_id = %self.id, "Match loop stopped");
    }

    /// Apply queued commands; returns false when the loop should stop
    fn process_commands(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(Command::Shutdown) => return false,
                Ok(Command::Finish) => self.finish_when_idle = true,
                Ok(command) => self.apply(command),
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, command: Command) {
        let result = match command {
            Command::StartGame => self.session.start_game(),
            Command::OpenOptions => self.session.open_options(),
            Command::Back => self.session.back(),
            Command::ToggleMusic => self.session.toggle_music().map(|_| ()),
            Command::SetAim { angle, power } => self.session.set_aim(angle, power),
            Command::NudgeAim { angle, power } => self.session.nudge_aim(angle, power),
            Command::Fire => self.session.fire(),
            Command::NewMatch => self.session.new_match(),
            Command::Shutdown | Command::Finish => Ok(()),
        };

        match result {
            Ok(()) => self.snapshot_builder.force_next(),
            Err(e) => {
                warn!(loop_id = %self.id, error = %e, "Command rejected");
                let _ = self.update_tx.send(MatchUpdate::Rejected {
                    reason: e.to_string(),
                });
            }
        }
    }
}

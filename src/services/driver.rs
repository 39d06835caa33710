// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event loop that drives a session from UI commands, the ticker and the
//! position feed on a single task.

use crate::db::SettlementStore;
use crate::models::{CompletionRecord, Coordinate};
use crate::services::position_feed::PositionFeed;
use crate::services::session::ChallengeSession;
use tokio::sync::mpsc;

/// User actions from the challenge screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    Start { current_position: Option<Coordinate> },
    TogglePause,
    End,
    /// Leave the screen without completing
    Abandon,
}

/// Run until the challenge ends or is abandoned.
///
/// Returns the completion record, or `None` if the session was abandoned or
/// the command channel closed. Failed commands have already been surfaced to
/// the UI as alerts, so the loop keeps going.
pub async fn run_session<F, S>(
    session: &mut ChallengeSession<F, S>,
    mut commands: mpsc::Receiver<SessionCommand>,
) -> Option<CompletionRecord>
where
    F: PositionFeed,
    S: SettlementStore,
{
    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    session.abandon();
                    return None;
                };
                tracing::debug!(?command, "Session command");
                match command {
                    SessionCommand::Start { current_position } => {
                        let _ = session.start(current_position);
                    }
                    SessionCommand::TogglePause => {
                        let _ = session.toggle_pause();
                    }
                    SessionCommand::End => {
                        if let Ok(record) = session.end().await {
                            return Some(record);
                        }
                    }
                    SessionCommand::Abandon => {
                        session.abandon();
                        return None;
                    }
                }
            }
            Some(input) = session.next_input() => session.handle(input),
        }
    }
}

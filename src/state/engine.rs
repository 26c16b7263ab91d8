//! Phase transition engine
//!
//! Each room holds at most one pending timer. Arming a timer aborts the previous
//! one and bumps the room's timer epoch; a firing timer re-fetches the room by
//! code and only acts if both its epoch and its expected predecessor phase are
//! still current. Explicit host or navigator transitions cancel the timer first.

use super::room::Room;
use super::view::{visible_players, HintView};
use super::AppState;
use crate::broadcast::Outbox;
use crate::error::RoomError;
use crate::protocol::ServerMessage;
use crate::types::*;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

const DUPLICATE_REASON: &str = "Someone else gave the same hint";

impl AppState {
    // ========== Timers ==========

    /// Arm the room's timer to fire `duration` from now
    fn arm_timer(&self, room: &mut Room, duration: Duration) {
        let deadline = Utc::now() + TimeDelta::from_std(duration).unwrap_or(TimeDelta::zero());
        self.schedule(room, duration, deadline);
    }

    fn schedule(&self, room: &mut Room, after: Duration, deadline: DateTime<Utc>) {
        let epoch = room.timer.cancel();
        let state = self.clone();
        let code = room.code.clone();
        let from = room.phase;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            state.fire_timer(code, from, epoch).await;
        });
        room.timer.set(deadline, handle.abort_handle());

        tracing::debug!(
            room = %room.code,
            phase = ?from,
            secs = after.as_secs(),
            "Phase timer armed"
        );
    }

    /// Timer callback. No-op if the timer was superseded or the room moved on.
    pub(crate) async fn fire_timer(&self, code: RoomCode, from: RoomPhase, epoch: u64) {
        let mut outbox = Outbox::default();
        {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(&code) else {
                return;
            };
            if room.timer.epoch() != epoch || room.phase != from {
                tracing::debug!(
                    room = %code,
                    expected = ?from,
                    phase = ?room.phase,
                    "Ignoring stale phase timer"
                );
                return;
            }
            room.timer.fired();
            self.advance(room, &mut outbox);
        }
        self.deliver(outbox).await;
    }

    fn advance(&self, room: &mut Room, outbox: &mut Outbox) {
        match room.phase {
            RoomPhase::RoundStart => self.enter_hint(room, outbox),
            RoomPhase::Hint => self.enter_vote(room, outbox),
            RoomPhase::Vote => self.enter_place(room, outbox),
            RoomPhase::Place => self.enter_reveal(room, outbox),
            RoomPhase::Reveal => self.finish_round(room, outbox),
            RoomPhase::Lobby | RoomPhase::GameOver => {}
        }
    }

    // ========== Transitions ==========
    //
    // Each one checks its predecessor phase through the Room method it calls
    // and does nothing when called from anywhere else.

    fn enter_hint(&self, room: &mut Room, outbox: &mut Outbox) {
        if !room.open_hints() {
            return;
        }
        self.arm_timer(room, self.config.hint_duration(room.kids_mode));
        tracing::info!(room = %room.code, round = room.round, "Hint phase started");

        outbox.to_room(
            room,
            ServerMessage::HintPhaseStarted {
                deadline: deadline_of(room),
            },
        );
        outbox.snapshot(room);
    }

    fn enter_vote(&self, room: &mut Room, outbox: &mut Outbox) {
        let Some(canceled) = room.close_hints(&mut rand::rng()) else {
            return;
        };
        for hint in &canceled {
            outbox.to(
                &hint.author_id,
                ServerMessage::HintCanceled {
                    hint_id: hint.id.clone(),
                    text: hint.text.clone(),
                    reason: DUPLICATE_REASON.to_string(),
                },
            );
        }
        self.arm_timer(room, self.config.vote);
        tracing::info!(
            room = %room.code,
            canceled = canceled.len(),
            ballot = room.vote_order.len(),
            "Vote phase started"
        );

        outbox.to_room(
            room,
            ServerMessage::VotePhaseStarted {
                hints: room.ballot().into_iter().map(HintView::anonymous).collect(),
                max_votes: MAX_VOTES,
                deadline: deadline_of(room),
            },
        );
        outbox.snapshot(room);
    }

    fn enter_place(&self, room: &mut Room, outbox: &mut Outbox) {
        let Some(final_clues) = room.close_votes() else {
            return;
        };
        self.arm_timer(room, self.config.place_duration(room.kids_mode));
        tracing::info!(room = %room.code, final_clues = final_clues.len(), "Placement phase started");

        let final_clues = final_clues
            .iter()
            .filter_map(|id| room.hint_by_id(id))
            .map(HintView::anonymous)
            .collect();
        outbox.to_room(
            room,
            ServerMessage::PlacementPhaseStarted {
                final_clues,
                deadline: deadline_of(room),
            },
        );
        outbox.snapshot(room);
    }

    fn enter_reveal(&self, room: &mut Room, outbox: &mut Outbox) {
        let Some(result) = room.reveal() else {
            return;
        };
        self.arm_timer(room, self.config.reveal);
        tracing::info!(
            room = %room.code,
            target = result.target,
            placement = result.placement,
            distance = result.distance,
            tier = ?result.tier,
            "Round revealed"
        );

        outbox.to_room(room, ServerMessage::Reveal { result });
        outbox.snapshot(room);
    }

    fn finish_round(&self, room: &mut Room, outbox: &mut Outbox) {
        let Some(phase) = room.finish_round() else {
            return;
        };
        room.timer.cancel();
        tracing::info!(room = %room.code, round = room.round, phase = ?phase, "Round finished");

        for recipient in room.recipients() {
            let leaderboard = visible_players(room, room.leaderboard(), &recipient);
            let msg = match phase {
                RoomPhase::GameOver => ServerMessage::GameOver { leaderboard },
                _ => ServerMessage::RoundComplete {
                    round: room.round,
                    leaderboard,
                },
            };
            outbox.to(&recipient, msg);
        }
        outbox.snapshot(room);
    }

    // ========== Commands ==========

    /// Host-only. LOBBY -> ROUND_START, then the spectrum reveal timer takes over.
    pub async fn start_round(&self, caller: &ParticipantId, code: &str) -> Result<(), RoomError> {
        self.with_room(code, |state, room, outbox| {
            room.ensure_host(caller, "start rounds")?;
            room.start_round(&mut rand::rng())?;
            state.arm_timer(room, state.config.spectrum_reveal);

            tracing::info!(
                room = %room.code,
                round = room.round,
                navigator = ?room.navigator_id,
                "Round started"
            );
            outbox.to_room(
                room,
                ServerMessage::RoundStarted {
                    round: room.round,
                    navigator_id: room.navigator_id.clone(),
                    spectrum: room.spectrum.clone(),
                    deadline: deadline_of(room),
                },
            );
            outbox.snapshot(room);
            Ok(())
        })
        .await
    }

    pub async fn submit_hint(
        &self,
        caller: &ParticipantId,
        code: &str,
        text: &str,
    ) -> Result<Hint, RoomError> {
        self.with_room(code, |state, room, outbox| {
            let hint = room.submit_hint(caller, text, state.filter.as_ref())?;
            tracing::info!(room = %room.code, player = %caller, resubmitted = hint.resubmitted, "Hint accepted");

            let (submitted, total) = room.hint_status();
            outbox.to_room(room, ServerMessage::HintStatus { submitted, total });
            Ok(hint)
        })
        .await
    }

    /// Host-only. Ends the hint window early.
    pub async fn complete_hint_phase(
        &self,
        caller: &ParticipantId,
        code: &str,
    ) -> Result<(), RoomError> {
        self.with_room(code, |state, room, outbox| {
            room.ensure_host(caller, "end the hint phase")?;
            if room.phase != RoomPhase::Hint {
                return Err(RoomError::InvalidPhase(room.phase));
            }
            room.timer.cancel();
            state.enter_vote(room, outbox);
            Ok(())
        })
        .await
    }

    pub async fn submit_vote(
        &self,
        caller: &ParticipantId,
        code: &str,
        hint_ids: Vec<HintId>,
    ) -> Result<(), RoomError> {
        self.with_room(code, |_, room, outbox| {
            room.submit_vote(caller, hint_ids)?;
            tracing::info!(room = %room.code, player = %caller, "Vote accepted");

            let (voted, total) = room.vote_status();
            outbox.to_room(room, ServerMessage::VoteStatus { voted, total });
            Ok(())
        })
        .await
    }

    /// Host-only. Ends voting early.
    pub async fn complete_vote_phase(
        &self,
        caller: &ParticipantId,
        code: &str,
    ) -> Result<(), RoomError> {
        self.with_room(code, |state, room, outbox| {
            room.ensure_host(caller, "end the vote phase")?;
            if room.phase != RoomPhase::Vote {
                return Err(RoomError::InvalidPhase(room.phase));
            }
            room.timer.cancel();
            state.enter_place(room, outbox);
            Ok(())
        })
        .await
    }

    /// Navigator-only. Returns the stored (rounded) value.
    pub async fn set_placement(
        &self,
        caller: &ParticipantId,
        code: &str,
        value: f64,
    ) -> Result<u8, RoomError> {
        self.with_room(code, |_, room, _| {
            let placement = room.set_placement(caller, value)?;
            tracing::debug!(room = %room.code, placement, "Placement moved");
            Ok(placement)
        })
        .await
    }

    /// Navigator-only. Locks the placement in and reveals immediately.
    pub async fn lock_placement(&self, caller: &ParticipantId, code: &str) -> Result<(), RoomError> {
        self.with_room(code, |state, room, outbox| {
            room.ensure_can_place(caller)?;
            room.timer.cancel();
            state.enter_reveal(room, outbox);
            Ok(())
        })
        .await
    }

    /// Host-only. Pushes the running phase's deadline back and re-arms the timer
    /// for the remaining time. Returns the new deadline.
    pub async fn add_time(
        &self,
        caller: &ParticipantId,
        code: &str,
    ) -> Result<DateTime<Utc>, RoomError> {
        self.with_room(code, |state, room, outbox| {
            room.ensure_host(caller, "add time")?;
            if !room.phase.is_extendable() {
                return Err(RoomError::InvalidPhase(room.phase));
            }
            let current = match room.timer.deadline() {
                Some(deadline) if room.timer.is_armed() => deadline,
                _ => return Err(RoomError::NoActiveTimer),
            };

            let extension =
                TimeDelta::from_std(state.config.add_time).unwrap_or(TimeDelta::zero());
            let deadline = current + extension;
            let remaining = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            state.schedule(room, remaining, deadline);

            tracing::info!(room = %room.code, phase = ?room.phase, deadline = %deadline, "Time added");
            outbox.to_room(
                room,
                ServerMessage::TimeExtended {
                    deadline: deadline.to_rfc3339(),
                },
            );
            outbox.snapshot(room);
            Ok(deadline)
        })
        .await
    }
}

fn deadline_of(room: &Room) -> Option<String> {
    room.timer.deadline().map(|d| d.to_rfc3339())
}

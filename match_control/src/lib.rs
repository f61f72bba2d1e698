#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative match state: game state, win arbitration, and orchestration
//! of the wave cycle.
//!
//! Exactly one participant per match holds write authority; every mutating
//! entry point consults the [`Authority`] gate first and silently refuses
//! without it. Arbitration separates compute from apply: the authority
//! computes a [`MatchResult`] once, and every participant (authority
//! included) merges it through [`MatchController::apply_result`], whose
//! finished guard makes duplicate or conflicting reports harmless. That guard
//! is the critical correctness property: with an unreliable-order transport
//! both clients may detect a death and report it, and only the first report
//! may ever produce a result.

use std::{mem, time::Duration};

use arcane_arena_bus::EventBus;
use arcane_arena_core::{Authority, Event, GameState, MatchResult, PlayerId, WaveConfig};
use arcane_arena_system_wave::{Wave, WaveController};

/// Connected participant tracked by the match roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Participant {
    id: PlayerId,
    alive: bool,
    kills: u32,
    gold: u32,
}

impl Participant {
    const fn connected(id: PlayerId) -> Self {
        Self {
            id,
            alive: true,
            kills: 0,
            gold: 0,
        }
    }

    fn revive(&mut self) {
        self.alive = true;
        self.kills = 0;
        self.gold = 0;
    }

    /// Identifier of the participant.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Whether the participant is still alive this match.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Monsters killed by this participant's lane this match.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }

    /// Current gold total of the participant.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }
}

/// Owns the overall game state and arbitrates the match result.
pub struct MatchController<A: Authority> {
    authority: A,
    state: GameState,
    elapsed: Duration,
    waves: WaveController,
    participants: Vec<Participant>,
    result: Option<MatchResult>,
}

impl<A: Authority> MatchController<A> {
    /// Creates a controller for a fresh match, entering `Playing` at wave 1.
    #[must_use]
    pub fn new(config: WaveConfig, authority: A) -> Self {
        Self {
            authority,
            state: GameState::Playing,
            elapsed: Duration::ZERO,
            waves: WaveController::new(config),
            participants: Vec::new(),
            result: None,
        }
    }

    /// Current overall game state.
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Elapsed match time; advances only while `Playing`.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Snapshot of the wave currently in progress.
    #[must_use]
    pub const fn wave(&self) -> &Wave {
        self.waves.wave()
    }

    /// Decided result, or `None` while the match is still running.
    #[must_use]
    pub const fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// Whether a result has been decided for this match.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Roster of currently connected participants.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Looks up one participant by id.
    #[must_use]
    pub fn participant(&self, id: PlayerId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Adds a participant to the roster.
    ///
    /// The roster mirrors the transport's connection list and is maintained
    /// identically on every client, so this is not authority-gated. Already
    /// connected ids are ignored.
    pub fn connect_player(&mut self, id: PlayerId) {
        if self.participants.iter().any(|p| p.id == id) {
            log::debug!("player {} already connected", id.get());
            return;
        }
        self.participants.push(Participant::connected(id));
    }

    /// Removes a participant from the roster.
    pub fn disconnect_player(&mut self, id: PlayerId) {
        self.participants.retain(|p| p.id != id);
    }

    /// Advances the match by one fixed-step tick.
    ///
    /// No-op without authority or outside `Playing`; otherwise the match
    /// clock advances and the wave cycle ticks.
    pub fn tick(&mut self, dt: Duration, bus: &EventBus) {
        if !self.authority.is_authority() {
            log::debug!("ignoring tick without authority");
            return;
        }
        if self.state != GameState::Playing {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        self.waves.tick(dt, bus);
    }

    /// Transitions the overall game state.
    ///
    /// Idempotent when the state is unchanged. `Playing` lets the match
    /// clock run; `Paused` and `GameOver` freeze it (the tick gate enforces
    /// the policy, so pause and resume never double-count elapsed time).
    pub fn change_state(&mut self, new_state: GameState, bus: &EventBus) {
        if !self.authority.is_authority() {
            log::debug!("ignoring state change without authority");
            return;
        }
        self.set_state(new_state, bus);
    }

    /// Arbitrates the match result after a participant died.
    ///
    /// Authority only. Ignored once a result exists, so the second of two
    /// near-simultaneous death reports can never overwrite the first. The
    /// winner is the first connected participant that is neither the dead
    /// player nor already dead; when none exists the match still finishes,
    /// with a degenerate no-winner result.
    pub fn report_player_death(&mut self, dead: PlayerId, bus: &EventBus) {
        if !self.authority.is_authority() {
            log::debug!("ignoring death report without authority");
            return;
        }
        if self.result.is_some() {
            log::debug!(
                "match already finished, ignoring death report for player {}",
                dead.get()
            );
            return;
        }

        match self.participants.iter_mut().find(|p| p.id == dead) {
            Some(participant) => participant.alive = false,
            None => log::debug!("death report for unknown player {}", dead.get()),
        }

        let winner = self
            .participants
            .iter()
            .find(|p| p.id != dead && p.alive)
            .map(Participant::id);
        if winner.is_none() {
            log::error!(
                "no surviving participant after player {} died, finishing without a winner",
                dead.get()
            );
        }

        let result = MatchResult::new(winner, dead, self.elapsed, self.waves.wave().number());
        self.apply_result(result, bus);
    }

    /// Merges an arbitrated result into local state and announces it.
    ///
    /// This is the replica-side half of arbitration: hosts call it when the
    /// authority's result broadcast arrives, and the authority path funnels
    /// through it too. Deliberately not authority-gated; the finished guard
    /// makes a duplicate or conflicting broadcast a logged no-op.
    pub fn apply_result(&mut self, result: MatchResult, bus: &EventBus) {
        if self.result.is_some() {
            log::debug!("match already finished, ignoring result broadcast");
            return;
        }
        self.result = Some(result);
        self.set_state(GameState::GameOver, bus);
        bus.dispatch(&Event::GameOver {
            winner: result.winner(),
            loser: result.loser(),
            game_time: result.finished_at(),
            wave: result.wave(),
        });
    }

    /// Credits a monster kill and its gold reward to a participant.
    ///
    /// Authority only; ignored after the match has finished or for unknown
    /// players. Emits `MonsterKilled` and `GoldChanged` through the same
    /// delivery contract as the wave events.
    pub fn record_monster_kill(&mut self, killer: PlayerId, gold_reward: u32, bus: &EventBus) {
        if !self.authority.is_authority() {
            log::debug!("ignoring kill report without authority");
            return;
        }
        if self.result.is_some() {
            return;
        }
        let wave = self.waves.wave().number();
        let Some(participant) = self.participants.iter_mut().find(|p| p.id == killer) else {
            log::debug!("kill report for unknown player {}", killer.get());
            return;
        };
        participant.kills += 1;
        participant.gold = participant.gold.saturating_add(gold_reward);
        let gold = participant.gold;
        bus.dispatch(&Event::MonsterKilled {
            player: killer,
            wave,
        });
        bus.dispatch(&Event::GoldChanged {
            player: killer,
            gold,
        });
    }

    /// Resets the match for a rematch and re-enters `Playing`.
    ///
    /// Clears the result, revives every participant, zeroes the statistics
    /// and the match clock, restarts the wave cycle at wave 1, and
    /// re-announces wave and game state through the bus.
    pub fn restart(&mut self, bus: &EventBus) {
        if !self.authority.is_authority() {
            log::debug!("ignoring restart without authority");
            return;
        }
        self.result = None;
        self.elapsed = Duration::ZERO;
        for participant in &mut self.participants {
            participant.revive();
        }
        self.waves.reset(bus);
        self.set_state(GameState::Playing, bus);
    }

    /// Immediately advances to the next wave. Debug/cheat entry point.
    pub fn force_next_wave(&mut self, bus: &EventBus) {
        if !self.authority.is_authority() {
            log::debug!("ignoring wave skip without authority");
            return;
        }
        self.waves.force_next_wave(bus);
    }

    // Shared by the gated public transition and the ungated apply/restart
    // paths, which replicas must be able to run without authority.
    fn set_state(&mut self, new_state: GameState, bus: &EventBus) {
        if new_state == self.state {
            return;
        }
        let previous = mem::replace(&mut self.state, new_state);
        bus.dispatch(&Event::GameStateChanged {
            previous,
            current: new_state,
        });
    }
}

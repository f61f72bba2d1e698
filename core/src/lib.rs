#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Arcane Arena simulation.
//!
//! This crate defines the message surface that connects the authoritative
//! match controller, the wave state machine, and the presentation-side
//! collaborators that observe them. Simulation components announce every
//! observable change as an [`Event`] published on the event bus; collaborators
//! subscribe by [`EventKind`] and never hold a compile-time reference to the
//! producer. The serializable records in this crate ([`Event`],
//! [`MatchResult`]) are the only data that crosses process boundaries when a
//! host replicates authority decisions to the other participant.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier assigned to a connected participant for the span of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying identifier value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Describes whether simulation time advances for the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// The match is live and ticks advance wave progression.
    Playing,
    /// The match is suspended; timers and counters hold their values.
    Paused,
    /// A result has been decided; the simulation is permanently frozen.
    GameOver,
}

/// Sub-state of the wave cycle currently in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveState {
    /// Monsters are being emitted at the configured cadence.
    Spawning,
    /// Spawning has ended; a fixed combat window runs before the rest phase.
    Fighting,
    /// The wave is over; the rest timer runs until the next wave starts.
    Completed,
}

/// Events broadcast by the simulation for presentation-side collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A new wave has begun.
    WaveChanged {
        /// Number of the wave that just started, beginning at 1.
        wave: u32,
    },
    /// The active wave entered a different sub-state.
    WaveStateChanged {
        /// Sub-state the wave just entered.
        state: WaveState,
        /// Number of the wave the transition belongs to.
        wave: u32,
        /// Countdown remaining until the wave is force-advanced.
        remaining_time: Duration,
    },
    /// The master wave countdown advanced by one tick.
    WaveTimerUpdated {
        /// Countdown remaining until the wave is force-advanced.
        remaining_time: Duration,
    },
    /// The spawner collaborator should materialize one monster.
    MonsterShouldSpawn {
        /// Wave the monster belongs to.
        wave: u32,
        /// Zero-based index of the monster within its wave.
        spawn_index: u32,
        /// Strength scale derived from the wave number.
        difficulty_multiplier: f32,
    },
    /// The overall match state changed.
    GameStateChanged {
        /// State the match was in before the transition.
        previous: GameState,
        /// State the match is in now.
        current: GameState,
    },
    /// The match finished and a result was arbitrated.
    GameOver {
        /// Surviving participant, or `None` when arbitration found no winner.
        winner: Option<PlayerId>,
        /// Participant whose death ended the match.
        loser: PlayerId,
        /// Elapsed match time at the moment the result was decided.
        game_time: Duration,
        /// Wave number that was active when the match ended.
        wave: u32,
    },
    /// A participant's gold total changed.
    GoldChanged {
        /// Participant whose economy changed.
        player: PlayerId,
        /// New gold total after the change.
        gold: u32,
    },
    /// A participant's lane killed a monster.
    MonsterKilled {
        /// Participant credited with the kill.
        player: PlayerId,
        /// Wave the killed monster belonged to.
        wave: u32,
    },
}

impl Event {
    /// Retrieves the discriminant kind used to key bus subscriptions.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Event::WaveChanged { .. } => EventKind::WaveChanged,
            Event::WaveStateChanged { .. } => EventKind::WaveStateChanged,
            Event::WaveTimerUpdated { .. } => EventKind::WaveTimerUpdated,
            Event::MonsterShouldSpawn { .. } => EventKind::MonsterShouldSpawn,
            Event::GameStateChanged { .. } => EventKind::GameStateChanged,
            Event::GameOver { .. } => EventKind::GameOver,
            Event::GoldChanged { .. } => EventKind::GoldChanged,
            Event::MonsterKilled { .. } => EventKind::MonsterKilled,
        }
    }
}

/// Discriminant tag for [`Event`], used to key subscriptions on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Tag for [`Event::WaveChanged`].
    WaveChanged,
    /// Tag for [`Event::WaveStateChanged`].
    WaveStateChanged,
    /// Tag for [`Event::WaveTimerUpdated`].
    WaveTimerUpdated,
    /// Tag for [`Event::MonsterShouldSpawn`].
    MonsterShouldSpawn,
    /// Tag for [`Event::GameStateChanged`].
    GameStateChanged,
    /// Tag for [`Event::GameOver`].
    GameOver,
    /// Tag for [`Event::GoldChanged`].
    GoldChanged,
    /// Tag for [`Event::MonsterKilled`].
    MonsterKilled,
}

/// Immutable record of a decided match, created once per match.
///
/// The authority computes this record during arbitration and broadcasts it to
/// every participant; replicas apply it as a pure state merge without
/// re-deriving the winner locally.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    winner: Option<PlayerId>,
    loser: PlayerId,
    finished_at: Duration,
    wave: u32,
}

impl MatchResult {
    /// Creates a new match result record.
    #[must_use]
    pub const fn new(
        winner: Option<PlayerId>,
        loser: PlayerId,
        finished_at: Duration,
        wave: u32,
    ) -> Self {
        Self {
            winner,
            loser,
            finished_at,
            wave,
        }
    }

    /// Surviving participant, or `None` for a degenerate no-winner finish.
    #[must_use]
    pub const fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Participant whose death ended the match.
    #[must_use]
    pub const fn loser(&self) -> PlayerId {
        self.loser
    }

    /// Elapsed match time at the moment the result was decided.
    #[must_use]
    pub const fn finished_at(&self) -> Duration {
        self.finished_at
    }

    /// Wave number that was active when the match ended.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }
}

/// Rejected wave configuration values, reported at construction time.
///
/// Validation runs before any timer arithmetic so malformed values can never
/// reach tick-time division.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The spawn phase duration was zero.
    #[error("spawn duration must be positive")]
    ZeroSpawnDuration,
    /// The rest phase duration was zero.
    #[error("rest duration must be positive")]
    ZeroRestDuration,
    /// A fight phase was requested with a zero duration.
    #[error("fight duration must be positive when the fight phase is enabled")]
    ZeroFightDuration,
    /// The wave would contain no monsters.
    #[error("monsters per wave must be at least 1")]
    NoMonsters,
    /// The per-wave growth factor would shrink waves or is not a number.
    #[error("growth factor must be finite and at least 1.0, got {0}")]
    InvalidGrowth(f32),
}

/// Validated timing and scaling parameters for the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveConfig {
    spawn_duration: Duration,
    fight_duration: Option<Duration>,
    rest_duration: Duration,
    monsters_per_wave: u32,
    growth: f32,
}

impl WaveConfig {
    /// Creates a configuration without a fight phase, validating every field.
    pub fn new(
        spawn_duration: Duration,
        rest_duration: Duration,
        monsters_per_wave: u32,
        growth: f32,
    ) -> Result<Self, ConfigError> {
        if spawn_duration.is_zero() {
            return Err(ConfigError::ZeroSpawnDuration);
        }
        if rest_duration.is_zero() {
            return Err(ConfigError::ZeroRestDuration);
        }
        if monsters_per_wave == 0 {
            return Err(ConfigError::NoMonsters);
        }
        if !growth.is_finite() || growth < 1.0 {
            return Err(ConfigError::InvalidGrowth(growth));
        }

        Ok(Self {
            spawn_duration,
            fight_duration: None,
            rest_duration,
            monsters_per_wave,
            growth,
        })
    }

    /// Enables the fixed-length fight phase between spawning and rest.
    pub fn with_fight_phase(mut self, fight_duration: Duration) -> Result<Self, ConfigError> {
        if fight_duration.is_zero() {
            return Err(ConfigError::ZeroFightDuration);
        }
        self.fight_duration = Some(fight_duration);
        Ok(self)
    }

    /// Duration of the spawn phase of each wave.
    #[must_use]
    pub const fn spawn_duration(&self) -> Duration {
        self.spawn_duration
    }

    /// Duration of the fight phase, or `None` when the phase is disabled.
    #[must_use]
    pub const fn fight_duration(&self) -> Option<Duration> {
        self.fight_duration
    }

    /// Duration of the rest phase between waves.
    #[must_use]
    pub const fn rest_duration(&self) -> Duration {
        self.rest_duration
    }

    /// Number of monsters emitted during the first wave.
    #[must_use]
    pub const fn monsters_per_wave(&self) -> u32 {
        self.monsters_per_wave
    }

    /// Multiplier applied to the monster count at each wave advance.
    #[must_use]
    pub const fn growth(&self) -> f32 {
        self.growth
    }

    /// Total duration of one full wave cycle across every phase.
    #[must_use]
    pub fn cycle_duration(&self) -> Duration {
        let fight = self.fight_duration.unwrap_or(Duration::ZERO);
        self.spawn_duration + fight + self.rest_duration
    }
}

/// Capability check for the single participant allowed to mutate match state.
///
/// In a networked deployment exactly one participant holds authority and
/// every other client mirrors replicated state; mutating entry points consult
/// this predicate first and silently refuse when it is not held.
pub trait Authority {
    /// Reports whether the caller is the authoritative writer for the match.
    fn is_authority(&self) -> bool;
}

/// Authority source that always grants, for single-player hosts and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalAuthority;

impl Authority for LocalAuthority {
    fn is_authority(&self) -> bool {
        true
    }
}

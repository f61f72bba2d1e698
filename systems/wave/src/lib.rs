#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave state machine driving the spawn/fight/rest cadence of each wave.
//!
//! The controller owns the current [`Wave`] and announces every observable
//! change through the event bus; nothing else reads its internals at tick
//! time. Two clocks drive wave progression: the per-state timer that runs the
//! normal `Spawning → Fighting → Completed` cycle, and an independent master
//! countdown spanning the whole cycle. When the countdown reaches zero it
//! forces the next wave unconditionally, superseding whatever the per-state
//! logic would have done in the same tick. In steady state both clocks agree;
//! the countdown exists so a stalled phase can never wedge the match.

use std::time::Duration;

use arcane_arena_bus::EventBus;
use arcane_arena_core::{Event, WaveConfig, WaveState};

/// Difficulty gained per wave beyond the first.
const DIFFICULTY_STEP: f32 = 0.2;

/// Snapshot of the wave cycle currently in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wave {
    number: u32,
    state: WaveState,
    state_timer: Duration,
    remaining_time: Duration,
    monsters_spawned: u32,
    monsters_per_wave: u32,
}

impl Wave {
    fn first(config: &WaveConfig) -> Self {
        Self {
            number: 1,
            state: WaveState::Spawning,
            state_timer: Duration::ZERO,
            remaining_time: config.cycle_duration(),
            monsters_spawned: 0,
            monsters_per_wave: config.monsters_per_wave(),
        }
    }

    /// Number of the wave, beginning at 1.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Sub-state the wave is currently in.
    #[must_use]
    pub const fn state(&self) -> WaveState {
        self.state
    }

    /// Time elapsed in the current sub-state.
    #[must_use]
    pub const fn state_timer(&self) -> Duration {
        self.state_timer
    }

    /// Countdown remaining until the wave is force-advanced.
    #[must_use]
    pub const fn remaining_time(&self) -> Duration {
        self.remaining_time
    }

    /// Monsters emitted so far during this wave.
    #[must_use]
    pub const fn monsters_spawned(&self) -> u32 {
        self.monsters_spawned
    }

    /// Monsters this wave will emit in total.
    #[must_use]
    pub const fn monsters_per_wave(&self) -> u32 {
        self.monsters_per_wave
    }

    /// Strength scale derived from the wave number, never stored.
    #[must_use]
    pub fn difficulty_multiplier(&self) -> f32 {
        1.0 + (self.number - 1) as f32 * DIFFICULTY_STEP
    }
}

/// Drives the wave cycle and announces every transition on the bus.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveController {
    config: WaveConfig,
    wave: Wave,
}

impl WaveController {
    /// Creates a controller starting at wave 1.
    ///
    /// Configuration validation happens in [`WaveConfig::new`]; a constructed
    /// config can never make tick-time arithmetic divide by zero.
    #[must_use]
    pub fn new(config: WaveConfig) -> Self {
        let wave = Wave::first(&config);
        Self { config, wave }
    }

    /// Snapshot of the wave currently in progress.
    #[must_use]
    pub const fn wave(&self) -> &Wave {
        &self.wave
    }

    /// Advances the wave cycle by one fixed-step tick.
    ///
    /// Within one tick the timer update is always published before any
    /// transition it triggers, so subscribers never observe a new state with
    /// a stale countdown.
    pub fn tick(&mut self, dt: Duration, bus: &EventBus) {
        self.wave.remaining_time = self.wave.remaining_time.saturating_sub(dt);
        bus.dispatch(&Event::WaveTimerUpdated {
            remaining_time: self.wave.remaining_time,
        });

        if self.wave.remaining_time.is_zero() {
            // Master countdown wins over per-state logic, even mid-state.
            log::debug!(
                "wave {} countdown expired, forcing next wave",
                self.wave.number
            );
            self.start_next_wave(bus);
            return;
        }

        self.wave.state_timer = self.wave.state_timer.saturating_add(dt);
        match self.wave.state {
            WaveState::Spawning => self.advance_spawning(bus),
            WaveState::Fighting => {
                if let Some(fight_duration) = self.config.fight_duration() {
                    if self.wave.state_timer >= fight_duration {
                        self.enter_state(WaveState::Completed, bus);
                    }
                }
            }
            WaveState::Completed => {
                if self.wave.state_timer >= self.config.rest_duration() {
                    self.start_next_wave(bus);
                }
            }
        }
    }

    /// Immediately advances to the next wave. Debug/cheat entry point.
    pub fn force_next_wave(&mut self, bus: &EventBus) {
        self.start_next_wave(bus);
    }

    /// Returns to wave 1 and re-announces the fresh wave state.
    pub fn reset(&mut self, bus: &EventBus) {
        self.wave = Wave::first(&self.config);
        bus.dispatch(&Event::WaveChanged {
            wave: self.wave.number,
        });
        bus.dispatch(&Event::WaveStateChanged {
            state: self.wave.state,
            wave: self.wave.number,
            remaining_time: self.wave.remaining_time,
        });
    }

    fn advance_spawning(&mut self, bus: &EventBus) {
        // Spawn moments derive from the state timer rather than a separate
        // accumulator, so one oversized tick emits every spawn it covers.
        let interval = self.config.spawn_duration() / self.wave.monsters_per_wave;
        while self.wave.monsters_spawned < self.wave.monsters_per_wave {
            let due = interval * (self.wave.monsters_spawned + 1);
            if self.wave.state_timer < due {
                break;
            }
            bus.dispatch(&Event::MonsterShouldSpawn {
                wave: self.wave.number,
                spawn_index: self.wave.monsters_spawned,
                difficulty_multiplier: self.wave.difficulty_multiplier(),
            });
            self.wave.monsters_spawned += 1;
        }

        let timer_expired = self.wave.state_timer >= self.config.spawn_duration();
        let all_spawned = self.wave.monsters_spawned >= self.wave.monsters_per_wave;
        if timer_expired || all_spawned {
            let next = if self.config.fight_duration().is_some() {
                WaveState::Fighting
            } else {
                WaveState::Completed
            };
            self.enter_state(next, bus);
        }
    }

    fn enter_state(&mut self, state: WaveState, bus: &EventBus) {
        self.wave.state = state;
        self.wave.state_timer = Duration::ZERO;
        bus.dispatch(&Event::WaveStateChanged {
            state,
            wave: self.wave.number,
            remaining_time: self.wave.remaining_time,
        });
    }

    fn start_next_wave(&mut self, bus: &EventBus) {
        self.wave.number += 1;
        self.wave.monsters_per_wave = scaled_monster_count(
            self.wave.monsters_per_wave,
            self.config.growth(),
        );
        self.wave.monsters_spawned = 0;
        self.wave.remaining_time = self.config.cycle_duration();
        bus.dispatch(&Event::WaveChanged {
            wave: self.wave.number,
        });
        self.enter_state(WaveState::Spawning, bus);
    }
}

/// Scales the monster count for the next wave, never shrinking it.
fn scaled_monster_count(current: u32, growth: f32) -> u32 {
    let scaled = (current as f32 * growth).round() as u32;
    scaled.max(current)
}

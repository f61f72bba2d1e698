use std::{cell::RefCell, rc::Rc, time::Duration};

use arcane_arena_bus::EventBus;
use arcane_arena_core::{Event, EventKind, GameState, LocalAuthority, PlayerId, WaveConfig};
use arcane_arena_match_control::MatchController;

const P1: PlayerId = PlayerId::new(1);
const P2: PlayerId = PlayerId::new(2);

const ALL_KINDS: [EventKind; 8] = [
    EventKind::WaveChanged,
    EventKind::WaveStateChanged,
    EventKind::WaveTimerUpdated,
    EventKind::MonsterShouldSpawn,
    EventKind::GameStateChanged,
    EventKind::GameOver,
    EventKind::GoldChanged,
    EventKind::MonsterKilled,
];

#[derive(Clone)]
enum Step {
    Tick(Duration),
    Pause,
    Resume,
    Kill(PlayerId, u32),
    Death(PlayerId),
}

struct ReplayOutcome {
    events: Vec<Event>,
    final_state: GameState,
    final_wave: u32,
    winner: Option<PlayerId>,
}

fn replay(script: &[Step]) -> ReplayOutcome {
    let bus = EventBus::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in ALL_KINDS {
        let log = Rc::clone(&log);
        let _ = bus.subscribe(kind, move |event| {
            log.borrow_mut().push(event.clone());
        });
    }

    let config = WaveConfig::new(Duration::from_secs(8), Duration::from_secs(4), 4, 1.5)
        .expect("valid config")
        .with_fight_phase(Duration::from_secs(2))
        .expect("valid fight phase");
    let mut controller = MatchController::new(config, LocalAuthority);
    controller.connect_player(P1);
    controller.connect_player(P2);

    for step in script {
        match step {
            Step::Tick(dt) => controller.tick(*dt, &bus),
            Step::Pause => controller.change_state(GameState::Paused, &bus),
            Step::Resume => controller.change_state(GameState::Playing, &bus),
            Step::Kill(player, reward) => controller.record_monster_kill(*player, *reward, &bus),
            Step::Death(player) => controller.report_player_death(*player, &bus),
        }
    }

    let events = log.borrow().clone();
    ReplayOutcome {
        events,
        final_state: controller.state(),
        final_wave: controller.wave().number(),
        winner: controller.result().and_then(|result| result.winner()),
    }
}

fn match_script() -> Vec<Step> {
    let mut script = Vec::new();
    // Wave 1 plays out at a fixed 250ms step, interrupted by a pause.
    for _ in 0..20 {
        script.push(Step::Tick(Duration::from_millis(250)));
    }
    script.push(Step::Kill(P1, 12));
    script.push(Step::Pause);
    script.push(Step::Tick(Duration::from_secs(5)));
    script.push(Step::Resume);
    for _ in 0..40 {
        script.push(Step::Tick(Duration::from_millis(250)));
    }
    script.push(Step::Kill(P2, 12));
    // Partway through wave 2 both clients report a death back to back.
    script.push(Step::Death(P2));
    script.push(Step::Death(P1));
    for _ in 0..8 {
        script.push(Step::Tick(Duration::from_millis(250)));
    }
    script
}

#[test]
fn full_match_replay_is_deterministic() {
    let script = match_script();
    let first = replay(&script);
    let second = replay(&script);

    assert_eq!(first.events, second.events, "match replay diverged");
    assert_eq!(first.final_state, second.final_state);
    assert_eq!(first.final_wave, second.final_wave);
    assert_eq!(first.winner, second.winner);

    assert_eq!(first.final_state, GameState::GameOver);
    assert_eq!(first.winner, Some(P1), "first death report decides the match");
    assert_eq!(first.final_wave, 2, "death arrived during wave 2");

    let wave_one_spawns = first
        .events
        .iter()
        .filter(|event| matches!(event, Event::MonsterShouldSpawn { wave: 1, .. }))
        .count();
    assert_eq!(wave_one_spawns, 4, "wave 1 emitted its full monster budget");

    let game_overs = first
        .events
        .iter()
        .filter(|event| matches!(event, Event::GameOver { .. }))
        .count();
    assert_eq!(game_overs, 1, "exactly one result broadcast");
}

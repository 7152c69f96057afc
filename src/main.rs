use colored::Colorize;
use serde::Serialize;
use uuid::Uuid;

use doudizhu_rs::games::doudizhu::{Action, Event, GameOutcome, GameSession, PatternKind, Phase};

#[derive(Debug, Default, Serialize)]
struct Summary {
    games: usize,
    landlord_wins: usize,
    farmer_wins: usize,
    bombs: usize,
    rockets: usize,
    max_multiplier: i64,
    total_multiplier: i64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let games: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(20);

    let mut summary = Summary {
        games,
        ..Default::default()
    };

    for n in 0..games {
        let mut session = GameSession::with_defaults(format!("sim-{}", n));
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            session
                .join(*id, format!("bot-{}", i + 1))
                .expect("three bots fit in one room");
            session
                .apply(*id, Action::ToggleAuto)
                .expect("seated bots can toggle auto-play");
        }
        for id in &ids {
            session
                .set_ready(*id, true)
                .expect("seated bots can ready up");
        }
        assert_eq!(
            session.phase,
            Phase::Finished,
            "an all-auto room plays straight through"
        );

        let events = session.take_events();
        let mut outcome = None;
        let mut plays = 0usize;
        for event in &events {
            match event {
                Event::TrickPlayed { kind, .. } => {
                    plays += 1;
                    match kind {
                        PatternKind::Bomb => summary.bombs += 1,
                        PatternKind::Rocket => summary.rockets += 1,
                        _ => {}
                    }
                }
                Event::GameEnded { outcome: o, .. } => outcome = Some(*o),
                _ => {}
            }
        }
        let outcome = outcome.expect("a finished game reports its outcome");
        let label = match outcome {
            GameOutcome::LandlordWin => {
                summary.landlord_wins += 1;
                "landlord".red()
            }
            GameOutcome::FarmerWin => {
                summary.farmer_wins += 1;
                "farmers ".green()
            }
        };
        summary.total_multiplier += session.multiplier;
        summary.max_multiplier = summary.max_multiplier.max(session.multiplier);
        println!(
            "game {:>3}: {} win   x{:<3} multiplier   {:>3} plays",
            n + 1,
            label,
            session.multiplier,
            plays
        );
    }

    println!(
        "\n{} {}",
        "summary".bold(),
        serde_json::to_string(&summary).expect("the summary serializes")
    );
}

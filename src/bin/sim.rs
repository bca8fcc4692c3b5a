use clap::Parser;
use rand::{Rng, SeedableRng, rngs::StdRng};
use voxel_ludo::game::{ActionPayload, GameConfig};
use voxel_ludo::sync::Session;
use voxel_ludo::types::TurnPhase;

#[derive(Debug, Parser, Clone)]
#[command(name = "voxel-ludo-sim")]
#[command(about = "Headless Voxel Ludo simulator - random hot-seat games for smoke testing")]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 5)]
    games: u32,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Abort a game after this many turn hand-offs
    #[arg(long, default_value_t = 2000)]
    max_turns: u32,

    /// Silence per-game output
    #[arg(long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();
    let mut wins = std::collections::BTreeMap::new();
    let mut total_turns = 0u64;

    for game_idx in 0..args.games {
        let seed = args.seed + u64::from(game_idx);
        let config = GameConfig {
            seed,
            ..GameConfig::default()
        };
        let mut session = Session::local(config);
        let mut chooser = StdRng::seed_from_u64(seed ^ 0x5eed);
        let mut turns = 0u32;

        while session.state().phase != TurnPhase::Win && turns < args.max_turns {
            let outcome = match session.state().phase {
                TurnPhase::Roll => session.request_roll(),
                TurnPhase::Move => {
                    // Take the forced move when only one piece qualifies,
                    // otherwise pick at random like a bored human.
                    match session.poll_auto_move() {
                        Ok(Some(outcome)) => Ok(Some(outcome)),
                        Ok(None) => {
                            let actions = session.state().legal_actions();
                            let action = actions[chooser.gen_range(0..actions.len())];
                            match action.payload {
                                ActionPayload::Piece(piece) => session.select_piece(piece),
                                _ => unreachable!("move phase only yields piece actions"),
                            }
                        }
                        Err(err) => Err(err),
                    }
                }
                TurnPhase::Win => break,
            };
            match outcome {
                Ok(Some(outcome)) => {
                    turns += outcome
                        .events
                        .iter()
                        .filter(|e| {
                            matches!(e, voxel_ludo::game::GameEvent::TurnAdvanced { .. })
                        })
                        .count() as u32;
                }
                Ok(None) => {}
                Err(err) => {
                    eprintln!("game {}: engine rejected action: {err}", game_idx + 1);
                    break;
                }
            }
        }

        total_turns += u64::from(turns);
        let winner = session.state().winner;
        if let Some(winner) = winner {
            *wins.entry(winner).or_insert(0u32) += 1;
        }
        if !args.quiet {
            let winner_str = winner
                .map(|c| c.to_string())
                .unwrap_or_else(|| "None".to_string());
            let scores = session.state().scores();
            println!(
                "Game {:>4}: Winner={:>6}, Turns={:>5}, Scores={:?}",
                game_idx + 1,
                winner_str,
                turns,
                scores
            );
        }
    }

    println!("\nGames: {}", args.games);
    println!(
        "Avg turns: {:.1}",
        total_turns as f64 / f64::from(args.games.max(1))
    );
    for (color, count) in &wins {
        println!("{color}: {count} wins");
    }
}

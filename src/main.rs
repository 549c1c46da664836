//! Grid Arcade headless runner
//!
//! Plays each game for a fixed stretch of simulated time with a simple
//! autopilot and prints one JSON score report per game.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use grid_arcade::sim::tanks::chase_heading;
use grid_arcade::sim::{
    Action, BreakoutGame, Direction, GameInput, GameKind, Position, Session, SnakeGame, TanksGame,
};
use grid_arcade::{AnyGame, Settings};

#[derive(Parser, Debug)]
#[command(name = "grid-arcade")]
#[command(about = "Play Snake, Breakout and Tanks headless and print score reports")]
struct Cli {
    /// Settings JSON file (defaults apply when omitted)
    settings: Option<PathBuf>,

    /// Override the seed from the settings file
    #[arg(long)]
    seed: Option<u64>,
}

/// Host frame interval (60 fps)
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Simulated play time per game
const RUN_MS: f64 = 60_000.0;

fn snake_input(game: &SnakeGame) -> Option<GameInput> {
    let head = game.snake().head();
    let food = game
        .food()
        .iter()
        .min_by_key(|f| (f.x - head.x).abs() + (f.y - head.y).abs())?;
    let heading = chase_heading(head, *food);
    (heading != game.snake().direction().opposite()).then(|| GameInput::direction(heading))
}

fn breakout_input(game: &BreakoutGame) -> GameInput {
    if !game.ball().is_launched() {
        return GameInput::action(Action::Launch);
    }
    let ball = game.ball().position().x;
    let center = game.paddle().center_column();
    if ball < center {
        GameInput::direction(Direction::Left)
    } else if ball > center {
        GameInput::direction(Direction::Right)
    } else {
        GameInput::Release
    }
}

fn tanks_inputs(game: &TanksGame) -> Vec<GameInput> {
    let me = game.player().position();
    let nearest = game
        .enemies()
        .iter()
        .filter(|e| e.is_alive())
        .map(|e| e.position())
        .min_by_key(|p: &Position| (p.x - me.x).abs() + (p.y - me.y).abs());
    match nearest {
        Some(target) => vec![
            GameInput::direction(chase_heading(me, target)),
            GameInput::action(Action::Shoot),
        ],
        None => vec![GameInput::Release],
    }
}

fn autopilot(game: &AnyGame) -> Vec<GameInput> {
    match game {
        AnyGame::Snake(g) => snake_input(g).into_iter().collect(),
        AnyGame::Breakout(g) => vec![breakout_input(g)],
        AnyGame::Tanks(g) => tanks_inputs(g),
    }
}

fn play(kind: GameKind, settings: &Settings) -> anyhow::Result<String> {
    let game = AnyGame::from_settings(kind, settings).context("board generation failed")?;
    let mut session = Session::new(game).with_max_frame_delta(settings.max_frame_delta_ms);

    let name = kind.as_str();
    session.set_on_state_change(move |state| log::info!("{name}: {state:?}"));
    session.set_on_game_over(move |score| log::info!("{name}: game over with {score}"));
    session.set_on_life_lost(move |left| log::debug!("{name}: {left} lives left"));
    session.set_on_speed_change(move |ms| log::trace!("{name}: {ms} ms per step"));

    let mut now = 0.0;
    session.start(now);
    while session.is_running() && now < RUN_MS {
        for input in autopilot(session.game()) {
            session.handle_input(input);
        }
        now += FRAME_MS;
        session.frame(now);
    }

    Ok(session.game().report().to_json()?)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Grid Arcade (headless) starting...");

    let cli = Cli::parse();
    let mut settings =
        Settings::load(cli.settings.as_deref()).with_context(|| match &cli.settings {
            Some(path) => format!("load settings: {}", path.display()),
            None => "load default settings".to_string(),
        })?;
    if let Some(seed) = cli.seed {
        settings.seed = Some(seed);
    }

    for kind in GameKind::ALL {
        let report = play(kind, &settings).with_context(|| format!("play {}", kind.as_str()))?;
        println!("{report}");
    }
    Ok(())
}

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use scala40_rs::action::Action;
use scala40_rs::bot;
use scala40_rs::codec;
use scala40_rs::config::Config;
use scala40_rs::engine::{ActionRequest, Engine};
use scala40_rs::game::{Game, MatchStatus};
use scala40_rs::integrity;
use scala40_rs::player::PlayerId;
use scala40_rs::repo::MemoryRepository;
use scala40_rs::view::PublicView;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::exit;

const EXIT_OK: i32 = 0;
const EXIT_VALIDATION: i32 = 2;
const EXIT_CORRUPT: i32 = 3;

/// Safety valve for simulated matches that stall on a dead stock.
const SIMULATION_ACTION_CAP: usize = 50_000;

#[derive(Parser)]
#[command(name = "scala40", about = "Scala 40 on the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive hot-seat game
    Play {
        #[arg(long, default_value_t = 2)]
        players: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Drive full matches with the deterministic baseline bot
    Simulate {
        #[arg(long, default_value_t = 1)]
        games: u32,
        #[arg(long, default_value_t = 2)]
        players: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Load an exported state document and examine it
    Inspect {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        validate: bool,
        #[arg(long)]
        show: Option<Section>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Section {
    Hand,
    Table,
    Stock,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Play { players, seed } => play(players, seed),
        Command::Simulate {
            games,
            players,
            seed,
        } => simulate(games, players, seed),
        Command::Inspect {
            file,
            validate,
            show,
        } => inspect(&file, validate, show),
    };
    match result {
        Ok(code) => exit(code),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            exit(1);
        }
    }
}

fn player_ids(players: usize) -> Vec<PlayerId> {
    (1..=players).map(|i| format!("player-{i}")).collect()
}

fn play(players: usize, seed: Option<u64>) -> anyhow::Result<i32> {
    let engine = Engine::new(MemoryRepository::new());
    let (game_id, _) = engine.create_game(&player_ids(players), Config::default(), seed)?;
    println!("Starting a {players}-player game...\n");

    let mut nonce = 0u64;
    loop {
        let game = engine.game(&game_id)?;
        if game.status == MatchStatus::Finished {
            let winner = game.winner.as_deref().unwrap_or("nobody");
            println!("\nMatch over! {} wins.", winner.green().bold());
            return Ok(EXIT_OK);
        }

        let current = game.current.clone();
        render(&game, &current);

        let actions: Vec<Action> = bot::legal_actions(&game, &current);
        println!("Select action:");
        println!("  [0] refresh view");
        for (i, action) in actions.iter().enumerate() {
            println!("  [{}] {action}", i + 1);
        }
        let index = input_loop(actions.len());
        if index == 0 {
            continue;
        }

        nonce += 1;
        let request = ActionRequest::new(
            game_id,
            current,
            format!("cli-{nonce}"),
            actions[index - 1].clone(),
        );
        match engine.process(&request) {
            Ok(response) => {
                for event in &response.events {
                    println!("  {} {event}", "*".cyan());
                }
            }
            Err(err) => println!("  {} {err}", "rejected:".yellow()),
        }
    }
}

fn render(game: &Game, current: &PlayerId) {
    let view = PublicView::of(game);
    println!();
    println!(
        "{} hand {} round {}  stock {}  discard {}",
        "--".dimmed(),
        view.hand_number,
        view.round_number,
        view.stock_size,
        view.discard_top
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into()),
    );
    for seat in &view.players {
        let marker = if seat.id == *current { ">" } else { " " };
        let opened = if seat.has_opened { "open" } else { "    " };
        let gone = if seat.is_eliminated { " (out)" } else { "" };
        println!(
            "{marker} {:<10} {:>2} cards  {opened}  {:>3} pts{gone}",
            seat.id, seat.hand_size, seat.score
        );
    }
    if !view.melds.is_empty() {
        println!("table:");
        for (i, meld) in view.melds.iter().enumerate() {
            let cards = meld
                .cards
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            println!("  [{i}] {} ({})", cards, meld.owner);
        }
    }
    if let Some(player) = game.player(current) {
        let hand = player
            .hand
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}: {hand}", current.as_str().bold());
    }
}

fn input_loop(max: usize) -> usize {
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            exit(1);
        }
        match input.trim().parse::<usize>() {
            Ok(i) if i <= max => return i,
            _ => println!("enter a number between 0 and {max}"),
        }
    }
}

fn simulate(games: u32, players: usize, seed: u64) -> anyhow::Result<i32> {
    let mut finished = 0u32;
    let mut stalled = 0u32;
    for g in 0..games {
        let engine = Engine::new(MemoryRepository::new());
        let game_seed = seed.wrapping_add(g as u64);
        let (game_id, _) =
            engine.create_game(&player_ids(players), Config::default(), Some(game_seed))?;

        let mut steps = 0usize;
        let status = loop {
            let game = engine.game(&game_id)?;
            if game.status == MatchStatus::Finished || steps >= SIMULATION_ACTION_CAP {
                break game.status;
            }
            let current = game.current.clone();
            let action = bot::choose(&game, &current)
                .context("baseline bot produced no action for the current player")?;
            let request =
                ActionRequest::new(game_id, current, format!("sim-{g}-{steps}"), action);
            if let Err(err) = engine.process(&request) {
                println!("game {g}: stalled after {steps} actions ({err})");
                break game.status;
            }
            steps += 1;

            let game = engine.game(&game_id)?;
            let violations = integrity::check(&game);
            if !violations.is_empty() {
                eprintln!("game {g}: integrity violations after {steps} actions:");
                for violation in &violations {
                    eprintln!("  - {violation}");
                }
                return Ok(EXIT_VALIDATION);
            }
        };

        let game = engine.game(&game_id)?;
        match status {
            MatchStatus::Finished => {
                finished += 1;
                let winner = game.winner.as_deref().unwrap_or("nobody");
                println!(
                    "game {g}: seed {game_seed}, {} hands, {steps} actions, winner {winner}",
                    game.hand_number
                );
            }
            _ => {
                stalled += 1;
                println!("game {g}: seed {game_seed}, unfinished after {steps} actions");
            }
        }
    }
    println!("{finished}/{games} finished, {stalled} unfinished, all states consistent");
    Ok(EXIT_OK)
}

fn inspect(file: &PathBuf, validate: bool, show: Option<Section>) -> anyhow::Result<i32> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let game = match codec::import_json(&raw) {
        Ok(game) => game,
        Err(codec::CodecError::CorruptState(detail)) => {
            eprintln!("corrupt state: {detail}");
            return Ok(EXIT_CORRUPT);
        }
        Err(err) => {
            eprintln!("invalid document: {err}");
            return Ok(EXIT_VALIDATION);
        }
    };

    println!(
        "game {} hand {} round {}  status {}  current {} ({})",
        game.id, game.hand_number, game.round_number, game.status, game.current, game.phase
    );
    if validate {
        // import already ran the checker; confirm explicitly for the record
        let violations = integrity::check(&game);
        match violations.is_empty() {
            true => println!("integrity: ok"),
            false => {
                for violation in &violations {
                    eprintln!("  - {violation}");
                }
                return Ok(EXIT_CORRUPT);
            }
        }
    }

    match show {
        Some(Section::Hand) => {
            for player in &game.players {
                let hand = player
                    .hand
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{:<10} {hand}", player.id);
            }
        }
        Some(Section::Table) => {
            for (i, meld) in game.melds.iter().enumerate() {
                let cards = meld
                    .cards
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("[{i}] {} {} ({})", meld.kind, cards, meld.owner);
            }
        }
        Some(Section::Stock) => {
            println!("stock: {} cards", game.stock.len());
            println!("discard: {} cards", game.discard.len());
        }
        None => {}
    }
    Ok(EXIT_OK)
}

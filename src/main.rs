// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use gridseq::persistence::{NoteDto, SongEvent, SongPayload, SongWatcher};
use gridseq::playback::{self, DriverOptions};
use gridseq::sink::{describe_note, TracingSink};
use gridseq::timing::steps_per_second;
use gridseq::{EngineConfig, Session};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("GRIDSEQ - Grid-based multi-layer step sequencer");
    println!();
    println!("Usage: gridseq [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --play <SONG>       Play a song file (.json or .yaml)");
    println!("  --loop              Loop playback (with --play or --demo)");
    println!("  --watch             Reload the song when the file changes (with --play)");
    println!("  --demo              Play a short built-in song");
    println!("  --info <SONG>       Print a song's settings and notes");
    println!("  --config <FILE>     Engine config (.yaml or .toml)");
    println!("  --help              Show this help message");
    println!();
    println!("Set RUST_LOG (e.g. RUST_LOG=gridseq=debug) for more output.");
}

#[derive(Debug, Default)]
struct CliArgs {
    play: Option<PathBuf>,
    info: Option<PathBuf>,
    config: Option<PathBuf>,
    demo: bool,
    looping: bool,
    watch: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--play" => cli.play = Some(path_value(&mut iter, "--play")?),
            "--info" => cli.info = Some(path_value(&mut iter, "--info")?),
            "--config" => cli.config = Some(path_value(&mut iter, "--config")?),
            "--demo" => cli.demo = true,
            "--loop" => cli.looping = true,
            "--watch" => cli.watch = true,
            "--help" | "-h" => cli.help = true,
            other => return Err(anyhow!("Unknown option: {}", other)),
        }
    }
    Ok(cli)
}

fn path_value<'a, I>(iter: &mut I, flag: &str) -> Result<PathBuf>
where
    I: Iterator<Item = &'a String>,
{
    iter.next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("{} requires a file argument", flag))
}

fn demo_song() -> SongPayload {
    // C-E-G-C arpeggio on layer 1, bass pulse on layer 2
    let melody = [(0, 0), (2, 4), (4, 7), (6, 12), (8, 7), (10, 4), (12, 0), (14, 12)];
    let bass = [0, 4, 8, 12];

    SongPayload {
        track_length: 16,
        ticks_per_step: 3,
        layer_count: 2,
        layers: vec![
            melody.iter().map(|&(t, p)| NoteDto { t, i: 0, p }).collect(),
            bass.iter().map(|&t| NoteDto { t, i: 1, p: 0 }).collect(),
        ],
        ..SongPayload::default()
    }
}

fn print_info(path: &Path) -> Result<()> {
    let payload = SongPayload::load(path)?;

    println!("Song: {}", path.display());
    println!("  Schema:        {}", payload.schema_version);
    println!("  Track length:  {}", payload.track_length);
    println!("  Ticks/step:    {}", payload.ticks_per_step);
    println!("  Layers:        {}", payload.layer_count);
    println!("  Notes:         {}", payload.note_count());

    for (layer, notes) in payload.layers.iter().enumerate() {
        println!();
        println!("Layer {}:", layer + 1);
        for note in notes {
            let name = match (u8::try_from(note.i), usize::try_from(note.p)) {
                (Ok(i), Ok(p)) => describe_note(i, p),
                _ => "?".to_string(),
            };
            println!("  {:>4}  {}", note.t, name);
        }
    }
    Ok(())
}

async fn play(config: EngineConfig, song: SongPayload, looping: bool, watch_path: Option<PathBuf>) -> Result<()> {
    let rate = config.clock.host_ticks_per_second;
    let mut session = Session::new(config, TracingSink, TracingSink);
    session.begin();
    println!("{}", session.load_song(&song));
    session.set_loop_enabled(looping);
    println!(
        "Playing {} steps at {:.1} steps/s{}",
        session.track_length(),
        steps_per_second(session.ticks_per_step(), rate),
        if looping { " (looping, Ctrl+C to stop)" } else { "" }
    );
    session.play();

    let session = Arc::new(Mutex::new(session));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_tx.send(true);
        }
    });

    if let Some(path) = watch_path {
        let watcher = SongWatcher::new(&path, None)?;
        let reload_session = Arc::clone(&session);
        let mut reload_shutdown = shutdown_tx.subscribe();
        println!("Watching {} for changes", watcher.watched_path().display());

        tokio::spawn(async move {
            let mut poll = tokio::time::interval(Duration::from_millis(100));
            loop {
                tokio::select! {
                    _ = poll.tick() => {}
                    _ = reload_shutdown.changed() => break,
                }
                for event in watcher.recv_all() {
                    match event {
                        SongEvent::Reloaded(payload) => {
                            let Ok(mut session) = reload_session.lock() else {
                                return;
                            };
                            let was_playing = session.is_playing();
                            println!("{}", session.load_song(&payload));
                            if was_playing {
                                session.play();
                            }
                        }
                        SongEvent::Error(message) => eprintln!("Reload failed: {}", message),
                    }
                }
            }
        });
    }

    let options = DriverOptions {
        host_ticks_per_second: rate,
        exit_when_stopped: !looping,
    };
    let report = playback::run(session, shutdown_rx, options, |notice| println!("{}", notice)).await?;
    let _ = shutdown_tx.send(true);

    println!("Done: {} steps over {} host ticks", report.steps, report.host_ticks);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridseq=info")))
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        println!("GRIDSEQ - Grid-based multi-layer step sequencer");
        println!("Run with --help for usage information");
        return Ok(());
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if cli.help {
        print_usage();
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    if let Some(path) = &cli.info {
        return print_info(path);
    }

    if let Some(path) = cli.play {
        let song = SongPayload::load(&path)?;
        let watch_path = cli.watch.then_some(path);
        return play(config, song, cli.looping, watch_path).await;
    }

    if cli.demo {
        return play(config, demo_song(), cli.looping, None).await;
    }

    eprintln!("Error: nothing to do");
    print_usage();
    std::process::exit(1);
}

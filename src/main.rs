use groovebox::audio::export::suggested_file_name;
use groovebox::project::settings_file_name;
use groovebox::{EngineConfig, ExportSettings, Groovebox, TrackId};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const DEFAULT_BARS: u32 = 2;
const DEFAULT_SEED: i64 = 303;
const LIVE_SECONDS: u64 = 8;

struct Options {
    live: bool,
    bars: u32,
    seed: i64,
    out_dir: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        live: false,
        bars: DEFAULT_BARS,
        seed: DEFAULT_SEED,
        out_dir: PathBuf::from("."),
        config: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().ok_or(format!("{} needs a value", name));
        match arg.as_str() {
            "--live" => options.live = true,
            "--bars" => {
                options.bars = value("--bars")?.parse().map_err(|e| format!("--bars: {}", e))?
            }
            "--seed" => {
                options.seed = value("--seed")?.parse().map_err(|e| format!("--seed: {}", e))?
            }
            "--out" => options.out_dir = PathBuf::from(value("--out")?),
            "--config" => options.config = Some(PathBuf::from(value("--config")?)),
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(options)
}

fn print_pattern(groovebox: &mut Groovebox) {
    let lengths: Vec<usize> = TrackId::ALL
        .iter()
        .map(|track| groovebox.registry().track_length(*track))
        .collect();
    let pattern = groovebox.current_pattern();
    for (track, length) in TrackId::ALL.iter().zip(lengths) {
        let row: String = (0..length)
            .map(|step| if pattern.trigger(*track, step) { 'x' } else { '.' })
            .collect();
        println!("  {:<7}{}", track.as_str(), row);
    }
}

fn main() {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Groovebox ===");

    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprintln!("Usage: groovebox [--live] [--bars N] [--seed N] [--out DIR] [--config FILE]");
            std::process::exit(2);
        }
    };

    let config = match &options.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let mut groovebox = Groovebox::new(config);
    groovebox.generate_beat(options.seed);
    groovebox.set_track_length(TrackId::Hat2, 12);
    println!("\nPattern {} (seed {}, {} BPM):", groovebox.current_slot(), options.seed, groovebox.bpm());
    print_pattern(&mut groovebox);

    if options.live {
        match groovebox.play() {
            Ok(_) => {
                println!("\nPlaying for {} seconds...", LIVE_SECONDS);
                let started = Instant::now();
                while started.elapsed() < Duration::from_secs(LIVE_SECONDS) {
                    groovebox.pump();
                    std::thread::sleep(Duration::from_millis(2));
                }
                groovebox.stop();
            }
            Err(e) => eprintln!("ERROR: {}", e),
        }
    }

    println!("\nRendering {} bars offline...", options.bars);
    let wav_path = options
        .out_dir
        .join(suggested_file_name(groovebox.current_slot(), groovebox.bpm()));
    let settings = ExportSettings {
        output_path: wav_path.to_string_lossy().into_owned(),
        sample_rate: groovebox.config().offline_sample_rate,
        ..ExportSettings::default()
    };
    match groovebox.export_wav(options.bars, settings) {
        Ok(path) => println!("WAV written to {}", path.display()),
        Err(e) => eprintln!("ERROR: {}", e),
    }

    let settings_path = options.out_dir.join(settings_file_name());
    match groovebox.save_settings(&settings_path) {
        Ok(()) => println!("Settings written to {}", settings_path.display()),
        Err(e) => eprintln!("ERROR: {}", e),
    }

    for notice in groovebox.drain_notifications() {
        println!("{}", notice);
    }
}

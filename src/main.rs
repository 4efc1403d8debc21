// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{crate_version, Parser};
use ramsynth::config::{Layout, Settings};
use ramsynth::engine;
use ramsynth::Synthesizer;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Loads a sample layout into the synthesizer and waits."
)]
struct Cli {
    /// The path to the settings file. Without one, the built-in guitar layout is
    /// loaded from the current directory.
    config: Option<PathBuf>,
    /// Exit as soon as the layout is loaded instead of waiting for Enter.
    #[arg(long)]
    no_wait: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Keep the synthesizer open while waiting; it closes when it goes out of scope.
    let _synth = match run(&cli) {
        Ok(synth) => Some(synth),
        Err(e) => {
            report(e.as_ref());
            None
        }
    };

    if !cli.no_wait {
        wait_for_enter()?;
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<Synthesizer, Box<dyn Error>> {
    let (settings, base_path) = match &cli.config {
        Some(path) => (
            Settings::deserialize(path)?,
            path.parent().map(Path::to_path_buf).unwrap_or_default(),
        ),
        None => (
            Settings::new(Default::default(), Layout::demo()),
            PathBuf::from("."),
        ),
    };

    // The engine is created once here and shared by everything below.
    let engine = engine::get_engine(settings.engine())?;
    println!("Engine: {}", engine);

    let synth = Synthesizer::open_with(engine, settings.engine().overlap())?;
    if let Err(e) = load_layout(&synth, settings.layout(), &base_path) {
        report(&e);
    }
    Ok(synth)
}

fn report(e: &(dyn Error + 'static)) {
    error!(err = e, "Smoke test failed");
    println!("{}", e);
}

fn load_layout(
    synth: &Synthesizer,
    layout: &Layout,
    base_path: &Path,
) -> Result<(), ramsynth::Error> {
    let samples = layout.apply(synth, base_path)?;

    for soundfont in layout.soundfonts() {
        println!("Loaded SoundFont {}", soundfont);
    }
    for (sample, binding) in samples.iter().zip(layout.samples()) {
        let [lokey, hikey] = binding.keys();
        println!(
            "Loaded {} -> bank {}, preset {}, keys {}-{}",
            sample,
            binding.bank(),
            binding.preset(),
            lokey,
            hikey
        );
    }

    println!(
        "{} samples bound over {} key ranges.",
        synth.samples()?.len(),
        synth.bindings()?.len()
    );
    Ok(())
}

fn wait_for_enter() -> io::Result<()> {
    println!("Press Enter to exit...");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

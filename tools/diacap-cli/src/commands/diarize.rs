//! Run speaker diarization on a media file.

use std::collections::BTreeSet;
use std::path::PathBuf;

use diacap_common::config::{Device, DiarizationConfig};
use diacap_subtitles::{diarize, DiarizeOptions};

pub async fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    device: Option<String>,
    command: Option<String>,
    config: DiarizationConfig,
) -> anyhow::Result<()> {
    let mut options = DiarizeOptions::from_config(&config);
    if let Some(device) = device {
        options.device = device
            .parse::<Device>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(command) = command {
        options.command = command.split_whitespace().map(str::to_string).collect();
    }
    options.output = output;

    println!("Diarizing {} (device: {})", input.display(), options.device);
    println!("Processing audio (this may take a while for long files)...");

    let outcome = diarize(&input, &options).await?;

    if outcome.audio != input {
        println!("  Audio: {}", outcome.audio.display());
    }
    let speakers: BTreeSet<&str> = outcome.turns.iter().map(|t| t.speaker.as_str()).collect();
    println!(
        "  Finished in {:.1} min; segments: {}",
        outcome.elapsed.as_secs_f64() / 60.0,
        outcome.turns.len()
    );
    println!(
        "  Speakers: {}",
        speakers.into_iter().collect::<Vec<_>>().join(", ")
    );
    println!("Wrote {}", outcome.output.display());

    Ok(())
}

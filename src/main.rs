use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use xdfsignal::{ChannelSelector, DecodeOptions, Signal, XdfHeader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and decode raw physiological signal files", long_about = None)]
struct Args {
    /// Path to the JSON header document
    #[arg(long)]
    header: PathBuf,

    /// Path to the raw signal file
    #[arg(short, long)]
    signal: PathBuf,

    /// Channel to decode (repeatable, default: all channels)
    #[arg(short, long)]
    channel: Vec<String>,

    /// Fail on trailing partial frames or epochs instead of dropping them
    #[arg(long)]
    strict: bool,

    /// Print the derived frame schema as JSON
    #[arg(long)]
    schema: bool,

    /// Print the decoded samples as JSON
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let header = XdfHeader::load(&args.header)
        .with_context(|| format!("Failed to load header {:?}", args.header))?;

    let options = if args.strict {
        DecodeOptions::strict()
    } else {
        DecodeOptions::default()
    };

    let signal = Signal::open_with(header, &args.signal, options)
        .with_context(|| format!("Failed to open signal {:?}", args.signal))?;

    info!(
        frames = signal.frame_count(),
        frame_width = signal.schema().frame_width(),
        discarded = signal.discarded_bytes(),
        "Loaded signal"
    );

    if args.schema {
        let json = serde_json::to_string_pretty(signal.schema())
            .context("Failed to serialize frame schema")?;
        println!("{}", json);
    }

    let selector = if args.channel.is_empty() {
        ChannelSelector::All
    } else {
        ChannelSelector::Many(args.channel.clone())
    };

    let view = signal
        .numeric_view(selector)
        .context("Failed to decode samples")?;

    if args.dump {
        let json = serde_json::to_string(&view).context("Failed to serialize samples")?;
        println!("{}", json);
        return Ok(());
    }

    for layout in signal.schema().channels() {
        let Some(epochs) = view.get(&layout.name) else {
            continue;
        };
        let samples: usize = epochs.iter().map(Vec::len).sum();
        let (min, max) = epochs
            .iter()
            .flatten()
            .fold((i128::MAX, i128::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        if samples == 0 {
            println!("{:<12} {:>4} Hz  0 epochs", layout.name, layout.sample_frequency);
        } else {
            println!(
                "{:<12} {:>4} Hz  {} epochs  {} samples  min {}  max {}",
                layout.name,
                layout.sample_frequency,
                epochs.len(),
                samples,
                min,
                max
            );
        }
    }

    Ok(())
}

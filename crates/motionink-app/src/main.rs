use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use motionink_core::{Editor, EditorConfig, Intent};

#[derive(Parser, Debug)]
#[command(name = "motionink", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a transcript of server messages and export the document.
    Replay(ReplayArgs),
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Transcript of server messages, one JSON object per line.
    transcript: PathBuf,

    /// Editor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame to seek to after the replay.
    #[arg(long)]
    frame: Option<f64>,

    /// Output path for the Lottie animation.
    #[arg(long)]
    lottie: Option<PathBuf>,

    /// Output path for an SVG snapshot of the current frame.
    #[arg(long)]
    svg: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Replay(args) => cmd_replay(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EditorConfig> {
    match path {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("load config '{}'", path.display())),
        None => Ok(EditorConfig::default()),
    }
}

fn write_output(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("write '{}'", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut editor = Editor::new(config);

    let f = File::open(&args.transcript)
        .with_context(|| format!("open transcript '{}'", args.transcript.display()))?;
    let summary = motionink_app::replay(&mut editor, BufReader::new(f))?;
    log::info!(
        "Replayed '{}': {} messages, {} rejected",
        args.transcript.display(),
        summary.messages,
        summary.rejected
    );

    if let Some(frame) = args.frame {
        editor
            .handle(Intent::EnterFrame(frame))
            .with_context(|| format!("seek to frame {frame}"))?;
    }

    if let Some(path) = &args.lottie {
        let json = serde_json::to_string_pretty(&editor.to_lottie())
            .with_context(|| "serialize Lottie JSON")?;
        write_output(path, &json)?;
    }
    if let Some(path) = &args.svg {
        let svg = motionink_app::snapshot_svg(&editor)?;
        write_output(path, &svg)?;
    }
    Ok(())
}

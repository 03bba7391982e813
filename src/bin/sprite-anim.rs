use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sprite-anim", version)]
struct Cli {
    /// Log decoder and runtime diagnostics to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print frame and layer structure as JSON.
    Info(InfoArgs),
    /// Composite one frame into a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input animation (`.mng` or `.rle`).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Runtime config JSON (pool capacities).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input animation (`.mng` or `.rle`).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Active phoneme mask; layers with a nonzero mask are drawn only if they share a bit.
    #[arg(long, default_value_t = 0)]
    mask: u32,

    /// Global opacity in `[0, 1]`.
    #[arg(long, default_value_t = 1.0)]
    opacity: f32,

    /// Surface width; defaults to the right edge of the frame's bounding box.
    #[arg(long)]
    width: Option<u32>,

    /// Surface height; defaults to the bottom edge of the frame's bounding box.
    #[arg(long)]
    height: Option<u32>,

    /// Surface fill before drawing, as `AARRGGBB` hex.
    #[arg(long, value_parser = parse_argb, default_value = "00000000")]
    background: u32,

    /// Runtime config JSON (pool capacities).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn parse_argb(s: &str) -> Result<u32, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix('#'))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid AARRGGBB color '{s}': {e}"))
}

fn make_runtime(config: Option<&Path>) -> anyhow::Result<sprite_anim::AnimationRuntime> {
    let config = match config {
        Some(path) => sprite_anim::RuntimeConfig::from_path(path)?,
        None => sprite_anim::RuntimeConfig::default(),
    };
    Ok(sprite_anim::AnimationRuntime::new(config)?)
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let mut rt = make_runtime(args.config.as_deref())?;
    let handle = rt
        .load_path(&args.in_path)
        .with_context(|| format!("load animation '{}'", args.in_path.display()))?;
    let summary = rt.summary(handle)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    rt.free(handle)?;
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut rt = make_runtime(args.config.as_deref())?;
    let handle = rt
        .load_path(&args.in_path)
        .with_context(|| format!("load animation '{}'", args.in_path.display()))?;

    let bounds = rt.frame_bounding_box(handle, args.frame)?;
    let width = args
        .width
        .unwrap_or_else(|| u32::try_from(bounds.right()).unwrap_or(0));
    let height = args
        .height
        .unwrap_or_else(|| u32::try_from(bounds.bottom()).unwrap_or(0));
    if width == 0 || height == 0 {
        anyhow::bail!(
            "frame {} has an empty extent; pass --width and --height",
            args.frame
        );
    }

    let mut pixels = vec![args.background; width as usize * height as usize];
    let mut surface = sprite_anim::Surface::new(&mut pixels, width, height)?;
    let dirty = rt.draw_frame(
        handle,
        args.frame,
        &mut surface,
        0,
        0,
        args.mask,
        sprite_anim::alpha_from_opacity(args.opacity),
    )?;
    tracing::debug!(?dirty, "frame composited");
    rt.free(handle)?;

    let rgba: Vec<u8> = pixels
        .iter()
        .flat_map(|&px| sprite_anim::argb_to_rgba8(px))
        .collect();

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &rgba,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use digitdrift::{
    CropSize, DataSource, GeneratorConfig, MovingDigits, Rng64, SpritePool, VideoClip,
};

#[derive(Parser, Debug)]
#[command(name = "digitdrift", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose one clip and write each frame as a PNG.
    Dump(DumpArgs),
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Gzip-compressed IDX digit archive (e.g. train-images-idx3-ubyte.gz).
    #[arg(long)]
    mnist: PathBuf,

    /// Generator config JSON; overrides the individual scene flags below.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for frame_NNN.png files.
    #[arg(long)]
    out: PathBuf,

    /// Random stream seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of digits in the scene.
    #[arg(long, default_value_t = 2)]
    digits: u32,

    /// Input frames.
    #[arg(long, default_value_t = 10)]
    frames_in: usize,

    /// Output (forecast) frames.
    #[arg(long, default_value_t = 10)]
    frames_out: usize,

    /// Occlusion window length; omit to disable occlusion.
    #[arg(long)]
    occlusion: Option<usize>,

    /// Optional square center crop edge length.
    #[arg(long)]
    crop: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Dump(args) => cmd_dump(args),
    }
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let pool = SpritePool::from_idx_gz(&args.mnist)?;
    let cfg = match &args.config {
        Some(path) => GeneratorConfig::from_path(path)?,
        None => GeneratorConfig {
            canvas_size: 100,
            sprite_size: pool.sprite_size(),
            step_length: 0.2,
            input_frames: args.frames_in,
            output_frames: args.frames_out,
            allowed_objects: vec![args.digits],
            occlusion_len: args.occlusion,
            crop: args.crop.map(|edge| CropSize {
                width: edge,
                height: edge,
            }),
        },
    };

    let dataset = MovingDigits::new(cfg, DataSource::Generated(pool))?;
    let mut rng = Rng64::new(args.seed);
    let sample = dataset.get(0, &mut rng)?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output directory '{}'", args.out.display()))?;

    let mut written = 0usize;
    written += write_frames(&sample.input, &args.out, 0)?;
    written += write_frames(&sample.output, &args.out, sample.input.frames())?;

    if !sample.occlusion.is_empty() {
        let (len, objects) = sample.occlusion.shape();
        for n in 0..objects {
            let frames: Vec<u32> = (0..len).map(|p| sample.occlusion.frame_at(p, n)).collect();
            println!("object {n}: occluded frames {frames:?}");
        }
    }
    println!("wrote {written} frames to {}", args.out.display());
    Ok(())
}

fn write_frames(clip: &VideoClip, out: &std::path::Path, base: usize) -> anyhow::Result<usize> {
    for f in 0..clip.frames() {
        let img = image::GrayImage::from_raw(clip.width(), clip.height(), clip.frame(f).to_vec())
            .context("frame buffer does not match image dimensions")?;
        let path = out.join(format!("frame_{:03}.png", base + f));
        img.save(&path)
            .with_context(|| format!("write frame to '{}'", path.display()))?;
    }
    Ok(clip.frames())
}

use anyhow::Context;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Bouncing spheres that chase the cursor")]
struct Args {
    /// RON file holding a `BallpitConfig`
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Number of bodies
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Seed for the initial placement
    #[arg(short, long)]
    seed: Option<u64>,

    /// Fixed window width in logical pixels
    #[arg(long, requires = "height")]
    width: Option<f32>,

    /// Fixed window height in logical pixels
    #[arg(long, requires = "width")]
    height: Option<f32>,

    #[arg(long)]
    title: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ballpit::BallpitConfig::load(path)?,
        None => ballpit::BallpitConfig::default(),
    };
    if let Some(count) = args.count {
        config.simulation.count = count;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let (Some(width), Some(height)) = (args.width, args.height) {
        config.window.size_mode = ballpit::app::viewport::SizeMode::Fixed { width, height };
    }

    let window = config.window.clone();
    let ballpit = ballpit::Ballpit::new(config)
        .context("Invalid ballpit configuration")?
        .with_title(args.title);

    ballpit::app::app::run(window, ballpit)?;
    Ok(())
}

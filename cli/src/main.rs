use std::time::Instant;

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use clap::Parser;
use mocha::compare::{compare, Comparison};
use mocha::inputs::{random_inputs, suppress_logits};
use mocha::reference::{naive_chunkwise_attention, tensor_rows};
use mocha::{
    ChunkwiseAttention, Config, EfficientChunkwiseAttention, PrecisionPolicy,
    StableChunkwiseAttention,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("chunkwise attention check failed: {err:#}");
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compare efficient and stable chunkwise attention",
    long_about = None
)]
struct Args {
    #[arg(long, default_value_t = 50, help = "Number of sequences per batch")]
    batch: usize,

    #[arg(long, default_value_t = 100, help = "Timesteps per sequence")]
    seq_len: usize,

    #[arg(long, default_value_t = 8, help = "Chunk (window) length")]
    chunk_size: usize,

    #[arg(long, default_value_t = 0, help = "Seed for the generated inputs")]
    seed: u64,

    #[arg(long, default_value_t = 20, help = "Timed calls per variant")]
    iterations: usize,

    #[arg(long, help = "Override the efficient path's exponential floor")]
    clamp_floor: Option<f32>,

    #[arg(long, help = "Compute in f32 regardless of input dtype")]
    force_f32: bool,

    #[arg(
        long,
        value_name = "GAP",
        help = "Subtract GAP from two logits of the first row and rerun"
    )]
    extreme_gap: Option<f64>,

    #[arg(long, default_value_t = mocha::compare::DEFAULT_ATOL, help = "Absolute tolerance")]
    atol: f64,

    #[arg(long, default_value_t = mocha::compare::DEFAULT_RTOL, help = "Relative tolerance")]
    rtol: f64,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(floor) = self.clamp_floor {
            config.clamp_floor = floor;
        }
        if self.force_f32 {
            config.precision = PrecisionPolicy::ForceF32;
        }
        config
    }
}

struct Variants {
    efficient: EfficientChunkwiseAttention,
    stable: StableChunkwiseAttention,
    config: Config,
}

impl Variants {
    fn run(&self, chunk_size: usize, alpha: &Tensor, logits: &Tensor) -> Result<(Tensor, Tensor)> {
        let efficient = self
            .efficient
            .attend(chunk_size, alpha, logits, &self.config)
            .context("efficient chunkwise attention")?;
        let stable = self
            .stable
            .attend(chunk_size, alpha, logits, &self.config)
            .context("stable chunkwise attention")?;
        Ok((efficient, stable))
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let device = Device::Cpu;
    let config = args.config();
    config.validate()?;

    let (alpha, logits) = random_inputs(args.batch, args.seq_len, args.seed, &device)
        .context("failed to generate inputs")?;
    let variants = Variants {
        efficient: EfficientChunkwiseAttention::new(),
        stable: StableChunkwiseAttention::new(),
        config,
    };

    let (efficient, stable) = variants.run(args.chunk_size, &alpha, &logits)?;
    println!(
        "inputs batch={} seq_len={} chunk_size={} -> efficient {:?}, stable {:?}",
        args.batch,
        args.seq_len,
        args.chunk_size,
        efficient.dims(),
        stable.dims()
    );
    report("efficient vs stable", &compare(&efficient, &stable, args.atol, args.rtol)?);

    if args.iterations > 0 {
        let efficient_ms = time_calls(args.iterations, || {
            variants
                .efficient
                .attend(args.chunk_size, &alpha, &logits, &variants.config)
        })?;
        let stable_ms = time_calls(args.iterations, || {
            variants
                .stable
                .attend(args.chunk_size, &alpha, &logits, &variants.config)
        })?;
        println!(
            "timing over {} calls: efficient {efficient_ms:.3} ms/call, stable {stable_ms:.3} ms/call",
            args.iterations
        );
    }

    if let Some(gap) = args.extreme_gap {
        let positions: Vec<usize> = (1..args.seq_len.min(3)).collect();
        let suppressed = suppress_logits(&logits, 0, &positions, gap)?;
        log::info!("suppressed logits at row 0 positions {positions:?} by {gap:e}");

        let (efficient, stable) = variants.run(args.chunk_size, &alpha, &suppressed)?;
        report(
            "extreme efficient vs stable",
            &compare(&efficient, &stable, args.atol, args.rtol)?,
        );

        let expected = naive_chunkwise_attention(
            args.chunk_size,
            &tensor_rows(&alpha)?,
            &tensor_rows(&suppressed)?,
        );
        let flat: Vec<f64> = expected.into_iter().flatten().collect();
        let expected = Tensor::from_vec(flat, (args.batch, args.seq_len), &device)?;
        report(
            "extreme stable vs f64 reference",
            &compare(&stable, &expected, args.atol.max(1e-6), args.rtol.max(1e-4))?,
        );
    }

    Ok(())
}

fn report(label: &str, summary: &Comparison) {
    let verdict = if summary.all_close() { "allclose" } else { "DIFFER" };
    println!("{label}: {verdict} ({summary})");
}

fn time_calls<F>(iterations: usize, mut call: F) -> Result<f64>
where
    F: FnMut() -> mocha::Result<Tensor>,
{
    call()?;
    let start = Instant::now();
    for _ in 0..iterations {
        call()?;
    }
    Ok(start.elapsed().as_secs_f64() * 1e3 / iterations as f64)
}

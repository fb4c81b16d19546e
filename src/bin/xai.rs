use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

use exg_xai::{
    ablation_by_class, explain, io::TrialSet, save, save_results, AnalysisConfig, FeatureExtractor,
    NearestCentroid, Row, Wavelet,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Features {
    /// Classifier sees the trial tensor directly
    Raw,
    /// Haar approximation coefficients
    Wavelet,
    /// Haar approximation + detail coefficients
    WaveletDetail,
    /// Welch power spectral density (129 bins)
    Psd,
    /// Per-channel moments, entropy, crossings and correlations
    Statistics,
    /// Filter-bank common spatial patterns
    Fbcsp,
}

impl Features {
    fn extractor(self) -> Option<FeatureExtractor> {
        match self {
            Features::Raw => None,
            Features::Wavelet => Some(FeatureExtractor::wavelet()),
            Features::WaveletDetail => Some(FeatureExtractor::Trials(Box::new(Wavelet::with_detail()))),
            Features::Psd => Some(FeatureExtractor::psd()),
            Features::Statistics => Some(FeatureExtractor::statistics()),
            Features::Fbcsp => Some(FeatureExtractor::fbcsp()),
        }
    }
}

#[derive(Parser)]
#[command(name = "xai", about = "Ablation and permutation sensitivity of a motor-imagery classifier")]
struct Args {
    /// Trial set (.safetensors with `trials` [N, C, T] and `labels` [N])
    #[arg(long)]
    input: PathBuf,

    /// Directory receiving the accuracy files
    #[arg(long)]
    output: PathBuf,

    /// Feature space the classifier is trained and evaluated on
    #[arg(long, value_enum, default_value_t = Features::Raw)]
    features: Features,

    /// Number of temporal segments (default: 8)
    #[arg(long, default_value_t = 8)]
    segments: usize,

    /// FBCSP feature budget (default: 396)
    #[arg(long, default_value_t = 396)]
    n_features: usize,

    /// Seed for the permutation draws; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Also ablate each class on its own
    #[arg(long)]
    by_class: bool,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("installing log subscriber")?;

    let set = TrialSet::load(&args.input)?;
    let (n, c, t) = set.trials.dim();
    println!("Loaded {n} trials × {c} ch × {t} samples");

    let cfg = AnalysisConfig {
        n_segments: args.segments,
        n_features: args.n_features,
        seed: args.seed,
    };
    let extractor = args.features.extractor();

    let model = {
        let feats = match &extractor {
            Some(e) => e.extract(&set.trials, &set.labels, cfg.n_features)?,
            None => set.trials.clone(),
        };
        NearestCentroid::fit(&feats, &set.labels)?
    };

    let report = explain(&set.trials, &set.labels, &model, extractor.as_ref(), &cfg)?;
    println!("Baseline accuracy {:.4}", report.baseline);

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    save(&[Row::from(report.baseline)], args.output.join("baseline.txt"))?;
    save_results(report.ablation.results(), args.output.join("ablation.txt"))?;
    save_results(report.permutation.results(), args.output.join("permutation.txt"))?;

    if args.by_class {
        for (class, r) in ablation_by_class(&set.trials, &set.labels, &model, extractor.as_ref(), &cfg)? {
            let mut rows = vec![Row::from(r.baseline)];
            rows.extend(r.ablation.results().map(Row::from));
            save(&rows, args.output.join(format!("ablation_class{class}.txt")))?;
        }
    }

    println!("Written → {}", args.output.display());
    Ok(())
}

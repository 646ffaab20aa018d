// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   - fine-tunes the classifier on a labelled CSV
//   2. `predict` - loads a checkpoint and labels a CSV of texts
//
// The Burn backend is picked here from --device:
//   gpu → Autodiff<Wgpu>    for training, Wgpu    for inference
//   cpu → Autodiff<NdArray> for training, NdArray for inference
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::{ensure, Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    prelude::Backend,
    tensor::backend::AutodiffBackend,
};
use clap::Parser;
use commands::{Commands, Device, PredictArgs, TrainArgs};

use crate::application::{
    predict_use_case::PredictUseCase,
    train_use_case::{TrainRequest, TrainUseCase},
};
use crate::data::{batcher::SmartBatcher, loader::load_texts};
use crate::infra::tokenizer_store::load_file;
use crate::ml::{
    model::ClassifierConfig,
    session::{adamw, BurnInference, BurnSession},
};

/// The main CLI struct. clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "bert-finetune",
    version = "0.1.0",
    about = "Fine-tune a transformer encoder for text classification, then label new texts."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the right backend.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => match args.device {
                Device::Gpu => run_train::<Autodiff<Wgpu>>(&args, WgpuDevice::default()),
                Device::Cpu => run_train::<Autodiff<NdArray>>(&args, NdArrayDevice::default()),
            },
            Commands::Predict(args) => match args.device {
                Device::Gpu => run_predict::<Wgpu>(&args, WgpuDevice::default()),
                Device::Cpu => run_predict::<NdArray>(&args, NdArrayDevice::default()),
            },
        }
    }
}

/// Handles the `train` subcommand.
fn run_train<B: AutodiffBackend>(args: &TrainArgs, device: B::Device) -> Result<()> {
    ensure!(
        args.num_heads > 0 && args.d_model % args.num_heads == 0,
        "d_model ({}) must be divisible by num_heads ({})",
        args.d_model,
        args.num_heads
    );
    tracing::info!("Starting training on '{}'", args.data.display());

    let request = TrainRequest::from(args);
    let outcome = TrainUseCase::new(request)
        .execute(|shape| {
            let config = ClassifierConfig::new(shape.vocab_rows, shape.num_classes, shape.max_len)
                .with_d_model(args.d_model)
                .with_num_heads(args.num_heads)
                .with_num_layers(args.num_layers)
                .with_d_ff(args.d_ff)
                .with_dropout(args.dropout);
            let session = BurnSession::new(config, adamw::<B>(args.eps), device);
            match &args.init_checkpoint {
                Some(bundle) => session.warm_start(bundle),
                None         => Ok(session),
            }
        })
        .map_err(|e| {
            let what = if e.is_configuration() {
                "invalid training input".to_string()
            } else {
                format!("training on '{}' failed", args.data.display())
            };
            anyhow::Error::new(e).context(what)
        })?;

    println!("Training complete. Best F1: {:.4}", outcome.best.best_score());
    match outcome.checkpoints.last() {
        Some(best) => println!("Best checkpoint: {}", best.display()),
        None       => println!("No checkpoint was saved."),
    }
    if let Some(report) = &outcome.report_path {
        println!("Classification report: {}", report.display());
    }
    Ok(())
}

/// Handles the `predict` subcommand.
fn run_predict<B: Backend>(args: &PredictArgs, device: B::Device) -> Result<()> {
    let texts = load_texts(&args.input)
        .with_context(|| format!("cannot read texts from '{}'", args.input.display()))?;

    let model = BurnInference::<B>::from_checkpoint(&args.checkpoint, device)
        .with_context(|| format!("cannot load checkpoint '{}'", args.checkpoint.display()))?;
    let tokenizer = load_file(&args.tokenizer)
        .with_context(|| format!("cannot load tokenizer '{}'", args.tokenizer.display()))?;

    let max_len = args.max_len.min(model.max_seq_len());
    if max_len < args.max_len {
        tracing::warn!("max_len lowered to {} to fit the checkpoint", max_len);
    }
    let batcher = SmartBatcher::new(tokenizer, max_len);

    let outcome = PredictUseCase::new(&args.model_type, args.batch_size, &args.output_root)
        .execute(&model, &batcher, &texts)
        .context("prediction failed")?;

    println!(
        "Predicted {} texts. Saved to {}",
        outcome.scores.len(),
        outcome.csv_path.display()
    );
    Ok(())
}

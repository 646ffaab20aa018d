// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and all
// their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing or unknown args
//   - type conversion (string → usize, f64, enums)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainRequest;
use crate::domain::config::TrainingConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the classifier on a labelled CSV file
    Train(TrainArgs),

    /// Label the texts of a CSV file with a saved checkpoint
    Predict(PredictArgs),
}

/// Where the tensors live
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    /// NdArray backend on the CPU
    Cpu,
    /// Wgpu backend on the default GPU adapter
    Gpu,
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Labelled CSV with `text`, `predicate_answer` and `framenet_answer` columns
    #[arg(long, default_value = "data/train.csv")]
    pub data: PathBuf,

    /// Separate held-out CSV; without it --test-size of --data is held out
    #[arg(long)]
    pub test_data: Option<PathBuf>,

    /// Which answer column provides the labels: predicate or framenet
    #[arg(long, default_value = "predicate")]
    pub label_type: String,

    /// Name used for checkpoints, tokenizer and report files
    #[arg(long, default_value = "bert-base-uncased")]
    pub model_name: String,

    /// Pretrained tokenizer.json; otherwise one is built from the data
    #[arg(long)]
    pub tokenizer: Option<PathBuf>,

    /// Checkpoint directory whose model weights start the run
    #[arg(long)]
    pub init_checkpoint: Option<PathBuf>,

    /// Root under which results/, models_BERT/ and prediction/ are created
    #[arg(long, default_value = ".")]
    pub output_root: PathBuf,

    #[arg(long, value_enum, default_value_t = Device::Gpu)]
    pub device: Device,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Maximum tokens per input, [CLS] and [SEP] included
    #[arg(long, default_value_t = 512)]
    pub max_len: usize,

    /// Fraction of --data held out when --test-data is not given
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Seed for the split and the per-epoch batch order
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Peak learning rate, decayed linearly to zero
    #[arg(long, default_value_t = 5e-5)]
    pub lr: f64,

    /// AdamW epsilon
    #[arg(long, default_value_t = 1e-8)]
    pub eps: f64,

    /// Evaluate every N epochs
    #[arg(long, default_value_t = 5)]
    pub eval_interval: usize,

    /// Hidden dimension of the transformer (d_model in the paper)
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// Number of attention heads; d_model must be divisible by it
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Number of stacked encoder layers
    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    /// Dropout probability
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Vocabulary size when a tokenizer has to be built
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,
}

impl TrainArgs {
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            batch_size:    self.batch_size,
            epochs:        self.epochs,
            max_len:       self.max_len,
            test_size:     self.test_size,
            seed:          self.seed,
            learning_rate: self.lr,
            epsilon:       self.eps,
            eval_interval: self.eval_interval,
        }
    }
}

/// Convert CLI TrainArgs into the application-layer TrainRequest.
/// The application layer never sees clap types.
impl From<&TrainArgs> for TrainRequest {
    fn from(a: &TrainArgs) -> Self {
        TrainRequest {
            data:        a.data.clone(),
            test_data:   a.test_data.clone(),
            label_type:  a.label_type.clone(),
            model_name:  a.model_name.clone(),
            tokenizer:   a.tokenizer.clone(),
            output_root: a.output_root.clone(),
            vocab_size:  a.vocab_size,
            training:    a.training_config(),
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// CSV with a `text` column
    #[arg(long)]
    pub input: PathBuf,

    /// Checkpoint directory written during training
    #[arg(long)]
    pub checkpoint: PathBuf,

    /// tokenizer.json used during training
    #[arg(long)]
    pub tokenizer: PathBuf,

    /// Prefix of the prediction file name
    #[arg(long, default_value = "bert")]
    pub model_type: String,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Maximum tokens per input; capped at the checkpoint's own limit
    #[arg(long, default_value_t = 512)]
    pub max_len: usize,

    #[arg(long, default_value = ".")]
    pub output_root: PathBuf,

    #[arg(long, value_enum, default_value_t = Device::Gpu)]
    pub device: Device,
}

// ============================================================
// Layer 4 - Smart Batcher
// ============================================================
// Turns raw texts (+ optional labels) into padded TextBatches.
//
// "Smart" batching keeps padding small:
//
//   1. Tokenize every text as  [CLS] tok tok ... tok [SEP]
//      truncated to max_len, always keeping the closing [SEP]
//   2. Stable-sort examples by token count
//   3. Cut the sorted list into contiguous groups of batch_size
//   4. Pad each group only up to its own longest sequence
//
//   lengths:  3 9 4 12 5 3 8            (batch_size = 3)
//   sorted:   3 3 4 | 5 8 9 | 12
//   padded:   to 4  | to 9  | to 12
//
// For training the group order is shuffled with a seed so the
// model does not always see short sequences first; evaluation
// and prediction keep length order, which makes them
// deterministic. Every batch carries the original positions of
// its rows, so callers can put predictions back in input order.
//
// Tensors are NOT built here. TextBatch stays framework-free and
// the session in Layer 5 flattens it into Burn tensors the same
// way for every backend.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tokenizers::Tokenizer;

use crate::domain::batch::TextBatch;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::traits::{BatchOrder, BatchSource};

// Fallback ids when the vocabulary does not define the tokens
pub const PAD_ID: u32 = 0;
pub const CLS_ID: u32 = 101;
pub const SEP_ID: u32 = 102;

// ─── Special token ids ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub pad: u32,
    pub cls: u32,
    pub sep: u32,
}

impl SpecialTokens {
    /// Look the ids up in the tokenizer's vocabulary
    pub fn from_tokenizer(tokenizer: &Tokenizer) -> Self {
        Self {
            pad: tokenizer.token_to_id("[PAD]").unwrap_or(PAD_ID),
            cls: tokenizer.token_to_id("[CLS]").unwrap_or(CLS_ID),
            sep: tokenizer.token_to_id("[SEP]").unwrap_or(SEP_ID),
        }
    }
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self { pad: PAD_ID, cls: CLS_ID, sep: SEP_ID }
    }
}

// ─── SmartBatcher ─────────────────────────────────────────────────────────────
pub struct SmartBatcher {
    tokenizer: Tokenizer,
    max_len:   usize,
    specials:  SpecialTokens,
}

impl SmartBatcher {
    pub fn new(tokenizer: Tokenizer, max_len: usize) -> Self {
        let specials = SpecialTokens::from_tokenizer(&tokenizer);
        Self { tokenizer, max_len, specials }
    }

    /// Token ids for every text, wrapped and truncated
    pub fn encode(&self, texts: &[String]) -> EngineResult<Vec<Vec<u32>>> {
        // Special tokens are added by hand so truncation can keep [SEP]
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), false)
            .map_err(EngineError::tokenizer)?;

        Ok(encodings
            .iter()
            .map(|enc| wrap_and_truncate(enc.get_ids(), self.max_len, &self.specials))
            .collect())
    }
}

impl BatchSource for SmartBatcher {
    fn make_batches(
        &self,
        texts:      &[String],
        labels:     Option<&[usize]>,
        batch_size: usize,
        order:      BatchOrder,
    ) -> EngineResult<Vec<TextBatch>> {
        let encoded = self.encode(texts)?;
        assemble_batches(encoded, labels, batch_size, order, self.specials.pad)
    }
}

/// `[CLS] ids [SEP]`, cut down to `max_len` tokens in total.
pub fn wrap_and_truncate(ids: &[u32], max_len: usize, specials: &SpecialTokens) -> Vec<u32> {
    let body = max_len.saturating_sub(2).min(ids.len());
    let mut out = Vec::with_capacity(body + 2);
    out.push(specials.cls);
    out.extend_from_slice(&ids[..body]);
    out.push(specials.sep);
    out
}

/// Group pre-encoded sequences into padded batches.
pub fn assemble_batches(
    encoded:    Vec<Vec<u32>>,
    labels:     Option<&[usize]>,
    batch_size: usize,
    order:      BatchOrder,
    pad_id:     u32,
) -> EngineResult<Vec<TextBatch>> {
    if batch_size == 0 {
        return Err(EngineError::configuration("batch_size must be at least 1"));
    }
    if let Some(labels) = labels {
        if labels.len() != encoded.len() {
            return Err(EngineError::configuration(format!(
                "{} texts but {} labels",
                encoded.len(),
                labels.len()
            )));
        }
    }

    // ── Sort by length (stable: equal lengths keep input order) ───────────────
    let mut order_idx: Vec<usize> = (0..encoded.len()).collect();
    order_idx.sort_by_key(|&i| encoded[i].len());

    // ── Cut into contiguous groups and pad each one ───────────────────────────
    let mut batches: Vec<TextBatch> = order_idx
        .chunks(batch_size)
        .map(|group| pad_group(group, &encoded, labels, pad_id))
        .collect();

    if let BatchOrder::Shuffled { seed } = order {
        let mut rng = StdRng::seed_from_u64(seed);
        batches.shuffle(&mut rng);
    }

    tracing::debug!(
        "Made {} batches from {} examples (batch_size={})",
        batches.len(),
        encoded.len(),
        batch_size
    );
    Ok(batches)
}

fn pad_group(
    group:   &[usize],
    encoded: &[Vec<u32>],
    labels:  Option<&[usize]>,
    pad_id:  u32,
) -> TextBatch {
    let seq_len = group.iter().map(|&i| encoded[i].len()).max().unwrap_or(0);

    let mut input_ids      = Vec::with_capacity(group.len());
    let mut attention_mask = Vec::with_capacity(group.len());
    for &i in group {
        let ids  = &encoded[i];
        let fill = seq_len - ids.len();

        let mut row = ids.clone();
        row.extend(std::iter::repeat(pad_id).take(fill));
        input_ids.push(row);

        let mut mask = vec![1u32; ids.len()];
        mask.extend(std::iter::repeat(0).take(fill));
        attention_mask.push(mask);
    }

    TextBatch {
        indices: group.to_vec(),
        input_ids,
        attention_mask,
        labels: labels.map(|l| group.iter().map(|&i| l[i]).collect()),
    }
}

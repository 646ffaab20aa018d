// ============================================================
// Layer 5 - Transformer Sequence Classifier
// ============================================================
// BERT-style encoder with a classification head:
//
//   input_ids [B, S] ─► token emb + position emb ─► dropout
//                    ─► N × EncoderBlock (pad positions masked)
//                    ─► final LayerNorm
//                    ─► take position 0 ([CLS]) ─► tanh pooler
//                    ─► dropout ─► Linear(d_model, num_classes)
//                    ─► logits [B, C]
//
// The attention mask from the batcher (1 = token, 0 = padding)
// becomes a boolean pad mask so padded positions never attend
// or get attended to. Each batch is only padded to its own
// longest row, so S varies from batch to batch; the position
// table only has to cover max_seq_len.

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, tanh},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, so do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub vocab_size:  usize,
    pub num_classes: usize,
    pub max_seq_len: usize,
    #[config(default = 256)]
    pub d_model:     usize,
    #[config(default = 8)]
    pub num_heads:   usize,
    #[config(default = 6)]
    pub num_layers:  usize,
    #[config(default = 1024)]
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerClassifier<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let pooler     = LinearConfig::new(self.d_model, self.d_model).init(device);
        let classifier = LinearConfig::new(self.d_model, self.num_classes).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        TransformerClassifier {
            token_embedding, position_embedding, layers,
            final_norm, pooler, classifier, dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `pad_mask`: [batch, seq_len], true where the position is padding
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let input = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct TransformerClassifier<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub pooler:             Linear<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

/// Logits plus the mean cross-entropy over the batch
pub struct ClassificationOutput<B: Backend> {
    pub loss:   Tensor<B, 1>,
    pub logits: Tensor<B, 2>,
}

impl<B: Backend> TransformerClassifier<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let pad_mask = attention_mask.equal_elem(0);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]

        // [CLS] sits at position 0 of every row
        let [_, _, d_model] = x.dims();
        let cls = x.slice([0..batch_size, 0..1, 0..d_model]).reshape([batch_size, d_model]);
        let pooled = tanh(self.pooler.forward(cls));

        self.classifier.forward(self.dropout.forward(pooled))
    }

    /// Forward pass plus cross-entropy against `targets` [batch]
    pub fn forward_classification(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        targets:        Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let logits = self.forward(input_ids, attention_mask);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        ClassificationOutput { loss, logits }
    }
}

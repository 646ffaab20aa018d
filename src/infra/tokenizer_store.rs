// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Decides which tokenizer a fit/pred call uses and keeps it on
// disk next to the checkpoints, so the vocabulary used for
// training is the one used for prediction.
//
// Resolution order:
//   1. An explicit pretrained tokenizer.json (e.g. a BERT
//      WordPiece vocabulary exported by HuggingFace)
//   2. {models_dir}/{model_name}_tokenizer.json from an earlier run
//   3. A word-level vocabulary built from the training texts
//
// In tokenizers 0.15, train_from_files requires Trainer::Model
// to equal ModelWrapper. Building the tokenizer JSON directly
// and loading it back sidesteps that mismatch entirely.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tokenizers::Tokenizer;

use crate::domain::error::{EngineError, EngineResult};

/// Ids below this are reserved; learned words start here
const FIRST_WORD_ID: usize = 104;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the tokenizer for `model_name` lives
    pub fn path_for(&self, model_name: &str) -> PathBuf {
        self.dir.join(format!("{model_name}_tokenizer.json"))
    }

    /// Pretrained file if given, else stored or freshly built vocabulary
    pub fn resolve(
        &self,
        pretrained: Option<&Path>,
        model_name: &str,
        texts:      &[String],
        vocab_size: usize,
    ) -> EngineResult<Tokenizer> {
        match pretrained {
            Some(path) => {
                tracing::info!("Using pretrained tokenizer '{}'", path.display());
                load_file(path)
            }
            None => self.load_or_build(model_name, texts, vocab_size),
        }
    }

    /// Load existing tokenizer or build a new one from texts
    pub fn load_or_build(
        &self,
        model_name: &str,
        texts:      &[String],
        vocab_size: usize,
    ) -> EngineResult<Tokenizer> {
        let tok_path = self.path_for(model_name);
        if tok_path.exists() {
            tracing::info!("Loading existing tokenizer from '{}'", tok_path.display());
            load_file(&tok_path)
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(&tok_path, texts, vocab_size)
        }
    }

    /// Build a word-level vocabulary from the texts and write a
    /// valid tokenizer JSON directly.
    fn build_and_save(
        &self,
        tok_path:   &Path,
        texts:      &[String],
        vocab_size: usize,
    ) -> EngineResult<Tokenizer> {
        std::fs::create_dir_all(&self.dir).map_err(|e| EngineError::io(&self.dir, e))?;

        // ── Step 1: Build vocabulary from word frequencies ────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in text.split_whitespace() {
                let w = word.to_lowercase();
                let w = w.trim_matches(|c: char| !c.is_alphanumeric());
                if !w.is_empty() {
                    *freq.entry(w.to_string()).or_insert(0) += 1;
                }
            }
        }

        // Most frequent first; ties broken alphabetically so the same
        // corpus always yields the same ids
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(FIRST_WORD_ID));

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::json!({
            "[PAD]":  0,
            "[UNK]":  1,
            "[CLS]":  101,
            "[SEP]":  102,
            "[MASK]": 103,
        });
        let mut next_id = FIRST_WORD_ID;
        for (word, _) in &words {
            if vocab.get(word).is_none() {
                vocab[word] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0,   "content": "[PAD]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1,   "content": "[UNK]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 101, "content": "[CLS]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 102, "content": "[SEP]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 103, "content": "[MASK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let json = serde_json::to_string_pretty(&tokenizer_json)?;
        std::fs::write(tok_path, json).map_err(|e| EngineError::io(tok_path, e))?;

        tracing::info!(
            "Tokenizer built with {} words, saved to '{}'",
            next_id - FIRST_WORD_ID,
            tok_path.display()
        );

        load_file(tok_path)
    }
}

/// Load a tokenizer JSON file
pub fn load_file(path: &Path) -> EngineResult<Tokenizer> {
    Tokenizer::from_file(path).map_err(|e| {
        EngineError::tokenizer(format!("cannot load tokenizer from '{}': {e}", path.display()))
    })
}

/// Embedding rows needed to cover every id the tokenizer can emit
pub fn embedding_rows(tokenizer: &Tokenizer) -> usize {
    tokenizer
        .get_vocab(true)
        .values()
        .copied()
        .max()
        .map(|id| id as usize + 1)
        .unwrap_or(FIRST_WORD_ID)
        .max(FIRST_WORD_ID)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "Book a table, please.".to_string(),
            "book the table".to_string(),
            "what is the weather".to_string(),
        ]
    }

    #[test]
    fn test_build_then_reuse() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(tmp.path());

        let tok = store.load_or_build("clf", &corpus(), 1000).unwrap();
        assert!(store.path_for("clf").exists());
        assert_eq!(tok.token_to_id("[CLS]"), Some(101));
        assert_eq!(tok.token_to_id("[PAD]"), Some(0));
        assert!(tok.token_to_id("table").is_some());

        // Second call must read the saved file, not rebuild from new texts
        let again = store.load_or_build("clf", &["zebra".to_string()], 1000).unwrap();
        assert_eq!(again.token_to_id("table"), tok.token_to_id("table"));
        assert!(again.token_to_id("zebra").is_none());
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let tmp = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(tmp.path())
            .load_or_build("clf", &corpus(), 1000)
            .unwrap();
        let enc = tok.encode("table zebra", false).unwrap();
        assert_eq!(enc.get_ids().len(), 2);
        assert_eq!(enc.get_ids()[1], 1);
    }

    #[test]
    fn test_vocab_limit_and_embedding_rows() {
        let tmp = tempfile::tempdir().unwrap();
        // Room for two learned words: of book/table/the (freq 2) the first two alphabetically
        let tok = TokenizerStore::new(tmp.path())
            .load_or_build("small", &corpus(), FIRST_WORD_ID + 2)
            .unwrap();
        assert!(tok.token_to_id("book").is_some());
        assert!(tok.token_to_id("weather").is_none());
        assert_eq!(embedding_rows(&tok), FIRST_WORD_ID + 2);
    }

    #[test]
    fn test_missing_pretrained_file_is_tokenizer_error() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(tmp.path());
        let err   = store
            .resolve(Some(&tmp.path().join("nope.json")), "m", &[], 10)
            .unwrap_err();
        assert!(matches!(err, EngineError::Tokenizer(_)));
    }
}

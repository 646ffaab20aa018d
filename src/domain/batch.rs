// ============================================================
// Layer 3 - Text Batch
// ============================================================
// One batch as produced by the batch source: token ids and
// attention masks padded to the batch's own longest sequence,
// optional labels, and the positions of each row in the
// caller's original text list.
//
// The tensors are built from this in Layer 5, so this type
// stays free of any framework type.

#[derive(Debug, Clone, PartialEq)]
pub struct TextBatch {
    /// Index of each row in the original input sequence
    pub indices:        Vec<usize>,
    /// `[rows][seq_len]` token ids, right padded
    pub input_ids:      Vec<Vec<u32>>,
    /// `[rows][seq_len]` 1 for real tokens, 0 for padding
    pub attention_mask: Vec<Vec<u32>>,
    /// One label per row, absent for pure inference
    pub labels:         Option<Vec<usize>>,
}

impl TextBatch {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Padded sequence length shared by every row
    pub fn seq_len(&self) -> usize {
        self.input_ids.first().map(Vec::len).unwrap_or(0)
    }

    /// Row-major flattening of `input_ids`, as tensor constructors expect
    pub fn flat_input_ids(&self) -> Vec<i32> {
        self.input_ids.iter().flatten().map(|&x| x as i32).collect()
    }

    pub fn flat_attention_mask(&self) -> Vec<i32> {
        self.attention_mask.iter().flatten().map(|&x| x as i32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_is_row_major() {
        let batch = TextBatch {
            indices:        vec![0, 1],
            input_ids:      vec![vec![101, 7, 102], vec![101, 102, 0]],
            attention_mask: vec![vec![1, 1, 1], vec![1, 1, 0]],
            labels:         Some(vec![1, 0]),
        };
        assert_eq!(batch.seq_len(), 3);
        assert_eq!(batch.flat_input_ids(), vec![101, 7, 102, 101, 102, 0]);
        assert_eq!(batch.flat_attention_mask(), vec![1, 1, 1, 1, 1, 0]);
    }
}

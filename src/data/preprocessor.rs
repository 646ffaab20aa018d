// ============================================================
// Layer 4 - Text Preprocessor
// ============================================================
// Normalises one CSV text cell before tokenisation.
//
// Spreadsheet exports often carry:
//   - Non-breaking spaces (U+00A0) and zero-width spaces (U+200B)
//   - Byte order marks at the start of the first cell
//   - Embedded line breaks and tabs inside quoted cells
//   - Runs of spaces from manual alignment
//
// Each example is classified as a single sequence, so line
// structure carries no meaning here: every kind of whitespace
// becomes one plain space.
//
// Cleaning steps (applied in order):
//   1. Map Unicode whitespace variants and control chars to ' '
//   2. Collapse runs of spaces into one
//   3. Trim both ends

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw text cell for downstream tokenisation.
    pub fn clean(&self, text: &str) -> String {
        // ── Step 1: Normalise individual characters ───────────────────────────
        let normalised = text.chars().map(|c| match c {
            '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
            c if c.is_whitespace() || c.is_control() => ' ',
            c => c,
        });

        // ── Step 2: Collapse runs of spaces ───────────────────────────────────
        let mut out        = String::with_capacity(text.len());
        let mut last_space = false;
        for c in normalised {
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // ── Step 3: Trim ──────────────────────────────────────────────────────
        out.trim().to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

//! Deterministic lorem-ipsum generator used as a benchmark corpus.
//!
//! Seeded LCG over a fixed word pool, so every run of `tsq b` measures the
//! same bytes: compressible, text-like, and free of any external data files.

static WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in",
    "reprehenderit", "voluptate", "velit", "esse", "cillum", "eu", "fugiat", "nulla", "pariatur",
    "excepteur", "sint", "occaecat", "cupidatat", "non", "proident", "sunt", "culpa", "qui",
    "officia", "deserunt", "mollit", "anim", "id", "est", "laborum",
];

/// Deterministic word-stream generator.
pub struct LoremIpsum {
    state: u64,
    sentence_word: u32,
}

impl LoremIpsum {
    pub fn new(seed: u64) -> Self {
        LoremIpsum {
            state: seed.wrapping_mul(2_862_933_555_777_941_757).wrapping_add(1),
            sentence_word: 0,
        }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(2_862_933_555_777_941_757)
            .wrapping_add(3_037_000_493);
        (self.state >> 33) as u32
    }

    /// Append words until `out` reaches `target` bytes (the last word may
    /// run slightly past; the output is truncated to `target`).
    pub fn fill(&mut self, out: &mut Vec<u8>, target: usize) {
        while out.len() < target {
            let w = WORDS[(self.next_u32() as usize) % WORDS.len()];
            if self.sentence_word == 0 {
                let mut chars = w.chars();
                if let Some(c) = chars.next() {
                    out.extend(c.to_uppercase().to_string().as_bytes());
                    out.extend(chars.as_str().as_bytes());
                }
            } else {
                out.extend(w.as_bytes());
            }
            self.sentence_word += 1;
            // Sentences of 7..=14 words.
            if self.sentence_word >= 7 + self.next_u32() % 8 {
                out.extend(b". ");
                self.sentence_word = 0;
            } else {
                out.push(b' ');
            }
        }
        out.truncate(target);
    }
}

/// Generate `size` bytes of deterministic text for seed `seed`.
pub fn generate(seed: u64, size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(size + 16);
    LoremIpsum::new(seed).fill(&mut out, size);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        assert_eq!(generate(7, 4096), generate(7, 4096));
        assert_ne!(generate(7, 4096), generate(8, 4096));
    }

    #[test]
    fn exact_requested_length() {
        for n in [0usize, 1, 100, 65_536] {
            assert_eq!(generate(1, n).len(), n);
        }
    }

    #[test]
    fn output_is_ascii_text() {
        let text = generate(3, 10_000);
        assert!(text.iter().all(|b| b.is_ascii()));
        assert!(text.windows(2).any(|w| w == b". "));
    }
}

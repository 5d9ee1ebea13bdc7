//! Token-bounded splitting of the rendered paper.
//!
//! The text is cut on line boundaries first. A line that is larger than
//! the budget on its own is cut between words, and a word larger than the
//! budget is cut between characters. The resulting pieces are then packed
//! greedily into chunks, with consecutive chunks sharing a few trailing
//! pieces so that no sentence loses its context at a cut point.
//!
//! Chunks are contiguous slices of the input: the input is recovered as
//! `chunks[0].text` followed by `chunk.text[chunk.overlap..]` for every
//! later chunk.

use std::ops::Range;

use tracing::trace;

use crate::tokenizer::Tokenizer;

/// A contiguous slice of the rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position among the chunks of one split, from 0.
    pub index: usize,
    pub text: String,
    /// Byte offset of `text` in the input.
    pub start: usize,
    /// Length in bytes of the prefix of `text` shared with the previous chunk.
    pub overlap: usize,
}

impl Chunk {
    /// The part of the chunk not already covered by the previous chunk.
    pub fn fresh_text(&self) -> &str {
        &self.text[self.overlap..]
    }
}

/// Splits text into chunks of at most `budget` tokens.
#[derive(Debug, Clone)]
pub struct ContextSplitter {
    tokenizer: Tokenizer,
    overlap_tokens: usize,
}

/// An atomic slice of the input and its token count on its own.
#[derive(Debug, Clone)]
struct Piece {
    range: Range<usize>,
    tokens: usize,
}

impl ContextSplitter {
    pub fn new(tokenizer: Tokenizer, overlap_tokens: usize) -> Self {
        Self {
            tokenizer,
            overlap_tokens,
        }
    }

    /// Split `text` into chunks of at most `budget` tokens each.
    ///
    /// Pure in `(text, budget)`: calling again with a smaller budget is
    /// how the caller shrinks chunks. Empty text yields no chunk. A budget
    /// of 0 is treated as 1.
    ///
    /// Each piece is tokenized once. Chunk ends are first estimated from
    /// the summed piece counts, then settled with a logarithmic number of
    /// exact counts, so the cost stays close to linear in the text.
    pub fn split(&self, text: &str, budget: usize) -> Vec<Chunk> {
        let budget = budget.max(1);
        let pieces = self.pieces(text, budget);
        let mut prefix = Vec::with_capacity(pieces.len() + 1);
        prefix.push(0usize);
        for piece in &pieces {
            prefix.push(prefix[prefix.len() - 1] + piece.tokens);
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut first = 0;
        let mut floor = 0;
        let mut previous_end: usize = 0;
        while first < pieces.len() {
            let start = pieces[first].range.start;
            let last = self.cut(text, &pieces, &prefix, first, floor.max(first), budget);
            let end = pieces[last].range.end;

            chunks.push(Chunk {
                index: chunks.len(),
                text: text[start..end].to_string(),
                start,
                overlap: previous_end.saturating_sub(start),
            });
            trace!(index = chunks.len() - 1, start, end, "Cut chunk");

            previous_end = end;
            floor = last + 1;
            first = self.next_start(text, &pieces, first, last, budget);
        }

        chunks
    }

    fn fits(&self, text: &str, range: Range<usize>, budget: usize) -> bool {
        self.tokenizer.count(&text[range]) <= budget
    }

    /// Last piece of the chunk starting at `first`.
    ///
    /// `floor` is known to fit. The guess from summed piece counts is
    /// checked exactly, then widened or narrowed by galloping search.
    fn cut(&self, text: &str, pieces: &[Piece], prefix: &[usize], first: usize, floor: usize, budget: usize) -> usize {
        let start = pieces[first].range.start;
        let max = pieces.len() - 1;
        let fits = |last: usize| self.fits(text, start..pieces[last].range.end, budget);

        let ceiling = prefix[first] + budget;
        let guess = prefix
            .partition_point(|&p| p <= ceiling)
            .saturating_sub(2)
            .clamp(floor, max);

        if guess == floor || fits(guess) {
            gallop(guess, max, fits)
        } else {
            bisect(floor, guess, fits)
        }
    }

    /// First piece of the chunk after the one spanning `first..=last`.
    ///
    /// Walks back over the trailing pieces of the current chunk while they
    /// stay within the overlap, then backs off until the next new piece
    /// still fits after them.
    fn next_start(&self, text: &str, pieces: &[Piece], first: usize, last: usize, budget: usize) -> usize {
        let Some(next) = pieces.get(last + 1) else {
            return pieces.len();
        };
        let end = pieces[last].range.end;

        let mut shared = last + 1;
        for s in (first + 1..=last).rev() {
            if self.tokenizer.count(&text[pieces[s].range.start..end]) > self.overlap_tokens {
                break;
            }
            shared = s;
        }

        (shared..=last)
            .find(|&s| self.fits(text, pieces[s].range.start..next.range.end, budget))
            .unwrap_or(last + 1)
    }

    /// Atomic pieces: lines, or smaller when a line exceeds the budget.
    fn pieces(&self, text: &str, budget: usize) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let range = offset..offset + line.len();
            offset = range.end;
            let tokens = self.tokenizer.count(line);
            if tokens <= budget {
                pieces.push(Piece { range, tokens });
            } else {
                self.split_words(text, range, budget, &mut pieces);
            }
        }
        pieces
    }

    /// Break an oversized line into its words, and oversized words further.
    fn split_words(&self, text: &str, line: Range<usize>, budget: usize, out: &mut Vec<Piece>) {
        for word in word_ranges(text, line) {
            let tokens = self.tokenizer.count(&text[word.clone()]);
            if tokens <= budget {
                out.push(Piece { range: word, tokens });
            } else {
                self.split_chars(text, word, budget, out);
            }
        }
    }

    /// Cut an oversized word at the longest char-boundary prefix that fits.
    fn split_chars(&self, text: &str, word: Range<usize>, budget: usize, out: &mut Vec<Piece>) {
        let mut start = word.start;
        while start < word.end {
            let bounds: Vec<usize> = text[start..word.end]
                .char_indices()
                .map(|(i, c)| start + i + c.len_utf8())
                .collect();

            // Always take at least one char so the loop makes progress.
            let best = gallop(0, bounds.len() - 1, |i| self.fits(text, start..bounds[i], budget));
            let range = start..bounds[best];
            out.push(Piece {
                tokens: self.tokenizer.count(&text[range.clone()]),
                range,
            });
            start = bounds[best];
        }
    }
}

/// Largest index in `from..=max` accepted by `fits`, given that `from` is.
/// Doubles the step until a candidate fails, then bisects.
fn gallop(from: usize, max: usize, fits: impl Fn(usize) -> bool) -> usize {
    let mut lo = from;
    let mut step = 1;
    while lo < max {
        let next = (lo + step).min(max);
        if !fits(next) {
            return bisect(lo, next, fits);
        }
        lo = next;
        step *= 2;
    }
    lo
}

/// Largest index in `lo..hi` accepted by `fits`, given that `lo` is and
/// `hi` is not.
fn bisect(mut lo: usize, mut hi: usize, fits: impl Fn(usize) -> bool) -> usize {
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Words of `line`, each carrying its trailing whitespace.
fn word_ranges(text: &str, line: Range<usize>) -> Vec<Range<usize>> {
    let mut words = Vec::new();
    let mut start = line.start;
    let mut in_space = false;
    for (i, c) in text[line.clone()].char_indices() {
        let at = line.start + i;
        if c.is_whitespace() {
            in_space = true;
        } else if in_space {
            words.push(start..at);
            start = at;
            in_space = false;
        }
    }
    if start < line.end {
        words.push(start..line.end);
    }
    words
}

//! BM25 sparse retrieval over chunk content.
//!
//! Provides an inverted index with Okapi BM25 scoring for first-stage
//! keyword retrieval.
//!
//! # Tokenization
//!
//! Chunk content and queries are lowercased and split on whitespace. No
//! stemming, no stop words: the index scores exactly what the corpus says.
//!
//! # BM25 Formula
//!
//! ```text
//! BM25(q, d) = Σ IDF(q_i) * (f(q_i, d) * (k1 + 1)) / (f(q_i, d) + k1 * (1 - b + b * |d|/avgdl))
//! ```
//!
//! Where:
//! - `f(q_i, d)` = frequency of term q_i in document d
//! - `|d|` = length of document d
//! - `avgdl` = average document length in the collection
//! - `k1` = term frequency saturation parameter (default 1.2)
//! - `b` = length normalization parameter (default 0.75)
//!
//! The IDF uses `ln((N - df + 0.5) / (df + 0.5) + 1.0)`: the `+ 1.0` inside
//! the logarithm keeps IDF positive for very common terms, so all scores
//! are non-negative.

use std::collections::HashMap;

use hcr_core::Chunk;

/// BM25 parameters.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term frequency saturation parameter (k1). Default: 1.2
    pub k1: f32,
    /// Length normalization parameter (b). Default: 0.75
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Lowercase whitespace tokenization shared by indexing and querying.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// BM25 index over chunks for sparse keyword retrieval.
///
/// Rows are addressed by corpus position internally; the public API speaks
/// chunk identifiers.
pub struct Bm25Index {
    /// Chunk identifiers in corpus order (row -> id).
    chunk_ids: Vec<String>,

    /// Term -> (row -> term frequency)
    postings: HashMap<String, HashMap<u32, u32>>,

    /// Row -> document length (in terms)
    doc_lengths: Vec<u32>,

    /// Average document length
    avg_doc_length: f32,

    /// Document frequency for each term (for IDF calculation)
    doc_frequencies: HashMap<String, u32>,

    params: Bm25Params,
}

impl Bm25Index {
    /// Build an index over `chunks` with default parameters.
    pub fn new(chunks: &[Chunk]) -> Self {
        Self::with_params(chunks, Bm25Params::default())
    }

    /// Build an index over `chunks` with explicit parameters.
    pub fn with_params(chunks: &[Chunk], params: Bm25Params) -> Self {
        let mut index = Self {
            chunk_ids: Vec::with_capacity(chunks.len()),
            postings: HashMap::new(),
            doc_lengths: Vec::with_capacity(chunks.len()),
            avg_doc_length: 0.0,
            doc_frequencies: HashMap::new(),
            params,
        };

        for (row, chunk) in chunks.iter().enumerate() {
            let terms = tokenize(&chunk.content);
            index.chunk_ids.push(chunk.id.clone());
            index.doc_lengths.push(terms.len() as u32);

            let mut term_freqs: HashMap<String, u32> = HashMap::new();
            for term in terms {
                *term_freqs.entry(term).or_insert(0) += 1;
            }
            for (term, freq) in term_freqs {
                index
                    .postings
                    .entry(term.clone())
                    .or_default()
                    .insert(row as u32, freq);
                *index.doc_frequencies.entry(term).or_insert(0) += 1;
            }
        }

        let total: u32 = index.doc_lengths.iter().sum();
        if !index.doc_lengths.is_empty() {
            index.avg_doc_length = total as f32 / index.doc_lengths.len() as f32;
        }

        index
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunk_ids.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunk_ids.is_empty()
    }

    /// Inverse document frequency of a term.
    ///
    /// `ln((N - df + 0.5) / (df + 0.5) + 1.0)`; zero for unseen terms.
    pub fn idf(&self, term: &str) -> f32 {
        let df = self.doc_frequencies.get(term).copied().unwrap_or(0) as f32;
        if df == 0.0 {
            return 0.0;
        }
        let n = self.chunk_ids.len() as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Score one row against precomputed query-term IDFs.
    fn score_row(&self, row: u32, query_terms: &[String], query_idfs: &[f32]) -> f32 {
        if self.avg_doc_length == 0.0 {
            return 0.0;
        }

        let doc_length = self.doc_lengths[row as usize] as f32;
        let mut score = 0.0;

        for (term, &idf) in query_terms.iter().zip(query_idfs.iter()) {
            if idf == 0.0 {
                continue;
            }
            let tf = self
                .postings
                .get(term)
                .and_then(|postings| postings.get(&row))
                .copied()
                .unwrap_or(0) as f32;
            if tf == 0.0 {
                continue;
            }

            let numerator = tf * (self.params.k1 + 1.0);
            let denominator = tf
                + self.params.k1
                    * (1.0 - self.params.b + self.params.b * doc_length / self.avg_doc_length);
            score += idf * numerator / denominator;
        }

        score
    }

    /// Retrieve the top-k chunks for a query.
    ///
    /// Every chunk is scored (zero when no query term matches), so the
    /// output length is `min(top_k, N)` and the tiebreak among equal scores
    /// is corpus input order. Scores are non-negative and sorted descending.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hcr_core::Chunk;
    /// use hcr_retrieve::Bm25Index;
    ///
    /// let chunks = vec![
    ///     Chunk::new("c-0", "doc", "machine learning", 2).unwrap(),
    ///     Chunk::new("c-1", "doc", "web servers", 2).unwrap(),
    /// ];
    /// let index = Bm25Index::new(&chunks);
    /// let results = index.search("machine", 10);
    /// assert_eq!(results[0].0, "c-0");
    /// ```
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(String, f32)> {
        if self.chunk_ids.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let query_terms = tokenize(query);
        let query_idfs: Vec<f32> = query_terms.iter().map(|t| self.idf(t)).collect();

        let mut scored: Vec<(String, f32)> = self
            .chunk_ids
            .iter()
            .enumerate()
            .map(|(row, id)| {
                (
                    id.clone(),
                    self.score_row(row as u32, &query_terms, &query_idfs),
                )
            })
            .collect();

        // Stable sort keeps input order for tied scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

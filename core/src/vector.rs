//! Ranked retrieval over a frequency index.

use crate::error::{Error, Result};
use crate::index::{DocId, FrequencyMap, TermId};
use crate::reader::FrequencyReader;
use crate::weighting::{FreqProfile, Weighting};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub name: String,
    pub score: f64,
}

/// Number of occurrences of each distinct query token, unknown tokens included.
pub fn query_vector(tokens: &[String]) -> BTreeMap<&str, u32> {
    let mut counts = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts
}

/// The `limit` best documents of [`score_all`].
pub fn rank(tokens: &[String], reader: &FrequencyReader, weighting: &Weighting, limit: usize) -> Result<Vec<(DocId, f64)>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let mut scored = score_all(tokens, reader, weighting)?;
    scored.truncate(limit);
    Ok(scored)
}

/// Score every document sharing a term with the query; best first, ties by ascending id.
pub fn score_all(tokens: &[String], reader: &FrequencyReader, weighting: &Weighting) -> Result<Vec<(DocId, f64)>> {
    let query = query_vector(tokens);
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let query_profile = FreqProfile::of(query.values().copied());
    let distinct: Vec<String> = query.keys().map(|t| t.to_string()).collect();
    let postings = reader.find_postings(&distinct)?;
    if postings.is_empty() {
        return Ok(Vec::new());
    }

    let total_docs = reader.index().num_documents()?;
    let candidates: BTreeSet<DocId> = postings.values().flat_map(|p| p.keys().copied()).collect();
    let candidate_list: Vec<DocId> = candidates.iter().copied().collect();
    let doc_vectors = reader.related_terms(&candidate_list)?;
    let doc_freqs = reader.doc_freqs()?;
    let profiles: BTreeMap<DocId, FreqProfile> = doc_vectors
        .iter()
        .map(|(&doc, vector)| (doc, FreqProfile::of(vector.values().copied())))
        .collect();

    let mut dots: BTreeMap<DocId, f64> = BTreeMap::new();
    let mut query_weights = Vec::with_capacity(postings.len());
    for (term, &query_freq) in &query {
        let Some(posting) = postings.get(*term) else {
            continue;
        };
        let idf = weighting.idf.weight(posting.len() as u32, total_docs);
        let wq = weighting.tf.weight(query_freq, &query_profile) * idf;
        query_weights.push(wq);
        for (doc, &freq) in posting {
            let wd = weighting.tf.weight(freq, &profiles[doc]) * idf;
            *dots.entry(*doc).or_insert(0.0) += wd * wq;
        }
    }

    let mut scored = Vec::with_capacity(candidate_list.len());
    for doc in candidate_list {
        let doc_weights = document_weights(&doc_vectors[&doc], &profiles[&doc], &doc_freqs, total_docs, weighting)?;
        let dot = dots.get(&doc).copied().unwrap_or(0.0);
        scored.push((doc, weighting.similarity.score(dot, &query_weights, &doc_weights)));
    }
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    debug!(candidates = scored.len(), %weighting, "scored query");
    Ok(scored)
}

fn document_weights(
    vector: &FrequencyMap,
    profile: &FreqProfile,
    doc_freqs: &BTreeMap<TermId, u32>,
    total_docs: u32,
    weighting: &Weighting,
) -> Result<Vec<f64>> {
    vector
        .iter()
        .map(|(term, &freq)| {
            let df = doc_freqs
                .get(term)
                .ok_or_else(|| Error::integrity(format!("term id {term} has no postings record")))?;
            Ok(weighting.tf.weight(freq, profile) * weighting.idf.weight(*df, total_docs))
        })
        .collect()
}

/// Rank `tokens` and attach document names.
pub fn search(tokens: &[String], reader: &FrequencyReader, weighting: &Weighting, limit: usize) -> Result<Vec<ScoredDocument>> {
    attach_names(rank(tokens, reader, weighting, limit)?, reader)
}

pub fn attach_names(ranked: Vec<(DocId, f64)>, reader: &FrequencyReader) -> Result<Vec<ScoredDocument>> {
    let ids: Vec<DocId> = ranked.iter().map(|(doc, _)| *doc).collect();
    let names = reader.index().document_names(&ids)?;
    Ok(ranked
        .into_iter()
        .zip(names)
        .map(|((doc_id, score), name)| ScoredDocument { doc_id, name, score })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_vector_counts_every_token() {
        let tokens: Vec<String> = ["cat", "zebra", "cat"].iter().map(|s| s.to_string()).collect();
        let counts = query_vector(&tokens);
        assert_eq!(counts["cat"], 2);
        assert_eq!(counts["zebra"], 1);
    }
}

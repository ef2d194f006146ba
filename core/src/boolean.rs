//! Boolean retrieval over a presence index.
//!
//! A query is in disjunctive normal form: clauses are OR-ed, the literals of a clause are
//! AND-ed, and a literal written `-term` is negated. Results carry no ranking and come back
//! in ascending document id order.

use crate::error::{Error, Result};
use crate::index::DocId;
use crate::reader::PresenceReader;
use crate::tokenizer::Tokenizer;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub term: String,
    pub negated: bool,
}

impl Literal {
    pub fn positive(term: impl Into<String>) -> Self {
        Self { term: term.into(), negated: false }
    }

    pub fn negative(term: impl Into<String>) -> Self {
        Self { term: term.into(), negated: true }
    }
}

impl FromStr for Literal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (term, negated) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if term.is_empty() {
            return Err(Error::format("boolean query", format!("missing term in literal `{s}`")));
        }
        Ok(Self { term: term.to_string(), negated })
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "NOT {}", self.term)
        } else {
            f.write_str(&self.term)
        }
    }
}

/// A conjunction of literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    /// Literals with every positive one ahead of every negated one, otherwise in input order.
    pub fn evaluation_order(&self) -> Vec<&Literal> {
        let mut ordered: Vec<&Literal> = self.literals.iter().collect();
        ordered.sort_by_key(|l| l.negated);
        ordered
    }

    fn write_with(&self, f: &mut fmt::Formatter<'_>, parenthesized: bool) -> fmt::Result {
        if parenthesized {
            f.write_str("( ")?;
        }
        for (i, literal) in self.literals.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{literal}")?;
        }
        if parenthesized {
            f.write_str(" )")?;
        }
        Ok(())
    }
}

impl FromStr for Clause {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let literals = s
            .split_whitespace()
            .map(Literal::from_str)
            .collect::<Result<Vec<_>>>()?;
        if literals.is_empty() {
            return Err(Error::format("boolean query", "empty clause"));
        }
        Ok(Self { literals })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnfQuery {
    pub clauses: Vec<Clause>,
}

impl DnfQuery {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    /// One clause per line, as in query files and the interactive session.
    pub fn from_clause_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let clauses = lines
            .into_iter()
            .map(|line| line.as_ref().parse())
            .collect::<Result<Vec<Clause>>>()?;
        if clauses.is_empty() {
            return Err(Error::format("boolean query", "no clause"));
        }
        Ok(Self { clauses })
    }

    /// Apply the index's term normalization to every literal.
    pub fn normalized(&self, tokenizer: &Tokenizer) -> Self {
        let clauses = self
            .clauses
            .iter()
            .map(|clause| {
                Clause::new(
                    clause
                        .literals
                        .iter()
                        .map(|l| Literal { term: tokenizer.normalize(&l.term), negated: l.negated })
                        .collect(),
                )
            })
            .collect();
        Self { clauses }
    }
}

/// Parses `a -b | c`: clauses separated by `|`.
impl FromStr for DnfQuery {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_clause_lines(s.split('|'))
    }
}

/// Renders `( a AND NOT b ) OR c`.
impl fmt::Display for DnfQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let several = self.clauses.len() > 1;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            clause.write_with(f, several && clause.literals.len() > 1)?;
        }
        Ok(())
    }
}

/// Document sets the evaluator needs from an index.
pub trait DocumentSets {
    /// Documents containing an already normalized term; empty for unknown terms.
    fn find_documents(&self, term: &str) -> Result<BTreeSet<DocId>>;

    fn all_documents(&self) -> Result<BTreeSet<DocId>>;
}

impl DocumentSets for PresenceReader {
    fn find_documents(&self, term: &str) -> Result<BTreeSet<DocId>> {
        PresenceReader::find_documents(self, term)
    }

    fn all_documents(&self) -> Result<BTreeSet<DocId>> {
        self.index().all_documents()
    }
}

fn evaluate_clause<S: DocumentSets + ?Sized>(clause: &Clause, index: &S) -> Result<BTreeSet<DocId>> {
    let ordered = clause.evaluation_order();
    let Some((first, rest)) = ordered.split_first() else {
        return Ok(BTreeSet::new());
    };
    let mut docs = if first.negated {
        let excluded = index.find_documents(&first.term)?;
        let mut universe = index.all_documents()?;
        universe.retain(|doc| !excluded.contains(doc));
        universe
    } else {
        index.find_documents(&first.term)?
    };

    for literal in rest {
        if docs.is_empty() {
            break;
        }
        let postings = index.find_documents(&literal.term)?;
        if literal.negated {
            docs.retain(|doc| !postings.contains(doc));
        } else {
            docs.retain(|doc| postings.contains(doc));
        }
    }
    Ok(docs)
}

/// Ids of the documents matching `query`, ascending. Terms are used as given.
pub fn evaluate<S: DocumentSets + ?Sized>(query: &DnfQuery, index: &S) -> Result<BTreeSet<DocId>> {
    let mut matches = BTreeSet::new();
    for clause in &query.clauses {
        let docs = evaluate_clause(clause, index)?;
        debug!(clause = ?clause.literals, hits = docs.len(), "evaluated clause");
        matches.extend(docs);
    }
    Ok(matches)
}

/// Normalize, evaluate and name the matches of `query`, in ascending document id order.
pub fn search(query: &DnfQuery, reader: &PresenceReader) -> Result<Vec<String>> {
    let normalized = query.normalized(reader.index().tokenizer());
    let ids: Vec<DocId> = evaluate(&normalized, reader)?.into_iter().collect();
    reader.index().document_names(&ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory postings that record which terms were looked up.
    struct Postings {
        docs: HashMap<&'static str, BTreeSet<DocId>>,
        universe: u32,
        lookups: RefCell<Vec<String>>,
    }

    impl Postings {
        fn new(universe: u32, entries: &[(&'static str, &[DocId])]) -> Self {
            Self {
                docs: entries.iter().map(|(t, d)| (*t, d.iter().copied().collect())).collect(),
                universe,
                lookups: RefCell::new(Vec::new()),
            }
        }
    }

    impl DocumentSets for Postings {
        fn find_documents(&self, term: &str) -> Result<BTreeSet<DocId>> {
            self.lookups.borrow_mut().push(term.to_string());
            Ok(self.docs.get(term).cloned().unwrap_or_default())
        }

        fn all_documents(&self) -> Result<BTreeSet<DocId>> {
            Ok((0..self.universe).collect())
        }
    }

    fn sample() -> Postings {
        Postings::new(
            6,
            &[("cat", &[0, 2, 4]), ("dog", &[0, 1]), ("a", &[1, 2, 3]), ("b", &[2, 3, 5]), ("c", &[0])],
        )
    }

    fn ids(set: BTreeSet<DocId>) -> Vec<DocId> {
        set.into_iter().collect()
    }

    #[test]
    fn negation_is_a_set_difference() {
        let query: DnfQuery = "cat -dog".parse().unwrap();
        assert_eq!(ids(evaluate(&query, &sample()).unwrap()), vec![2, 4]);
    }

    #[test]
    fn clauses_are_united() {
        let query: DnfQuery = "a b | c".parse().unwrap();
        assert_eq!(ids(evaluate(&query, &sample()).unwrap()), vec![0, 2, 3]);
    }

    #[test]
    fn all_negative_clause_starts_from_the_universe() {
        let query: DnfQuery = "-cat -dog".parse().unwrap();
        assert_eq!(ids(evaluate(&query, &sample()).unwrap()), vec![3, 5]);
    }

    #[test]
    fn empty_positive_literal_short_circuits() {
        let index = sample();
        let query: DnfQuery = "-dog zebra cat".parse().unwrap();
        assert!(evaluate(&query, &index).unwrap().is_empty());
        assert_eq!(*index.lookups.borrow(), vec!["zebra".to_string()]);
    }

    #[test]
    fn negated_literals_are_evaluated_last() {
        let clause: Clause = "-x a -y b".parse().unwrap();
        let order: Vec<String> = clause.evaluation_order().iter().map(|l| l.to_string()).collect();
        assert_eq!(order, vec!["a", "b", "NOT x", "NOT y"]);
    }

    #[test]
    fn display_matches_the_session_echo() {
        let query: DnfQuery = "a -b | c".parse().unwrap();
        assert_eq!(query.to_string(), "( a AND NOT b ) OR c");
        let single: DnfQuery = "a -b".parse().unwrap();
        assert_eq!(single.to_string(), "a AND NOT b");
    }

    #[test]
    fn malformed_queries_are_rejected() {
        assert!("a | | c".parse::<DnfQuery>().unwrap_err().is_format());
        assert!("a -".parse::<DnfQuery>().unwrap_err().is_format());
        assert!("".parse::<DnfQuery>().unwrap_err().is_format());
    }

    #[test]
    fn normalization_lowercases_and_stems() {
        let query: DnfQuery = "Cats -Running".parse().unwrap();
        let normalized = query.normalized(&Tokenizer::default());
        assert_eq!(normalized.to_string(), "cat AND NOT run");
    }
}

//! Query file formats.
//!
//! Boolean files hold records `.I <n>` followed by exactly `n` clause lines. Vector files
//! hold free text after a `.W` marker line, up to the next `.I`, `.W`, `.A` or `.N` marker.

use crate::boolean::{Clause, DnfQuery};
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const VECTOR_TERMINATORS: [&str; 4] = [".I", ".W", ".A", ".N"];

pub fn read_boolean_queries(path: &Path) -> Result<Vec<DnfQuery>> {
    parse_boolean_queries(BufReader::new(File::open(path)?))
}

pub fn parse_boolean_queries<R: BufRead>(input: R) -> Result<Vec<DnfQuery>> {
    let mut lines = input.lines().enumerate();
    let mut queries = Vec::new();
    while let Some((n, line)) = lines.next() {
        let line = line?;
        let Some(count) = line.strip_prefix(".I") else {
            continue;
        };
        let count: usize = count
            .trim()
            .parse()
            .map_err(|_| Error::format("boolean query file", format!("line {}: bad clause count `{line}`", n + 1)))?;

        let mut clauses = Vec::with_capacity(count);
        for _ in 0..count {
            let (n, clause) = lines.next().ok_or_else(|| {
                Error::format("boolean query file", format!("query {} ends before its {count} clauses", queries.len() + 1))
            })?;
            let clause = clause?;
            if clause.trim().is_empty() {
                return Err(Error::format("boolean query file", format!("line {}: missing literal", n + 1)));
            }
            clauses.push(clause.parse::<Clause>()?);
        }
        queries.push(DnfQuery::new(clauses));
    }
    Ok(queries)
}

pub fn read_vector_queries(path: &Path) -> Result<Vec<String>> {
    parse_vector_queries(BufReader::new(File::open(path)?))
}

pub fn parse_vector_queries<R: BufRead>(input: R) -> Result<Vec<String>> {
    let mut queries = Vec::new();
    let mut current: Option<String> = None;
    for line in input.lines() {
        let line = line?;
        if VECTOR_TERMINATORS.iter().any(|m| line.starts_with(m)) {
            if let Some(body) = current.take() {
                queries.push(body);
            }
            if line.starts_with(".W") {
                current = Some(String::new());
            }
        } else if let Some(body) = current.as_mut() {
            body.push_str(&line);
            body.push('\n');
        }
    }
    queries.extend(current);
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_records() {
        let text = ".I 2\ncat -dog\nbird\n\n.I 1\nfish\n";
        let queries = parse_boolean_queries(text.as_bytes()).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].to_string(), "( cat AND NOT dog ) OR bird");
        assert_eq!(queries[1].to_string(), "fish");
    }

    #[test]
    fn boolean_clause_count_mismatch_fails() {
        assert!(parse_boolean_queries(".I 3\ncat\ndog\n".as_bytes()).unwrap_err().is_format());
        assert!(parse_boolean_queries(".I 2\ncat\n\ndog\n".as_bytes()).unwrap_err().is_format());
        assert!(parse_boolean_queries(".I two\ncat\n".as_bytes()).unwrap_err().is_format());
    }

    #[test]
    fn vector_bodies_stop_at_markers() {
        let text = ".I 1\n.W\nfirst query\nspans lines\n.N\nnotes\n.I 2\n.W\nsecond\n";
        let queries = parse_vector_queries(text.as_bytes()).unwrap();
        assert_eq!(queries, vec!["first query\nspans lines\n", "second\n"]);
    }

    #[test]
    fn text_before_any_body_is_ignored() {
        let queries = parse_vector_queries(".I 1\n.T\ntitle\n".as_bytes()).unwrap();
        assert!(queries.is_empty());
    }
}

//! Query front-end shared by the interactive session, batch runs and one-shot searches.

use anyhow::Result;
use sift_core::boolean::{self, Clause, DnfQuery};
use sift_core::reader::{FrequencyReader, IndexReader, PresenceReader};
use sift_core::vector;
use sift_core::weighting::Weighting;
use sift_core::IndexKind;
use std::io::{BufRead, Write};
use std::path::Path;

const RULE: &str = "______________________";

/// The engine matching the opened index.
pub enum Engine {
    Boolean(PresenceReader),
    Vector {
        reader: FrequencyReader,
        weighting: Weighting,
        limit: usize,
    },
}

/// A processed query: its echo and the names of the matching documents, best first.
pub struct Answer {
    pub echo: String,
    pub hits: Vec<String>,
}

impl Engine {
    pub fn open(index: &Path, weighting: Weighting, limit: usize) -> Result<Self> {
        let index = IndexReader::open(index)?;
        Ok(match index.kind() {
            IndexKind::Presence => Engine::Boolean(PresenceReader::from_index(index)?),
            IndexKind::Frequency => Engine::Vector {
                reader: FrequencyReader::from_index(index)?,
                weighting,
                limit,
            },
        })
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            Engine::Boolean(_) => IndexKind::Presence,
            Engine::Vector { .. } => IndexKind::Frequency,
        }
    }

    pub fn run_boolean(&self, query: &DnfQuery) -> Result<Answer> {
        let Engine::Boolean(reader) = self else {
            anyhow::bail!("boolean queries need a presence index");
        };
        Ok(Answer {
            echo: query.to_string(),
            hits: boolean::search(query, reader)?,
        })
    }

    pub fn run_text(&self, text: &str) -> Result<Answer> {
        match self {
            Engine::Boolean(_) => self.run_boolean(&text.parse()?),
            Engine::Vector { reader, weighting, limit } => {
                let tokens = reader.index().tokenizer().tokenize(text);
                let hits = vector::search(&tokens, reader, weighting, *limit)?;
                Ok(Answer {
                    echo: tokens.join(" "),
                    hits: hits.into_iter().map(|h| h.name).collect(),
                })
            }
        }
    }
}

/// Line-oriented operator dialogue.
pub struct Session<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// `None` once the input is exhausted.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask until the answer is `y` or `n`.
    fn confirm(&mut self, question: &str) -> Result<Option<bool>> {
        writeln!(self.output, "{question} (Y/N)")?;
        loop {
            let Some(answer) = self.read_line()? else {
                return Ok(None);
            };
            match answer.trim().to_lowercase().as_str() {
                "y" => return Ok(Some(true)),
                "n" => return Ok(Some(false)),
                _ => writeln!(self.output, "Invalid answer. {question} (Y/N)")?,
            }
        }
    }

    pub fn print_answer(&mut self, answer: &Answer) -> Result<()> {
        writeln!(self.output, "\nQuery: {}", answer.echo)?;
        writeln!(self.output, "{}\n", "_ ".repeat(22).trim_end())?;
        writeln!(self.output, "Results:")?;
        if answer.hits.is_empty() {
            writeln!(self.output, "No results")?;
        }
        for (rank, name) in answer.hits.iter().enumerate() {
            writeln!(self.output, "{}) {name}", rank + 1)?;
        }
        writeln!(self.output, "{RULE}\n")?;
        Ok(())
    }

    /// Read a DNF clause by clause. `None` when the input ends first.
    fn read_dnf(&mut self) -> Result<Option<Vec<Clause>>> {
        let mut clauses = Vec::new();
        loop {
            writeln!(self.output, "Conjunctive clause {}:", clauses.len() + 1)?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if !line.trim().is_empty() {
                match line.parse::<Clause>() {
                    Ok(clause) => clauses.push(clause),
                    Err(err) => {
                        writeln!(self.output, "Invalid clause: {err}")?;
                        continue;
                    }
                }
            }
            match self.confirm("Add another alternative clause?")? {
                Some(true) => {}
                Some(false) => return Ok(Some(clauses)),
                None => return Ok(None),
            }
        }
    }

    pub fn run(&mut self, engine: &Engine) -> Result<()> {
        match engine.kind() {
            IndexKind::Presence => {
                writeln!(self.output, "Enter queries in disjunctive normal form: one conjunctive clause per line,")?;
                writeln!(self.output, "words separated by spaces, a word prefixed with - is negated.")?;
            }
            IndexKind::Frequency => writeln!(self.output, "Enter free-text queries.")?,
        }
        writeln!(self.output, "{RULE}\n")?;

        loop {
            writeln!(self.output, "\nNew query:")?;
            let answer = match engine {
                Engine::Boolean(_) => match self.read_dnf()? {
                    None => break,
                    Some(clauses) if clauses.is_empty() => {
                        writeln!(self.output, "Empty query")?;
                        None
                    }
                    Some(clauses) => Some(engine.run_boolean(&DnfQuery::new(clauses))?),
                },
                Engine::Vector { .. } => match self.read_line()? {
                    None => break,
                    Some(text) => Some(engine.run_text(&text)?),
                },
            };
            if let Some(answer) = answer {
                self.print_answer(&answer)?;
            }
            if self.confirm("Run another query?")? != Some(true) {
                break;
            }
        }
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::bsbi::Bsbi;
    use sift_core::collection::MemoryCollection;
    use sift_core::config::DEFAULT_RESULT_LIMIT;
    use sift_core::frequency::FrequencyIndexer;
    use sift_core::presence::PresenceIndexer;
    use sift_core::Encoding;

    fn animals() -> MemoryCollection {
        MemoryCollection::new()
            .with_block("b0", [("d0", "cat dog")])
            .with_block("b1", [("d1", "dog")])
            .with_block("b2", [("d2", "cat cat bird")])
    }

    fn transcript(engine: &Engine, input: &str) -> String {
        let mut session = Session::new(input.as_bytes(), Vec::new());
        session.run(engine).unwrap();
        String::from_utf8(session.into_output()).unwrap()
    }

    #[test]
    fn boolean_dialogue() {
        let dir = tempfile::tempdir().unwrap();
        Bsbi::new(PresenceIndexer, dir.path(), Encoding::Plain).construct(&animals()).unwrap();
        let engine = Engine::open(dir.path(), Weighting::default(), DEFAULT_RESULT_LIMIT).unwrap();

        let out = transcript(&engine, "cat -dog\nmaybe\ny\nbird\nn\ny\nzebra\nn\nn\n");
        assert!(out.contains("Invalid answer. Add another alternative clause? (Y/N)"));
        assert!(out.contains("Query: ( cat AND NOT dog ) OR bird\n"));
        assert!(out.contains("Results:\n1) d2\n"));
        assert!(out.contains("Query: zebra\n"));
        assert!(out.contains("No results"));
    }

    #[test]
    fn invalid_clause_is_asked_again() {
        let dir = tempfile::tempdir().unwrap();
        Bsbi::new(PresenceIndexer, dir.path(), Encoding::Vbe).construct(&animals()).unwrap();
        let engine = Engine::open(dir.path(), Weighting::default(), DEFAULT_RESULT_LIMIT).unwrap();

        let out = transcript(&engine, "-\ncat\nn\n");
        assert!(out.contains("Invalid clause"));
        assert!(out.contains("1) d0\n2) d2\n"));
    }

    #[test]
    fn vector_dialogue_ends_at_eof() {
        let dir = tempfile::tempdir().unwrap();
        Bsbi::new(FrequencyIndexer, dir.path(), Encoding::Vbe).construct(&animals()).unwrap();
        let engine = Engine::open(dir.path(), Weighting::default(), DEFAULT_RESULT_LIMIT).unwrap();

        let out = transcript(&engine, "The cats\n");
        assert!(out.contains("Query: cat\n"));
        assert!(out.contains("1) d2\n2) d0\n"));
    }

    #[test]
    fn text_queries_follow_the_index_kind() {
        let dir = tempfile::tempdir().unwrap();
        Bsbi::new(PresenceIndexer, dir.path(), Encoding::Plain).construct(&animals()).unwrap();
        let engine = Engine::open(dir.path(), Weighting::default(), DEFAULT_RESULT_LIMIT).unwrap();
        let answer = engine.run_text("dog | bird").unwrap();
        assert_eq!(answer.hits, vec!["d0", "d1", "d2"]);
        assert!(engine.run_text("| dog").is_err());
    }
}

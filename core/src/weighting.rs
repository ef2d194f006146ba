//! Term-frequency, inverse-document-frequency and similarity strategies for ranked
//! retrieval. Each strategy parses from a short text form such as `log`, `log:1:10`,
//! `norm:0.5` or `jaccard`, so front-ends can take them as plain arguments.

use crate::error::{Error, Result};
use std::f64::consts::E;
use std::fmt;
use std::str::FromStr;

/// Sum and maximum of the raw frequencies of one vector, as needed by the
/// `ratio` and `norm` term-frequency variants.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FreqProfile {
    pub total: u64,
    pub max: u32,
}

impl FreqProfile {
    pub fn of<I: IntoIterator<Item = u32>>(freqs: I) -> Self {
        freqs.into_iter().fold(Self::default(), |acc, f| Self {
            total: acc.total + u64::from(f),
            max: acc.max.max(f),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tf {
    /// `freq / Σ freqs`
    Ratio,
    Binary,
    Raw,
    Sqrt,
    /// `constant + log_base(freq)`, 0 when `freq` is 0.
    Log { constant: f64, base: f64 },
    /// `ln(1 + freq)`
    Log1p,
    /// `k + (1 - k) * freq / max(freqs)`
    Norm { k: f64 },
}

impl Tf {
    pub fn weight(&self, freq: u32, profile: &FreqProfile) -> f64 {
        let f = f64::from(freq);
        match *self {
            Tf::Ratio if profile.total == 0 => 0.0,
            Tf::Ratio => f / profile.total as f64,
            Tf::Binary => f64::from(u8::from(freq > 0)),
            Tf::Raw => f,
            Tf::Sqrt => f.sqrt(),
            Tf::Log { constant, base } if freq > 0 => constant + f.log(base),
            Tf::Log { .. } => 0.0,
            Tf::Log1p => f.ln_1p(),
            Tf::Norm { k } if profile.max == 0 => k,
            Tf::Norm { k } => k + (1.0 - k) * f / f64::from(profile.max),
        }
    }
}

impl Default for Tf {
    fn default() -> Self {
        Tf::Log { constant: 1.0, base: E }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Idf {
    /// `ln(N / df)`
    Log,
    /// 1 when the term occurs and the collection is not empty.
    Unary,
    /// `constant + log_base(N / df)`
    LogBase { constant: f64, base: f64 },
    /// `ln(1 + N / df)`
    #[default]
    Smooth,
    /// `max(0, ln((N - df) / df))`
    Proba,
}

impl Idf {
    pub fn weight(&self, doc_freq: u32, total_docs: u32) -> f64 {
        if doc_freq == 0 || total_docs == 0 {
            return 0.0;
        }
        let df = f64::from(doc_freq);
        let n = f64::from(total_docs);
        match *self {
            Idf::Log => (n / df).ln(),
            Idf::Unary => 1.0,
            Idf::LogBase { constant, base } => constant + (n / df).log(base),
            Idf::Smooth => (1.0 + n / df).ln(),
            Idf::Proba if total_docs <= doc_freq => 0.0,
            Idf::Proba => ((n - df) / df).ln().max(0.0),
        }
    }
}

/// Turns a raw dot product into a retrieval status value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Similarity {
    #[default]
    Cosine,
    Dice,
    Jaccard,
    Overlap,
}

impl Similarity {
    /// Score from the dot product and the full query and document weight vectors.
    /// A zero denominator scores 0.
    pub fn score(&self, dot: f64, query: &[f64], document: &[f64]) -> f64 {
        let denominator = match self {
            Similarity::Cosine => norm(query) * norm(document),
            Similarity::Dice => (query.iter().sum::<f64>() + document.iter().sum::<f64>()) / 2.0,
            Similarity::Jaccard => query.iter().sum::<f64>() + document.iter().sum::<f64>() - dot,
            Similarity::Overlap => query.iter().sum::<f64>().min(document.iter().sum()),
        };
        if denominator == 0.0 {
            0.0
        } else {
            dot / denominator
        }
    }
}

fn norm(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum::<f64>().sqrt()
}

/// The three strategies used together by the vector engine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Weighting {
    pub tf: Tf,
    pub idf: Idf,
    pub similarity: Similarity,
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tf={} idf={} rsv={}", self.tf, self.idf, self.similarity)
    }
}

fn invalid(kind: &str, input: &str) -> Error {
    Error::format(format!("{kind} weighting"), format!("unknown variant `{input}`"))
}

fn parse_param(kind: &str, input: &str, param: Option<&str>, default: f64) -> Result<f64> {
    match param {
        None => Ok(default),
        Some("e") => Ok(E),
        Some(value) => value
            .parse()
            .map_err(|_| Error::format(format!("{kind} weighting"), format!("bad parameter `{value}` in `{input}`"))),
    }
}

/// Split `name:a:b` into its name and at most two parameters.
fn split_variant(input: &str) -> Result<(String, Option<&str>, Option<&str>)> {
    let mut parts = input.split(':');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let first = parts.next();
    let second = parts.next();
    if parts.next().is_some() {
        return Err(Error::format("weighting", format!("too many parameters in `{input}`")));
    }
    Ok((name, first, second))
}

impl FromStr for Tf {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, a, b) = split_variant(s)?;
        let tf = match name.as_str() {
            "ratio" | "tf" => Tf::Ratio,
            "binary" => Tf::Binary,
            "raw" | "id" => Tf::Raw,
            "sqrt" => Tf::Sqrt,
            "log" => Tf::Log {
                constant: parse_param("tf", s, a, 1.0)?,
                base: parse_param("tf", s, b, E)?,
            },
            "log1p" => Tf::Log1p,
            "norm" => Tf::Norm { k: parse_param("tf", s, a, 0.0)? },
            _ => return Err(invalid("tf", s)),
        };
        Ok(tf)
    }
}

impl fmt::Display for Tf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tf::Ratio => f.write_str("ratio"),
            Tf::Binary => f.write_str("binary"),
            Tf::Raw => f.write_str("raw"),
            Tf::Sqrt => f.write_str("sqrt"),
            Tf::Log { constant, base } if *constant == 1.0 && *base == E => f.write_str("log"),
            Tf::Log { constant, base } => write!(f, "log:{constant}:{base}"),
            Tf::Log1p => f.write_str("log1p"),
            Tf::Norm { k } => write!(f, "norm:{k}"),
        }
    }
}

impl FromStr for Idf {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, a, b) = split_variant(s)?;
        let idf = match name.as_str() {
            "log" | "idf" => Idf::Log,
            "unary" => Idf::Unary,
            "log-base" => Idf::LogBase {
                constant: parse_param("idf", s, a, 0.0)?,
                base: parse_param("idf", s, b, 2.0)?,
            },
            "smooth" => Idf::Smooth,
            "proba" => Idf::Proba,
            _ => return Err(invalid("idf", s)),
        };
        Ok(idf)
    }
}

impl fmt::Display for Idf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Idf::Log => f.write_str("log"),
            Idf::Unary => f.write_str("unary"),
            Idf::LogBase { constant, base } => write!(f, "log-base:{constant}:{base}"),
            Idf::Smooth => f.write_str("smooth"),
            Idf::Proba => f.write_str("proba"),
        }
    }
}

impl FromStr for Similarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cosine" | "cos" => Ok(Similarity::Cosine),
            "dice" => Ok(Similarity::Dice),
            "jaccard" => Ok(Similarity::Jaccard),
            "overlap" => Ok(Similarity::Overlap),
            _ => Err(invalid("rsv", s)),
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Similarity::Cosine => "cosine",
            Similarity::Dice => "dice",
            Similarity::Jaccard => "jaccard",
            Similarity::Overlap => "overlap",
        })
    }
}

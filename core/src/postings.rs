//! Postings values and their record encodings.
//!
//! A record is one postings entry prefixed by its leading id (a term id in the term
//! index, a document id in the secondary document index). Layouts:
//!
//! | variant   | plain text                       | vbe                               |
//! |-----------|----------------------------------|-----------------------------------|
//! | presence  | `key doc doc ...`                | `[key][count][doc]*count`         |
//! | frequency | `key count id:freq id:freq ...`  | `[key][count]([id][freq])*count`  |

use crate::error::{Error, Result};
use crate::index::{Encoding, FrequencyMap, PresenceList};
use crate::vbe::{self, VbeReader};
use std::collections::btree_map::Entry;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::marker::PhantomData;
use std::path::Path;

/// Behaviour shared by the presence and frequency postings values.
pub trait Posting: Sized + Send + Default {
    /// Integers per entry in the vbe layout.
    const ENTRY_WIDTH: usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fold `other` into `self`: set union for presence, per-id sum for frequency.
    fn merge(&mut self, other: Self);

    fn write_plain(&self, key: u32, out: &mut String);

    /// `(key, count)` of a plain record, without parsing the entries.
    fn plain_header(line: &str) -> Result<(u32, usize)>;

    fn parse_plain(line: &str) -> Result<(u32, Self)>;

    fn write_vbe(&self, key: u32, out: &mut Vec<u8>);

    /// Decode `count` entries; the reader sits just after the record header.
    fn read_vbe_body(reader: &mut VbeReader<'_>, count: usize) -> Result<Self>;

    fn encode_record(&self, key: u32, encoding: Encoding, out: &mut Vec<u8>) {
        match encoding {
            Encoding::Plain => {
                let mut line = String::new();
                self.write_plain(key, &mut line);
                line.push('\n');
                out.extend_from_slice(line.as_bytes());
            }
            Encoding::Vbe => self.write_vbe(key, out),
        }
    }
}

impl Posting for PresenceList {
    const ENTRY_WIDTH: usize = 1;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn merge(&mut self, other: Self) {
        self.extend(other);
        self.sort_unstable();
        self.dedup();
    }

    fn write_plain(&self, key: u32, out: &mut String) {
        let _ = write!(out, "{key}");
        for doc in self {
            let _ = write!(out, " {doc}");
        }
    }

    fn plain_header(line: &str) -> Result<(u32, usize)> {
        let mut fields = line.split_whitespace();
        let key = parse_id(fields.next(), line)?;
        Ok((key, fields.count()))
    }

    fn parse_plain(line: &str) -> Result<(u32, Self)> {
        let mut fields = line.split_whitespace();
        let key = parse_id(fields.next(), line)?;
        let docs = fields.map(|f| parse_id(Some(f), line)).collect::<Result<Vec<_>>>()?;
        check_ascending(&docs, key)?;
        Ok((key, docs))
    }

    fn write_vbe(&self, key: u32, out: &mut Vec<u8>) {
        vbe::encode_into(u64::from(key), out);
        vbe::encode_into(self.len() as u64, out);
        for &doc in self {
            vbe::encode_into(u64::from(doc), out);
        }
    }

    fn read_vbe_body(reader: &mut VbeReader<'_>, count: usize) -> Result<Self> {
        let mut docs = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            docs.push(reader.next_u32()?);
        }
        Ok(docs)
    }
}

impl Posting for FrequencyMap {
    const ENTRY_WIDTH: usize = 2;

    fn len(&self) -> usize {
        std::collections::BTreeMap::len(self)
    }

    fn merge(&mut self, other: Self) {
        for (id, freq) in other {
            *self.entry(id).or_insert(0) += freq;
        }
    }

    fn write_plain(&self, key: u32, out: &mut String) {
        let _ = write!(out, "{key} {}", self.len());
        for (id, freq) in self {
            let _ = write!(out, " {id}:{freq}");
        }
    }

    fn plain_header(line: &str) -> Result<(u32, usize)> {
        let mut fields = line.split_whitespace();
        let key = parse_id(fields.next(), line)?;
        let count = parse_id(fields.next(), line)?;
        Ok((key, count as usize))
    }

    fn parse_plain(line: &str) -> Result<(u32, Self)> {
        let (key, count) = Self::plain_header(line)?;
        let mut map = FrequencyMap::new();
        for field in line.split_whitespace().skip(2) {
            let (id, freq) = field
                .split_once(':')
                .ok_or_else(|| Error::format("postings record", format!("expected id:freq, got `{field}`")))?;
            insert_unique(&mut map, parse_id(Some(id), line)?, parse_id(Some(freq), line)?, key)?;
        }
        if map.len() != count {
            return Err(Error::format(
                "postings record",
                format!("record {key} announces {count} entries but holds {}", map.len()),
            ));
        }
        Ok((key, map))
    }

    fn write_vbe(&self, key: u32, out: &mut Vec<u8>) {
        vbe::encode_into(u64::from(key), out);
        vbe::encode_into(self.len() as u64, out);
        for (&id, &freq) in self {
            vbe::encode_into(u64::from(id), out);
            vbe::encode_into(u64::from(freq), out);
        }
    }

    fn read_vbe_body(reader: &mut VbeReader<'_>, count: usize) -> Result<Self> {
        let mut map = FrequencyMap::new();
        for _ in 0..count {
            let id = reader.next_u32()?;
            let freq = reader.next_u32()?;
            map.insert(id, freq);
        }
        Ok(map)
    }
}

fn parse_id(field: Option<&str>, line: &str) -> Result<u32> {
    let field = field.ok_or_else(|| Error::format("postings record", format!("missing field in `{line}`")))?;
    field
        .parse()
        .map_err(|_| Error::format("postings record", format!("`{field}` is not an id in `{line}`")))
}

fn check_ascending(docs: &[u32], key: u32) -> Result<()> {
    if docs.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::format(
            "postings record",
            format!("postings of {key} are not strictly ascending"),
        ));
    }
    Ok(())
}

fn insert_unique(map: &mut FrequencyMap, id: u32, freq: u32, key: u32) -> Result<()> {
    match map.entry(id) {
        Entry::Vacant(slot) => {
            slot.insert(freq);
            Ok(())
        }
        Entry::Occupied(_) => Err(Error::format(
            "postings record",
            format!("record {key} lists {id} twice"),
        )),
    }
}

/// Entries announced by a vbe record header, rejected when the rest of the file is too short to hold them.
fn entry_count<P: Posting>(key: u32, announced: u64, remaining: usize) -> Result<usize> {
    usize::try_from(announced)
        .ok()
        .filter(|&count| count.checked_mul(P::ENTRY_WIDTH).is_some_and(|ints| ints <= remaining))
        .ok_or_else(|| {
            Error::format(
                "record stream",
                format!("record {key} announces {announced} entries but only {remaining} bytes remain"),
            )
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub key: u32,
    pub count: usize,
}

enum Source {
    Plain {
        lines: Lines<BufReader<File>>,
        line: String,
    },
    Vbe {
        data: Vec<u8>,
        pos: usize,
        /// Entries of the current record not consumed yet.
        pending: Option<usize>,
    },
}

/// Forward-only scan over a record file.
///
/// [`next_header`](Self::next_header) moves to the next record; calling it again without
/// [`read_body`](Self::read_body) skips the previous body. In vbe files the skip walks
/// terminator bytes only, nothing is decoded.
pub struct RecordReader<P> {
    source: Source,
    current: Option<RecordHeader>,
    _posting: PhantomData<P>,
}

impl<P: Posting> RecordReader<P> {
    pub fn open(path: &Path, encoding: Encoding) -> Result<Self> {
        let source = match encoding {
            Encoding::Plain => Source::Plain {
                lines: BufReader::new(File::open(path)?).lines(),
                line: String::new(),
            },
            Encoding::Vbe => Source::Vbe {
                data: std::fs::read(path)?,
                pos: 0,
                pending: None,
            },
        };
        Ok(Self {
            source,
            current: None,
            _posting: PhantomData,
        })
    }

    pub fn next_header(&mut self) -> Result<Option<RecordHeader>> {
        self.current = match &mut self.source {
            Source::Plain { lines, line } => loop {
                match lines.next() {
                    None => break None,
                    Some(next) => {
                        *line = next?;
                        if line.trim().is_empty() {
                            continue;
                        }
                        let (key, count) = P::plain_header(line)?;
                        break Some(RecordHeader { key, count });
                    }
                }
            },
            Source::Vbe { data, pos, pending } => {
                let mut reader = VbeReader::starting_at(data, *pos);
                if let Some(unread) = pending.take() {
                    reader.skip_n(unread * P::ENTRY_WIDTH)?;
                }
                if reader.is_exhausted() {
                    *pos = reader.position();
                    None
                } else {
                    let key = reader.next_u32()?;
                    let count = entry_count::<P>(key, reader.next_u64()?, reader.remaining())?;
                    *pos = reader.position();
                    *pending = Some(count);
                    Some(RecordHeader { key, count })
                }
            }
        };
        Ok(self.current)
    }

    /// Decode the body of the record returned by the last `next_header` call.
    pub fn read_body(&mut self) -> Result<P> {
        let header = self
            .current
            .take()
            .ok_or_else(|| Error::format("record stream", "body requested without a pending header"))?;
        match &mut self.source {
            Source::Plain { line, .. } => P::parse_plain(line).map(|(_, body)| body),
            Source::Vbe { data, pos, pending } => {
                let mut reader = VbeReader::starting_at(data, *pos);
                let body = P::read_vbe_body(&mut reader, header.count)?;
                *pos = reader.position();
                *pending = None;
                Ok(body)
            }
        }
    }

    pub fn next_record(&mut self) -> Result<Option<(u32, P)>> {
        match self.next_header()? {
            Some(header) => Ok(Some((header.key, self.read_body()?))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn freq(entries: &[(u32, u32)]) -> FrequencyMap {
        entries.iter().copied().collect()
    }

    #[test]
    fn presence_merge_is_a_sorted_union() {
        let mut a: PresenceList = vec![1, 4, 9];
        a.merge(vec![0, 4, 12]);
        assert_eq!(a, vec![0, 1, 4, 9, 12]);
    }

    #[test]
    fn frequency_merge_sums_counts() {
        let mut a = freq(&[(1, 2), (3, 1)]);
        a.merge(freq(&[(3, 4), (7, 1)]));
        assert_eq!(a, freq(&[(1, 2), (3, 5), (7, 1)]));
    }

    #[test]
    fn plain_lines_follow_the_documented_shape() {
        let mut line = String::new();
        vec![2u32, 5, 11].write_plain(7, &mut line);
        assert_eq!(line, "7 2 5 11");

        let mut line = String::new();
        freq(&[(0, 3), (4, 1)]).write_plain(2, &mut line);
        assert_eq!(line, "2 2 0:3 4:1");
        assert_eq!(FrequencyMap::parse_plain(&line).unwrap(), (2, freq(&[(0, 3), (4, 1)])));
        assert_eq!(FrequencyMap::plain_header(&line).unwrap(), (2, 2));
    }

    #[test]
    fn malformed_plain_records_are_rejected() {
        assert!(FrequencyMap::parse_plain("3 2 0:1").unwrap_err().is_format());
        assert!(FrequencyMap::parse_plain("3 1 0-1").unwrap_err().is_format());
        assert!(FrequencyMap::parse_plain("3 2 0:1 0:4").unwrap_err().is_format());
        assert!(PresenceList::parse_plain("3 4 2").unwrap_err().is_format());
        assert!(PresenceList::parse_plain("x 1").unwrap_err().is_format());
    }

    #[test]
    fn vbe_layout_of_a_frequency_record() {
        let mut out = Vec::new();
        freq(&[(137, 2)]).write_vbe(5, &mut out);
        assert_eq!(out, vec![0x85, 0x81, 0x01, 0x89, 0x82]);
    }

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap().write_all(bytes).unwrap();
        path
    }

    #[test]
    fn reader_skips_unread_bodies_in_both_encodings() {
        let dir = tempfile::tempdir().unwrap();
        let records = [(0u32, freq(&[(1, 1), (2, 7)])), (3, freq(&[(300, 2)])), (9, freq(&[(4, 4)]))];

        for encoding in [Encoding::Plain, Encoding::Vbe] {
            let mut bytes = Vec::new();
            for (key, map) in &records {
                map.encode_record(*key, encoding, &mut bytes);
            }
            let path = write_file(dir.path(), &format!("r.{}", encoding.extension()), &bytes);

            let mut reader = RecordReader::<FrequencyMap>::open(&path, encoding).unwrap();
            assert_eq!(reader.next_header().unwrap(), Some(RecordHeader { key: 0, count: 2 }));
            assert_eq!(reader.next_header().unwrap(), Some(RecordHeader { key: 3, count: 1 }));
            assert_eq!(reader.read_body().unwrap(), freq(&[(300, 2)]));
            assert_eq!(reader.next_record().unwrap(), Some((9, freq(&[(4, 4)]))));
            assert_eq!(reader.next_header().unwrap(), None);
        }
    }

    #[test]
    fn oversized_entry_counts_are_format_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut huge = vec![0x80];
        huge.extend([0x7F; 8]);
        huge.push(0xFF);
        let path = write_file(dir.path(), "huge.vbe", &huge);
        let mut reader = RecordReader::<PresenceList>::open(&path, Encoding::Vbe).unwrap();
        assert!(reader.next_record().unwrap_err().is_format());

        // Two entries announced, room for one id:freq pair only.
        let path = write_file(dir.path(), "short.vbe", &[0x81, 0x82, 0x83, 0x84]);
        let mut reader = RecordReader::<FrequencyMap>::open(&path, Encoding::Vbe).unwrap();
        assert!(reader.next_header().unwrap_err().is_format());
    }

    #[test]
    fn body_without_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "empty.vbe", &[]);
        let mut reader = RecordReader::<PresenceList>::open(&path, Encoding::Vbe).unwrap();
        assert_eq!(reader.next_header().unwrap(), None);
        assert!(reader.read_body().is_err());
    }
}

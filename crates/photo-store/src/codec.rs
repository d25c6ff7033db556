//! Flat text catalogue format.
//!
//! ```text
//! <id> "<concept name>"
//! ...
//!
//! <digest> "<relative path>" [-tags <id> <id> ...] [-done] [-starred]
//! ...
//! ```
//!
//! The concept block ends at the first blank line. Words are separated by
//! spaces; a `"`-delimited run is one word with the quotes stripped. Ids are
//! base-36 tokens (see [`photo_core::encode_id`]). Photo lines written before
//! flags existed list tag ids right after the path; those are still read.
//!
//! Concept names are unique once normalized. A later line repeating a name
//! under another id is folded into the first id, and tags on photo lines
//! follow it there.

use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::warn;

use photo_core::{decode_id, encode_id, normalize_name, Id, PhotoError};

use crate::store::PhotoStore;

const FLAG_TAGS: &str = "-tags";
const FLAG_DONE: &str = "-done";
const FLAG_STARRED: &str = "-starred";

/// A recoverable problem met while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number.
    pub line: usize,

    pub message: String,
}

/// Outcome of a best-effort parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub warnings: Vec<ParseWarning>,

    /// The file was not valid UTF-8 and bad bytes were replaced, so
    /// rewriting it loses the original bytes.
    pub lossy: bool,
}

impl ParseReport {
    /// True when every line was understood and no bytes were replaced.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && !self.lossy
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        let message = message.into();
        warn!("Catalogue line {}: {}", line, message);
        self.warnings.push(ParseWarning { line, message });
    }
}

/// One word of a catalogue line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Word {
    text: String,
    quoted: bool,
}

impl Word {
    /// Unquoted words starting with `-` introduce an optional segment.
    fn as_flag(&self) -> Option<&str> {
        (!self.quoted && self.text.len() > 1 && self.text.starts_with('-')).then_some(self.text.as_str())
    }
}

/// Words of one line, and whether it ended inside an open quote.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Words {
    words: Vec<Word>,
    unterminated: bool,
}

/// Split a line into words, honouring double quotes.
fn split_words(line: &str) -> Words {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            ' ' | '\t' if !in_quotes => {
                if quoted || !current.is_empty() {
                    words.push(Word {
                        text: std::mem::take(&mut current),
                        quoted,
                    });
                }
                quoted = false;
            }
            _ => current.push(c),
        }
    }
    if quoted || !current.is_empty() {
        words.push(Word {
            text: current,
            quoted,
        });
    }

    Words {
        words,
        unterminated: in_quotes,
    }
}

/// Where non-flag words on a photo line go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    /// Words right after the path, before any flag.
    Leading,
    Tags,
    /// After a flag that takes no arguments.
    NoArguments,
    /// After an unknown flag; its arguments are dropped silently.
    Unknown,
}

/// Parse catalogue text into a store.
///
/// Never fails: malformed lines or words are skipped and reported, so one
/// damaged line cannot take the rest of the catalogue with it.
pub fn parse(text: &str) -> (PhotoStore, ParseReport) {
    let mut store = PhotoStore::new();
    let mut report = ParseReport::default();
    // Concept ids folded into an earlier id with the same name.
    let mut aliases: HashMap<Id, Id> = HashMap::new();
    let mut in_concepts = true;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');

        if line.trim().is_empty() {
            in_concepts = false;
            continue;
        }

        if in_concepts {
            parse_concept_line(&mut store, &mut report, &mut aliases, line_no, line);
        } else {
            parse_photo_line(&mut store, &mut report, &aliases, line_no, line);
        }
    }

    (store, report)
}

/// Split a line, reporting an unclosed quote.
fn words_of(report: &mut ParseReport, line_no: usize, line: &str) -> Vec<Word> {
    let split = split_words(line);
    if split.unterminated {
        report.warn(line_no, "unterminated quote; read to end of line");
    }
    split.words
}

fn parse_concept_line(
    store: &mut PhotoStore,
    report: &mut ParseReport,
    aliases: &mut HashMap<Id, Id>,
    line_no: usize,
    line: &str,
) {
    let words = words_of(report, line_no, line);
    let (token, name) = match words.as_slice() {
        [token, name, rest @ ..] => {
            if !rest.is_empty() {
                report.warn(line_no, format!("ignoring {} extra word(s) after concept", rest.len()));
            }
            (token, name)
        }
        _ => {
            report.warn(line_no, "concept line needs an id and a name");
            return;
        }
    };

    let id = match decode_id(&token.text) {
        Ok(id) => id,
        Err(e) => {
            report.warn(line_no, e.to_string());
            return;
        }
    };

    let taken = match aliases.get(&id) {
        Some(&first) => store.concept_name(first).ok(),
        None => store.concept_name(id).ok().filter(|name| !name.is_empty()),
    };
    if let Some(taken) = taken {
        if taken != normalize_name(&name.text) {
            report.warn(
                line_no,
                format!("id {} already names {:?}; keeping the first definition", token.text, taken),
            );
        }
        return;
    }

    if let Some(existing) = store.concept_id(&name.text) {
        report.warn(
            line_no,
            format!("concept {:?} already defined with id {}; merging", name.text, encode_id(existing)),
        );
        aliases.insert(id, existing);
        return;
    }

    if let Err(e) = store.insert_concept_at(&name.text, id) {
        report.warn(line_no, e.to_string());
    }
}

fn parse_photo_line(
    store: &mut PhotoStore,
    report: &mut ParseReport,
    aliases: &HashMap<Id, Id>,
    line_no: usize,
    line: &str,
) {
    let words = words_of(report, line_no, line);
    let (digest, path, rest) = match words.as_slice() {
        [digest, path, rest @ ..] => (digest, path, rest),
        _ => {
            report.warn(line_no, "photo line needs a digest and a path");
            return;
        }
    };

    let mut tags: Vec<Id> = Vec::new();
    let mut done = false;
    let mut starred = false;
    let mut segment = Segment::Leading;

    for word in rest {
        if let Some(flag) = word.as_flag() {
            segment = match flag {
                FLAG_TAGS => Segment::Tags,
                FLAG_DONE => {
                    done = true;
                    Segment::NoArguments
                }
                FLAG_STARRED => {
                    starred = true;
                    Segment::NoArguments
                }
                other => {
                    report.warn(line_no, format!("unknown flag {}", other));
                    Segment::Unknown
                }
            };
            continue;
        }

        match segment {
            Segment::Leading | Segment::Tags => match decode_id(&word.text) {
                Ok(tag) => {
                    let tag = aliases.get(&tag).copied().unwrap_or(tag);
                    if store.concept_name(tag).map_or(true, str::is_empty) {
                        report.warn(line_no, format!("tag {} names no concept", word.text));
                    }
                    tags.push(tag);
                }
                Err(e) => report.warn(line_no, e.to_string()),
            },
            Segment::NoArguments => {
                report.warn(line_no, format!("unexpected word {:?}", word.text));
            }
            Segment::Unknown => {}
        }
    }

    let id = match store.add_photo(digest.text.clone(), path.text.clone()) {
        Ok(id) => id,
        Err(PhotoError::DuplicateDigest { digest }) => {
            report.warn(line_no, format!("digest {} listed twice; merging into first entry", digest));
            match store.find_by_digest(&digest) {
                Some(photo) => photo.id(),
                None => return,
            }
        }
        Err(e) => {
            report.warn(line_no, e.to_string());
            return;
        }
    };

    if let Some(photo) = store.photo_mut(id) {
        for tag in tags {
            photo.add_tag(tag);
        }
        if done {
            photo.set_done(true);
        }
        if starred {
            photo.set_starred(true);
        }
    }
}

/// Render a store as catalogue text.
///
/// Free concept slots are skipped; photos are written in id order.
pub fn serialize(store: &PhotoStore) -> String {
    let mut out = String::new();

    for (id, name) in store.concepts() {
        let _ = writeln!(out, "{} \"{}\"", encode_id(id), name);
    }

    out.push('\n');

    for photo in store.photos() {
        let _ = write!(out, "{} \"{}\"", photo.digest(), photo.relative_path());
        if !photo.tags().is_empty() {
            out.push(' ');
            out.push_str(FLAG_TAGS);
            for &tag in photo.tags() {
                out.push(' ');
                out.push_str(&encode_id(tag));
            }
        }
        if photo.is_done() {
            out.push(' ');
            out.push_str(FLAG_DONE);
        }
        if photo.is_starred() {
            out.push(' ');
            out.push_str(FLAG_STARRED);
        }
        out.push('\n');
    }

    out
}

//! Speech markup generation
//!
//! Turns plain text into SSML using the entries of the active pronunciation
//! dictionaries. Entries with an alias are substituted literally; all others
//! become `<phoneme>` nodes. The body is wrapped in a `<speak>` envelope
//! carrying the language of the voice that will read it.

pub mod plain;
pub mod tags;

use crate::lexicon::{Dictionary, Entry};
use log::debug;
use std::borrow::Cow;

pub use plain::to_plain_text;
pub use tags::{replace_grapheme, scan_tags, tag_end, TagMarker};

/// SSML namespace declared on the envelope
pub const SSML_NAMESPACE: &str = "http://www.w3.org/2001/10/synthesis";

/// Attributes of the top-level `<speak>` element and its optional wrappers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// `xml:lang` of the utterance, usually the voice's locale
    pub language: Option<String>,

    /// Wraps the body in `<voice name="…">` when set
    pub voice: Option<String>,

    /// Wraps the body in `<prosody rate="N%">` when set
    pub rate_percent: Option<u32>,
}

impl Envelope {
    /// Envelope with only a language tag
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_rate(mut self, percent: u32) -> Self {
        self.rate_percent = Some(percent);
        self
    }

    /// Wrap a rewritten body
    pub fn wrap(&self, body: &str) -> String {
        let mut inner = body.to_string();

        if let Some(rate) = self.rate_percent {
            inner = format!("<prosody rate=\"{}%\">{}</prosody>", rate, inner);
        }

        if let Some(voice) = &self.voice {
            inner = format!(
                "<voice name=\"{}\">{}</voice>",
                escape_attribute(voice),
                inner
            );
        }

        let mut speak = format!("<speak version=\"1.0\" xmlns=\"{}\"", SSML_NAMESPACE);
        if let Some(language) = &self.language {
            speak.push_str(&format!(" xml:lang=\"{}\"", escape_attribute(language)));
        }
        speak.push('>');

        format!("{}{}</speak>", speak, inner)
    }
}

/// Rewrite `text` and wrap it in an envelope for `language`
pub fn rewrite<'a>(
    text: &str,
    dictionaries: impl IntoIterator<Item = &'a Dictionary>,
    language: &str,
) -> String {
    Envelope::new(language).wrap(&rewrite_body(text, dictionaries))
}

/// Rewrite `text` with an explicit envelope
pub fn rewrite_with<'a>(
    text: &str,
    dictionaries: impl IntoIterator<Item = &'a Dictionary>,
    envelope: &Envelope,
) -> String {
    envelope.wrap(&rewrite_body(text, dictionaries))
}

/// Apply every dictionary to `text` without adding an envelope
///
/// Dictionaries are applied in iteration order, entries in dictionary order
/// (longest grapheme first).
pub fn rewrite_body<'a>(
    text: &str,
    dictionaries: impl IntoIterator<Item = &'a Dictionary>,
) -> String {
    let mut body = escape_text(text).into_owned();

    for dictionary in dictionaries {
        for entry in dictionary.entries() {
            let grapheme = escape_text(&entry.grapheme);
            if grapheme.is_empty() || !body.contains(grapheme.as_ref()) {
                continue;
            }

            let replacement = replacement_for(entry, &grapheme);
            body = replace_grapheme(&body, &grapheme, &replacement);
        }
    }

    debug!("Rewrote {} chars of text into {} chars", text.len(), body.len());
    body
}

/// Text substituted for one occurrence of an entry's grapheme
fn replacement_for(entry: &Entry, grapheme: &str) -> String {
    match entry.alias.as_deref() {
        Some(alias) if !alias.is_empty() => escape_text(alias).into_owned(),
        _ => phoneme_node(grapheme, &entry.phoneme),
    }
}

/// Build a `<phoneme>` node for a grapheme
///
/// Apostrophes and double quotes are dropped from the spoken literal since
/// some engines fail on their escaped forms. A phoneme containing a double
/// quote is put in a single-quoted attribute.
pub fn phoneme_node(grapheme: &str, phoneme: &str) -> String {
    let readable: String = grapheme.chars().filter(|c| *c != '\'' && *c != '"').collect();
    let ph = phoneme
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    if ph.contains('"') {
        format!(
            "<phoneme ph='{}'>{}</phoneme>",
            ph.replace('\'', "&apos;"),
            readable
        )
    } else {
        format!("<phoneme ph=\"{}\">{}</phoneme>", ph, readable)
    }
}

/// Escape plain text for the markup body
///
/// `&` always becomes `&amp;`. A `<` is kept only when it starts a tag as
/// recognised by [`tag_end`], in which case the whole tag is copied as is;
/// any other `<` becomes `&lt;` and any stray `>` becomes `&gt;`.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(|c: char| matches!(c, '&' | '<' | '>')) {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 8);
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let escaped = match bytes[i] {
            b'&' => "&amp;",
            b'>' => "&gt;",
            b'<' => match tag_end(text, i) {
                Some(end) => {
                    i = end + 1;
                    continue;
                }
                None => "&lt;",
            },
            _ => {
                i += 1;
                continue;
            }
        };
        out.push_str(&text[copied..i]);
        out.push_str(escaped);
        i += 1;
        copied = i;
    }

    out.push_str(&text[copied..]);
    Cow::Owned(out)
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

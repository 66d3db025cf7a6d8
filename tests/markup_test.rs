//! Markup rewriting tests
//!
//! Runs game text through dictionaries loaded from lexicon documents and
//! checks the SSML that comes out.

use lexivox::lexicon::{Dictionary, LexiconStore};
use lexivox::markup::{rewrite, rewrite_body, rewrite_with, to_plain_text, Envelope};

fn lexeme(graphemes: &[&str], phoneme: &str, alias: Option<&str>) -> String {
    let mut xml = String::from("<lexeme>");
    for g in graphemes {
        xml.push_str(&format!("<grapheme>{}</grapheme>", g));
    }
    xml.push_str(&format!("<phoneme>{}</phoneme>", phoneme));
    if let Some(alias) = alias {
        xml.push_str(&format!("<alias>{}</alias>", alias));
    }
    xml.push_str("</lexeme>");
    xml
}

fn dictionary(lexemes: &[String]) -> Dictionary {
    let source = format!(
        "<lexicon xmlns=\"http://www.w3.org/2005/01/pronunciation-lexicon\">{}</lexicon>",
        lexemes.concat()
    );
    Dictionary::parse("test", &source).expect("test lexicon should parse")
}

#[test]
fn test_longest_grapheme_wins_within_rule() {
    let expected = "<phoneme ph=\"eɪɔrzɪə\">Eorzean</phoneme> lore";

    for graphemes in [["Eorzea", "Eorzean"], ["Eorzean", "Eorzea"]] {
        let dict = dictionary(&[lexeme(&graphemes, "eɪɔrzɪə", None)]);
        assert_eq!(
            rewrite_body("Eorzean lore", [&dict]),
            expected,
            "graphemes {:?}",
            graphemes
        );
    }
}

#[test]
fn test_longest_grapheme_wins_across_rules() {
    let short = lexeme(&["Eorzea"], "eɪɔrzɪə", None);
    let long = lexeme(&["Eorzean"], "eɪɔrzɪən", None);
    let expected = "<phoneme ph=\"eɪɔrzɪən\">Eorzean</phoneme>";

    for order in [[&short, &long], [&long, &short]] {
        let dict = dictionary(&[order[0].clone(), order[1].clone()]);
        assert_eq!(rewrite_body("Eorzean", [&dict]), expected);
    }
}

#[test]
fn test_shorter_grapheme_still_replaced_elsewhere() {
    let dict = dictionary(&[
        lexeme(&["Vanu"], "vɑːnu", None),
        lexeme(&["Vanus"], "vɑːnuz", None),
    ]);

    assert_eq!(
        rewrite_body("Vanu Vanus", [&dict]),
        "<phoneme ph=\"vɑːnu\">Vanu</phoneme> <phoneme ph=\"vɑːnuz\">Vanus</phoneme>"
    );
}

#[test]
fn test_existing_annotation_not_nested() {
    let dict = dictionary(&[
        lexeme(&["Vanu"], "vɑːnu", None),
        lexeme(&["Vanus"], "vɑːnuz", None),
    ]);

    let once = rewrite_body("The Vanus", [&dict]);
    let twice = rewrite_body(&once, [&dict]);
    assert_eq!(once, twice);
    assert_eq!(twice.matches("<phoneme").count(), 1);
}

#[test]
fn test_tag_attributes_untouched() {
    let dict = dictionary(&[lexeme(&["Vanu"], "vɑːnu", None)]);
    let text = "<voice name=\"Vanu\">hello</voice>";
    assert_eq!(rewrite_body(text, [&dict]), text);
}

#[test]
fn test_apostrophes_removed_from_literal() {
    let dict = dictionary(&[lexeme(&["Y&apos;shtola"], "jiʃtoʊlɑ", None)]);
    assert_eq!(
        rewrite_body("Y'shtola's staff", [&dict]),
        "<phoneme ph=\"jiʃtoʊlɑ\">Yshtola</phoneme>'s staff"
    );
}

#[test]
fn test_apostrophe_graphemes_prefer_longest() {
    let dict = dictionary(&[
        lexeme(&["Amalj'aa"], "əmɑld͡ʒɑ", None),
        lexeme(&["Amalj'aas"], "əmɑld͡ʒɑz", None),
    ]);
    assert_eq!(
        rewrite_body("The Amalj'aas attack", [&dict]),
        "The <phoneme ph=\"əmɑld͡ʒɑz\">Amaljaas</phoneme> attack"
    );
}

#[test]
fn test_alias_replaces_grapheme() {
    let dict = dictionary(&[lexeme(&["Bahamut"], "bɑhɑmɪt", Some("Bahamoot"))]);

    assert_eq!(rewrite_body("Bahamut arrives", [&dict]), "Bahamoot arrives");
    assert_eq!(
        rewrite("Bahamut arrives", [&dict], "en-US"),
        "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"en-US\">Bahamoot arrives</speak>"
    );
}

#[test]
fn test_phoneme_in_envelope() {
    let mut store = LexiconStore::new();
    store
        .add_lexicon(
            "places",
            &format!("<lexicon>{}</lexicon>", lexeme(&["Baldesion"], "bɔldˈɛˈsiɑn", None)),
        )
        .unwrap();

    assert_eq!(
        rewrite("Baldesion Arsenal", store.dictionaries(), "en-US"),
        "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"en-US\"><phoneme ph=\"bɔldˈɛˈsiɑn\">Baldesion</phoneme> Arsenal</speak>"
    );
}

#[test]
fn test_no_dictionaries_only_wraps() {
    let out = rewrite("Hello there", std::iter::empty(), "ja-JP");
    assert!(out.contains("xml:lang=\"ja-JP\""));
    assert!(out.ends_with(">Hello there</speak>"));
}

#[test]
fn test_envelope_markup_flattens_to_plain_text() {
    let dict = dictionary(&[lexeme(&["Bahamut"], "bɑhɑmɪt", Some("Bahamoot"))]);
    let envelope = Envelope::new("en-GB").with_voice("Amy").with_rate(90);

    let markup = rewrite_with("Bahamut & friends", [&dict], &envelope);
    assert!(markup.contains("<voice name=\"Amy\"><prosody rate=\"90%\">"));
    assert!(markup.contains("Bahamoot &amp; friends"));
    assert_eq!(to_plain_text(&markup), "Bahamoot & friends");
}

/// Read `markup` to the end, failing on any XML error
fn assert_well_formed(markup: &str) {
    let mut reader = quick_xml::Reader::from_str(markup);
    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("ill-formed markup {:?}: {}", markup, e),
        }
    }
}

#[test]
fn test_stray_angle_brackets_escaped() {
    let dict = dictionary(&[lexeme(&["Bahamut"], "bɑhɑmɪt", None)]);

    assert_eq!(
        rewrite_body("I <3 Bahamut", [&dict]),
        "I &lt;3 <phoneme ph=\"bɑhɑmɪt\">Bahamut</phoneme>"
    );
    assert_eq!(
        rewrite_body("a < b Bahamut > c", [&dict]),
        "a &lt; b <phoneme ph=\"bɑhɑmɪt\">Bahamut</phoneme> &gt; c"
    );

    let markup = rewrite("I <3 Bahamut & co", [&dict], "en-US");
    assert_well_formed(&markup);
    assert_eq!(to_plain_text(&markup), "I <3 Bahamut & co");
}

#[test]
fn test_phoneme_with_markup_characters_stays_well_formed() {
    let dict = dictionary(&[lexeme(&["Odd"], "a&amp;b&lt;c\"d'e", None)]);

    let markup = rewrite("Odd one", [&dict], "en-US");
    assert!(markup.contains("<phoneme ph='a&amp;b&lt;c\"d&apos;e'>Odd</phoneme> one"));
    assert_well_formed(&markup);
}

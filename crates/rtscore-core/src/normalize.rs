//! Text normalizer shared by the structure and accuracy engines.
//!
//! Canonical form: uppercase, only alphanumerics plus the structural
//! separators (comma, period, hyphen), single spaces, every comma followed by
//! a space, known callsign spelling
//! variants collapsed, and spoken numbers rewritten as digits. The function is
//! total and idempotent.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Punctuation that carries structure and survives normalization.
const SEPARATORS: [char; 3] = [',', '.', '-'];

/// Spoken number words, including RT pronunciations.
static NUMBER_WORDS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("ZERO", 0),
        ("ONE", 1),
        ("TWO", 2),
        ("THREE", 3),
        ("TREE", 3),
        ("FOUR", 4),
        ("FOWER", 4),
        ("FIVE", 5),
        ("FIFE", 5),
        ("SIX", 6),
        ("SEVEN", 7),
        ("EIGHT", 8),
        ("NINE", 9),
        ("NINER", 9),
        ("TEN", 10),
        ("ELEVEN", 11),
        ("TWELVE", 12),
        ("THIRTEEN", 13),
        ("FOURTEEN", 14),
        ("FIFTEEN", 15),
        ("SIXTEEN", 16),
        ("SEVENTEEN", 17),
        ("EIGHTEEN", 18),
        ("NINETEEN", 19),
        ("TWENTY", 20),
        ("THIRTY", 30),
    ])
});

/// Alternate spellings of fixed proper nouns, keyed by a single token.
static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("SHEPHERD", "SHEPHARD"),
        ("SHEPPARD", "SHEPHARD"),
        ("SHEPARD", "SHEPHARD"),
        ("RED-CROSS", "REDCROSS"),
    ])
});

/// Two-token spellings that collapse into one canonical token.
const PAIR_ALIASES: &[(&str, &str, &str)] = &[("RED", "CROSS", "REDCROSS")];

/// A whitespace token split into leading separators, core and trailing
/// separators.
#[derive(Debug, Clone)]
struct Token {
    prefix: String,
    core: String,
    suffix: String,
}

impl Token {
    fn parse(raw: &str) -> Self {
        let core_start = raw
            .find(|c: char| !SEPARATORS.contains(&c))
            .unwrap_or(raw.len());
        let (prefix, rest) = raw.split_at(core_start);
        let core_end = rest
            .rfind(|c: char| !SEPARATORS.contains(&c))
            .map(|i| i + rest[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        let (core, suffix) = rest.split_at(core_end);
        Self {
            prefix: prefix.to_string(),
            core: core.to_string(),
            suffix: suffix.to_string(),
        }
    }

    fn render(&self) -> String {
        format!("{}{}{}", self.prefix, self.core, self.suffix)
    }

    /// `true` if nothing separates this token from the next one.
    fn joins_next(&self, next: &Token) -> bool {
        self.suffix.is_empty() && next.prefix.is_empty()
    }
}

/// Canonicalize `text` for comparison.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| {
            if c.is_alphanumeric() || SEPARATORS.contains(&c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    // A comma always ends a word, even when the next one is glued to it.
    let cleaned = cleaned.replace(',', ", ");

    let tokens: Vec<Token> = cleaned.split_whitespace().map(Token::parse).collect();
    let tokens = apply_aliases(tokens);
    let tokens = collapse_numbers(tokens);

    tokens
        .iter()
        .map(Token::render)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized tokens with comma/period separators removed from their edges.
///
/// This is the word stream used for containment, n-gram and edit-distance
/// comparisons.
pub fn match_tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(|t| t.trim_matches(|c| c == ',' || c == '.'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Callsign key for case-, space- and alias-insensitive equality.
pub fn compact_callsign(text: &str) -> String {
    match_tokens(text).concat()
}

/// Numeric value of a spoken number word, if it is one.
pub fn number_word_value(word: &str) -> Option<u32> {
    NUMBER_WORDS.get(word.to_uppercase().as_str()).copied()
}

fn apply_aliases(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if let Some(next) = tokens.get(i + 1) {
            let pair = PAIR_ALIASES
                .iter()
                .find(|(a, b, _)| token.core == *a && next.core == *b);
            if let Some((_, _, canonical)) = pair {
                if token.joins_next(next) {
                    out.push(Token {
                        prefix: token.prefix.clone(),
                        core: (*canonical).to_string(),
                        suffix: next.suffix.clone(),
                    });
                    i += 2;
                    continue;
                }
            }
        }
        let mut token = token.clone();
        if let Some(canonical) = ALIASES.get(token.core.as_str()) {
            token.core = (*canonical).to_string();
        }
        out.push(token);
        i += 1;
    }
    out
}

/// Value of a number word or a hyphenated tens-units pair ("TWENTY-ONE").
fn spoken_value(core: &str) -> Option<u32> {
    if let Some(v) = NUMBER_WORDS.get(core) {
        return Some(*v);
    }
    let (tens, units) = core.split_once('-')?;
    let tens = *NUMBER_WORDS.get(tens)?;
    let units = *NUMBER_WORDS.get(units)?;
    (tens % 10 == 0 && tens >= 20 && (1..=9).contains(&units)).then_some(tens + units)
}

fn collapse_numbers(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if spoken_value(&tokens[i].core).is_none() {
            out.push(tokens[i].clone());
            i += 1;
            continue;
        }

        // Extend the run while adjacent tokens are number words with no
        // separator between them.
        let start = i;
        let mut end = i + 1;
        while end < tokens.len()
            && tokens[end - 1].joins_next(&tokens[end])
            && spoken_value(&tokens[end].core).is_some()
        {
            end += 1;
        }

        let values: Vec<u32> = tokens[start..end]
            .iter()
            .filter_map(|t| spoken_value(&t.core))
            .collect();
        let mut digits = String::new();
        let mut k = 0;
        while k < values.len() {
            let v = values[k];
            match values.get(k + 1) {
                Some(&u) if v >= 20 && v % 10 == 0 && (1..=9).contains(&u) => {
                    digits.push_str(&(v + u).to_string());
                    k += 2;
                }
                _ => {
                    digits.push_str(&v.to_string());
                    k += 1;
                }
            }
        }

        out.push(Token {
            prefix: tokens[start].prefix.clone(),
            core: digits,
            suffix: tokens[end - 1].suffix.clone(),
        });
        i = end;
    }
    out
}

//! Recovers structured multiple-choice questions from loosely formatted
//! model output.
//!
//! Strategies run in order until one produces enough questions: a JSON
//! array, blocks introduced by `1.` style numbering, blocks introduced by
//! `Question 1`, and finally blank-line separated paragraphs. Whatever is
//! still missing is filled with placeholder questions, so callers always
//! get the count they asked for.

use serde_json::{Map, Value};

use crate::models::{option_text, AnswerKey, ParsedQuestion, OPTION_LETTERS};

type Strategy = fn(&str) -> Vec<ParsedQuestion>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("json", from_json),
    ("numbered", from_numbered_blocks),
    ("question-marker", from_question_blocks),
    ("paragraph", from_paragraphs),
];

const PROMPT_PHRASES: &[&str] = &[
    "multiple-choice",
    "multiple choice",
    "answer choices",
    "mark the correct",
];

const ANSWER_MARKERS: &[&str] = &["correct answer:", "answer:", "correct:"];

/// Parses `raw` into exactly `expected` questions.
///
/// `prompt` is the text sent to the generator; an echo of it at the start of
/// `raw` is discarded. With `expected == 0` every question found is returned
/// and nothing is padded.
pub fn parse_questions(raw: &str, prompt: Option<&str>, expected: usize) -> Vec<ParsedQuestion> {
    let text = strip_prompt_echo(raw, prompt);

    let mut best = Vec::new();
    for (name, strategy) in STRATEGIES {
        let found = strategy(text);
        tracing::debug!(strategy = name, found = found.len(), expected, "parse attempt");
        if found.len() >= expected.max(1) {
            best = found;
            break;
        }
        if found.len() > best.len() {
            best = found;
        }
    }

    if expected > 0 {
        best.truncate(expected);
        if best.len() < expected {
            tracing::warn!(
                parsed = best.len(),
                expected,
                "filling missing questions with placeholders"
            );
        }
        while best.len() < expected {
            best.push(ParsedQuestion::placeholder(best.len() + 1));
        }
    }

    best
}

fn strip_prompt_echo<'a>(raw: &'a str, prompt: Option<&str>) -> &'a str {
    let text = raw.trim();

    if let Some(prompt) = prompt.map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(rest) = text.strip_prefix(prompt) {
            return rest.trim();
        }
    }

    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    if looks_like_prompt(first) {
        return rest.trim();
    }
    text
}

fn looks_like_prompt(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    lower.starts_with("create") || PROMPT_PHRASES.iter().any(|p| lower.contains(p))
}

/// Question text that is really leftover instructions.
fn is_instruction_text(question: &str) -> bool {
    let lower = question.trim().to_lowercase();
    lower.contains("multiple-choice") || lower.starts_with("create") || lower.starts_with("answer:")
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn from_json(text: &str) -> Vec<ParsedQuestion> {
    find_question_array(text)
        .map(|items| items.iter().filter_map(question_from_json).collect())
        .unwrap_or_default()
}

/// First bracketed array in `text` whose elements are all objects with a
/// `question` key.
fn find_question_array(text: &str) -> Option<Vec<Value>> {
    text.match_indices('[').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Array(items)))
                if !items.is_empty()
                    && items
                        .iter()
                        .all(|item| item.as_object().is_some_and(|o| o.contains_key("question"))) =>
            {
                Some(items)
            }
            _ => None,
        }
    })
}

fn question_from_json(item: &Value) -> Option<ParsedQuestion> {
    let obj = item.as_object()?;
    let question = clean_question_text(obj.get("question")?.as_str()?);
    if question.is_empty() || is_instruction_text(&question) {
        return None;
    }

    let options = obj.get("options").map(json_options).unwrap_or_default();
    let answer = ["answer", "correct", "correct_answer"]
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(|value| json_answer(value, &options))
        .unwrap_or_default();

    Some(ParsedQuestion {
        question,
        options,
        answer,
        raw: item.to_string(),
    })
}

fn json_options(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(json_scalar)
            .take(OPTION_LETTERS.len())
            .enumerate()
            .map(|(idx, text)| label_option(OPTION_LETTERS[idx], &text))
            .collect(),
        Value::Object(map) => keyed_options(map),
        _ => Vec::new(),
    }
}

/// Options given as `{"A": "...", "B": "..."}`.
fn keyed_options(map: &Map<String, Value>) -> Vec<String> {
    OPTION_LETTERS
        .iter()
        .filter_map(|letter| {
            let text = map
                .iter()
                .find(|(key, _)| AnswerKey::from_letter(key).map(AnswerKey::letter) == Some(*letter))
                .and_then(|(_, v)| json_scalar(v))?;
            Some(format!("{letter}) {}", text.trim()).trim_end().to_string())
        })
        .collect()
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn label_option(letter: char, text: &str) -> String {
    let text = text.trim();
    match leading_label(text, true) {
        Some((found, rest)) => format!("{found}) {rest}").trim_end().to_string(),
        None => format!("{letter}) {text}").trim_end().to_string(),
    }
}

fn json_answer(value: &Value, options: &[String]) -> Option<AnswerKey> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| AnswerKey::from_one_based(&n.to_string())),
        Value::String(s) => {
            let s = s.trim();
            AnswerKey::from_letter(s)
                .or_else(|| leading_label(s, true).and_then(|(l, _)| AnswerKey::from_char(l)))
                .or_else(|| AnswerKey::from_one_based(s))
                .or_else(|| {
                    options
                        .iter()
                        .position(|opt| option_text(opt).eq_ignore_ascii_case(s))
                        .and_then(AnswerKey::from_index)
                })
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Block splitting
// ---------------------------------------------------------------------------

fn from_numbered_blocks(text: &str) -> Vec<ParsedQuestion> {
    split_at_markers(text, is_numbered_marker)
        .iter()
        .filter_map(|block| parse_block(block))
        .collect()
}

fn from_question_blocks(text: &str) -> Vec<ParsedQuestion> {
    split_at_markers(text, is_question_marker)
        .iter()
        .filter_map(|block| parse_block(block))
        .collect()
}

fn from_paragraphs(text: &str) -> Vec<ParsedQuestion> {
    split_paragraphs(text)
        .iter()
        .filter_map(|block| parse_block(block))
        .collect()
}

fn strip_decoration(line: &str) -> &str {
    line.trim_start_matches(|c: char| c == '*' || c == '#' || c.is_whitespace())
}

/// `1.` or `12)` at the start of a line.
fn is_numbered_marker(line: &str) -> bool {
    let line = strip_decoration(line);
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    rest.len() != line.len() && matches!(rest.chars().next(), Some('.' | ')'))
}

/// `Question 3` at the start of a line, any case.
fn is_question_marker(line: &str) -> bool {
    let line = strip_decoration(line);
    line.get(..8).is_some_and(|head| head.eq_ignore_ascii_case("question"))
        && line[8..].trim_start().starts_with(|c: char| c.is_ascii_digit())
}

/// Groups lines into blocks, each starting at a marker line. Text before
/// the first marker is dropped.
fn split_at_markers(text: &str, is_marker: fn(&str) -> bool) -> Vec<String> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    for line in text.lines() {
        if is_marker(line) {
            blocks.push(vec![line]);
        } else if let Some(current) = blocks.last_mut() {
            current.push(line);
        }
    }
    blocks.into_iter().map(|lines| lines.join("\n")).collect()
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

fn parse_block(block: &str) -> Option<ParsedQuestion> {
    let mut question_lines: Vec<&str> = Vec::new();
    let mut options: [Option<String>; 4] = Default::default();
    let mut seen_option = false;
    let mut answer: Option<Option<AnswerKey>> = None;

    for line in block.lines() {
        let (body, marker) = split_answer_marker(line.trim());
        if answer.is_none() {
            answer = marker;
        }
        if body.is_empty() {
            continue;
        }

        let (lead, labelled) = match split_options(body) {
            found if !found.is_empty() => ("", found),
            _ => split_inline_options(body),
        };

        if !lead.is_empty() && !seen_option {
            question_lines.push(lead);
        }
        if !labelled.is_empty() {
            seen_option = true;
        }
        for (letter, text) in labelled {
            if let Some(slot) = AnswerKey::from_char(letter).map(|k| &mut options[k.index()]) {
                slot.get_or_insert(text);
            }
        }
    }

    let question = if seen_option && !question_lines.is_empty() {
        question_lines.join(" ")
    } else {
        question_lines.first()?.to_string()
    };
    let question = clean_question_text(&question);
    if question.is_empty() || is_instruction_text(&question) {
        return None;
    }

    let options = options
        .iter()
        .zip(OPTION_LETTERS)
        .filter_map(|(text, letter)| {
            text.as_ref()
                .map(|t| format!("{letter}) {t}").trim_end().to_string())
        })
        .collect();

    Some(ParsedQuestion {
        question,
        options,
        answer: answer.flatten().unwrap_or_default(),
        raw: block.trim().to_string(),
    })
}

/// Splits `"D) 6 Answer: B"` into `"D) 6"` and the answer. The outer option
/// is `Some` when a marker was present, the inner one when its letter was
/// valid. A marker counts only at the start of the line or after an option
/// label, so question text such as "which is correct: ..." stays intact.
fn split_answer_marker(line: &str) -> (&str, Option<Option<AnswerKey>>) {
    let lower = line.to_ascii_lowercase();
    let mut found: Vec<(usize, usize)> = ANSWER_MARKERS
        .iter()
        .flat_map(|marker| lower.match_indices(marker).map(|(pos, m)| (pos, m.len())))
        .collect();
    found.sort_unstable();

    let Some((pos, len)) = found
        .into_iter()
        .find(|(pos, _)| marker_allowed_after(&line[..*pos]))
    else {
        return (line, None);
    };

    let value = line[pos + len..]
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(' || c == '*');
    let mut chars = value.chars();
    let letter = chars.next();
    let standalone = chars.next().map_or(true, |c| !c.is_alphanumeric());
    let answer = letter
        .filter(|_| standalone)
        .and_then(AnswerKey::from_char);

    (line[..pos].trim(), Some(answer))
}

fn marker_allowed_after(before: &str) -> bool {
    let before = strip_decoration(before).trim();
    before.is_empty()
        || !split_options(before).is_empty()
        || !split_inline_options(before).1.is_empty()
}

/// Reads a leading `A)` or `(A)` label, plus `A.` when `allow_dot` is set.
/// The label must be followed by whitespace or the end of the text.
fn leading_label(text: &str, allow_dot: bool) -> Option<(char, &str)> {
    let (letter, rest) = match text.strip_prefix('(') {
        Some(inner) => {
            let mut chars = inner.chars();
            let letter = chars.next()?;
            (letter, chars.as_str().strip_prefix(')')?)
        }
        None => {
            let mut chars = text.chars();
            let letter = chars.next()?;
            let rest = chars.as_str();
            let rest = rest
                .strip_prefix(')')
                .or_else(|| if allow_dot { rest.strip_prefix('.') } else { None })?;
            (letter, rest)
        }
    };

    if !OPTION_LETTERS.contains(&letter) {
        return None;
    }
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((letter, rest.trim()))
}

/// Splits a line that begins with a label into its options, including any
/// further labels on the same line (`A) 3 B) 4 C) 5`).
fn split_options(text: &str) -> Vec<(char, String)> {
    let Some((mut current, mut rest)) = leading_label(text, true) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    loop {
        match next_inline_label(rest, current) {
            Some((pos, letter, after)) => {
                found.push((current, rest[..pos].trim().to_string()));
                current = letter;
                rest = after;
            }
            None => {
                found.push((current, rest.trim().to_string()));
                return found;
            }
        }
    }
}

/// Handles `"What is 2+2? A) 3 B) 4"`: the text before the first label is
/// returned as the question part. Needs at least two inline options.
fn split_inline_options(text: &str) -> (&str, Vec<(char, String)>) {
    if let Some((pos, _, _)) = next_inline_label(text, '@') {
        let options = split_options(text[pos..].trim_start());
        if options.len() >= 2 {
            return (text[..pos].trim(), options);
        }
    }
    (text, Vec::new())
}

/// Finds the next whitespace-preceded label with a letter after `after`.
fn next_inline_label(text: &str, after: char) -> Option<(usize, char, &str)> {
    text.char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .find_map(|(idx, c)| {
            let candidate = &text[idx + c.len_utf8()..];
            let (letter, rest) = leading_label(candidate, false)?;
            (letter > after).then_some((idx, letter, rest))
        })
}

// ---------------------------------------------------------------------------
// Question text cleanup
// ---------------------------------------------------------------------------

fn clean_question_text(text: &str) -> String {
    let mut current = text.trim();
    loop {
        let next = strip_decoration(current);
        let next = strip_numbering(next);
        let next = strip_word_label(next, "question");
        let next = strip_word_label(next, "q");
        if next.len() == current.len() {
            break;
        }
        current = next;
    }
    current
        .trim_end_matches('*')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_numbering(text: &str) -> &str {
    let rest = text.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == text.len() {
        return text;
    }
    match rest.chars().next() {
        Some('.' | ')' | ':') => rest[1..].trim_start(),
        _ => text,
    }
}

/// Strips `Question:`, `Question 2.`, `Q1)` and similar prefixes.
fn strip_word_label<'a>(text: &'a str, word: &str) -> &'a str {
    let Some(head) = text.get(..word.len()) else {
        return text;
    };
    if !head.eq_ignore_ascii_case(word) {
        return text;
    }

    let rest = text[word.len()..].trim_start();
    let after_digits = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    let had_digits = after_digits.len() != rest.len();
    match after_digits.chars().next() {
        Some(':' | '.' | ')') => after_digits[1..].trim_start(),
        Some('-') if had_digits => after_digits[1..].trim_start(),
        _ if had_digits => after_digits.trim_start(),
        _ => text,
    }
}

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Position of the correct option, always within `0..4`.
///
/// Stored as a 0-based index. Letters ("A".."D") and the legacy 1-based
/// numbering ("1".."4") are converted at the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AnswerKey(u8);

impl AnswerKey {
    pub fn from_index(idx: usize) -> Option<Self> {
        (idx < OPTION_LETTERS.len()).then_some(Self(idx as u8))
    }

    pub fn from_letter(value: &str) -> Option<Self> {
        let mut chars = value.trim().chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() {
            return None;
        }
        Self::from_char(letter)
    }

    pub fn from_char(letter: char) -> Option<Self> {
        OPTION_LETTERS
            .iter()
            .position(|&l| l == letter.to_ascii_uppercase())
            .map(|idx| Self(idx as u8))
    }

    /// Legacy storage used "1".."4" for the correct option.
    pub fn from_one_based(value: &str) -> Option<Self> {
        match value.trim().parse::<usize>() {
            Ok(n) if (1..=OPTION_LETTERS.len()).contains(&n) => Self::from_index(n - 1),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn letter(self) -> char {
        OPTION_LETTERS[self.index()]
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl Serialize for AnswerKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AnswerKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_letter(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid answer letter: {value:?}")))
    }
}

/// One multiple-choice question recovered from generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    pub question: String,
    /// Labelled options such as `"B) Paris"`, at most four.
    pub options: Vec<String>,
    pub answer: AnswerKey,
    /// Source text the record was extracted from; empty for placeholders.
    #[serde(default)]
    pub raw: String,
}

impl ParsedQuestion {
    pub fn placeholder(number: usize) -> Self {
        Self {
            question: format!("Placeholder question {number}"),
            options: OPTION_LETTERS
                .iter()
                .map(|l| format!("{l}) Option {l}"))
                .collect(),
            answer: AnswerKey::default(),
            raw: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.raw.is_empty()
    }

    /// The option carrying the answer's label. An unlabelled option at the
    /// answer's position counts too; a labelled one never stands in for a
    /// missing label.
    pub fn correct_option(&self) -> Option<&str> {
        let letter = self.answer.letter();
        self.options
            .iter()
            .find(|opt| option_label(opt) == Some(letter))
            .or_else(|| {
                self.options
                    .get(self.answer.index())
                    .filter(|opt| option_label(opt).is_none())
            })
            .map(String::as_str)
    }
}

/// Returns the label of an option written as `"C) text"`.
pub fn option_label(option: &str) -> Option<char> {
    let mut chars = option.trim_start().chars();
    let letter = chars.next()?;
    (chars.next() == Some(')') && OPTION_LETTERS.contains(&letter)).then_some(letter)
}

/// Strips a leading `"C)"` label from an option.
pub fn option_text(option: &str) -> &str {
    let trimmed = option.trim();
    match option_label(trimmed) {
        Some(_) => trimmed[2..].trim(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_indices_convert_both_ways() {
        let key = AnswerKey::from_letter(" c ").unwrap();
        assert_eq!(key.index(), 2);
        assert_eq!(key.letter(), 'C');
        assert_eq!(AnswerKey::from_index(2), Some(key));
        assert_eq!(AnswerKey::from_one_based("3"), Some(key));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(AnswerKey::from_letter("E"), None);
        assert_eq!(AnswerKey::from_letter("AB"), None);
        assert_eq!(AnswerKey::from_letter(""), None);
        assert_eq!(AnswerKey::from_index(4), None);
        assert_eq!(AnswerKey::from_one_based("0"), None);
        assert_eq!(AnswerKey::from_one_based("5"), None);
    }

    #[test]
    fn answer_serializes_as_letter() {
        let q = ParsedQuestion {
            question: "2+2?".to_string(),
            options: vec!["A) 3".to_string(), "B) 4".to_string()],
            answer: AnswerKey::from_letter("b").unwrap(),
            raw: "2+2?".to_string(),
        };
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["answer"], "B");

        let back: ParsedQuestion = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn correct_option_prefers_matching_label() {
        let q = ParsedQuestion {
            question: "Pick".to_string(),
            options: vec!["A) x".to_string(), "C) z".to_string()],
            answer: AnswerKey::from_letter("C").unwrap(),
            raw: "Pick".to_string(),
        };
        assert_eq!(q.correct_option(), Some("C) z"));
    }

    #[test]
    fn missing_label_has_no_correct_option() {
        let gapped = ParsedQuestion {
            question: "Pick a vowel".to_string(),
            options: vec!["A) E".to_string(), "C) K".to_string(), "D) T".to_string()],
            answer: AnswerKey::from_letter("B").unwrap(),
            raw: "Pick a vowel".to_string(),
        };
        assert_eq!(gapped.correct_option(), None);

        let unlabelled = ParsedQuestion {
            options: vec!["E".to_string(), "K".to_string()],
            ..gapped
        };
        assert_eq!(unlabelled.correct_option(), Some("K"));
    }

    #[test]
    fn option_text_strips_label_only_when_present() {
        assert_eq!(option_text("B)  Paris "), "Paris");
        assert_eq!(option_text("Paris"), "Paris");
        assert_eq!(option_label("E) nope"), None);
    }

    #[test]
    fn placeholders_have_four_options_and_answer_a() {
        let q = ParsedQuestion::placeholder(3);
        assert_eq!(q.question, "Placeholder question 3");
        assert_eq!(q.options.len(), 4);
        assert_eq!(q.answer.letter(), 'A');
        assert!(q.is_placeholder());
    }
}

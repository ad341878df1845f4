//! Keyboard shortcuts of the rating desk.

use crate::evaluation::{
    BinaryResponse, EvaluationConfig, EvaluationResponse, PairwiseResponse, Winner,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Left,
    Right,
    CtrlS,
    CtrlEnter,
}

impl Key {
    /// Read a key from one token of terminal input: a single character,
    /// an arrow escape sequence, or a `ctrl+` chord.
    pub fn parse(token: &str) -> Option<Key> {
        let token = token.trim_matches(|c: char| c == '\r' || c == '\n');
        match token {
            "\x1b[D" | "left" => return Some(Key::Left),
            "\x1b[C" | "right" => return Some(Key::Right),
            "\x13" => return Some(Key::CtrlS),
            _ => {}
        }

        let lower = token.to_ascii_lowercase();
        match lower.as_str() {
            "ctrl+s" | "^s" => return Some(Key::CtrlS),
            "ctrl+enter" | "^enter" => return Some(Key::CtrlEnter),
            _ => {}
        }

        let mut chars = lower.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Key::Char(c)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Answer(EvaluationResponse),
    Previous,
    Next,
    SaveAndNext,
    ToggleExamples,
    Quit,
}

/// What the desk looks like when a key arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortcutState {
    /// Focus is in a free-text field.
    pub typing: bool,
    /// The draft differs from what was loaded for the row.
    pub dirty: bool,
}

/// Map a key to a desk action.
///
/// Answer keys for the single evaluation come first, then saving (only
/// with unsaved changes), then navigation (only without).
pub fn resolve(key: Key, evaluation: Option<&EvaluationConfig>, state: ShortcutState) -> Option<Action> {
    if state.typing {
        return None;
    }

    if let Some(answer) = evaluation.and_then(|config| answer_for(config, key)) {
        return Some(Action::Answer(answer));
    }

    match key {
        Key::CtrlS | Key::CtrlEnter | Key::Char('s') if state.dirty => Some(Action::SaveAndNext),
        Key::Left | Key::Char('p') if !state.dirty => Some(Action::Previous),
        Key::Right | Key::Char('n') if !state.dirty => Some(Action::Next),
        Key::Char('e') => Some(Action::ToggleExamples),
        Key::Char('q') => Some(Action::Quit),
        _ => None,
    }
}

fn answer_for(config: &EvaluationConfig, key: Key) -> Option<EvaluationResponse> {
    let Key::Char(c) = key else {
        return None;
    };

    match config {
        EvaluationConfig::Rating(rating) => {
            let digit = c.to_digit(10)?;
            rating.shortcut(i64::from(digit)).map(EvaluationResponse::Rating)
        }
        EvaluationConfig::Binary(binary) => {
            let option = match c {
                '1' => binary.options.first(),
                '2' => binary.options.get(1),
                'y' => binary.options.iter().find(|o| o.value.eq_ignore_ascii_case("yes")),
                'n' => binary.options.iter().find(|o| o.value.eq_ignore_ascii_case("no")),
                _ => None,
            }?;
            Some(EvaluationResponse::Binary(BinaryResponse { value: option.value.clone() }))
        }
        EvaluationConfig::Pairwise(pairwise) => {
            let winner = match c {
                'a' | '1' => Winner::A,
                'b' | '2' => Winner::B,
                't' if pairwise.allow_tie => Winner::Tie,
                _ => return None,
            };
            Some(EvaluationResponse::Pairwise(PairwiseResponse { winner, confidence: None }))
        }
        EvaluationConfig::MultiLabel(_) | EvaluationConfig::MultiCriteria(_) | EvaluationConfig::Text(_) => None,
    }
}

/// One line per shortcut that applies to `evaluation`.
pub fn help(evaluation: Option<&EvaluationConfig>) -> Vec<String> {
    let mut lines = Vec::new();
    match evaluation {
        Some(EvaluationConfig::Rating(rating)) if rating.max >= 1 => {
            let low = rating.min.max(1);
            let high = rating.max.min(9);
            if low <= high {
                lines.push(format!("{low}-{high}      rate"));
            }
        }
        Some(EvaluationConfig::Binary(_)) => {
            lines.push("1 / 2     first / second option".to_string());
            lines.push("y / n     yes / no".to_string());
        }
        Some(EvaluationConfig::Pairwise(pairwise)) => {
            lines.push("a / 1     response A".to_string());
            lines.push("b / 2     response B".to_string());
            if pairwise.allow_tie {
                lines.push("t         tie".to_string());
            }
        }
        _ => {}
    }
    lines.push("p / left  previous row".to_string());
    lines.push("n / right next row".to_string());
    lines.push("s, ctrl+s save and go to next".to_string());
    lines.push("e         show examples".to_string());
    lines.push("q         quit".to_string());
    lines
}

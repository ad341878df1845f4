//! Turn a line typed at the terminal into an answer for a given config.

use super::{
    BinaryResponse, ChoiceOption, EvaluationConfig, EvaluationResponse, MultiCriteriaResponse,
    MultiLabelResponse, PairwiseResponse, RatingResponse, Winner, CONFIDENCE_LEVELS,
};
use crate::error::ValidationError;

pub fn parse_answer(config: &EvaluationConfig, input: &str) -> Result<EvaluationResponse, ValidationError> {
    let input = input.trim();

    match config {
        EvaluationConfig::Rating(c) => {
            let value = input
                .parse::<i64>()
                .map_err(|_| ValidationError::new("value", format!("Enter a number from {} to {}", c.min, c.max)))?;
            Ok(EvaluationResponse::Rating(RatingResponse { value }))
        }
        EvaluationConfig::Binary(c) => {
            let option = find_option(&c.options, input)?;
            Ok(EvaluationResponse::Binary(BinaryResponse { value: option.value.clone() }))
        }
        EvaluationConfig::MultiLabel(c) => {
            let mut selected = Vec::new();
            for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let value = find_option(&c.options, part)?.value.clone();
                if !selected.contains(&value) {
                    selected.push(value);
                }
            }
            Ok(EvaluationResponse::MultiLabel(MultiLabelResponse { selected }))
        }
        EvaluationConfig::MultiCriteria(c) => {
            let mut response = MultiCriteriaResponse::default();
            for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (key, value) = part
                    .split_once('=')
                    .ok_or_else(|| ValidationError::new("criteria", "Use key=value pairs, e.g. fluency=4,accuracy=3"))?;
                let key = key.trim();
                if !c.criteria.iter().any(|item| item.key == key) {
                    return Err(ValidationError::new("criteria", format!("Unknown criterion '{key}'")));
                }
                let value = value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ValidationError::new(key, "Score must be a number"))?;
                response = response.set(key, value);
            }
            Ok(EvaluationResponse::MultiCriteria(response))
        }
        EvaluationConfig::Pairwise(c) => {
            let mut parts = input.split_whitespace();
            let winner = match parts.next().map(str::to_lowercase).as_deref() {
                Some("a") | Some("1") => Winner::A,
                Some("b") | Some("2") => Winner::B,
                Some("t") | Some("tie") if c.allow_tie => Winner::Tie,
                _ => {
                    let hint = if c.allow_tie { "A, B or tie" } else { "A or B" };
                    return Err(ValidationError::new("winner", format!("Pick {hint}")));
                }
            };
            let confidence = match parts.next() {
                Some(level) if c.show_confidence => {
                    if !CONFIDENCE_LEVELS.contains(&level) {
                        return Err(ValidationError::new(
                            "confidence",
                            format!("Confidence must be one of {}", CONFIDENCE_LEVELS.join(", ")),
                        ));
                    }
                    Some(level.to_string())
                }
                _ => None,
            };
            Ok(EvaluationResponse::Pairwise(PairwiseResponse { winner, confidence }))
        }
        EvaluationConfig::Text(c) => Ok(EvaluationResponse::Text(c.clamp(input))),
    }
}

/// Match by value, by label (case-insensitive) or by 1-based position.
fn find_option<'a>(options: &'a [ChoiceOption], input: &str) -> Result<&'a ChoiceOption, ValidationError> {
    if let Some(option) = options.iter().find(|o| o.value == input) {
        return Ok(option);
    }
    if let Some(option) = options.iter().find(|o| o.label.eq_ignore_ascii_case(input)) {
        return Ok(option);
    }
    if let Ok(position) = input.parse::<usize>() {
        if let Some(option) = position.checked_sub(1).and_then(|i| options.get(i)) {
            return Ok(option);
        }
    }

    let choices: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
    Err(ValidationError::new(
        "value",
        format!("'{input}' is not an option ({})", choices.join(", ")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{
        CriteriaItem, EvaluationType, MultiCriteriaConfig, MultiLabelConfig, PairwiseConfig,
        TextConfig,
    };

    #[test]
    fn test_rating_input() {
        let config = EvaluationConfig::default_for(EvaluationType::Rating);
        assert_eq!(
            parse_answer(&config, " 4 ").unwrap(),
            EvaluationResponse::Rating(RatingResponse { value: 4 })
        );
        assert!(parse_answer(&config, "four").is_err());
    }

    #[test]
    fn test_binary_by_value_label_or_index() {
        let config = EvaluationConfig::default_for(EvaluationType::Binary);
        let no = EvaluationResponse::Binary(BinaryResponse { value: "no".into() });

        assert_eq!(parse_answer(&config, "no").unwrap(), no);
        assert_eq!(parse_answer(&config, "NO").unwrap(), no);
        assert_eq!(parse_answer(&config, "2").unwrap(), no);
        assert!(parse_answer(&config, "3").is_err());
        assert!(parse_answer(&config, "0").is_err());
    }

    #[test]
    fn test_multi_label_list() {
        let config = EvaluationConfig::MultiLabel(MultiLabelConfig {
            options: vec![ChoiceOption::new("bias", "Bias"), ChoiceOption::new("spam", "Spam")],
            min_select: 0,
            max_select: None,
        });

        match parse_answer(&config, "spam, 1, spam").unwrap() {
            EvaluationResponse::MultiLabel(m) => assert_eq!(m.selected, vec!["spam", "bias"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            parse_answer(&config, "").unwrap(),
            EvaluationResponse::MultiLabel(MultiLabelResponse::default())
        );
    }

    #[test]
    fn test_multi_criteria_pairs() {
        let config = EvaluationConfig::MultiCriteria(MultiCriteriaConfig {
            criteria: vec![CriteriaItem { key: "fluency".into(), label: "Fluency".into(), min: 1, max: 5 }],
        });

        match parse_answer(&config, "fluency=4").unwrap() {
            EvaluationResponse::MultiCriteria(m) => assert_eq!(m.criteria["fluency"], 4),
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_answer(&config, "fluency:4").is_err());
        assert!(parse_answer(&config, "style=2").is_err());
    }

    #[test]
    fn test_pairwise_with_confidence() {
        let config = EvaluationConfig::Pairwise(PairwiseConfig { show_confidence: true, allow_tie: false });

        assert_eq!(
            parse_answer(&config, "b very_confident").unwrap(),
            EvaluationResponse::Pairwise(PairwiseResponse {
                winner: Winner::B,
                confidence: Some("very_confident".into()),
            })
        );
        assert!(parse_answer(&config, "tie").is_err());
        assert!(parse_answer(&config, "a sure").is_err());
    }

    #[test]
    fn test_text_is_clamped() {
        let config = EvaluationConfig::Text(TextConfig { placeholder: None, max_length: Some(3), multiline: true });
        match parse_answer(&config, "abcdef").unwrap() {
            EvaluationResponse::Text(t) => assert_eq!(t.text, "abc"),
            other => panic!("unexpected {other:?}"),
        }
    }
}

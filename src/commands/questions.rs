use anyhow::{bail, Result};

use hitl_desk::endpoints::questions::{normalize_question_key, EvaluationQuestion, EvaluationQuestionCreate};
use hitl_desk::evaluation::{Conditional, EvaluationConfig, EvaluationType};

use super::{evaluation_from_args, App};
use crate::cli::QuestionsCommand;
use crate::output::{notify, table, Notice};

pub async fn run(command: QuestionsCommand, ctx: &mut App) -> Result<()> {
    match command {
        QuestionsCommand::List { project } => {
            let questions = ctx.store.questions(project).await?;
            ctx.out.emit(&questions, |questions| print_questions(questions))
        }
        QuestionsCommand::Add { project, key, label, description, evaluation, optional, when } => {
            let config = evaluation_from_args(&evaluation)?
                .unwrap_or_else(|| EvaluationConfig::default_for(EvaluationType::Rating));
            let key = key.unwrap_or_else(|| normalize_question_key(&label));

            let mut request = EvaluationQuestionCreate::new(&key, &label, config);
            request.description = description;
            request.required = !optional;
            request.conditional = when.as_deref().map(parse_condition).transpose()?;

            let question = ctx.store.create_question(project, &request).await?;
            if ctx.out.is_json() {
                return ctx.out.json(&question);
            }
            notify(Notice::Success, &format!("Question {} added", question.key));
            Ok(())
        }
        QuestionsCommand::Delete { project, question } => {
            ctx.store.delete_question(project, question).await?;
            notify(Notice::Success, "Question deleted");
            Ok(())
        }
        QuestionsCommand::Reorder { project, questions } => {
            ctx.store.reorder_questions(project, &questions).await?;
            notify(Notice::Success, "Questions reordered");
            Ok(())
        }
    }
}

/// `key=value`. The value is kept as a string, as the question editor stores it.
fn parse_condition(raw: &str) -> Result<Conditional> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok(Conditional::new(key.trim(), value.trim()))
        }
        _ => bail!("--when expects `question_key=value`, got `{raw}`"),
    }
}

pub fn print_questions(questions: &[EvaluationQuestion]) {
    if questions.is_empty() {
        println!("No questions yet.");
        return;
    }

    let rows: Vec<Vec<String>> = questions
        .iter()
        .map(|q| {
            let shown_when = q
                .conditional
                .as_ref()
                .map(|c| format!("{} = {}", c.question, c.equals))
                .unwrap_or_default();
            vec![
                q.order.to_string(),
                q.key.clone(),
                q.label.clone(),
                q.question_type.to_string(),
                if q.required { "yes" } else { "no" }.to_string(),
                shown_when,
                q.id.to_string(),
            ]
        })
        .collect();
    println!("{}", table(&["#", "KEY", "LABEL", "TYPE", "REQUIRED", "SHOWN WHEN", "ID"], &rows));
}

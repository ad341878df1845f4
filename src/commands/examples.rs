use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use hitl_desk::endpoints::examples::{partition_examples, AnnotationExample, AnnotationExampleCreate};
use hitl_desk::evaluation::Submission;

use super::App;
use crate::cli::ExamplesCommand;
use crate::output::{notify, Notice};

pub async fn run(command: ExamplesCommand, ctx: &mut App) -> Result<()> {
    match command {
        ExamplesCommand::List { project } => {
            let examples = ctx.store.examples(project).await?;
            ctx.out.emit(&examples, |examples| print_examples(examples))
        }
        ExamplesCommand::Add { project, title, content, response, explanation, negative } => {
            let content: Map<String, Value> = match serde_json::from_str(&content).context("--content is not valid JSON")? {
                Value::Object(map) => map,
                _ => bail!("--content must be a JSON object"),
            };
            let example_response: Submission =
                serde_json::from_str(&response).context("--response is not a valid answer")?;

            let request = AnnotationExampleCreate {
                title,
                content,
                example_response,
                explanation,
                is_positive: Some(!negative),
                order: None,
            };
            let example = ctx.store.create_example(project, &request).await?;
            if ctx.out.is_json() {
                return ctx.out.json(&example);
            }
            notify(Notice::Success, &format!("Example \"{}\" added", example.title));
            Ok(())
        }
        ExamplesCommand::Delete { project, example } => {
            ctx.store.delete_example(project, example).await?;
            notify(Notice::Success, "Example deleted");
            Ok(())
        }
    }
}

/// Good examples first, then the ones showing what to avoid.
pub fn print_examples(examples: &[AnnotationExample]) {
    if examples.is_empty() {
        println!("No examples for this project.");
        return;
    }

    let (positive, negative) = partition_examples(examples);
    for (heading, group) in [("Good examples", positive), ("Examples to avoid", negative)] {
        if group.is_empty() {
            continue;
        }
        println!("{heading}:");
        for example in group {
            println!("  * {} ({})", example.title, example.id);
            for (key, value) in &example.content {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                println!("      {key}: {value}");
            }
            println!("      answer: {}", example.example_response.summary());
            if let Some(explanation) = example.explanation.as_deref().filter(|e| !e.is_empty()) {
                println!("      why: {explanation}");
            }
        }
    }
}

use anyhow::Result;
use uuid::Uuid;

use hitl_desk::desk::{DeskError, RatingDesk, SaveOutcome, Step};
use hitl_desk::endpoints::sessions::RowFilter;
use hitl_desk::evaluation::input::parse_answer;
use hitl_desk::evaluation::{EvaluationConfig, EvaluationForm};
use hitl_desk::media::parse_row_content;
use hitl_desk::shortcuts::{self, Action, Key, ShortcutState};

use super::{App, Prompt};
use crate::commands::examples::print_examples;
use crate::output::{notify, progress_bar, Notice};

const COMMANDS: &str = "\
:save            save this row
:sn              save and go to the next row
:next / :prev    move between rows
:skip            go to the next row without saving
:comment TEXT    set the comment (empty to clear)
:answer KEY VAL  answer a question by key
:filter F        all, unrated or rated
:examples        show annotation examples
:instructions    show the project instructions
:quit            leave the desk";

enum Flow {
    /// Redraw the row.
    Render,
    /// Keep the prompt without redrawing.
    Stay,
    Quit,
}

pub async fn run(ctx: &mut App, session_id: Uuid, per_page: u32, filter: RowFilter) -> Result<()> {
    let mut desk = RatingDesk::open(ctx.store.clone(), session_id, per_page).await?;
    if filter != RowFilter::All {
        desk.set_filter(filter).await?;
    }
    let api_url = ctx.store.client().base_url().to_string();

    println!("Rating {} in project {}", desk.session().session.name, desk.project().name);
    if let Some(instructions) = desk.instructions() {
        println!("\nInstructions:\n{instructions}");
    }
    println!("\nType a shortcut or an answer; :help lists commands.");

    let mut redraw = true;
    loop {
        if redraw {
            render(&desk, &api_url);
        }

        let Some(line) = ctx.prompt.ask("> ").await? else {
            if desk.is_dirty() {
                notify(Notice::Info, "Input ended; unsaved changes were discarded");
            }
            break;
        };

        match handle(&mut desk, &mut ctx.prompt, line.trim()).await {
            Ok(Flow::Render) => redraw = true,
            Ok(Flow::Stay) => redraw = false,
            Ok(Flow::Quit) => {
                if desk.is_dirty() && !ctx.prompt.confirm("Discard unsaved changes?").await? {
                    redraw = false;
                    continue;
                }
                break;
            }
            Err(DeskError::Api(e)) if e.requires_login() => return Err(e.into()),
            Err(e) => {
                notify(Notice::Error, &describe(&e));
                redraw = false;
            }
        }
    }
    Ok(())
}

fn describe(error: &DeskError) -> String {
    match error {
        DeskError::UnsavedChanges => "You have unsaved changes. Save with :save or drop them with :skip".to_string(),
        DeskError::Api(e) => e.message(),
        DeskError::Validation(e) => e.message.clone(),
        other => other.to_string(),
    }
}

fn single_config(desk: &RatingDesk) -> Option<&EvaluationConfig> {
    match desk.form() {
        EvaluationForm::Single { config, .. } => Some(config),
        EvaluationForm::Multi(_) => None,
    }
}

async fn handle(desk: &mut RatingDesk, prompt: &mut Prompt, line: &str) -> Result<Flow, DeskError> {
    if line.is_empty() {
        return Ok(Flow::Render);
    }
    if let Some(command) = line.strip_prefix(':') {
        return run_command(desk, prompt, command.trim()).await;
    }

    let single = single_config(desk).cloned();
    let state = ShortcutState {
        typing: matches!(single, Some(EvaluationConfig::Text(_))),
        dirty: desk.is_dirty(),
    };

    if let Some(key) = Key::parse(line) {
        if let Some(action) = shortcuts::resolve(key, single.as_ref(), state) {
            return apply(desk, action).await;
        }
        let navigation = matches!(key, Key::Left | Key::Right | Key::Char('n' | 'p'));
        if navigation && state.dirty && !state.typing {
            return Err(DeskError::UnsavedChanges);
        }
    }

    match single {
        Some(config) => {
            let answer = parse_answer(&config, line)?;
            desk.set_response(None, answer)?;
            Ok(Flow::Render)
        }
        None => {
            notify(Notice::Info, "Answer a question with :answer <key> <value>");
            Ok(Flow::Stay)
        }
    }
}

async fn apply(desk: &mut RatingDesk, action: Action) -> Result<Flow, DeskError> {
    match action {
        Action::Answer(answer) => {
            desk.set_response(None, answer)?;
            Ok(Flow::Render)
        }
        Action::Previous => moved(desk.previous().await?),
        Action::Next => moved(desk.next().await?),
        Action::SaveAndNext => save(desk, true).await,
        Action::ToggleExamples => {
            print_examples(&desk.examples().await?);
            Ok(Flow::Stay)
        }
        Action::Quit => Ok(Flow::Quit),
    }
}

fn moved(step: Step) -> Result<Flow, DeskError> {
    match step {
        Step::AtStart => {
            notify(Notice::Info, "Already at the first row");
            Ok(Flow::Stay)
        }
        Step::AtEnd => {
            notify(Notice::Info, "Already at the last row");
            Ok(Flow::Stay)
        }
        Step::Moved | Step::LoadPage(_) => Ok(Flow::Render),
    }
}

async fn save(desk: &mut RatingDesk, move_next: bool) -> Result<Flow, DeskError> {
    match desk.save(move_next).await? {
        SaveOutcome::Saved => {
            notify(Notice::Success, "Rating saved");
            Ok(Flow::Render)
        }
        SaveOutcome::Completed => {
            notify(Notice::Success, "Session complete! Every row has your rating.");
            Ok(Flow::Quit)
        }
    }
}

async fn run_command(desk: &mut RatingDesk, prompt: &mut Prompt, command: &str) -> Result<Flow, DeskError> {
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    let rest = rest.trim();

    match name {
        "save" | "s" => save(desk, false).await,
        "sn" => save(desk, true).await,
        "next" | "n" => apply(desk, Action::Next).await,
        "prev" | "p" => apply(desk, Action::Previous).await,
        "skip" => {
            let step = match desk.skip(false).await {
                Err(DeskError::UnsavedChanges) => {
                    if !prompt.confirm("Discard unsaved changes?").await.unwrap_or(false) {
                        return Ok(Flow::Stay);
                    }
                    desk.skip(true).await?
                }
                other => other?,
            };
            moved(step).map(|_| Flow::Render)
        }
        "comment" | "c" => {
            desk.set_comment(rest);
            Ok(Flow::Render)
        }
        "filter" | "f" => {
            let filter: RowFilter = rest.parse()?;
            desk.set_filter(filter).await?;
            Ok(Flow::Render)
        }
        "answer" | "a" => answer(desk, rest),
        "examples" | "e" => apply(desk, Action::ToggleExamples).await,
        "instructions" | "i" => {
            println!("{}", desk.instructions().unwrap_or("This project has no instructions."));
            Ok(Flow::Stay)
        }
        "help" | "h" | "?" => {
            for line in shortcuts::help(single_config(desk)) {
                println!("{line}");
            }
            println!("\n{COMMANDS}");
            Ok(Flow::Stay)
        }
        "quit" | "q" => Ok(Flow::Quit),
        other => {
            notify(Notice::Error, &format!("Unknown command :{other}; :help lists commands"));
            Ok(Flow::Stay)
        }
    }
}

/// `:answer KEY VALUE` in multi-question mode, `:answer VALUE` otherwise.
fn answer(desk: &mut RatingDesk, args: &str) -> Result<Flow, DeskError> {
    let (key, config, input) = match desk.form() {
        EvaluationForm::Single { config, .. } => (None, config.clone(), args),
        EvaluationForm::Multi(form) => {
            let (key, input) = args.split_once(' ').unwrap_or((args, ""));
            let question = form.question(key).ok_or_else(|| {
                hitl_desk::ValidationError::new("question", format!("No question with key '{key}'"))
            })?;
            (Some(key.to_string()), question.config.clone(), input.trim())
        }
    };

    let response = parse_answer(&config, input)?;
    desk.set_response(key.as_deref(), response)?;
    Ok(Flow::Render)
}

// RENDERING

fn render(desk: &RatingDesk, api_url: &str) {
    let session = desk.session();
    let counts = desk.counts();
    let (position, total) = desk.position();

    println!();
    println!("== {} | row {position} of {total} | {} ==", session.session.name, desk.filter());
    println!(
        "{} {}/{} rated    all {} | unrated {} | rated {}",
        progress_bar(desk.progress_percent(), 20),
        desk.rated_count(),
        session.counts.row_count,
        counts.all,
        counts.unrated,
        counts.rated
    );

    let Some(row) = desk.current_row() else {
        println!("\nNo rows match this filter.");
        return;
    };

    println!("\nRow {}{}", row.row_index + 1, if row.is_rated() { "  (rated)" } else { "" });
    for cell in parse_row_content(&row.content, &session.session.columns, api_url) {
        match &cell.media {
            Some(media) => println!("  {}: [{}] {}", cell.key, media.kind, media.url),
            None => println!("  {}: {}", cell.key, cell.value),
        }
    }

    let others = row.other_ratings();
    if !others.is_empty() {
        println!("\nOther ratings:");
        for rating in others {
            match rating.comment.as_deref().filter(|c| !c.is_empty()) {
                Some(comment) => println!("  {}: {} ({comment})", rating.rater_username, rating.summary()),
                None => println!("  {}: {}", rating.rater_username, rating.summary()),
            }
        }
    }

    println!();
    render_form(desk.form());
    if !desk.comment().is_empty() {
        println!("Comment: {}", desk.comment());
    }
    if desk.is_dirty() {
        println!("(unsaved changes)");
    }
}

fn render_form(form: &EvaluationForm) {
    match form {
        EvaluationForm::Single { config, response } => {
            println!("{}", describe_config(config));
            let answer = response.as_ref().map(|r| r.summary()).unwrap_or_else(|| "-".to_string());
            println!("Your answer: {answer}");
        }
        EvaluationForm::Multi(form) => {
            for question in form.visible_questions() {
                let answer = form
                    .answers()
                    .get(&question.key)
                    .map(|r| r.summary())
                    .unwrap_or_else(|| "-".to_string());
                let required = if question.required { "*" } else { "" };
                println!("[{}] {}{required}: {answer}", question.key, question.label);
                println!("    {}", describe_config(&question.config));
            }
        }
    }
}

fn describe_config(config: &EvaluationConfig) -> String {
    match config {
        EvaluationConfig::Rating(rating) => {
            let labels: Vec<String> = (rating.min..=rating.max)
                .filter(|v| rating.labels.as_ref().is_some_and(|l| l.contains_key(&v.to_string())))
                .map(|v| format!("{v}={}", rating.label_for(v)))
                .collect();
            if labels.is_empty() {
                format!("Rate {}-{}", rating.min, rating.max)
            } else {
                format!("Rate {}-{} ({})", rating.min, rating.max, labels.join(", "))
            }
        }
        EvaluationConfig::Binary(binary) => {
            let options: Vec<String> = binary
                .options
                .iter()
                .enumerate()
                .map(|(i, o)| format!("{}) {}", i + 1, o.label))
                .collect();
            format!("Choose: {}", options.join("  "))
        }
        EvaluationConfig::MultiLabel(labels) => {
            let options: Vec<&str> = labels.options.iter().map(|o| o.label.as_str()).collect();
            let limit = match labels.max_select {
                Some(max) => format!("{}-{max}", labels.min_select),
                None => format!("at least {}", labels.min_select),
            };
            format!("Select {limit}, comma separated: {}", options.join(", "))
        }
        EvaluationConfig::MultiCriteria(criteria) => {
            let items: Vec<String> = criteria
                .criteria
                .iter()
                .map(|c| format!("{}={}..{}", c.key, c.min, c.max))
                .collect();
            format!("Score each as key=value: {}", items.join(" "))
        }
        EvaluationConfig::Pairwise(pairwise) => {
            let mut choices = vec!["a", "b"];
            if pairwise.allow_tie {
                choices.push("tie");
            }
            let confidence = if pairwise.show_confidence { " [confidence]" } else { "" };
            format!("Which response is better? {}{confidence}", choices.join(" / "))
        }
        EvaluationConfig::Text(text) => text.placeholder().to_string(),
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use hitl_desk::endpoints::auth::Role;
use hitl_desk::endpoints::sessions::{ExportFormat, RowFilter};
use hitl_desk::evaluation::EvaluationType;

/// Terminal client for the HITL rating platform
#[derive(Parser, Debug)]
#[command(name = "hitl", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL including the /api prefix (overrides HITL_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        username: String,

        #[arg(long, env = "HITL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        username: String,

        #[arg(long, default_value = "rater")]
        role: Role,

        #[arg(long, env = "HITL_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Repeat the password; prompted for when missing
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Show the dashboard for your role
    Dashboard,

    /// Manage projects (requesters)
    #[command(subcommand)]
    Projects(ProjectsCommand),

    /// Manage a project's evaluation questions (requesters)
    #[command(subcommand)]
    Questions(QuestionsCommand),

    /// Manage a project's annotation examples (requesters)
    #[command(subcommand)]
    Examples(ExamplesCommand),

    /// Uploaded datasets and their rows
    #[command(subcommand)]
    Sessions(SessionsCommand),

    /// Media files referenced from datasets (requesters)
    #[command(subcommand)]
    Media(MediaCommand),

    /// Rate the rows of a session interactively
    Rate {
        session: Uuid,

        /// Rows per page (overrides HITL_PER_PAGE)
        #[arg(long)]
        per_page: Option<u32>,

        #[arg(long, default_value = "all")]
        filter: RowFilter,
    },
}

/// Evaluation settings shared by project and question commands.
#[derive(Args, Debug, Default)]
pub struct EvaluationArgs {
    /// rating, binary, multi_label, multi_criteria, pairwise or text
    #[arg(long = "type")]
    pub evaluation_type: Option<EvaluationType>,

    /// Config object as JSON; defaults to the type's default config
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    List,

    Show {
        project: Uuid,
    },

    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        evaluation: EvaluationArgs,

        #[arg(long)]
        instructions: Option<String>,

        /// Use evaluation questions instead of a single evaluation
        #[arg(long)]
        multi_questions: bool,
    },

    Update {
        project: Uuid,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        evaluation: EvaluationArgs,

        #[arg(long)]
        instructions: Option<String>,

        #[arg(long)]
        multi_questions: Option<bool>,
    },

    Delete {
        project: Uuid,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Give raters access to a project
    Assign {
        project: Uuid,

        #[arg(required = true)]
        raters: Vec<Uuid>,
    },

    /// Take a rater off a project
    Unassign {
        project: Uuid,
        rater: Uuid,
    },

    /// List every rater account
    Raters,
}

#[derive(Subcommand, Debug)]
pub enum QuestionsCommand {
    List {
        project: Uuid,
    },

    Add {
        project: Uuid,

        /// Identifier used in responses; derived from the label when omitted
        #[arg(long)]
        key: Option<String>,

        label: String,

        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        evaluation: EvaluationArgs,

        #[arg(long)]
        optional: bool,

        /// Only show when another question's answer matches, as `key=value`
        #[arg(long)]
        when: Option<String>,
    },

    Delete {
        project: Uuid,
        question: Uuid,
    },

    /// Set the question order
    Reorder {
        project: Uuid,

        #[arg(required = true)]
        questions: Vec<Uuid>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExamplesCommand {
    List {
        project: Uuid,
    },

    Add {
        project: Uuid,

        title: String,

        /// Row content as a JSON object
        #[arg(long)]
        content: String,

        /// The example answer as JSON
        #[arg(long)]
        response: String,

        #[arg(long)]
        explanation: Option<String>,

        /// Mark as an example of what not to do
        #[arg(long)]
        negative: bool,
    },

    Delete {
        project: Uuid,
        example: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    List {
        project: Uuid,
    },

    Show {
        session: Uuid,
    },

    /// Upload a CSV or Excel dataset as a new session
    Upload {
        project: Uuid,

        file: PathBuf,

        #[arg(long)]
        name: Option<String>,
    },

    Delete {
        session: Uuid,

        #[arg(long, short)]
        yes: bool,
    },

    /// Download the session with all ratings
    Export {
        session: Uuid,

        #[arg(long, default_value = "xlsx")]
        format: ExportFormat,

        /// Directory or file to write to
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    Rows {
        session: Uuid,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        per_page: Option<u32>,

        #[arg(long, default_value = "all")]
        filter: RowFilter,
    },
}

#[derive(Subcommand, Debug)]
pub enum MediaCommand {
    List {
        project: Uuid,
    },

    Upload {
        project: Uuid,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    Delete {
        project: Uuid,
        media: Uuid,
    },
}

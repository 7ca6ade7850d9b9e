//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::BackendKind;
use crate::status::TaskResult;

/// Top-level CLI parser for `taskgate`.
#[derive(Debug, Parser)]
#[command(
    name = "taskgate",
    version,
    about = "Track dependency-gated tasks and hand ready ones to workers"
)]
pub struct Cli {
    /// Options shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Options accepted before or after any subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Task-definition document (YAML or JSON).
    #[arg(
        long,
        global = true,
        env = "TASKGATE_PLAN",
        value_name = "PATH",
        default_value = "tasks.yaml"
    )]
    pub plan: PathBuf,

    /// Precomputed graph artifact; used instead of `--plan` when given.
    #[arg(long, global = true, env = "TASKGATE_GRAPH", value_name = "PATH")]
    pub graph: Option<PathBuf>,

    /// Spec document for excerpts. Default: `SPEC.md` beside the plan.
    #[arg(long, global = true, env = "TASKGATE_SPEC", value_name = "PATH")]
    pub spec: Option<PathBuf>,

    /// Directory holding per-plan status.
    #[arg(
        long,
        global = true,
        env = "TASKGATE_STATE_DIR",
        value_name = "DIR",
        default_value = ".taskgate"
    )]
    pub state_dir: PathBuf,

    /// Plan identity. Default: the git branch, else the project name.
    #[arg(long, global = true, env = "TASKGATE_SLUG", value_name = "SLUG")]
    pub slug: Option<String>,

    /// Where status is persisted.
    #[arg(
        long,
        global = true,
        env = "TASKGATE_BACKEND",
        value_enum,
        default_value_t = BackendKind::File
    )]
    pub backend: BackendKind,

    /// Snapshot to seed an empty store from.
    #[arg(long, global = true, env = "TASKGATE_IMPORT", value_name = "PATH")]
    pub import: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKGATE_LOG` or `warn` is used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load or create status, recovering from an interrupted session.
    Init,
    /// List tasks ready to dispatch.
    Ready {
        /// Print a JSON array instead of one ID per line.
        #[arg(long)]
        json: bool,
    },
    /// Print the delegation prompt for a task without changing status.
    Prompt {
        /// Task to describe. Default: the first ready task.
        task_id: Option<String>,
        /// Print the payload as JSON instead of the prompt.
        #[arg(long)]
        json: bool,
    },
    /// Mark a ready task as in progress.
    Start {
        /// Task to start.
        task_id: String,
        /// Who is working on it.
        #[arg(long)]
        owner: String,
    },
    /// Pick a task, print its prompt and mark it in progress.
    Dispatch {
        /// Task to dispatch. Default: the first ready task.
        task_id: Option<String>,
        /// Who is working on it.
        #[arg(long)]
        owner: String,
        /// Print the payload as JSON instead of the prompt.
        #[arg(long)]
        json: bool,
    },
    /// Record a worker's result for a task.
    Complete(CompleteArgs),
    /// Show the summary, ready list and every task's state.
    Status {
        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate the plan and report every problem found.
    Validate,
    /// Write the normalized task graph as JSON.
    Graph {
        /// Output file. Default: stdout.
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

/// Arguments of `taskgate complete`.
#[derive(Debug, Clone, Args)]
pub struct CompleteArgs {
    /// Task being reported on.
    pub task_id: String,
    /// Outcome.
    #[arg(long, value_enum)]
    pub result: ResultArg,
    /// What happened.
    #[arg(long)]
    pub summary: String,
    /// Files touched.
    #[arg(long, num_args = 1.., value_name = "PATH")]
    pub files: Vec<String>,
    /// Tests run.
    #[arg(long, num_args = 1.., value_name = "TEST")]
    pub tests: Vec<String>,
    /// Why the task cannot proceed.
    #[arg(long, num_args = 1.., value_name = "REASON")]
    pub blockers: Vec<String>,
    /// Tasks this work unblocks.
    #[arg(long, num_args = 1.., value_name = "TASK_ID")]
    pub next: Vec<String>,
    /// Override the recorded owner.
    #[arg(long)]
    pub owner: Option<String>,
}

/// Outcome as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ResultArg {
    /// The task is finished.
    Done,
    /// The worker could not proceed.
    Blocked,
    /// The worker tried and failed.
    Failed,
}

impl From<ResultArg> for TaskResult {
    fn from(arg: ResultArg) -> Self {
        match arg {
            ResultArg::Done => Self::Done,
            ResultArg::Blocked => Self::Blocked,
            ResultArg::Failed => Self::Failed,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
#[allow(missing_docs)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_with_lists() {
        let cli = Cli::parse_from([
            "taskgate", "complete", "T2", "--result", "blocked", "--summary", "stuck",
            "--blockers", "need key", "T1", "--files", "a.rs", "--files", "b.rs",
        ]);
        let Command::Complete(args) = cli.command else {
            panic!("expected complete");
        };
        assert_eq!(args.task_id, "T2");
        assert_eq!(args.result, ResultArg::Blocked);
        assert_eq!(args.blockers, vec!["need key", "T1"]);
        assert_eq!(args.files, vec!["a.rs", "b.rs"]);
        assert!(args.tests.is_empty());
    }

    #[test]
    fn global_options_are_accepted_after_the_subcommand() {
        let cli = Cli::parse_from(["taskgate", "ready", "--backend", "sqlite", "--slug", "x"]);
        assert_eq!(cli.global.backend, BackendKind::Sqlite);
        assert_eq!(cli.global.slug.as_deref(), Some("x"));
        assert!(matches!(cli.command, Command::Ready { json: false }));
    }

    #[test]
    fn start_requires_owner() {
        assert!(Cli::try_parse_from(["taskgate", "start", "T1"]).is_err());
    }

    #[test]
    fn complete_requires_known_result() {
        let parsed = Cli::try_parse_from([
            "taskgate", "complete", "T1", "--result", "maybe", "--summary", "x",
        ]);
        assert!(parsed.is_err());
    }
}

//! `taskgate complete` command.

use super::Output;
use crate::cli::CompleteArgs;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::errors::Result;
use crate::plan::TaskGraph;
use crate::readiness;
use crate::status::{CompletionReport, LoadOptions};

/// Records a worker's result and shows what became ready.
///
/// # Errors
///
/// Returns the transition's error when the task is unknown or already
/// finished; nothing is persisted in that case.
pub fn run(
    ctx: &ServiceContext,
    graph: &TaskGraph,
    settings: &Settings,
    args: &CompleteArgs,
) -> Result<Output> {
    let report = CompletionReport {
        files_changed: args.files.clone(),
        tests_run: args.tests.clone(),
        blockers: args.blockers.clone(),
        next_unblocked: args.next.clone(),
        owner: args.owner.clone(),
        ..CompletionReport::new(args.result.into(), args.summary.clone())
    };

    let mut store = settings.open_store(ctx)?;
    let mut session = store.open(graph, LoadOptions::reevaluate())?;
    let before = readiness::ready(graph, session.snapshot());
    session.complete(graph, &args.task_id, report)?;
    let warnings = session.warnings().to_vec();
    let snapshot = session.commit()?;

    let mut out = Output { warnings, ..Output::default() };
    if let Some(record) = snapshot.record(&args.task_id) {
        out.line(format!("{} -> {}", args.task_id, record.state));
        if !record.blockers.is_empty() {
            out.line(format!("blockers: {}", record.blockers.join("; ")));
        }
    }
    let unblocked: Vec<String> = readiness::ready(graph, &snapshot)
        .into_iter()
        .filter(|id| !before.contains(id))
        .collect();
    if !unblocked.is_empty() {
        out.line(format!("now ready: {}", unblocked.join(", ")));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::harness::{fs, run, STATUS_PATH};
    use crate::errors::Error;
    use crate::status::TaskState;

    fn stored(fs: &crate::adapters::memory::MemoryFileSystem) -> serde_json::Value {
        serde_json::from_str(&fs.get(STATUS_PATH).unwrap()).unwrap()
    }

    #[test]
    fn done_unblocks_dependents() {
        let fs = fs();
        run(&fs, &["start", "T1", "--owner", "alice"]).unwrap();
        let out = run(
            &fs,
            &["complete", "T1", "--result", "done", "--summary", "built", "--files", "src/api.rs"],
        )
        .unwrap();
        assert_eq!(out.stdout, "T1 -> done\nnow ready: T2\n");

        let status = stored(&fs);
        assert_eq!(status["tasks"]["T1"]["result_summary"], "built");
        assert_eq!(status["tasks"]["T1"]["files_changed"][0], "src/api.rs");
        assert_eq!(status["tasks"]["T1"]["owner"], "alice");
        assert_eq!(status["summary"]["done"], 1);
    }

    #[test]
    fn failure_without_blockers_gets_a_default_reason() {
        let fs = fs();
        run(&fs, &["complete", "T1", "--result", "done", "--summary", "ok"]).unwrap();
        let out = run(&fs, &["complete", "T2", "--result", "failed", "--summary", "x"]).unwrap();
        assert_eq!(out.stdout, "T2 -> blocked\nblockers: task reported failed\n");
        assert_eq!(stored(&fs)["tasks"]["T2"]["blockers"][0], "task reported failed");
    }

    #[test]
    fn blocked_on_a_task_returns_to_todo_once_it_is_done() {
        let fs = fs();
        run(&fs, &["complete", "T2", "--result", "blocked", "--summary", "x", "--blockers", "T1"])
            .unwrap();
        assert_eq!(stored(&fs)["tasks"]["T2"]["state"], "blocked");

        run(&fs, &["complete", "T1", "--result", "done", "--summary", "ok"]).unwrap();
        let out = run(&fs, &["ready"]).unwrap();
        assert_eq!(out.stdout, "T2\n");
        assert_eq!(stored(&fs)["tasks"]["T2"]["state"], "todo");
    }

    #[test]
    fn completing_a_finished_task_fails() {
        let fs = fs();
        run(&fs, &["complete", "T1", "--result", "done", "--summary", "ok"]).unwrap();
        let before = fs.get(STATUS_PATH);
        let err = run(&fs, &["complete", "T1", "--result", "done", "--summary", "again"])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { from: TaskState::Done, .. }));
        assert_eq!(fs.get(STATUS_PATH), before);
    }

    #[test]
    fn owner_override_is_recorded() {
        let fs = fs();
        run(&fs, &["complete", "T1", "--result", "done", "--summary", "ok", "--owner", "bot"])
            .unwrap();
        assert_eq!(stored(&fs)["tasks"]["T1"]["owner"], "bot");
    }

    #[test]
    fn retained_record_of_removed_task_cannot_be_completed() {
        let fs = fs();
        run(&fs, &["init"]).unwrap();
        let mut status = stored(&fs);
        status["tasks"]["gone"] = status["tasks"]["T1"].clone();
        fs.insert(STATUS_PATH, &serde_json::to_string_pretty(&status).unwrap());
        let before = fs.get(STATUS_PATH);

        let err = run(&fs, &["complete", "gone", "--result", "done", "--summary", "x"])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTask(id) if id == "gone"));
        assert_eq!(fs.get(STATUS_PATH), before);
    }
}

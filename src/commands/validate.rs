//! `taskgate validate` command.

use super::Output;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::delegate::{heading_slugs, spec_anchors};
use crate::errors::Result;
use crate::plan::TaskGraph;

/// Reports on a plan that has already passed validation.
///
/// Invalid plans never reach this point: loading fails with every problem
/// listed. Context anchors that match no heading of the spec document are
/// reported as warnings.
///
/// # Errors
///
/// Returns an error if the spec document exists but cannot be read.
pub fn run(ctx: &ServiceContext, graph: &TaskGraph, settings: &Settings) -> Result<Output> {
    let mut out = Output::default();
    out.line(format!(
        "plan OK: project {}, {} task(s), {} edge(s)",
        graph.project(),
        graph.tasks().len(),
        graph.edges().len()
    ));

    if let Some(spec) = settings.read_spec(ctx)? {
        let headings = heading_slugs(&spec);
        for task in graph.tasks() {
            for anchor in spec_anchors(&task.context) {
                if !headings.contains(&anchor) {
                    out.warnings.push(format!(
                        "task '{}' references SPEC.md#{anchor}, which matches no heading in {}",
                        task.id,
                        settings.spec_path.display()
                    ));
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::harness::{fs, run, STATUS_PATH};
    use crate::errors::Error;

    #[test]
    fn valid_plan_is_summarized() {
        let fs = fs();
        let out = run(&fs, &["validate"]).unwrap();
        assert_eq!(out.stdout, "plan OK: project demo, 2 task(s), 1 edge(s)\n");
        assert!(out.warnings.is_empty());
        assert_eq!(fs.get(STATUS_PATH), None);
    }

    #[test]
    fn stale_anchor_is_a_warning() {
        let fs = fs();
        fs.insert("/work/SPEC.md", "# Demo\n\n## Storage\n");
        let out = run(&fs, &["validate"]).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("task 'T2' references SPEC.md#api"));
    }

    #[test]
    fn every_problem_is_reported() {
        let fs = fs();
        fs.insert(
            super::super::harness::PLAN_PATH,
            "\
version: 3
project: demo
tasks:
  - id: A
    title: a
    phase: p
    priority: urgent
    owner_type: backend
    estimate: 1d
    acceptance: [x]
    deliverables: [y]
  - id: B
    phase: p
    priority: low
    owner_type: backend
    estimate: 1d
    acceptance: [x]
    deliverables: [y]
",
        );
        match run(&fs, &["validate"]) {
            Err(Error::Validation(errors)) => assert_eq!(errors.len(), 2, "{errors:?}"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}

//! Prompt rendering.

use std::fmt::Write;

use super::DelegationPayload;

fn bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
}

/// Renders a payload as prompt text.
///
/// Sections always appear in the same order: identity, acceptance
/// criteria, deliverables, context (when present), completed dependencies,
/// spec excerpt (when present), then the response checklist.
#[must_use]
pub fn render(payload: &DelegationPayload) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Task {}: {}", payload.task_id, payload.title);
    let _ = writeln!(out, "Project: {}", payload.project);

    out.push_str("\n## Acceptance criteria\n");
    bullets(&mut out, &payload.acceptance);

    out.push_str("\n## Deliverables\n");
    bullets(&mut out, &payload.deliverables);

    if !payload.context.is_empty() {
        out.push_str("\n## Context\n");
        bullets(&mut out, &payload.context);
    }

    out.push_str("\n## Completed dependencies\n");
    if payload.dependency_results.is_empty() {
        out.push_str("(none)\n");
    }
    for dep in &payload.dependency_results {
        let summary =
            if dep.result_summary.is_empty() { "(no summary)" } else { dep.result_summary.as_str() };
        let _ = writeln!(out, "- {}: {summary}", dep.task_id);
        if !dep.files_changed.is_empty() {
            let _ = writeln!(out, "  files: {}", dep.files_changed.join(", "));
        }
    }

    if let Some(excerpt) = &payload.spec_excerpt {
        out.push_str("\n## Spec excerpt\n");
        out.push_str(excerpt.trim_end());
        out.push('\n');
    }

    out.push_str("\n## Response\nWhen finished, report:\n");
    for field in &payload.response_format {
        let _ = writeln!(out, "- [ ] {}: {}", field.field, field.description);
    }

    out
}

//! Schema checks: turns a raw YAML document into a task graph draft,
//! collecting every problem along the way.

use std::collections::HashSet;

use serde_yaml::{Mapping, Value};

use super::{ValidationError, SCHEMA_VERSION};
use crate::plan::{OwnerType, Priority, Task, TaskGraph, TaskGroup};

/// Parses the document into a graph draft.
///
/// The draft is only returned when no schema error was found; integrity
/// (references, cycles) is checked separately.
pub(super) fn parse_document(document: &Value) -> Result<TaskGraph, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let Some(root) = document.as_mapping() else {
        return Err(vec![ValidationError::NotAMapping { location: "document".to_string() }]);
    };

    check_version(root, &mut errors);
    let project = required_string(root, "document", "project", &mut errors);
    let tasks = parse_tasks(root, &mut errors);
    let critical_paths = parse_groups(root, "critical_paths", &mut errors);
    let parallel_windows = parse_groups(root, "parallel_windows", &mut errors);

    errors.extend(duplicate_ids("task", tasks.iter().map(|t| t.id.as_str())));
    errors.extend(duplicate_ids("critical path", critical_paths.iter().map(|g| g.id.as_str())));
    errors.extend(duplicate_ids("parallel window", parallel_windows.iter().map(|g| g.id.as_str())));

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(TaskGraph::new_unchecked(project.unwrap_or_default(), tasks, critical_paths, parallel_windows))
}

/// Reports each ID that appears more than once, once.
pub(super) fn duplicate_ids<'a>(
    namespace: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut errors = Vec::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            errors.push(ValidationError::DuplicateId { namespace, id: id.to_string() });
        }
    }
    errors
}

fn check_version(root: &Mapping, errors: &mut Vec<ValidationError>) {
    match root.get("version") {
        None | Some(Value::Null) => errors.push(ValidationError::MissingField {
            location: "document".to_string(),
            field: "version",
        }),
        Some(value) => match value.as_i64() {
            Some(found) if found == i64::from(SCHEMA_VERSION) => {}
            Some(found) => errors.push(ValidationError::UnsupportedVersion { found }),
            None => errors.push(ValidationError::InvalidType {
                location: "document".to_string(),
                field: "version",
                expected: "an integer",
            }),
        },
    }
}

fn parse_tasks(root: &Mapping, errors: &mut Vec<ValidationError>) -> Vec<Task> {
    let entries = match root.get("tasks") {
        None | Some(Value::Null) => {
            errors.push(ValidationError::MissingField {
                location: "document".to_string(),
                field: "tasks",
            });
            return Vec::new();
        }
        Some(Value::Sequence(entries)) => entries,
        Some(_) => {
            errors.push(ValidationError::InvalidType {
                location: "document".to_string(),
                field: "tasks",
                expected: "a list",
            });
            return Vec::new();
        }
    };
    if entries.is_empty() {
        errors.push(ValidationError::EmptyList { location: "document".to_string(), field: "tasks" });
    }

    entries
        .iter()
        .enumerate()
        .filter_map(|(pos, entry)| parse_task(pos, entry, errors))
        .collect()
}

fn parse_task(pos: usize, entry: &Value, errors: &mut Vec<ValidationError>) -> Option<Task> {
    let Some(map) = entry.as_mapping() else {
        errors.push(ValidationError::NotAMapping { location: format!("tasks[{pos}]") });
        return None;
    };
    let before = errors.len();

    let id = required_string(map, &format!("tasks[{pos}]"), "id", errors);
    let location = match &id {
        Some(id) => format!("tasks[{pos}] ({id})"),
        None => format!("tasks[{pos}]"),
    };

    let title = required_string(map, &location, "title", errors);
    let phase = required_string(map, &location, "phase", errors);
    let priority = required_enum(map, &location, "priority", &Priority::NAMES, errors)
        .and_then(|name| Priority::parse(&name));
    let owner_type = required_enum(map, &location, "owner_type", &OwnerType::NAMES, errors)
        .and_then(|name| OwnerType::parse(&name));
    let estimate = required_string(map, &location, "estimate", errors);
    let blocked_by = string_list(map, &location, "blocked_by", false, errors).map(dedup);
    let acceptance = string_list(map, &location, "acceptance", true, errors);
    let deliverables = string_list(map, &location, "deliverables", true, errors);
    let context = string_list(map, &location, "context", false, errors);
    let notes = optional_string(map, &location, "notes", errors);

    if errors.len() != before {
        return None;
    }
    Some(Task {
        id: id?,
        title: title?,
        phase: phase?,
        priority: priority?,
        owner_type: owner_type?,
        estimate: estimate?,
        blocked_by: blocked_by?,
        acceptance: acceptance?,
        deliverables: deliverables?,
        context: context?,
        notes,
    })
}

fn parse_groups(
    root: &Mapping,
    field: &'static str,
    errors: &mut Vec<ValidationError>,
) -> Vec<TaskGroup> {
    let entries = match root.get(field) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Sequence(entries)) => entries,
        Some(_) => {
            errors.push(ValidationError::InvalidType {
                location: "document".to_string(),
                field,
                expected: "a list",
            });
            return Vec::new();
        }
    };

    let mut groups = Vec::with_capacity(entries.len());
    for (pos, entry) in entries.iter().enumerate() {
        let Some(map) = entry.as_mapping() else {
            errors.push(ValidationError::NotAMapping { location: format!("{field}[{pos}]") });
            continue;
        };
        let id = required_string(map, &format!("{field}[{pos}]"), "id", errors);
        let location = match &id {
            Some(id) => format!("{field}[{pos}] ({id})"),
            None => format!("{field}[{pos}]"),
        };
        let tasks = string_list(map, &location, "tasks", true, errors);
        if let (Some(id), Some(tasks)) = (id, tasks) {
            groups.push(TaskGroup { id, tasks });
        }
    }
    groups
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_string(
    map: &Mapping,
    location: &str,
    field: &'static str,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match map.get(field) {
        None | Some(Value::Null) => {
            errors.push(ValidationError::MissingField { location: location.to_string(), field });
            None
        }
        Some(value) => match scalar_string(value) {
            Some(s) if s.trim().is_empty() => {
                errors.push(ValidationError::MissingField { location: location.to_string(), field });
                None
            }
            Some(s) => Some(s),
            None => {
                errors.push(ValidationError::InvalidType {
                    location: location.to_string(),
                    field,
                    expected: "a string",
                });
                None
            }
        },
    }
}

fn optional_string(
    map: &Mapping,
    location: &str,
    field: &'static str,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let parsed = scalar_string(value);
            if parsed.is_none() {
                errors.push(ValidationError::InvalidType {
                    location: location.to_string(),
                    field,
                    expected: "a string",
                });
            }
            parsed
        }
    }
}

fn required_enum(
    map: &Mapping,
    location: &str,
    field: &'static str,
    allowed: &'static [&'static str],
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    let value = required_string(map, location, field, errors)?;
    if allowed.contains(&value.as_str()) {
        Some(value)
    } else {
        errors.push(ValidationError::InvalidEnum {
            location: location.to_string(),
            field,
            value,
            allowed,
        });
        None
    }
}

/// Reads a list of strings. Absent optional lists are empty; required lists
/// must be present and non-empty.
fn string_list(
    map: &Mapping,
    location: &str,
    field: &'static str,
    required: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<Vec<String>> {
    let items = match map.get(field) {
        None | Some(Value::Null) if required => {
            errors.push(ValidationError::MissingField { location: location.to_string(), field });
            return None;
        }
        None | Some(Value::Null) => return Some(Vec::new()),
        Some(Value::Sequence(items)) => items,
        Some(_) => {
            errors.push(ValidationError::InvalidType {
                location: location.to_string(),
                field,
                expected: "a list of strings",
            });
            return None;
        }
    };

    let strings: Option<Vec<String>> = items.iter().map(scalar_string).collect();
    let Some(strings) = strings else {
        errors.push(ValidationError::InvalidType {
            location: location.to_string(),
            field,
            expected: "a list of strings",
        });
        return None;
    };
    if required && strings.is_empty() {
        errors.push(ValidationError::EmptyList { location: location.to_string(), field });
        return None;
    }
    Some(strings)
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

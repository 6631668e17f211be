use std::path::Path;

use tracing::{debug, warn};

use crate::error::{GanttError, GanttResult};
use crate::model::{DependencyList, MilestoneInput, TaskInput};

/// Rows read from a CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvImport {
    pub tasks: Vec<TaskInput>,
    pub milestones: Vec<MilestoneInput>,
    /// Rows dropped for being malformed or unnamed.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Id,
    Start,
    End,
    Dependencies,
    Progress,
    Completion,
    Class,
    Status,
    Info,
    Milestone,
}

/// Progress implied by a status word when the progress column is not numeric.
fn status_to_progress(status: &str) -> Option<f64> {
    match status.trim().to_lowercase().as_str() {
        "finished" | "done" | "complete" | "completed" => Some(100.0),
        "in progress" | "in-progress" | "active" | "started" => Some(50.0),
        "released" | "planned" => Some(25.0),
        "firm planned" | "firm-planned" | "not started" | "not-started" | "new" => Some(0.0),
        _ => None,
    }
}

fn parse_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%');
    trimmed.parse::<f64>().ok().or_else(|| status_to_progress(raw))
}

fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons > commas && semicolons >= tabs {
        b';'
    } else if tabs > commas {
        b'\t'
    } else {
        b','
    }
}

fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

fn header_to_column(normalized: &str) -> Option<Column> {
    match normalized {
        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" | "activity" => {
            Some(Column::Name)
        }
        "id" | "taskid" | "key" => Some(Column::Id),
        "start" | "startdate" | "from" | "begin" | "begindate" => Some(Column::Start),
        "end" | "enddate" | "to" | "finish" | "finishdate" | "due" | "duedate" => Some(Column::End),
        "dependencies" | "dependson" | "depends" | "predecessors" | "after" => {
            Some(Column::Dependencies)
        }
        "progress" | "percent" | "percentcomplete" | "done" => Some(Column::Progress),
        "completion" | "completed" => Some(Column::Completion),
        "class" | "customclass" | "kind" | "type" => Some(Column::Class),
        "status" | "state" | "stage" => Some(Column::Status),
        "info" | "description" | "notes" | "note" | "details" | "comment" | "comments" => {
            Some(Column::Info)
        }
        "milestone" | "ismilestone" => Some(Column::Milestone),
        _ => None,
    }
}

/// Reads tasks from a CSV file. See [`import_csv_str`].
pub fn import_csv(path: impl AsRef<Path>) -> GanttResult<CsvImport> {
    let content = std::fs::read_to_string(path.as_ref())?;
    import_csv_str(&content)
}

/// Parses CSV text with a header row.
///
/// The delimiter (comma, semicolon or tab) is detected from the header line and
/// headers are matched loosely ("Task Name", "start_date", ...). Dates are kept
/// as text; the engine defaults the ones it cannot parse.
pub fn import_csv_str(content: &str) -> GanttResult<CsvImport> {
    let first_line = content.lines().next().unwrap_or("");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(first_line))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_column(&normalize_header(h)))
        .collect();

    let has = |c: Column| columns.contains(&Some(c));
    if !has(Column::Name) || !(has(Column::Start) || has(Column::End)) {
        let found: Vec<&str> = headers.iter().collect();
        return Err(GanttError::InvalidImport(format!(
            "missing required columns (task name and a start or end date), found {found:?}"
        )));
    }

    let mut import = CsvImport::default();
    for (i, result) in reader.records().enumerate() {
        let line = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(line, error = %e, "skipping malformed csv row");
                import.skipped += 1;
                continue;
            }
        };

        let mut task = TaskInput::default();
        let mut is_milestone = false;
        for (field, column) in record.iter().zip(&columns) {
            let Some(column) = column else {
                continue;
            };
            let value = (!field.is_empty()).then(|| field.to_string());
            match column {
                Column::Name => task.name = field.to_string(),
                Column::Id => task.id = value,
                Column::Start => task.start = value,
                Column::End => task.end = value,
                Column::Dependencies => task.dependencies = value.map(DependencyList::Csv),
                Column::Progress => task.progress = parse_percent(field),
                Column::Completion => task.completion = parse_percent(field),
                Column::Class => task.custom_class = value,
                Column::Status => {
                    if task.progress.is_none() {
                        task.progress = status_to_progress(field);
                    }
                    task.status = value;
                }
                Column::Info => task.info = value,
                Column::Milestone => {
                    is_milestone = matches!(
                        field.to_lowercase().as_str(),
                        "true" | "yes" | "1" | "milestone"
                    );
                }
            }
        }

        if task.name.is_empty() {
            debug!(line, "skipping csv row without a name");
            import.skipped += 1;
            continue;
        }
        if is_milestone {
            import.milestones.push(MilestoneInput {
                id: task.id,
                name: task.name,
                date: task.start.or(task.end),
            });
        } else {
            import.tasks.push(task);
        }
    }

    if import.tasks.is_empty() {
        return Err(GanttError::InvalidImport(format!(
            "no tasks found ({} rows skipped)",
            import.skipped
        )));
    }
    debug!(
        tasks = import.tasks.len(),
        milestones = import.milestones.len(),
        skipped = import.skipped,
        "csv imported"
    );
    Ok(import)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_loosely_named_columns() {
        let csv = "Task Name;Start Date;End Date;Depends On;Progress;Type\n\
                   Design;2024-01-01;2024-01-03;;40;\n\
                   Build;2024-01-04;2024-01-09;Design;done;bar-activity\n";
        let import = import_csv_str(csv).unwrap();
        assert_eq!(import.tasks.len(), 2);
        let build = &import.tasks[1];
        assert_eq!(build.name, "Build");
        assert_eq!(build.start.as_deref(), Some("2024-01-04"));
        assert_eq!(build.dependencies.as_ref().unwrap().ids(), vec!["Design"]);
        assert_eq!(build.progress, Some(100.0));
        assert_eq!(build.custom_class.as_deref(), Some("bar-activity"));
        assert_eq!(import.tasks[0].progress, Some(40.0));
        assert!(import.tasks[0].dependencies.is_none());
    }

    #[test]
    fn milestone_rows_are_split_out() {
        let csv = "name,start,end,milestone\n\
                   Kickoff,2024-01-01,,yes\n\
                   Work,2024-01-01,2024-01-05,\n\
                   ,2024-01-02,2024-01-03,\n";
        let import = import_csv_str(csv).unwrap();
        assert_eq!(import.tasks.len(), 1);
        assert_eq!(import.milestones.len(), 1);
        assert_eq!(import.milestones[0].date.as_deref(), Some("2024-01-01"));
        assert_eq!(import.skipped, 1);
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = import_csv_str("title,owner\nA,bob\n").unwrap_err();
        assert!(matches!(err, GanttError::InvalidImport(_)));
    }

    #[test]
    fn blank_dates_stay_absent() {
        let import = import_csv_str("name,start,end\nA,,2024-01-05\n").unwrap();
        assert!(import.tasks[0].start.is_none());
        assert_eq!(import.tasks[0].end.as_deref(), Some("2024-01-05"));
    }
}

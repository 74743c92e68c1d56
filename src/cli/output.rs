//! Output formatting utilities for the CLI.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use uuid::Uuid;

use crate::domain::models::Task;
use crate::services::Bottleneck;

/// Render tasks as a table: title, status, steps, and blockers.
pub fn format_task_table(tasks: &[Task], blockers: &[(Uuid, Vec<String>)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Task", "Status", "Steps", "Blocked by"]);

    for task in tasks {
        let blocked_by = blockers
            .iter()
            .find(|(id, _)| *id == task.id)
            .map(|(_, titles)| titles.join(", "))
            .unwrap_or_default();
        table.add_row(vec![
            task.title.clone(),
            task.status.as_str().to_string(),
            task.plan.len().to_string(),
            blocked_by,
        ]);
    }
    table
}

/// Render bottleneck diagnostics as a table.
pub fn format_bottleneck_table(bottlenecks: &[Bottleneck]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Blocker", "Tasks blocked"]);

    for bottleneck in bottlenecks {
        table.add_row(vec![
            bottleneck.title.clone(),
            bottleneck.blocked_count.to_string(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_table_contains_titles() {
        let task = Task::new("Add schema", "d");
        let rendered = format_task_table(&[task], &[]).to_string();
        assert!(rendered.contains("Add schema"));
        assert!(rendered.contains("pending"));
    }

    #[test]
    fn test_bottleneck_table_contains_counts() {
        let bottleneck = Bottleneck {
            task_id: Uuid::new_v4(),
            title: "Add schema".to_string(),
            blocked_count: 3,
        };
        let rendered = format_bottleneck_table(&[bottleneck]).to_string();
        assert!(rendered.contains("Add schema"));
        assert!(rendered.contains('3'));
    }
}

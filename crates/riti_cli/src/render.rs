use riti_core::error::AppError;
use riti_core::model::Task;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::UtcOffset;
use time::macros::format_description;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "TITLE")]
    title: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "DUE")]
    due: String,
    #[tabled(rename = "REWARD")]
    reward: u32,
    #[tabled(rename = "STATUS")]
    status: String,
}

pub fn format_instant(instant: OffsetDateTime, offset: UtcOffset) -> String {
    let description = format_description!("[year]-[month]-[day] [hour]:[minute]");
    instant
        .to_offset(offset)
        .format(description)
        .unwrap_or_else(|_| instant.to_string())
}

fn repeat_label(task: &Task) -> String {
    match task.successor_interval() {
        Some(1) => format!("{} (repeats)", task.recurrence),
        Some(interval) => format!("{} (every {interval})", task.recurrence),
        None => task.recurrence.to_string(),
    }
}

fn status_label(task: &Task, now: OffsetDateTime) -> &'static str {
    if task.completed {
        "completed"
    } else if task.due_date < now {
        "overdue"
    } else {
        "pending"
    }
}

pub fn tasks_table<'a, I>(tasks: I, now: OffsetDateTime, offset: UtcOffset) -> String
where
    I: IntoIterator<Item = &'a Task>,
{
    let rows: Vec<TaskRow> = tasks
        .into_iter()
        .map(|task| TaskRow {
            id: task.id.clone(),
            title: task.title.clone(),
            category: repeat_label(task),
            due: format_instant(task.due_date, offset),
            reward: task.reward,
            status: status_label(task, now).to_string(),
        })
        .collect();

    if rows.is_empty() {
        return "No tasks.".to_string();
    }

    Table::new(rows).with(Style::sharp()).to_string()
}

pub fn task_details(task: &Task, offset: UtcOffset) -> String {
    let mut lines = vec![
        format!("{} ({})", task.title, task.id),
        format!("  {}", task.description),
        format!("  category:  {}", repeat_label(task)),
        format!("  due:       {}", format_instant(task.due_date, offset)),
        format!("  reward:    {} coins", task.reward),
    ];
    match task.completed_at {
        Some(completed_at) => {
            lines.push(format!(
                "  completed: {}",
                format_instant(completed_at, offset)
            ));
            let proof_len = task.proof_image.as_deref().map(str::len).unwrap_or(0);
            lines.push(format!("  proof:     {proof_len} bytes"));
        }
        None => lines.push("  completed: no".to_string()),
    }
    lines.join("\n")
}

/// Task summary without the proof payload, for list output.
pub fn task_summary_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "recurrence": task.recurrence,
        "due_date": rfc3339(task.due_date),
        "reward": task.reward,
        "completed": task.completed,
        "completed_at": task.completed_at.map(rfc3339),
        "has_proof": task.proof_image.is_some(),
        "is_recurring": task.is_recurring,
        "recurring_interval": task.recurring_interval,
    })
}

pub fn task_json(task: &Task) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(task).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn tasks_json<'a, I>(tasks: I) -> serde_json::Value
where
    I: IntoIterator<Item = &'a Task>,
{
    serde_json::Value::Array(tasks.into_iter().map(task_summary_json).collect())
}

fn rfc3339(instant: OffsetDateTime) -> String {
    instant
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| instant.to_string())
}

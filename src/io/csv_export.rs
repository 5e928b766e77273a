use std::io::Write;
use std::path::Path;

use crate::model::date;
use crate::model::Task;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV: {0}")]
    Io(#[from] std::io::Error),
}

/// Export tasks to a semicolon-delimited CSV file.
///
/// Columns: Задача ; Начало ; Дедлайн ; Статус ; Исполнитель
/// Dates are normalised to DD.MM.YYYY; unparseable dates are written as-is.
/// Returns the number of tasks written.
pub fn export_csv(tasks: &[Task], path: &Path) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path)?;
    let written = write_csv(tasks, file)?;
    tracing::info!(path = %path.display(), tasks = written, "exported CSV");
    Ok(written)
}

pub fn write_csv<W: Write>(tasks: &[Task], out: W) -> Result<usize, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(out);

    wtr.write_record(["Задача", "Начало", "Дедлайн", "Статус", "Исполнитель"])?;

    for task in tasks {
        let start = normalised(task.start_date.as_deref());
        let deadline = normalised(task.deadline.as_deref());
        wtr.write_record([
            task.title.as_str(),
            &start,
            &deadline,
            task.status_class().wire_value(),
            task.assignee_label(),
        ])?;
    }

    wtr.flush()?;
    Ok(tasks.len())
}

fn normalised(raw: Option<&str>) -> String {
    match date::parse(raw).valid() {
        Some(d) => date::format(d),
        None => raw.unwrap_or_default().to_string(),
    }
}

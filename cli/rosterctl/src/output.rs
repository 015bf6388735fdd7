//! Output formatting for CLI commands.

use chrono::{Local, Weekday};
use colored::Colorize;
use roster_core::{ChangeRecord, ShiftCode};
use roster_session::ScheduleGrid;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

/// Print data in the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No changes recorded.".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => println!("{}", format_json(data, "[]")),
    }
}

/// Print a single item as JSON.
pub fn print_json<T: Serialize>(data: &T) {
    println!("{}", format_json(data, "{}"));
}

fn format_json<T: Serialize + ?Sized>(data: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| fallback.to_string())
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

/// One audit record as a table row.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct HistoryRow {
    #[tabled(rename = "When")]
    pub when: String,

    #[tabled(rename = "Worker")]
    pub worker: String,

    #[tabled(rename = "Day")]
    pub day: u32,

    #[tabled(rename = "From")]
    pub from: String,

    #[tabled(rename = "To")]
    pub to: String,
}

impl From<&ChangeRecord> for HistoryRow {
    fn from(record: &ChangeRecord) -> Self {
        Self {
            when: record
                .at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            worker: record.worker.clone(),
            day: record.day,
            from: record.previous.code().to_string(),
            to: record.next.code().to_string(),
        }
    }
}

pub fn history_rows(records: &[ChangeRecord]) -> Vec<HistoryRow> {
    records.iter().map(HistoryRow::from).collect()
}

/// Render the grid with one colored cell per day.
pub fn render_grid(grid: &ScheduleGrid) -> String {
    let name_width = grid
        .rows
        .iter()
        .map(|r| r.worker.chars().count() + 2)
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!("{}\n", grid.period.to_string().bold()));

    let mut days = format!("{:name_width$}", "");
    let mut weekdays = format!("{:name_width$}", "");
    for (idx, weekday) in grid.weekdays.iter().enumerate() {
        // Same width as a cell: a space, then the code padded to three.
        days.push_str(&format!(" {:^3}", idx + 1));
        weekdays.push_str(&format!(" {:^3}", weekday_initial(*weekday)));
    }
    out.push_str(&format!("{}\n{}\n", days, weekdays.dimmed()));

    for row in &grid.rows {
        let marker = if row.fixed { "*" } else { " " };
        let label = format!("{}{}", row.worker, marker);
        out.push_str(&format!("{label:name_width$}"));
        for cell in &row.cells {
            out.push(' ');
            out.push_str(&shift_cell(cell.code));
        }
        out.push('\n');
    }

    out.push_str(&legend());
    out
}

fn shift_cell(code: ShiftCode) -> String {
    let (r, g, b) = code.rgb();
    format!(" {} ", code.code())
        .truecolor(0, 0, 0)
        .on_truecolor(r, g, b)
        .to_string()
}

fn legend() -> String {
    ShiftCode::CYCLE
        .iter()
        .map(|code| {
            let hours = code.hours().unwrap_or("off");
            format!("{} {}", shift_cell(*code), hours)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn weekday_initial(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Tu",
        Weekday::Wed => "We",
        Weekday::Thu => "Th",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "Su",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use roster_core::{generate, Period, Roster};

    #[test]
    fn test_history_row_from_record() {
        let record = ChangeRecord {
            worker: "Tato".to_string(),
            day: 1,
            previous: ShiftCode::Night,
            next: ShiftCode::Morning,
            at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            period: None,
        };

        let row = HistoryRow::from(&record);
        assert_eq!(row.worker, "Tato");
        assert_eq!(row.from, "N");
        assert_eq!(row.to, "M");
        assert!(row.when.starts_with("2025-06-0"));
    }

    #[test]
    fn test_grid_lists_every_worker() {
        colored::control::set_override(false);

        let roster = Roster::reference();
        let period = Period::new(2025, 6).unwrap();
        let grid = ScheduleGrid::new(&generate(&roster, period), &roster);
        let rendered = render_grid(&grid);

        assert!(rendered.starts_with("2025-6\n"));
        assert!(rendered.contains("Yolanda*"));
        for worker in roster.workers() {
            assert!(rendered.contains(worker.as_str()));
        }
        assert!(rendered.contains(" 30"));
        assert!(rendered.contains("Su"));
    }

    #[test]
    fn test_grid_headers_line_up_with_cells() {
        colored::control::set_override(false);

        let roster = Roster::reference();
        let period = Period::new(2025, 6).unwrap();
        let grid = ScheduleGrid::new(&generate(&roster, period), &roster);
        let rendered = render_grid(&grid);

        // Period title, day numbers, weekdays, then one line per worker.
        let lines: Vec<&str> = rendered.lines().skip(1).take(2 + grid.rows.len()).collect();
        let width = lines[0].chars().count();
        for line in &lines {
            assert_eq!(line.chars().count(), width, "{line:?}");
        }

        // Day 4's header sits over Yolanda's Off cell on the rest day.
        let day_col = lines[0].find(" 4 ").unwrap();
        let yolanda = lines.iter().find(|l| l.starts_with("Yolanda")).unwrap();
        assert_eq!(&yolanda[day_col..day_col + 3], " L ");
    }
}

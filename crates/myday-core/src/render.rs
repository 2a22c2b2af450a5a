use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::{format_long_date, format_short_date, next_day};
use crate::editor::TaskForm;
use crate::progress::Progress;
use crate::task::Task;
use crate::view::{View, select};

const PROGRESS_BAR_WIDTH: usize = 20;

/// Everything a surface needs to draw one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub view: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub date: String,
    pub progress: Progress,
    pub rows: Vec<TaskRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub id: u64,
    pub title: String,
    pub meta: String,
    pub completed: bool,
    pub important: bool,
}

impl Page {
    #[tracing::instrument(skip(tasks, today))]
    pub fn build(tasks: &[Task], view: View, today: NaiveDate) -> Self {
        let visible = select(tasks, view, today);
        let progress = Progress::of(visible.iter().copied());
        let style = view.style();

        let rows = visible
            .into_iter()
            .map(|task| TaskRow {
                id: task.id,
                title: task.title.clone(),
                meta: format!("{} • {}", tags_label(task), due_label(task, today)),
                completed: task.completed,
                important: task.is_important,
            })
            .collect();

        Self {
            view: view.key(),
            title: style.title,
            icon: style.icon,
            color: style.color,
            date: format_long_date(today),
            progress,
            rows,
        }
    }

    pub fn progress_label(&self) -> String {
        format!("{} Progress", self.title)
    }
}

pub fn tags_label(task: &Task) -> String {
    if task.tags.is_empty() {
        "No tags".to_string()
    } else {
        task.tags.join(" • ")
    }
}

pub fn due_label(task: &Task, today: NaiveDate) -> String {
    match task.due_date {
        None => "No date".to_string(),
        Some(date) if date == today => "Today".to_string(),
        Some(date) if date == next_day(today) => "Tomorrow".to_string(),
        Some(date) => format_short_date(date),
    }
}

/// Prints pages and forms to stdout.
#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, page), fields(view = page.view))]
    pub fn print_page(&mut self, page: &Page) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_page(&mut out, page)
    }

    pub fn write_page<W: Write>(&self, mut out: W, page: &Page) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(page.title, "1"))?;
        writeln!(out, "{}", page.date)?;
        writeln!(out)?;

        let filled = usize::from(page.progress.percent) * PROGRESS_BAR_WIDTH / 100;
        writeln!(
            out,
            "{}  [{}{}] {:>3}%",
            page.progress_label(),
            "#".repeat(filled),
            "-".repeat(PROGRESS_BAR_WIDTH - filled),
            page.progress.percent
        )?;
        writeln!(out, "{}", page.progress.caption())?;
        writeln!(out)?;

        if page.rows.is_empty() {
            writeln!(out, "No tasks yet")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Done".to_string(),
            "Star".to_string(),
            "Title".to_string(),
            "Details".to_string(),
        ];

        let rows = page
            .rows
            .iter()
            .map(|row| {
                let done = if row.completed { "[x]" } else { "[ ]" };
                let star = if row.important {
                    self.paint("★", "33")
                } else {
                    "☆".to_string()
                };
                let title = if row.completed {
                    self.paint(&row.title, "9")
                } else {
                    row.title.clone()
                };
                vec![
                    self.paint(&row.id.to_string(), "33"),
                    done.to_string(),
                    star,
                    title,
                    row.meta.clone(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, form))]
    pub fn print_form(&mut self, form: &TaskForm, editing_id: Option<u64>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        write_form(&mut out, form, editing_id)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

pub fn write_form<W: Write>(
    mut out: W,
    form: &TaskForm,
    editing_id: Option<u64>,
) -> anyhow::Result<()> {
    match editing_id {
        Some(id) => writeln!(out, "editing     {id}")?,
        None => writeln!(out, "new task")?,
    }
    writeln!(out, "title       {}", form.title)?;
    writeln!(out, "description {}", form.description)?;
    writeln!(out, "due         {}", form.due_date)?;
    writeln!(out, "priority    {}", form.priority)?;
    writeln!(out, "tags        {}", form.tags)?;
    writeln!(out, "status      {}", form.status)?;
    Ok(())
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::{Page, Renderer, due_label, write_form};
    use crate::editor::TaskForm;
    use crate::task::Task;
    use crate::view::View;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).expect("date")
    }

    #[test]
    fn due_labels() {
        let mut task = Task::new(1, "t");
        assert_eq!(due_label(&task, today()), "No date");
        task.due_date = Some(today());
        assert_eq!(due_label(&task, today()), "Today");
        task.due_date = today().checked_add_days(Days::new(1));
        assert_eq!(due_label(&task, today()), "Tomorrow");
        task.due_date = NaiveDate::from_ymd_opt(2026, 11, 3);
        assert_eq!(due_label(&task, today()), "Nov 3");
    }

    #[test]
    fn page_carries_view_style_progress_and_rows() {
        let mut a = Task::new(1, "Standup");
        a.due_date = Some(today());
        a.tags = vec!["Work".to_string(), "Daily".to_string()];
        a.completed = true;
        let mut b = Task::new(2, "Groceries");
        b.due_date = Some(today());
        let c = Task::new(3, "Someday");

        let page = Page::build(&[a, b, c], View::MyDay, today());
        assert_eq!(page.title, "My Day");
        assert_eq!(page.icon, "fa-sun");
        assert_eq!(page.color, "#FFD43B");
        assert_eq!(page.date, "Thursday, October 15, 2026");
        assert_eq!(page.progress.percent, 50);
        assert_eq!(page.progress_label(), "My Day Progress");
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].meta, "Work • Daily • Today");
        assert_eq!(page.rows[1].meta, "No tags • Today");
    }

    #[test]
    fn writes_placeholder_for_empty_view() {
        let page = Page::build(&[], View::Important, today());
        let mut buf = Vec::new();
        Renderer::plain()
            .write_page(&mut buf, &page)
            .expect("write page");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("Important\n"));
        assert!(text.contains("0 of 0 completed"));
        assert!(text.contains("No tasks yet"));
    }

    #[test]
    fn writes_aligned_rows() {
        let mut task = Task::new(12, "Write docs");
        task.is_important = true;
        let page = Page::build(&[task], View::AllTasks, today());
        let mut buf = Vec::new();
        Renderer::plain()
            .write_page(&mut buf, &page)
            .expect("write page");
        let text = String::from_utf8(buf).expect("utf8");
        let row = text
            .lines()
            .find(|line| line.starts_with("12 "))
            .expect("task row");
        assert!(row.starts_with("12 [ ]"));
        assert!(row.contains("★"));
        assert!(row.contains("Write docs No tags • No date"));
    }

    #[test]
    fn form_dump_lists_every_field() {
        let form = TaskForm {
            title: "Plan".to_string(),
            tags: "a, b".to_string(),
            ..TaskForm::default()
        };
        let mut buf = Vec::new();
        write_form(&mut buf, &form, Some(9)).expect("write form");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("editing     9\n"));
        assert!(text.contains("priority    medium"));
        assert!(text.contains("status      to-do"));
    }
}

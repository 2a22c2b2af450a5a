use std::fmt;

use chrono::NaiveDate;
use tracing::trace;

use crate::task::Task;

/// A named perspective on the task
/// list.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
)]
pub enum View {
  #[default]
  MyDay,
  Important,
  Planned,
  AllTasks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewStyle {
  pub title: &'static str,
  pub icon:  &'static str,
  pub color: &'static str
}

impl View {
  pub const ALL: [View; 4] = [
    View::MyDay,
    View::Important,
    View::Planned,
    View::AllTasks
  ];

  /// Keys match exactly; anything
  /// else selects every task.
  #[must_use]
  pub fn from_key(key: &str) -> Self {
    match key {
      | "myday" => View::MyDay,
      | "important" => View::Important,
      | "planned" => View::Planned,
      | _ => View::AllTasks
    }
  }

  #[must_use]
  pub fn key(self) -> &'static str {
    match self {
      | View::MyDay => "myday",
      | View::Important => "important",
      | View::Planned => "planned",
      | View::AllTasks => "alltasks"
    }
  }

  #[must_use]
  pub fn style(self) -> ViewStyle {
    match self {
      | View::MyDay => {
        ViewStyle {
          title: "My Day",
          icon:  "fa-sun",
          color: "#FFD43B"
        }
      }
      | View::Important => {
        ViewStyle {
          title: "Important",
          icon:  "fa-star",
          color: "#FFC107"
        }
      }
      | View::Planned => {
        ViewStyle {
          title: "Planned",
          icon:  "fa-calendar-days",
          color: "#2196F3"
        }
      }
      | View::AllTasks => {
        ViewStyle {
          title: "All Tasks",
          icon:  "fa-list-check",
          color: "#9C27B0"
        }
      }
    }
  }

  #[must_use]
  pub fn matches(
    self,
    task: &Task,
    today: NaiveDate
  ) -> bool {
    match self {
      | View::MyDay => {
        task.is_due_on(today)
      }
      | View::Important => {
        task.is_important
      }
      | View::Planned => {
        task.due_date.is_some()
          && !task.is_due_on(today)
      }
      | View::AllTasks => true
    }
  }
}

impl fmt::Display for View {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.key())
  }
}

/// The tasks visible in `view`, in
/// store order.
#[tracing::instrument(skip(
  tasks, today
))]
pub fn select(
  tasks: &[Task],
  view: View,
  today: NaiveDate
) -> Vec<&Task> {
  let out: Vec<&Task> = tasks
    .iter()
    .filter(|task| {
      view.matches(task, today)
    })
    .collect();
  trace!(
    total = tasks.len(),
    selected = out.len(),
    "selected tasks for view"
  );
  out
}

#[cfg(test)]
mod tests {
  use chrono::{
    Days,
    NaiveDate
  };

  use super::{
    View,
    select
  };
  use crate::task::Task;

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(
      2026, 10, 15
    )
    .expect("valid date")
  }

  fn fixture() -> Vec<Task> {
    let mut due_today =
      Task::new(1, "today");
    due_today.due_date = Some(today());

    let mut due_later =
      Task::new(2, "later");
    due_later.due_date = today()
      .checked_add_days(Days::new(3));
    due_later.is_important = true;

    let undated = Task::new(3, "undated");

    let mut overdue =
      Task::new(4, "overdue");
    overdue.due_date = today()
      .checked_sub_days(Days::new(1));

    vec![
      due_today, due_later, undated,
      overdue,
    ]
  }

  fn ids(tasks: &[&Task]) -> Vec<u64> {
    tasks.iter().map(|t| t.id).collect()
  }

  #[test]
  fn my_day_and_planned_partition_dated_tasks()
   {
    let tasks = fixture();
    let myday =
      select(&tasks, View::MyDay, today());
    let planned = select(
      &tasks,
      View::Planned,
      today()
    );
    let all = select(
      &tasks,
      View::AllTasks,
      today()
    );

    assert_eq!(ids(&myday), vec![1]);
    assert_eq!(ids(&planned), vec![2, 4]);
    assert_eq!(ids(&all), vec![1, 2, 3, 4]);

    for task in &tasks {
      let in_myday =
        myday.iter().any(|t| t.id == task.id);
      let in_planned = planned
        .iter()
        .any(|t| t.id == task.id);
      assert!(!(in_myday && in_planned));
      if task.due_date.is_none() {
        assert!(!in_myday && !in_planned);
      }
    }
  }

  #[test]
  fn important_view_uses_flag_only() {
    let tasks = fixture();
    let important = select(
      &tasks,
      View::Important,
      today()
    );
    assert_eq!(ids(&important), vec![2]);
  }

  #[test]
  fn unknown_keys_fall_back_to_all_tasks()
   {
    assert_eq!(
      View::from_key("someday"),
      View::AllTasks
    );
    for key in
      ["MyDay", "MYDAY", " planned "]
    {
      assert_eq!(
        View::from_key(key),
        View::AllTasks
      );
    }
    for view in View::ALL {
      assert_eq!(
        View::from_key(view.key()),
        view
      );
    }
  }
}

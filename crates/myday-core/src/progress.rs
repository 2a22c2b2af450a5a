use serde::Serialize;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub percent: u8,
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion over `tasks`. The percentage rounds half up, so 12.5%
    /// becomes 13% and 33.3% becomes 33%.
    pub fn of<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let (completed, total) = tasks
            .into_iter()
            .fold((0usize, 0usize), |(done, total), task| {
                (done + usize::from(task.completed), total + 1)
            });
        Self::from_counts(completed, total)
    }

    pub fn from_counts(completed: usize, total: usize) -> Self {
        if total == 0 {
            return Self::default();
        }
        let completed = completed.min(total);
        let percent = (200 * completed + total) / (2 * total);
        Self {
            percent: u8::try_from(percent).unwrap_or(100),
            completed,
            total,
        }
    }

    pub fn caption(&self) -> String {
        format!("{} of {} completed", self.completed, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::Progress;
    use crate::task::Task;

    fn tasks(done: &[bool]) -> Vec<Task> {
        done.iter()
            .enumerate()
            .map(|(i, &completed)| {
                let mut task = Task::new(i as u64 + 1, format!("t{i}"));
                task.completed = completed;
                task
            })
            .collect()
    }

    #[test]
    fn empty_input_is_all_zero() {
        let empty: Vec<Task> = vec![];
        assert_eq!(
            Progress::of(&empty),
            Progress {
                percent: 0,
                completed: 0,
                total: 0
            }
        );
    }

    #[test]
    fn one_of_three_rounds_down_to_33() {
        let progress = Progress::of(&tasks(&[true, false, false]));
        assert_eq!(
            progress,
            Progress {
                percent: 33,
                completed: 1,
                total: 3
            }
        );
        assert_eq!(progress.caption(), "1 of 3 completed");
    }

    #[test]
    fn exact_halves_round_up() {
        assert_eq!(Progress::from_counts(1, 8).percent, 13);
        assert_eq!(Progress::from_counts(1, 200).percent, 1);
        assert_eq!(Progress::from_counts(2, 3).percent, 67);
        assert_eq!(Progress::from_counts(4, 4).percent, 100);
    }
}

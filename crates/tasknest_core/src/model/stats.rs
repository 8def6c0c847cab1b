//! Counters shown above the task list.

use crate::model::task::Task;

/// Derived counts over one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    /// High urgency and not completed.
    pub high_priority_open: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            if task.completed {
                stats.completed += 1;
            }
            if task.is_high_priority_open() {
                stats.high_priority_open += 1;
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStats;
    use crate::model::task::{Task, Urgency};

    #[test]
    fn empty_snapshot_has_zero_counts() {
        assert_eq!(TaskStats::from_tasks(&[]), TaskStats::default());
    }

    #[test]
    fn counts_follow_completion_and_urgency() {
        let mut done_high = Task::new("ship release", Urgency::High);
        done_high.completed = true;
        let tasks = vec![
            Task::new("fix login", Urgency::High),
            done_high,
            Task::new("water plants", Urgency::Low),
        ];

        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.high_priority_open, 1);
    }
}

use crate::simulator::{self, normalize};
use crate::tasks::{builtin_tasks, Progress, ProgressAction, ProgressEvent, Task, TaskStatus};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub input: String,
    pub output: String,
    pub is_error: bool,
}

impl LogEntry {
    pub fn new(input: &str, output: &str) -> Self {
        LogEntry {
            input: input.into(),
            output: output.into(),
            is_error: false,
        }
    }
    pub fn error(input: &str, output: &str) -> Self {
        LogEntry {
            is_error: true,
            ..LogEntry::new(input, output)
        }
    }
}

/// Append-only scrollback. With a limit set the oldest entries fall off.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: VecDeque<LogEntry>,
    limit: Option<usize>,
}

impl CommandLog {
    pub fn new(limit: Option<usize>) -> Self {
        CommandLog {
            entries: VecDeque::new(),
            limit,
        }
    }
    pub fn push(&mut self, entry: LogEntry) {
        if self.limit == Some(0) {
            return;
        }
        self.entries.push_back(entry);
        if let Some(max) = self.limit {
            while self.entries.len() > max {
                self.entries.pop_front();
            }
        }
    }
    pub fn clear(&mut self) {
        self.entries.clear();
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank line, nothing happened.
    Ignored,
    Cleared,
    Output {
        output: String,
        completed: Option<(u32, u32)>,
    },
    Advanced { title: String },
}

impl SubmitOutcome {
    /// XP earned by this submission, if a task was completed.
    pub fn xp(&self) -> u32 {
        match self {
            SubmitOutcome::Output {
                completed: Some((_, xp)),
                ..
            } => *xp,
            _ => 0,
        }
    }
}

#[derive(Serialize)]
struct TaskView<'a> {
    #[serde(flatten)]
    task: &'a Task,
    status: TaskStatus,
}

/// The terminal tab: scrollback, task list and progress in one place.
pub struct TerminalSession {
    tasks: Vec<Task>,
    progress: Progress,
    log: CommandLog,
}

impl Default for TerminalSession {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TerminalSession {
    pub fn new(log_limit: Option<usize>) -> Self {
        Self::with_tasks(builtin_tasks(), log_limit)
    }

    pub fn with_tasks(tasks: Vec<Task>, log_limit: Option<usize>) -> Self {
        TerminalSession {
            tasks,
            progress: Progress::new(),
            log: CommandLog::new(log_limit),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
    pub fn progress(&self) -> &Progress {
        &self.progress
    }
    pub fn log(&self) -> &CommandLog {
        &self.log
    }
    pub fn current_task(&self) -> Option<&Task> {
        self.progress.active_task(&self.tasks)
    }

    pub fn submit(&mut self, input: &str) -> SubmitOutcome {
        let cmd = normalize(input);
        if cmd.is_empty() {
            return SubmitOutcome::Ignored;
        }

        if cmd == "next" && self.progress.is_active_completed(&self.tasks) {
            return self.advance();
        }

        let output = simulator::simulate(input);
        let cleared = simulator::is_clear(&output);
        if cleared {
            self.log.clear();
        } else if simulator::classify(input).is_none() {
            self.log.push(LogEntry::error(input, &output));
        } else {
            self.log.push(LogEntry::new(input, &output));
        }

        let (next, event) = self.progress.apply(&self.tasks, ProgressAction::Command(input));
        self.progress = next;
        let completed = match event {
            Some(ProgressEvent::Completed { task_id, xp }) => {
                info!(task_id, xp, "task completed");
                self.log.push(LogEntry::new(
                    "✅ TASK COMPLETED!",
                    &format!(
                        "Great job! You earned {} XP. Type 'next' to continue to the next task.",
                        xp
                    ),
                ));
                Some((task_id, xp))
            }
            _ => None,
        };

        if cleared && completed.is_none() {
            SubmitOutcome::Cleared
        } else {
            SubmitOutcome::Output { output, completed }
        }
    }

    /// Moves to the next task if the current one is done. A no-op otherwise.
    pub fn advance(&mut self) -> SubmitOutcome {
        let (next, event) = self.progress.apply(&self.tasks, ProgressAction::Advance);
        self.progress = next;
        match event {
            Some(ProgressEvent::Advanced { index, title }) => {
                debug!(index, "advanced to next task");
                self.log
                    .push(LogEntry::new("next", &format!("Starting new task: {}", title)));
                SubmitOutcome::Advanced { title }
            }
            _ => SubmitOutcome::Ignored,
        }
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }

    pub fn tasks_json(&self) -> String {
        let views: Vec<TaskView> = self
            .tasks
            .iter()
            .enumerate()
            .map(|(i, task)| TaskView {
                task,
                status: self.progress.status_of(&self.tasks, i),
            })
            .collect();
        serde_json::to_string(&views).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn log_json(&self) -> String {
        let entries: Vec<&LogEntry> = self.log.iter().collect();
        serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
    }
}

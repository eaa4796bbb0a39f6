use crate::simulator::normalize;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub command: String,
    pub hint: String,
    pub xp: u32,
}

impl Task {
    pub fn new(id: u32, title: &str, description: &str, command: &str, hint: &str, xp: u32) -> Self {
        Task {
            id,
            title: title.into(),
            description: description.into(),
            command: command.into(),
            hint: hint.into(),
            xp,
        }
    }
}

pub fn builtin_tasks() -> Vec<Task> {
    vec![
        Task::new(
            1,
            "Network Discovery",
            "Scan the local network to discover active hosts",
            "nmap -sn 192.168.1.0/24",
            "Use nmap with the -sn flag for ping scan",
            50,
        ),
        Task::new(
            2,
            "Port Scanning",
            "Perform a TCP port scan on a target host",
            "nmap -sT 192.168.1.1",
            "Use nmap with -sT flag for TCP connect scan",
            75,
        ),
        Task::new(
            3,
            "Service Detection",
            "Detect services and versions running on open ports",
            "nmap -sV 192.168.1.1",
            "Use the -sV flag to detect service versions",
            100,
        ),
        Task::new(
            4,
            "Directory Enumeration",
            "Use dirb to enumerate web directories",
            "dirb http://target.com",
            "Use dirb followed by the target URL",
            125,
        ),
        Task::new(
            5,
            "Password Cracking",
            "Use hydra for SSH brute force attack",
            "hydra -l admin -P /usr/share/wordlists/rockyou.txt ssh://192.168.1.1",
            "Use hydra with -l for username and -P for password list",
            150,
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressAction<'a> {
    Command(&'a str),
    Advance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Completed { task_id: u32, xp: u32 },
    Advanced { index: usize, title: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Current,
    Pending,
}

/// Snapshot of where the learner is in the task list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Progress {
    pub active: usize,
    pub completed: BTreeSet<u32>,
    pub reward_total: u32,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_task<'t>(&self, tasks: &'t [Task]) -> Option<&'t Task> {
        tasks.get(self.active)
    }

    pub fn is_active_completed(&self, tasks: &[Task]) -> bool {
        self.active_task(tasks)
            .map(|t| self.completed.contains(&t.id))
            .unwrap_or(false)
    }

    pub fn can_advance(&self, tasks: &[Task]) -> bool {
        self.is_active_completed(tasks) && self.active + 1 < tasks.len()
    }

    pub fn is_finished(&self, tasks: &[Task]) -> bool {
        !tasks.is_empty() && self.active == tasks.len() - 1 && self.is_active_completed(tasks)
    }

    pub fn status_of(&self, tasks: &[Task], index: usize) -> TaskStatus {
        match tasks.get(index) {
            Some(t) if self.completed.contains(&t.id) => TaskStatus::Completed,
            Some(_) if index == self.active => TaskStatus::Current,
            _ => TaskStatus::Pending,
        }
    }

    /// Pure transition. Only the active task is ever matched, and a task
    /// pays out once no matter how often its command is repeated.
    pub fn apply(&self, tasks: &[Task], action: ProgressAction) -> (Progress, Option<ProgressEvent>) {
        match action {
            ProgressAction::Command(line) => {
                let task = match self.active_task(tasks) {
                    Some(t) => t,
                    None => return (self.clone(), None),
                };
                if self.completed.contains(&task.id) || normalize(line) != task.command.to_lowercase() {
                    return (self.clone(), None);
                }
                let mut next = self.clone();
                next.completed.insert(task.id);
                next.reward_total = next.reward_total.saturating_add(task.xp);
                (
                    next,
                    Some(ProgressEvent::Completed {
                        task_id: task.id,
                        xp: task.xp,
                    }),
                )
            }
            ProgressAction::Advance => {
                if !self.can_advance(tasks) {
                    return (self.clone(), None);
                }
                let mut next = self.clone();
                next.active += 1;
                let event = ProgressEvent::Advanced {
                    index: next.active,
                    title: tasks[next.active].title.clone(),
                };
                (next, Some(event))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_active(p: &Progress, tasks: &[Task]) -> Progress {
        let cmd = tasks[p.active].command.clone();
        p.apply(tasks, ProgressAction::Command(&cmd)).0
    }

    #[test]
    fn test_matching_command_completes_once() {
        let tasks = builtin_tasks();
        let p = Progress::new();
        let (p, ev) = p.apply(&tasks, ProgressAction::Command("nmap -sn 192.168.1.0/24"));
        assert_eq!(ev, Some(ProgressEvent::Completed { task_id: 1, xp: 50 }));
        let (p, ev) = p.apply(&tasks, ProgressAction::Command("nmap -sn 192.168.1.0/24"));
        assert_eq!(ev, None);
        assert_eq!(p.reward_total, 50);
        assert_eq!(p.completed.len(), 1);
    }

    #[test]
    fn test_match_is_case_insensitive_and_trimmed() {
        let tasks = builtin_tasks();
        let (p, ev) = Progress::new().apply(&tasks, ProgressAction::Command("  NMAP -SN 192.168.1.0/24 "));
        assert!(ev.is_some());
        assert!(p.completed.contains(&1));
    }

    #[test]
    fn test_future_task_command_is_ignored() {
        let tasks = builtin_tasks();
        let (p, ev) = Progress::new().apply(&tasks, ProgressAction::Command("nmap -sT 192.168.1.1"));
        assert_eq!(ev, None);
        assert!(p.completed.is_empty());
    }

    #[test]
    fn test_advance_requires_completion() {
        let tasks = builtin_tasks();
        let p = Progress::new();
        let (same, ev) = p.apply(&tasks, ProgressAction::Advance);
        assert_eq!(ev, None);
        assert_eq!(same.active, 0);

        let p = complete_active(&p, &tasks);
        let (p, ev) = p.apply(&tasks, ProgressAction::Advance);
        assert_eq!(p.active, 1);
        assert_eq!(
            ev,
            Some(ProgressEvent::Advanced {
                index: 1,
                title: "Port Scanning".into()
            })
        );
    }

    #[test]
    fn test_terminal_state_cannot_advance() {
        let tasks = builtin_tasks();
        let mut p = Progress::new();
        for _ in 0..tasks.len() {
            p = complete_active(&p, &tasks);
            p = p.apply(&tasks, ProgressAction::Advance).0;
        }
        assert_eq!(p.active, tasks.len() - 1);
        assert!(p.is_finished(&tasks));
        assert_eq!(p.reward_total, 50 + 75 + 100 + 125 + 150);
        let (after, ev) = p.apply(&tasks, ProgressAction::Advance);
        assert_eq!(ev, None);
        assert_eq!(after, p);
    }

    #[test]
    fn test_completed_only_grows_and_stays_behind_active() {
        let tasks = builtin_tasks();
        let mut p = Progress::new();
        let script = [
            "ls",
            "nmap -sn 192.168.1.0/24",
            "hydra -l admin -P /usr/share/wordlists/rockyou.txt ssh://192.168.1.1",
            "next",
            "nmap -sT 192.168.1.1",
        ];
        let mut seen = 0;
        for line in script {
            let action = if line == "next" {
                ProgressAction::Advance
            } else {
                ProgressAction::Command(line)
            };
            let before_active = p.active;
            p = p.apply(&tasks, action).0;
            assert!(p.completed.len() >= seen);
            assert!(p.active >= before_active);
            seen = p.completed.len();
            for id in &p.completed {
                let idx = tasks.iter().position(|t| t.id == *id).unwrap();
                assert!(idx <= p.active);
            }
        }
        assert_eq!(p.completed.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_status_of() {
        let tasks = builtin_tasks();
        let p = complete_active(&Progress::new(), &tasks);
        assert_eq!(p.status_of(&tasks, 0), TaskStatus::Completed);
        assert_eq!(p.status_of(&tasks, 1), TaskStatus::Pending);
        let p = p.apply(&tasks, ProgressAction::Advance).0;
        assert_eq!(p.status_of(&tasks, 1), TaskStatus::Current);
    }

    #[test]
    fn test_empty_task_list_is_inert() {
        let p = Progress::new();
        let (q, ev) = p.apply(&[], ProgressAction::Command("ls"));
        assert_eq!((q, ev), (Progress::new(), None));
        assert!(!p.is_finished(&[]));
    }
}

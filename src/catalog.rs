//! Learning modules and their lessons.
//!
//! The built-in content is compiled in. A content service can hand over the
//! same records as JSON through [`Catalog::from_json`].

use crate::error::AcademyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Video,
    Reading,
    Practical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: u32,
    pub title: String,
    pub kind: LessonKind,
    pub duration: String,
    pub content: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub video_id: Option<String>,
}

impl Lesson {
    fn new(id: u32, title: &str, kind: LessonKind, duration: &str, content: &str) -> Self {
        Lesson {
            id,
            title: title.into(),
            kind,
            duration: duration.into(),
            content: content.into(),
            commands: Vec::new(),
            tips: Vec::new(),
            objectives: Vec::new(),
            video_id: None,
        }
    }
    fn with_commands(mut self, commands: &[&str]) -> Self {
        self.commands = commands.iter().map(|c| (*c).into()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub duration: String,
    /// Advertised lesson count, not the length of `lessons`.
    pub lesson_count: u32,
    pub completed: bool,
    pub locked: bool,
    #[serde(default)]
    pub price: u32,
    pub topics: Vec<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatalogStats {
    pub completed: usize,
    pub total: usize,
    pub lessons: u32,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub modules: Vec<Module>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Catalog, AcademyError> {
        serde_json::from_str(json).map_err(|e| AcademyError::Catalog(e.to_string()))
    }

    pub fn get(&self, id: u32) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Modules whose category is exactly `category`, in catalog order.
    /// `"all"` keeps everything.
    pub fn filter_by_category(&self, category: &str) -> Vec<&Module> {
        self.modules
            .iter()
            .filter(|m| category == "all" || m.category == category)
            .collect()
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for m in &self.modules {
            if !seen.contains(&m.category.as_str()) {
                seen.push(m.category.as_str());
            }
        }
        seen
    }

    pub fn unlock(&mut self, id: u32) -> Result<(), AcademyError> {
        let module = self
            .modules
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(AcademyError::UnknownModule(id))?;
        module.locked = false;
        Ok(())
    }

    pub fn stats(&self) -> CatalogStats {
        let total = self.modules.len();
        let completed = self.modules.iter().filter(|m| m.completed).count();
        let percent = if total == 0 {
            0.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        CatalogStats {
            completed,
            total,
            lessons: self.modules.iter().map(|m| m.lesson_count).sum(),
            percent,
        }
    }

    pub fn builtin() -> Catalog {
        let module = |id: u32,
                      title: &str,
                      description: &str,
                      category: &str,
                      difficulty: Difficulty,
                      duration: &str,
                      lesson_count: u32,
                      completed: bool,
                      price: u32,
                      topics: &[&str]| Module {
            id,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            difficulty,
            duration: duration.into(),
            lesson_count,
            completed,
            locked: price > 0,
            price,
            topics: topics.iter().map(|t| (*t).into()).collect(),
            lessons: Vec::new(),
        };

        let mut modules = vec![
            module(
                1,
                "Introduction to Ethical Hacking",
                "Learn the fundamentals of ethical hacking and cybersecurity principles",
                "fundamentals",
                Difficulty::Beginner,
                "2 hours",
                8,
                true,
                0,
                &["Ethics", "Legal Framework", "Types of Hackers", "Methodology"],
            ),
            module(
                2,
                "Kali Linux Basics",
                "Master the essential tools and commands in Kali Linux",
                "tools",
                Difficulty::Beginner,
                "3 hours",
                12,
                true,
                0,
                &["Linux Commands", "File System", "Package Management", "Tool Installation"],
            ),
            module(
                3,
                "Network Reconnaissance",
                "Learn information gathering and network scanning techniques",
                "techniques",
                Difficulty::Intermediate,
                "4 hours",
                15,
                false,
                0,
                &["Nmap", "Netdiscover", "Port Scanning", "Service Enumeration"],
            ),
            module(
                4,
                "Web Application Security",
                "Discover vulnerabilities in web applications",
                "techniques",
                Difficulty::Intermediate,
                "5 hours",
                18,
                false,
                0,
                &["SQL Injection", "XSS", "CSRF", "Directory Traversal"],
            ),
            module(
                5,
                "Wireless Security",
                "Understand wireless network security and attack methods",
                "techniques",
                Difficulty::Advanced,
                "4 hours",
                14,
                false,
                499,
                &["WEP/WPA", "Aircrack-ng", "Evil Twin", "Deauth Attacks"],
            ),
            module(
                6,
                "Metasploit Framework",
                "Master the world's most popular penetration testing framework",
                "tools",
                Difficulty::Advanced,
                "6 hours",
                20,
                false,
                799,
                &["Msfconsole", "Payloads", "Encoders", "Post-Exploitation"],
            ),
        ];

        modules[2].lessons = vec![
            Lesson::new(
                1,
                "Introduction to Network Reconnaissance",
                LessonKind::Video,
                "15 min",
                "Network reconnaissance is the process of gathering information about a target network...",
            ),
            Lesson::new(
                2,
                "Understanding Network Protocols",
                LessonKind::Reading,
                "10 min",
                "Network protocols define the rules and standards for communication between devices...",
            ),
            Lesson::new(
                3,
                "Installing and Using Nmap",
                LessonKind::Practical,
                "20 min",
                "Nmap (Network Mapper) is a powerful tool for network discovery and security auditing...",
            )
            .with_commands(&["nmap -sn 192.168.1.0/24", "nmap -sT 192.168.1.1"]),
            Lesson::new(
                4,
                "Basic Nmap Scanning Techniques",
                LessonKind::Video,
                "25 min",
                "Learn the fundamental Nmap scanning techniques including ping scans, TCP scans, and UDP scans...",
            ),
            Lesson::new(
                5,
                "Advanced Nmap Features",
                LessonKind::Practical,
                "30 min",
                "Explore advanced Nmap features like script scanning, OS detection, and service enumeration...",
            )
            .with_commands(&["nmap -sV 192.168.1.1"]),
        ];
        modules[3].lessons = vec![
            Lesson::new(
                1,
                "Web Application Architecture",
                LessonKind::Video,
                "20 min",
                "Understanding how web applications work is crucial for identifying security vulnerabilities...",
            ),
            Lesson::new(
                2,
                "OWASP Top 10 Overview",
                LessonKind::Reading,
                "15 min",
                "The OWASP Top 10 represents the most critical web application security risks...",
            ),
            Lesson::new(
                3,
                "SQL Injection Fundamentals",
                LessonKind::Practical,
                "35 min",
                "SQL injection is one of the most common and dangerous web application vulnerabilities...",
            )
            .with_commands(&["dirb http://target.com"]),
        ];

        Catalog { modules }
    }
}

/// Walks the lessons of one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonTrack {
    pub module_id: u32,
    pub current: usize,
    pub completed: BTreeSet<u32>,
    lesson_ids: Vec<u32>,
}

impl LessonTrack {
    pub fn open(catalog: &Catalog, module_id: u32) -> Result<LessonTrack, AcademyError> {
        let module = catalog
            .get(module_id)
            .ok_or(AcademyError::UnknownModule(module_id))?;
        if module.locked {
            return Err(AcademyError::validation("module", "module is locked"));
        }
        let lesson_ids: Vec<u32> = module.lessons.iter().map(|l| l.id).collect();
        // module 3 opens part-way through; only seed ids it actually has
        let completed = if module_id == 3 {
            [1, 2]
                .into_iter()
                .filter(|id| lesson_ids.contains(id))
                .collect()
        } else {
            BTreeSet::new()
        };
        Ok(LessonTrack {
            module_id,
            current: 0,
            completed,
            lesson_ids,
        })
    }

    pub fn current_lesson<'c>(&self, catalog: &'c Catalog) -> Option<&'c Lesson> {
        catalog
            .get(self.module_id)
            .and_then(|m| m.lessons.get(self.current))
    }

    /// Idempotent. Returns whether anything changed.
    pub fn complete_current(&mut self) -> bool {
        match self.lesson_ids.get(self.current) {
            Some(id) => self.completed.insert(*id),
            None => false,
        }
    }

    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.lesson_ids.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn percent(&self) -> f64 {
        if self.lesson_ids.is_empty() {
            return 0.0;
        }
        let done = self
            .completed
            .iter()
            .filter(|id| self.lesson_ids.contains(id))
            .count();
        done as f64 * 100.0 / self.lesson_ids.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_techniques_keeps_order() {
        let c = Catalog::builtin();
        let ids: Vec<u32> = c.filter_by_category("techniques").iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(c
            .filter_by_category("techniques")
            .iter()
            .all(|m| m.category == "techniques"));
    }

    #[test]
    fn test_filter_all_and_unknown() {
        let c = Catalog::builtin();
        assert_eq!(c.filter_by_category("all").len(), 6);
        assert!(c.filter_by_category("Techniques").is_empty());
    }

    #[test]
    fn test_categories_first_seen_order() {
        assert_eq!(
            Catalog::builtin().categories(),
            vec!["fundamentals", "tools", "techniques"]
        );
    }

    #[test]
    fn test_unlock() {
        let mut c = Catalog::builtin();
        assert!(c.get(5).unwrap().locked);
        c.unlock(5).unwrap();
        assert!(!c.get(5).unwrap().locked);
        assert_eq!(c.unlock(42), Err(AcademyError::UnknownModule(42)));
    }

    #[test]
    fn test_stats() {
        let s = Catalog::builtin().stats();
        assert_eq!(s.completed, 2);
        assert_eq!(s.total, 6);
        assert_eq!(s.lessons, 8 + 12 + 15 + 18 + 14 + 20);
    }

    #[test]
    fn test_from_json_round_trips_builtin_shape() {
        let json = serde_json::to_string(&Catalog::builtin()).unwrap();
        let c = Catalog::from_json(&json).unwrap();
        assert_eq!(c, Catalog::builtin());
        assert!(matches!(Catalog::from_json("{"), Err(AcademyError::Catalog(_))));
    }

    #[test]
    fn test_lesson_track() {
        let c = Catalog::builtin();
        let mut t = LessonTrack::open(&c, 3).unwrap();
        assert_eq!(t.percent(), 40.0);
        assert!(!t.complete_current());
        assert!(t.next());
        assert!(t.next());
        assert_eq!(t.current_lesson(&c).unwrap().title, "Installing and Using Nmap");
        assert!(t.complete_current());
        assert!(!t.complete_current());
        assert_eq!(t.percent(), 60.0);
        t.next();
        t.next();
        assert!(!t.next());
        assert_eq!(t.current, 4);
    }

    #[test]
    fn test_lesson_track_on_loaded_short_module() {
        let mut short = Catalog::builtin();
        short.modules[2].lessons.truncate(1);
        let json = serde_json::to_string(&short).unwrap();
        let c = Catalog::from_json(&json).unwrap();
        let mut t = LessonTrack::open(&c, 3).unwrap();
        assert_eq!(t.completed, [1].into_iter().collect());
        assert_eq!(t.percent(), 100.0);
        assert!(!t.complete_current());
        assert!(!t.next());
        assert!(t.percent() <= 100.0);
    }

    #[test]
    fn test_locked_module_cannot_open() {
        let c = Catalog::builtin();
        assert!(LessonTrack::open(&c, 6).is_err());
        assert!(LessonTrack::open(&c, 99).is_err());
    }
}

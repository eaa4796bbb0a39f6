use crate::catalog::Difficulty;
use crate::error::AcademyError;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quiz {
    pub key: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub xp_reward: u32,
    pub questions: Vec<Question>,
}

fn q(id: u32, question: &str, options: &[&str], correct: usize, explanation: &str) -> Question {
    Question {
        id,
        question: question.into(),
        options: options.iter().map(|o| (*o).into()).collect(),
        correct,
        explanation: explanation.into(),
    }
}

pub fn builtin_quizzes() -> Vec<Quiz> {
    vec![
        Quiz {
            key: "networking".into(),
            title: "Network Reconnaissance".into(),
            description: "Test your knowledge of network scanning and enumeration".into(),
            difficulty: Difficulty::Intermediate,
            xp_reward: 100,
            questions: vec![
                q(
                    1,
                    "What does the -sn flag do in Nmap?",
                    &[
                        "Performs a TCP SYN scan",
                        "Disables port scanning and only does host discovery",
                        "Scans for services and versions",
                        "Performs a UDP scan",
                    ],
                    1,
                    "The -sn flag (also known as -sP) disables port scanning and only performs host discovery using ping.",
                ),
                q(
                    2,
                    "Which port is commonly used for SSH?",
                    &["21", "22", "23", "25"],
                    1,
                    "Port 22 is the default port for SSH (Secure Shell) protocol.",
                ),
                q(
                    3,
                    "What is the purpose of service enumeration?",
                    &[
                        "To crash the target system",
                        "To identify running services and their versions",
                        "To change network configurations",
                        "To delete files from the target",
                    ],
                    1,
                    "Service enumeration helps identify what services are running and their versions, which is crucial for finding potential vulnerabilities.",
                ),
                q(
                    4,
                    "Which Nmap flag is used for OS detection?",
                    &["-sV", "-O", "-A", "-sC"],
                    1,
                    "The -O flag enables OS detection in Nmap.",
                ),
                q(
                    5,
                    "What does a closed port mean in Nmap results?",
                    &[
                        "The port is open and accepting connections",
                        "The port is blocked by a firewall",
                        "The port is not listening but is reachable",
                        "The port doesn't exist",
                    ],
                    2,
                    "A closed port means the port is reachable but there's no application listening on it.",
                ),
            ],
        },
        Quiz {
            key: "webapp".into(),
            title: "Web Application Security".into(),
            description: "Test your understanding of web application vulnerabilities".into(),
            difficulty: Difficulty::Advanced,
            xp_reward: 150,
            questions: vec![
                q(
                    1,
                    "What is SQL injection?",
                    &[
                        "A method to optimize database queries",
                        "Inserting malicious SQL code into application queries",
                        "A way to backup databases",
                        "A database encryption technique",
                    ],
                    1,
                    "SQL injection involves inserting malicious SQL code into application input to manipulate database queries.",
                ),
                q(
                    2,
                    "Which header helps prevent XSS attacks?",
                    &[
                        "Content-Security-Policy",
                        "X-Forwarded-For",
                        "User-Agent",
                        "Accept-Language",
                    ],
                    0,
                    "Content-Security-Policy (CSP) header helps prevent XSS attacks by controlling which resources can be loaded.",
                ),
                q(
                    3,
                    "What does CSRF stand for?",
                    &[
                        "Cross-Site Request Forgery",
                        "Computer Security Response Framework",
                        "Centralized Security Risk Factor",
                        "Client-Side Request Filtering",
                    ],
                    0,
                    "CSRF stands for Cross-Site Request Forgery, an attack that forces users to execute unwanted actions.",
                ),
            ],
        },
    ]
}

/// Percentage of correct answers, for display.
pub fn percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 * 100.0 / total as f64
}

/// `floor(percentage / 100 * pool)`, done in integers so 3/5 of 100 is
/// exactly 60.
pub fn reward(correct: u32, total: u32, pool: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (correct.min(total) as u64 * pool as u64 / total as u64) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Answer {
    pub selected: usize,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    Moved { index: usize },
    Finished { correct: u32, total: u32, xp: u32 },
}

/// One run through the selected quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizRun {
    pub key: String,
    pub current: usize,
    pub answer: Option<Answer>,
    pub score: u32,
    pub answered: Vec<u32>,
    pub finished: bool,
}

pub struct QuizBook {
    quizzes: Vec<Quiz>,
    run: QuizRun,
}

impl Default for QuizBook {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizBook {
    pub fn new() -> Self {
        let quizzes = builtin_quizzes();
        let key = quizzes.first().map(|q| q.key.clone()).unwrap_or_default();
        QuizBook {
            quizzes,
            run: QuizRun::fresh(key),
        }
    }

    pub fn quizzes(&self) -> &[Quiz] {
        &self.quizzes
    }
    pub fn run(&self) -> &QuizRun {
        &self.run
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.key == self.run.key)
    }

    pub fn question(&self) -> Option<&Question> {
        self.quiz().and_then(|q| q.questions.get(self.run.current))
    }

    pub fn switch(&mut self, key: &str) -> Result<(), AcademyError> {
        if !self.quizzes.iter().any(|q| q.key == key) {
            return Err(AcademyError::UnknownQuiz(key.into()));
        }
        self.run = QuizRun::fresh(key.into());
        Ok(())
    }

    pub fn reset(&mut self) {
        self.run = QuizRun::fresh(self.run.key.clone());
    }

    /// First pick counts; later picks on the same question are ignored.
    pub fn select(&mut self, option: usize) -> Result<Answer, AcademyError> {
        if let Some(a) = self.run.answer {
            return Ok(a);
        }
        let question = self
            .question()
            .ok_or(AcademyError::InvalidTransition {
                from: "finished",
                action: "select",
            })?;
        if option >= question.options.len() {
            return Err(AcademyError::validation("answer", "no such option"));
        }
        let answer = Answer {
            selected: option,
            correct: option == question.correct,
        };
        if answer.correct {
            self.run.score += 1;
        }
        self.run.answer = Some(answer);
        Ok(answer)
    }

    pub fn next(&mut self) -> Result<QuizEvent, AcademyError> {
        if self.run.finished || self.run.answer.is_none() {
            return Err(AcademyError::InvalidTransition {
                from: if self.run.finished { "finished" } else { "unanswered" },
                action: "next",
            });
        }
        let (qid, total, pool) = match (self.quiz(), self.question()) {
            (Some(quiz), Some(question)) => {
                (question.id, quiz.questions.len() as u32, quiz.xp_reward)
            }
            _ => return Err(AcademyError::UnknownQuiz(self.run.key.clone())),
        };
        self.run.answered.push(qid);

        if self.run.current + 1 >= total as usize {
            self.run.finished = true;
            let xp = reward(self.run.score, total, pool);
            info!(quiz = %self.run.key, score = self.run.score, total, xp, "quiz finished");
            Ok(QuizEvent::Finished {
                correct: self.run.score,
                total,
                xp,
            })
        } else {
            self.run.current += 1;
            self.run.answer = None;
            Ok(QuizEvent::Moved {
                index: self.run.current,
            })
        }
    }

    /// Share of the quiz behind the learner, counting a revealed answer.
    pub fn progress_percent(&self) -> f64 {
        let total = self.quiz().map(|q| q.questions.len()).unwrap_or(0) as u32;
        let seen = self.run.current as u32 + u32::from(self.run.answer.is_some());
        percentage(seen.min(total), total)
    }
}

impl QuizRun {
    fn fresh(key: String) -> Self {
        QuizRun {
            key,
            current: 0,
            answer: None,
            score: 0,
            answered: Vec::new(),
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer_all(book: &mut QuizBook, picks: &[usize]) -> QuizEvent {
        let mut last = None;
        for p in picks {
            book.select(*p).unwrap();
            last = Some(book.next().unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn test_reward_floors() {
        assert_eq!(reward(3, 5, 100), 60);
        assert_eq!(reward(1, 3, 100), 33);
        assert_eq!(reward(2, 3, 150), 100);
        assert_eq!(reward(1, 3, 150), 50);
        assert_eq!(reward(2, 3, 100), 66);
        assert_eq!(reward(0, 0, 100), 0);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(3, 5), 60.0);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn test_three_of_five_rewards_sixty() {
        let mut book = QuizBook::new();
        // correct, correct, wrong, correct, wrong
        let ev = answer_all(&mut book, &[1, 1, 0, 1, 0]);
        assert_eq!(
            ev,
            QuizEvent::Finished {
                correct: 3,
                total: 5,
                xp: 60
            }
        );
        assert!(book.run().finished);
        assert_eq!(book.run().answered, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_second_pick_is_ignored() {
        let mut book = QuizBook::new();
        assert!(!book.select(0).unwrap().correct);
        let again = book.select(1).unwrap();
        assert_eq!(again.selected, 0);
        assert_eq!(book.run().score, 0);
    }

    #[test]
    fn test_next_requires_answer() {
        let mut book = QuizBook::new();
        assert!(book.next().is_err());
        assert!(book.select(9).is_err());
    }

    #[test]
    fn test_switch_resets() {
        let mut book = QuizBook::new();
        book.select(1).unwrap();
        book.switch("webapp").unwrap();
        assert_eq!(book.run().score, 0);
        assert_eq!(book.quiz().unwrap().xp_reward, 150);
        let ev = answer_all(&mut book, &[1, 0, 1]);
        assert_eq!(
            ev,
            QuizEvent::Finished {
                correct: 2,
                total: 3,
                xp: 100
            }
        );
        assert!(book.switch("crypto").is_err());
    }

    #[test]
    fn test_finished_quiz_rejects_more_input() {
        let mut book = QuizBook::new();
        answer_all(&mut book, &[1, 1, 1, 1, 2]);
        assert!(book.next().is_err());
        book.reset();
        assert!(!book.run().finished);
        assert_eq!(book.run().current, 0);
    }

    #[test]
    fn test_progress_percent() {
        let mut book = QuizBook::new();
        assert_eq!(book.progress_percent(), 0.0);
        book.select(1).unwrap();
        assert_eq!(book.progress_percent(), 20.0);
    }
}

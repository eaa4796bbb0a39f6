use crate::{
    catalog::{Catalog, LessonTrack},
    config::AcademyConfig,
    error::AcademyError,
    logging,
    notice::{self, Notice},
    payment::{notice_for, PaymentFlow, PaymentMethod, Step},
    profile::Profile,
    quiz::{QuizBook, QuizEvent},
    simulator::{self, BANNER, PROMPT},
    terminal::{SubmitOutcome, TerminalSession},
    timer::Timeout,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

type Listener = Rc<RefCell<Option<js_sys::Function>>>;

/// One learner session. Everything lives here and is gone when the host
/// frees it; armed timeouts are cleared on drop.
#[wasm_bindgen]
pub struct Academy {
    config: AcademyConfig,
    terminal: TerminalSession,
    catalog: Catalog,
    lessons: Option<LessonTrack>,
    quiz: QuizBook,
    profile: Profile,
    payment: Rc<RefCell<PaymentFlow>>,
    listener: Listener,
    timeouts: Vec<Timeout>,
}

impl Default for Academy {
    fn default() -> Self {
        Self::new()
    }
}

fn emit(listener: &Listener, notices: &[Notice]) {
    if notices.is_empty() {
        return;
    }
    if let Some(cb) = listener.borrow().as_ref() {
        let _ = cb.call1(&JsValue::NULL, &JsValue::from_str(&notice::to_json(notices)));
    }
}

fn open_link(url: &str) {
    let anchor = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.create_element("a").ok())
        .and_then(|el| el.dyn_into::<web_sys::HtmlAnchorElement>().ok());
    match anchor {
        Some(a) => {
            a.set_href(url);
            a.click();
        }
        None => warn!("could not open payment link"),
    }
}

#[wasm_bindgen]
impl Academy {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Academy {
        Self::build(AcademyConfig::default())
    }

    /// Session with host-supplied settings (JSON, every field optional).
    #[wasm_bindgen]
    pub fn with_config(json: &str) -> Result<Academy, JsValue> {
        let config = AcademyConfig::from_json(json)?;
        logging::init(&config.log_filter);
        Ok(Self::build(config))
    }

    fn build(config: AcademyConfig) -> Academy {
        info!(app = %config.app_name, "session started");
        Academy {
            terminal: TerminalSession::new(config.log_limit),
            catalog: Catalog::builtin(),
            lessons: None,
            quiz: QuizBook::new(),
            profile: Profile::new(config.start_xp),
            payment: Rc::new(RefCell::new(PaymentFlow::new(&config))),
            listener: Rc::new(RefCell::new(None)),
            timeouts: Vec::new(),
            config,
        }
    }

    /// Callback receiving toasts (JSON array) raised outside a direct call,
    /// i.e. when a timer fires.
    #[wasm_bindgen]
    pub fn on_notice(&mut self, cb: js_sys::Function) {
        *self.listener.borrow_mut() = Some(cb);
    }

    #[wasm_bindgen]
    pub fn app_name(&self) -> String {
        self.config.app_name.clone()
    }

    // Profile

    #[wasm_bindgen]
    pub fn xp(&self) -> u32 {
        self.profile.xp()
    }
    #[wasm_bindgen]
    pub fn level(&self) -> u32 {
        self.profile.level()
    }
    #[wasm_bindgen]
    pub fn level_percent(&self) -> f64 {
        self.profile.level_percent()
    }

    // Terminal

    #[wasm_bindgen]
    pub fn prompt(&self) -> String {
        PROMPT.to_string()
    }
    #[wasm_bindgen]
    pub fn banner(&self) -> String {
        BANNER.join("\n")
    }

    /// Runs one typed line. Returns the text to print, the clear sentinel,
    /// or an empty string when there is nothing to show.
    #[wasm_bindgen]
    pub fn exec(&mut self, line: &str) -> String {
        let outcome = self.terminal.submit(line);
        self.profile.grant(outcome.xp());
        match outcome {
            SubmitOutcome::Ignored => String::new(),
            SubmitOutcome::Cleared => simulator::CLEAR.to_string(),
            SubmitOutcome::Advanced { title } => format!("Starting new task: {}", title),
            SubmitOutcome::Output { output, .. } => output,
        }
    }

    #[wasm_bindgen]
    pub fn next_task(&mut self) -> bool {
        matches!(self.terminal.advance(), SubmitOutcome::Advanced { .. })
    }
    #[wasm_bindgen]
    pub fn clear_terminal(&mut self) {
        self.terminal.clear();
    }
    #[wasm_bindgen]
    pub fn terminal_log(&self) -> String {
        self.terminal.log_json()
    }
    #[wasm_bindgen]
    pub fn tasks(&self) -> String {
        self.terminal.tasks_json()
    }
    #[wasm_bindgen]
    pub fn current_task(&self) -> String {
        serde_json::to_string(&self.terminal.current_task()).unwrap_or_else(|_| "null".to_string())
    }
    #[wasm_bindgen]
    pub fn tasks_finished(&self) -> bool {
        self.terminal.progress().is_finished(self.terminal.tasks())
    }

    // Catalog

    #[wasm_bindgen]
    pub fn load_catalog(&mut self, json: &str) -> Result<(), JsValue> {
        self.catalog = Catalog::from_json(json)?;
        self.lessons = None;
        Ok(())
    }
    #[wasm_bindgen]
    pub fn modules(&self, category: &str) -> String {
        serde_json::to_string(&self.catalog.filter_by_category(category))
            .unwrap_or_else(|_| "[]".to_string())
    }
    #[wasm_bindgen]
    pub fn categories(&self) -> Vec<JsValue> {
        self.catalog
            .categories()
            .into_iter()
            .map(JsValue::from_str)
            .collect()
    }
    #[wasm_bindgen]
    pub fn catalog_stats(&self) -> String {
        serde_json::to_string(&self.catalog.stats()).unwrap_or_else(|_| "{}".to_string())
    }
    #[wasm_bindgen]
    pub fn open_module(&mut self, id: u32) -> Result<(), JsValue> {
        self.lessons = Some(LessonTrack::open(&self.catalog, id)?);
        Ok(())
    }
    #[wasm_bindgen]
    pub fn close_module(&mut self) {
        self.lessons = None;
    }
    #[wasm_bindgen]
    pub fn lesson(&self) -> String {
        let lesson = self
            .lessons
            .as_ref()
            .and_then(|t| t.current_lesson(&self.catalog));
        serde_json::to_string(&lesson).unwrap_or_else(|_| "null".to_string())
    }
    #[wasm_bindgen]
    pub fn lesson_progress(&self) -> String {
        serde_json::to_string(&self.lessons).unwrap_or_else(|_| "null".to_string())
    }
    #[wasm_bindgen]
    pub fn lesson_percent(&self) -> f64 {
        self.lessons.as_ref().map(|t| t.percent()).unwrap_or(0.0)
    }
    #[wasm_bindgen]
    pub fn complete_lesson(&mut self) -> bool {
        self.lessons
            .as_mut()
            .map(|t| t.complete_current())
            .unwrap_or(false)
    }
    #[wasm_bindgen]
    pub fn next_lesson(&mut self) -> bool {
        self.lessons.as_mut().map(|t| t.next()).unwrap_or(false)
    }

    // Quiz

    #[wasm_bindgen]
    pub fn quizzes(&self) -> String {
        serde_json::to_string(self.quiz.quizzes()).unwrap_or_else(|_| "[]".to_string())
    }
    #[wasm_bindgen]
    pub fn switch_quiz(&mut self, key: &str) -> Result<(), JsValue> {
        self.quiz.switch(key)?;
        Ok(())
    }
    #[wasm_bindgen]
    pub fn quiz_state(&self) -> String {
        serde_json::to_string(self.quiz.run()).unwrap_or_else(|_| "{}".to_string())
    }
    #[wasm_bindgen]
    pub fn quiz_progress(&self) -> f64 {
        self.quiz.progress_percent()
    }
    /// True when the pick was right.
    #[wasm_bindgen]
    pub fn select_answer(&mut self, option: usize) -> Result<bool, JsValue> {
        Ok(self.quiz.select(option)?.correct)
    }
    /// XP earned; zero unless this finished the quiz.
    #[wasm_bindgen]
    pub fn next_question(&mut self) -> Result<u32, JsValue> {
        match self.quiz.next()? {
            QuizEvent::Finished { xp, .. } => {
                self.profile.grant(xp);
                Ok(xp)
            }
            QuizEvent::Moved { .. } => Ok(0),
        }
    }
    #[wasm_bindgen]
    pub fn reset_quiz(&mut self) {
        self.quiz.reset();
    }

    // Payment

    #[wasm_bindgen]
    pub fn payment_methods(&self) -> String {
        let methods: Vec<_> = PaymentMethod::ALL
            .iter()
            .map(|m| {
                serde_json::json!({
                    "id": m.id(),
                    "name": m.name(),
                    "description": m.description(),
                    "requires_identifier": m.requires_identifier(),
                })
            })
            .collect();
        serde_json::Value::Array(methods).to_string()
    }
    #[wasm_bindgen]
    pub fn payment_state(&self) -> String {
        self.payment.borrow().to_json()
    }
    #[wasm_bindgen]
    pub fn open_payment(&mut self, module_id: u32) -> Result<(), JsValue> {
        let (id, title, price) = self.payment_target(module_id)?;
        self.timeouts.clear();
        self.payment.borrow_mut().open(id, &title, price);
        Ok(())
    }

    fn payment_target(&self, module_id: u32) -> Result<(u32, String, u32), AcademyError> {
        let module = self
            .catalog
            .get(module_id)
            .ok_or(AcademyError::UnknownModule(module_id))?;
        Ok((module.id, module.title.clone(), module.price))
    }
    #[wasm_bindgen]
    pub fn select_payment_method(&mut self, id: &str) -> String {
        let result = self
            .payment
            .borrow_mut()
            .select_method(PaymentMethod::from_id(id));
        match result {
            Ok(()) => "[]".to_string(),
            Err(e) => notice::to_json(&[notice_for(&e)]),
        }
    }
    #[wasm_bindgen]
    pub fn set_payment_identifier(&mut self, identifier: &str) -> String {
        let result = self.payment.borrow_mut().set_identifier(identifier);
        match result {
            Ok(()) => "[]".to_string(),
            Err(e) => notice::to_json(&[notice_for(&e)]),
        }
    }

    /// All payment actions answer with the toasts to show (JSON array).
    #[wasm_bindgen]
    pub fn submit_payment(&mut self) -> String {
        let result = self.payment.borrow_mut().submit();
        self.apply_step(result)
    }
    #[wasm_bindgen]
    pub fn verify_payment(&mut self, reference: &str) -> String {
        let result = self.payment.borrow_mut().verify(reference);
        self.apply_step(result)
    }
    #[wasm_bindgen]
    pub fn request_manual_review(&mut self) -> String {
        let result = self.payment.borrow_mut().request_manual_review();
        self.apply_step(result)
    }
    #[wasm_bindgen]
    pub fn close_payment(&mut self) {
        self.timeouts.clear();
        self.payment.borrow_mut().close();
    }

    fn apply_step(&mut self, result: Result<Step, AcademyError>) -> String {
        let step = match result {
            Ok(step) => step,
            Err(e) => return notice::to_json(&[notice_for(&e)]),
        };
        if let Some(url) = &step.deep_link {
            open_link(url);
        }
        if let Some(id) = step.unlocked {
            if let Err(e) = self.catalog.unlock(id) {
                warn!(error = %e, "paid module missing from catalog");
            }
        }
        if let Some(review) = step.review {
            let flow: Weak<RefCell<PaymentFlow>> = Rc::downgrade(&self.payment);
            let listener = Rc::clone(&self.listener);
            let armed = Timeout::arm(review.delay_ms, move || {
                if let Some(flow) = flow.upgrade() {
                    let fired = flow.borrow_mut().fire(review.ticket);
                    emit(&listener, &fired.notices);
                }
            });
            self.timeouts.retain(|t| !t.fired());
            match armed {
                Ok(t) => self.timeouts.push(t),
                Err(_) => warn!("could not arm review timer"),
            }
        }
        notice::to_json(&step.notices)
    }
}

impl Drop for Academy {
    fn drop(&mut self) {
        self.timeouts.clear();
        self.payment.borrow_mut().close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LessonTrack;
    use crate::payment::PaymentStatus;

    #[test]
    fn test_task_command_grants_xp_once() {
        let mut a = Academy::new();
        assert_eq!(a.xp(), 250);
        let out = a.exec("nmap -sn 192.168.1.0/24");
        assert!(out.starts_with("Starting Nmap"));
        assert_eq!(a.xp(), 300);
        a.exec("nmap -sn 192.168.1.0/24");
        assert_eq!(a.xp(), 300);
        assert_eq!(a.exec("next"), "Starting new task: Port Scanning");
        assert_eq!(a.exec("   "), "");
        assert_eq!(a.exec("clear"), simulator::CLEAR);
    }

    #[test]
    fn test_quiz_reward_reaches_profile() {
        let mut a = Academy::new();
        let mut earned = 0;
        for pick in [1, 1, 0, 1, 0] {
            a.select_answer(pick).unwrap();
            earned = a.next_question().unwrap();
        }
        assert_eq!(earned, 60);
        assert_eq!(a.xp(), 310);
    }

    #[test]
    fn test_wallet_payment_unlocks_module() {
        let mut a = Academy::new();
        assert!(LessonTrack::open(&a.catalog, 5).is_err());
        a.open_payment(5).unwrap();
        assert_eq!(a.select_payment_method("paytm"), "[]");
        let submitted = a.submit_payment();
        assert!(submitted.contains("Redirecting to Paytm payment..."));
        let verified = a.verify_payment("TXN");
        assert!(verified.contains("Payment Successful!"));
        assert!(!a.catalog.get(5).unwrap().locked);
        assert!(a.open_module(5).is_ok());
        assert!(a.timeouts.is_empty());
    }

    #[test]
    fn test_close_payment_resets_flow() {
        let mut a = Academy::new();
        a.open_payment(6).unwrap();
        a.select_payment_method("phonepe");
        a.submit_payment();
        assert_eq!(a.payment.borrow().status(), PaymentStatus::Verifying);
        a.close_payment();
        assert_eq!(a.payment.borrow().status(), PaymentStatus::Pending);
        assert!(a.payment_state().contains("\"pending\""));
        assert!(a.timeouts.is_empty());
        assert!(a.catalog.get(6).unwrap().locked);
    }

    #[test]
    fn test_payment_target_rejects_unknown_module() {
        let a = Academy::new();
        assert_eq!(a.payment_target(42), Err(AcademyError::UnknownModule(42)));
        let (id, title, price) = a.payment_target(5).unwrap();
        assert_eq!((id, price), (5, 499));
        assert!(!title.is_empty());
    }
}

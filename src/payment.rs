//! Mock checkout for locked modules.
//!
//! Nothing here moves money. Settlement belongs to an external gateway,
//! reached through [`PaymentGateway`]; without one the flow can only be
//! confirmed by a user-supplied reference or parked for manual review.

use crate::config::AcademyConfig;
use crate::error::AcademyError;
use crate::notice::Notice;
use crate::schedule::{Scheduler, Ticket};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Initiated,
    Verifying,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::Verifying => "verifying",
            PaymentStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Upi,
    Paytm,
    PhonePe,
    GooglePay,
    RuPay,
    NetBanking,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Upi,
        PaymentMethod::Paytm,
        PaymentMethod::PhonePe,
        PaymentMethod::GooglePay,
        PaymentMethod::RuPay,
        PaymentMethod::NetBanking,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "upi",
            PaymentMethod::Paytm => "paytm",
            PaymentMethod::PhonePe => "phonepe",
            PaymentMethod::GooglePay => "googlepay",
            PaymentMethod::RuPay => "rupay",
            PaymentMethod::NetBanking => "netbanking",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Paytm => "Paytm",
            PaymentMethod::PhonePe => "PhonePe",
            PaymentMethod::GooglePay => "Google Pay",
            PaymentMethod::RuPay => "RuPay",
            PaymentMethod::NetBanking => "Net Banking",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "Pay using UPI ID or scan QR",
            PaymentMethod::Paytm => "Paytm Wallet",
            PaymentMethod::PhonePe => "PhonePe App",
            PaymentMethod::GooglePay => "Google Pay",
            PaymentMethod::RuPay => "RuPay Card",
            PaymentMethod::NetBanking => "Internet Banking",
        }
    }

    /// Methods that need the payer's handle before submitting.
    pub fn requires_identifier(&self) -> bool {
        matches!(self, PaymentMethod::Upi)
    }

    pub fn from_id(id: &str) -> Option<PaymentMethod> {
        let id = id.trim().to_lowercase();
        Self::ALL.iter().copied().find(|m| m.id() == id)
    }
}

/// What an external gateway needs to settle a payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub amount: u32,
    pub currency: String,
    pub payee: String,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub reference: String,
}

pub trait PaymentGateway {
    fn settle(&self, request: &PaymentRequest, reference: &str) -> Result<Settlement, AcademyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledClose {
    pub ticket: Ticket,
    pub delay_ms: u32,
}

/// Side effects of one transition, for the caller to carry out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    pub notices: Vec<Notice>,
    pub deep_link: Option<String>,
    pub unlocked: Option<u32>,
    pub review: Option<ScheduledClose>,
}

impl Step {
    fn notice(n: Notice) -> Self {
        Step {
            notices: vec![n],
            ..Step::default()
        }
    }
}

/// Turns a rejected action into the toast the user sees.
pub fn notice_for(err: &AcademyError) -> Notice {
    match err {
        AcademyError::Validation { field: "identifier", message } => {
            Notice::error("UPI ID Required", message.clone())
        }
        AcademyError::Validation { field: "reference", message } => {
            Notice::error("Reference Required", message.clone())
        }
        AcademyError::Validation { message, .. } => Notice::error("Payment Failed", message.clone()),
        other => Notice::error("Payment Failed", other.to_string()),
    }
}

#[derive(Debug)]
pub struct PaymentFlow {
    status: PaymentStatus,
    method: Option<PaymentMethod>,
    identifier: String,
    reference: String,
    module_id: u32,
    module_title: String,
    amount: u32,
    payee: String,
    payee_name: String,
    currency: String,
    review_delay_ms: u32,
    scheduler: Scheduler,
}

#[derive(Serialize)]
struct FlowView<'a> {
    status: PaymentStatus,
    method: Option<PaymentMethod>,
    identifier: &'a str,
    module_id: u32,
    module_title: &'a str,
    amount: u32,
}

impl PaymentFlow {
    pub fn new(config: &AcademyConfig) -> Self {
        PaymentFlow {
            status: PaymentStatus::Pending,
            method: Some(PaymentMethod::Upi),
            identifier: String::new(),
            reference: String::new(),
            module_id: 0,
            module_title: String::new(),
            amount: 0,
            payee: config.payee.clone(),
            payee_name: config.payee_name.clone(),
            currency: config.currency.clone(),
            review_delay_ms: config.review_delay_ms,
            scheduler: Scheduler::new(),
        }
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }
    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
    pub fn reference(&self) -> &str {
        &self.reference
    }
    pub fn module_id(&self) -> u32 {
        self.module_id
    }

    fn require(&self, status: PaymentStatus, action: &'static str) -> Result<(), AcademyError> {
        if self.status != status {
            return Err(AcademyError::InvalidTransition {
                from: self.status.as_str(),
                action,
            });
        }
        Ok(())
    }

    /// Points the flow at a module. Starts from a clean slate.
    pub fn open(&mut self, module_id: u32, title: &str, amount: u32) {
        self.close();
        self.module_id = module_id;
        self.module_title = title.into();
        self.amount = amount;
    }

    pub fn select_method(&mut self, method: Option<PaymentMethod>) -> Result<(), AcademyError> {
        self.require(PaymentStatus::Pending, "select_method")?;
        self.method = method;
        Ok(())
    }

    pub fn set_identifier(&mut self, identifier: &str) -> Result<(), AcademyError> {
        self.require(PaymentStatus::Pending, "set_identifier")?;
        self.identifier = identifier.trim().into();
        Ok(())
    }

    pub fn request(&self) -> PaymentRequest {
        PaymentRequest {
            amount: self.amount,
            currency: self.currency.clone(),
            payee: self.payee.clone(),
            memo: format!("Payment for {}", self.module_title),
        }
    }

    /// `upi://pay` link that hands the amount over to the payer's UPI app.
    pub fn deep_link(&self) -> String {
        format!(
            "upi://pay?pa={}&pn={}&am={}&cu={}&tn={}",
            urlencoding::encode(&self.payee),
            urlencoding::encode(&self.payee_name),
            self.amount,
            self.currency,
            urlencoding::encode(&format!("Payment for {}", self.module_title)),
        )
    }

    /// pending -> initiated -> verifying. Rejected submissions change nothing.
    pub fn submit(&mut self) -> Result<Step, AcademyError> {
        self.require(PaymentStatus::Pending, "submit")?;
        let method = self
            .method
            .ok_or_else(|| AcademyError::validation("method", "Please choose a payment method"))?;
        if method.requires_identifier() {
            if self.identifier.is_empty() {
                return Err(AcademyError::validation(
                    "identifier",
                    "Please enter your UPI ID to proceed",
                ));
            }
            if !self.identifier.contains('@') {
                return Err(AcademyError::validation(
                    "identifier",
                    "UPI ID must look like yourname@upi",
                ));
            }
        }

        self.status = PaymentStatus::Initiated;
        info!(method = method.id(), amount = self.amount, "payment initiated");
        let mut step = if method == PaymentMethod::Upi {
            Step {
                deep_link: Some(self.deep_link()),
                ..Step::notice(Notice::info(
                    "UPI Payment Initiated",
                    "Complete the payment in your UPI app",
                ))
            }
        } else {
            Step::notice(Notice::info(
                "Payment Gateway",
                format!("Redirecting to {} payment...", method.name()),
            ))
        };

        self.status = PaymentStatus::Verifying;
        step.notices.push(Notice::info(
            "Verify Payment",
            "Enter the transaction reference once the payment goes through",
        ));
        Ok(step)
    }

    fn complete(&mut self, reference: String) -> Step {
        self.reference = reference;
        self.status = PaymentStatus::Completed;
        info!(module_id = self.module_id, "payment completed");
        Step {
            unlocked: Some(self.module_id),
            ..Step::notice(Notice::info(
                "Payment Successful!",
                format!("{} has been unlocked", self.module_title),
            ))
        }
    }

    fn checked_reference(reference: &str) -> Result<String, AcademyError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AcademyError::validation(
                "reference",
                "Please enter the transaction reference",
            ));
        }
        Ok(reference.into())
    }

    /// verifying -> completed on a user-supplied reference.
    pub fn verify(&mut self, reference: &str) -> Result<Step, AcademyError> {
        self.require(PaymentStatus::Verifying, "verify")?;
        let reference = Self::checked_reference(reference)?;
        Ok(self.complete(reference))
    }

    /// verifying -> completed once the gateway confirms. A gateway error
    /// leaves the flow in `verifying`.
    pub fn verify_with(
        &mut self,
        gateway: &dyn PaymentGateway,
        reference: &str,
    ) -> Result<Step, AcademyError> {
        self.require(PaymentStatus::Verifying, "verify")?;
        let reference = Self::checked_reference(reference)?;
        match gateway.settle(&self.request(), &reference) {
            Ok(settlement) => Ok(self.complete(settlement.reference)),
            Err(e) => {
                warn!(error = %e, "gateway rejected payment");
                Err(e)
            }
        }
    }

    /// Skips the reference check and parks the payment for a human to
    /// confirm. The flow closes when the returned ticket fires.
    pub fn request_manual_review(&mut self) -> Result<Step, AcademyError> {
        self.require(PaymentStatus::Verifying, "manual_review")?;
        let ticket = self.scheduler.issue();
        debug!(ticket = ticket.id, delay_ms = self.review_delay_ms, "manual review scheduled");
        Ok(Step {
            review: Some(ScheduledClose {
                ticket,
                delay_ms: self.review_delay_ms,
            }),
            ..Step::notice(Notice::info(
                "Verification Requested",
                "Your payment will be confirmed manually",
            ))
        })
    }

    /// Timer callback for a manual review. Stale tickets do nothing.
    pub fn fire(&mut self, ticket: Ticket) -> Step {
        if !self.scheduler.redeem(ticket) {
            debug!(ticket = ticket.id, "stale review ticket ignored");
            return Step::default();
        }
        let title = self.module_title.clone();
        self.close();
        Step::notice(Notice::info(
            "Payment Submitted",
            format!("{} will be unlocked once the payment is confirmed", title),
        ))
    }

    /// Back to pending with the transient fields wiped. Armed timers are
    /// invalidated.
    pub fn close(&mut self) {
        self.scheduler.cancel_all();
        self.status = PaymentStatus::Pending;
        self.identifier.clear();
        self.reference.clear();
    }

    pub fn to_json(&self) -> String {
        let view = FlowView {
            status: self.status,
            method: self.method,
            identifier: &self.identifier,
            module_id: self.module_id,
            module_title: &self.module_title,
            amount: self.amount,
        };
        serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeGateway {
        ok: bool,
    }

    impl PaymentGateway for FakeGateway {
        fn settle(&self, request: &PaymentRequest, reference: &str) -> Result<Settlement, AcademyError> {
            assert_eq!(request.amount, 499);
            if self.ok {
                Ok(Settlement {
                    reference: format!("GW-{}", reference),
                })
            } else {
                Err(AcademyError::Gateway("declined".into()))
            }
        }
    }

    fn flow() -> PaymentFlow {
        let mut f = PaymentFlow::new(&AcademyConfig::default());
        f.open(5, "Wireless Security", 499);
        f
    }

    fn verifying() -> PaymentFlow {
        let mut f = flow();
        f.set_identifier("learner@okbank").unwrap();
        f.submit().unwrap();
        f
    }

    #[test]
    fn test_upi_without_identifier_stays_pending() {
        let mut f = flow();
        let err = f.submit().unwrap_err();
        assert_eq!(f.status(), PaymentStatus::Pending);
        let n = notice_for(&err);
        assert!(n.is_error());
        assert_eq!(n.title, "UPI ID Required");
    }

    #[test]
    fn test_upi_identifier_needs_at_sign() {
        let mut f = flow();
        f.set_identifier("learner").unwrap();
        assert!(f.submit().is_err());
        assert_eq!(f.status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_no_method_is_rejected() {
        let mut f = flow();
        f.select_method(None).unwrap();
        assert!(f.submit().is_err());
        assert_eq!(f.status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_upi_submit_lands_in_verifying_with_link() {
        let mut f = flow();
        f.set_identifier(" learner@okbank ").unwrap();
        let step = f.submit().unwrap();
        assert_eq!(f.status(), PaymentStatus::Verifying);
        assert_eq!(
            step.deep_link.as_deref(),
            Some("upi://pay?pa=7020645145%40fam&pn=Kali%20Academy&am=499&cu=INR&tn=Payment%20for%20Wireless%20Security")
        );
        assert_eq!(step.notices[0].title, "UPI Payment Initiated");
    }

    #[test]
    fn test_deep_link_escapes_payee() {
        let config = AcademyConfig {
            payee: "evil@x&am=1".into(),
            ..AcademyConfig::default()
        };
        let mut f = PaymentFlow::new(&config);
        f.open(5, "Wireless Security", 499);
        let link = f.deep_link();
        assert!(link.starts_with("upi://pay?pa=evil%40x%26am%3D1&pn="));
        assert_eq!(link.matches("am=").count(), 1);
        assert!(link.contains("&am=499&"));
    }

    #[test]
    fn test_wallet_needs_no_identifier() {
        let mut f = flow();
        f.select_method(PaymentMethod::from_id("PhonePe")).unwrap();
        let step = f.submit().unwrap();
        assert_eq!(f.status(), PaymentStatus::Verifying);
        assert!(step.deep_link.is_none());
        assert_eq!(step.notices[0].description, "Redirecting to PhonePe payment...");
    }

    #[test]
    fn test_verify_needs_reference() {
        let mut f = verifying();
        assert!(f.verify("   ").is_err());
        assert_eq!(f.status(), PaymentStatus::Verifying);
        let step = f.verify("TXN123").unwrap();
        assert_eq!(f.status(), PaymentStatus::Completed);
        assert_eq!(step.unlocked, Some(5));
        assert_eq!(f.reference(), "TXN123");
    }

    #[test]
    fn test_cannot_skip_verifying() {
        let mut f = flow();
        assert!(f.verify("TXN").is_err());
        assert!(f.request_manual_review().is_err());
        assert_eq!(f.status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_completed_is_terminal_until_close() {
        let mut f = verifying();
        f.verify("TXN").unwrap();
        assert!(f.submit().is_err());
        assert!(f.set_identifier("x@y").is_err());
        assert_eq!(f.status(), PaymentStatus::Completed);
        f.close();
        assert_eq!(f.status(), PaymentStatus::Pending);
        assert_eq!(f.identifier(), "");
        assert_eq!(f.reference(), "");
    }

    #[test]
    fn test_gateway_failure_rolls_back() {
        let mut f = verifying();
        let err = f.verify_with(&FakeGateway { ok: false }, "TXN").unwrap_err();
        assert_eq!(err, AcademyError::Gateway("declined".into()));
        assert_eq!(f.status(), PaymentStatus::Verifying);
        f.verify_with(&FakeGateway { ok: true }, "TXN").unwrap();
        assert_eq!(f.status(), PaymentStatus::Completed);
        assert_eq!(f.reference(), "GW-TXN");
    }

    #[test]
    fn test_manual_review_closes_when_ticket_fires() {
        let mut f = verifying();
        let step = f.request_manual_review().unwrap();
        let review = step.review.unwrap();
        assert_eq!(review.delay_ms, 3000);
        let fired = f.fire(review.ticket);
        assert_eq!(f.status(), PaymentStatus::Pending);
        assert_eq!(fired.notices[0].title, "Payment Submitted");
        assert!(fired.unlocked.is_none());
    }

    #[test]
    fn test_close_invalidates_armed_review() {
        let mut f = verifying();
        let review = f.request_manual_review().unwrap().review.unwrap();
        f.close();
        f.set_identifier("again@okbank").unwrap();
        f.submit().unwrap();
        let step = f.fire(review.ticket);
        assert_eq!(step, Step::default());
        assert_eq!(f.status(), PaymentStatus::Verifying);
    }

    #[test]
    fn test_method_table() {
        assert_eq!(PaymentMethod::ALL.len(), 6);
        assert!(PaymentMethod::ALL
            .iter()
            .filter(|m| m.requires_identifier())
            .eq([PaymentMethod::Upi].iter()));
        assert_eq!(PaymentMethod::from_id("bitcoin"), None);
    }
}

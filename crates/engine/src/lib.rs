//! Transaction Workflow Engine
//!
//! Validates and creates transaction records against payment state,
//! computes settlement fee estimates, orchestrates receiving-wallet
//! generation, and dispatches notification side effects.
//!
//! The engine owns the gating rules of the payment lifecycle: a payment
//! that was cancelled, or fully completed through an external settlement,
//! accepts no new transactions. Everything the engine persists is a
//! single atomic write; notifications run only after persistence and
//! never propagate failure into the response path.

pub mod config;
pub mod fees;
pub mod notify;
pub mod service;

pub use config::WorkflowConfig;
pub use fees::FeeEstimator;
pub use notify::{MailMessage, MailTemplate, NoopNotifier, Notifier, NotifyError, SmtpNotifier};
pub use service::{CreateTransactionInput, TransactionWorkflow};

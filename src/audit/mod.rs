//! Audit recorder
//!
//! Significant state changes (transaction create/update/delete, limit
//! changes, custom category changes) are described as `AuditEvent`s and handed
//! to an `AuditSink`. The log is append-only and is never replayed back into
//! ledger state.
//!
//! # Example
//!
//! ```rust,ignore
//! use monthwise::audit::{AuditEvent, AuditSink, ChangeType, EntityType, JsonlAuditSink};
//!
//! let sink = JsonlAuditSink::new(paths.audit_log());
//! let event = AuditEvent::new(EntityType::Transaction, "Groceries", ChangeType::Create)
//!     .with_amount_delta(Money::from_cents(4200));
//! sink.record(&event).await?;
//! ```

mod diff;
mod event;
mod sink;

pub use diff::{diff_fields, summarize, FieldChange};
pub use event::{AuditDetail, AuditEvent, ChangeType, EntityType};
pub use sink::{AuditSink, JsonlAuditSink, MemoryAuditSink, NullAuditSink};

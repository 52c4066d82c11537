//! Audit log viewer

use crate::audit::JsonlAuditSink;
use crate::error::LedgerResult;

use super::context::LedgerContext;

/// Print the most recent audit entries, oldest first
pub fn handle_audit_command(ctx: &LedgerContext, count: usize) -> LedgerResult<()> {
    let sink = JsonlAuditSink::new(ctx.paths.audit_log());
    let events = sink.read_recent(count)?;

    if events.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    for event in events {
        println!("{}", event.format_human_readable());
    }

    Ok(())
}

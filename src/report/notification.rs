//! Per-employee period notifications.
//!
//! Delivery goes through the [`NotificationSender`] seam. Each employee's
//! message is an independent attempt: all attempts run concurrently and are
//! joined before the sent/failed counts are returned, so one failure never
//! stops or retries another.

use async_trait::async_trait;
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::contact_address;
use crate::store::{EmployeeStore, PayrollStore};

use super::summary::{ReportItem, ReportSummary, stored_summary};

/// Delivers one rendered notification.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends `html_body` to `recipient` under `subject`.
    ///
    /// Failures are reported as [`EngineError::NotificationFailure`].
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> EngineResult<()>;
}

/// A sender that only logs the notification.
///
/// Used by the server binary when no mail transport is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSender;

#[async_trait]
impl NotificationSender for TracingSender {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> EngineResult<()> {
        info!(
            recipient,
            subject,
            body_len = html_body.len(),
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Wording of notification messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationTemplate {
    /// Subject prefix; the subject is `<prefix> <label>`.
    pub subject_prefix: String,
    /// Currency shown after the salary.
    pub currency: String,
    /// Sign-off line.
    pub signature: String,
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self {
            subject_prefix: "Attendance report".to_string(),
            currency: "VND".to_string(),
            signature: "Attendance System".to_string(),
        }
    }
}

impl NotificationTemplate {
    /// Subject line for `period`.
    pub fn subject(&self, period: &str) -> String {
        format!("{} {}", self.subject_prefix, period)
    }
}

/// Counts of one notification batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    /// Period label.
    pub period: String,
    /// Messages accepted by the sender.
    pub sent: usize,
    /// Messages not sent, including employees without an address.
    pub failed: usize,
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats an amount rounded to an integer with comma thousands separators.
///
/// # Example
///
/// ```
/// use attendance_engine::report::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::new(12345678, 0)), "12,345,678");
/// assert_eq!(format_amount(Decimal::new(-1000, 0)), "-1,000");
/// assert_eq!(format_amount(Decimal::new(999, 0)), "999");
/// ```
pub fn format_amount(amount: Decimal) -> String {
    let rounded = crate::calculation::round_salary(amount);
    let digits = rounded.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Renders the HTML body of one employee's notification.
pub fn render_notification_html(
    template: &NotificationTemplate,
    full_name: &str,
    period: &str,
    hours: Decimal,
    salary: Decimal,
) -> String {
    let period = escape_html(period);
    format!(
        "<div style='font-family:Arial,sans-serif'>\
         <h2>Attendance report - {period}</h2>\
         <p>Hello <b>{name}</b>,</p>\
         <p>Here is your work summary for period <b>{period}</b>:</p>\
         <ul>\
         <li><b>Total hours:</b> {hours} h</li>\
         <li><b>Estimated salary:</b> {salary} {currency}</li>\
         </ul>\
         <p>If anything looks wrong, please contact your manager.</p>\
         <hr/>\
         <p>Regards,<br/>{signature}</p>\
         </div>",
        period = period,
        name = escape_html(full_name),
        hours = hours,
        salary = format_amount(salary),
        currency = escape_html(&template.currency),
        signature = escape_html(&template.signature),
    )
}

async fn notify_one<N>(
    sender: &N,
    template: &NotificationTemplate,
    period: &str,
    item: &ReportItem,
) -> EngineResult<()>
where
    N: NotificationSender + ?Sized,
{
    let recipient = contact_address(item.email.as_deref()).ok_or_else(|| {
        EngineError::NotificationFailure {
            recipient: item.full_name.clone(),
            message: "no email address".to_string(),
        }
    })?;
    let body = render_notification_html(template, &item.full_name, period, item.hours, item.salary);
    sender.send(recipient, &template.subject(period), &body).await
}

/// Sends one notification per item and counts the results.
pub async fn notify_items<N>(
    sender: &N,
    template: &NotificationTemplate,
    period: &str,
    items: &[ReportItem],
) -> NotificationOutcome
where
    N: NotificationSender + ?Sized,
{
    let results = join_all(
        items
            .iter()
            .map(|item| notify_one(sender, template, period, item)),
    )
    .await;

    let mut sent = 0;
    let mut failed = 0;
    for (item, result) in items.iter().zip(results) {
        match result {
            Ok(()) => sent += 1,
            Err(error) => {
                warn!(
                    employee_id = item.employee_id,
                    period,
                    error = %error,
                    "Notification failed"
                );
                failed += 1;
            }
        }
    }

    info!(period, sent, failed, "Notification batch finished");
    NotificationOutcome {
        period: period.to_string(),
        sent,
        failed,
    }
}

/// Sends the notifications of a re-derived summary.
pub async fn send_reports<N>(
    sender: &N,
    template: &NotificationTemplate,
    summary: &ReportSummary,
) -> NotificationOutcome
where
    N: NotificationSender + ?Sized,
{
    notify_items(sender, template, &summary.period, &summary.items).await
}

/// Sends the notifications of the payroll records stored under `period`.
///
/// Fails with [`EngineError::NoPayrollForPeriod`] when nothing is stored.
pub async fn send_stored<S, N>(
    store: &S,
    sender: &N,
    template: &NotificationTemplate,
    period: &str,
) -> EngineResult<NotificationOutcome>
where
    S: EmployeeStore + PayrollStore + ?Sized,
    N: NotificationSender + ?Sized,
{
    let stored = stored_summary(store, period).await?;
    if stored.items.is_empty() {
        return Err(EngineError::NoPayrollForPeriod {
            period: period.to_string(),
        });
    }
    Ok(notify_items(sender, template, period, &stored.items).await)
}

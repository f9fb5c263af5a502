//! Rendering of expiration notifications.

use serde::{Deserialize, Serialize};

use crate::invoice::rules::format_long_date;
use crate::models::invoice::{InvoiceRecord, RecordId};

use super::{ExpirationDecision, Tier};

const ACCENT_REMINDER: &str = "#0d6efd";
const ACCENT_URGENT: &str = "#dc3545";

/// Settings shared by every rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    /// Base URL used to link to the document page.
    pub portal_base_url: String,
    /// Display name of the sender.
    pub sender_name: String,
}

impl Default for MessageContext {
    fn default() -> Self {
        Self {
            portal_base_url: "http://localhost:3000".to_string(),
            sender_name: "Portal de Facturas".to_string(),
        }
    }
}

/// A rendered reminder, ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub record_id: RecordId,
    pub recipient: String,
    pub sender_name: String,
    pub tier: Tier,
    pub subject: String,
    pub headline: String,
    pub intro: String,
    /// Human readable time left, e.g. `"3 horas y 15 minutos"`.
    pub time_remaining: String,
    /// Long form due date.
    pub due_label: String,
    /// Header color.
    pub accent: String,
    pub link: String,
    pub html: String,
}

impl NotificationPayload {
    /// Render the message for `record`, or `None` when the decision does
    /// not warrant a notification.
    pub fn render(
        decision: &ExpirationDecision,
        record: &InvoiceRecord,
        recipient: &str,
        ctx: &MessageContext,
    ) -> Option<Self> {
        let due_at = record.due_at?;
        let title = record.title.trim();

        let (subject, headline, intro, accent) = match decision.tier {
            Tier::None => return None,
            Tier::Reminder => (
                format!("Notificación: Documento \"{}\" próximo a vencer", title),
                "Aviso de Vencimiento".to_string(),
                format!(
                    "Le informamos que el documento {} está próximo a su fecha límite.",
                    title
                ),
                ACCENT_REMINDER,
            ),
            Tier::Urgent => (
                format!("ACCIÓN REQUERIDA: \"{}\" vence en menos de 24h", title),
                "VENCIMIENTO INMINENTE".to_string(),
                format!(
                    "ATENCIÓN: El documento {} requiere su gestión inmediata para cumplir con los plazos establecidos.",
                    title
                ),
                ACCENT_URGENT,
            ),
        };

        let time_remaining = time_remaining_label(decision.days_remaining);
        let due_label = format_long_date(due_at.date_naive());
        let link = format!(
            "{}/facturas/{}",
            ctx.portal_base_url.trim_end_matches('/'),
            record.id
        );

        let html = render_html(&HtmlParts {
            sender_name: &ctx.sender_name,
            headline: &headline,
            intro: &intro,
            title,
            due_label: &due_label,
            time_remaining: &time_remaining,
            accent,
            link: &link,
        });

        Some(Self {
            record_id: record.id,
            recipient: recipient.to_string(),
            sender_name: ctx.sender_name.clone(),
            tier: decision.tier,
            subject,
            headline,
            intro,
            time_remaining,
            due_label,
            accent: accent.to_string(),
            link,
            html,
        })
    }
}

/// Time left until the due date in words.
///
/// Past due reads `"Vencida"`; under a day is shown in hours and minutes;
/// otherwise fractional days with one decimal.
pub fn time_remaining_label(days_remaining: f64) -> String {
    if days_remaining < 0.0 {
        return "Vencida".to_string();
    }
    if days_remaining >= 1.0 {
        return format!("{:.1} días", days_remaining);
    }

    let total_hours = days_remaining * 24.0;
    let hours = total_hours.floor() as i64;
    let minutes = ((total_hours - hours as f64) * 60.0).floor() as i64;

    if hours == 0 {
        format!("{} minutos", minutes)
    } else {
        format!("{} horas y {} minutos", hours, minutes)
    }
}

struct HtmlParts<'a> {
    sender_name: &'a str,
    headline: &'a str,
    intro: &'a str,
    title: &'a str,
    due_label: &'a str,
    time_remaining: &'a str,
    accent: &'a str,
    link: &'a str,
}

fn render_html(p: &HtmlParts<'_>) -> String {
    format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto; border: 1px solid #e0e0e0; border-radius: 8px;">
  <div style="background-color: {accent}; padding: 25px; text-align: center;">
    <h1 style="color: white; margin: 0; font-size: 22px;">{headline}</h1>
    <p style="color: #f0f0f0; margin: 5px 0 0 0;">{sender}</p>
  </div>
  <div style="padding: 30px;">
    <p>Estimado usuario,</p>
    <p>{intro}</p>
    <ul style="list-style: none; padding: 0; border-left: 5px solid {accent}; padding-left: 15px;">
      <li><strong>Documento:</strong> {title}</li>
      <li><strong>Fecha Límite:</strong> {due}</li>
      <li><strong>Tiempo Restante:</strong> {remaining}</li>
    </ul>
    <p style="text-align: center;"><a href="{link}" style="background-color: {accent}; color: white; padding: 14px 30px; text-decoration: none; border-radius: 6px;">Gestionar Documento</a></p>
  </div>
</div>"#,
        accent = p.accent,
        headline = escape_html(p.headline),
        sender = escape_html(p.sender_name),
        intro = escape_html(p.intro),
        title = escape_html(p.title),
        due = escape_html(p.due_label),
        remaining = escape_html(p.time_remaining),
        link = escape_html(p.link),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

use chrono::{DateTime, Utc};

use super::Email;

/// Facts shown in the registration confirmation email.
pub struct Confirmation<'a> {
    pub to: &'a str,
    pub participant_name: &'a str,
    pub event_title: &'a str,
    pub category_name: &'a str,
    pub start_date: DateTime<Utc>,
    pub city: &'a str,
    pub state: &'a str,
    pub amount_cents: i64,
    pub currency: &'a str,
    pub bib_number: Option<&'a str>,
}

/// Format minor units as `BRL 150.00`.
pub fn format_amount(amount_cents: i64, currency: &str) -> String {
    let sign = if amount_cents < 0 { "-" } else { "" };
    let abs = amount_cents.unsigned_abs();
    format!(
        "{} {}{}.{:02}",
        currency.to_uppercase(),
        sign,
        abs / 100,
        abs % 100
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn registration_confirmed(c: &Confirmation<'_>) -> Email {
    let title = escape(c.event_title);
    let bib = c
        .bib_number
        .map(|b| format!("<li><strong>Bib number:</strong> {}</li>", escape(b)))
        .unwrap_or_default();
    let html = format!(
        r#"<h1>Registration confirmed!</h1>
<p>Hi {name},</p>
<p>Your registration for <strong>{title}</strong> is confirmed.</p>
<h2>Details</h2>
<ul>
  <li><strong>Event:</strong> {title}</li>
  <li><strong>Category:</strong> {category}</li>
  <li><strong>Date:</strong> {date}</li>
  <li><strong>Location:</strong> {city}, {state}</li>
  <li><strong>Amount paid:</strong> {amount}</li>
  {bib}
</ul>
<p>See you at the start line!</p>"#,
        name = escape(c.participant_name),
        category = escape(c.category_name),
        date = c.start_date.format("%d/%m/%Y"),
        city = escape(c.city),
        state = escape(c.state),
        amount = format_amount(c.amount_cents, c.currency),
    );

    Email {
        to: c.to.to_string(),
        subject: format!("Registration confirmed - {}", c.event_title),
        html,
    }
}

use draw_core::{Assignment, AssignmentSet};
use html_escape::encode_text;

use crate::event::ExchangeEvent;

/// One outgoing email, addressed to the giver of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub from: String,
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub fn compose(event: &ExchangeEvent, assignment: &Assignment, sender: &str) -> Notification {
    let giver = &assignment.giver;
    let receiver = &assignment.receiver;
    let date = event.formatted_date();
    let budget = event.budget();

    let text = [
        format!("Hello {},", giver.name),
        String::new(),
        format!(
            "You have been drawn for the Secret Santa \"{}\" on {}.",
            event.name, date
        ),
        format!("Budget: {budget}"),
        format!("Gift for: {} ({})", receiver.name, receiver.email),
        String::new(),
        "Happy holidays and happy gifting!".to_string(),
    ]
    .join("\n");

    let html = format!(
        r#"<p>Hello <strong>{giver}</strong>,</p>
<p>You have been drawn for the <strong>Secret Santa</strong> <em>{event}</em> on <strong>{date}</strong>.</p>
<ul>
  <li><strong>Budget:</strong> {budget}</li>
  <li><strong>Gift for:</strong> {receiver} ({receiver_email})</li>
</ul>
<p>Happy holidays and happy gifting!</p>
<hr />
<p style="font-size:0.9em;color:#666;">Sent by {sender}</p>
"#,
        giver = encode_text(&giver.name),
        event = encode_text(&event.name),
        date = encode_text(&date),
        budget = encode_text(&budget),
        receiver = encode_text(&receiver.name),
        receiver_email = encode_text(&receiver.email),
        sender = encode_text(sender),
    );

    Notification {
        from: sender.to_string(),
        to: giver.email.clone(),
        to_name: giver.name.clone(),
        subject: format!("{} — Secret Santa", event.name),
        text,
        html,
    }
}

/// One notification per assignment, in ring order.
pub fn compose_all(event: &ExchangeEvent, set: &AssignmentSet, sender: &str) -> Vec<Notification> {
    set.iter().map(|a| compose(event, a, sender)).collect()
}

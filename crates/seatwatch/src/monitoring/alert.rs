use serde::Serialize;
use std::fmt::Write as _;

use super::domain::{ClassName, ClassNumber, SectionSnapshot};
use super::tracker::AlertKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReminderProgress {
    pub count: u32,
    pub max: u32,
}

/// Alert ready for a [`Notifier`](super::notifier::Notifier), rendered from the freshest snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedAlert {
    pub kind: AlertKind,
    pub topic: String,
    pub class_number: ClassNumber,
    pub class_name: ClassName,
    pub title: String,
    pub instructor: String,
    pub seats: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder: Option<ReminderProgress>,
    pub headline: String,
    pub message: String,
}

impl RenderedAlert {
    pub fn seat_opened(snapshot: &SectionSnapshot, topic: &str) -> Self {
        Self::render(AlertKind::SeatOpened, snapshot, None, topic)
    }

    pub fn seat_closed(snapshot: &SectionSnapshot, topic: &str) -> Self {
        Self::render(AlertKind::SeatClosed, snapshot, None, topic)
    }

    pub fn reminder(snapshot: &SectionSnapshot, progress: ReminderProgress, topic: &str) -> Self {
        Self::render(AlertKind::Reminder, snapshot, Some(progress), topic)
    }

    pub fn render(
        kind: AlertKind,
        snapshot: &SectionSnapshot,
        reminder: Option<ReminderProgress>,
        topic: &str,
    ) -> Self {
        let name = snapshot.display_name();
        let number = &snapshot.class_number;

        let (headline, message) = match (kind, reminder) {
            (AlertKind::SeatOpened, _) => (
                format!("Seat Open: {name}"),
                format!("✅ A seat just opened for {name} ({number})!"),
            ),
            (AlertKind::SeatClosed, _) => (
                format!("Class Full: {name}"),
                format!("❌ The open seat for {name} ({number}) is now full."),
            ),
            (AlertKind::Reminder, progress) => {
                let progress = progress.unwrap_or(ReminderProgress { count: 0, max: 0 });
                (
                    format!("Still Open: {name}"),
                    format!(
                        "📢 Reminder ({}/{}): A seat is still open for {name} ({number}).",
                        progress.count, progress.max
                    ),
                )
            }
        };

        Self {
            kind,
            topic: topic.to_string(),
            class_number: snapshot.class_number.clone(),
            class_name: snapshot.class_name.clone(),
            title: snapshot.title.clone(),
            instructor: snapshot.instructor.clone(),
            seats: snapshot.seats.clone(),
            reminder,
            headline,
            message,
        }
    }

    /// Plain-text body: the message followed by the section details.
    pub fn body(&self) -> String {
        let mut body = String::with_capacity(self.message.len() + 64);
        body.push_str(&self.message);
        let _ = write!(
            body,
            "\nTitle: {}\nInstructor: {}\nSeats: {}",
            self.title, self.instructor, self.seats
        );
        body
    }
}

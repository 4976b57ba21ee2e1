// Third Party
use serde::Serialize;

// Local
use crate::{
    event::EventNotification,
    utils::{or_no_info, render_timestamp},
};

pub const INFO_COLOR: &str = "#36a64f";
pub const WARNING_COLOR: &str = "#cc4d26";
pub const ERROR_COLOR: &str = "#8963B9";

/// Body of an incoming web hook request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub color: String,
    pub title: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    /// Slack accepts the string form, which is what we have always sent.
    pub short: String,
}

impl Field {
    fn short_form(title: &str, value: String) -> Self {
        Self {
            title: title.to_string(),
            value,
            short: "true".to_string(),
        }
    }
}

impl SlackMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The single attachment every message we build carries.
    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachments.first()
    }
}

/// Turns notifications and failures into web hook messages.
#[derive(Debug, Clone, Default)]
pub struct MessageFormatter {
    /// Inserted into the text of warnings, e.g. `<!here>` or `<@U024BE7LH>`.
    pub mention: String,
    pub cluster_name: Option<String>,
    pub channel: Option<String>,
    pub username: Option<String>,
}

impl MessageFormatter {
    pub fn format(&self, notification: &EventNotification) -> SlackMessage {
        let object = &notification.involved_object;
        let mut attachment = Attachment {
            color: INFO_COLOR.to_string(),
            title: self.title(&notification.message),
            text: format!(
                "event type: {}, event reason: {}",
                notification.event_type, notification.reason
            ),
            footer: Some(format!(
                "First time seen: {}, Last time seen: {}, Count: {}",
                render_timestamp(notification.first_seen.as_ref()),
                render_timestamp(notification.last_seen.as_ref()),
                or_no_info(notification.count),
            )),
            fields: vec![
                Field::short_form(
                    "Involved object",
                    format!(
                        "kind: {}, name: {}, namespace: {}",
                        or_no_info(object.kind.as_deref()),
                        or_no_info(object.name.as_deref()),
                        or_no_info(object.namespace.as_deref()),
                    ),
                ),
                Field::short_form(
                    "Metadata",
                    format!(
                        "name: {}, creation time: {}",
                        notification.name,
                        render_timestamp(notification.creation_timestamp.as_ref()),
                    ),
                ),
            ],
        };

        if notification.is_warning() {
            attachment.color = WARNING_COLOR.to_string();
            if !self.mention.is_empty() {
                attachment.text = format!("{} there is a warning for you to check", self.mention);
            }
        }

        self.message(attachment)
    }

    /// Message posted when processing fails, so that someone goes and reads the logs.
    pub fn format_error(&self, error_message: &str) -> SlackMessage {
        self.message(Attachment {
            color: ERROR_COLOR.to_string(),
            title: self.title("Ooopsy oopsy!"),
            text: format!(
                "Check logs! Failed to process events with error: {}",
                error_message
            ),
            footer: None,
            fields: Vec::new(),
        })
    }

    fn title(&self, text: &str) -> String {
        match &self.cluster_name {
            Some(cluster_name) => format!("[{}] {}", cluster_name, text),
            None => text.to_string(),
        }
    }

    fn message(&self, attachment: Attachment) -> SlackMessage {
        SlackMessage {
            channel: self.channel.clone(),
            username: self.username.clone(),
            attachments: vec![attachment],
        }
    }
}

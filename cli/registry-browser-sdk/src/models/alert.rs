pub const WARNING_TITLE: &str = "Warning";

/// Title and message of a user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertContent {
    pub title: String,
    pub message: String,
}

impl AlertContent {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            title: WARNING_TITLE.to_string(),
            message: message.into(),
        }
    }
}

/// A single alert slot. Showing a new alert replaces the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertDialog {
    content: Option<AlertContent>,
    visible: bool,
}

impl AlertDialog {
    pub fn show(&mut self, content: AlertContent) {
        self.content = Some(content);
        self.visible = true;
    }

    /// Hide the alert, the last content stays readable.
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn content(&self) -> Option<&AlertContent> {
        self.content.as_ref()
    }
}

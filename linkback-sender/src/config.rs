use std::time::Duration;

/// Default request timeout applied to both discovery and the XML-RPC call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity and limits for a [`PingbackSender`](crate::PingbackSender).
///
/// The `linkback` and `vinculum` presets differ only in naming; everything
/// else about sending is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    /// Event name the sender subscribes to.
    pub event_name: String,
    /// User-Agent sent with discovery and pingback requests.
    pub user_agent: String,
    /// Logical log channel attached to every log record.
    pub channel: String,
    /// Upper bound for each HTTP request.
    pub timeout: Duration,
}

impl SenderConfig {
    pub fn linkback() -> Self {
        Self::for_module("linkback")
    }

    pub fn vinculum() -> Self {
        Self::for_module("vinculum")
    }

    /// Look up a preset by module name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "linkback" => Some(Self::linkback()),
            "vinculum" => Some(Self::vinculum()),
            _ => None,
        }
    }

    fn for_module(module: &str) -> Self {
        Self {
            event_name: format!("{}_send", module),
            user_agent: format!("Drupal Pingback (+http://drupal.org/project/{})", module),
            channel: format!("{}_pingback", module),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_name(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = event_name.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self::linkback()
    }
}

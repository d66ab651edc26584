use std::fmt;

/// Fault codes defined by the pingback protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingbackFault {
    Generic,
    SourceNotFound,
    SourceLacksLink,
    TargetNotFound,
    TargetNotPingable,
    AlreadyRegistered,
    AccessDenied,
    UpstreamError,
    Other(i32),
}

impl PingbackFault {
    pub fn code(self) -> i32 {
        match self {
            Self::Generic => 0,
            Self::SourceNotFound => 16,
            Self::SourceLacksLink => 17,
            Self::TargetNotFound => 32,
            Self::TargetNotPingable => 33,
            Self::AlreadyRegistered => 48,
            Self::AccessDenied => 49,
            Self::UpstreamError => 50,
            Self::Other(code) => code,
        }
    }

    /// The remote already knows about this link; nothing left to do.
    pub fn is_already_registered(self) -> bool {
        matches!(self, Self::AlreadyRegistered)
    }
}

impl From<i32> for PingbackFault {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Generic,
            16 => Self::SourceNotFound,
            17 => Self::SourceLacksLink,
            32 => Self::TargetNotFound,
            33 => Self::TargetNotPingable,
            48 => Self::AlreadyRegistered,
            49 => Self::AccessDenied,
            50 => Self::UpstreamError,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for PingbackFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "generic fault"),
            Self::SourceNotFound => write!(f, "source URL does not exist"),
            Self::SourceLacksLink => write!(f, "source does not link to target"),
            Self::TargetNotFound => write!(f, "target URL does not exist"),
            Self::TargetNotPingable => write!(f, "target cannot be used as a pingback target"),
            Self::AlreadyRegistered => write!(f, "pingback already registered"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::UpstreamError => write!(f, "upstream server error"),
            Self::Other(code) => write!(f, "fault {}", code),
        }
    }
}

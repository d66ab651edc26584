use crate::result::LinkbackRequest;

/// Dispatch envelope handed over by whatever event bus triggers sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkbackEvent {
    pub name: String,
    pub request: LinkbackRequest,
}

impl LinkbackEvent {
    pub fn new(name: impl Into<String>, request: LinkbackRequest) -> Self {
        Self {
            name: name.into(),
            request,
        }
    }
}

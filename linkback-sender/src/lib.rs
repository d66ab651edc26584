pub mod config;
pub mod discovery;
pub mod error;
pub mod event;
pub mod fault;
pub mod links;
pub mod result;
pub mod sender;
pub mod xmlrpc;

pub use config::SenderConfig;
pub use error::LinkbackError;
pub use event::LinkbackEvent;
pub use fault::PingbackFault;
pub use result::{EndpointResult, FailureReason, LinkbackRequest, PingbackOutcome};
pub use sender::PingbackSender;

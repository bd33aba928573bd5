pub mod config;
pub mod state;
pub mod trial;
pub use config::{ConfigError, InputMode, SessionConfig};
pub use state::{PendingTimer, ReactionSession, ResponseOutcome, SessionEvent};
pub use trial::OpenTrial;

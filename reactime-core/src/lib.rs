pub mod gesture;
pub mod stage;
pub mod trial;

pub use gesture::{GestureMode, Scores};
pub use stage::Stage;
pub use trial::{SessionStats, SessionSummary, Trial};

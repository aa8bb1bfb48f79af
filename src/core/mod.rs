pub mod coordinator;
pub mod layout;
pub mod observers;
pub mod script;
pub mod scroll;
pub mod style;
pub mod stylesheet;

pub use crate::domain::model::{CleanState, Command, CommandAck, FontSize, UserPreferences};
pub use crate::domain::ports::{PageDom, PageHost, PreferenceStore, QueuedDelivery};
pub use crate::utils::error::Result;

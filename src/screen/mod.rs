//! UI-independent screen controllers. The TUI renders these and feeds
//! them key presses; tests drive them directly.

pub mod form;
pub mod home;

pub use form::{EntryForm, FormField, FormMode, TextField};
pub use home::{Alert, AlertKind, HomeScreen, HomeState, MutationKind, MutationOutcome};

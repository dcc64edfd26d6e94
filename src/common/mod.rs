mod state;

pub use state::{AppState, ResponseCache};

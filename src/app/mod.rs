pub mod fetch;
pub mod state;

pub mod alert;
pub mod bootstrap;
pub mod catalog;
pub mod package;
pub mod search;
pub mod search_state;
pub mod session;

pub mod chains;
pub mod delete;
pub mod favorites;
pub mod label;
pub mod queue;
pub mod safes;
pub(crate) mod utils;

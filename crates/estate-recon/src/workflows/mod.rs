pub mod gazette;
pub mod names;
pub mod reconcile;
pub mod registry;

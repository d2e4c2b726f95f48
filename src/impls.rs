pub mod notifier;
pub mod tokener;

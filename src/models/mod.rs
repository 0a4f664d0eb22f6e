pub mod layout;
pub mod loaders;
pub mod order;

pub use layout::{Locator, PortalLayout};
pub use loaders::{list_order_files, load_layout};
pub use order::{
    AttemptRecord, AttemptState, BatchId, FailureReason, OrderFile, SubmissionReport,
    SubmissionResult,
};

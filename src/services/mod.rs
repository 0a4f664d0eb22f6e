pub mod batch_extractor;
pub mod file_server;
pub mod interaction;
pub mod local_files;
pub mod notifier;
pub mod overrides;

pub use batch_extractor::extract_batch_id;
pub use file_server::{FileServer, FtpFileServer};
pub use interaction::{PageActions, Probe, WaitBudget};
pub use notifier::{notifier_from_config, EmailNotifier, LogNotifier, Notification, Notifier};
pub use overrides::OverrideDetector;

pub mod toml_loader;

pub use toml_loader::{list_order_files, load_layout};

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, Format, build_network, detect_format, load_layout, parse_layout};
pub use schema::LayoutData;

pub mod deepl_client;
pub mod error;
pub mod interface;
pub mod language;

pub use deepl_client::*;
pub use error::*;
pub use interface::*;
pub use language::*;

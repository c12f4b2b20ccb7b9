//! Caption timeline types and the extraction/cleaning stages.

pub mod cleaner;
pub mod drift;
pub mod extractor;
pub mod filter;
pub mod store;
pub mod types;

pub use cleaner::{clean_timeline, CleanStats};
pub use drift::DriftGuard;
pub use extractor::{build_timeline, extract_timeline};
pub use filter::{ValidityFilter, Wordlist};
pub use types::{CaptionEvent, Timeline};

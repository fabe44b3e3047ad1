pub mod extractor;
pub mod fetcher;

pub use extractor::*;
pub use fetcher::*;

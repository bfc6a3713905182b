pub mod keyword;
pub mod keyword_count;
pub mod location_category;

pub use keyword::Keyword;
pub use keyword_count::KeywordCount;
pub use location_category::LocationCategory;

pub mod html_extractor;

pub use self::html_extractor::HtmlExtractor;

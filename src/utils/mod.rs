pub mod header_converter;

pub use self::header_converter::HeaderConverter;

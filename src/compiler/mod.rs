//! 编译模块：指令解析与模式匹配
pub mod compiler;
pub mod pattern;

pub use self::compiler::PatternMatcher;
pub use self::pattern::{parse_directives, CompiledPattern, Match, ParsedPattern, PatternError};

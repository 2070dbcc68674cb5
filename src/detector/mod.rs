//! 检测模块：检测会话、结果存储与结果解析
pub mod detector;
pub mod resolver;
pub mod store;

// 导出核心接口
pub use self::detector::{DetectReport, DetectionSession, TechDetector};
pub use self::resolver::Resolver;
pub use self::store::FingerprintStore;

//! 规则模块：负责规则的加载、缓存、形态归一化与数据模型定义
pub mod model;
pub mod shape;
pub mod cache;
pub mod loader;
pub mod icon;

// 导出核心接口
pub use self::model::{
    CategoryRef, CategoryRule, Channel, GroupRule, RuleEntry, RuleLibrary, RuleTables, TechRule, Technology,
};
pub use self::shape::{normalize, FieldShape};
pub use self::loader::RuleLoader;
pub use self::cache::RuleCacheManager;
pub use self::icon::{Icon, IconReader};

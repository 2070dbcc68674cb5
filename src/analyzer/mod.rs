//! 通道分析器：每个观测通道一个分发器
use crate::rule::{Channel, FieldShape, RuleEntry};

pub mod common;
pub mod cookie;
pub mod header;
pub mod dns;
pub mod body;
pub mod text;
pub mod meta;
pub mod script_src;
pub mod websocket;
pub mod dom;
pub mod js;
pub mod scripts;

pub use self::common::DispatchContext;

/// 同步分析器的通用抽象特质
/// D - 观测数据类型（支持 str/[T] 等动态大小类型）
pub trait Analyzer<D: ?Sized> {
    /// 对应的规则字段通道
    const CHANNEL: Channel;

    /// 核心业务匹配逻辑 - 各分析器的唯一差异化实现点
    fn match_logic(ctx: &DispatchContext<'_>, entry: &RuleEntry, shape: &FieldShape, data: &D);

    /// 通用分析执行骨架：遍历规则 → 取该通道的归一化形态 → 调用业务匹配
    fn analyze(ctx: &DispatchContext<'_>, data: &D) {
        for entry in ctx.library.entries() {
            let Some(shape) = entry.shape(Self::CHANNEL) else {
                continue;
            };
            Self::match_logic(ctx, entry, shape, data);
        }
    }
}

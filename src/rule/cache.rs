//! 规则缓存管理
//! 仅处理原始规则表的本地序列化（MessagePack）和反序列化

use rmp_serde::{from_slice, Serializer};
use serde::Serialize;
use tracing::debug;

use super::model::RuleTables;
use crate::config::GlobalConfig;
use crate::error::{WapResult, WappalyzerError};

/// 规则缓存管理器
pub struct RuleCacheManager;

impl RuleCacheManager {
    /// 从本地缓存加载规则表
    pub async fn load_from_cache(config: &GlobalConfig) -> WapResult<RuleTables> {
        let cache_path = &config.rule_cache_path;
        let cache_data = tokio::fs::read(cache_path).await?;

        // MessagePack反序列化
        let tables: RuleTables = from_slice(&cache_data)
            .map_err(|e| WappalyzerError::MsgPackError(format!("反序列化失败：{}", e)))?;

        debug!(
            "缓存文件反序列化成功，技术规则数：{}，分类规则数：{}",
            tables.tech_rules.len(),
            tables.category_rules.len()
        );

        Ok(tables)
    }

    /// 将规则表缓存到本地（字段以名称编码，规则字段可选缺省）
    pub async fn save_to_cache(config: &GlobalConfig, tables: &RuleTables) -> WapResult<()> {
        let cache_path = &config.rule_cache_path;
        let mut cache_data = Vec::new();

        // MessagePack序列化
        tables
            .serialize(&mut Serializer::new(&mut cache_data).with_struct_map())
            .map_err(|e| WappalyzerError::MsgPackError(format!("序列化失败：{}", e)))?;

        debug!("规则库序列化成功，序列化后数据大小：{} 字节", cache_data.len());

        // 写入文件
        if let Some(parent) = cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WappalyzerError::RuleCacheError(format!("创建缓存目录失败：{}", e)))?;
        }
        tokio::fs::write(cache_path, cache_data).await?;
        Ok(())
    }

    /// 清除本地缓存
    pub async fn clear_cache(config: &GlobalConfig) -> WapResult<()> {
        let cache_path = &config.rule_cache_path;
        if tokio::fs::try_exists(cache_path).await.unwrap_or(false) {
            tokio::fs::remove_file(cache_path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::model::RuleLibrary;
    use crate::rule::{Channel, FieldShape};
    use crate::ConfigManager;

    #[tokio::test]
    async fn test_cache_restores_rules() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ConfigManager::custom()
            .rule_cache_path(tmp.path().join("cache").join("rules.mp"))
            .build();

        let library = RuleLibrary::from_json(
            r#"{ "Nginx": { "cats": [22], "headers": { "Server": "nginx" }, "scriptSrc": ["a", "b"], "saas": true } }"#,
            r#"{ "22": { "name": "Web servers", "priority": 8 } }"#,
        )
        .unwrap();
        RuleCacheManager::save_to_cache(&config, &library.to_tables()).await.unwrap();

        let restored = RuleLibrary::new(RuleCacheManager::load_from_cache(&config).await.unwrap());
        let nginx = restored.get("Nginx").unwrap();
        assert!(matches!(nginx.shape(Channel::Headers), Some(FieldShape::StrMap(_))));
        assert!(matches!(nginx.shape(Channel::ScriptSrc), Some(FieldShape::StrList(l)) if l.len() == 2));
        assert_eq!(nginx.rule.saas, Some(true));
        assert_eq!(restored.category(22).and_then(|c| c.priority), Some(8));

        RuleCacheManager::clear_cache(&config).await.unwrap();
        assert!(RuleCacheManager::load_from_cache(&config).await.is_err());
    }
}

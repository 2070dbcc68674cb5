//! 规则加载管理器
//! 负责从本地缓存或 Wappalyzer 规则目录加载规则库

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::cache::RuleCacheManager;
use super::icon::icon_dir;
use super::model::{CategoryRule, GroupRule, RuleLibrary, RuleTables, TechRule};
use crate::config::GlobalConfig;
use crate::error::{WapResult, WappalyzerError};

/// 技术规则文件名：_.json 与 a.json ~ z.json
fn technology_files() -> impl Iterator<Item = String> {
    std::iter::once("_".to_string())
        .chain((b'a'..=b'z').map(|c| (c as char).to_string()))
        .map(|stem| format!("{}.json", stem))
}

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 加载规则库（优先本地缓存，缓存失效则读取规则目录）
    pub async fn load(config: &GlobalConfig) -> WapResult<RuleLibrary> {
        // 1. 优先加载本地缓存
        if config.use_cache {
            match RuleCacheManager::load_from_cache(config).await {
                Ok(tables) => {
                    debug!("从本地缓存加载规则库成功");
                    return Ok(RuleLibrary::new(tables));
                }
                Err(e) => warn!("本地缓存不存在或损坏（{}），将从规则目录加载", e),
            }
        }

        // 2. 读取规则目录
        let tables = Self::load_tables(&config.rule_dir).await?;
        Self::check_icons(&config.rule_dir, &tables).await;

        // 3. 缓存到本地
        if config.use_cache {
            if let Err(e) = RuleCacheManager::save_to_cache(config, &tables).await {
                warn!("规则库缓存到本地失败：{}", e);
            } else {
                debug!("规则库已缓存到本地");
            }
        }

        Ok(RuleLibrary::new(tables))
    }

    /// 直接从规则目录加载（不使用缓存）
    pub async fn load_dir(rule_dir: &Path) -> WapResult<RuleLibrary> {
        let tables = Self::load_tables(rule_dir).await?;
        Self::check_icons(rule_dir, &tables).await;
        Ok(RuleLibrary::new(tables))
    }

    /// 读取原始规则表：技术规则与分类缺失或格式错误均为致命错误，分组文件可缺省
    pub async fn load_tables(rule_dir: &Path) -> WapResult<RuleTables> {
        let src = rule_dir.join("src");
        let technologies_dir = src.join("technologies");

        let mut tech_rules = HashMap::new();
        for file in technology_files() {
            let path = technologies_dir.join(&file);
            let rules: HashMap<String, TechRule> = read_json(&path).await?;
            debug!("读取 {}，规则数：{}", file, rules.len());
            tech_rules.extend(rules);
        }

        let category_rules: HashMap<String, CategoryRule> = read_json(&src.join("categories.json")).await?;

        let groups_path = src.join("groups.json");
        let group_rules: HashMap<String, GroupRule> = if tokio::fs::try_exists(&groups_path).await.unwrap_or(false) {
            read_json(&groups_path).await?
        } else {
            warn!("分组文件不存在：{}", groups_path.display());
            HashMap::new()
        };

        info!(
            "规则目录加载完成，技术规则数：{}，分组数：{}，分类数：{}",
            tech_rules.len(),
            group_rules.len(),
            category_rules.len()
        );

        Ok(RuleTables {
            tech_rules,
            category_rules,
            group_rules,
        })
    }

    /// 检查图标文件是否存在（内联 SVG 与空图标不检查），返回缺失数量
    pub async fn check_icons(rule_dir: &Path, tables: &RuleTables) -> usize {
        let dir: PathBuf = icon_dir(rule_dir);
        let mut missing = 0;
        let mut no_icon = 0;

        for (name, rule) in &tables.tech_rules {
            let icon = rule.icon.as_deref().unwrap_or("");
            if icon.is_empty() || icon.contains('<') {
                no_icon += 1;
                continue;
            }
            if !tokio::fs::try_exists(dir.join(icon)).await.unwrap_or(false) {
                debug!("图标文件缺失：技术={}，图标={}", name, icon);
                missing += 1;
            }
        }

        if missing > 0 {
            warn!("图标文件缺失 {} 个（目录：{}）", missing, dir.display());
        }
        debug!("无图标技术数：{}", no_icon);
        missing
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> WapResult<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| WappalyzerError::RuleLoadError(format!("读取 {} 失败：{}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| WappalyzerError::RuleParseError(format!("{}：{}", path.display(), e)))
}

//! 指纹结果存储
//! 按技术名称互斥写入，同名条目后写覆盖先写

use std::collections::HashMap;
use std::sync::Mutex;

use crate::rule::Technology;

#[derive(Debug, Default)]
pub struct FingerprintStore {
    entries: Mutex<HashMap<String, Technology>>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入（覆盖同名条目，不累加置信度）
    pub fn set(&self, technology: Technology) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(technology.name.clone(), technology);
    }

    pub fn get(&self, name: &str) -> Option<Technology> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前结果的副本
    pub fn snapshot(&self) -> HashMap<String, Technology> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

//! 技术图标读取

use std::path::{Path, PathBuf};

use crate::error::{WapResult, WappalyzerError};

const ICON_SUBDIR: &str = "src/drivers/webextension/images/icons";

/// 规则目录下的图标目录
pub fn icon_dir(rule_dir: &Path) -> PathBuf {
    rule_dir.join(ICON_SUBDIR)
}

/// 图标内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// 按扩展名推断内容类型
pub fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".svg") {
        "image/svg+xml"
    } else if lower.ends_with(".png") {
        "image/png"
    } else {
        "application/octet-stream"
    }
}

/// 图标读取器
#[derive(Debug, Clone)]
pub struct IconReader {
    dir: PathBuf,
}

impl IconReader {
    pub fn new(rule_dir: &Path) -> Self {
        Self {
            dir: icon_dir(rule_dir),
        }
    }

    /// 读取图标，文件名不得包含路径分隔符
    pub async fn read(&self, filename: &str) -> WapResult<Icon> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.contains("..") {
            return Err(WappalyzerError::InvalidInput(format!("非法图标文件名：{}", filename)));
        }
        let bytes = tokio::fs::read(self.dir.join(filename))
            .await
            .map_err(|e| WappalyzerError::IconError(format!("{}：{}", filename, e)))?;
        Ok(Icon {
            bytes,
            content_type: content_type_for(filename),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_icon() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = icon_dir(tmp.path());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Nginx.svg"), "<svg></svg>").unwrap();

        let reader = IconReader::new(tmp.path());
        let icon = reader.read("Nginx.svg").await.unwrap();
        assert_eq!(icon.content_type, "image/svg+xml");
        assert_eq!(icon.bytes, b"<svg></svg>".to_vec());

        assert!(matches!(reader.read("Missing.png").await, Err(WappalyzerError::IconError(_))));
        assert!(matches!(reader.read("../secret").await, Err(WappalyzerError::InvalidInput(_))));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.ico"), "application/octet-stream");
    }
}

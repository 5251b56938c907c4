// ==========================================
// 销售生产力看板 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

/// 每批次（每事务）默认行数
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// CSV 默认分隔符
pub const DEFAULT_CSV_DELIMITER: u8 = b',';

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（config_kv 表）、ImportConfig（固定值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取批次大小
    ///
    /// # 默认值
    /// - 200
    ///
    /// # 约束
    /// - 必须 >= 1，非法值回退为默认值
    async fn get_batch_size(&self) -> ImportResult<usize>;

    /// 获取 CSV 分隔符（单个 ASCII 字节）
    ///
    /// # 默认值
    /// - ','
    async fn get_csv_delimiter(&self) -> ImportResult<u8>;
}

// ==========================================
// ImportConfig - 固定值配置
// ==========================================
// 用途: 测试、无 config_kv 表的场景
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub csv_delimiter: u8,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            csv_delimiter: DEFAULT_CSV_DELIMITER,
        }
    }
}

impl ImportConfig {
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ImportConfigReader for ImportConfig {
    async fn get_batch_size(&self) -> ImportResult<usize> {
        Ok(self.batch_size.max(1))
    }

    async fn get_csv_delimiter(&self) -> ImportResult<u8> {
        Ok(self.csv_delimiter)
    }
}

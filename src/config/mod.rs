// ==========================================
// 销售生产力看板 - 配置层
// ==========================================
// 职责: 导入相关配置读取
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{
    ImportConfig, ImportConfigReader, DEFAULT_BATCH_SIZE, DEFAULT_CSV_DELIMITER,
};

// ==========================================
// 销售生产力看板 - 配置管理器
// ==========================================
// 职责: 配置加载、查询
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{
    ImportConfigReader, DEFAULT_BATCH_SIZE, DEFAULT_CSV_DELIMITER,
};
use crate::db::open_sqlite_connection;
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    pub const BATCH_SIZE: &str = "import.batch_size";
    pub const CSV_DELIMITER: &str = "import.csv_delimiter";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ImportError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: format!("锁获取失败: {}", e),
        })?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self.conn.lock().map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: format!("锁获取失败: {}", e),
        })?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_size(&self) -> ImportResult<usize> {
        let Some(value) = self.get_config_value(config_keys::BATCH_SIZE)? else {
            return Ok(DEFAULT_BATCH_SIZE);
        };

        match value.trim().parse::<usize>() {
            Ok(size) if size >= 1 => Ok(size),
            _ => {
                tracing::warn!(
                    config_key = config_keys::BATCH_SIZE,
                    raw_value = %value,
                    "批次大小配置非法，使用默认值"
                );
                Ok(DEFAULT_BATCH_SIZE)
            }
        }
    }

    async fn get_csv_delimiter(&self) -> ImportResult<u8> {
        let Some(value) = self.get_config_value(config_keys::CSV_DELIMITER)? else {
            return Ok(DEFAULT_CSV_DELIMITER);
        };

        // TRIM 会吃掉制表符，这里先识别别名
        match value.as_str() {
            "\t" | "tab" | "TAB" | "\\t" => return Ok(b'\t'),
            _ => {}
        }

        match value.trim().as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(ImportError::ConfigValueError {
                key: config_keys::CSV_DELIMITER.to_string(),
                value,
                message: "se espera un único carácter ASCII".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let config = manager();
        assert_eq!(config.get_batch_size().await.unwrap(), 200);
        assert_eq!(config.get_csv_delimiter().await.unwrap(), b',');
    }

    #[tokio::test]
    async fn test_reads_overrides() {
        let config = manager();
        config
            .set_global_config_value(config_keys::BATCH_SIZE, "50")
            .unwrap();
        config
            .set_global_config_value(config_keys::CSV_DELIMITER, ";")
            .unwrap();

        assert_eq!(config.get_batch_size().await.unwrap(), 50);
        assert_eq!(config.get_csv_delimiter().await.unwrap(), b';');
    }

    #[tokio::test]
    async fn test_invalid_batch_size_falls_back() {
        let config = manager();
        config
            .set_global_config_value(config_keys::BATCH_SIZE, "0")
            .unwrap();
        assert_eq!(config.get_batch_size().await.unwrap(), 200);

        config
            .set_global_config_value(config_keys::BATCH_SIZE, "abc")
            .unwrap();
        assert_eq!(config.get_batch_size().await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_tab_alias_and_invalid_delimiter() {
        let config = manager();
        config
            .set_global_config_value(config_keys::CSV_DELIMITER, "tab")
            .unwrap();
        assert_eq!(config.get_csv_delimiter().await.unwrap(), b'\t');

        config
            .set_global_config_value(config_keys::CSV_DELIMITER, ";;")
            .unwrap();
        assert!(matches!(
            config.get_csv_delimiter().await,
            Err(ImportError::ConfigValueError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_table_is_read_error() {
        let conn = Connection::open_in_memory().unwrap();
        let config = ConfigManager::from_connection(Arc::new(Mutex::new(conn)));
        assert!(matches!(
            config.get_batch_size().await,
            Err(ImportError::ConfigReadError { .. })
        ));
    }
}

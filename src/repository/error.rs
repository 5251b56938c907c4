// ==========================================
// 销售生产力看板 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: Display 保留底层数据库错误原文，直接进入导入汇总的 reason
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 连接错误（整次导入失败）=====
    #[error("{0}")]
    DatabaseConnectionError(String),

    #[error("lock poisoned: {0}")]
    LockError(String),

    // ===== 事务 / 语句错误（单批次回滚）=====
    #[error("{0}")]
    DatabaseTransactionError(String),

    #[error("{0}")]
    DatabaseQueryError(String),

    #[error("{0}")]
    UniqueConstraintViolation(String),

    #[error("{0}")]
    ForeignKeyViolation(String),

    #[error("Registro no encontrado: {entity} con id={id}")]
    NotFound { entity: String, id: String },

    // ===== 数据质量错误 =====
    #[error("Valor almacenado inválido (campo={field}): {message}")]
    FieldValueError { field: String, message: String },
}

impl RepositoryError {
    /// 连接层面的失败：无法继续任何批次
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            RepositoryError::DatabaseConnectionError(_) | RepositoryError::LockError(_)
        )
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, Some(msg)) => {
                if code.code == rusqlite::ErrorCode::CannotOpen {
                    RepositoryError::DatabaseConnectionError(msg)
                } else if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

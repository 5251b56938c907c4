// ==========================================
// 销售生产力看板 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 范围: 只包含导致整次导入失败的错误
//       行级/批次级问题记录在 ImportSummary 中，不在此列
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("Archivo no encontrado: {0}")]
    FileNotFound(String),

    #[error("Formato no soportado: {0} (use .csv, .txt, .xlsx o .xls)")]
    UnsupportedFormat(String),

    #[error("Error leyendo archivo: {0}")]
    FileReadError(String),

    #[error("Error de formato en archivo: {0}")]
    ParseError(String),

    // ===== 数据库错误 =====
    #[error("No se pudo obtener conexión a la base de datos: {0}")]
    DatabaseConnectionError(String),

    // ===== 配置错误 =====
    #[error("Error leyendo configuración (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("Valor de configuración inválido (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::ParseError(format!("CSV: {}", err))
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ParseError(format!("Excel: {}", err))
    }
}

// 仓储层错误到达这里时，只可能是连接不可用（批次内错误已被吸收）
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::DatabaseConnectionError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_file_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "ventas.csv");
        assert!(matches!(ImportError::from(err), ImportError::FileNotFound(_)));
    }

    #[test]
    fn test_io_other_maps_to_read_error() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(ImportError::from(err), ImportError::FileReadError(_)));
    }
}

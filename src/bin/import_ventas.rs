// ==========================================
// 销售生产力看板 - 命令行导入工具
// ==========================================
// 用法: import_ventas <archivo.csv|.txt|.xlsx|.xls> [db_path]
// 输出: 导入汇总 JSON（stdout），日志写 stderr
// 退出码: 整次导入失败时非 0；行级/批次级错误不影响退出码
// ==========================================

use anyhow::{bail, Context, Result};
use sales_productivity::config::ConfigManager;
use sales_productivity::db::{ensure_schema, get_default_db_path, open_sqlite_connection};
use sales_productivity::logging;
use sales_productivity::{SalesImporter, SalesImporterImpl, SaleImportRepositoryImpl};
use std::sync::{Arc, Mutex};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(file_path) = args.next() else {
        bail!("uso: import_ventas <archivo> [db_path]");
    };
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("no se pudo abrir la base de datos: {}", db_path))?;
    ensure_schema(&conn).context("no se pudo preparar el esquema")?;
    info!(db_path = %db_path, file = %file_path, "iniciando importación");

    // 仓储与配置共享同一连接
    let conn = Arc::new(Mutex::new(conn));
    let repo = SaleImportRepositoryImpl::from_connection(conn.clone());
    let config = ConfigManager::from_connection(conn);
    let importer = SalesImporterImpl::with_default_validator(repo, config);

    let summary = importer
        .import_file(&file_path)
        .await
        .with_context(|| format!("falló la importación de {}", file_path))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

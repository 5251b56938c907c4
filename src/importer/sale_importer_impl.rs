// ==========================================
// 销售生产力看板 - 销售导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 格式判断 → 读取配置 → 解析 → 全量校验 → 分批落库(含产品解析) → 汇总
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::sale::ImportSummary;
use crate::importer::batch_committer::{BatchCommitter, ValidatedRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{FileFormat, UniversalFileParser};
use crate::importer::row_validator::SaleRowValidator;
use crate::importer::sale_importer_trait::{RowValidator, SalesImporter};
use crate::repository::SaleImportRepository;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

// ==========================================
// SalesImporterImpl - 销售导入器实现
// ==========================================
pub struct SalesImporterImpl<R, C>
where
    R: SaleImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器
    config: C,

    // 行校验器
    row_validator: Box<dyn RowValidator>,
}

impl<R, C> SalesImporterImpl<R, C>
where
    R: SaleImportRepository,
    C: ImportConfigReader,
{
    /// 创建新的 SalesImporter 实例
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - config: 配置读取器
    /// - row_validator: 行校验器
    pub fn new(import_repo: R, config: C, row_validator: Box<dyn RowValidator>) -> Self {
        Self {
            import_repo,
            config,
            row_validator,
        }
    }

    /// 使用默认行校验器
    pub fn with_default_validator(import_repo: R, config: C) -> Self {
        Self::new(import_repo, config, Box::new(SaleRowValidator::new()))
    }

    pub fn repository(&self) -> &R {
        &self.import_repo
    }
}

#[async_trait::async_trait]
impl<R, C> SalesImporter for SalesImporterImpl<R, C>
where
    R: SaleImportRepository,
    C: ImportConfigReader,
{
    #[instrument(skip(self, bytes), fields(run_id))]
    async fn import_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        Span::current().record("run_id", run_id.as_str());

        // 格式不支持时直接拒绝，不读配置、不解析
        FileFormat::from_file_name(file_name)?;

        info!(size = bytes.len(), "开始导入销售数据");

        // === 步骤 0: 读取配置 ===
        let batch_size = self.config.get_batch_size().await?;
        let csv_delimiter = self.config.get_csv_delimiter().await?;
        debug!(batch_size, csv_delimiter = %(csv_delimiter as char), "导入配置已加载");

        // === 步骤 1: 解析文件 ===
        let records = UniversalFileParser::new(csv_delimiter)
            .parse(file_name, bytes)
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                e
            })?;
        info!(total_rows = records.len(), "文件解析完成");

        // === 步骤 2: 全量校验 ===
        let rows: Vec<ValidatedRow> = records
            .iter()
            .map(|record| ValidatedRow {
                line: record.line(),
                result: self.row_validator.validate(record),
            })
            .collect();

        let invalid_rows = rows.iter().filter(|r| r.result.is_err()).count();
        if invalid_rows > 0 {
            warn!(invalid_rows, "部分行未通过校验");
        }
        debug!(valid_rows = rows.len() - invalid_rows, "行校验完成");

        // === 步骤 3: 分批落库 ===
        let summary = BatchCommitter::new(&self.import_repo, batch_size).commit_all(rows)?;

        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            failed_rows = summary.failed_rows(),
            failed_batches = summary.failed_batches(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "销售数据导入完成"
        );

        Ok(summary)
    }

    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportSummary> {
        let path = file_path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        FileFormat::from_file_name(file_name)?;
        let bytes = read_source(path).await?;

        self.import_bytes(file_name, &bytes).await
    }

    async fn import_upload<P: AsRef<Path> + Send>(
        &self,
        temp_path: P,
        original_name: &str,
    ) -> ImportResult<ImportSummary> {
        // 任何返回路径上都删除临时文件
        let _guard = TempFileGuard::new(temp_path.as_ref());

        FileFormat::from_file_name(original_name)?;
        let bytes = read_source(temp_path.as_ref()).await?;

        self.import_bytes(original_name, &bytes).await
    }
}

async fn read_source(path: &Path) -> ImportResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ImportError::FileNotFound(path.display().to_string()),
        _ => ImportError::FileReadError(format!("{}: {}", path.display(), e)),
    })
}

// ==========================================
// TempFileGuard - 上传临时文件清理
// ==========================================
struct TempFileGuard {
    path: PathBuf,
}

impl TempFileGuard {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "临时文件已删除"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "临时文件删除失败"),
        }
    }
}

// ==========================================
// 销售生产力看板 - 销售导入 Trait
// ==========================================
// 职责: 定义销售导入接口（不包含实现）
// ==========================================

use crate::domain::sale::{CandidateSale, FieldError, ImportSummary, RawRecord};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// SalesImporter Trait
// ==========================================
// 用途: 销售导入主接口（"导入一个文件，得到一份汇总"）
// 实现者: SalesImporterImpl
#[async_trait]
pub trait SalesImporter: Send + Sync {
    /// 导入上传文件的内容
    ///
    /// # 参数
    /// - file_name: 原始文件名（扩展名决定解析模式）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(ImportSummary): 完整汇总（可能包含行级/批次级错误）
    /// - Err: 格式不支持、文件无法解析、数据库连接不可用
    ///
    /// # 导入流程
    /// 1. 文件解析
    /// 2. 全量校验（字段映射 + 类型转换）
    /// 3. 分批落库（每批一个事务，批内解析产品引用）
    /// 4. 汇总
    async fn import_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportSummary>;

    /// 从本地路径导入
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportSummary>;

    /// 导入上传的临时文件，结束后删除该文件（无论成功失败）
    ///
    /// # 参数
    /// - temp_path: 上传落地的临时文件
    /// - original_name: 用户上传时的文件名（决定解析模式）
    async fn import_upload<P: AsRef<Path> + Send>(
        &self,
        temp_path: P,
        original_name: &str,
    ) -> ImportResult<ImportSummary>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件内容为原始行记录
    ///
    /// # 返回
    /// - Ok(Vec<RawRecord>): 按文件顺序的行记录
    /// - Err(ParseError): 任一位置解析失败（不返回部分结果）
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRecord>>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 行校验接口（阶段 1）
// 实现者: SaleRowValidator
pub trait RowValidator: Send + Sync {
    /// 将原始行转换为候选销售记录
    ///
    /// # 返回
    /// - Ok(CandidateSale): 所有字段合法
    /// - Err(Vec<FieldError>): 全部违规项（不是只报第一个）
    fn validate(&self, record: &RawRecord) -> Result<CandidateSale, Vec<FieldError>>;
}

// ==========================================
// 销售生产力看板 - 导入层
// ==========================================
// 职责: 外部销售数据导入（"导入一个文件，得到一份汇总"）
// 支持: CSV/TXT, Excel (.xlsx/.xls)
// 流程: 解析 → 映射 → 清洗/校验 → 产品解析 → 分批落库 → 汇总
// ==========================================

// 模块声明
pub mod batch_committer;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod product_resolver;
pub mod row_validator;
pub mod sale_importer_impl;
pub mod sale_importer_trait;
pub mod summary;

// 重导出核心类型
pub use batch_committer::{BatchCommitter, ValidatedRow};
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapper, MappedSaleRow};
pub use file_parser::{CsvParser, ExcelParser, FileFormat, UniversalFileParser};
pub use product_resolver::{ProductResolver, ResolveFailure};
pub use row_validator::SaleRowValidator;
pub use sale_importer_impl::SalesImporterImpl;
pub use summary::SummaryAccumulator;

// 重导出 Trait 接口
pub use sale_importer_trait::{FileParser, RowValidator, SalesImporter};

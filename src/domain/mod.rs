// ==========================================
// 销售生产力看板 - 领域模型层
// ==========================================
// 职责: 定义导入管道的实体与值类型
// 红线: 不含数据访问逻辑
// ==========================================

pub mod sale;

// 重导出核心类型
pub use sale::{
    CandidateSale, ErrorPosition, FieldError, FieldErrorKind, ImportErrorEntry, ImportSummary,
    NaturalKey, ProductRef, RawRecord, ResolvedSale, RowOutcome, RowStatus, SaleField, SaleRecord,
};

// ==========================================
// 销售生产力看板 - 销售导入领域模型
// ==========================================
// 职责: 导入管道各阶段的数据结构
// 流向: RawRecord → CandidateSale → ResolvedSale → SaleRecord
//       每行最终落到一个 RowOutcome，汇总为 ImportSummary
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// RawRecord - 解析器输出的原始行
// ==========================================
// 用途: 文件解析 → 字段映射 之间的边界结构
// 生命周期: 仅在单次导入调用内
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    line: usize,
    fields: HashMap<String, String>,
}

impl RawRecord {
    /// 按 (列名, 值) 序列构造，重复列名保留第一次出现的值
    ///
    /// # 参数
    /// - line: 1-based 行号（表头之后的输入位置）
    /// - pairs: 列名 → 已 TRIM 的值
    pub fn from_pairs<I, K, V>(line: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = HashMap::new();
        for (k, v) in pairs {
            fields.entry(k.into()).or_insert_with(|| v.into());
        }
        Self { line, fields }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ==========================================
// ProductRef - 产品引用（ID 或名称）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductRef {
    Id(i64),
    Name(String),
}

// ==========================================
// CandidateSale - 校验通过的候选销售记录
// ==========================================
// 用途: 校验器输出，等待产品解析与落库
// 约束: amount >= 0，sale_date 无时间分量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSale {
    pub line: usize,                 // 原始行号
    pub external_id: Option<String>, // IdVenta（原样保留，作为 upsert 键）
    pub customer_id: String,         // IdCliente
    pub product: ProductRef,         // IdProducto / Producto
    pub sale_date: NaiveDate,        // FechaVenta
    pub amount: Decimal,             // Monto
}

impl CandidateSale {
    /// 绑定已解析的产品 ID
    pub fn resolve(self, product_id: i64) -> ResolvedSale {
        ResolvedSale {
            line: self.line,
            external_id: self.external_id,
            customer_id: self.customer_id,
            product_id,
            sale_date: self.sale_date,
            amount: self.amount,
        }
    }
}

// ==========================================
// ResolvedSale - 产品已解析、可直接落库
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSale {
    pub line: usize,
    pub external_id: Option<String>,
    pub customer_id: String,
    pub product_id: i64,
    pub sale_date: NaiveDate,
    pub amount: Decimal,
}

impl ResolvedSale {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            customer_id: self.customer_id.clone(),
            product_id: self.product_id,
            sale_date: self.sale_date,
            amount: self.amount.normalize(),
        }
    }
}

// ==========================================
// NaturalKey - 无外部 ID 时的去重键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub customer_id: String,
    pub product_id: i64,
    pub sale_date: NaiveDate,
    pub amount: Decimal,
}

// ==========================================
// SaleRecord - 已落库的销售记录（sales 表）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale_id: String,
    pub customer_id: String,
    pub product_id: i64,
    pub sale_date: NaiveDate,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// 字段校验错误
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleField {
    SaleId,
    CustomerId,
    SaleDate,
    Amount,
    Product,
    ProductId,
}

impl SaleField {
    /// 源文件中的标准列名
    pub fn column(&self) -> &'static str {
        match self {
            SaleField::SaleId => "IdVenta",
            SaleField::CustomerId => "IdCliente",
            SaleField::SaleDate => "FechaVenta",
            SaleField::Amount => "Monto",
            SaleField::Product => "Producto",
            SaleField::ProductId => "IdProducto",
        }
    }

    // "Fecha" 为阴性名词，错误信息需要性数一致
    fn is_feminine(&self) -> bool {
        matches!(self, SaleField::SaleDate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldErrorKind {
    Required, // 缺失或为空
    Invalid,  // 无法解析或超出范围
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: SaleField,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn required(field: SaleField) -> Self {
        Self {
            field,
            kind: FieldErrorKind::Required,
        }
    }

    pub fn invalid(field: SaleField) -> Self {
        Self {
            field,
            kind: FieldErrorKind::Invalid,
        }
    }

    /// 将多个错误拼接为一条原因（"; " 分隔）
    pub fn join(errors: &[FieldError]) -> String {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match (self.kind, self.field.is_feminine()) {
            (FieldErrorKind::Required, false) => "requerido",
            (FieldErrorKind::Required, true) => "requerida",
            (FieldErrorKind::Invalid, false) => "inválido",
            (FieldErrorKind::Invalid, true) => "inválida",
        };
        write!(f, "{} {}", self.field.column(), word)
    }
}

// ==========================================
// RowOutcome - 单行最终结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Imported,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub line: usize,
    pub status: RowStatus,
    pub reason: Option<String>,
}

impl RowOutcome {
    pub fn imported(line: usize) -> Self {
        Self {
            line,
            status: RowStatus::Imported,
            reason: None,
        }
    }

    pub fn skipped(line: usize) -> Self {
        Self {
            line,
            status: RowStatus::Skipped,
            reason: None,
        }
    }

    pub fn failed(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            status: RowStatus::Failed,
            reason: Some(reason.into()),
        }
    }
}

// ==========================================
// ImportSummary - 导入汇总（唯一返回值）
// ==========================================
// 序列化形态:
// { "imported": 1, "skipped": 0,
//   "errors": [ { "line": 2, "reason": "..." }, { "batchStart": 201, "reason": "..." } ] }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorPosition {
    Line(usize),
    BatchStart(usize),
}

impl ErrorPosition {
    /// 排序用的行号
    pub fn line(&self) -> usize {
        match self {
            ErrorPosition::Line(n) | ErrorPosition::BatchStart(n) => *n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportErrorEntry {
    #[serde(flatten)]
    pub position: ErrorPosition,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportErrorEntry>,
}

impl ImportSummary {
    /// 行级失败数（不含整批回滚）
    pub fn failed_rows(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e.position, ErrorPosition::Line(_)))
            .count()
    }

    /// 整批回滚次数
    pub fn failed_batches(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e.position, ErrorPosition::BatchStart(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_error_messages_agree_in_gender() {
        assert_eq!(
            FieldError::required(SaleField::CustomerId).to_string(),
            "IdCliente requerido"
        );
        assert_eq!(
            FieldError::required(SaleField::SaleDate).to_string(),
            "FechaVenta requerida"
        );
        assert_eq!(
            FieldError::invalid(SaleField::SaleDate).to_string(),
            "FechaVenta inválida"
        );
        assert_eq!(
            FieldError::invalid(SaleField::Amount).to_string(),
            "Monto inválido"
        );
    }

    #[test]
    fn test_field_error_join() {
        let errors = vec![
            FieldError::required(SaleField::CustomerId),
            FieldError::required(SaleField::Amount),
        ];
        assert_eq!(
            FieldError::join(&errors),
            "IdCliente requerido; Monto requerido"
        );
    }

    #[test]
    fn test_raw_record_keeps_first_duplicate_header() {
        let record = RawRecord::from_pairs(1, vec![("Monto", "10"), ("Monto", "20")]);
        assert_eq!(record.get("Monto"), Some("10"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_summary_serializes_line_and_batch_start() {
        let summary = ImportSummary {
            imported: 1,
            skipped: 0,
            errors: vec![
                ImportErrorEntry {
                    position: ErrorPosition::BatchStart(1),
                    reason: "disk I/O error".to_string(),
                },
                ImportErrorEntry {
                    position: ErrorPosition::Line(2),
                    reason: "IdCliente requerido".to_string(),
                },
            ],
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({
                "imported": 1,
                "skipped": 0,
                "errors": [
                    { "batchStart": 1, "reason": "disk I/O error" },
                    { "line": 2, "reason": "IdCliente requerido" }
                ]
            })
        );
        assert_eq!(summary.failed_rows(), 1);
        assert_eq!(summary.failed_batches(), 1);
    }

    #[test]
    fn test_natural_key_normalizes_amount() {
        let sale = ResolvedSale {
            line: 1,
            external_id: None,
            customer_id: "C1".to_string(),
            product_id: 7,
            sale_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            amount: "100.00".parse().unwrap(),
        };
        assert_eq!(sale.natural_key().amount.to_string(), "100");
    }
}

// ==========================================
// 销售生产力看板 - 字段映射器实现
// ==========================================
// 职责: 源列名(含别名) → 标准字段，空值标准化为 None
// ==========================================

use crate::domain::sale::{RawRecord, SaleField};

/// 映射后的中间结构：全部为文本，尚未做类型转换
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedSaleRow {
    pub line: usize,
    pub sale_id: Option<String>,
    pub customer_id: Option<String>,
    pub sale_date: Option<String>,
    pub amount: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
}

pub struct FieldMapper;

impl FieldMapper {
    pub fn map_row(&self, row: &RawRecord) -> MappedSaleRow {
        MappedSaleRow {
            line: row.line(),
            sale_id: self.get_string(row, SaleField::SaleId),
            customer_id: self.get_string(row, SaleField::CustomerId),
            sale_date: self.get_string(row, SaleField::SaleDate),
            amount: self.get_string(row, SaleField::Amount),
            product_id: self.get_string(row, SaleField::ProductId),
            product_name: self.get_string(row, SaleField::Product),
        }
    }

    /// 提取字符串字段（返回 Option），支持多个可能的列名（别名）
    fn get_string(&self, row: &RawRecord, field: SaleField) -> Option<String> {
        // 定义列名别名映射
        let aliases: &[&str] = match field {
            SaleField::Product => &["Producto", "NombreProducto"],
            _ => &[],
        };

        // 先试标准列名，再试别名
        std::iter::once(field.column())
            .chain(aliases.iter().copied())
            .filter_map(|column| row.get(column))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

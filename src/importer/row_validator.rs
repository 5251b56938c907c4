// ==========================================
// 销售生产力看板 - 行校验器实现
// ==========================================
// 阶段 1: RawRecord → CandidateSale
// 规则:
//   - 必填: IdCliente / FechaVenta / Monto / 产品(IdProducto 或 Producto)
//   - 格式: Monto 为 >= 0 的十进制，FechaVenta 可解析为日期
//   - 格式检查只针对已提供的字段（缺失只报"requerido"）
//   - 一行内收集全部违规项
// ==========================================

use crate::domain::sale::{CandidateSale, FieldError, ProductRef, RawRecord, SaleField};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::sale_importer_trait::RowValidator;

pub struct SaleRowValidator {
    mapper: FieldMapper,
    cleaner: DataCleaner,
}

impl SaleRowValidator {
    pub fn new() -> Self {
        Self {
            mapper: FieldMapper,
            cleaner: DataCleaner,
        }
    }
}

impl Default for SaleRowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowValidator for SaleRowValidator {
    fn validate(&self, record: &RawRecord) -> Result<CandidateSale, Vec<FieldError>> {
        let row = self.mapper.map_row(record);
        let mut errors = Vec::new();

        // 1. 必填检查
        if row.customer_id.is_none() {
            errors.push(FieldError::required(SaleField::CustomerId));
        }
        if row.sale_date.is_none() {
            errors.push(FieldError::required(SaleField::SaleDate));
        }
        if row.amount.is_none() {
            errors.push(FieldError::required(SaleField::Amount));
        }
        if row.product_id.is_none() && row.product_name.is_none() {
            errors.push(FieldError::required(SaleField::Product));
        }

        // 2. 格式检查
        let amount = row.amount.as_deref().and_then(|v| {
            let parsed = self.cleaner.parse_amount(v);
            if parsed.is_none() {
                errors.push(FieldError::invalid(SaleField::Amount));
            }
            parsed
        });

        let sale_date = row.sale_date.as_deref().and_then(|v| {
            let parsed = self.cleaner.parse_sale_date(v);
            if parsed.is_none() {
                errors.push(FieldError::invalid(SaleField::SaleDate));
            }
            parsed
        });

        // IdProducto 优先于名称
        let product = match (row.product_id.as_deref(), row.product_name) {
            (Some(raw_id), _) => match self.cleaner.parse_product_id(raw_id) {
                Some(id) => Some(ProductRef::Id(id)),
                None => {
                    errors.push(FieldError::invalid(SaleField::ProductId));
                    None
                }
            },
            (None, Some(name)) => Some(ProductRef::Name(name)),
            (None, None) => None,
        };

        match (row.customer_id, sale_date, amount, product) {
            (Some(customer_id), Some(sale_date), Some(amount), Some(product))
                if errors.is_empty() =>
            {
                Ok(CandidateSale {
                    line: row.line,
                    external_id: row.sale_id,
                    customer_id,
                    product,
                    sale_date,
                    amount,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn record(pairs: Vec<(&str, &str)>) -> RawRecord {
        RawRecord::from_pairs(2, pairs)
    }

    fn reason(result: Result<CandidateSale, Vec<FieldError>>) -> String {
        FieldError::join(&result.unwrap_err())
    }

    #[test]
    fn test_valid_row() {
        let candidate = SaleRowValidator::new()
            .validate(&record(vec![
                ("IdVenta", "V-1"),
                ("IdCliente", "C1"),
                ("FechaVenta", "2024-01-05"),
                ("Monto", "100.50"),
                ("Producto", "Widget"),
            ]))
            .unwrap();

        assert_eq!(candidate.line, 2);
        assert_eq!(candidate.external_id.as_deref(), Some("V-1"));
        assert_eq!(candidate.customer_id, "C1");
        assert_eq!(candidate.product, ProductRef::Name("Widget".to_string()));
        assert_eq!(
            candidate.sale_date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(candidate.amount, "100.5".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_missing_customer() {
        let result = SaleRowValidator::new().validate(&record(vec![
            ("FechaVenta", "2024-01-05"),
            ("Monto", "100"),
            ("Producto", "Widget"),
        ]));
        assert_eq!(reason(result), "IdCliente requerido");
    }

    #[test]
    fn test_reports_all_violations() {
        let result = SaleRowValidator::new().validate(&record(vec![
            ("IdCliente", ""),
            ("FechaVenta", "2024-01-05"),
            ("Producto", "Widget"),
        ]));
        assert_eq!(reason(result), "IdCliente requerido; Monto requerido");
    }

    #[test]
    fn test_missing_amount_is_not_also_invalid() {
        let result = SaleRowValidator::new().validate(&record(vec![
            ("IdCliente", "C1"),
            ("FechaVenta", "2024-01-05"),
            ("Producto", "Widget"),
        ]));
        assert_eq!(reason(result), "Monto requerido");
    }

    #[test]
    fn test_invalid_amount_and_date() {
        let result = SaleRowValidator::new().validate(&record(vec![
            ("IdCliente", "C1"),
            ("FechaVenta", "ayer"),
            ("Monto", "-5"),
            ("Producto", "Widget"),
        ]));
        assert_eq!(reason(result), "Monto inválido; FechaVenta inválida");
    }

    #[test]
    fn test_product_id_wins_over_name() {
        let candidate = SaleRowValidator::new()
            .validate(&record(vec![
                ("IdCliente", "C1"),
                ("FechaVenta", "2024-01-05"),
                ("Monto", "1"),
                ("IdProducto", "7"),
                ("Producto", "Widget"),
            ]))
            .unwrap();
        assert_eq!(candidate.product, ProductRef::Id(7));
    }

    #[test]
    fn test_invalid_product_id() {
        let result = SaleRowValidator::new().validate(&record(vec![
            ("IdCliente", "C1"),
            ("FechaVenta", "2024-01-05"),
            ("Monto", "1"),
            ("IdProducto", "siete"),
        ]));
        assert_eq!(reason(result), "IdProducto inválido");
    }

    #[test]
    fn test_missing_product() {
        let result = SaleRowValidator::new().validate(&record(vec![
            ("IdCliente", "C1"),
            ("FechaVenta", "2024-01-05"),
            ("Monto", "1"),
        ]));
        assert_eq!(reason(result), "Producto requerido");
    }
}

// ==========================================
// 销售生产力看板 - 数据清洗器实现
// ==========================================
// 职责: 文本 → 类型（日期宽松解析、金额、产品 ID）
// 空值已在字段映射阶段变为 None
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

/// 仅日期的格式（按优先级）
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%m/%d/%Y"];

/// 带时间的格式，时间部分会被丢弃
const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

pub struct DataCleaner;

impl DataCleaner {
    /// 宽松解析销售日期，丢弃时间分量
    pub fn parse_sale_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Some(date);
            }
        }

        // RFC 3339 取书写时的日期，不做时区换算
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.date_naive());
        }

        DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .map(|dt| dt.date())
    }

    /// 解析金额（十进制，>= 0），返回规范化后的值
    pub fn parse_amount(&self, value: &str) -> Option<Decimal> {
        let value = value.trim();
        let amount = Decimal::from_str(value)
            .or_else(|_| Decimal::from_scientific(value))
            .ok()?;

        if amount < Decimal::ZERO {
            return None;
        }
        Some(amount.normalize())
    }

    /// 解析产品 ID（整数）
    pub fn parse_product_id(&self, value: &str) -> Option<i64> {
        value.trim().parse::<i64>().ok()
    }
}

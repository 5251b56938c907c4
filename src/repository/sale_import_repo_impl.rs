// ==========================================
// 销售生产力看板 - 销售导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 存储: sales.amount 以规范化十进制文本保存，保证自然键精确比较
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::sale::{NaturalKey, ResolvedSale, SaleRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sale_import_repo::{
    ProductLookup, SaleImportRepository, SaleTransaction,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;
use uuid::Uuid;

const UPSERT_SALE_SQL: &str = r#"
    INSERT INTO sales (
        sale_id, customer_id, product_id, sale_date, amount, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
    ON CONFLICT(sale_id) DO UPDATE SET
        customer_id = excluded.customer_id,
        product_id = excluded.product_id,
        sale_date = excluded.sale_date,
        amount = excluded.amount,
        updated_at = excluded.updated_at
"#;

const INSERT_SALE_SQL: &str = r#"
    INSERT INTO sales (
        sale_id, customer_id, product_id, sale_date, amount, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
"#;

const EXISTS_BY_NATURAL_KEY_SQL: &str = r#"
    SELECT 1 FROM sales
    WHERE customer_id = ?1 AND product_id = ?2 AND sale_date = ?3 AND amount = ?4
    LIMIT 1
"#;

const FIND_PRODUCT_SQL: &str =
    "SELECT product_id FROM products WHERE product_name = ?1 LIMIT 1";

/// 金额的存储形式（去掉多余的尾零）
fn amount_to_db(amount: &Decimal) -> String {
    amount.normalize().to_string()
}

// ==========================================
// SaleImportRepositoryImpl
// ==========================================
pub struct SaleImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl SaleImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl SaleImportRepository for SaleImportRepositoryImpl {
    fn in_transaction<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn SaleTransaction) -> RepositoryResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let result = {
            let mut handle = SqliteSaleTransaction { tx: &tx };
            f(&mut handle)
        };

        match result {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "事务回滚失败");
                }
                Err(err)
            }
        }
    }

    fn count_sales(&self) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn get_sale(&self, sale_id: &str) -> RepositoryResult<Option<SaleRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let row = conn
            .query_row(
                r#"
                SELECT sale_id, customer_id, product_id, sale_date, amount, created_at, updated_at
                FROM sales WHERE sale_id = ?1
                "#,
                params![sale_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, NaiveDate>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, DateTime<Utc>>(5)?,
                        row.get::<_, DateTime<Utc>>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((sale_id, customer_id, product_id, sale_date, amount_raw, created_at, updated_at)) =
            row
        else {
            return Ok(None);
        };

        let amount = Decimal::from_str(&amount_raw).map_err(|e| RepositoryError::FieldValueError {
            field: "amount".to_string(),
            message: format!("{} ({})", e, amount_raw),
        })?;

        Ok(Some(SaleRecord {
            sale_id,
            customer_id,
            product_id,
            sale_date,
            amount,
            created_at,
            updated_at,
        }))
    }
}

// ==========================================
// SqliteSaleTransaction - 事务内句柄
// ==========================================
struct SqliteSaleTransaction<'t, 'c> {
    tx: &'t Transaction<'c>,
}

impl ProductLookup for SqliteSaleTransaction<'_, '_> {
    fn find_product_id_by_name(&mut self, name: &str) -> RepositoryResult<Option<i64>> {
        let mut stmt = self.tx.prepare_cached(FIND_PRODUCT_SQL)?;
        let id = stmt
            .query_row(params![name], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(id)
    }
}

impl SaleTransaction for SqliteSaleTransaction<'_, '_> {
    fn upsert_sale(&mut self, sale_id: &str, sale: &ResolvedSale) -> RepositoryResult<()> {
        let mut stmt = self.tx.prepare_cached(UPSERT_SALE_SQL)?;
        stmt.execute(params![
            sale_id,
            sale.customer_id,
            sale.product_id,
            sale.sale_date,
            amount_to_db(&sale.amount),
            Utc::now(),
        ])?;
        Ok(())
    }

    fn exists_by_natural_key(&mut self, key: &NaturalKey) -> RepositoryResult<bool> {
        let mut stmt = self.tx.prepare_cached(EXISTS_BY_NATURAL_KEY_SQL)?;
        let hit = stmt
            .query_row(
                params![
                    key.customer_id,
                    key.product_id,
                    key.sale_date,
                    amount_to_db(&key.amount),
                ],
                |_row| Ok(()),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    fn insert_sale(&mut self, sale: &ResolvedSale) -> RepositoryResult<String> {
        let sale_id = Uuid::new_v4().to_string();
        let mut stmt = self.tx.prepare_cached(INSERT_SALE_SQL)?;
        stmt.execute(params![
            sale_id,
            sale.customer_id,
            sale.product_id,
            sale.sale_date,
            amount_to_db(&sale.amount),
            Utc::now(),
        ])?;
        Ok(sale_id)
    }
}

// ==========================================
// 销售生产力看板 - 销售导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 事务: 由调用方通过 in_transaction 划定边界（每批次一个事务）
// ==========================================

use crate::domain::sale::{NaturalKey, ResolvedSale, SaleRecord};
use crate::repository::error::RepositoryResult;

// ==========================================
// ProductLookup Trait
// ==========================================
// 用途: 产品名称 → 产品 ID
// 实现者: 事务句柄（在批次事务内查询）
pub trait ProductLookup {
    /// 按名称精确匹配产品
    ///
    /// # 返回
    /// - Ok(Some(id)): 找到
    /// - Ok(None): 不存在
    /// - Err: 数据库错误
    fn find_product_id_by_name(&mut self, name: &str) -> RepositoryResult<Option<i64>>;
}

// ==========================================
// SaleTransaction Trait
// ==========================================
// 用途: 单个事务内可执行的写入/查询
// 生命周期: 仅在 in_transaction 闭包内有效
pub trait SaleTransaction: ProductLookup {
    /// 按外部 ID upsert：不存在则插入，存在则覆盖 客户/产品/日期/金额
    fn upsert_sale(&mut self, sale_id: &str, sale: &ResolvedSale) -> RepositoryResult<()>;

    /// 是否已存在相同自然键 (customer, product, date, amount) 的记录
    fn exists_by_natural_key(&mut self, key: &NaturalKey) -> RepositoryResult<bool>;

    /// 插入新记录，由存储分配 sale_id
    ///
    /// # 返回
    /// - Ok(String): 分配的 sale_id
    fn insert_sale(&mut self, sale: &ResolvedSale) -> RepositoryResult<String>;
}

// ==========================================
// SaleImportRepository Trait
// ==========================================
// 用途: 导入管道消费的存储句柄
// 实现者: SaleImportRepositoryImpl（rusqlite）；测试中可注入 Mock
pub trait SaleImportRepository: Send + Sync {
    /// 在一个事务中执行闭包
    ///
    /// # 行为
    /// - 闭包返回 Ok → COMMIT
    /// - 闭包返回 Err → ROLLBACK，原样返回该错误
    /// - 无法获取连接 → Err（is_connection_failure() 为 true），闭包不会执行
    fn in_transaction<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn SaleTransaction) -> RepositoryResult<T>;

    /// 统计 sales 表记录数
    fn count_sales(&self) -> RepositoryResult<usize>;

    /// 按 sale_id 查询
    fn get_sale(&self, sale_id: &str) -> RepositoryResult<Option<SaleRecord>>;
}

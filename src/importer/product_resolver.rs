// ==========================================
// 销售生产力看板 - 产品引用解析器
// ==========================================
// 阶段 2（批次事务内）: ProductRef → product_id
// - Id(n) 直接通过
// - Name(s) 精确匹配 products.product_name，成功结果在单次导入内缓存
// - 未找到 / 查询出错 只让当前行失败，不回滚批次
// ==========================================

use crate::domain::sale::ProductRef;
use crate::repository::sale_import_repo::ProductLookup;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// 解析失败原因（行级，不中断批次）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// 名称在产品表中不存在
    Unresolved(String),
    /// 查询本身失败（附底层错误文本）
    LookupFailed(String),
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveFailure::Unresolved(name) => write!(f, "Producto no encontrado: {}", name),
            ResolveFailure::LookupFailed(msg) => write!(f, "Error buscando producto: {}", msg),
        }
    }
}

#[derive(Debug, Default)]
pub struct ProductResolver {
    cache: HashMap<String, i64>,
}

impl ProductResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<L>(&mut self, lookup: &mut L, product: &ProductRef) -> Result<i64, ResolveFailure>
    where
        L: ProductLookup + ?Sized,
    {
        let name = match product {
            ProductRef::Id(id) => return Ok(*id),
            ProductRef::Name(name) => name,
        };

        if let Some(id) = self.cache.get(name) {
            return Ok(*id);
        }

        match lookup.find_product_id_by_name(name) {
            Ok(Some(id)) => {
                debug!(product = %name, product_id = id, "产品名称已解析");
                self.cache.insert(name.clone(), id);
                Ok(id)
            }
            Ok(None) => Err(ResolveFailure::Unresolved(name.clone())),
            Err(e) => Err(ResolveFailure::LookupFailed(e.to_string())),
        }
    }

    /// 丢弃缓存（批次回滚后调用：回滚前查到的结果不再可信）
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

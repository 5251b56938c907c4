// ==========================================
// 销售生产力看板 - 分批落库
// ==========================================
// 阶段 3: 校验结果 → 数据库
// - 按位置切分批次（batch_size 行一批），批次严格顺序执行
// - 每批一个事务：
//     校验失败行   → Failed（不访问存储）
//     有 IdVenta   → upsert → Imported
//     无 IdVenta   → 自然键已存在 → Skipped；否则 insert → Imported
// - 批内任一存储错误 → 整批回滚，记一条 batchStart 错误，继续下一批
// - 无法获取连接 → 终止整个导入
// ==========================================

use crate::domain::sale::{CandidateSale, FieldError, ImportSummary, ResolvedSale, RowOutcome};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::product_resolver::ProductResolver;
use crate::importer::summary::SummaryAccumulator;
use crate::repository::error::RepositoryResult;
use crate::repository::sale_import_repo::{SaleImportRepository, SaleTransaction};
use tracing::{debug, error, info, warn};

/// 校验阶段的结果（按文件顺序）
#[derive(Debug, Clone)]
pub struct ValidatedRow {
    pub line: usize,
    pub result: Result<CandidateSale, Vec<FieldError>>,
}

impl ValidatedRow {
    fn validation_failure(&self) -> Option<RowOutcome> {
        match &self.result {
            Err(errors) => Some(RowOutcome::failed(self.line, FieldError::join(errors))),
            Ok(_) => None,
        }
    }
}

pub struct BatchCommitter<'a, R: SaleImportRepository> {
    repo: &'a R,
    batch_size: usize,
}

impl<'a, R: SaleImportRepository> BatchCommitter<'a, R> {
    pub fn new(repo: &'a R, batch_size: usize) -> Self {
        Self {
            repo,
            batch_size: batch_size.max(1),
        }
    }

    /// 逐批落库并汇总
    ///
    /// # 返回
    /// - Ok(ImportSummary): 所有批次已尝试
    /// - Err(DatabaseConnectionError): 连接不可用，导入中止
    pub fn commit_all(&self, rows: Vec<ValidatedRow>) -> ImportResult<ImportSummary> {
        let mut accumulator = SummaryAccumulator::new();
        let mut resolver = ProductResolver::new();
        let mut rows = rows.into_iter();
        let mut batch_no = 0usize;

        loop {
            let batch: Vec<ValidatedRow> = rows.by_ref().take(self.batch_size).collect();
            let Some(first) = batch.first() else {
                break;
            };
            let batch_start = first.line;
            batch_no += 1;

            debug!(batch_no, batch_start, rows = batch.len(), "开始处理批次");

            let result = self
                .repo
                .in_transaction(|tx| apply_batch(tx, &mut resolver, &batch));

            match result {
                Ok(outcomes) => {
                    info!(batch_no, batch_start, rows = outcomes.len(), "批次已提交");
                    accumulator.record_batch_committed(outcomes);
                }
                Err(e) if e.is_connection_failure() => {
                    error!(batch_no, batch_start, error = %e, "无法获取数据库连接，导入中止");
                    return Err(ImportError::from(e));
                }
                Err(e) => {
                    warn!(batch_no, batch_start, error = %e, "批次回滚");
                    resolver.clear();
                    let validation_failures = batch
                        .iter()
                        .filter_map(ValidatedRow::validation_failure)
                        .collect();
                    accumulator.record_batch_failed(batch_start, e.to_string(), validation_failures);
                }
            }
        }

        Ok(accumulator.finish())
    }
}

/// 在已开启的事务中按顺序处理一批
fn apply_batch(
    tx: &mut dyn SaleTransaction,
    resolver: &mut ProductResolver,
    batch: &[ValidatedRow],
) -> RepositoryResult<Vec<RowOutcome>> {
    let mut staged = Vec::with_capacity(batch.len());

    for row in batch {
        let outcome = match &row.result {
            Err(errors) => RowOutcome::failed(row.line, FieldError::join(errors)),
            Ok(candidate) => match resolver.resolve(&mut *tx, &candidate.product) {
                Ok(product_id) => apply_sale(tx, candidate.clone().resolve(product_id))?,
                Err(failure) => {
                    warn!(line = row.line, reason = %failure, "产品引用解析失败");
                    RowOutcome::failed(row.line, failure.to_string())
                }
            },
        };
        staged.push(outcome);
    }

    Ok(staged)
}

fn apply_sale(tx: &mut dyn SaleTransaction, sale: ResolvedSale) -> RepositoryResult<RowOutcome> {
    match sale.external_id.as_deref() {
        Some(sale_id) => {
            tx.upsert_sale(sale_id, &sale)?;
            Ok(RowOutcome::imported(sale.line))
        }
        None => {
            if tx.exists_by_natural_key(&sale.natural_key())? {
                return Ok(RowOutcome::skipped(sale.line));
            }
            tx.insert_sale(&sale)?;
            Ok(RowOutcome::imported(sale.line))
        }
    }
}

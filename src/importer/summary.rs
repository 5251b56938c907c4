// ==========================================
// 销售生产力看板 - 导入汇总累加器
// ==========================================
// 按批次折叠行结果:
// - 批次提交 → 逐行计入 imported / skipped / errors
// - 批次回滚 → 记一条 { batchStart, reason }，外加该批次的校验失败行
// 汇总只在最后一批之后返回一次
// ==========================================

use crate::domain::sale::{ErrorPosition, ImportErrorEntry, ImportSummary, RowOutcome, RowStatus};

#[derive(Debug, Default)]
pub struct SummaryAccumulator {
    imported: usize,
    skipped: usize,
    errors: Vec<ImportErrorEntry>,
}

impl SummaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_row(&mut self, outcome: RowOutcome) {
        match outcome.status {
            RowStatus::Imported => self.imported += 1,
            RowStatus::Skipped => self.skipped += 1,
            RowStatus::Failed => self.errors.push(ImportErrorEntry {
                position: ErrorPosition::Line(outcome.line),
                reason: outcome.reason.unwrap_or_default(),
            }),
        }
    }

    /// 批次已提交：暂存结果全部生效
    pub fn record_batch_committed(&mut self, outcomes: Vec<RowOutcome>) {
        for outcome in outcomes {
            self.record_row(outcome);
        }
    }

    /// 批次已回滚：只保留一条批次级错误和落库前就已确定的校验失败
    pub fn record_batch_failed(
        &mut self,
        batch_start: usize,
        reason: impl Into<String>,
        validation_failures: Vec<RowOutcome>,
    ) {
        self.errors.push(ImportErrorEntry {
            position: ErrorPosition::BatchStart(batch_start),
            reason: reason.into(),
        });
        for outcome in validation_failures {
            self.record_row(outcome);
        }
    }

    pub fn finish(mut self) -> ImportSummary {
        // 按输入位置排序；同一位置批次条目在前
        self.errors.sort_by_key(|e| {
            (
                e.position.line(),
                matches!(e.position, ErrorPosition::Line(_)),
            )
        });

        ImportSummary {
            imported: self.imported,
            skipped: self.skipped,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committed_batch_counts_each_row() {
        let mut acc = SummaryAccumulator::new();
        acc.record_batch_committed(vec![
            RowOutcome::imported(1),
            RowOutcome::failed(2, "IdCliente requerido"),
            RowOutcome::skipped(3),
        ]);

        let summary = acc.finish();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].position, ErrorPosition::Line(2));
    }

    #[test]
    fn test_failed_batch_keeps_validation_failures() {
        let mut acc = SummaryAccumulator::new();
        acc.record_batch_committed(vec![RowOutcome::imported(1), RowOutcome::imported(2)]);
        acc.record_batch_failed(
            3,
            "disk I/O error",
            vec![RowOutcome::failed(4, "Monto requerido")],
        );

        let summary = acc.finish();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(
            summary.errors,
            vec![
                ImportErrorEntry {
                    position: ErrorPosition::BatchStart(3),
                    reason: "disk I/O error".to_string(),
                },
                ImportErrorEntry {
                    position: ErrorPosition::Line(4),
                    reason: "Monto requerido".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_batch_entry_precedes_its_first_line() {
        let mut acc = SummaryAccumulator::new();
        acc.record_batch_failed(
            1,
            "forced failure",
            vec![RowOutcome::failed(1, "IdCliente requerido")],
        );

        let summary = acc.finish();
        assert_eq!(summary.errors[0].position, ErrorPosition::BatchStart(1));
        assert_eq!(summary.errors[1].position, ErrorPosition::Line(1));
    }
}

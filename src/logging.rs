// ==========================================
// 销售生产力看板 - 日志初始化
// ==========================================
// 输出: stderr（stdout 只留给导入汇总 JSON）
// 过滤: SALES_LOG 优先，其次 RUST_LOG，都没有时只放行本 crate 的 info
// ==========================================

use std::io::IsTerminal;
use tracing_subscriber::{fmt, EnvFilter};

/// 本 crate 专用的过滤器环境变量
pub const LOG_ENV_VAR: &str = "SALES_LOG";

/// 未配置时的默认过滤指令
const DEFAULT_DIRECTIVES: &str = "sales_productivity=info,import_ventas=info,warn";

/// 测试默认过滤指令
const TEST_DIRECTIVES: &str = "sales_productivity=debug";

/// 选出生效的过滤指令，空字符串视为未设置
fn pick_directives(sales_log: Option<String>, rust_log: Option<String>) -> String {
    [sales_log, rust_log]
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string())
}

fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// 初始化 CLI 日志
///
/// 例如 `SALES_LOG=sales_productivity::importer=trace import_ventas ventas.csv`
pub fn init() {
    let directives = pick_directives(
        std::env::var(LOG_ENV_VAR).ok(),
        std::env::var("RUST_LOG").ok(),
    );

    let stderr = std::io::stderr();
    let ansi = stderr.is_terminal();

    // 已有全局 subscriber 时保持原样
    let _ = fmt()
        .with_env_filter(build_filter(&directives))
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(true)
        .try_init();
}

/// 测试用日志，输出交给 libtest 捕获，重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(build_filter(TEST_DIRECTIVES))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_log_wins_over_rust_log() {
        let picked = pick_directives(Some("debug".into()), Some("trace".into()));
        assert_eq!(picked, "debug");
    }

    #[test]
    fn test_blank_values_fall_through() {
        assert_eq!(pick_directives(Some("  ".into()), Some("warn".into())), "warn");
        assert_eq!(pick_directives(None, Some("".into())), DEFAULT_DIRECTIVES);
        assert_eq!(pick_directives(None, None), DEFAULT_DIRECTIVES);
    }
}

//! 日志工具模块
//!
//! 启动信息和最终统计的输出格式

use crate::config::Config;
use crate::orchestrator::RepackSummary;
use tracing::{info, warn};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 重新装车模式");
    info!(
        "📦 托盘尺寸: {}x{}",
        config.pallet_width, config.pallet_length
    );
    info!(
        "📊 批次大小: {} | 缓冲区容量: {}",
        config.max_batch, config.buffer_capacity
    );
    info!("{}", "=".repeat(60));
}

/// 记录清单加载信息
///
/// # 参数
/// - `trucks`: 卡车数量（含末车）
/// - `boxes`: 箱子总数
pub fn log_manifest_loaded(trucks: usize, boxes: usize) {
    info!("✓ 清单中有 {} 辆卡车, {} 个箱子", trucks, boxes);
}

/// 打印最终统计信息
///
/// 卡车或箱子不守恒时，以警告形式报告有多少箱子没有被放置
pub fn print_final_stats(summary: &RepackSummary, config: &Config) {
    let counters = &summary.counters;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🚚 卡车: {}", counters.trucks);
    info!("🧱 托盘: {}", counters.pallets);
    info!("📦 箱子: {}", counters.boxes);

    if counters.pallets.received > 0 {
        let saved = counters.pallets.missing();
        info!(
            "💡 托盘节省: {} ({:.1}%)",
            saved,
            saved as f64 * 100.0 / counters.pallets.received as f64
        );
    }

    if summary.is_conserved() {
        info!("✅ 所有箱子都已重新装车");
    } else {
        warn!(
            "❌ {} 个箱子从未被放置 (缓冲区残留 {})",
            counters.boxes.missing(),
            summary.unplaced
        );
    }
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", config.output_path);
}

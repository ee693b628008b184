//! 重新装车流水线
//!
//! 把拆车阶段和装车阶段接到同一个缓冲区上，各自作为独立任务运行

use crate::config::Config;
use crate::error::{AppResult, PipelineError};
use crate::infrastructure::{BoxBuffer, Counters, CountersSnapshot};
use crate::models::cargo::Truck;
use crate::orchestrator::{Disassembler, Reassembler};
use crate::services::ShelfPacker;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// 流水线结束后的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepackSummary {
    pub counters: CountersSnapshot,
    /// 结束时仍留在缓冲区里的箱子（含无法放置的）
    pub unplaced: usize,
}

impl RepackSummary {
    pub fn is_conserved(&self) -> bool {
        self.counters.is_conserved()
    }
}

/// 重新装车器
pub struct Repacker;

impl Repacker {
    /// 启动流水线
    ///
    /// # 参数
    /// - `config`: 配置（托盘尺寸、批次大小、各通道容量）
    /// - `input`: 输入卡车，最后一辆应为末车
    /// - `output`: 装好的卡车按输入顺序发到这里，末车发出后关闭
    ///
    /// # 返回
    /// 流水线句柄；调用方必须持续消费 `output`，否则流水线会因背压停住
    pub fn spawn(
        config: &Config,
        input: mpsc::Receiver<Truck>,
        output: mpsc::Sender<Truck>,
    ) -> AppResult<RepackerHandle> {
        config.validate()?;

        let buffer = Arc::new(BoxBuffer::new(config.buffer_capacity));
        let counters = Arc::new(Counters::new());
        let (shell_tx, shell_rx) = mpsc::channel(config.shell_channel_capacity);

        let disassembler = Disassembler::new(buffer.clone(), counters.clone(), config.footprint());
        let reassembler = Reassembler::new(
            buffer.clone(),
            counters.clone(),
            ShelfPacker::new(config.footprint()),
            config.max_batch,
        );

        info!(
            "启动流水线: 托盘 {}x{}, 批次 {}, 缓冲区 {}",
            config.pallet_width, config.pallet_length, config.max_batch, config.buffer_capacity
        );

        Ok(RepackerHandle {
            disassembly: tokio::spawn(disassembler.run(input, shell_tx)),
            reassembly: tokio::spawn(reassembler.run(shell_rx, output)),
            buffer,
            counters,
        })
    }
}

/// 运行中的流水线
pub struct RepackerHandle {
    disassembly: JoinHandle<Result<(), PipelineError>>,
    reassembly: JoinHandle<Result<(), PipelineError>>,
    buffer: Arc<BoxBuffer>,
    counters: Arc<Counters>,
}

impl RepackerHandle {
    /// 实时计数
    pub fn counters(&self) -> Arc<Counters> {
        self.counters.clone()
    }

    /// 等待两个阶段都结束，返回汇总
    pub async fn join(self) -> AppResult<RepackSummary> {
        let disassembled = self
            .disassembly
            .await
            .map_err(|source| PipelineError::StageFailed {
                stage: "拆车",
                source,
            })?;
        let reassembled = self
            .reassembly
            .await
            .map_err(|source| PipelineError::StageFailed {
                stage: "装车",
                source,
            })?;
        disassembled?;
        reassembled?;

        Ok(RepackSummary {
            counters: self.counters.snapshot(),
            unplaced: self.buffer.resident().await,
        })
    }
}

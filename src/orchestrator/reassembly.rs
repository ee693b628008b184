//! 装车阶段 - 编排层
//!
//! 按空壳到达顺序逐辆装车，托盘由货架装箱器从缓冲区的箱子里拼出来

use crate::error::PipelineError;
use crate::infrastructure::{BoxBuffer, Counters};
use crate::models::cargo::{Truck, TruckKind};
use crate::services::ShelfPacker;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const STAGE: &str = "装车";

/// 装车器
///
/// 职责：
/// - 普通卡车：反复取一批箱子装一个托盘，直到达到目标托盘数或缓冲区断供
/// - 末车：吸收缓冲区里剩下的所有箱子，托盘数不受目标限制
/// - 按空壳顺序发车，增加 `out` 计数
/// - 发出末车后关闭输出通道
pub struct Reassembler {
    buffer: Arc<BoxBuffer>,
    counters: Arc<Counters>,
    packer: ShelfPacker,
    max_batch: usize,
}

impl Reassembler {
    pub fn new(
        buffer: Arc<BoxBuffer>,
        counters: Arc<Counters>,
        packer: ShelfPacker,
        max_batch: usize,
    ) -> Self {
        Self {
            buffer,
            counters,
            packer,
            max_batch,
        }
    }

    /// 运行装车循环，直到空壳通道关闭或末车发出
    ///
    /// 返回时 `output` 被丢弃，下游据此知道不会再有卡车
    pub async fn run(
        self,
        mut shells: mpsc::Receiver<Truck>,
        output: mpsc::Sender<Truck>,
    ) -> Result<(), PipelineError> {
        while let Some(shell) = shells.recv().await {
            self.buffer.shell_received().await;
            let truck = match shell.kind {
                TruckKind::Normal(target) => self.fill(shell, target).await,
                TruckKind::Terminal => self.drain(shell).await,
            };
            let terminal = truck.kind.is_terminal();

            self.counters.trucks.record_out(1);
            self.counters.pallets.record_out(truck.pallets.len() as u64);
            self.counters.boxes.record_out(truck.box_count() as u64);
            info!("✓ 发车 {}", truck);

            output
                .send(truck)
                .await
                .map_err(|_| PipelineError::DownstreamClosed { stage: STAGE })?;

            if terminal {
                break;
            }
        }
        info!("🚚 装车阶段结束，输出通道关闭");
        Ok(())
    }

    /// 装普通卡车
    ///
    /// 缓冲区断供时直接发出不满的卡车，不重试
    async fn fill(&self, mut truck: Truck, target: usize) -> Truck {
        while truck.pallets.len() < target {
            let batch = self.buffer.take(self.max_batch).await;
            if batch.is_empty() {
                break;
            }

            let outcome = self.packer.pack(batch);
            self.buffer.return_unused(outcome.leftover).await;
            if outcome.pallet.is_empty() {
                break;
            }
            truck.pallets.push(outcome.pallet);
        }

        if truck.pallets.len() < target {
            warn!(
                "卡车 #{} 缓冲区断供，只装了 {}/{} 个托盘",
                truck.id,
                truck.pallets.len(),
                target
            );
        }
        truck
    }

    /// 装末车
    ///
    /// 末车的箱子还在进缓冲区时，先按整批装托盘腾出空间；
    /// 缓冲区关闭后一次取空，装到一个不剩为止
    async fn drain(&self, mut truck: Truck) -> Truck {
        while let Some(batch) = self.buffer.take_full(self.max_batch).await {
            let outcome = self.packer.pack(batch);
            self.buffer.return_unused(outcome.leftover).await;
            if outcome.pallet.is_empty() {
                break;
            }
            truck.pallets.push(outcome.pallet);
        }

        let mut remaining = self.buffer.take_all().await;
        debug!("末车 #{} 吸收剩余 {} 个箱子", truck.id, remaining.len());

        while !remaining.is_empty() {
            let outcome = self.packer.pack(remaining);
            if outcome.pallet.is_empty() {
                warn!("末车有 {} 个箱子无法放置，退回缓冲区", outcome.leftover.len());
                self.buffer.return_unused(outcome.leftover).await;
                break;
            }
            truck.pallets.push(outcome.pallet);
            remaining = outcome.leftover;
        }
        truck
    }
}

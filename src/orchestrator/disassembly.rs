//! 拆车阶段 - 编排层
//!
//! 按到达顺序逐辆拆车：先把空壳交给装车阶段，再把箱子搬进缓冲区

use crate::error::PipelineError;
use crate::infrastructure::{BoxBuffer, Counters};
use crate::models::cargo::{CargoBox, Footprint, Truck};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

const STAGE: &str = "拆车";

/// 拆车器
///
/// 职责：
/// - 拉取输入卡车，严格按到达顺序处理
/// - 立即转发同 ID、同目标托盘数的空壳，让装车阶段尽早开始
/// - 把箱子搬进缓冲区并增加 `in` 计数
/// - 输入结束（或遇到末车）后关闭缓冲区和空壳通道
pub struct Disassembler {
    buffer: Arc<BoxBuffer>,
    counters: Arc<Counters>,
    footprint: Footprint,
}

impl Disassembler {
    pub fn new(buffer: Arc<BoxBuffer>, counters: Arc<Counters>, footprint: Footprint) -> Self {
        Self {
            buffer,
            counters,
            footprint,
        }
    }

    /// 运行拆车循环，直到输入耗尽
    ///
    /// 无论成功与否都会关闭缓冲区，保证装车阶段不会永远等下去
    pub async fn run(
        self,
        input: mpsc::Receiver<Truck>,
        shells: mpsc::Sender<Truck>,
    ) -> Result<(), PipelineError> {
        let result = self.process_all(input, &shells).await;
        self.buffer.close().await;
        info!("🚚 拆车阶段结束，缓冲区已关闭");
        result
    }

    async fn process_all(
        &self,
        mut input: mpsc::Receiver<Truck>,
        shells: &mpsc::Sender<Truck>,
    ) -> Result<(), PipelineError> {
        let mut sent = 0u64;
        while let Some(truck) = input.recv().await {
            let terminal = truck.kind.is_terminal();
            debug!("收到卡车 {}", truck);

            self.counters.trucks.record_in(1);
            self.counters.pallets.record_in(truck.pallets.len() as u64);

            self.forward_shell(shells, truck.shell(), sent).await?;
            sent += 1;
            self.unpack(truck).await;

            if terminal {
                break;
            }
        }
        Ok(())
    }

    /// 转发空壳；通道满时标记缓冲区为"生产者等待中"
    ///
    /// `sent` 是此前已经送出的空壳数
    async fn forward_shell(
        &self,
        shells: &mpsc::Sender<Truck>,
        shell: Truck,
        sent: u64,
    ) -> Result<(), PipelineError> {
        match shells.try_send(shell) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(shell)) => {
                debug!("空壳通道已满，等待装车阶段 (卡车 #{})", shell.id);
                // 通道里排着 max_capacity 个空壳，装车阶段再收一个才有位置
                let until = (sent + 1).saturating_sub(shells.max_capacity() as u64);
                self.buffer
                    .stall_until(until, || shells.capacity() == 0)
                    .await;
                let result = shells.send(shell).await;
                self.buffer.clear_stall().await;
                result.map_err(|_| PipelineError::DownstreamClosed { stage: STAGE })
            }
            Err(TrySendError::Closed(_)) => Err(PipelineError::DownstreamClosed { stage: STAGE }),
        }
    }

    /// 把卡车上的箱子全部搬进缓冲区
    async fn unpack(&self, truck: Truck) {
        let id = truck.id;
        let mut count = 0usize;
        for pallet in truck.pallets {
            for b in pallet.boxes {
                let b = CargoBox { x: 0, y: 0, ..b };
                self.counters.boxes.record_in(1);
                if b.fits(self.footprint) {
                    self.buffer.put(b).await;
                } else {
                    self.buffer.reject(b).await;
                }
                count += 1;
            }
        }
        debug!("卡车 #{} 拆出 {} 个箱子", id, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cargo::{Pallet, TruckKind, ID_LAST_TRUCK};

    fn truck(id: u32, pallets: &[&[(u8, u8, u32)]]) -> Truck {
        let pallets = pallets
            .iter()
            .map(|boxes| Pallet {
                boxes: boxes.iter().map(|&(w, l, id)| CargoBox::new(w, l, id)).collect(),
            })
            .collect();
        Truck::ingest(id, pallets)
    }

    #[tokio::test]
    async fn test_forwards_shells_and_fills_buffer() {
        let buffer = Arc::new(BoxBuffer::new(16));
        let counters = Arc::new(Counters::new());
        let (in_tx, in_rx) = mpsc::channel(4);
        let (shell_tx, mut shell_rx) = mpsc::channel(4);

        in_tx.send(truck(1, &[&[(1, 1, 1), (2, 1, 2)], &[(1, 3, 3)]])).await.unwrap();
        in_tx.send(truck(ID_LAST_TRUCK, &[&[(9, 9, 4)]])).await.unwrap();
        drop(in_tx);

        Disassembler::new(buffer.clone(), counters.clone(), Footprint::default())
            .run(in_rx, shell_tx)
            .await
            .unwrap();

        let first = shell_rx.recv().await.unwrap();
        assert_eq!((first.id, first.kind), (1, TruckKind::Normal(2)));
        assert!(first.pallets.is_empty());
        assert!(shell_rx.recv().await.unwrap().kind.is_terminal());
        assert!(shell_rx.recv().await.is_none());

        assert!(buffer.is_closed().await);
        assert_eq!(buffer.len().await, 3);
        assert_eq!(buffer.rejected_len().await, 1);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.trucks.received, 2);
        assert_eq!(snapshot.pallets.received, 3);
        assert_eq!(snapshot.boxes.received, 4);
    }

    #[tokio::test]
    async fn test_stops_reading_after_terminal_truck() {
        let buffer = Arc::new(BoxBuffer::new(16));
        let counters = Arc::new(Counters::new());
        let (in_tx, in_rx) = mpsc::channel(4);
        let (shell_tx, mut shell_rx) = mpsc::channel(4);

        in_tx.send(truck(ID_LAST_TRUCK, &[])).await.unwrap();
        in_tx.send(truck(5, &[&[(1, 1, 1)]])).await.unwrap();

        Disassembler::new(buffer.clone(), counters.clone(), Footprint::default())
            .run(in_rx, shell_tx)
            .await
            .unwrap();

        assert!(shell_rx.recv().await.unwrap().kind.is_terminal());
        assert!(shell_rx.recv().await.is_none());
        assert_eq!(counters.snapshot().trucks.received, 1);
    }

    #[tokio::test]
    async fn test_full_shell_channel_marks_buffer_stalled() {
        let buffer = Arc::new(BoxBuffer::new(16));
        let (in_tx, in_rx) = mpsc::channel(4);
        let (shell_tx, mut shell_rx) = mpsc::channel(1);

        in_tx.send(truck(1, &[&[(1, 1, 1)]])).await.unwrap();
        in_tx.send(truck(2, &[&[(1, 1, 2)]])).await.unwrap();
        drop(in_tx);

        let stage = tokio::spawn(
            Disassembler::new(buffer.clone(), Arc::new(Counters::new()), Footprint::default())
                .run(in_rx, shell_tx),
        );

        // 第二个空壳送不出去，缓冲区里只有第一辆车的箱子也能取走
        let got = buffer.take(5).await;
        assert_eq!(got.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1]);

        assert_eq!(shell_rx.recv().await.unwrap().id, 1);
        buffer.shell_received().await;
        assert_eq!(shell_rx.recv().await.unwrap().id, 2);
        buffer.shell_received().await;

        stage.await.unwrap().unwrap();
        assert_eq!(buffer.take_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_downstream_still_closes_buffer() {
        let buffer = Arc::new(BoxBuffer::new(16));
        let (in_tx, in_rx) = mpsc::channel(4);
        let (shell_tx, shell_rx) = mpsc::channel(1);
        drop(shell_rx);

        in_tx.send(truck(1, &[&[(1, 1, 1)]])).await.unwrap();
        drop(in_tx);

        let result = Disassembler::new(buffer.clone(), Arc::new(Counters::new()), Footprint::default())
            .run(in_rx, shell_tx)
            .await;

        assert!(matches!(result, Err(PipelineError::DownstreamClosed { .. })));
        assert!(buffer.is_closed().await);
    }
}

//! 箱子缓冲区 - 基础设施层
//!
//! 持有所有已拆下、尚未重新装上托盘的箱子，只暴露取/还/清空的能力

use crate::models::cargo::CargoBox;
use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct BufferState {
    boxes: VecDeque<CargoBox>,
    /// 永远放不上托盘的箱子，常驻但不会被取出
    rejected: Vec<CargoBox>,
    closed: bool,
    /// 生产者卡在空壳通道上，直到装车阶段累计收到这么多个空壳
    stall_until: Option<u64>,
    shells_received: u64,
}

impl BufferState {
    fn is_stalled(&self) -> bool {
        self.stall_until
            .map_or(false, |until| self.shells_received < until)
    }
}

/// 箱子缓冲区
///
/// 职责：
/// - 拆车阶段与装车阶段之间唯一的共享可变资源
/// - `put` 在缓冲区满时阻塞，形成背压
/// - `take` 在箱子不够且还会有新箱子时阻塞
/// - `return_unused` 无条件放回，永不阻塞
/// - 不认识卡车，也不关心装箱算法
#[derive(Debug)]
pub struct BoxBuffer {
    capacity: usize,
    state: Mutex<BufferState>,
    changed: Notify,
}

impl BoxBuffer {
    /// 创建指定容量的缓冲区
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(BufferState::default()),
            changed: Notify::new(),
        }
    }

    /// 等待直到 `ready` 返回 `Some`
    ///
    /// 先注册通知再检查状态，避免检查和等待之间漏掉唤醒
    async fn wait_until<T>(&self, mut ready: impl FnMut(&mut BufferState) -> Option<T>) -> T {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if let Some(value) = ready(&mut state) {
                    drop(state);
                    self.changed.notify_waiters();
                    return value;
                }
            }

            notified.await;
        }
    }

    /// 修改状态并唤醒所有等待者
    async fn update<T>(&self, f: impl FnOnce(&mut BufferState) -> T) -> T {
        let value = {
            let mut state = self.state.lock().await;
            f(&mut state)
        };
        self.changed.notify_waiters();
        value
    }

    /// 放入一个箱子，缓冲区满时等待
    pub async fn put(&self, b: CargoBox) {
        let capacity = self.capacity;
        let mut pending = Some(b);
        self.wait_until(|state| {
            if state.boxes.len() < capacity {
                state.boxes.extend(pending.take());
                Some(())
            } else {
                None
            }
        })
        .await;
    }

    /// 放回没用上的箱子，不受容量限制
    ///
    /// 放回的箱子排在最前面，下一次 `take` 优先拿到
    pub async fn return_unused(&self, boxes: Vec<CargoBox>) {
        if boxes.is_empty() {
            return;
        }
        self.update(|state| {
            for b in boxes.into_iter().rev() {
                state.boxes.push_front(b);
            }
        })
        .await;
    }

    /// 登记一个永远放不上托盘的箱子
    pub async fn reject(&self, b: CargoBox) {
        warn!("箱子 {} 超出托盘尺寸，永远无法放置", b);
        self.update(|state| state.rejected.push(b)).await;
    }

    /// 最多取出 `max` 个箱子
    ///
    /// 箱子不足 `max` 时等待，直到凑够、缓冲区关闭或者生产者卡在交接通道上，
    /// 然后有多少取多少
    pub async fn take(&self, max: usize) -> Vec<CargoBox> {
        if max == 0 {
            return Vec::new();
        }
        self.wait_until(|state| {
            if state.boxes.len() >= max || state.closed || state.is_stalled() {
                let n = state.boxes.len().min(max);
                Some(state.boxes.drain(..n).collect())
            } else {
                None
            }
        })
        .await
    }

    /// 取出恰好 `max` 个箱子；缓冲区关闭且凑不够时返回 `None`
    pub async fn take_full(&self, max: usize) -> Option<Vec<CargoBox>> {
        self.wait_until(|state| {
            if state.boxes.len() >= max {
                Some(Some(state.boxes.drain(..max).collect()))
            } else if state.closed {
                Some(None)
            } else {
                None
            }
        })
        .await
    }

    /// 等缓冲区关闭后取出全部箱子
    ///
    /// 关闭之后不再有生产者，所以只需要调用一次
    pub async fn take_all(&self) -> Vec<CargoBox> {
        let boxes: Vec<CargoBox> = self
            .wait_until(|state| {
                if state.closed {
                    Some(state.boxes.drain(..).collect())
                } else {
                    None
                }
            })
            .await;
        debug!("清空缓冲区: {} 个箱子", boxes.len());
        boxes
    }

    /// 标记生产者卡在空壳通道上，直到装车阶段累计收到 `until` 个空壳
    ///
    /// `blocked` 在持锁时再确认一次通道仍然是满的，已经腾出位置就不标记
    pub async fn stall_until(&self, until: u64, blocked: impl FnOnce() -> bool) {
        self.update(|state| {
            if blocked() {
                debug!("生产者等待空壳通道，直到收到第 {} 个空壳", until);
                state.stall_until = Some(until);
            }
        })
        .await;
    }

    /// 装车阶段收到一个空壳
    pub async fn shell_received(&self) {
        self.update(|state| state.shells_received += 1).await;
    }

    /// 生产者的空壳已经送出
    pub async fn clear_stall(&self) {
        self.update(|state| state.stall_until = None).await;
    }

    /// 关闭缓冲区：不会再有新箱子
    pub async fn close(&self) {
        self.update(|state| state.closed = true).await;
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    /// 可取出的箱子数量
    pub async fn len(&self) -> usize {
        self.state.lock().await.boxes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 被拒收的箱子数量
    pub async fn rejected_len(&self) -> usize {
        self.state.lock().await.rejected.len()
    }

    /// 常驻箱子总数（含被拒收的）
    pub async fn resident(&self) -> usize {
        let state = self.state.lock().await;
        state.boxes.len() + state.rejected.len()
    }
}

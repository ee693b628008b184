//! 进出计数器
//!
//! 拆车阶段只增加 `in`，装车阶段只增加 `out`，两边可以并发更新

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// 一类实体的进出计数
#[derive(Debug, Default)]
pub struct Tally {
    received: AtomicU64,
    emitted: AtomicU64,
}

impl Tally {
    /// 必须在实体交给下游之前调用
    pub fn record_in(&self, n: u64) {
        self.received.fetch_add(n, Ordering::Release);
    }

    pub fn record_out(&self, n: u64) {
        self.emitted.fetch_add(n, Ordering::Release);
    }

    /// 先读 `out` 再读 `in`，并发运行时快照里 `in >= out` 仍然成立
    pub fn snapshot(&self) -> TallySnapshot {
        let emitted = self.emitted.load(Ordering::Acquire);
        let received = self.received.load(Ordering::Acquire);
        TallySnapshot { received, emitted }
    }
}

/// 计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TallySnapshot {
    pub received: u64,
    pub emitted: u64,
}

impl TallySnapshot {
    /// 进来但还没出去的数量，出去的比进来的多时为负数
    pub fn missing(&self) -> i64 {
        self.received as i64 - self.emitted as i64
    }
}

impl fmt::Display for TallySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "进 {} / 出 {} / 缺 {}",
            self.received,
            self.emitted,
            self.missing()
        )
    }
}

/// 卡车、托盘、箱子三类计数
///
/// 卡车和箱子必须守恒；托盘数量的进出差反映的是重新装箱省下了多少托盘
#[derive(Debug, Default)]
pub struct Counters {
    pub trucks: Tally,
    pub pallets: Tally,
    pub boxes: Tally,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            trucks: self.trucks.snapshot(),
            pallets: self.pallets.snapshot(),
            boxes: self.boxes.snapshot(),
        }
    }
}

/// 全部计数的快照，用于最终报告
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub trucks: TallySnapshot,
    pub pallets: TallySnapshot,
    pub boxes: TallySnapshot,
}

impl CountersSnapshot {
    /// 卡车和箱子是否守恒
    pub fn is_conserved(&self) -> bool {
        self.trucks.missing() == 0 && self.boxes.missing() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_missing() {
        let tally = Tally::default();
        tally.record_in(5);
        tally.record_out(3);
        assert_eq!(tally.snapshot().missing(), 2);
        tally.record_out(4);
        assert_eq!(tally.snapshot().missing(), -2);
    }

    #[test]
    fn test_conservation_ignores_pallets() {
        let counters = Counters::new();
        counters.trucks.record_in(2);
        counters.trucks.record_out(2);
        counters.boxes.record_in(10);
        counters.boxes.record_out(10);
        counters.pallets.record_in(6);
        counters.pallets.record_out(3);

        let snapshot = counters.snapshot();
        assert!(snapshot.is_conserved());
        assert_eq!(snapshot.pallets.missing(), 3);
    }

    #[test]
    fn test_concurrent_updates() {
        let counters = Arc::new(Counters::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counters = counters.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counters.boxes.record_in(1);
                        counters.boxes.record_out(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(
            counters.snapshot().boxes,
            TallySnapshot {
                received: 4000,
                emitted: 4000
            }
        );
    }
}

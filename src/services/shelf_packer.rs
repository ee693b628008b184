//! 货架装箱服务 - 业务能力层
//!
//! 只负责"把一批箱子尽量装到一个托盘上"，不关心箱子从哪来、装好的托盘去哪

use crate::models::cargo::{sideways, upright, CargoBox, Footprint, Pallet};
use tracing::{debug, trace};

/// 单个箱子的尝试结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// 已放置，坐标和方向都已确定
    Placed(CargoBox),
    /// 当前货架放不下，原样退回
    Deferred(CargoBox),
}

/// 货架：托盘上位于 `y` 处的一条横向区域
///
/// 深度由第一个放上去的箱子决定，之后的箱子沿 x 方向依次排开
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shelf {
    x: u8,
    y: u8,
    depth: u8,
    run_remaining: u8,
    max_depth: u8,
}

impl Shelf {
    /// 创建新货架
    ///
    /// # 参数
    /// - `x`: 起始横坐标
    /// - `y`: 货架所在的纵坐标
    /// - `run`: x 方向剩余长度
    /// - `max_depth`: 托盘在 y 方向还剩多少空间
    pub fn new(x: u8, y: u8, run: u8, max_depth: u8) -> Self {
        Self {
            x,
            y,
            depth: 0,
            run_remaining: run,
            max_depth,
        }
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn run_remaining(&self) -> u8 {
        self.run_remaining
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// 尝试把箱子放到货架上
    ///
    /// 空货架：先横放，放不下再竖放，放上去的箱子决定货架深度。
    /// 非空货架：先竖放，再横放，都不行就退回。
    pub fn add(&mut self, b: CargoBox) -> Placement {
        let mut candidate = b;

        if self.is_empty() {
            sideways(&mut candidate);
            if !self.accepts_first(&candidate) {
                upright(&mut candidate);
                if !self.accepts_first(&candidate) {
                    return Placement::Deferred(b);
                }
            }
            self.depth = candidate.l;
            return Placement::Placed(self.include(candidate));
        }

        upright(&mut candidate);
        if self.accepts(&candidate) {
            return Placement::Placed(self.include(candidate));
        }
        sideways(&mut candidate);
        if self.accepts(&candidate) {
            return Placement::Placed(self.include(candidate));
        }
        Placement::Deferred(b)
    }

    fn accepts_first(&self, b: &CargoBox) -> bool {
        b.l <= self.max_depth && b.w <= self.run_remaining
    }

    fn accepts(&self, b: &CargoBox) -> bool {
        b.l <= self.depth && b.w <= self.run_remaining
    }

    /// 把箱子放在当前游标处并推进游标，调用方负责保证放得下
    fn include(&mut self, mut b: CargoBox) -> CargoBox {
        debug_assert!(b.w <= self.run_remaining, "箱子 {} 超出货架剩余宽度", b);
        b.x = self.x;
        b.y = self.y;
        self.x += b.w;
        self.run_remaining -= b.w;
        b
    }
}

/// 单次装箱的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackOutcome {
    /// 装好的托盘
    pub pallet: Pallet,
    /// 没装上的箱子（按排序后的顺序）
    pub leftover: Vec<CargoBox>,
}

/// 货架装箱器
///
/// 职责：
/// - 对一批箱子排序（宽度降序，长度降序）
/// - 逐层开货架，每层扫一遍剩余箱子
/// - 返回装好的托盘和剩余箱子
/// - 纯计算，不持有共享状态
#[derive(Debug, Clone, Copy)]
pub struct ShelfPacker {
    footprint: Footprint,
}

impl ShelfPacker {
    pub fn new(footprint: Footprint) -> Self {
        Self { footprint }
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// 把一批箱子装到一个新托盘上
    ///
    /// # 参数
    /// - `boxes`: 候选箱子
    ///
    /// # 返回
    /// 装好的托盘和没装上的箱子
    pub fn pack(&self, mut boxes: Vec<CargoBox>) -> PackOutcome {
        boxes.sort_by(|a, b| b.w.cmp(&a.w).then(b.l.cmp(&a.l)));

        let mut pallet = Pallet::new();
        let mut pending = boxes;
        let mut y = 0;

        while !pending.is_empty() && y < self.footprint.length {
            let mut shelf = Shelf::new(0, y, self.footprint.width, self.footprint.length - y);
            let mut deferred = Vec::with_capacity(pending.len());

            for b in pending {
                match shelf.add(b) {
                    Placement::Placed(placed) => {
                        trace!("放置箱子 {}", placed);
                        pallet.boxes.push(placed);
                    }
                    Placement::Deferred(rest) => deferred.push(rest),
                }
            }
            pending = deferred;

            // 新货架一个都放不下，剩下的箱子对这个托盘已经没有希望
            if shelf.is_empty() {
                break;
            }
            y += shelf.depth();
        }

        debug_assert!(
            pallet.validate(self.footprint).is_ok(),
            "货架装箱产生了非法托盘: {:?}",
            pallet.validate(self.footprint)
        );
        debug!(
            "托盘装箱完成: 放置 {} 个, 剩余 {} 个, 面积 {}/{}",
            pallet.len(),
            pending.len(),
            pallet.area_used(),
            self.footprint.area()
        );

        PackOutcome {
            pallet,
            leftover: pending,
        }
    }
}

impl Default for ShelfPacker {
    fn default() -> Self {
        Self::new(Footprint::default())
    }
}

//! 货物数据模型
//!
//! 箱子（CargoBox）、托盘（Pallet）、卡车（Truck）的定义，只有数据和少量辅助方法

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 托盘宽度（x 方向）
pub const PALLET_WIDTH: u8 = 4;
/// 托盘长度（y 方向）
pub const PALLET_LENGTH: u8 = 4;
/// 清单中表示"最后一辆车"的保留 ID
pub const ID_LAST_TRUCK: u32 = 0;

/// 托盘的矩形底面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u8,
    pub length: u8,
}

impl Footprint {
    pub fn new(width: u8, length: u8) -> Self {
        Self { width, length }
    }

    pub fn area(&self) -> u32 {
        u32::from(self.width) * u32::from(self.length)
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::new(PALLET_WIDTH, PALLET_LENGTH)
    }
}

/// 不可拆分的箱子
///
/// `w` 是 x 方向的尺寸，`l` 是 y 方向的尺寸。
/// `(x, y)` 只有放到托盘上之后才有意义。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoBox {
    #[serde(default)]
    pub x: u8,
    #[serde(default)]
    pub y: u8,
    pub w: u8,
    pub l: u8,
    pub id: u32,
}

impl CargoBox {
    pub fn new(w: u8, l: u8, id: u32) -> Self {
        Self { x: 0, y: 0, w, l, id }
    }

    pub fn area(&self) -> u32 {
        u32::from(self.w) * u32::from(self.l)
    }

    /// 两个方向中任意一个能放进托盘即可
    pub fn fits(&self, footprint: Footprint) -> bool {
        (self.w <= footprint.width && self.l <= footprint.length)
            || (self.l <= footprint.width && self.w <= footprint.length)
    }

    /// 两个已放置的箱子是否重叠
    pub fn overlaps(&self, other: &CargoBox) -> bool {
        let (ax2, ay2) = (u16::from(self.x) + u16::from(self.w), u16::from(self.y) + u16::from(self.l));
        let (bx2, by2) = (u16::from(other.x) + u16::from(other.w), u16::from(other.y) + u16::from(other.l));
        u16::from(self.x) < bx2 && u16::from(other.x) < ax2 && u16::from(self.y) < by2 && u16::from(other.y) < ay2
    }
}

impl fmt::Display for CargoBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}x{}@({},{})", self.id, self.w, self.l, self.x, self.y)
    }
}

/// 竖放：保证 `l >= w`
pub fn upright(b: &mut CargoBox) {
    if b.w > b.l {
        std::mem::swap(&mut b.w, &mut b.l);
    }
}

/// 横放：保证 `w >= l`
pub fn sideways(b: &mut CargoBox) {
    if b.l > b.w {
        std::mem::swap(&mut b.w, &mut b.l);
    }
}

/// 托盘不变量被破坏
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PalletError {
    #[error("箱子 {0} 超出托盘边界")]
    OutOfBounds(CargoBox),
    #[error("箱子 {0} 与箱子 {1} 重叠")]
    Overlap(CargoBox, CargoBox),
}

/// 托盘，按放置顺序保存箱子
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pallet {
    pub boxes: Vec<CargoBox>,
}

impl Pallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn area_used(&self) -> u32 {
        self.boxes.iter().map(CargoBox::area).sum()
    }

    /// 检查托盘不变量：所有箱子在边界内，且两两不重叠
    pub fn validate(&self, footprint: Footprint) -> Result<(), PalletError> {
        for (i, b) in self.boxes.iter().enumerate() {
            if u16::from(b.x) + u16::from(b.w) > u16::from(footprint.width)
                || u16::from(b.y) + u16::from(b.l) > u16::from(footprint.length)
            {
                return Err(PalletError::OutOfBounds(*b));
            }
            if let Some(other) = self.boxes[i + 1..].iter().find(|o| b.overlaps(o)) {
                return Err(PalletError::Overlap(*b, *other));
            }
        }
        Ok(())
    }
}

/// 卡车类型
///
/// 进入流水线时判定一次，之后不再比较保留 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruckKind {
    /// 普通卡车，携带目标托盘数
    Normal(usize),
    /// 最后一辆车，必须吸收缓冲区里剩下的所有箱子
    Terminal,
}

impl TruckKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TruckKind::Terminal)
    }
}

/// 卡车
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truck {
    pub id: u32,
    pub kind: TruckKind,
    pub pallets: Vec<Pallet>,
}

impl Truck {
    /// 根据清单数据创建卡车，在这里把保留 ID 转换成 `TruckKind`
    pub fn ingest(id: u32, pallets: Vec<Pallet>) -> Self {
        let kind = if id == ID_LAST_TRUCK {
            TruckKind::Terminal
        } else {
            TruckKind::Normal(pallets.len())
        };
        Self { id, kind, pallets }
    }

    /// 同 ID、同类型、没有托盘的空壳
    pub fn shell(&self) -> Self {
        Self {
            id: self.id,
            kind: self.kind,
            pallets: Vec::new(),
        }
    }

    pub fn box_count(&self) -> usize {
        self.pallets.iter().map(Pallet::len).sum()
    }
}

impl fmt::Display for Truck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TruckKind::Normal(target) => write!(
                f,
                "[卡车 #{} 托盘 {}/{} 箱子 {}]",
                self.id,
                self.pallets.len(),
                target,
                self.box_count()
            ),
            TruckKind::Terminal => write!(
                f,
                "[末车 #{} 托盘 {} 箱子 {}]",
                self.id,
                self.pallets.len(),
                self.box_count()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientations() {
        let cases = [
            (CargoBox::new(3, 5, 99), (3, 5), (5, 3)),
            (CargoBox::new(5, 3, 99), (3, 5), (5, 3)),
            (CargoBox::new(3, 3, 99), (3, 3), (3, 3)),
        ];
        for (mut b, want_upright, want_sideways) in cases {
            upright(&mut b);
            assert_eq!((b.w, b.l), want_upright, "upright {}", b);
            assert!(b.l >= b.w);
            upright(&mut b);
            assert_eq!((b.w, b.l), want_upright, "upright 应该是幂等的");

            sideways(&mut b);
            assert_eq!((b.w, b.l), want_sideways, "sideways {}", b);
            assert!(b.w >= b.l);
            sideways(&mut b);
            assert_eq!((b.w, b.l), want_sideways, "sideways 应该是幂等的");
        }
    }

    #[test]
    fn test_fits_either_orientation() {
        let footprint = Footprint::new(4, 6);
        assert!(CargoBox::new(5, 1, 1).fits(footprint));
        assert!(CargoBox::new(4, 6, 2).fits(footprint));
        assert!(!CargoBox::new(5, 5, 3).fits(footprint));
        assert!(!CargoBox::new(7, 1, 4).fits(footprint));
    }

    #[test]
    fn test_validate_detects_overlap_and_bounds() {
        let footprint = Footprint::default();
        let mut pallet = Pallet::new();
        pallet.boxes.push(CargoBox { x: 0, y: 0, w: 2, l: 2, id: 1 });
        pallet.boxes.push(CargoBox { x: 2, y: 0, w: 2, l: 2, id: 2 });
        assert_eq!(pallet.validate(footprint), Ok(()));

        pallet.boxes.push(CargoBox { x: 1, y: 1, w: 1, l: 1, id: 3 });
        assert!(matches!(pallet.validate(footprint), Err(PalletError::Overlap(..))));

        pallet.boxes.pop();
        pallet.boxes.push(CargoBox { x: 3, y: 3, w: 2, l: 1, id: 4 });
        assert!(matches!(pallet.validate(footprint), Err(PalletError::OutOfBounds(_))));
    }

    #[test]
    fn test_ingest_decides_kind_once() {
        let pallets = vec![Pallet::new(), Pallet::new()];
        let truck = Truck::ingest(7, pallets.clone());
        assert_eq!(truck.kind, TruckKind::Normal(2));

        let last = Truck::ingest(ID_LAST_TRUCK, pallets);
        assert!(last.kind.is_terminal());

        let shell = truck.shell();
        assert_eq!(shell.id, 7);
        assert_eq!(shell.kind, TruckKind::Normal(2));
        assert!(shell.pallets.is_empty());
    }
}

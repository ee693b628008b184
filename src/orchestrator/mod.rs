//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `disassembly` - 拆车阶段
//! - 按到达顺序拆车
//! - 先转发空壳，再把箱子搬进缓冲区
//! - 输入耗尽后关闭缓冲区
//!
//! ### `reassembly` - 装车阶段
//! - 按空壳顺序装车
//! - 普通卡车装到目标托盘数，末车吸收剩余全部箱子
//!
//! ### `repacker` - 流水线
//! - 创建缓冲区、计数器和空壳通道
//! - 把两个阶段作为独立任务启动
//!
//! ## 层次关系
//!
//! ```text
//! 输入卡车 → disassembly ──空壳──→ reassembly → 输出卡车
//!                 ↓                   ↑
//!                 └──→ BoxBuffer ─────┘
//!                                     ↑
//!                           services::ShelfPacker
//! ```

pub mod disassembly;
pub mod reassembly;
pub mod repacker;

pub use disassembly::Disassembler;
pub use reassembly::Reassembler;
pub use repacker::{RepackSummary, Repacker, RepackerHandle};

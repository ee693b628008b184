//! # Truck Repack
//!
//! 把一辆辆卡车拆开，再用更少的托盘重新装车
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 模型层（Models）
//! - `models/cargo` - 箱子、托盘、卡车，以及卡车类型 `TruckKind`
//! - `models/loaders` - 从 TOML 清单加载输入卡车
//!
//! ### ② 基础设施层（Infrastructure）
//! - `BoxBuffer` - 唯一的共享可变资源，只暴露取/还/清空能力
//! - `Counters` - 卡车/托盘/箱子的进出计数
//!
//! ### ③ 业务能力层（Services）
//! - `ShelfPacker` - 货架装箱算法，纯计算
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/disassembly` - 拆车阶段
//! - `orchestrator/reassembly` - 装车阶段
//! - `orchestrator/repacker` - 把两个阶段接起来的流水线
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{BoxBuffer, Counters, CountersSnapshot};
pub use models::{CargoBox, Footprint, Pallet, Truck, TruckKind};
pub use orchestrator::{RepackSummary, Repacker, RepackerHandle};
pub use services::ShelfPacker;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::cargo::Truck;
use crate::models::load_manifest;
use crate::orchestrator::{RepackSummary, Repacker};
use crate::utils::logging::{log_manifest_loaded, log_startup, print_final_stats};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);
        Ok(Self { config })
    }

    /// 运行应用主逻辑：读清单 → 流水线 → 写结果 → 统计
    pub async fn run(&self) -> AppResult<RepackSummary> {
        info!("\n📁 正在加载清单: {}", self.config.manifest_path);
        let trucks = load_manifest(Path::new(&self.config.manifest_path)).await?;
        log_manifest_loaded(trucks.len(), trucks.iter().map(Truck::box_count).sum());

        let summary = repack_to_file(&self.config, trucks).await?;

        print_final_stats(&summary, &self.config);
        Ok(summary)
    }
}

/// 把卡车送进流水线，结果逐行写入输出文件
async fn repack_to_file(config: &Config, trucks: Vec<Truck>) -> AppResult<RepackSummary> {
    let file = File::create(&config.output_path)
        .map_err(|e| AppError::io(config.output_path.clone(), e))?;
    let mut writer = BufWriter::new(file);

    let expected_ids: Vec<u32> = trucks.iter().map(|t| t.id).collect();
    let (input_tx, input_rx) = mpsc::channel(config.shell_channel_capacity);
    let (output_tx, mut output_rx) = mpsc::channel(config.output_channel_capacity);

    let handle = Repacker::spawn(config, input_rx, output_tx)?;

    let feeder = tokio::spawn(async move {
        for truck in trucks {
            if input_tx.send(truck).await.is_err() {
                break;
            }
        }
    });

    let mut emitted_ids = Vec::with_capacity(expected_ids.len());
    while let Some(truck) = output_rx.recv().await {
        if config.verbose_logging {
            debug!("输出 {}", truck);
        }
        serde_json::to_writer(&mut writer, &truck)?;
        writer
            .write_all(b"\n")
            .map_err(|e| AppError::io(config.output_path.clone(), e))?;
        emitted_ids.push(truck.id);
    }
    writer
        .flush()
        .map_err(|e| AppError::io(config.output_path.clone(), e))?;

    if let Err(e) = feeder.await {
        error!("输入任务异常退出: {}", e);
    }
    let summary = handle.join().await?;

    if emitted_ids != expected_ids {
        error!(
            "输出顺序与输入不一致: 期望 {:?}, 实际 {:?}",
            expected_ids, emitted_ids
        );
    }
    Ok(summary)
}

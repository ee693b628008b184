use crate::error::{AppError, AppResult, ManifestError};
use crate::models::cargo::{CargoBox, Pallet, Truck, ID_LAST_TRUCK};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// 清单文件格式
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    trucks: Vec<TruckEntry>,
}

#[derive(Debug, Deserialize)]
struct TruckEntry {
    id: u32,
    #[serde(default)]
    pallets: Vec<PalletEntry>,
}

#[derive(Debug, Deserialize)]
struct PalletEntry {
    #[serde(default)]
    boxes: Vec<CargoBox>,
}

/// 从 TOML 文件加载卡车清单
pub async fn load_manifest(manifest_path: &Path) -> AppResult<Vec<Truck>> {
    let content = fs::read_to_string(manifest_path)
        .await
        .map_err(|e| AppError::io(manifest_path.display().to_string(), e))?;

    let trucks = parse_manifest(&content, &manifest_path.display().to_string())?;
    tracing::info!(
        "成功加载 {} 辆卡车: {}",
        trucks.len(),
        manifest_path.file_name().unwrap_or_default().to_string_lossy()
    );
    Ok(trucks)
}

/// 解析清单内容
///
/// 清单里没有末车时在最后补一辆空的末车；末车不在最后则报错
pub fn parse_manifest(content: &str, path: &str) -> AppResult<Vec<Truck>> {
    let manifest: Manifest =
        toml::from_str(content).map_err(|source| ManifestError::TomlParseFailed {
            path: path.to_string(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut trucks = Vec::with_capacity(manifest.trucks.len() + 1);
    for entry in manifest.trucks {
        if !seen.insert(entry.id) {
            return Err(ManifestError::DuplicateTruckId { id: entry.id }.into());
        }
        let pallets = entry
            .pallets
            .into_iter()
            .map(|p| Pallet { boxes: p.boxes })
            .collect();
        trucks.push(Truck::ingest(entry.id, pallets));
    }

    match trucks.iter().position(|t| t.kind.is_terminal()) {
        Some(pos) if pos + 1 != trucks.len() => {
            return Err(ManifestError::TerminalNotLast {
                remaining: trucks.len() - pos - 1,
            }
            .into());
        }
        Some(_) => {}
        None => {
            tracing::debug!("清单中没有末车，自动追加一辆");
            trucks.push(Truck::ingest(ID_LAST_TRUCK, Vec::new()));
        }
    }

    Ok(trucks)
}

pub mod cargo;
pub mod loaders;

pub use cargo::{
    sideways, upright, CargoBox, Footprint, Pallet, PalletError, Truck, TruckKind, ID_LAST_TRUCK,
    PALLET_LENGTH, PALLET_WIDTH,
};
pub use loaders::{load_manifest, parse_manifest};

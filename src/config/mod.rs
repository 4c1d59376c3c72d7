//! Configuration for lectern.

mod settings;

pub use settings::{
    BusSettings, ChunkingSettings, GeneralSettings, ModelSettings, Settings, StoreSettings,
};

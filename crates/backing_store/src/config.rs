use model::IntSize;
use serde::{Deserialize, Serialize};
use view::{
    DEFAULT_CONTENTS_SCALE, DEFAULT_COVER_AREA_MULTIPLIER, DEFAULT_TILE_DIMENSION, GeometryError,
    TileGeometry,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackingStoreConfig {
    pub tile_size: IntSize,
    pub cover_area_multiplier: f32,
    pub contents_scale: f32,
    pub supports_alpha: bool,
}

impl Default for BackingStoreConfig {
    fn default() -> Self {
        Self {
            tile_size: IntSize::new(DEFAULT_TILE_DIMENSION, DEFAULT_TILE_DIMENSION),
            cover_area_multiplier: DEFAULT_COVER_AREA_MULTIPLIER,
            contents_scale: DEFAULT_CONTENTS_SCALE,
            supports_alpha: false,
        }
    }
}

impl BackingStoreConfig {
    pub fn validate(&self) -> Result<(), GeometryError> {
        self.geometry().map(|_| ())
    }

    pub(crate) fn geometry(&self) -> Result<TileGeometry, GeometryError> {
        TileGeometry::new(
            self.tile_size,
            self.contents_scale,
            self.cover_area_multiplier,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: BackingStoreConfig =
            serde_json::from_str(r#"{ "cover_area_multiplier": 1.5 }"#).expect("parse config");
        assert_eq!(config.tile_size, IntSize::new(512, 512));
        assert_eq!(config.cover_area_multiplier, 1.5);
        assert_eq!(config.contents_scale, 1.0);
        assert!(!config.supports_alpha);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_reports_zero_tile_dimension() {
        let config: BackingStoreConfig =
            serde_json::from_str(r#"{ "tile_size": { "width": 256, "height": 0 } }"#)
                .expect("parse config");
        assert_eq!(
            config.validate(),
            Err(GeometryError::InvalidTileSize {
                width: 256,
                height: 0
            })
        );
    }
}

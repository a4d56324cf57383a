//! Settings Loading Tests
//!
//! Tests for:
//! - JSON defaults and round trips
//! - Rejection of unsupported LUT and atlas sizes
//! - Range validation of shadow and post-processing values

use custom_rp::resources::{BloomMode, FilterMode, TextureSize, ToneMappingMode};
use custom_rp::settings::{BicubicRescalingMode, ColorLutResolution};
use custom_rp::{PipelineError, PipelineSettings};

#[test]
fn empty_json_yields_defaults() {
    let settings = PipelineSettings::from_json("{}").unwrap();
    assert_eq!(settings, PipelineSettings::default());
    assert_eq!(settings.color_lut_resolution.texels(), 32);
    assert_eq!(settings.shadows.directional.cascade_count, 4);
    assert!(settings.post_fx.is_none());
}

#[test]
fn partial_json_overrides_nested_fields() {
    let settings = PipelineSettings::from_json(
        r#"{
            "allow_hdr": false,
            "color_lut_resolution": 64,
            "render_scale": 0.75,
            "bicubic_rescaling": "UpOnly",
            "shadows": {
                "max_distance": 50.0,
                "directional": { "atlas_size": 2048, "filter": "PCF5x5", "cascade_count": 2 },
                "other": { "atlas_size": 512 }
            },
            "post_fx": {
                "bloom": { "intensity": 1.5, "mode": "Scattering" },
                "tone_mapping": { "mode": "Aces" }
            }
        }"#,
    )
    .unwrap();

    assert!(!settings.allow_hdr);
    assert_eq!(settings.color_lut_resolution, ColorLutResolution::X64);
    assert_eq!(settings.bicubic_rescaling, BicubicRescalingMode::UpOnly);
    assert_eq!(settings.shadows.max_distance, 50.0);
    assert_eq!(settings.shadows.directional.atlas_size, TextureSize::X2048);
    assert_eq!(settings.shadows.directional.filter, FilterMode::PCF5x5);
    assert_eq!(settings.shadows.directional.cascade_count, 2);
    // Unspecified nested fields keep their defaults.
    assert_eq!(settings.shadows.directional.cascade_ratio_1, 0.1);
    assert_eq!(settings.shadows.other.atlas_size, TextureSize::X512);

    let post_fx = settings.post_fx.unwrap();
    assert_eq!(post_fx.bloom.intensity, 1.5);
    assert_eq!(post_fx.bloom.mode, BloomMode::Scattering);
    assert_eq!(post_fx.tone_mapping.mode, ToneMappingMode::Aces);
    assert!(!post_fx.ssao.enabled);
}

#[test]
fn json_round_trip_preserves_settings() {
    let mut settings = PipelineSettings::default();
    settings.render_scale = 1.25;
    settings.shadows.directional.atlas_size = TextureSize::X4096;
    settings.post_fx = Some(Default::default());

    let json = settings.to_json().unwrap();
    assert!(json.contains("\"atlas_size\": 4096"));
    assert_eq!(PipelineSettings::from_json(&json).unwrap(), settings);
}

#[test]
fn unsupported_lut_resolution_is_rejected() {
    let result = PipelineSettings::from_json(r#"{ "color_lut_resolution": 48 }"#);
    assert!(matches!(result, Err(PipelineError::JsonError(_))));
}

#[test]
fn unsupported_atlas_size_is_rejected() {
    let result =
        PipelineSettings::from_json(r#"{ "shadows": { "directional": { "atlas_size": 1000 } } }"#);
    assert!(result.is_err());
    assert!(matches!(
        TextureSize::try_from(1000),
        Err(PipelineError::InvalidAtlasSize(1000))
    ));
}

#[test]
fn out_of_range_values_are_rejected() {
    let cases = [
        r#"{ "render_scale": 2.5 }"#,
        r#"{ "shadows": { "max_distance": 0.0 } }"#,
        r#"{ "shadows": { "distance_fade": 0.0 } }"#,
        r#"{ "shadows": { "directional": { "cascade_count": 5 } } }"#,
        r#"{ "post_fx": { "bloom": { "scatter": 1.0 } } }"#,
        r#"{ "post_fx": { "ssao": { "sample_count": 0 } } }"#,
    ];
    for json in cases {
        assert!(PipelineSettings::from_json(json).is_err(), "{json}");
    }
}

#[test]
fn malformed_json_is_an_error() {
    let result = PipelineSettings::from_json("{ \"allow_hdr\": ");
    assert!(matches!(result, Err(PipelineError::JsonError(_))));
}

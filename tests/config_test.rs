use cgmath::Deg;
use turntable::config::{Colour, LightSettings, SceneConfig, SpinRate};

#[test]
fn defaults_are_valid() {
    let config = SceneConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.model_scale, 0.5);
    assert_eq!(config.spin, SpinRate { x_divisor_ms: 2000.0, y_divisor_ms: 1000.0 });
}

#[test]
fn hex_colours_are_normalised() {
    let grey = Colour::from_hex(0x404040);

    assert_eq!(grey.r, 64.0 / 255.0);
    assert_eq!(grey.g, grey.b);
    assert_eq!(Colour::from_hex(0xffffff), Colour::WHITE);
    assert_eq!(Colour::WHITE.scaled(0.5), [0.5, 0.5, 0.5]);
}

fn rejected(config: SceneConfig, needle: &str) {
    let error = config.validate().expect_err("configuration should be rejected");
    assert!(
        error.to_string().contains(needle),
        "'{}' does not mention '{}'",
        error,
        needle
    );
}

#[test]
fn empty_asset_paths_are_rejected() {
    rejected(
        SceneConfig {
            model: "  ".to_string(),
            ..Default::default()
        },
        "model path",
    );
    rejected(
        SceneConfig {
            background: String::new(),
            ..Default::default()
        },
        "background path",
    );
}

#[test]
fn projection_parameters_are_checked() {
    rejected(
        SceneConfig {
            fovy: Deg(180.0),
            ..Default::default()
        },
        "fovy",
    );
    rejected(
        SceneConfig {
            znear: -1.0,
            ..Default::default()
        },
        "znear",
    );
    rejected(
        SceneConfig {
            znear: 10.0,
            zfar: 10.0,
            ..Default::default()
        },
        "zfar",
    );
}

#[test]
fn model_and_light_parameters_are_checked() {
    rejected(
        SceneConfig {
            model_scale: 0.0,
            ..Default::default()
        },
        "model_scale",
    );
    rejected(
        SceneConfig {
            ambient: LightSettings {
                colour: Colour::WHITE,
                intensity: -0.5,
            },
            ..Default::default()
        },
        "ambient intensity",
    );
    rejected(
        SceneConfig {
            directional: LightSettings {
                colour: Colour::new(1.5, 0.0, 0.0),
                intensity: 1.0,
            },
            ..Default::default()
        },
        "directional colour",
    );
    rejected(
        SceneConfig {
            fill_offset: f32::NAN,
            ..Default::default()
        },
        "fill_offset",
    );
}

#[test]
fn zero_spin_divisor_is_rejected() {
    rejected(
        SceneConfig {
            spin: SpinRate {
                x_divisor_ms: 2000.0,
                y_divisor_ms: 0.0,
            },
            ..Default::default()
        },
        "spin divisor for y",
    );
}

#[test]
fn env_overrides_replace_asset_locations() {
    // Only this test touches the TURNTABLE_* variables.
    unsafe {
        std::env::set_var("TURNTABLE_ASSETS", "/srv/turntable");
        std::env::set_var("TURNTABLE_MODEL", "robot.glb");
        std::env::set_var("TURNTABLE_BACKGROUND", "");
    }

    let config = SceneConfig::default().with_env_overrides();

    unsafe {
        std::env::remove_var("TURNTABLE_ASSETS");
        std::env::remove_var("TURNTABLE_MODEL");
        std::env::remove_var("TURNTABLE_BACKGROUND");
    }
    assert_eq!(config.asset_root, "/srv/turntable");
    assert_eq!(config.model, "robot.glb");
    assert_eq!(config.background, "background.png");
    assert!(config.validate().is_ok());
}

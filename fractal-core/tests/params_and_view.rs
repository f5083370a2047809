use fractal_core::{
    get_fractal_config, CommonParams, FractalKind, FractalParams, PlaneKind, View,
};

#[test]
fn serializing_fractal_params_roundtrips_tagged_variant() {
    let params = FractalParams {
        kind: FractalKind::Plane(PlaneKind::MandelPower { n: 3.0 }),
        common: CommonParams {
            max_iterations: 5000,
            ..Default::default()
        },
    };

    let json = serde_json::to_string(&params).unwrap();
    let restored: FractalParams = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, params);
}

#[test]
fn default_view_for_mandelbrot_is_centered_on_main_cardioid() {
    let config = get_fractal_config("mandelbrot").unwrap();
    let view = config.default_view(256, 800, 600);

    assert!(view.center.0 < fractal_core::BigFloat::zero(256));
    assert_eq!(view.precision_bits(), 256);
}

#[test]
fn unknown_fractal_id_is_not_registered() {
    assert!(get_fractal_config("mengersponge-typo").is_none());
}

#[test]
fn view_zoom_roundtrips_through_log2_for_shallow_and_deep() {
    let shallow = View::from_f64(-0.5, 0.0, 4.0, 4.0, 128, 800, 600);
    assert!((shallow.zoom(4.0) - 1.0).abs() < 1e-9);

    let deep = View::from_strings("-0.5", "0.0", "4e-10", "4e-10", 256, 800, 600).unwrap();
    assert!((deep.zoom(4.0) - 1e10).abs() / 1e10 < 1e-6);
}

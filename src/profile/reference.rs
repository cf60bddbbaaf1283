//! Reference test columns for the single-layer vs multilayer comparison.

/// Increment thicknesses in m, surface first.
pub(super) const THICKNESS: [f64; 9] = [0.05, 0.05, 0.01, 0.01, 0.01, 0.01, 0.15, 0.15, 0.2];

/// Densities in kg/m³, one row per column.
#[rustfmt::skip]
pub(super) const DENSITY: [[f64; 9]; 32] = [
    [300., 300., 300., 350., 350., 400., 400., 400., 450.],
    [300., 300., 350., 400., 400., 450., 450., 500., 500.],
    [300., 350., 400., 400., 450., 450., 500., 550., 550.],
    [350., 350., 400., 450., 500., 550., 600., 600., 650.],
    [350., 350., 450., 450., 500., 600., 650., 650., 700.],
    [350., 400., 500., 600., 600., 700., 700., 700., 700.],
    [400., 400., 450., 450., 550., 600., 650., 750., 800.],
    [400., 400., 500., 600., 650., 700., 800., 900., 916.],
    [400., 500., 550., 600., 700., 800., 900., 916., 916.],
    [450., 550., 650., 750., 850., 900., 915., 916., 916.],
    [450., 550., 650., 750., 916., 916., 916., 916., 916.],
    [450., 600., 800., 900., 916., 916., 916., 916., 916.],
    [500., 550., 600., 600., 600., 650., 650., 700., 800.],
    [500., 550., 600., 650., 650., 700., 750., 800., 916.],
    [500., 600., 700., 800., 850., 900., 915., 916., 916.],
    [500., 600., 700., 800., 900., 916., 916., 916., 916.],
    [550., 550., 600., 600., 650., 650., 700., 750., 800.],
    [550., 600., 650., 650., 700., 700., 700., 750., 750.],
    [550., 600., 700., 750., 800., 800., 850., 850., 900.],
    [600., 600., 600., 600., 600., 700., 700., 750., 750.],
    [600., 600., 600., 650., 650., 700., 700., 750., 800.],
    [600., 600., 650., 700., 750., 800., 850., 900., 916.],
    [650., 650., 650., 700., 700., 800., 800., 850., 900.],
    [650., 650., 700., 700., 850., 900., 915., 916., 916.],
    [650., 700., 750., 800., 850., 900., 915., 916., 916.],
    [700., 700., 700., 750., 800., 850., 850., 900., 916.],
    [700., 750., 750., 800., 850., 900., 916., 916., 916.],
    [800., 800., 800., 850., 850., 900., 900., 916., 916.],
    [800., 850., 850., 850., 850., 900., 900., 916., 916.],
    [800., 850., 900., 900., 900., 916., 916., 916., 916.],
    [850., 850., 900., 900., 916., 916., 916., 916., 916.],
    [850., 900., 916., 916., 916., 916., 916., 916., 916.],
];

use crate::error::{ConfigError, TerrainLoadError};
use crate::simulation::*;
use crate::{LanderSettings, Settings, WorldSize};
use json::{self, JsonValue};
use std::path::Path;
use std::{fs::File, io::Read};

/// Optional numeric key: the default when absent, an error when present but not a number.
macro_rules! get_json_or {
    ($json:ident, $($key:literal),+; $default:expr) => {{
        let value = &$json$([$key])+;
        if value.is_null() {
            $default
        } else {
            value.as_f64().ok_or(ConfigError::Invalid {
                key: concat!($("/", $key),+),
                reason: format!("expected a number, got {value}"),
            })?
        }
    }};
}

macro_rules! positive {
    ($value:expr, $key:literal) => {{
        let value = $value;
        if value > 0. {
            value
        } else {
            return Err(ConfigError::Invalid {
                key: $key,
                reason: format!("must be positive, got {value}"),
            });
        }
    }};
}

macro_rules! non_negative {
    ($value:expr, $key:literal) => {{
        let value = $value;
        if value >= 0. {
            value
        } else {
            return Err(ConfigError::Invalid {
                key: $key,
                reason: format!("must not be negative, got {value}"),
            });
        }
    }};
}

pub fn parse_settings<P: AsRef<Path>>(settings_file_path: P) -> Result<Settings, ConfigError> {
    let path = settings_file_path.as_ref();
    let content = read_file(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings_from_string(&content)
}

/// Every key is optional; missing ones keep their default value.
pub fn parse_settings_from_string(content: &str) -> Result<Settings, ConfigError> {
    let json = json::parse(content)?;
    let defaults = Settings::default();
    let default_lander = &defaults.lander;

    let physics = Physics::default()
        .with_g(positive!(get_json_or!(json, "Physics", "Gravity"; defaults.physics.g()), "/Physics/Gravity"))
        .with_unit_scale(positive!(
            get_json_or!(json, "Physics", "UnitScale"; defaults.physics.unit_scale()),
            "/Physics/UnitScale"
        ))
        .with_thrust_coefficient(non_negative!(
            get_json_or!(json, "Physics", "ThrustCoefficient"; defaults.physics.thrust_coefficient()),
            "/Physics/ThrustCoefficient"
        ))
        .with_drag_coefficient(non_negative!(
            get_json_or!(json, "Physics", "DragCoefficient"; defaults.physics.drag_coefficient()),
            "/Physics/DragCoefficient"
        ))
        .with_density(non_negative!(
            get_json_or!(json, "Physics", "Density"; defaults.physics.density()),
            "/Physics/Density"
        ));

    let collision_checker = CollisionChecker::default()
        .with_max_vertical_speed(positive!(
            get_json_or!(json, "Landing", "MaxVerticalSpeed"; defaults.collision_checker.max_vertical_speed()),
            "/Landing/MaxVerticalSpeed"
        ))
        .with_max_horizontal_speed(positive!(
            get_json_or!(json, "Landing", "MaxHorizontalSpeed"; defaults.collision_checker.max_horizontal_speed()),
            "/Landing/MaxHorizontalSpeed"
        ))
        .with_max_tilt(non_negative!(
            get_json_or!(json, "Landing", "MaxTilt"; defaults.collision_checker.max_tilt()),
            "/Landing/MaxTilt"
        ));

    let world = WorldSize {
        width: positive!(get_json_or!(json, "Terrain", "Width"; defaults.world.width), "/Terrain/Width"),
        height: positive!(get_json_or!(json, "Terrain", "Height"; defaults.world.height), "/Terrain/Height"),
        length: positive!(get_json_or!(json, "Terrain", "Length"; defaults.world.length), "/Terrain/Length"),
    };

    let pad_fraction = get_json_or!(json, "Terrain", "PadFraction"; defaults.terrain.pad_fraction());
    if !(pad_fraction > 0. && pad_fraction <= 1.) {
        return Err(ConfigError::Invalid {
            key: "/Terrain/PadFraction",
            reason: format!("must be in (0, 1], got {pad_fraction}"),
        });
    }
    let smoothing_passes = &json["Terrain"]["SmoothingPasses"];
    let smoothing_passes = if smoothing_passes.is_null() {
        defaults.terrain.smoothing_passes()
    } else {
        smoothing_passes.as_usize().ok_or(ConfigError::Invalid {
            key: "/Terrain/SmoothingPasses",
            reason: format!("expected a non-negative integer, got {smoothing_passes}"),
        })?
    };
    let terrain = TerrainSettings::default()
        .with_segment_width(positive!(
            get_json_or!(json, "Terrain", "SegmentWidth"; defaults.terrain.segment_width()),
            "/Terrain/SegmentWidth"
        ))
        .with_cell_size(positive!(
            get_json_or!(json, "Terrain", "CellSize"; defaults.terrain.cell_size()),
            "/Terrain/CellSize"
        ))
        .with_pad_fraction(pad_fraction)
        .with_roughness(non_negative!(
            get_json_or!(json, "Terrain", "Roughness"; defaults.terrain.roughness()),
            "/Terrain/Roughness"
        ))
        .with_smoothing_passes(smoothing_passes);

    let lander = LanderSettings {
        dimensions: Dimensions {
            width: positive!(
                get_json_or!(json, "Lander", "Width"; default_lander.dimensions.width),
                "/Lander/Width"
            ),
            height: positive!(
                get_json_or!(json, "Lander", "Height"; default_lander.dimensions.height),
                "/Lander/Height"
            ),
            depth: positive!(
                get_json_or!(json, "Lander", "Depth"; default_lander.dimensions.depth),
                "/Lander/Depth"
            ),
        },
        mass: positive!(get_json_or!(json, "Lander", "Mass"; default_lander.mass), "/Lander/Mass"),
        max_fuel: non_negative!(
            get_json_or!(json, "Lander", "MaxFuel"; default_lander.max_fuel),
            "/Lander/MaxFuel"
        ),
        fuel_consumption: non_negative!(
            get_json_or!(json, "Lander", "FuelConsumption"; default_lander.fuel_consumption),
            "/Lander/FuelConsumption"
        ),
        rotation_step: non_negative!(
            get_json_or!(json, "Lander", "RotationStep"; default_lander.rotation_step),
            "/Lander/RotationStep"
        ),
    };

    Ok(Settings {
        physics,
        collision_checker,
        terrain,
        lander,
        world,
    })
}

pub fn parse_heightmap<P: AsRef<Path>>(heightmap_file_path: P) -> Result<Vec<Vec<f64>>, TerrainLoadError> {
    let path = heightmap_file_path.as_ref();
    let content = read_file(path).map_err(|source| TerrainLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_heightmap_from_string(&content)
}

/// Rows of height samples, either under a `Heights` key or as the top-level array.
pub fn parse_heightmap_from_string(content: &str) -> Result<Vec<Vec<f64>>, TerrainLoadError> {
    let json = json::parse(content)?;
    let rows = if json.is_array() { &json } else { &json["Heights"] };
    if !rows.is_array() {
        return Err(TerrainLoadError::Malformed("lacking Heights array".to_owned()));
    }
    rows.members()
        .enumerate()
        .map(|(i, row)| parse_row(i, row))
        .collect()
}

fn parse_row(index: usize, row: &JsonValue) -> Result<Vec<f64>, TerrainLoadError> {
    if !row.is_array() {
        return Err(TerrainLoadError::Malformed(format!("row {index} is not an array")));
    }
    row.members()
        .map(|sample| {
            sample.as_f64().ok_or_else(|| {
                TerrainLoadError::Malformed(format!("row {index} has a non-numeric sample {sample}"))
            })
        })
        .collect()
}

fn read_file(file_path: &Path) -> std::io::Result<String> {
    let mut file_content = String::new();
    File::open(file_path)?.read_to_string(&mut file_content)?;
    Ok(file_content)
}

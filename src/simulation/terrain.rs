use std::path::Path;

use rand::Rng;

use super::{Contact, LanderState, Surface, Vec2, Vec3};
use crate::error::TerrainLoadError;

pub(crate) mod defaults {
    pub const SEGMENT_WIDTH: f64 = 20.;
    pub const CELL_SIZE: f64 = 40.;
    pub const PAD_FRACTION: f64 = 0.15;
    /// Largest height change between neighbouring vertices, relative to the height band.
    pub const ROUGHNESS: f64 = 0.15;
    pub const SMOOTHING_PASSES: usize = 3;
    pub const MIN_HEIGHT: f64 = 0.05;
    pub const MAX_HEIGHT: f64 = 0.45;
}

#[derive(Clone, Debug, PartialEq)]
pub struct TerrainSettings {
    segment_width: f64,
    cell_size: f64,
    pad_fraction: f64,
    roughness: f64,
    smoothing_passes: usize,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            segment_width: defaults::SEGMENT_WIDTH,
            cell_size: defaults::CELL_SIZE,
            pad_fraction: defaults::PAD_FRACTION,
            roughness: defaults::ROUGHNESS,
            smoothing_passes: defaults::SMOOTHING_PASSES,
        }
    }
}

impl TerrainSettings {
    pub fn with_segment_width(self, segment_width: f64) -> Self {
        if !(segment_width > 0.) {
            return self;
        }
        Self {
            segment_width,
            ..self
        }
    }

    pub fn with_cell_size(self, cell_size: f64) -> Self {
        if !(cell_size > 0.) {
            return self;
        }
        Self { cell_size, ..self }
    }

    pub fn with_pad_fraction(self, pad_fraction: f64) -> Self {
        if !(pad_fraction > 0. && pad_fraction <= 1.) {
            return self;
        }
        Self {
            pad_fraction,
            ..self
        }
    }

    pub fn with_roughness(self, roughness: f64) -> Self {
        let roughness = roughness.max(0.);
        Self { roughness, ..self }
    }

    pub fn with_smoothing_passes(self, smoothing_passes: usize) -> Self {
        Self {
            smoothing_passes,
            ..self
        }
    }

    pub fn segment_width(&self) -> f64 {
        self.segment_width
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn pad_fraction(&self) -> f64 {
        self.pad_fraction
    }

    pub fn roughness(&self) -> f64 {
        self.roughness
    }

    pub fn smoothing_passes(&self) -> usize {
        self.smoothing_passes
    }

    fn height_band(&self, height: f64) -> (f64, f64) {
        let height = height.max(0.);
        (height * defaults::MIN_HEIGHT, height * defaults::MAX_HEIGHT)
    }
}

/// Number of pad cells out of `cells` and a start index that keeps the pad off the edges when possible.
fn place_pad<R: Rng + ?Sized>(cells: usize, fraction: f64, rng: &mut R) -> (usize, usize) {
    let pad = ((cells as f64 * fraction).round() as usize).clamp(1, cells);
    let start = if cells > pad + 1 {
        rng.gen_range(1..cells - pad)
    } else {
        0
    };
    (start, pad)
}

/// Splits `[0, extent]` into `cells` spans; the last edge is exactly `extent`.
fn edges(extent: f64, cells: usize) -> Vec<f64> {
    (0..=cells)
        .map(|i| {
            if i == cells {
                extent
            } else {
                extent * i as f64 / cells as f64
            }
        })
        .collect()
}

fn cell_count(extent: f64, cell: f64) -> usize {
    ((extent / cell).round() as usize).max(1)
}

#[derive(Clone, Debug, PartialEq)]
pub struct TerrainSegment {
    pub start: Vec2,
    pub end: Vec2,
    pub is_landing_pad: bool,
}

impl TerrainSegment {
    pub fn new(start: Vec2, end: Vec2, is_landing_pad: bool) -> Self {
        Self {
            start,
            end,
            is_landing_pad,
        }
    }

    pub fn contains_x(&self, x: f64) -> bool {
        self.start.x <= x && x <= self.end.x
    }

    /// Linear interpolation of the ground height at `x`.
    pub fn height_at(&self, x: f64) -> f64 {
        let span = self.end.x - self.start.x;
        if span <= 0. {
            return self.start.y.max(self.end.y);
        }
        let t = (x - self.start.x) / span;
        self.start.y + (self.end.y - self.start.y) * t
    }

    pub fn slope(&self) -> f64 {
        let span = self.end.x - self.start.x;
        if span <= 0. {
            0.
        } else {
            (self.end.y - self.start.y) / span
        }
    }
}

/// Planar terrain: a left-to-right run of segments covering `[0, width]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Terrain2D {
    width: f64,
    height: f64,
    segments: Vec<TerrainSegment>,
}

impl Terrain2D {
    pub fn from_segments(width: f64, height: f64, segments: Vec<TerrainSegment>) -> Self {
        Self {
            width,
            height,
            segments,
        }
    }

    pub fn generate(width: f64, height: f64, settings: &TerrainSettings) -> Self {
        Self::generate_with_rng(width, height, settings, &mut rand::thread_rng())
    }

    /// Random-walk profile with one flat pad. A non-positive width gives an empty terrain.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        width: f64,
        height: f64,
        settings: &TerrainSettings,
        rng: &mut R,
    ) -> Self {
        if width <= 0. || width.is_nan() {
            return Self::from_segments(width.max(0.), height.max(0.), Vec::new());
        }
        let cells = cell_count(width, settings.segment_width);
        let (pad_start, pad_len) = place_pad(cells, settings.pad_fraction, rng);
        let pad = pad_start..pad_start + pad_len;
        let (low, high) = settings.height_band(height);
        let step = (high - low) * settings.roughness;

        let mut heights = Vec::with_capacity(cells + 1);
        heights.push(rng.gen_range(low..=high));
        for i in 1..=cells {
            let previous = heights[i - 1];
            let next = if pad.contains(&(i - 1)) {
                previous
            } else {
                (previous + rng.gen_range(-step..=step)).clamp(low, high)
            };
            heights.push(next);
        }

        let xs = edges(width, cells);
        let segments = (0..cells)
            .map(|i| {
                TerrainSegment::new(
                    Vec2::new(xs[i], heights[i]),
                    Vec2::new(xs[i + 1], heights[i + 1]),
                    pad.contains(&i),
                )
            })
            .collect::<Vec<_>>();
        log::debug!(
            "Generated planar terrain: {} segments, pad at [{:.1}, {:.1}]",
            segments.len(),
            xs[pad.start],
            xs[pad.end]
        );
        Self::from_segments(width, height.max(0.), segments)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn segments(&self) -> &[TerrainSegment] {
        &self.segments
    }

    pub fn segment_at(&self, x: f64) -> Option<&TerrainSegment> {
        self.segments.iter().find(|s| s.contains_x(x))
    }

    /// Horizontal span and height of the contiguous pad run.
    pub fn landing_pad(&self) -> Option<(f64, f64, f64)> {
        let first = self.segments.iter().position(|s| s.is_landing_pad)?;
        let last = self.segments[first..]
            .iter()
            .take_while(|s| s.is_landing_pad)
            .count()
            + first
            - 1;
        Some((
            self.segments[first].start.x,
            self.segments[last].end.x,
            self.segments[first].start.y,
        ))
    }
}

impl Surface for Terrain2D {
    type Vector = Vec2;

    fn ground_beneath(&self, lander: &LanderState<Vec2>) -> Option<Contact> {
        let x = lander.position().x;
        let segment = self.segment_at(x)?;
        Some(Contact {
            height: segment.height_at(x),
            on_landing_pad: segment.is_landing_pad,
        })
    }
}

/// Row-major vertex heights, `columns` along x and `rows` along z.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightField {
    columns: usize,
    rows: usize,
    heights: Vec<f64>,
}

impl HeightField {
    pub fn new(columns: usize, rows: usize, heights: Vec<f64>) -> Self {
        assert_eq!(columns * rows, heights.len());
        Self {
            columns,
            rows,
            heights,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get(&self, column: usize, row: usize) -> f64 {
        self.heights[row * self.columns + column]
    }

    fn set(&mut self, column: usize, row: usize, height: f64) {
        self.heights[row * self.columns + column] = height;
    }

    /// 3x3 box blur, edges average over the neighbours that exist.
    fn smooth(&mut self) {
        let mut smoothed = self.heights.clone();
        for row in 0..self.rows {
            for column in 0..self.columns {
                let (mut sum, mut count) = (0., 0.);
                for r in row.saturating_sub(1)..=(row + 1).min(self.rows - 1) {
                    for c in column.saturating_sub(1)..=(column + 1).min(self.columns - 1) {
                        sum += self.get(c, r);
                        count += 1.;
                    }
                }
                smoothed[row * self.columns + column] = sum / count;
            }
        }
        self.heights = smoothed;
    }

    fn patch(&self, pad: &PadPatch) -> impl Iterator<Item = f64> + '_ {
        let PadPatch {
            column,
            row,
            columns,
            rows,
        } = *pad;
        (row..=row + rows).flat_map(move |r| (column..=column + columns).map(move |c| self.get(c, r)))
    }

    /// Levels every vertex of the patch to their mean.
    fn flatten(&mut self, pad: &PadPatch) -> f64 {
        let (sum, count) = self.patch(pad).fold((0., 0.), |(s, n), h| (s + h, n + 1.));
        let level = sum / count;
        for r in pad.row..=pad.row + pad.rows {
            for c in pad.column..=pad.column + pad.columns {
                self.set(c, r, level);
            }
        }
        level
    }

    /// Patch of the given cell size with the smallest height spread.
    fn flattest_patch(&self, columns: usize, rows: usize) -> PadPatch {
        let cells_x = self.columns - 1;
        let cells_z = self.rows - 1;
        let mut best = PadPatch {
            column: 0,
            row: 0,
            columns,
            rows,
        };
        let mut best_spread = f64::INFINITY;
        for row in 0..=cells_z - rows {
            for column in 0..=cells_x - columns {
                let candidate = PadPatch {
                    column,
                    row,
                    columns,
                    rows,
                };
                let (low, high) = self
                    .patch(&candidate)
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(l, h), v| (l.min(v), h.max(v)));
                if high - low < best_spread {
                    best_spread = high - low;
                    best = candidate;
                }
            }
        }
        best
    }
}

/// Pad area in grid cells: starts at vertex (`column`, `row`) and spans `columns` x `rows` cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PadPatch {
    pub column: usize,
    pub row: usize,
    pub columns: usize,
    pub rows: usize,
}

impl PadPatch {
    fn contains_cell(&self, column: usize, row: usize) -> bool {
        (self.column..self.column + self.columns).contains(&column)
            && (self.row..self.row + self.rows).contains(&row)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TerrainTriangle {
    pub vertices: [Vec3; 3],
    pub normal: Vec3,
    pub is_landing_pad: bool,
}

impl TerrainTriangle {
    /// Builds the triangle with its normal turned upwards.
    pub fn new(vertices: [Vec3; 3], is_landing_pad: bool) -> Self {
        let [a, b, c] = vertices;
        let normal = (b - a).cross(c - a).normalized();
        let normal = if normal.y < 0. { -normal } else { normal };
        Self {
            vertices,
            normal,
            is_landing_pad,
        }
    }

    /// Ground height at (`x`, `z`) when the point lies inside the triangle's ground projection.
    pub fn height_at(&self, x: f64, z: f64) -> Option<f64> {
        const EPS: f64 = 1e-9;
        let [a, b, c] = self.vertices;
        let (v0, v1, v2) = (b.xz() - a.xz(), c.xz() - a.xz(), Vec2::new(x, z) - a.xz());
        let d = v0.cross(v1);
        if d.abs() < EPS {
            return None;
        }
        let l1 = v2.cross(v1) / d;
        let l2 = v0.cross(v2) / d;
        let l0 = 1. - l1 - l2;
        (l0 >= -EPS && l1 >= -EPS && l2 >= -EPS).then(|| l0 * a.y + l1 * b.y + l2 * c.y)
    }
}

/// Spatial terrain triangulated from a height field, two triangles per grid cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Terrain3D {
    width: f64,
    length: f64,
    height: f64,
    field: HeightField,
    pad: Option<PadPatch>,
    triangles: Vec<TerrainTriangle>,
}

impl Terrain3D {
    pub fn generate(width: f64, length: f64, height: f64, settings: &TerrainSettings) -> Self {
        Self::generate_with_rng(width, length, height, settings, &mut rand::thread_rng())
    }

    /// Smoothed noise height field with a flat square pad.
    /// A non-positive width or length gives an empty terrain.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        width: f64,
        length: f64,
        height: f64,
        settings: &TerrainSettings,
        rng: &mut R,
    ) -> Self {
        if !(width > 0. && length > 0.) {
            return Self::default();
        }
        let (cells_x, cells_z) = (
            cell_count(width, settings.cell_size),
            cell_count(length, settings.cell_size),
        );
        let (low, high) = settings.height_band(height);
        let heights = (0..(cells_x + 1) * (cells_z + 1))
            .map(|_| rng.gen_range(low..=high))
            .collect();
        let mut field = HeightField::new(cells_x + 1, cells_z + 1, heights);
        for _ in 0..settings.smoothing_passes {
            field.smooth();
        }

        let (column, columns) = place_pad(cells_x, settings.pad_fraction, rng);
        let (row, rows) = place_pad(cells_z, settings.pad_fraction, rng);
        let pad = PadPatch {
            column,
            row,
            columns,
            rows,
        };
        let level = field.flatten(&pad);
        log::debug!(
            "Generated spatial terrain: {cells_x}x{cells_z} cells, pad {columns}x{rows} at ({column}, {row}) level {level:.1}"
        );
        Self::from_height_field(width, length, height.max(0.), field, Some(pad))
    }

    pub fn from_height_field(
        width: f64,
        length: f64,
        height: f64,
        field: HeightField,
        pad: Option<PadPatch>,
    ) -> Self {
        let mut terrain = Self {
            width,
            length,
            height,
            field,
            pad,
            triangles: Vec::new(),
        };
        terrain.triangulate();
        terrain
    }

    /// Replaces the terrain with a heightmap read from a JSON file.
    /// On failure the current terrain is kept as it was.
    pub fn load_heightmap<P: AsRef<Path>>(
        &mut self,
        path: P,
        width: f64,
        length: f64,
        settings: &TerrainSettings,
    ) -> Result<(), TerrainLoadError> {
        let rows = crate::init::json::parse_heightmap(path)?;
        *self = Self::from_samples(rows, width, length, settings)?;
        Ok(())
    }

    /// Builds the terrain from rows of samples along z, each row running along x.
    /// The pad goes on the flattest patch.
    pub fn from_samples(
        rows: Vec<Vec<f64>>,
        width: f64,
        length: f64,
        settings: &TerrainSettings,
    ) -> Result<Self, TerrainLoadError> {
        if !(width > 0. && length > 0.) {
            return Err(TerrainLoadError::Malformed(format!(
                "requested extent {width}x{length} is empty"
            )));
        }
        let columns = rows.first().map(Vec::len).unwrap_or(0);
        if rows.len() < 2 || columns < 2 {
            return Err(TerrainLoadError::Malformed(format!(
                "heightmap needs at least 2x2 samples, got {}x{}",
                columns,
                rows.len()
            )));
        }
        if let Some(row) = rows.iter().position(|r| r.len() != columns) {
            return Err(TerrainLoadError::Malformed(format!(
                "row {row} has {} samples, expected {columns}",
                rows[row].len()
            )));
        }
        let row_count = rows.len();
        let heights: Vec<f64> = rows.into_iter().flatten().collect();
        let height = heights.iter().copied().fold(0., f64::max);
        let mut field = HeightField::new(columns, row_count, heights);

        let pad_columns = ((((columns - 1) as f64) * settings.pad_fraction).round() as usize).clamp(1, columns - 1);
        let pad_rows = ((((row_count - 1) as f64) * settings.pad_fraction).round() as usize).clamp(1, row_count - 1);
        let pad = field.flattest_patch(pad_columns, pad_rows);
        field.flatten(&pad);
        Ok(Self::from_height_field(width, length, height, field, Some(pad)))
    }

    fn cell_size(&self) -> (f64, f64) {
        (
            self.width / (self.field.columns - 1) as f64,
            self.length / (self.field.rows - 1) as f64,
        )
    }

    fn vertex(&self, column: usize, row: usize) -> Vec3 {
        let (cell_x, cell_z) = self.cell_size();
        let x = if column == self.field.columns - 1 {
            self.width
        } else {
            column as f64 * cell_x
        };
        let z = if row == self.field.rows - 1 {
            self.length
        } else {
            row as f64 * cell_z
        };
        Vec3::new(x, self.field.get(column, row), z)
    }

    fn triangulate(&mut self) {
        if self.field.columns < 2 || self.field.rows < 2 {
            self.triangles = Vec::new();
            return;
        }
        let mut triangles = Vec::with_capacity(2 * (self.field.columns - 1) * (self.field.rows - 1));
        for row in 0..self.field.rows - 1 {
            for column in 0..self.field.columns - 1 {
                let is_pad = self.pad.is_some_and(|p| p.contains_cell(column, row));
                let p00 = self.vertex(column, row);
                let p10 = self.vertex(column + 1, row);
                let p01 = self.vertex(column, row + 1);
                let p11 = self.vertex(column + 1, row + 1);
                triangles.push(TerrainTriangle::new([p00, p01, p10], is_pad));
                triangles.push(TerrainTriangle::new([p10, p01, p11], is_pad));
            }
        }
        self.triangles = triangles;
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn triangles(&self) -> &[TerrainTriangle] {
        &self.triangles
    }

    pub fn landing_pad(&self) -> Option<PadPatch> {
        self.pad
    }

    /// Ground under (`x`, `z`) looked up in the two triangles of the enclosing cell.
    pub fn ground_at(&self, x: f64, z: f64) -> Option<Contact> {
        if self.triangles.is_empty() || !(0. ..=self.width).contains(&x) || !(0. ..=self.length).contains(&z) {
            return None;
        }
        let (cell_x, cell_z) = self.cell_size();
        let cells_x = self.field.columns - 1;
        let column = ((x / cell_x) as usize).min(cells_x - 1);
        let row = ((z / cell_z) as usize).min(self.field.rows - 2);
        let first = 2 * (row * cells_x + column);
        self.triangles[first..first + 2].iter().find_map(|t| {
            t.height_at(x, z).map(|height| Contact {
                height,
                on_landing_pad: t.is_landing_pad,
            })
        })
    }
}

impl Surface for Terrain3D {
    type Vector = Vec3;

    /// Highest ground under the footprint centre and corners; on the pad only if all of it is.
    fn ground_beneath(&self, lander: &LanderState<Vec3>) -> Option<Contact> {
        let Vec3 { x, z, .. } = lander.position();
        let dimensions = lander.dimensions();
        let (half_w, half_d) = (dimensions.width / 2., dimensions.depth / 2.);
        [
            (x, z),
            (x - half_w, z - half_d),
            (x + half_w, z - half_d),
            (x - half_w, z + half_d),
            (x + half_w, z + half_d),
        ]
        .into_iter()
        .filter_map(|(x, z)| self.ground_at(x, z))
        .reduce(|a, b| Contact {
            height: a.height.max(b.height),
            on_landing_pad: a.on_landing_pad && b.on_landing_pad,
        })
    }
}

#[cfg(test)]
mod terrain_2d_tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn generate(width: f64, seed: u64) -> Terrain2D {
        Terrain2D::generate_with_rng(
            width,
            600.,
            &TerrainSettings::default(),
            &mut StdRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn invalid_settings_are_ignored() {
        let settings = TerrainSettings::default()
            .with_segment_width(0.)
            .with_cell_size(f64::NAN)
            .with_pad_fraction(1.5)
            .with_roughness(-1.);
        assert_eq!(settings.segment_width(), 20.);
        assert_eq!(settings.cell_size(), 40.);
        assert_eq!(settings.pad_fraction(), 0.15);
        assert_eq!(settings.roughness(), 0.);
    }

    #[test]
    fn segments_partition_the_width() {
        for (width, seed) in [(800., 1), (1000., 2), (333.3, 3), (15., 4)] {
            let terrain = generate(width, seed);
            let segments = terrain.segments();
            assert_eq!(segments.first().unwrap().start.x, 0.);
            assert_eq!(segments.last().unwrap().end.x, width);
            for pair in segments.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            assert!(segments.iter().all(|s| s.start.x < s.end.x));
        }
    }

    #[test]
    fn single_flat_pad() {
        for seed in 0..20 {
            let terrain = generate(800., seed);
            let flags: Vec<_> = terrain.segments().iter().map(|s| s.is_landing_pad).collect();
            let runs = flags.windows(2).filter(|w| !w[0] && w[1]).count() + usize::from(flags[0]);
            assert_eq!(runs, 1);

            let (start, end, level) = terrain.landing_pad().unwrap();
            assert!(0. < start && end < 800.);
            let fraction = (end - start) / 800.;
            assert!((0.1..=0.2).contains(&fraction), "pad fraction {fraction}");
            for segment in terrain.segments().iter().filter(|s| s.is_landing_pad) {
                assert_eq!(segment.slope(), 0.);
                assert_eq!(segment.start.y, level);
            }
        }
    }

    #[test]
    fn heights_stay_in_band() {
        let terrain = generate(800., 7);
        assert!(terrain
            .segments()
            .iter()
            .all(|s| (30. ..=270.).contains(&s.start.y) && (30. ..=270.).contains(&s.end.y)));
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        assert_eq!(generate(800., 42), generate(800., 42));
    }

    #[test]
    fn degenerate_extent() {
        assert!(generate(0., 1).segments().is_empty());
        assert!(generate(-10., 1).segments().is_empty());
        assert!(generate(0., 1).landing_pad().is_none());
    }

    #[test]
    fn interpolation() {
        let segment = TerrainSegment::new(Vec2::new(0., 0.), Vec2::new(10., 20.), false);
        assert_eq!(segment.height_at(2.5), 5.);
        assert_eq!(segment.slope(), 2.);
    }
}

#[cfg(test)]
mod terrain_3d_tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn generate(seed: u64) -> Terrain3D {
        Terrain3D::generate_with_rng(
            800.,
            800.,
            600.,
            &TerrainSettings::default(),
            &mut StdRng::seed_from_u64(seed),
        )
    }

    fn flat_samples(columns: usize, rows: usize, level: f64) -> Vec<Vec<f64>> {
        vec![vec![level; columns]; rows]
    }

    #[test]
    fn two_triangles_per_cell() {
        let terrain = generate(1);
        assert_eq!(terrain.triangles().len(), 2 * 20 * 20);
    }

    #[test]
    fn normals_face_up() {
        let terrain = generate(2);
        for triangle in terrain.triangles() {
            assert!(triangle.normal.y >= 0.);
            assert!((triangle.normal.length() - 1.).abs() < 1e-9);
        }
    }

    #[test]
    fn pad_is_flat_and_inside() {
        let terrain = generate(3);
        let pad = terrain.landing_pad().unwrap();
        assert!(pad.column + pad.columns <= 20 && pad.row + pad.rows <= 20);
        let pads: Vec<_> = terrain.triangles().iter().filter(|t| t.is_landing_pad).collect();
        assert_eq!(pads.len(), 2 * pad.columns * pad.rows);
        let level = pads[0].vertices[0].y;
        for triangle in pads {
            assert!(triangle.vertices.iter().all(|v| v.y == level));
            assert!((triangle.normal.y - 1.).abs() < 1e-9);
        }
    }

    #[test]
    fn lookup_matches_vertices() {
        let terrain = generate(4);
        for triangle in terrain.triangles().iter().step_by(37) {
            for vertex in triangle.vertices {
                let contact = terrain.ground_at(vertex.x, vertex.z).unwrap();
                assert!((contact.height - vertex.y).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn lookup_outside() {
        let terrain = generate(5);
        assert!(terrain.ground_at(-1., 10.).is_none());
        assert!(terrain.ground_at(10., 801.).is_none());
        assert!(terrain.ground_at(800., 800.).is_some());
    }

    #[test]
    fn sloped_cell_interpolation() {
        let samples = vec![vec![0., 10.], vec![0., 10.]];
        let terrain =
            Terrain3D::from_height_field(10., 10., 10., HeightField::new(2, 2, samples.concat()), None);
        assert!((terrain.ground_at(2.5, 7.).unwrap().height - 2.5).abs() < 1e-9);
        assert!((terrain.ground_at(7.5, 1.).unwrap().height - 7.5).abs() < 1e-9);
    }

    #[test]
    fn from_samples_picks_flattest_patch() {
        let mut samples = flat_samples(5, 5, 0.);
        for (i, row) in samples.iter_mut().enumerate() {
            for (j, h) in row.iter_mut().enumerate() {
                *h = if i >= 3 && j >= 3 { 7. } else { (i * 5 + j) as f64 * 13. };
            }
        }
        let settings = TerrainSettings::default().with_pad_fraction(0.25);
        let terrain = Terrain3D::from_samples(samples, 100., 100., &settings).unwrap();
        assert_eq!(
            terrain.landing_pad(),
            Some(PadPatch {
                column: 3,
                row: 3,
                columns: 1,
                rows: 1
            })
        );
        let contact = terrain.ground_at(90., 90.).unwrap();
        assert!(contact.on_landing_pad);
        assert!((contact.height - 7.).abs() < 1e-9);
    }

    #[test]
    fn malformed_samples() {
        let settings = TerrainSettings::default();
        assert!(matches!(
            Terrain3D::from_samples(vec![vec![1., 2.]], 10., 10., &settings),
            Err(TerrainLoadError::Malformed(_))
        ));
        assert!(matches!(
            Terrain3D::from_samples(vec![vec![1., 2.], vec![1.]], 10., 10., &settings),
            Err(TerrainLoadError::Malformed(_))
        ));
        assert!(matches!(
            Terrain3D::from_samples(flat_samples(3, 3, 0.), 0., 10., &settings),
            Err(TerrainLoadError::Malformed(_))
        ));
    }

    #[test]
    fn failed_load_keeps_terrain() {
        let mut terrain = generate(6);
        let before = terrain.clone();
        let result = terrain.load_heightmap(
            "/nonexistent/heightmap.json",
            800.,
            800.,
            &TerrainSettings::default(),
        );
        assert!(matches!(result, Err(TerrainLoadError::Io { .. })));
        assert_eq!(terrain, before);
    }

    #[test]
    fn degenerate_extent() {
        let terrain = Terrain3D::generate(0., 100., 100., &TerrainSettings::default());
        assert!(terrain.triangles().is_empty());
        assert!(terrain.ground_at(0., 0.).is_none());
    }

    #[test]
    fn footprint_takes_highest_ground() {
        let samples = vec![vec![0., 0., 20.], vec![0., 0., 20.], vec![0., 0., 20.]];
        let terrain = Terrain3D::from_height_field(
            20.,
            20.,
            20.,
            HeightField::new(3, 3, samples.concat()),
            Some(PadPatch {
                column: 0,
                row: 0,
                columns: 1,
                rows: 2,
            }),
        );
        let lander = LanderState::new(Vec3::new(5., 50., 10.))
            .with_dimensions(crate::simulation::Dimensions {
                width: 4.,
                height: 30.,
                depth: 4.,
            });
        let contact = terrain.ground_beneath(&lander).unwrap();
        assert_eq!(contact.height, 0.);
        assert!(contact.on_landing_pad);

        let straddling = lander.with_position(Vec3::new(9., 50., 10.));
        let contact = terrain.ground_beneath(&straddling).unwrap();
        assert!((contact.height - 2.).abs() < 1e-9);
        assert!(!contact.on_landing_pad);
    }
}

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, info, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle, FontTransform};

use crate::color::GroupColors;
use crate::config::PlotConfig;
use crate::error::{OmicsError, Result};
use crate::group::{Group, GroupAssignment};
use crate::select::FeatureSelection;

const FONT_FAMILY: &str = "sans-serif";
const TITLE: &str = "Sample Groups by Top Features";

/// Fonts tried for raster text when `PlotConfig::font_path` is unset.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

// Plot area margins in pixels.
const MARGIN_LEFT: i32 = 70;
const MARGIN_RIGHT: i32 = 20;
const MARGIN_TOP: i32 = 40;
const MARGIN_BOTTOM: i32 = 55;
const TICKS: usize = 5;

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Svg,
}

impl ImageKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => Ok(ImageKind::Png),
            "svg" => Ok(ImageKind::Svg),
            other => Err(OmicsError::Render(format!(
                "cannot write .{other} images, use .png or .svg"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Scene – what gets drawn, independent of the backend
// ---------------------------------------------------------------------------

struct Scene {
    x_label: String,
    y_label: String,
    points: Vec<(f64, f64, Group)>,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Scene {
    fn new(selection: &FeatureSelection, groups: &GroupAssignment) -> Result<Self> {
        let first = selection.first();
        let second = selection.second();

        let aligned = groups.len() == selection.sample_ids().len()
            && groups
                .labels()
                .iter()
                .zip(selection.sample_ids())
                .all(|((id, _), expected)| id == expected);
        if !aligned {
            return Err(OmicsError::MalformedInput(
                "group labels do not match the selected features' samples".to_string(),
            ));
        }

        let mut points = Vec::with_capacity(groups.len());
        for ((id, group), (&x, &y)) in groups
            .labels()
            .iter()
            .zip(first.values.iter().zip(&second.values))
        {
            if x.is_finite() && y.is_finite() {
                points.push((x, y, *group));
            } else {
                warn!("Sample {id} has a non-finite coordinate and is not drawn");
            }
        }

        let x_range = padded_range(points.iter().map(|p| p.0));
        let y_range = padded_range(points.iter().map(|p| p.1));
        Ok(Scene {
            x_label: format!("Feature 1 ({})", first.id),
            y_label: format!("Feature 2 ({})", second.id),
            points,
            x_range,
            y_range,
        })
    }
}

/// Min/max with 5% padding; a flat or empty range is widened to width 1.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span < f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    (min - span * 0.05, max + span * 0.05)
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Draw the two selected features against each other, coloured by group,
/// and write the figure to `config.output_path()`.
///
/// The figure is fully rendered in memory before anything touches the disk,
/// so a failed render never leaves a partial file behind.
pub fn render_scatter(
    selection: &FeatureSelection,
    groups: &GroupAssignment,
    config: &PlotConfig,
) -> Result<PathBuf> {
    let path = config.output_path();
    let kind = ImageKind::from_path(&path)?;
    let scene = Scene::new(selection, groups)?;
    let colors = GroupColors::default();
    let size = (config.width, config.height);

    match kind {
        ImageKind::Png => {
            ensure_raster_font(config.font_path.as_deref())?;
            let mut buffer = vec![0u8; (config.width as usize) * (config.height as usize) * 3];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
                draw_scene(&root, &scene, &colors, config)?;
                root.present().map_err(render_err)?;
            }
            let image = image::RgbImage::from_raw(config.width, config.height, buffer)
                .ok_or_else(|| OmicsError::Render("pixel buffer has the wrong size".to_string()))?;
            std::fs::create_dir_all(&config.results_dir)?;
            image.save_with_format(&path, image::ImageFormat::Png)?;
        }
        ImageKind::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                draw_scene(&root, &scene, &colors, config)?;
                root.present().map_err(render_err)?;
            }
            std::fs::create_dir_all(&config.results_dir)?;
            std::fs::write(&path, svg)?;
        }
    }

    info!("Plot saved: {}", path.display());
    Ok(path)
}

fn render_err<E: std::fmt::Display>(err: E) -> OmicsError {
    OmicsError::Render(err.to_string())
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn draw_scene<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &Scene,
    colors: &GroupColors,
    config: &PlotConfig,
) -> Result<()> {
    let width = config.width as i32;
    let height = config.height as i32;
    let (left, right) = (MARGIN_LEFT, width - MARGIN_RIGHT);
    let (top, bottom) = (MARGIN_TOP, height - MARGIN_BOTTOM);
    if right <= left || bottom <= top {
        return Err(OmicsError::Render(format!(
            "{width}×{height} is too small for the plot margins"
        )));
    }

    let to_px = |x: f64, y: f64| -> (i32, i32) {
        let (x_lo, x_hi) = scene.x_range;
        let (y_lo, y_hi) = scene.y_range;
        let px = left as f64 + (x - x_lo) / (x_hi - x_lo) * (right - left) as f64;
        let py = bottom as f64 - (y - y_lo) / (y_hi - y_lo) * (bottom - top) as f64;
        (px.round() as i32, py.round() as i32)
    };

    let centered = Pos::new(HPos::Center, VPos::Center);
    let title_style = (FONT_FAMILY, 18).into_font().color(&BLACK).pos(centered);
    let label_style = (FONT_FAMILY, 14).into_font().color(&BLACK).pos(centered);
    let tick_style = (FONT_FAMILY, 11).into_font().color(&BLACK);
    let axis = BLACK.stroke_width(1);
    let grid = BLACK.mix(0.12).stroke_width(1);

    root.fill(&WHITE).map_err(render_err)?;

    root.draw(&Text::new(TITLE, (width / 2, MARGIN_TOP / 2), title_style))
        .map_err(render_err)?;

    // Grid and ticks
    for i in 0..=TICKS {
        let t = i as f64 / TICKS as f64;
        let x_val = scene.x_range.0 + t * (scene.x_range.1 - scene.x_range.0);
        let y_val = scene.y_range.0 + t * (scene.y_range.1 - scene.y_range.0);
        let (px, _) = to_px(x_val, scene.y_range.0);
        let (_, py) = to_px(scene.x_range.0, y_val);

        root.draw(&PathElement::new(vec![(px, top), (px, bottom)], grid))
            .map_err(render_err)?;
        root.draw(&PathElement::new(vec![(left, py), (right, py)], grid))
            .map_err(render_err)?;
        root.draw(&PathElement::new(vec![(px, bottom), (px, bottom + 4)], axis))
            .map_err(render_err)?;
        root.draw(&PathElement::new(vec![(left - 4, py), (left, py)], axis))
            .map_err(render_err)?;

        root.draw(&Text::new(
            format!("{x_val:.2}"),
            (px, bottom + 14),
            tick_style.pos(centered),
        ))
        .map_err(render_err)?;
        root.draw(&Text::new(
            format!("{y_val:.2}"),
            (left - 7, py),
            tick_style.pos(Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(render_err)?;
    }

    // Frame
    root.draw(&Rectangle::new([(left, top), (right, bottom)], axis))
        .map_err(render_err)?;

    // Axis labels
    root.draw(&Text::new(
        scene.x_label.as_str(),
        ((left + right) / 2, height - MARGIN_BOTTOM / 3),
        label_style.clone(),
    ))
    .map_err(render_err)?;
    root.draw(&Text::new(
        scene.y_label.as_str(),
        (MARGIN_LEFT / 4, (top + bottom) / 2),
        label_style.transform(FontTransform::Rotate270),
    ))
    .map_err(render_err)?;

    // Points, one series per group
    let radius = config.point_size;
    for group in Group::ALL {
        let color = colors.color_for(group);
        let series = scene.points.iter().filter(|p| p.2 == group);
        for &(x, y, _) in series {
            root.draw(&Circle::new(to_px(x, y), radius, color.filled()))
                .map_err(render_err)?;
        }
    }
    debug!("Drew {} points", scene.points.len());

    draw_legend(root, colors, right, top)
}

/// Legend box in the top-right corner of the plot area.
fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    colors: &GroupColors,
    right: i32,
    top: i32,
) -> Result<()> {
    let entries = colors.legend_entries();
    let row_height = 18;
    let (x0, y0) = (right - 80, top + 8);
    let (x1, y1) = (right - 8, y0 + 8 + row_height * entries.len() as i32);

    root.draw(&Rectangle::new([(x0, y0), (x1, y1)], WHITE.filled()))
        .map_err(render_err)?;
    root.draw(&Rectangle::new([(x0, y0), (x1, y1)], BLACK.mix(0.4).stroke_width(1)))
        .map_err(render_err)?;

    for (i, (label, color)) in entries.into_iter().enumerate() {
        let cy = y0 + 4 + row_height / 2 + row_height * i as i32;
        root.draw(&Circle::new((x0 + 14, cy), 5, color.filled()))
            .map_err(render_err)?;
        root.draw(&Text::new(
            label,
            (x0 + 26, cy),
            (FONT_FAMILY, 12)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

static RASTER_FONT: OnceLock<PathBuf> = OnceLock::new();

/// Register a TrueType font for bitmap text, once per process.
///
/// Vector output never needs this: SVG text is left to the viewer.
fn ensure_raster_font(preferred: Option<&Path>) -> Result<()> {
    if let Some(path) = RASTER_FONT.get() {
        match preferred {
            Some(p) if p != path.as_path() => warn!(
                "Font {} ignored; raster text already uses {}",
                p.display(),
                path.display()
            ),
            _ => debug!("Raster font already registered from {}", path.display()),
        }
        return Ok(());
    }

    let candidates = preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(|p| PathBuf::from(*p)));
    for candidate in candidates {
        let Ok(bytes) = std::fs::read(&candidate) else {
            continue;
        };
        if !has_font_signature(&bytes) {
            warn!("Skipping font {}: not a TrueType/OpenType file", candidate.display());
            continue;
        }
        // plotters keeps registered font data for the life of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                debug!("Registered raster font {}", candidate.display());
                let _ = RASTER_FONT.set(candidate);
                return Ok(());
            }
            Err(_) => warn!("Skipping font {}: not a valid TrueType font", candidate.display()),
        }
    }

    Err(OmicsError::Render(
        "no TrueType font found for PNG text; set plot.font_path or write .svg".to_string(),
    ))
}

/// sfnt version tags of TrueType, OpenType and font collection files.
const FONT_SIGNATURES: [&[u8; 4]; 4] = [b"\x00\x01\x00\x00", b"true", b"OTTO", b"ttcf"];

fn has_font_signature(bytes: &[u8]) -> bool {
    bytes
        .get(..4)
        .is_some_and(|head| FONT_SIGNATURES.iter().any(|sig| head == &sig[..]))
}

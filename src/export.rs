//! PNG, SVG and JSON export of a diagram.

use crate::config::{Action, Config};
use crate::diagram::FiniteStateMachine;
use crate::draw::{CairoRenderer, Highlight, Palette, RenderStyle, render_diagram};
use crate::session::{DiagramDocument, expand_tilde};
use chrono::Local;
use log::{debug, info};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest surface side Cairo accepts.
const MAX_SURFACE_SIDE: f64 = 32767.0;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] cairo::IoError),

    #[error("JSON serialisation failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("canvas {width}x{height} at scale {scale} cannot be rendered")]
    InvalidSize { width: f64, height: f64, scale: f64 },

    #[error("renderer failed to draw the diagram")]
    Render,

    #[error("invalid filename template '{0}'")]
    InvalidTemplate(String),
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Json => "json",
        }
    }

    /// Format requested by a keyboard action, if it is an export action.
    pub fn from_action(action: Action) -> Option<Self> {
        match action {
            Action::ExportPng => Some(ExportFormat::Png),
            Action::ExportSvg => Some(ExportFormat::Svg),
            Action::ExportJson => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Where exports go and how they are drawn.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub directory: PathBuf,
    /// File name template (supports chrono format specifiers)
    pub filename_template: String,
    pub scale: f64,
    pub palette: Palette,
    pub style: RenderStyle,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: dirs::picture_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Statescriber"),
            filename_template: "diagram_%Y-%m-%d_%H%M%S".to_string(),
            scale: 1.0,
            palette: Palette::default(),
            style: RenderStyle::default(),
        }
    }
}

impl ExportSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            directory: expand_tilde(&config.export.directory),
            filename_template: config.export.filename_template.clone(),
            scale: config.export.scale,
            palette: config.palette(),
            style: config.render_style(),
        }
    }
}

/// Generate a filename based on the template and current time.
pub fn generate_filename(template: &str, extension: &str) -> Result<String, ExportError> {
    let mut filename = String::new();
    write!(filename, "{}", Local::now().format(template))
        .map_err(|_| ExportError::InvalidTemplate(template.to_string()))?;
    Ok(format!("{filename}.{extension}"))
}

/// Ensure the export directory exists, creating it if necessary.
pub fn ensure_directory_exists(directory: &Path) -> Result<PathBuf, ExportError> {
    if !directory.exists() {
        info!("Creating export directory: {}", directory.display());
        fs::create_dir_all(directory)?;
    }

    let canonical = directory
        .canonicalize()
        .unwrap_or_else(|_| directory.to_path_buf());

    Ok(canonical)
}

/// Renders the diagram to a PNG file at `settings.scale`.
pub fn export_png(
    machine: &FiniteStateMachine,
    settings: &ExportSettings,
    path: &Path,
) -> Result<(), ExportError> {
    let (width, height) = surface_size(machine, settings.scale)?;
    let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, width, height)?;
    {
        let ctx = cairo::Context::new(&surface)?;
        draw_scaled(ctx, machine, settings)?;
    }
    surface.flush();

    let mut file = File::create(path)?;
    surface.write_to_png(&mut file)?;
    restrict_permissions(path)?;
    info!("Exported PNG {}x{} to {}", width, height, path.display());
    Ok(())
}

/// Renders the diagram to an SVG file at `settings.scale`.
pub fn export_svg(
    machine: &FiniteStateMachine,
    settings: &ExportSettings,
    path: &Path,
) -> Result<(), ExportError> {
    let (width, height) = surface_size(machine, settings.scale)?;
    let surface = cairo::SvgSurface::new(f64::from(width), f64::from(height), Some(path))?;
    {
        let ctx = cairo::Context::new(&surface)?;
        draw_scaled(ctx, machine, settings)?;
    }
    surface.finish();
    restrict_permissions(path)?;
    info!("Exported SVG to {}", path.display());
    Ok(())
}

/// Writes the document as pretty-printed JSON.
pub fn export_json(document: &DiagramDocument, path: &Path) -> Result<(), ExportError> {
    let bytes = serde_json::to_vec_pretty(document)?;
    fs::write(path, &bytes)?;
    restrict_permissions(path)?;
    info!("Exported JSON ({} bytes) to {}", bytes.len(), path.display());
    Ok(())
}

/// Exports into the configured directory under a generated file name.
///
/// # Returns
/// Path to the written file
pub fn export_to_directory(
    machine: &FiniteStateMachine,
    format: ExportFormat,
    settings: &ExportSettings,
) -> Result<PathBuf, ExportError> {
    let directory = ensure_directory_exists(&settings.directory)?;
    let path = directory.join(generate_filename(
        &settings.filename_template,
        format.extension(),
    )?);
    export_to_path(machine, format, settings, &path)?;
    Ok(path)
}

pub fn export_to_path(
    machine: &FiniteStateMachine,
    format: ExportFormat,
    settings: &ExportSettings,
    path: &Path,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Png => export_png(machine, settings, path),
        ExportFormat::Svg => export_svg(machine, settings, path),
        ExportFormat::Json => export_json(&DiagramDocument::from_machine(machine), path),
    }
}

fn draw_scaled(
    ctx: cairo::Context,
    machine: &FiniteStateMachine,
    settings: &ExportSettings,
) -> Result<(), ExportError> {
    ctx.scale(settings.scale, settings.scale);
    let mut renderer = CairoRenderer::new(ctx, settings.style.clone());
    if render_diagram(&mut renderer, machine, &settings.palette, Highlight::default()) {
        Ok(())
    } else {
        Err(ExportError::Render)
    }
}

fn surface_size(machine: &FiniteStateMachine, scale: f64) -> Result<(i32, i32), ExportError> {
    let width = (machine.info.width * scale).ceil();
    let height = (machine.info.height * scale).ceil();
    let valid = |side: f64| side.is_finite() && (1.0..=MAX_SURFACE_SIDE).contains(&side);
    if !valid(width) || !valid(height) {
        return Err(ExportError::InvalidSize {
            width: machine.info.width,
            height: machine.info.height,
            scale,
        });
    }
    debug!("Export surface {}x{} (scale {})", width, height, scale);
    Ok((width as i32, height as i32))
}

fn restrict_permissions(path: &Path) -> Result<(), ExportError> {
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Endpoint, FiniteState};
    use crate::geometry::Coordinate;

    fn two_state_machine() -> FiniteStateMachine {
        let mut machine = FiniteStateMachine::new();
        machine.info.width = 200.0;
        machine.info.height = 100.0;
        let a = machine.allocate_state_id();
        machine.add_state(FiniteState::new(a, Coordinate::new(50.0, 50.0), 20.0));
        let b = machine.allocate_state_id();
        machine.add_state(FiniteState::new(b, Coordinate::new(150.0, 50.0), 20.0));
        let transition = machine
            .build_transition(Endpoint::State(a), Endpoint::State(b), 0.02)
            .unwrap();
        machine.add_transition(transition).unwrap();
        machine
    }

    #[test]
    fn test_generate_filename() {
        let filename = generate_filename("diagram_%Y%m%d", "svg").unwrap();
        assert!(filename.starts_with("diagram_"));
        assert!(filename.ends_with(".svg"));
    }

    #[test]
    fn bad_filename_template_is_an_error() {
        let err = generate_filename("diagram_%Q", "png").unwrap_err();
        assert!(matches!(err, ExportError::InvalidTemplate(ref t) if t == "diagram_%Q"));
    }

    #[test]
    fn format_follows_export_actions() {
        assert_eq!(ExportFormat::from_action(Action::ExportPng), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_action(Action::ExportJson), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_action(Action::Deselect), None);
        assert_eq!(ExportFormat::Svg.extension(), "svg");
    }

    #[test]
    fn png_is_scaled_canvas_size() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.png");
        let settings = ExportSettings {
            scale: 2.0,
            ..ExportSettings::default()
        };

        export_png(&two_state_machine(), &settings, &path).unwrap();

        let mut file = File::open(&path).unwrap();
        let surface = cairo::ImageSurface::create_from_png(&mut file).unwrap();
        assert_eq!((surface.width(), surface.height()), (400, 200));
    }

    #[test]
    fn svg_contains_drawing() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.svg");
        export_svg(&two_state_machine(), &ExportSettings::default(), &path).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("path"));
    }

    #[test]
    fn json_export_into_directory() {
        let temp = tempfile::tempdir().unwrap();
        let settings = ExportSettings {
            directory: temp.path().join("nested"),
            filename_template: "fixed".to_string(),
            ..ExportSettings::default()
        };

        let path = export_to_directory(&two_state_machine(), ExportFormat::Json, &settings).unwrap();
        assert!(path.ends_with("fixed.json"));
        let document: DiagramDocument =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(document.states.len(), 2);
        assert_eq!(document.transitions.len(), 1);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let mut machine = two_state_machine();
        machine.info.width = 0.0;
        let err = export_png(&machine, &ExportSettings::default(), &temp.path().join("x.png"))
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidSize { .. }));
    }
}

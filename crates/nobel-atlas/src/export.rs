//! Figure export and on-screen display

use crate::render::Figure;
use crate::report::ChoroplethReport;
use crate::{AtlasError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Which artifacts to produce
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Open the map in the default browser
    pub show: bool,
    /// Standalone interactive HTML page
    pub html: Option<PathBuf>,
    /// Static image or PDF, format taken from the extension
    pub image: Option<PathBuf>,
    /// Plotly figure JSON
    pub figure_json: Option<PathBuf>,
    /// Report rows, color axis and metadata
    pub table_json: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            show: true,
            html: None,
            image: None,
            figure_json: None,
            table_json: None,
        }
    }
}

/// Static output formats Plotly can export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Svg,
    Pdf,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "svg" => Some(Self::Svg),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }
}

/// Rasterizes a figure JSON file into a static image
pub trait ImageWriter {
    fn write_image(&self, figure: &Path, output: &Path, format: ImageFormat) -> std::io::Result<()>;
}

const KALEIDO_SCRIPT: &str = "import json, sys\n\
import plotly.io as pio\n\
with open(sys.argv[1]) as f:\n    fig = json.load(f)\n\
pio.write_image(fig, sys.argv[2], format=sys.argv[3])\n";

/// Runs Plotly's kaleido exporter through a Python interpreter
/// (needs the `plotly` and `kaleido` packages)
#[derive(Debug, Clone)]
pub struct KaleidoWriter {
    pub python: String,
}

impl Default for KaleidoWriter {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
        }
    }
}

impl ImageWriter for KaleidoWriter {
    fn write_image(&self, figure: &Path, output: &Path, format: ImageFormat) -> std::io::Result<()> {
        let result = Command::new(&self.python)
            .args(["-c", KALEIDO_SCRIPT])
            .arg(figure)
            .arg(output)
            .arg(format.as_str())
            .output()?;

        if result.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&result.stderr);
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} exited with {}: {}", self.python, result.status, stderr.trim()),
            ))
        }
    }
}

/// Opens a rendered page for the user
pub trait Viewer {
    fn open(&self, path: &Path) -> std::io::Result<()>;
}

/// Hands the page to the platform's default opener
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemViewer;

impl Viewer for SystemViewer {
    fn open(&self, path: &Path) -> std::io::Result<()> {
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        } else {
            Command::new("xdg-open")
        };
        command.arg(path).spawn().map(|_| ())
    }
}

/// What an export run produced
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    /// Static image, when one was requested and the exporter succeeded
    pub image: Option<PathBuf>,
    pub displayed: bool,
}

pub struct Exporter<V: Viewer = SystemViewer, I: ImageWriter = KaleidoWriter> {
    config: ExportConfig,
    viewer: V,
    images: I,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self::with_viewer(config, SystemViewer)
    }
}

impl<V: Viewer> Exporter<V> {
    pub fn with_viewer(config: ExportConfig, viewer: V) -> Self {
        Self::with_parts(config, viewer, KaleidoWriter::default())
    }
}

impl<V: Viewer, I: ImageWriter> Exporter<V, I> {
    pub fn with_parts(config: ExportConfig, viewer: V, images: I) -> Self {
        Self {
            config,
            viewer,
            images,
        }
    }

    /// Write the selected artifacts, then display the map
    pub fn export(&self, figure: &Figure, report: &ChoroplethReport) -> Result<ExportSummary> {
        let image_format = match &self.config.image {
            Some(path) => Some(
                ImageFormat::from_path(path)
                    .ok_or_else(|| AtlasError::ImageFormat(path.clone()))?,
            ),
            None => None,
        };

        let mut summary = ExportSummary::default();

        if let Some(path) = &self.config.html {
            write_text(path, &figure.to_html())?;
            summary.written.push(path.clone());
        }

        if let Some(path) = &self.config.figure_json {
            write_text(path, &figure.to_json())?;
            summary.written.push(path.clone());
        }

        if let Some(path) = &self.config.table_json {
            write_json(path, report)?;
            summary.written.push(path.clone());
        }

        if let (Some(path), Some(format)) = (&self.config.image, image_format) {
            summary.image = self.write_image(figure, path, format)?;
        }

        if self.config.show {
            summary.displayed = self.show(figure)?;
        }

        Ok(summary)
    }

    /// Hand the figure to the static exporter. A failing exporter is not fatal.
    fn write_image(&self, figure: &Figure, path: &Path, format: ImageFormat) -> Result<Option<PathBuf>> {
        let figure_path = match &self.config.figure_json {
            Some(written) => written.clone(),
            None => {
                let staged = std::env::temp_dir().join("nobel-atlas-figure.json");
                write_text(&staged, &figure.to_json())?;
                staged
            }
        };

        info!("Exporting {} image to {:?}", format.as_str(), path);
        match self.images.write_image(&figure_path, path, format) {
            Ok(()) => Ok(Some(path.to_path_buf())),
            Err(e) => {
                warn!("Static image export failed ({}); no image written", e);
                Ok(None)
            }
        }
    }

    /// Open the figure in a browser. A missing opener is not fatal.
    fn show(&self, figure: &Figure) -> Result<bool> {
        let page = match &self.config.html {
            Some(path) => path.clone(),
            None => {
                let path = std::env::temp_dir().join("nobel-atlas.html");
                write_text(&path, &figure.to_html())?;
                path
            }
        };

        info!("Opening {:?}", page);
        match self.viewer.open(&page) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Could not open a browser ({}); the map is at {:?}", e, page);
                Ok(false)
            }
        }
    }
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    info!("Writing {:?}", path);
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(contents.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    info!("Writing {:?}", path);
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

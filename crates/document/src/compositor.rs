//! PDF rendering of a [`PageLayout`].

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use storyloom_core::artifact::ArtifactDocument;
use storyloom_core::error::{CompositionError, ValidationError};
use storyloom_core::naming::{document_filename, DocumentNaming};
use tempfile::NamedTempFile;

use crate::layout::{plan_layout, ImagePlacement, PlacedLine, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

/// Resolution the embedded image is declared at; only affects scaling.
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;
const LAYER_NAME: &str = "Layer 1";

/// Writes artifact documents into one directory.
#[derive(Debug, Clone)]
pub struct Compositor {
    output_dir: PathBuf,
    naming: DocumentNaming,
}

/// A decoded image ready for embedding.
struct RasterImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl Compositor {
    pub fn new(output_dir: impl Into<PathBuf>, naming: DocumentNaming) -> Self {
        Self {
            output_dir: output_dir.into(),
            naming,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn naming(&self) -> DocumentNaming {
        self.naming
    }

    /// Path a document with this content would be written to.
    pub fn document_path(&self, title: &str, body: &str, image_path: Option<&str>) -> PathBuf {
        self.output_dir
            .join(document_filename(self.naming, title, body, image_path))
    }

    /// Compose and write the document.
    ///
    /// Blocking: reads the image, renders, and writes the file on the calling
    /// thread.
    pub fn compose_document(
        &self,
        title: &str,
        body: &str,
        image_path: Option<&str>,
    ) -> Result<ArtifactDocument, CompositionError> {
        if title.trim().is_empty() {
            return Err(ValidationError::new("title", "must not be blank").into());
        }

        let start = Instant::now();
        let image = image_path.map(load_image).transpose()?;
        let layout = plan_layout(title, body);

        let (doc, first_page, first_layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?;
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?;

        let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
        for n in 1..layout.page_count {
            let (page, layer) = doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Page {}, {LAYER_NAME}", n + 1),
            );
            layers.push(doc.get_page(page).get_layer(layer));
        }

        draw_line(&layers, &layout.title, &bold);
        if let Some(image) = image {
            draw_image(&layers[0], image);
        }
        for line in &layout.body {
            draw_line(&layers, line, &regular);
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.document_path(title, body, image_path);
        save(doc, &self.output_dir, &path)?;

        let path = path.to_string_lossy().into_owned();
        tracing::info!(
            path = %path,
            pages = layout.page_count,
            has_image = image_path.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Document composed",
        );

        Ok(ArtifactDocument {
            title: title.to_string(),
            image: image_path.map(str::to_string),
            body: body.to_string(),
            path,
            pages: layout.page_count,
        })
    }
}

// ---- private helpers ----

fn load_image(path: &str) -> Result<RasterImage, CompositionError> {
    let bytes = std::fs::read(path).map_err(|e| CompositionError::MissingImage {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| CompositionError::ImageDecode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let rgb = decoded.to_rgb8();
    Ok(RasterImage {
        width: rgb.width(),
        height: rgb.height(),
        rgb: rgb.into_raw(),
    })
}

fn draw_line(layers: &[PdfLayerReference], line: &PlacedLine, font: &IndirectFontRef) {
    if line.text.is_empty() {
        return;
    }
    layers[line.page].use_text(
        line.text.as_str(),
        line.size_pt,
        Mm(line.x_mm),
        Mm(PAGE_HEIGHT_MM - line.baseline_mm()),
        font,
    );
}

fn draw_image(layer: &PdfLayerReference, image: RasterImage) {
    let placement = ImagePlacement::for_pixels(image.width, image.height);
    let Some(buffer) =
        printpdf::image_crate::RgbImage::from_raw(image.width, image.height, image.rgb)
    else {
        return;
    };
    let pdf_image = Image::from_dynamic_image(&printpdf::image_crate::DynamicImage::ImageRgb8(
        buffer,
    ));

    // At the declared DPI the image is `px / dpi` inches wide; scale to the
    // placement width.
    let native_width_mm = image.width as f32 / IMAGE_DPI * MM_PER_INCH;
    let scale = placement.width_mm / native_width_mm;

    pdf_image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(placement.x_mm)),
            translate_y: Some(Mm(PAGE_HEIGHT_MM - placement.top_mm - placement.height_mm)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

/// Render into a temp file in `dir`, then rename it over `path`. A failed
/// render leaves no partial file, and same-named documents replace each
/// other whole.
fn save(doc: PdfDocumentReference, dir: &Path, path: &Path) -> Result<(), CompositionError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        doc.save(&mut writer).map_err(render_error)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn render_error(err: printpdf::Error) -> CompositionError {
    CompositionError::Render(err.to_string())
}

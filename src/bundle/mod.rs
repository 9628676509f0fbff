//! Tutorial archives.
//!
//! ```text
//! tutorials.zip
//! ├── tutorial-index.html        one summary div per tutorial
//! ├── boing/tutorial.html        the compiled document
//! ├── boing/images/ball.png      assets, at their repository paths
//! └── zap/tutorial.html
//! ```

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::history::{ProjectAsset, TutorialHistory};
use crate::html::Element;
use crate::render::{RenderError, TutorialDocument, compile_document, render_summary};

pub const INDEX_FILE: &str = "tutorial-index.html";
pub const TUTORIAL_FILE: &str = "tutorial.html";
/// Attribute naming the tutorial a summary belongs to.
pub const TUTORIAL_NAME_ATTR: &str = "data-tutorial-name";

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("cannot render tutorial `{0}`")]
    Render(String, #[source] RenderError),

    #[error("two tutorials share the directory name `{0}`")]
    DuplicateDirectory(String),

    #[error("cannot write archive")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error when writing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

/// One compiled tutorial, ready to be archived.
#[derive(Debug)]
pub struct TutorialBundle {
    pub directory: String,
    pub document: TutorialDocument,
    pub summary: Element,
    pub assets: Vec<ProjectAsset>,
}

impl TutorialBundle {
    pub fn from_history(history: TutorialHistory) -> Result<Self, BundleError> {
        let render_err = |e| BundleError::Render(history.directory.clone(), e);
        let document = compile_document(&history).map_err(render_err)?;
        let summary =
            render_summary(history.summary.as_deref().unwrap_or_default()).map_err(render_err)?;

        Ok(Self {
            directory: history.directory,
            document,
            summary,
            assets: history.assets,
        })
    }

    pub fn html_path(&self) -> String {
        format!("{}/{TUTORIAL_FILE}", self.directory)
    }
}

/// Tutorials in archive order.
#[derive(Debug, Default)]
pub struct TutorialCollection {
    bundles: Vec<TutorialBundle>,
}

impl TutorialCollection {
    pub fn push(&mut self, bundle: TutorialBundle) -> Result<(), BundleError> {
        if self.bundles.iter().any(|b| b.directory == bundle.directory) {
            return Err(BundleError::DuplicateDirectory(bundle.directory));
        }
        self.bundles.push(bundle);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// `<div class="tutorial-index">` with every summary, tagged by name.
    pub fn index(&self) -> Element {
        Element::new("div")
            .with_attr("class", "tutorial-index")
            .with_children(self.bundles.iter().map(|b| {
                let mut summary = b.summary.clone();
                summary.set_attr(TUTORIAL_NAME_ATTR, b.directory.as_str());
                summary.into()
            }))
    }

    /// Write the whole collection as a deflate-compressed zip.
    pub fn write_zip<W: Write + Seek>(&self, out: W) -> Result<W, BundleError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(out);
        let io_err = |name: &str| {
            let name = PathBuf::from(name);
            move |e: std::io::Error| BundleError::Io(name, e)
        };

        for bundle in &self.bundles {
            let path = bundle.html_path();
            zip.start_file(path.as_str(), options)?;
            zip.write_all(bundle.document.to_html().as_bytes())
                .map_err(io_err(path.as_str()))?;

            for asset in &bundle.assets {
                zip.start_file(asset.path.as_str(), options)?;
                zip.write_all(&asset.data).map_err(io_err(asset.path.as_str()))?;
            }
        }

        zip.start_file(INDEX_FILE, options)?;
        zip.write_all(self.index().to_html().as_bytes())
            .map_err(io_err(INDEX_FILE))?;

        Ok(zip.finish()?)
    }

    pub fn write_zip_file(&self, path: &Path) -> Result<(), BundleError> {
        let file = File::create(path).map_err(|e| BundleError::Io(path.to_owned(), e))?;
        let mut out = self.write_zip(BufWriter::new(file))?;
        out.flush().map_err(|e| BundleError::Io(path.to_owned(), e))
    }
}

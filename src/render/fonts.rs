use resvg::usvg::fontdb::{Database, Family, Query};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::core::{CertificateError, CertificateResult};
use crate::models::FontStyle;

/// Font database shared by every render target.
///
/// The database is loaded once, on the blocking pool, the first time a
/// certificate is rasterized. Afterwards each job only checks that the faces
/// its config asks for are present.
pub struct FontRegistry {
    fonts_dir: Option<PathBuf>,
    database: OnceCell<Arc<Database>>,
}

impl FontRegistry {
    pub fn new(fonts_dir: Option<PathBuf>) -> Self {
        FontRegistry {
            fonts_dir,
            database: OnceCell::new(),
        }
    }

    pub async fn database(&self) -> CertificateResult<Arc<Database>> {
        let database = self
            .database
            .get_or_try_init(|| async {
                let fonts_dir = self.fonts_dir.clone();
                tokio::task::spawn_blocking(move || load_database(fonts_dir))
                    .await
                    .map(Arc::new)
                    .map_err(|e| CertificateError::Render(format!("Font loading task failed: {}", e)))
            })
            .await?;
        Ok(database.clone())
    }

    /// Resolves once every requested face can be queried. Missing faces fall
    /// back to the generic family unless `require_all` is set.
    pub async fn ensure_ready(&self, styles: &[FontStyle], require_all: bool) -> CertificateResult<Arc<Database>> {
        let database = self.database().await?;
        let missing = missing_faces(&database, styles);

        if !missing.is_empty() {
            if require_all {
                return Err(CertificateError::Render(format!(
                    "Fonts not available: {}",
                    missing.join(", ")
                )));
            }
            tracing::warn!("Fonts not available, using generic fallbacks: {}", missing.join(", "));
        }

        Ok(database)
    }
}

fn load_database(fonts_dir: Option<PathBuf>) -> Database {
    let mut database = Database::new();
    database.load_system_fonts();
    if let Some(dir) = &fonts_dir {
        database.load_fonts_dir(dir);
    }

    // Generic families point at the bundled webfonts when they exist
    for style in FontStyle::ALL {
        if has_face(&database, style.primary_family()) {
            let family = style.primary_family().to_string();
            match style {
                FontStyle::Serif => database.set_serif_family(family),
                FontStyle::Sans => database.set_sans_serif_family(family),
                FontStyle::Handwriting => database.set_cursive_family(family),
                FontStyle::Times => {}
            }
        }
    }

    tracing::info!(faces = database.len(), dir = ?fonts_dir, "Font database loaded");
    database
}

fn has_face(database: &Database, family: &str) -> bool {
    database
        .query(&Query {
            families: &[Family::Name(family)],
            ..Default::default()
        })
        .is_some()
}

/// Primary families of `styles` with no matching face.
pub fn missing_faces(database: &Database, styles: &[FontStyle]) -> Vec<&'static str> {
    styles
        .iter()
        .map(FontStyle::primary_family)
        .filter(|family| !has_face(database, family))
        .collect()
}

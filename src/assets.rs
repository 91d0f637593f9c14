// Copyright 2023 Remi Bernotavicius

use std::path::{Path, PathBuf};

const RECIPE_IMAGES_DIR: &str = "assets/recipes";

/// Lowercases `name` and replaces every run of characters that aren't letters or digits with a
/// single `-`.
pub fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "untitled".into()
    } else {
        slug.into()
    }
}

/// Stores an uploaded recipe image under the data directory and returns its path relative to it,
/// which is what goes in the recipe's image path.
///
/// The bytes must be an image in a format we can recognize; the extension is picked from the
/// format, not from `filename`.
pub fn save_recipe_image(
    data_dir: &Path,
    bytes: &[u8],
    filename: &str,
) -> crate::Result<PathBuf> {
    let format = image::guess_format(bytes)?;
    let extension = format.extensions_str().first().copied().unwrap_or("img");
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S%3f");

    let relative = Path::new(RECIPE_IMAGES_DIR).join(format!("{}-{stamp}.{extension}", slug(stem)));
    let path = data_dir.join(&relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, bytes)?;
    log::info!("stored recipe image {path:?}");
    Ok(relative)
}

#[test]
fn slugs() {
    assert_eq!(slug("Ana López"), "ana-lópez");
    assert_eq!(slug("  Tacos de  frijol!! "), "tacos-de-frijol");
    assert_eq!(slug("../../etc/passwd"), "etc-passwd");
    assert_eq!(slug("???"), "untitled");
}

#[test]
fn stores_images_under_data_dir() {
    let data_dir = std::env::temp_dir().join(format!("menu-assets-{}", std::process::id()));
    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    let relative = save_recipe_image(&data_dir, png, "Foto Tacos.JPG").unwrap();
    assert!(relative.starts_with(RECIPE_IMAGES_DIR));
    let file_name = relative.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("foto-tacos-"));
    assert!(file_name.ends_with(".png"));
    assert_eq!(std::fs::read(data_dir.join(&relative)).unwrap(), png);

    assert!(save_recipe_image(&data_dir, b"not an image", "notes.txt").is_err());
    std::fs::remove_dir_all(&data_dir).unwrap();
}

//! List saved captures.

use shutter_common::camera::ArtifactKind;
use shutter_common::config::AppConfig;
use shutter_gallery::GalleryStore;

pub async fn run(config: &AppConfig, kind: Option<ArtifactKind>) -> anyhow::Result<()> {
    let store = GalleryStore::from_config(&config.gallery);
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => vec![ArtifactKind::Photo, ArtifactKind::Video],
    };

    println!("Gallery: {}", store.root().display());
    for kind in kinds {
        let files = store.list(kind).await?;
        println!("  {kind}s: {}", files.len());
        for file in files {
            println!("    {}", file.display());
        }
    }
    Ok(())
}

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tokio::fs as async_fs;

use std::path::{Path, PathBuf};
use uuid::Uuid;
use anyhow::Context;

const DB_FILE_NAME: &str = "requests.db";
const IMAGE_DIR_NAME: &str = "images";

/// On-disk layout of a store: `requests.db` next to an `images/` directory
pub(super) struct StoreState {
    root: PathBuf,
    pool: SqlitePool,
}

impl std::fmt::Debug for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreState")
            .field("root", &self.root)
            .finish()
    }
}

impl StoreState {
    pub(super) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(super) fn image_path(&self, image_fname: &str) -> PathBuf {
        self.root.join(IMAGE_DIR_NAME).join(image_fname)
    }

    /// Copy an uploaded image into the store, returning the filename used.
    pub(super) async fn store_image<P: AsRef<Path>>(&self, img_path: P) -> anyhow::Result<String> {
        let img_path = img_path.as_ref();
        let img_fname = match img_path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let dest_path = self.image_path(&img_fname);
        async_fs::copy(img_path, &dest_path)
            .await
            .with_context(|| format!(
                "Failed to copy image from {:?} to {:?}",
                img_path,
                dest_path
            ))?;
        Ok(img_fname)
    }

    pub(super) async fn delete_image(&self, image_fname: &str) -> anyhow::Result<()> {
        let img_path = self.image_path(image_fname);
        async_fs::remove_file(&img_path)
            .await
            .with_context(|| format!("Failed to delete image {:?}", img_path))?;
        Ok(())
    }

    pub(super) async fn close(&self) {
        self.pool.close().await;
    }

    pub(super) async fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let db_file = root.join(DB_FILE_NAME);
        let images_dir = root.join(IMAGE_DIR_NAME);

        match (db_file.is_file(), images_dir.is_dir()) {
            (true, true) | (false, false) => {}
            (true, false) => anyhow::bail!(
                "Corrupt store: database exists ({:?}) but images dir missing ({:?})",
                db_file,
                images_dir
            ),
            (false, true) => anyhow::bail!(
                "Corrupt store: images dir exists ({:?}) but database missing ({:?})",
                images_dir,
                db_file
            ),
        }
        async_fs::create_dir_all(&images_dir)
            .await
            .with_context(|| format!("Failed to create images dir {:?}", images_dir))?;

        let connect_opts = SqliteConnectOptions::new()
            .filename(&db_file)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_opts)
            .await
            .with_context(|| format!("Failed to open database {:?}", db_file))?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::debug!(root = ?root, "request store opened");
        Ok(Self { root, pool })
    }
}

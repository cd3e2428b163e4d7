use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::admin::CollectionController;
use crate::config::Config;
use crate::constants::{INTERNAL_PREFIX, UPLOADS_URL_PREFIX};
use crate::content::{Access, BlobStore, ContentKind, ContentStore, FsBlobStore, Record};
use crate::i18n::Translations;
use crate::middleware::locale::LocaleRouter;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    content: Arc<dyn ContentStore>,
    blobs: Arc<dyn BlobStore>,
    translations: Arc<Translations>,
    locale_router: Arc<LocaleRouter>,
    bulk_flags: Arc<HashMap<ContentKind, Arc<AtomicBool>>>,
    config: Arc<Config>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, config: &Config, shutdown_tx: broadcast::Sender<()>) -> Self {
        let blobs: Arc<dyn BlobStore> =
            Arc::new(FsBlobStore::new(&config.media.upload_dir, UPLOADS_URL_PREFIX));
        Self::with_services(store.clone(), store, blobs, config, shutdown_tx)
    }

    /// 允许替换内容存储与文件存储的实现，测试中用来注入故障
    pub fn with_services(
        store: Arc<Store>,
        content: Arc<dyn ContentStore>,
        blobs: Arc<dyn BlobStore>,
        config: &Config,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        let locale_router = LocaleRouter::new(
            INTERNAL_PREFIX,
            &config.cookies.session_prefix,
            &config.cookies.legacy_auth_cookie,
        );
        let bulk_flags = ContentKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(AtomicBool::new(false))))
            .collect();

        Self {
            store,
            content,
            blobs,
            translations: Arc::new(Translations::builtin()),
            locale_router: Arc::new(locale_router),
            bulk_flags: Arc::new(bulk_flags),
            config: Arc::new(config.clone()),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn content(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    pub fn locale_router(&self) -> &LocaleRouter {
        &self.locale_router
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A fresh controller for `T`'s collection. Controllers of the same kind
    /// share one bulk-processing flag.
    pub fn controller<T: Record>(&self, access: Access) -> CollectionController<T> {
        let controller =
            CollectionController::new(self.content.clone(), self.blobs.clone(), access);
        match self.bulk_flags.get(&T::KIND) {
            Some(flag) => controller.with_busy_flag(Arc::clone(flag)),
            None => controller,
        }
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn shutdown_tx(&self) -> &broadcast::Sender<()> {
        &self.shutdown_tx
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast;

    use crate::config::Config;
    use crate::content::{News, Teacher};
    use crate::store::Store;

    use super::*;

    fn state(name: &str) -> (tempfile::TempDir, AppState) {
        let cfg = Config::from_env();
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(Store::open(tmp.path().join(name).to_str().unwrap()).unwrap());
        let (tx, _) = broadcast::channel(4);
        (tmp, AppState::new(store, &cfg, tx))
    }

    #[tokio::test]
    async fn controllers_of_one_kind_share_busy_flag() {
        let (_tmp, state) = state("state_flags.sled");
        let a = state.controller::<News>(Access::Privileged);
        let b = state.controller::<News>(Access::Privileged);
        let other = state.controller::<Teacher>(Access::Privileged);

        state.bulk_flags[&ContentKind::News].store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(a.is_bulk_processing());
        assert!(b.is_bulk_processing());
        assert!(!other.is_bulk_processing());
    }

    #[tokio::test]
    async fn shutdown_receiver_can_clone() {
        let (_tmp, state) = state("state_shutdown.sled");
        let mut rx1 = state.shutdown_rx();
        let mut rx2 = state.shutdown_rx();
        state.shutdown_tx().send(()).unwrap();
        rx1.recv().await.unwrap();
        rx2.recv().await.unwrap();
    }
}

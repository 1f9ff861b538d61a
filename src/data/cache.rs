use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::loader::{self, LoadOptions};
use super::model::Dataset;
use crate::error::Result;

/// Loads each (path, options) pair at most once and hands out shared,
/// immutable datasets. Failed loads are not remembered.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<(PathBuf, LoadOptions), Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance, created on first use.
    pub fn global() -> &'static DatasetCache {
        static GLOBAL: OnceLock<DatasetCache> = OnceLock::new();
        GLOBAL.get_or_init(DatasetCache::new)
    }

    /// Return the cached dataset for `path`, loading it on the first call.
    ///
    /// The lock is held across the load so concurrent callers for the same
    /// file wait for one load instead of racing.
    pub fn get_or_load(&self, path: &Path, options: &LoadOptions) -> Result<Arc<Dataset>> {
        let key = (
            path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
            options.clone(),
        );
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = entries.get(&key) {
            log::debug!("Dataset cache hit for {}", path.display());
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(loader::load_with(path, options)?);
        entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Number of cached datasets.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::Encoding;
    use std::io::Write;

    const CSV: &str = "CLIENTNUM,Categoria,Idade,Faixa Salarial Anual,Limite,Valor Transacoes 12m,Taxa de Utilização Cartão\n\
                       1,Cliente,45,$60K - $80K,12691,1144,0.061\n";

    #[test]
    fn second_load_returns_the_same_allocation() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(&Encoding::Latin1.encode(CSV)).unwrap();

        let cache = DatasetCache::new();
        let options = LoadOptions::default();
        let first = cache.get_or_load(file.path(), &options).unwrap();
        let second = cache.get_or_load(file.path(), &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let cache = DatasetCache::new();
        let missing = Path::new("no/such/ClientesBanco.csv");
        assert!(cache.get_or_load(missing, &LoadOptions::default()).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn global_instance_is_shared() {
        assert!(std::ptr::eq(DatasetCache::global(), DatasetCache::global()));
    }

    #[test]
    fn global_cache_serves_a_real_file_once() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(&Encoding::Latin1.encode(CSV)).unwrap();

        let options = LoadOptions::default();
        let first = DatasetCache::global().get_or_load(file.path(), &options).unwrap();
        let second = DatasetCache::global().get_or_load(file.path(), &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
        assert!(!first.schema.contains("CLIENTNUM"));
    }
}

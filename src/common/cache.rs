// src/common/cache.rs

//! Cache de leituras com TTL e invalidação por tag e por caminho.
//!
//! Cada leitura cacheada registra uma chave (operação + loja) e as tags que a
//! afetam. Uma escrita invalida as tags e só então retorna sucesso.
//! Caminhos são um namespace de tags (`path:/dashboard/menu`).
//!
//! Cada tag tem uma geração. Uma leitura anota as gerações antes de ir ao
//! banco e só grava no cache se nenhuma delas mudou enquanto carregava.

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::common::error::AppError;

// Página do painel que lista o cardápio
pub const DASHBOARD_MENU_PATH: &str = "/dashboard/menu";
// Página do admin que lista as lojas
pub const ADMIN_COMPANIES_PATH: &str = "/admin/companies";

pub fn company_tag(company_id: Uuid) -> String {
    format!("company:{}", company_id)
}

pub fn slug_tag(slug: &str) -> String {
    format!("slug:{}", slug)
}

pub fn admin_company_tag(company_id: Uuid) -> String {
    format!("admin-company:{}", company_id)
}

fn path_tag(path: &str) -> String {
    format!("path:{}", path)
}

fn all_tags(tags: &[String], paths: &[&str]) -> Vec<String> {
    tags.iter().cloned().chain(paths.iter().map(|p| path_tag(p))).collect()
}

#[derive(Default)]
struct TagIndex {
    // tag -> chaves
    keys_by_tag: HashMap<String, HashSet<String>>,
    // chave -> tags, para limpar o índice quando o moka descarta a entrada
    tags_by_key: HashMap<String, Vec<String>>,
    generations: HashMap<String, u64>,
}

impl TagIndex {
    fn snapshot(&self, tags: &[String]) -> Vec<u64> {
        tags.iter()
            .map(|tag| self.generations.get(tag).copied().unwrap_or(0))
            .collect()
    }

    fn link(&mut self, key: &str, tags: Vec<String>) {
        self.unlink(key);
        for tag in &tags {
            self.keys_by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.tags_by_key.insert(key.to_string(), tags);
    }

    fn unlink(&mut self, key: &str) {
        let Some(tags) = self.tags_by_key.remove(key) else {
            return;
        };
        for tag in tags {
            if let Some(keys) = self.keys_by_tag.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.keys_by_tag.remove(&tag);
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct CacheLayer {
    entries: Cache<String, serde_json::Value>,
    index: Arc<Mutex<TagIndex>>,
    // Chaves que o moka descartou sozinho (TTL ou capacidade), a podar do índice
    evicted: Arc<StdMutex<Vec<String>>>,
}

impl CacheLayer {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let evicted: Arc<StdMutex<Vec<String>>> = Arc::default();
        let queue = evicted.clone();

        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .eviction_listener(move |key: Arc<String>, _value, cause| {
                // Invalidação explícita e substituição já cuidam do índice
                if cause.was_evicted() {
                    if let Ok(mut queue) = queue.lock() {
                        queue.push(key.as_ref().clone());
                    }
                }
            })
            .build();

        Self {
            entries,
            index: Arc::new(Mutex::new(TagIndex::default())),
            evicted,
        }
    }

    fn prune_evicted(&self, index: &mut TagIndex) {
        let keys = match self.evicted.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => return,
        };
        for key in keys {
            // Regravada depois de expirar: o índice atual já é o da entrada nova
            if !self.entries.contains_key(&key) {
                index.unlink(&key);
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key).await?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Entrada de cache ilegível em '{}': {}", key, e);
                self.entries.invalidate(key).await;
                None
            }
        }
    }

    async fn generations(&self, tags: &[String]) -> Vec<u64> {
        self.index.lock().await.snapshot(tags)
    }

    // Entrada e índice são gravados na mesma seção crítica das invalidações.
    // Com `expected`, desiste se alguma tag foi invalidada desde a leitura.
    async fn store<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        tags: Vec<String>,
        expected: Option<&[u64]>,
    ) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Valor não serializável para cache em '{}': {}", key, e);
                return;
            }
        };

        let mut index = self.index.lock().await;
        self.prune_evicted(&mut index);

        if let Some(expected) = expected {
            if index.snapshot(&tags) != expected {
                tracing::debug!("Cache: '{}' invalidada durante a leitura, não gravada", key);
                return;
            }
        }

        self.entries.insert(key.to_string(), json).await;
        index.link(key, tags);
    }

    /// Grava `value` sob `key`, associando as tags e caminhos dados.
    #[cfg(test)]
    pub async fn insert<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        tags: &[String],
        paths: &[&str],
    ) {
        self.store(key, value, all_tags(tags, paths), None).await;
    }

    /// Lê do cache ou executa `loader` e guarda o resultado. Erros não são cacheados.
    pub async fn get_or_load<T, F, Fut>(
        &self,
        key: &str,
        tags: &[String],
        paths: &[&str],
        loader: F,
    ) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            return Ok(hit);
        }

        let tags = all_tags(tags, paths);
        let before = self.generations(&tags).await;

        let value = loader().await?;
        self.store(key, &value, tags, Some(&before)).await;
        Ok(value)
    }

    /// Como `get_or_load`, mas `None` não é cacheado: um registro criado
    /// depois não fica preso num "não existe".
    pub async fn get_or_load_optional<T, F, Fut>(
        &self,
        key: &str,
        tags: &[String],
        paths: &[&str],
        loader: F,
    ) -> Result<Option<T>, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, AppError>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            return Ok(Some(hit));
        }

        let tags = all_tags(tags, paths);
        let before = self.generations(&tags).await;

        let value = loader().await?;
        if let Some(value) = &value {
            self.store(key, value, tags, Some(&before)).await;
        }
        Ok(value)
    }

    pub async fn revalidate_tag(&self, tag: &str) {
        let mut index = self.index.lock().await;
        self.prune_evicted(&mut index);

        *index.generations.entry(tag.to_string()).or_insert(0) += 1;

        let keys = index.keys_by_tag.get(tag).cloned().unwrap_or_default();
        for key in &keys {
            index.unlink(key);
            self.entries.invalidate(key).await;
        }
        tracing::debug!("Cache: tag '{}' invalidada ({} chaves)", tag, keys.len());
    }

    pub async fn revalidate_path(&self, path: &str) {
        self.revalidate_tag(&path_tag(path)).await;
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[cfg(test)]
    async fn indexed_keys(&self, tag: &str) -> usize {
        self.entries.run_pending_tasks().await;
        let mut index = self.index.lock().await;
        self.prune_evicted(&mut index);
        index.keys_by_tag.get(tag).map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;

    fn cache() -> CacheLayer {
        CacheLayer::new(Duration::from_secs(300), 1_000)
    }

    #[tokio::test]
    async fn tag_invalidation_only_hits_tagged_keys() {
        let cache = cache();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        cache.insert("categories:a", &vec![1, 2], &[company_tag(a)], &[]).await;
        cache.insert("categories:b", &vec![3], &[company_tag(b)], &[]).await;

        cache.revalidate_tag(&company_tag(a)).await;

        assert!(cache.get::<Vec<i32>>("categories:a").await.is_none());
        assert_eq!(cache.get::<Vec<i32>>("categories:b").await, Some(vec![3]));
    }

    #[tokio::test]
    async fn path_invalidation_hits_every_key_under_the_path() {
        let cache = cache();
        cache.insert("x", &1, &[], &[DASHBOARD_MENU_PATH]).await;
        cache.insert("y", &2, &[], &[DASHBOARD_MENU_PATH]).await;
        cache.insert("z", &3, &[], &[ADMIN_COMPANIES_PATH]).await;

        cache.revalidate_path(DASHBOARD_MENU_PATH).await;

        assert!(!cache.contains("x"));
        assert!(!cache.contains("y"));
        assert!(cache.contains("z"));
    }

    #[tokio::test]
    async fn loader_runs_once_until_invalidated() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let load = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>("menu".to_string())
        };

        cache.get_or_load("k", &["t".to_string()], &[], load).await.unwrap();
        cache.get_or_load("k", &["t".to_string()], &[], load).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.revalidate_tag("t").await;
        cache.get_or_load("k", &["t".to_string()], &[], load).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let cache = cache();
        let result = cache
            .get_or_load::<String, _, _>("k", &[], &[], || async { Err(AppError::Unauthorized) })
            .await;
        assert!(result.is_err());
        assert!(!cache.contains("k"));
    }

    #[tokio::test]
    async fn missing_records_are_not_cached() {
        let cache = cache();
        let found = cache
            .get_or_load_optional::<String, _, _>("slug:x", &[], &[], || async { Ok(None) })
            .await
            .unwrap();
        assert!(found.is_none());
        assert!(!cache.contains("slug:x"));
    }

    #[tokio::test]
    async fn snapshot_loaded_before_an_invalidation_is_not_stored() {
        let cache = cache();
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let filler = cache.clone();
        let slow_read = tokio::spawn(async move {
            let tags = ["company:x".to_string()];
            filler
                .get_or_load("categories:x", &tags, &[], || async move {
                    let snapshot = "ANTIGO".to_string();
                    let _ = started_tx.send(());
                    let _ = release_rx.await;
                    Ok::<_, AppError>(snapshot)
                })
                .await
        });

        started_rx.await.unwrap();
        cache.revalidate_tag("company:x").await;
        release_tx.send(()).unwrap();

        // Quem leu recebe o que leu, mas o cache não guarda o dado velho
        assert_eq!(slow_read.await.unwrap().unwrap(), "ANTIGO");
        assert!(cache.get::<String>("categories:x").await.is_none());

        // A leitura seguinte carrega de novo e grava normalmente
        let tags = ["company:x".to_string()];
        let fresh = cache
            .get_or_load("categories:x", &tags, &[], || async {
                Ok::<_, AppError>("NOVO".to_string())
            })
            .await
            .unwrap();
        assert_eq!(fresh, "NOVO");
        assert_eq!(
            cache.get::<String>("categories:x").await.as_deref(),
            Some("NOVO")
        );
    }

    #[tokio::test]
    async fn expired_entries_leave_the_tag_index() {
        let cache = CacheLayer::new(Duration::from_millis(50), 1_000);
        cache
            .insert("categories:a", &1, &["company:a".to_string()], &[DASHBOARD_MENU_PATH])
            .await;
        assert_eq!(cache.indexed_keys("company:a").await, 1);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.indexed_keys("company:a").await, 0);
        assert_eq!(cache.indexed_keys(&path_tag(DASHBOARD_MENU_PATH)).await, 0);
    }
}

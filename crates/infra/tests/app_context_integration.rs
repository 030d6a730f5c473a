//! Integration tests for application wiring

use std::sync::Arc;

use async_trait::async_trait;
use mishkat_common::testing::CallCounter;
use mishkat_core::{ContentError, QuranApi};
use mishkat_domain::{
    Config, RemoteSettings, RevelationPlace, Result as DomainResult, Surah, Verse, VerseRef,
};
use mishkat_infra::AppContext;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct StaticQuranApi {
    calls: CallCounter,
}

#[async_trait]
impl QuranApi for StaticQuranApi {
    async fn surah_list(&self) -> DomainResult<Vec<Surah>> {
        self.calls.hit();
        Ok(vec![Surah {
            number: 112,
            name: "الإخلاص".into(),
            english_name: "Al-Ikhlaas".into(),
            english_translation: "Sincerity".into(),
            verse_count: 4,
            revelation: RevelationPlace::Meccan,
        }])
    }

    async fn surah_verses(&self, _surah: u16) -> DomainResult<Vec<Verse>> {
        Ok(Vec::new())
    }

    async fn verse(&self, reference: VerseRef) -> DomainResult<Verse> {
        Ok(Verse {
            surah: reference.surah,
            ayah: reference.ayah,
            text: String::new(),
            translation: None,
            juz: None,
        })
    }
}

fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.kv_path = Some(dir.path().join("cache.db").to_string_lossy().into_owned());
    config
}

#[tokio::test]
async fn test_surah_list_is_served_from_disk_after_restart() {
    let dir = TempDir::new().unwrap();

    let first_api = Arc::new(StaticQuranApi::default());
    {
        let context = AppContext::from_config(config_in(&dir)).unwrap();
        let surahs = context.quran(first_api.clone()).surah_list().await.unwrap();
        assert_eq!(surahs[0].english_name, "Al-Ikhlaas");
        context.shutdown().await;
    }

    let second_api = Arc::new(StaticQuranApi::default());
    let context = AppContext::from_config(config_in(&dir)).unwrap();
    let surahs = context.quran(second_api.clone()).surah_list().await.unwrap();

    assert_eq!(surahs[0].number, 112);
    assert_eq!(first_api.calls.count(), 1);
    assert_eq!(second_api.calls.count(), 0);
}

#[tokio::test]
async fn test_duas_come_from_the_remote_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/duas"))
        .and(query_param("category", "eq.evening"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 4, "category": "evening", "title": "Protection", "arabic": "أمسينا"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.remote =
        Some(RemoteSettings { base_url: server.uri(), api_key: None, timeout_secs: 5 });
    let context = AppContext::from_config(config).unwrap();

    let duas = context.duas();
    assert_eq!(duas.by_category("evening").await.unwrap()[0].title, "Protection");
    // Second read is a cache hit; the mock expects exactly one request.
    assert_eq!(duas.by_category("evening").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duas_without_remote_store_fail() {
    let mut config = Config::default();
    config.storage.kv_path = None;
    let context = AppContext::from_config(config).unwrap();

    let err = context.duas().by_category("morning").await.unwrap_err();
    assert!(matches!(err, ContentError::Cache(_)));
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = Config::default();
    config.storage.kv_path = None;
    config.cache.memory_capacity = 0;
    assert!(AppContext::from_config(config).is_err());
}

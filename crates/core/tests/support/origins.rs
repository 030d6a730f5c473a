//! Recording fakes for the content origins

use std::collections::VecDeque;

use async_trait::async_trait;
use mishkat_common::testing::CallCounter;
use mishkat_core::{HadithApi, QuranApi, TranslationApi};
use mishkat_domain::{
    Hadith, HadithPage, MishkatError, RevelationPlace, Result as DomainResult, Surah, Verse,
    VerseRef,
};
use parking_lot::Mutex;

pub fn verse(surah: u16, ayah: u16) -> Verse {
    Verse { surah, ayah, text: format!("text {surah}:{ayah}"), translation: None, juz: Some(1) }
}

/// Quran origin serving generated verses; failures can be queued.
#[derive(Default)]
pub struct FakeQuranApi {
    pub list_calls: CallCounter,
    pub verse_calls: CallCounter,
    failures: Mutex<VecDeque<MishkatError>>,
}

impl FakeQuranApi {
    /// Fail the next call with `error`
    pub fn fail_next(&self, error: MishkatError) {
        self.failures.lock().push_back(error);
    }

    fn next_failure(&self) -> DomainResult<()> {
        match self.failures.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QuranApi for FakeQuranApi {
    async fn surah_list(&self) -> DomainResult<Vec<Surah>> {
        self.list_calls.hit();
        self.next_failure()?;
        Ok(vec![Surah {
            number: 1,
            name: "الفاتحة".into(),
            english_name: "Al-Faatiha".into(),
            english_translation: "The Opening".into(),
            verse_count: 7,
            revelation: RevelationPlace::Meccan,
        }])
    }

    async fn surah_verses(&self, surah: u16) -> DomainResult<Vec<Verse>> {
        self.verse_calls.hit();
        self.next_failure()?;
        Ok((1..=3).map(|ayah| verse(surah, ayah)).collect())
    }

    async fn verse(&self, reference: VerseRef) -> DomainResult<Verse> {
        self.verse_calls.hit();
        self.next_failure()?;
        Ok(verse(reference.surah, reference.ayah))
    }
}

/// Hadith origin with `last_page` pages per collection
pub struct FakeHadithApi {
    pub calls: CallCounter,
    pub requested: Mutex<Vec<(String, u32)>>,
    last_page: u32,
}

impl FakeHadithApi {
    pub fn with_pages(last_page: u32) -> Self {
        Self { calls: CallCounter::new(), requested: Mutex::new(Vec::new()), last_page }
    }
}

#[async_trait]
impl HadithApi for FakeHadithApi {
    async fn page(&self, collection: &str, page: u32) -> DomainResult<HadithPage> {
        self.calls.hit();
        self.requested.lock().push((collection.to_string(), page));
        if page > self.last_page {
            return Err(MishkatError::NotFound(format!("{collection} page {page}")));
        }
        Ok(HadithPage {
            collection: collection.to_string(),
            page,
            hadiths: vec![Hadith {
                collection: collection.to_string(),
                number: format!("{page}"),
                text: "Actions are by intentions".into(),
                narrator: Some("Umar ibn al-Khattab".into()),
                grade: None,
            }],
            has_next: page < self.last_page,
        })
    }
}

/// Translation origin that upper-cases its input
#[derive(Default)]
pub struct FakeTranslationApi {
    pub calls: CallCounter,
}

#[async_trait]
impl TranslationApi for FakeTranslationApi {
    async fn translate(&self, text: &str, target_language: &str) -> DomainResult<String> {
        self.calls.hit();
        Ok(format!("[{target_language}] {}", text.to_uppercase()))
    }
}

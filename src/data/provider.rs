use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use super::historical::{
    cache_file_name, get_historical_data_from_file, write_historical_data_to_file,
};
use crate::{error::Result, types::Bars};

/// Source of daily bars for one instrument over `[start, end)`
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Bars>;
}

/// Fixed bars per ticker, filtered by date on request
#[derive(Debug, Default, Clone)]
pub struct InMemoryMarketData {
    bars: HashMap<String, Bars>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, ticker: &str, bars: Bars) -> Self {
        self.bars.insert(ticker.to_uppercase(), bars);
        self
    }
}

#[async_trait]
impl MarketData for InMemoryMarketData {
    async fn bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Bars> {
        Ok(self
            .bars
            .get(&ticker.to_uppercase())
            .map(|bars| {
                bars.iter()
                    .filter(|bar| bar.date >= start && bar.date < end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Reads bars from local files first, otherwise asks the inner provider and
/// writes what it returns for next time. Only ranges that ended before today
/// are written.
pub struct CachedMarketData<P> {
    inner: P,
    dir: PathBuf,
}

impl<P: MarketData> CachedMarketData<P> {
    pub fn new(inner: P, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }
}

#[async_trait]
impl<P: MarketData> MarketData for CachedMarketData<P> {
    async fn bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Bars> {
        let path = self.dir.join(cache_file_name(ticker, start, end));

        if let Some(bars) = get_historical_data_from_file(&path) {
            return Ok(bars);
        }

        info!(ticker, %start, %end, "downloading bars");
        let bars = self.inner.bars(ticker, start, end).await?;

        // Empty responses and ranges still open at the source are not cached,
        // later requests go back to the source for them
        if !bars.is_empty() && end <= Local::now().date_naive() {
            if let Err(err) = write_historical_data_to_file(&path, &bars) {
                warn!(path = %path.display(), error = %err, "failed to cache bars");
            }
        }

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::data::historical::tests::bars_with_closes;

    struct CountingMarketData {
        inner: InMemoryMarketData,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketData for CountingMarketData {
        async fn bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Bars> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.bars(ticker, start, end).await
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_filters_end_exclusive() {
        let provider =
            InMemoryMarketData::new().with_bars("spy", bars_with_closes(&[1., 2., 3., 4., 5.]));

        let bars = provider.bars("SPY", day(2), day(4)).await.unwrap();
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        assert_eq!(closes, vec![2., 3.]);

        assert!(provider.bars("QQQ", day(1), day(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_skips_inner_provider_on_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cached = CachedMarketData::new(
            CountingMarketData {
                inner: InMemoryMarketData::new().with_bars("AMD", bars_with_closes(&[1., 2., 3.])),
                calls: AtomicUsize::new(0),
            },
            dir.path(),
        );

        let first = cached.bars("AMD", day(1), day(10)).await.unwrap();
        let second = cached.bars("AMD", day(1), day(10)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_does_not_store_empty_results() {
        let dir = tempfile::tempdir().unwrap();
        let cached = CachedMarketData::new(
            CountingMarketData {
                inner: InMemoryMarketData::new(),
                calls: AtomicUsize::new(0),
            },
            dir.path(),
        );

        assert!(cached.bars("AMD", day(1), day(10)).await.unwrap().is_empty());
        assert!(cached.bars("AMD", day(1), day(10)).await.unwrap().is_empty());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_store_open_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let cached = CachedMarketData::new(
            CountingMarketData {
                inner: InMemoryMarketData::new().with_bars("AMD", bars_with_closes(&[1., 2., 3.])),
                calls: AtomicUsize::new(0),
            },
            dir.path(),
        );
        let future = Local::now().date_naive() + chrono::Days::new(365);

        assert_eq!(cached.bars("AMD", day(1), future).await.unwrap().len(), 3);
        assert_eq!(cached.bars("AMD", day(1), future).await.unwrap().len(), 3);

        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

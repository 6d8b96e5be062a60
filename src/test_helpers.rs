//! Helpers partagés par les tests unitaires : constructeurs de signaux et
//! fausse implémentation scriptée de `SignalApi`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::SignalApi;
use crate::error::ApiError;
use crate::models::{Direction, Signal, SignalStatus, StatsSummary, VoteReceipt, VoteType};

/// Signal LONG minimal, valeurs du scénario de référence
pub fn signal(id: &str) -> Signal {
    Signal {
        id: id.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        coin: "BTCUSDT".to_string(),
        direction: Direction::Long,
        entry: 100.0,
        tp: 110.0,
        sl: 95.0,
        rr: 2.0,
        combo_name: "A".to_string(),
        combo_details: "...".to_string(),
        votes_win: 3,
        votes_lose: 1,
    }
}

pub fn receipt(votes_win: u32, votes_lose: u32, status: SignalStatus) -> VoteReceipt {
    VoteReceipt {
        message: "ok".to_string(),
        votes_win,
        votes_lose,
        status,
    }
}

/// Fausse API : compte les appels, répond avec une latence optionnelle
#[derive(Default)]
pub struct FakeApi {
    pub signals_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub votes: Mutex<Vec<(String, VoteType)>>,
    /// Réponses de fetch_signals consommées dans l'ordre (latence, liste)
    pub scripted_signals: Mutex<VecDeque<(Duration, Vec<Signal>)>>,
    pub vote_receipt: Mutex<Option<VoteReceipt>>,
}

impl FakeApi {
    pub fn signals_calls(&self) -> usize {
        self.signals_calls.load(Ordering::SeqCst)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalApi for FakeApi {
    async fn fetch_signals(&self) -> Result<Vec<Signal>, ApiError> {
        self.signals_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.scripted_signals.lock().unwrap().pop_front();
        match next {
            Some((latency, signals)) => {
                tokio::time::sleep(latency).await;
                Ok(signals)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_stats(&self) -> Result<StatsSummary, ApiError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StatsSummary::default())
    }

    async fn cast_vote(&self, signal_id: &str, vote: VoteType) -> Result<VoteReceipt, ApiError> {
        self.votes.lock().unwrap().push((signal_id.to_string(), vote));
        match self.vote_receipt.lock().unwrap().clone() {
            Some(receipt) => Ok(receipt),
            None => Err(ApiError::Rejected {
                status: 403,
                message: Some("déjà voté".to_string()),
            }),
        }
    }
}

// ============================================================================
// LocalVoteLedger : ensemble persistant des signaux déjà votés
// ============================================================================
// Stockage pur, sans réseau. L'ensemble ne fait que grandir : aucune
// suppression n'est exposée, un id voté reste voté.
//
// Format sur disque (JSON) :
//   { "version": 1, "voted": ["id1", "id2"] }
// L'ancien format (simple tableau d'ids) est encore accepté en lecture.
// ============================================================================

use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LedgerError;

/// Version courante du format de fichier
pub const LEDGER_VERSION: u32 = 1;

/// Lecture seule de "a-t-on déjà voté pour cet id ?"
///
/// CONCEPT RUST : Trait comme frontière
/// - Le rendu ne dépend que de ce trait, pas du fichier
/// - Les tests passent un simple HashSet
pub trait VotedSet {
    fn has(&self, signal_id: &str) -> bool;
}

impl VotedSet for HashSet<String> {
    fn has(&self, signal_id: &str) -> bool {
        self.contains(signal_id)
    }
}

impl VotedSet for BTreeSet<String> {
    fn has(&self, signal_id: &str) -> bool {
        self.contains(signal_id)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    voted: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredLedger {
    Versioned(LedgerFile),
    Legacy(Vec<String>),
}

/// Ledger local des votes, adossé à un fichier JSON
#[derive(Debug)]
pub struct LocalVoteLedger {
    path: PathBuf,
    voted: BTreeSet<String>,
}

impl LocalVoteLedger {
    /// Ouvre le ledger stocké à `path`
    ///
    /// N'échoue jamais : fichier absent, illisible ou corrompu
    /// => ledger vide (avec un warning dans les logs).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let voted = load(&path);
        info!(path = %path.display(), count = voted.len(), "Vote ledger loaded");
        Self { path, voted }
    }

    /// true si `signal_id` a déjà été voté depuis ce client
    pub fn has(&self, signal_id: &str) -> bool {
        self.voted.contains(signal_id)
    }

    /// Ajoute `signal_id` et persiste immédiatement
    ///
    /// Idempotent : un id déjà présent ne déclenche aucune écriture.
    /// L'ensemble en mémoire est mis à jour AVANT l'écriture : si la
    /// persistance échoue, le vote reste visible pour cette session et
    /// l'erreur est renvoyée à l'appelant, qui la traite comme non fatale.
    ///
    /// Retourne Ok(true) si l'id vient d'être ajouté.
    pub fn add(&mut self, signal_id: &str) -> Result<bool, LedgerError> {
        if !self.voted.insert(signal_id.to_string()) {
            return Ok(false);
        }
        self.persist()?;
        debug!(signal_id, count = self.voted.len(), "Vote recorded in ledger");
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.voted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voted.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Écrit le fichier de façon atomique (fichier temporaire + rename)
    fn persist(&self) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = LedgerFile {
            version: LEDGER_VERSION,
            voted: self.voted.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(json.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl VotedSet for LocalVoteLedger {
    fn has(&self, signal_id: &str) -> bool {
        LocalVoteLedger::has(self, signal_id)
    }
}

fn load(path: &Path) -> BTreeSet<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeSet::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Vote ledger unreadable, starting empty");
            return BTreeSet::new();
        }
    };

    match serde_json::from_str::<StoredLedger>(&content) {
        Ok(StoredLedger::Versioned(file)) => {
            if file.version > LEDGER_VERSION {
                warn!(version = file.version, "Vote ledger written by a newer version, reading ids anyway");
            }
            file.voted.into_iter().collect()
        }
        Ok(StoredLedger::Legacy(ids)) => {
            debug!(count = ids.len(), "Vote ledger in legacy format");
            ids.into_iter().collect()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Vote ledger corrupt, starting empty");
            BTreeSet::new()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Contract storage with compare-and-swap writes

use crate::error::{PactError, Result};
use crate::types::{ContractId, UserId};
use fs4::fs_std::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use super::types::Contract;

/// Storage collaborator for contracts.
///
/// `save` is a compare-and-swap: it only succeeds when the stored version
/// still equals `expected_version`, and bumps the version on success.
pub trait ContractStore: Send + Sync {
    /// Store a freshly created contract
    fn insert(&self, contract: Contract) -> Result<Contract>;

    /// Load a contract by id
    fn load(&self, id: &ContractId) -> Result<Contract>;

    /// Replace a contract if nobody wrote it since `expected_version`
    fn save(&self, contract: &Contract, expected_version: u64) -> Result<Contract>;

    /// All contracts, ordered by id
    fn list(&self) -> Result<Vec<Contract>>;

    /// Contracts between a given brand and creator
    fn find_by_party(&self, brand_id: &UserId, creator_id: &UserId) -> Result<Vec<Contract>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|c| &c.terms().brand_id == brand_id && &c.terms().creator_id == creator_id)
            .collect())
    }
}

type ContractMap = BTreeMap<ContractId, Contract>;

fn insert_into(map: &mut ContractMap, mut contract: Contract) -> Result<Contract> {
    if map.contains_key(contract.id()) {
        return Err(PactError::ContractAlreadyExists(contract.id().to_string()));
    }
    contract.set_version(1);
    map.insert(contract.id().clone(), contract.clone());
    Ok(contract)
}

fn swap_into(map: &mut ContractMap, contract: &Contract, expected_version: u64) -> Result<Contract> {
    let stored = map
        .get(contract.id())
        .ok_or_else(|| PactError::ContractNotFound(contract.id().to_string()))?;

    if stored.version() != expected_version {
        return Err(PactError::StorageConflict {
            contract_id: contract.id().to_string(),
            expected: expected_version,
            found: stored.version(),
        });
    }

    let mut next = contract.clone();
    next.set_version(expected_version + 1);
    map.insert(next.id().clone(), next.clone());
    Ok(next)
}

fn poisoned<T>(_: T) -> PactError {
    PactError::Internal("contract store lock poisoned".to_string())
}

/// Process-local store, used by tests and embedded callers
#[derive(Default)]
pub struct InMemoryContractStore {
    contracts: Mutex<ContractMap>,
}

impl InMemoryContractStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContractStore for InMemoryContractStore {
    fn insert(&self, contract: Contract) -> Result<Contract> {
        let mut contracts = self.contracts.lock().map_err(poisoned)?;
        insert_into(&mut contracts, contract)
    }

    fn load(&self, id: &ContractId) -> Result<Contract> {
        let contracts = self.contracts.lock().map_err(poisoned)?;
        contracts
            .get(id)
            .cloned()
            .ok_or_else(|| PactError::ContractNotFound(id.to_string()))
    }

    fn save(&self, contract: &Contract, expected_version: u64) -> Result<Contract> {
        let mut contracts = self.contracts.lock().map_err(poisoned)?;
        swap_into(&mut contracts, contract, expected_version)
    }

    fn list(&self) -> Result<Vec<Contract>> {
        let contracts = self.contracts.lock().map_err(poisoned)?;
        Ok(contracts.values().cloned().collect())
    }
}

/// Store backed by a single JSON document on disk.
///
/// Every operation holds an advisory lock on a `<file>.lock` sidecar, shared
/// for reads and exclusive for writes, so separate handles and separate
/// processes serialize their read-check-write cycles. Writes land in a fresh
/// temp file in the same directory and are renamed over the document.
pub struct JsonFileContractStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileContractStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");

        Self {
            path,
            lock_path: PathBuf::from(lock_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> Result<PathBuf> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;
        Ok(parent)
    }

    /// Open the sidecar and block until the lock is held; released on drop
    fn lock(&self, exclusive: bool) -> Result<File> {
        self.parent_dir()?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        if exclusive {
            FileExt::lock_exclusive(&file)?;
        } else {
            FileExt::lock_shared(&file)?;
        }
        Ok(file)
    }

    fn read_all(&self) -> Result<ContractMap> {
        if !self.path.exists() {
            return Ok(ContractMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(ContractMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, contracts: &ContractMap) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(self.parent_dir()?)?;
        tmp.write_all(&serde_json::to_vec_pretty(contracts)?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| PactError::Io(e.error))?;
        Ok(())
    }

    /// Run a read-modify-write cycle under the exclusive lock
    fn update<T>(&self, apply: impl FnOnce(&mut ContractMap) -> Result<T>) -> Result<T> {
        let _lock = self.lock(true)?;
        let mut contracts = self.read_all()?;
        let result = apply(&mut contracts)?;
        self.write_all(&contracts)?;
        Ok(result)
    }
}

impl ContractStore for JsonFileContractStore {
    fn insert(&self, contract: Contract) -> Result<Contract> {
        self.update(|contracts| insert_into(contracts, contract))
    }

    fn load(&self, id: &ContractId) -> Result<Contract> {
        let _lock = self.lock(false)?;
        self.read_all()?
            .remove(id)
            .ok_or_else(|| PactError::ContractNotFound(id.to_string()))
    }

    fn save(&self, contract: &Contract, expected_version: u64) -> Result<Contract> {
        self.update(|contracts| swap_into(contracts, contract, expected_version))
    }

    fn list(&self) -> Result<Vec<Contract>> {
        let _lock = self.lock(false)?;
        Ok(self.read_all()?.into_values().collect())
    }
}

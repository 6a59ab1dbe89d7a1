// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptError, UserDecryptor};
use alloy::primitives::Address;
use futures::{
    future::{AbortHandle, Abortable, BoxFuture, Shared},
    FutureExt,
};
use purechance_fhevm::{DecryptedValues, Handle};
use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
};
use tracing::{debug, info};

type SharedDecryption = Shared<BoxFuture<'static, Result<DecryptedValues, DecryptError>>>;

/// Identity of a decryption: who asks, for which contract, for which handles
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub user: Address,
    pub contract: Address,
    pub handles: BTreeSet<Handle>,
}

struct InFlight {
    id: u64,
    future: SharedDecryption,
    abort: AbortHandle,
    lease: Weak<Lease>,
}

type InFlightMap = Arc<Mutex<HashMap<RequestKey, InFlight>>>;

fn lock(map: &InFlightMap) -> MutexGuard<'_, HashMap<RequestKey, InFlight>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared by every [`PendingDecryption`] of one request. When the last waiter
/// goes away the request is aborted and unregistered.
struct Lease {
    id: u64,
    key: RequestKey,
    abort: AbortHandle,
    map: Weak<Mutex<HashMap<RequestKey, InFlight>>>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.abort.abort();
        let Some(map) = self.map.upgrade() else {
            return;
        };
        let mut in_flight = lock(&map);
        if in_flight.get(&self.key).is_some_and(|r| r.id == self.id) {
            debug!("Dropping abandoned decryption of {} handles", self.key.handles.len());
            in_flight.remove(&self.key);
        }
    }
}

/// Keeps at most one decryption in flight per [`RequestKey`].
///
/// Callers asking for a set that is already being decrypted join the running
/// request instead of prompting the wallet again.
pub struct DecryptionCoordinator {
    decryptor: Arc<UserDecryptor>,
    in_flight: InFlightMap,
    next_id: AtomicU64,
}

/// A decryption that has been started (or joined) and not yet awaited.
///
/// Dropping every clone without awaiting the result cancels the request.
#[derive(Clone)]
pub struct PendingDecryption {
    key: RequestKey,
    future: SharedDecryption,
    abort: AbortHandle,
    lease: Arc<Lease>,
}

impl PendingDecryption {
    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    /// Stop the request. Everyone waiting on it resolves to
    /// [`DecryptError::Cancelled`]; a result arriving later is discarded.
    pub fn cancel(&self) {
        debug!("Cancelling decryption of {} handles", self.key.handles.len());
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }

    pub async fn result(self) -> Result<DecryptedValues, DecryptError> {
        let Self { future, lease, .. } = self;
        let outcome = future.await;
        drop(lease);
        outcome
    }
}

impl DecryptionCoordinator {
    pub fn new(decryptor: Arc<UserDecryptor>) -> Self {
        Self {
            decryptor,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn decryptor(&self) -> &Arc<UserDecryptor> {
        &self.decryptor
    }

    /// Number of distinct decryptions currently running
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Start decrypting `handles`, or join the decryption already running for
    /// the same user, contract and handle set.
    pub fn request(
        &self,
        user: Address,
        contract: Address,
        handles: &[Handle],
    ) -> PendingDecryption {
        let key = RequestKey {
            user,
            contract,
            handles: handles.iter().copied().collect(),
        };

        let mut in_flight = lock(&self.in_flight);
        if let Some(running) = in_flight.get(&key) {
            if let Some(lease) = running.lease.upgrade() {
                if !running.abort.is_aborted() {
                    debug!("Joining in-flight decryption of {} handles", key.handles.len());
                    return PendingDecryption {
                        key,
                        future: running.future.clone(),
                        abort: running.abort.clone(),
                        lease,
                    };
                }
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (abort, registration) = AbortHandle::new_pair();
        let decryptor = self.decryptor.clone();
        let map = self.in_flight.clone();
        let cleanup_key = key.clone();
        let handles = handles.to_vec();

        let future = async move {
            let outcome = Abortable::new(
                async move { decryptor.decrypt(user, contract, &handles).await },
                registration,
            )
            .await;

            let mut in_flight = lock(&map);
            if in_flight.get(&cleanup_key).is_some_and(|r| r.id == id) {
                in_flight.remove(&cleanup_key);
            }
            drop(in_flight);

            match outcome {
                Ok(result) => result,
                Err(_) => {
                    info!("Decryption cancelled");
                    Err(DecryptError::Cancelled)
                }
            }
        }
        .boxed()
        .shared();

        let lease = Arc::new(Lease {
            id,
            key: key.clone(),
            abort: abort.clone(),
            map: Arc::downgrade(&self.in_flight),
        });
        in_flight.insert(
            key.clone(),
            InFlight {
                id,
                future: future.clone(),
                abort: abort.clone(),
                lease: Arc::downgrade(&lease),
            },
        );

        PendingDecryption {
            key,
            future,
            abort,
            lease,
        }
    }
}

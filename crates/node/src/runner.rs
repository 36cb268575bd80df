//! Tokio runner: executes the state machine's actions.
//!
//! The runner owns the event loop. Internal events (enqueued by the state
//! machine itself) drain before the next external event, preserving
//! causality; storage work runs on the blocking pool; chain fetches are
//! spawned tasks bounded by the configured timeout.

use crate::{
    attach_quorum_signatures, commit_blocks, BlockLoader, NodeConfig, NodeState, PeerMessenger,
};
use concordia_core::{Action, Event, OutboundMessage, StateMachine, TimerId};
use concordia_messages::{TransportError, VoteBundleGossip};
use concordia_storage::LedgerStore;
use concordia_sync::ChainValidator;
use concordia_types::{Block, LedgerState, PeerId, Round};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

const EVENT_QUEUE_DEPTH: usize = 256;

/// Handle for feeding a running node and observing its ledger.
#[derive(Clone)]
pub struct NodeHandle {
    event_tx: mpsc::Sender<Event>,
    ledger_rx: watch::Receiver<Option<LedgerState>>,
    peers_in_network: usize,
}

impl NodeHandle {
    /// Submit a locally validated candidate block for consensus at `round`.
    pub async fn submit_candidate(&self, round: Round, block: Block) {
        let _ = self
            .event_tx
            .send(Event::CandidateBlockReady { round, block })
            .await;
    }

    /// Deliver an incoming vote bundle from the transport.
    ///
    /// Transport validation happens here, at the ingress: a stateless-invalid
    /// bundle is rejected with a typed error and has no side effect.
    pub async fn deliver_bundle(
        &self,
        from: PeerId,
        bundle: VoteBundleGossip,
    ) -> Result<(), TransportError> {
        bundle.validate(self.peers_in_network)?;
        let _ = self
            .event_tx
            .send(Event::VoteBundleReceived {
                from,
                votes: bundle.votes,
            })
            .await;
        Ok(())
    }

    /// Watch the ledger tip; updated after every successful commit.
    pub fn ledger_updates(&self) -> watch::Receiver<Option<LedgerState>> {
        self.ledger_rx.clone()
    }
}

/// Executes [`NodeState`] actions against storage, transport, and timers.
pub struct NodeRunner {
    state: NodeState,
    store: Arc<LedgerStore>,
    messenger: Arc<dyn PeerMessenger>,
    loader: Arc<dyn BlockLoader>,
    validator: ChainValidator,
    fetch_timeout: Duration,
    event_tx: mpsc::Sender<Event>,
    event_rx: mpsc::Receiver<Event>,
    ledger_tx: watch::Sender<Option<LedgerState>>,
    timers: HashMap<TimerId, JoinHandle<()>>,
}

impl NodeRunner {
    pub fn new(
        config: NodeConfig,
        state: NodeState,
        store: Arc<LedgerStore>,
        messenger: Arc<dyn PeerMessenger>,
        loader: Arc<dyn BlockLoader>,
    ) -> (Self, NodeHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (ledger_tx, ledger_rx) = watch::channel(None);

        let handle = NodeHandle {
            event_tx: event_tx.clone(),
            ledger_rx,
            peers_in_network: config.peers.len(),
        };
        let runner = Self {
            state,
            store,
            messenger,
            loader,
            validator: ChainValidator::new(config.peers),
            fetch_timeout: config.sync.fetch_timeout,
            event_tx,
            event_rx,
            ledger_tx,
            timers: HashMap::new(),
        };
        (runner, handle)
    }

    /// Run until every handle is dropped and the event queue drains.
    pub async fn run(mut self) {
        let mut internal: VecDeque<Event> = VecDeque::new();
        loop {
            let event = if let Some(event) = internal.pop_front() {
                event
            } else {
                match self.event_rx.recv().await {
                    Some(event) => event,
                    None => break,
                }
            };

            debug!(event = event.type_name(), "processing");
            let actions = self.state.handle(event);
            for action in actions {
                self.execute(action, &mut internal).await;
            }
        }
    }

    async fn execute(&mut self, action: Action, internal: &mut VecDeque<Event>) {
        match action {
            Action::Broadcast {
                message: OutboundMessage::VoteBundle(bundle),
            } => {
                if let Err(e) = self.messenger.broadcast(&bundle) {
                    warn!(error = %e, "broadcast failed");
                }
            }

            Action::SendTo {
                peer,
                message: OutboundMessage::VoteBundle(bundle),
            } => {
                if let Err(e) = self.messenger.send_to(peer, &bundle) {
                    warn!(peer = %peer, error = %e, "send failed");
                }
            }

            Action::EnqueueInternal { event } => internal.push_back(event),

            Action::SetTimer { id, duration } => {
                if let Some(previous) = self.timers.remove(&id) {
                    previous.abort();
                }
                let tx = self.event_tx.clone();
                self.timers.insert(
                    id,
                    tokio::spawn(async move {
                        tokio::time::sleep(duration).await;
                        let _ = tx.send(Event::TimerFired { id }).await;
                    }),
                );
            }

            Action::CancelTimer { id } => {
                if let Some(timer) = self.timers.remove(&id) {
                    timer.abort();
                }
            }

            Action::PersistOwnVote { round, block_hash } => {
                // Must land durably before the broadcast that follows it in
                // the action list, so this is awaited, not spawned.
                let store = self.store.clone();
                let result =
                    tokio::task::spawn_blocking(move || store.put_own_vote(round, block_hash))
                        .await;
                if result.is_err() {
                    error!(round = %round, "own-vote persistence task failed");
                }
            }

            Action::CommitBlock { block, votes } => {
                let store = self.store.clone();
                let validator = self.validator.clone();
                let height = block.height();
                let event = tokio::task::spawn_blocking(move || {
                    let mut block = block;
                    attach_quorum_signatures(&mut block, &votes);
                    commit_blocks(&store, &validator, vec![block])
                })
                .await
                .unwrap_or_else(|e| {
                    error!(error = %e, "commit task panicked");
                    Event::CommitFailed { height }
                });
                internal.push_back(event);
            }

            Action::CommitChain { blocks } => {
                let store = self.store.clone();
                let validator = self.validator.clone();
                let height = blocks.first().map(|b| b.height()).unwrap_or_default();
                let event =
                    tokio::task::spawn_blocking(move || commit_blocks(&store, &validator, blocks))
                        .await
                        .unwrap_or_else(|e| {
                            error!(error = %e, "chain commit task panicked");
                            Event::CommitFailed { height }
                        });
                internal.push_back(event);
            }

            Action::FetchChain { peer, from_height } => {
                let loader = self.loader.clone();
                let tx = self.event_tx.clone();
                let timeout = self.fetch_timeout;
                tokio::spawn(async move {
                    let fetch = tokio::task::spawn_blocking(move || {
                        loader.retrieve_blocks(peer, from_height)
                    });
                    let event = match tokio::time::timeout(timeout, fetch).await {
                        Ok(Ok(Ok(blocks))) => Event::ChainResponse { peer, blocks },
                        Ok(Ok(Err(e))) => {
                            warn!(peer = %peer, error = %e, "chain fetch failed");
                            Event::ChainFetchFailed { peer }
                        }
                        Ok(Err(e)) => {
                            error!(peer = %peer, error = %e, "chain fetch task panicked");
                            Event::ChainFetchFailed { peer }
                        }
                        Err(_) => {
                            warn!(peer = %peer, "chain fetch timed out");
                            Event::ChainFetchFailed { peer }
                        }
                    };
                    let _ = tx.send(event).await;
                });
            }

            Action::EmitLedgerState { state } => {
                // Settled rounds no longer need durable equivocation
                // protection.
                if let Some(round) = self.state.settled_round() {
                    let store = self.store.clone();
                    tokio::task::spawn_blocking(move || store.prune_own_votes(round));
                }
                self.ledger_tx.send_replace(Some(state));
            }
        }
    }
}
